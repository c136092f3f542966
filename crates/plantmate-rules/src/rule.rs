//! Decision rule types and the rule file schema.
//!
//! A `RuleSet` is deserialized from TOML and holds an ordered list of
//! `DecisionRule`s. Rules are tried in declaration order and the first one
//! whose keywords match the query wins.
//!
//! ```toml
//! [[rules]]
//! id = "plant-status"
//! description = "Questions about how the plant is doing right now"
//! keywords = ["how is", "doing", "status", "healthy"]
//! capabilities = ["environment"]
//! complexity = "simple"
//! ```

use serde::{Deserialize, Serialize};

use plantmate_contracts::{capability::CapabilityKind, decision::Complexity};

/// Matches any query.
pub const WILDCARD: &str = "*";

/// One keyword rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRule {
    /// Stable identifier quoted in the reasoning the oracle returns.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Case-insensitive words or phrases of the query, matched on whole
    /// words. `"*"` matches anything.
    pub keywords: Vec<String>,

    /// Capabilities to collect, in preference order. Aliases such as
    /// `web_search` are accepted. Empty means the query needs no tools.
    #[serde(default)]
    pub capabilities: Vec<String>,

    #[serde(default)]
    pub complexity: Complexity,
}

impl DecisionRule {
    /// True if any keyword occurs in `query` as a run of whole words,
    /// ignoring case and punctuation. "hey" does not match "they".
    pub fn matches(&self, query: &str) -> bool {
        let query = words(query);
        self.keywords
            .iter()
            .any(|k| k == WILDCARD || contains_phrase(&query, &words(k)))
    }

    /// The named capabilities, resolved. Unknown names are skipped; the rule
    /// set rejects them at load time.
    pub fn capability_kinds(&self) -> Vec<CapabilityKind> {
        self.capabilities
            .iter()
            .filter_map(|name| CapabilityKind::from_name(name))
            .collect()
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(words: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && words.windows(phrase.len()).any(|window| window == phrase)
}

/// The top-level structure of a rule file. First match wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<DecisionRule>,
}

impl RuleSet {
    pub fn first_match(&self, query: &str) -> Option<&DecisionRule> {
        self.rules.iter().find(|rule| rule.matches(query))
    }
}

#[cfg(test)]
mod tests {
    use super::{DecisionRule, RuleSet};

    fn rule(id: &str, keywords: &[&str]) -> DecisionRule {
        DecisionRule {
            id: id.to_string(),
            description: String::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            capabilities: vec![],
            complexity: Default::default(),
        }
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let greeting = rule("greeting", &["hey", "hi"]);
        assert!(greeting.matches("Hey!"));
        assert!(greeting.matches("oh, hi"));
        assert!(!greeting.matches("why are they turning yellow?"));
        assert!(!greeting.matches("I live in Delhi now"));
    }

    #[test]
    fn phrase_keywords_match_consecutive_words() {
        let status = rule("status", &["how is"]);
        assert!(status.matches("So... HOW   is my fern?"));
        assert!(!status.matches("is it fine, and how?"));
    }

    #[test]
    fn wildcard_and_punctuation_only_keywords() {
        assert!(rule("any", &["*"]).matches("anything at all"));
        assert!(!rule("noise", &["!!"]).matches("!! wow !!"));
    }

    #[test]
    fn substring_greeting_does_not_shadow_symptoms() {
        let rules = RuleSet {
            rules: vec![rule("small-talk", &["hey", "hi"]), rule("diagnosis", &["yellow"])],
        };
        let hit = rules.first_match("why are they turning yellow?").unwrap();
        assert_eq!(hit.id, "diagnosis");
    }
}
