//! Suggestion scoring

use serde::{Deserialize, Serialize};

use super::SuggestionSource;

/// How well a candidate matches the typed filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchQuality {
    Exact,
    Prefix,
    /// Empty filter: the user is browsing
    Partial,
    None,
}

impl MatchQuality {
    /// Classify `candidate` against the typed `filter`
    pub fn classify(candidate: &str, filter: &str) -> Self {
        if filter.is_empty() {
            Self::Partial
        } else if candidate == filter {
            Self::Exact
        } else if candidate.starts_with(filter) {
            Self::Prefix
        } else {
            Self::None
        }
    }
}

/// Tunable scoring weights
///
/// Keep every gap between adjacent source boosts above `length_penalty_cap`
/// so the source ordering holds for equal match quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub document_tree_boost: f64,
    pub live_listing_boost: f64,
    pub history_boost: f64,
    pub snippet_boost: f64,
    pub exact_match_bonus: f64,
    pub prefix_match_bonus: f64,
    pub partial_match_bonus: f64,
    pub length_penalty_divisor: f64,
    pub length_penalty_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            document_tree_boost: 300.0,
            live_listing_boost: 250.0,
            history_boost: 200.0,
            snippet_boost: 150.0,
            exact_match_bonus: 100.0,
            prefix_match_bonus: 60.0,
            partial_match_bonus: 30.0,
            length_penalty_divisor: 4.0,
            length_penalty_cap: 40.0,
        }
    }
}

impl ScoringConfig {
    pub fn source_boost(&self, source: SuggestionSource) -> f64 {
        match source {
            SuggestionSource::DocumentTree => self.document_tree_boost,
            SuggestionSource::LiveListing => self.live_listing_boost,
            SuggestionSource::History => self.history_boost,
            SuggestionSource::Snippet => self.snippet_boost,
        }
    }

    pub fn match_bonus(&self, quality: MatchQuality) -> f64 {
        match quality {
            MatchQuality::Exact => self.exact_match_bonus,
            MatchQuality::Prefix => self.prefix_match_bonus,
            MatchQuality::Partial => self.partial_match_bonus,
            MatchQuality::None => 0.0,
        }
    }

    pub fn length_penalty(&self, text: &str) -> f64 {
        if self.length_penalty_divisor <= 0.0 {
            return 0.0;
        }
        let len = text.chars().count() as f64;
        (len / self.length_penalty_divisor).min(self.length_penalty_cap)
    }

    /// Score a candidate suggestion
    pub fn score(&self, source: SuggestionSource, quality: MatchQuality, text: &str) -> f64 {
        self.source_boost(source) + self.match_bonus(quality) - self.length_penalty(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(MatchQuality::classify("foo", ""), MatchQuality::Partial);
        assert_eq!(MatchQuality::classify("foo", "foo"), MatchQuality::Exact);
        assert_eq!(MatchQuality::classify("foobar", "foo"), MatchQuality::Prefix);
        assert_eq!(MatchQuality::classify("Foobar", "foo"), MatchQuality::None);
    }

    #[test]
    fn test_length_penalty_is_capped() {
        let config = ScoringConfig::default();
        assert_eq!(config.length_penalty("abcd"), 1.0);
        assert_eq!(config.length_penalty(&"x".repeat(1000)), 40.0);
    }

    #[test]
    fn test_source_ordering_survives_length_penalty() {
        let config = ScoringConfig::default();
        let long = "x".repeat(500);
        let sources = [
            SuggestionSource::DocumentTree,
            SuggestionSource::LiveListing,
            SuggestionSource::History,
            SuggestionSource::Snippet,
        ];
        for pair in sources.windows(2) {
            let higher = config.score(pair[0], MatchQuality::Prefix, &long);
            let lower = config.score(pair[1], MatchQuality::Prefix, "x");
            assert!(higher > lower, "{:?} should outrank {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_partial_sits_between_prefix_and_none() {
        let config = ScoringConfig::default();
        let partial = config.score(SuggestionSource::History, MatchQuality::Partial, "ls");
        let prefix = config.score(SuggestionSource::History, MatchQuality::Prefix, "ls");
        let none = config.score(SuggestionSource::History, MatchQuality::None, "ls");
        assert!(prefix > partial && partial > none);
    }

    #[test]
    fn test_overrides_deserialize_over_defaults() {
        let config: ScoringConfig = serde_json::from_str(r#"{"snippet_boost": 10.0}"#).unwrap();
        assert_eq!(config.snippet_boost, 10.0);
        assert_eq!(config.history_boost, 200.0);
    }
}
