//! Response selection among the known replies to a matched prompt.

use serde::Deserialize;
use std::collections::HashMap;

/// Tie-break policy when a prompt has several stored replies.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSelection {
    /// The reply stored most often; the earliest one wins a tie.
    #[default]
    MostFrequent,
    /// The earliest stored reply.
    First,
}

impl ResponseSelection {
    /// Picks a reply from `candidates` (insertion order). `None` if empty.
    pub fn select<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        match self {
            ResponseSelection::First => candidates.first().map(String::as_str),
            ResponseSelection::MostFrequent => most_frequent(candidates),
        }
    }
}

fn most_frequent(candidates: &[String]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for candidate in candidates {
        *counts.entry(candidate.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let count = counts[candidate.as_str()];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((candidate.as_str(), count));
        }
    }
    best.map(|(text, _)| text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replies(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn most_frequent_wins() {
        let candidates = replies(&["a", "b", "b", "c"]);
        assert_eq!(ResponseSelection::MostFrequent.select(&candidates), Some("b"));
    }

    #[test]
    fn most_frequent_tie_goes_to_earliest() {
        let candidates = replies(&["x", "y", "y", "x"]);
        assert_eq!(ResponseSelection::MostFrequent.select(&candidates), Some("x"));
    }

    #[test]
    fn first_ignores_frequency() {
        let candidates = replies(&["a", "b", "b"]);
        assert_eq!(ResponseSelection::First.select(&candidates), Some("a"));
    }

    #[test]
    fn empty_candidates() {
        assert_eq!(ResponseSelection::MostFrequent.select(&[]), None);
        assert_eq!(ResponseSelection::First.select(&[]), None);
    }

    #[test]
    fn deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            selection: ResponseSelection,
        }
        let parsed: Wrapper = toml::from_str("selection = \"most_frequent\"").unwrap();
        assert_eq!(parsed.selection, ResponseSelection::MostFrequent);
    }
}
