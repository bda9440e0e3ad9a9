//! # Ignore-Phrase Vocabulary
//!
//! Phrase fragments that mark a receipt line as "not an item": totals, promos,
//! tax, tip, loyalty. The line extractor drops any line containing one of
//! these as a case-insensitive substring, so this table decides which lines
//! can ever reach `ParsedReceipt.items`.
//!
//! ## Per-Receipt Overrides
//! ```text
//! DEFAULT_IGNORE_PHRASES ──┐
//!                          ├── Extend  (default) → default ∪ hints
//! hints.ignore_phrases ────┤
//!                          └── Replace           → hints only
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::NormalizerHints;

/// Default vocabulary, lowercase, in match-priority order.
pub const DEFAULT_IGNORE_PHRASES: &[&str] = &[
    "discount total",
    "discount",
    "spend",
    "save",
    "savings",
    "promo",
    "coupon",
    "member",
    "loyalty",
    "rewards",
    "bogo",
    "% off",
    "tax",
    "tip",
    "gratuity",
    "service charge",
    "total",
    "amount due",
    "balance due",
];

/// How per-receipt phrases combine with the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum IgnorePhrasePolicy {
    /// Union of the defaults and the extra phrases.
    #[default]
    Extend,
    /// Extra phrases only. An empty extra list keeps the defaults.
    Replace,
}

impl std::fmt::Display for IgnorePhrasePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnorePhrasePolicy::Extend => write!(f, "extend"),
            IgnorePhrasePolicy::Replace => write!(f, "replace"),
        }
    }
}

impl std::str::FromStr for IgnorePhrasePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extend" | "union" => Ok(IgnorePhrasePolicy::Extend),
            "replace" | "override" => Ok(IgnorePhrasePolicy::Replace),
            other => Err(format!(
                "Unknown ignore-phrase policy: '{}'. Valid options: extend, replace",
                other
            )),
        }
    }
}

/// The effective phrase list for one receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreVocabulary {
    phrases: Vec<String>,
}

impl Default for IgnoreVocabulary {
    fn default() -> Self {
        IgnoreVocabulary {
            phrases: DEFAULT_IGNORE_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl IgnoreVocabulary {
    /// Builds the vocabulary from parser hints.
    pub fn from_hints(hints: &NormalizerHints, policy: IgnorePhrasePolicy) -> Self {
        match &hints.ignore_phrases {
            Some(extra) => Self::with_phrases(extra, policy),
            None => Self::default(),
        }
    }

    /// Combines `extra` with the defaults according to `policy`.
    ///
    /// Phrases are trimmed and lowercased; blanks and duplicates are dropped.
    /// Defaults keep their order and extras follow in the order given.
    pub fn with_phrases<S: AsRef<str>>(extra: &[S], policy: IgnorePhrasePolicy) -> Self {
        let extra: Vec<String> = extra
            .iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let mut phrases: Vec<String> = match policy {
            IgnorePhrasePolicy::Replace if !extra.is_empty() => Vec::new(),
            _ => DEFAULT_IGNORE_PHRASES.iter().map(|p| p.to_string()).collect(),
        };
        for phrase in extra {
            if !phrases.contains(&phrase) {
                phrases.push(phrase);
            }
        }

        IgnoreVocabulary { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// The first phrase contained in `line`, if any.
    pub fn matching_phrase(&self, line: &str) -> Option<&str> {
        let lowered = line.to_lowercase();
        self.phrases
            .iter()
            .find(|p| lowered.contains(p.as_str()))
            .map(String::as_str)
    }

    /// True when `line` must be excluded from item extraction.
    pub fn is_ignored(&self, line: &str) -> bool {
        self.matching_phrase(line).is_some()
    }

    /// Non-blank lines of `raw_text` that may hold an item.
    pub fn candidate_item_lines<'a>(&self, raw_text: &'a str) -> Vec<&'a str> {
        non_blank_lines(raw_text)
            .filter(|line| !self.is_ignored(line))
            .collect()
    }

    /// Non-blank lines of `raw_text` excluded from item extraction.
    ///
    /// Together with [`Self::candidate_item_lines`] this covers every
    /// non-blank line exactly once.
    pub fn ignored_lines<'a>(&self, raw_text: &'a str) -> Vec<&'a str> {
        non_blank_lines(raw_text)
            .filter(|line| self.is_ignored(line))
            .collect()
    }
}

fn non_blank_lines(raw_text: &str) -> impl Iterator<Item = &str> {
    raw_text.lines().map(str::trim).filter(|line| !line.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = "\
        BURGER           12.99
        FRIES             3.99
        2 @ SODA          5.00

        Member Savings   -1.00
        SUBTOTAL         21.98
        Sales Tax         1.76
        TIP               4.40
        TOTAL            28.14
    ";

    #[test]
    fn test_default_vocabulary_filters_non_items() {
        let vocab = IgnoreVocabulary::default();
        let lines = vocab.candidate_item_lines(RECEIPT);
        assert_eq!(
            lines,
            vec!["BURGER           12.99", "FRIES             3.99", "2 @ SODA          5.00"]
        );
    }

    #[test]
    fn test_ignored_lines_complement_candidates() {
        let vocab = IgnoreVocabulary::default();
        let ignored = vocab.ignored_lines(RECEIPT);
        assert_eq!(
            ignored,
            vec![
                "Member Savings   -1.00",
                "SUBTOTAL         21.98",
                "Sales Tax         1.76",
                "TIP               4.40",
                "TOTAL            28.14",
            ]
        );

        let non_blank = RECEIPT.lines().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(ignored.len() + vocab.candidate_item_lines(RECEIPT).len(), non_blank);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let vocab = IgnoreVocabulary::default();
        assert!(vocab.is_ignored("AMOUNT DUE 10.00"));
        assert!(vocab.is_ignored("20% OFF Pastries"));
        assert_eq!(vocab.matching_phrase("BOGO Chips"), Some("bogo"));
        assert!(!vocab.is_ignored("Pad Thai 12.00"));
    }

    #[test]
    fn test_hints_extend_defaults() {
        let hints = NormalizerHints::new("USD").with_ignore_phrases(["  Bag Fee ", "", "TAX"]);
        let vocab = IgnoreVocabulary::from_hints(&hints, IgnorePhrasePolicy::Extend);

        assert!(vocab.is_ignored("bag fee 0.10"));
        assert!(vocab.is_ignored("Total 5.00"));
        assert_eq!(vocab.phrases().len(), DEFAULT_IGNORE_PHRASES.len() + 1);
        assert_eq!(vocab.phrases().last().map(String::as_str), Some("bag fee"));
    }

    #[test]
    fn test_hints_replace_defaults() {
        let hints = NormalizerHints::new("USD").with_ignore_phrases(["bag fee"]);
        let vocab = IgnoreVocabulary::from_hints(&hints, IgnorePhrasePolicy::Replace);

        assert!(vocab.is_ignored("BAG FEE"));
        assert!(!vocab.is_ignored("Total 5.00"));
    }

    #[test]
    fn test_replace_with_no_phrases_keeps_defaults() {
        let vocab = IgnoreVocabulary::with_phrases::<&str>(&[], IgnorePhrasePolicy::Replace);
        assert_eq!(vocab, IgnoreVocabulary::default());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("extend".parse::<IgnorePhrasePolicy>(), Ok(IgnorePhrasePolicy::Extend));
        assert_eq!("Override".parse::<IgnorePhrasePolicy>(), Ok(IgnorePhrasePolicy::Replace));
        assert!("merge".parse::<IgnorePhrasePolicy>().is_err());
    }
}
