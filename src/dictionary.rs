//! Transcript corrections
//!
//! Word replacements applied to a final transcript before classification.
//! Recognisers mishear a handful of command words consistently ("add to do"
//! for "add todo"); fixing those up front keeps the rule tables clean.
//! Entries come from the `dictionary` section of the config file.

use crate::config::ConfigError;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

/// A dictionary entry for word replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    /// The text to search for and replace
    pub from: String,
    /// The replacement text
    pub to: String,
    /// Whether the match should be case-sensitive
    #[serde(default)]
    pub case_sensitive: bool,
}

impl DictionaryEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            case_sensitive: false,
        }
    }
}

/// Entries a fresh config starts with
pub fn default_entries() -> Vec<DictionaryEntry> {
    vec![
        DictionaryEntry::new("add to do", "add todo"),
        DictionaryEntry::new("add a to do", "add a todo"),
        DictionaryEntry::new("new to do", "new todo"),
        DictionaryEntry::new("nia kaam", "naya kaam"),
        DictionaryEntry::new("نیاکام", "نیا کام"),
    ]
}

/// Compiled set of replacements
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    replacements: Vec<(Regex, String)>,
}

impl Dictionary {
    /// Validate and compile entries, in order
    pub fn new(entries: &[DictionaryEntry]) -> Result<Self, ConfigError> {
        validate_entries(entries)?;

        let replacements = entries
            .iter()
            .map(|entry| {
                let pattern = entry_pattern(entry);
                Regex::new(&pattern)
                    .map(|re| (re, entry.to.clone()))
                    .map_err(|e| {
                        ConfigError::Validation(format!(
                            "Invalid dictionary entry '{}': {}",
                            entry.from, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { replacements })
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Apply every replacement to `text`
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (pattern, to) in &self.replacements {
            result = pattern.replace_all(&result, NoExpand(to)).into_owned();
        }
        result
    }
}

/// Reject blank or duplicate entries
pub fn validate_entries(entries: &[DictionaryEntry]) -> Result<(), ConfigError> {
    for (index, entry) in entries.iter().enumerate() {
        if entry.from.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Dictionary entry {}: the 'from' field cannot be empty",
                index
            )));
        }
        if entry.to.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Dictionary entry {}: the 'to' field cannot be empty",
                index
            )));
        }

        let from_lower = entry.from.to_lowercase();
        if entries[..index]
            .iter()
            .any(|e| e.from.to_lowercase() == from_lower)
        {
            return Err(ConfigError::Validation(format!(
                "An entry for '{}' already exists",
                entry.from
            )));
        }
    }
    Ok(())
}

/// Whole-word pattern for an entry
///
/// Word boundaries are only asserted next to word characters, so entries
/// that start or end with punctuation still match.
fn entry_pattern(entry: &DictionaryEntry) -> String {
    let from = entry.from.trim();
    let boundary = |c: Option<char>| {
        if c.is_some_and(|c| c.is_alphanumeric()) {
            r"\b"
        } else {
            ""
        }
    };

    format!(
        "{}{}{}{}",
        if entry.case_sensitive { "" } else { "(?i)" },
        boundary(from.chars().next()),
        regex::escape(from).replace(' ', r"\s+"),
        boundary(from.chars().last()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(entries: &[(&str, &str)]) -> Dictionary {
        let entries: Vec<_> = entries
            .iter()
            .map(|(from, to)| DictionaryEntry::new(*from, *to))
            .collect();
        Dictionary::new(&entries).unwrap()
    }

    #[test]
    fn test_apply_case_insensitive() {
        let dict = dictionary(&[("add to do", "add todo")]);
        assert_eq!(dict.apply("Add To Do: buy milk"), "add todo: buy milk");
        assert_eq!(dict.apply("add  to do buy milk"), "add todo buy milk");
    }

    #[test]
    fn test_apply_whole_words_only() {
        let dict = dictionary(&[("milk", "oat milk")]);
        assert_eq!(dict.apply("buy milk"), "buy oat milk");
        assert_eq!(dict.apply("buy milkshake"), "buy milkshake");
    }

    #[test]
    fn test_apply_case_sensitive() {
        let entries = vec![DictionaryEntry {
            from: "Rust".to_string(),
            to: "Rust language".to_string(),
            case_sensitive: true,
        }];
        let dict = Dictionary::new(&entries).unwrap();
        assert_eq!(dict.apply("rust and Rust"), "rust and Rust language");
    }

    #[test]
    fn test_apply_urdu() {
        let dict = dictionary(&[("نیاکام", "نیا کام")]);
        assert_eq!(dict.apply("نیاکام: دودھ"), "نیا کام: دودھ");
    }

    #[test]
    fn test_replacement_is_literal() {
        let dict = dictionary(&[("cost", "$1 price")]);
        assert_eq!(dict.apply("check cost"), "check $1 price");
    }

    #[test]
    fn test_empty_dictionary_is_identity() {
        let dict = Dictionary::default();
        assert!(dict.is_empty());
        assert_eq!(dict.apply("Add todo: x"), "Add todo: x");
    }

    #[test]
    fn test_validation_rejects_blank_and_duplicate() {
        let blank = vec![DictionaryEntry::new("  ", "x")];
        assert!(matches!(
            Dictionary::new(&blank),
            Err(ConfigError::Validation(_))
        ));

        let blank_to = vec![DictionaryEntry::new("x", "")];
        assert!(Dictionary::new(&blank_to).is_err());

        let duplicate = vec![
            DictionaryEntry::new("To Do", "todo"),
            DictionaryEntry::new("to do", "todo"),
        ];
        let err = Dictionary::new(&duplicate).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_default_entries_are_valid() {
        let dict = Dictionary::new(&default_entries()).unwrap();
        assert_eq!(dict.len(), default_entries().len());
        assert_eq!(dict.apply("add a to do call mom"), "add a todo call mom");
    }

    #[test]
    fn test_entry_deserialisation() {
        let entry: DictionaryEntry =
            serde_json::from_str(r#"{"from":"to do","to":"todo","caseSensitive":true}"#).unwrap();
        assert!(entry.case_sensitive);

        let entry: DictionaryEntry = serde_json::from_str(r#"{"from":"a","to":"b"}"#).unwrap();
        assert!(!entry.case_sensitive);
    }
}
