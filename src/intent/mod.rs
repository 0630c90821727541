//! Intent classification
//!
//! Maps a final transcript and the caller-supplied session language to a
//! tagged [`Intent`]. Classification is pure and deterministic: the
//! transcript is folded (case, diacritics, Urdu letter variants, whitespace),
//! then the locale's ordered rule table is scanned and the first matching
//! rule decides the intent. The title fragment is cut from the original
//! transcript so the speaker's casing is kept.
//!
//! The locale is never inferred from the text. Mixed-script input under a
//! fixed session language is normal and must not silently switch tables.

pub mod rules;

use crate::locale::Locale;
use crate::text::{self, FoldedText};
use regex::Regex;
use rules::{FragmentRule, RuleSpec, PLACEHOLDERS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Intent tag, used by rule tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Create,
    Complete,
    Uncomplete,
    Delete,
    List,
    FilterCompleted,
    FilterPending,
    SetHighPriority,
    SetNormalPriority,
    Search,
    Unknown,
}

impl IntentKind {
    /// Build the intent value carrying `fragment`
    pub fn with_fragment(self, fragment: String) -> Intent {
        match self {
            IntentKind::Create => Intent::Create {
                title_fragment: fragment,
            },
            IntentKind::Complete => Intent::Complete {
                title_fragment: fragment,
            },
            IntentKind::Uncomplete => Intent::Uncomplete {
                title_fragment: fragment,
            },
            IntentKind::Delete => Intent::Delete {
                title_fragment: fragment,
            },
            IntentKind::List => Intent::List,
            IntentKind::FilterCompleted => Intent::FilterCompleted {
                title_fragment: fragment,
            },
            IntentKind::FilterPending => Intent::FilterPending {
                title_fragment: fragment,
            },
            IntentKind::SetHighPriority => Intent::SetHighPriority {
                title_fragment: fragment,
            },
            IntentKind::SetNormalPriority => Intent::SetNormalPriority {
                title_fragment: fragment,
            },
            IntentKind::Search => Intent::Search {
                title_fragment: fragment,
            },
            IntentKind::Unknown => Intent::Unknown,
        }
    }
}

/// A classified user goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Create { title_fragment: String },
    Complete { title_fragment: String },
    Uncomplete { title_fragment: String },
    Delete { title_fragment: String },
    List,
    /// An empty fragment means "all completed tasks"
    FilterCompleted { title_fragment: String },
    /// An empty fragment means "all pending tasks"
    FilterPending { title_fragment: String },
    SetHighPriority { title_fragment: String },
    SetNormalPriority { title_fragment: String },
    Search { title_fragment: String },
    Unknown,
}

impl Intent {
    /// The intent's tag
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Create { .. } => IntentKind::Create,
            Intent::Complete { .. } => IntentKind::Complete,
            Intent::Uncomplete { .. } => IntentKind::Uncomplete,
            Intent::Delete { .. } => IntentKind::Delete,
            Intent::List => IntentKind::List,
            Intent::FilterCompleted { .. } => IntentKind::FilterCompleted,
            Intent::FilterPending { .. } => IntentKind::FilterPending,
            Intent::SetHighPriority { .. } => IntentKind::SetHighPriority,
            Intent::SetNormalPriority { .. } => IntentKind::SetNormalPriority,
            Intent::Search { .. } => IntentKind::Search,
            Intent::Unknown => IntentKind::Unknown,
        }
    }

    /// The extracted title fragment, if this intent carries one
    pub fn title_fragment(&self) -> Option<&str> {
        match self {
            Intent::Create { title_fragment }
            | Intent::Complete { title_fragment }
            | Intent::Uncomplete { title_fragment }
            | Intent::Delete { title_fragment }
            | Intent::FilterCompleted { title_fragment }
            | Intent::FilterPending { title_fragment }
            | Intent::SetHighPriority { title_fragment }
            | Intent::SetNormalPriority { title_fragment }
            | Intent::Search { title_fragment } => Some(title_fragment),
            Intent::List | Intent::Unknown => None,
        }
    }

    /// Whether executing this intent needs a task snapshot
    pub fn needs_snapshot(&self) -> bool {
        !matches!(self, Intent::Create { .. } | Intent::Unknown)
    }
}

/// Error compiling a rule table
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid pattern for {intent:?} rule #{index}: {source}")]
    Pattern {
        intent: IntentKind,
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("{intent:?} rule #{index} must {expectation} a `title` capture")]
    TitleCapture {
        intent: IntentKind,
        index: usize,
        expectation: &'static str,
    },
}

/// A compiled rule
#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    intent: IntentKind,
    fragment: FragmentRule,
}

/// An ordered, compiled rule table for one locale
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Compile rule specs, expanding placeholders
    ///
    /// Fails if a pattern does not compile, or if a rule's fragment setting
    /// disagrees with whether the pattern has a `title` capture.
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, RuleError> {
        let mut rules = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            let expanded = PLACEHOLDERS
                .iter()
                .fold(spec.pattern.to_string(), |acc, (key, value)| {
                    acc.replace(key, value)
                });
            let pattern = Regex::new(&text::fold_pattern(&expanded)).map_err(|source| {
                RuleError::Pattern {
                    intent: spec.intent,
                    index,
                    source,
                }
            })?;

            let has_title = pattern.capture_names().any(|n| n == Some("title"));
            match (spec.fragment, has_title) {
                (FragmentRule::None, true) => {
                    return Err(RuleError::TitleCapture {
                        intent: spec.intent,
                        index,
                        expectation: "not have",
                    })
                }
                (FragmentRule::Required | FragmentRule::Optional, false) => {
                    return Err(RuleError::TitleCapture {
                        intent: spec.intent,
                        index,
                        expectation: "have",
                    })
                }
                _ => {}
            }

            rules.push(Rule {
                pattern,
                intent: spec.intent,
                fragment: spec.fragment,
            });
        }

        Ok(Self { rules })
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching `folded`, as an intent
    fn classify(&self, folded: &FoldedText<'_>) -> Option<Intent> {
        for (index, rule) in self.rules.iter().enumerate() {
            let Some(caps) = rule.pattern.captures(folded.as_str()) else {
                continue;
            };

            let fragment = caps
                .name("title")
                .map(|m| text::clean_fragment(folded.source_slice(m.range())))
                .unwrap_or_default();

            tracing::debug!(
                "Rule #{} ({:?}) matched, fragment={:?}",
                index,
                rule.intent,
                fragment
            );

            return Some(match rule.fragment {
                FragmentRule::Required if fragment.is_empty() => Intent::Unknown,
                FragmentRule::None => rule.intent.with_fragment(String::new()),
                _ => rule.intent.with_fragment(fragment),
            });
        }
        None
    }
}

/// Built-in classifier, compiled once
static DEFAULT_CLASSIFIER: LazyLock<IntentClassifier> = LazyLock::new(IntentClassifier::builtin);

/// Rule-table driven classifier
///
/// Holds one table per locale. Adding a language means adding a table with
/// [`IntentClassifier::with_table`]; the matching logic does not change.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    tables: HashMap<Locale, RuleTable>,
}

impl IntentClassifier {
    /// Classifier with the built-in English and Urdu tables
    pub fn builtin() -> Self {
        Self::default()
            .with_table(
                Locale::English,
                RuleTable::compile(rules::ENGLISH).expect("built-in English rules must compile"),
            )
            .with_table(
                Locale::Urdu,
                RuleTable::compile(rules::URDU).expect("built-in Urdu rules must compile"),
            )
    }

    /// Add or replace the table for `locale`
    pub fn with_table(mut self, locale: Locale, table: RuleTable) -> Self {
        self.tables.insert(locale, table);
        self
    }

    /// Table registered for `locale`
    pub fn table(&self, locale: Locale) -> Option<&RuleTable> {
        self.tables.get(&locale)
    }

    /// Classify a transcript under the given session language
    pub fn classify(&self, transcript: &str, language: Locale) -> Intent {
        let folded = FoldedText::new(transcript);
        if folded.is_empty() {
            return Intent::Unknown;
        }

        let Some(table) = self.tables.get(&language) else {
            tracing::warn!("No rule table for locale {}", language);
            return Intent::Unknown;
        };

        table.classify(&folded).unwrap_or(Intent::Unknown)
    }
}

/// Classify with the built-in tables
pub fn classify(transcript: &str, language: Locale) -> Intent {
    DEFAULT_CLASSIFIER.classify(transcript, language)
}
