//! Task resolution
//!
//! Matches a spoken title fragment against a task snapshot. Both sides are
//! normalised identically (see [`text::normalise_title`]) and every task is
//! scored in `[0, 1]`:
//!
//! - edit similarity, `1 - d / len`, counted only while the edit distance
//!   stays within a quarter of the longer title (absorbs recogniser noise
//!   without letting short titles match anything)
//! - word-boundary containment, `0.7 + 0.3 * shorter / longer`
//! - token coverage for reordered or partially heard phrases
//!
//! The best of the three is the task's score. Tasks at or above the
//! acceptance threshold are candidates; a single candidate, or a leader
//! ahead of the runner-up by more than the dominance margin, resolves
//! uniquely. Anything else is ambiguous and never guessed.

use crate::config::ConfigError;
use crate::tasks::Task;
use crate::text;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Resolver tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum score for a task to be a candidate
    pub acceptance_threshold: f64,
    /// Lead the top candidate needs over the runner-up to win outright
    pub dominance_margin: f64,
    /// Minimum score for near-miss suggestions and search hits
    pub suggestion_threshold: f64,
    /// Most candidates listed in an ambiguous result
    pub max_candidates: usize,
    /// A single exact normalised match resolves without scoring the rest
    pub prefer_exact_match: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.6,
            dominance_margin: 0.15,
            suggestion_threshold: 0.35,
            max_candidates: 3,
            prefer_exact_match: true,
        }
    }
}

impl ResolverConfig {
    /// Check thresholds are in range and consistent
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.acceptance_threshold) {
            return Err(ConfigError::Validation(format!(
                "acceptance_threshold must be between 0 and 1, got {}",
                self.acceptance_threshold
            )));
        }
        if !unit.contains(&self.dominance_margin) {
            return Err(ConfigError::Validation(format!(
                "dominance_margin must be between 0 and 1, got {}",
                self.dominance_margin
            )));
        }
        if !unit.contains(&self.suggestion_threshold) {
            return Err(ConfigError::Validation(format!(
                "suggestion_threshold must be between 0 and 1, got {}",
                self.suggestion_threshold
            )));
        }
        if self.suggestion_threshold > self.acceptance_threshold {
            return Err(ConfigError::Validation(
                "suggestion_threshold must not exceed acceptance_threshold".to_string(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::Validation(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of matching a fragment against the task snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one task matches
    Unique(Task),
    /// Nothing matches; carries the fragment as spoken
    NotFound(String),
    /// Several tasks match with no clear winner, best first
    Ambiguous(Vec<Task>),
}

/// A task with its similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTask {
    pub task: Task,
    pub score: f64,
}

/// Fuzzy title matcher
#[derive(Debug, Clone, Default)]
pub struct TaskResolver {
    config: ResolverConfig,
}

impl TaskResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `fragment` against `tasks`
    pub fn resolve(&self, fragment: &str, tasks: &[Task]) -> Resolution {
        let needle = text::normalise_title(fragment);
        if needle.is_empty() || tasks.is_empty() {
            return Resolution::NotFound(fragment.to_string());
        }

        if self.config.prefer_exact_match {
            let mut exact = tasks
                .iter()
                .filter(|t| text::normalise_title(&t.title) == needle);
            if let (Some(task), None) = (exact.next(), exact.next()) {
                tracing::debug!("Exact title match for {:?}: {}", fragment, task.id);
                return Resolution::Unique(task.clone());
            }
        }

        let candidates = self.rank(&needle, tasks, self.config.acceptance_threshold);

        match candidates.as_slice() {
            [] => {
                tracing::debug!("No task matches {:?}", fragment);
                Resolution::NotFound(fragment.to_string())
            }
            [only] => Resolution::Unique(only.task.clone()),
            [top, runner_up, ..] => {
                tracing::debug!(
                    "Top candidates for {:?}: {:.3} vs {:.3}",
                    fragment,
                    top.score,
                    runner_up.score
                );
                if top.score - runner_up.score > self.config.dominance_margin {
                    Resolution::Unique(top.task.clone())
                } else {
                    Resolution::Ambiguous(
                        candidates
                            .into_iter()
                            .take(self.config.max_candidates)
                            .map(|c| c.task)
                            .collect(),
                    )
                }
            }
        }
    }

    /// Near misses for a fragment that resolved to nothing
    ///
    /// Tasks scoring in `[suggestion_threshold, acceptance_threshold)`, best
    /// first. For display only.
    pub fn suggest(&self, fragment: &str, tasks: &[Task]) -> Vec<Task> {
        let needle = text::normalise_title(fragment);
        if needle.is_empty() {
            return Vec::new();
        }
        self.rank(&needle, tasks, self.config.suggestion_threshold)
            .into_iter()
            .filter(|c| c.score < self.config.acceptance_threshold)
            .take(self.config.max_candidates)
            .map(|c| c.task)
            .collect()
    }

    /// Tasks matching a search query, best first
    pub fn search(&self, query: &str, tasks: &[Task]) -> Vec<ScoredTask> {
        let needle = text::normalise_title(query);
        if needle.is_empty() {
            return Vec::new();
        }
        let mut hits = self.rank(&needle, tasks, self.config.suggestion_threshold);
        hits.truncate(self.config.max_candidates);
        hits
    }

    /// Score every task against a normalised needle, keep those at or above
    /// `threshold`, best first (ties keep snapshot order)
    fn rank(&self, needle: &str, tasks: &[Task], threshold: f64) -> Vec<ScoredTask> {
        let mut scored: Vec<ScoredTask> = tasks
            .iter()
            .map(|task| ScoredTask {
                score: score_normalised(needle, &text::normalise_title(&task.title)),
                task: task.clone(),
            })
            .filter(|c| c.score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored
    }
}

/// Whether a task title contains the fragment as whole words
pub fn contains_words(title: &str, fragment: &str) -> bool {
    let needle = text::normalise_title(fragment);
    !needle.is_empty() && padded(&text::normalise_title(title)).contains(&padded(&needle))
}

/// Resolve with the default tuning
pub fn resolve(fragment: &str, tasks: &[Task]) -> Resolution {
    TaskResolver::default().resolve(fragment, tasks)
}

fn score_normalised(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    edit_similarity(a, b)
        .max(containment(a, b))
        .max(token_coverage(a, b))
}

fn edit_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    let distance = levenshtein(&a, &b);

    if distance > longest / 4 {
        return 0.0;
    }
    1.0 - distance as f64 / longest as f64
}

fn containment(a: &str, b: &str) -> f64 {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    let (shorter, longer, short_len, long_len) = if a_len <= b_len {
        (a, b, a_len, b_len)
    } else {
        (b, a, b_len, a_len)
    };

    if padded(longer).contains(&padded(shorter)) {
        0.7 + 0.3 * (short_len as f64 / long_len as f64)
    } else {
        0.0
    }
}

/// Share of the fragment's words heard in the title, weighted by how close
/// the two word counts are
fn token_coverage(fragment: &str, title: &str) -> f64 {
    let wanted: Vec<&str> = fragment.split(' ').collect();
    let have: Vec<&str> = title.split(' ').collect();

    let matched = wanted
        .iter()
        .filter(|w| have.iter().any(|h| tokens_match(w, h)))
        .count();
    if matched == 0 {
        return 0.0;
    }

    let matched_fraction = matched as f64 / wanted.len() as f64;
    let size_ratio =
        wanted.len().min(have.len()) as f64 / wanted.len().max(have.len()) as f64;
    matched_fraction * (0.6 + 0.3 * size_ratio)
}

fn tokens_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    // Short words must match exactly
    longest >= 4 && levenshtein(&a, &b) <= longest / 4
}

fn padded(s: &str) -> String {
    format!(" {} ", s)
}

/// Levenshtein distance over characters
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(titles: &[&str]) -> Vec<Task> {
        titles.iter().map(|t| Task::new(*t)).collect()
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("دودھ"), &chars("دودھ")), 0);
        assert_eq!(levenshtein(&chars("flaw"), &chars("lawn")), 2);
    }

    #[test]
    fn test_empty_snapshot_is_not_found() {
        for fragment in ["Buy milk", "", "دودھ خریدیں", "!!!"] {
            assert_eq!(
                resolve(fragment, &[]),
                Resolution::NotFound(fragment.to_string())
            );
        }
    }

    #[test]
    fn test_blank_fragment_is_not_found() {
        let snapshot = tasks(&["Buy milk"]);
        assert!(matches!(resolve(" ?! ", &snapshot), Resolution::NotFound(_)));
    }

    #[test]
    fn test_exact_match_is_unique() {
        let snapshot = tasks(&["Call mom", "Buy milk", "Buy milk 2%"]);
        match resolve("buy MILK.", &snapshot) {
            Resolution::Unique(task) => assert_eq!(task.id, snapshot[1].id),
            other => panic!("Expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_near_duplicates_are_ambiguous_without_exact_preference() {
        let resolver = TaskResolver::new(ResolverConfig {
            prefer_exact_match: false,
            ..Default::default()
        });
        let snapshot = tasks(&["Buy milk", "Buy milk 2%"]);

        match resolver.resolve("Buy milk", &snapshot) {
            Resolution::Ambiguous(candidates) => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].title, "Buy milk");
                assert_eq!(candidates[1].title, "Buy milk 2%");
            }
            other => panic!("Expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_exact_titles_are_ambiguous() {
        let snapshot = tasks(&["Buy milk", "buy milk"]);
        assert!(matches!(
            resolve("Buy milk", &snapshot),
            Resolution::Ambiguous(c) if c.len() == 2
        ));
    }

    #[test]
    fn test_transcription_noise_is_absorbed() {
        let snapshot = tasks(&["Buy milk", "Call mom"]);
        match resolve("by milk", &snapshot) {
            Resolution::Unique(task) => assert_eq!(task.title, "Buy milk"),
            other => panic!("Expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_reference_resolves_by_containment() {
        let snapshot = tasks(&["Submit the quarterly report", "Call mom"]);
        match resolve("quarterly report", &snapshot) {
            Resolution::Unique(task) => assert_eq!(task.title, "Submit the quarterly report"),
            other => panic!("Expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_dominant_candidate_wins() {
        // "call mom" scores 1.0 against the first and well under 0.85 against
        // the second
        let resolver = TaskResolver::new(ResolverConfig {
            prefer_exact_match: false,
            ..Default::default()
        });
        let snapshot = tasks(&["Call mom", "Call mom about the birthday party plans"]);
        match resolver.resolve("call mom", &snapshot) {
            Resolution::Unique(task) => assert_eq!(task.title, "Call mom"),
            other => panic!("Expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_short_titles_do_not_match_loosely() {
        let snapshot = tasks(&["Gym", "Jam"]);
        assert!(matches!(resolve("Gum", &snapshot), Resolution::NotFound(_)));
    }

    #[test]
    fn test_ambiguous_is_capped() {
        let snapshot = tasks(&[
            "Buy milk today",
            "Buy milk tomorrow",
            "Buy milk friday",
            "Buy milk later",
        ]);
        match resolve("buy milk", &snapshot) {
            Resolution::Ambiguous(candidates) => assert_eq!(candidates.len(), 3),
            other => panic!("Expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_urdu_titles() {
        let snapshot = tasks(&["دودھ خریدیں", "امی کو فون کریں"]);
        match resolve("دودھ خریدیں", &snapshot) {
            Resolution::Unique(task) => assert_eq!(task.title, "دودھ خریدیں"),
            other => panic!("Expected unique, got {:?}", other),
        }
        // Arabic yeh from the recogniser
        match resolve("دودھ خريديں", &snapshot) {
            Resolution::Unique(task) => assert_eq!(task.title, "دودھ خریدیں"),
            other => panic!("Expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_suggestions_are_near_misses_only() {
        let resolver = TaskResolver::default();
        let snapshot = tasks(&["Water the plants", "Buy milk"]);
        // A confident match is not a near miss
        assert!(resolver.suggest("plants", &snapshot).is_empty());

        // Two of four words heard: 0.5 * (0.6 + 0.3 * 0.75)
        let suggestions = resolver.suggest("water garden plants today", &snapshot);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "Water the plants");
    }

    #[test]
    fn test_search_ranks_hits() {
        let resolver = TaskResolver::default();
        let snapshot = tasks(&["Call mom", "Buy milk", "Buy oat milk"]);
        let hits = resolver.search("milk", &snapshot);
        let titles: Vec<_> = hits.iter().map(|h| h.task.title.as_str()).collect();
        assert_eq!(titles, vec!["Buy milk", "Buy oat milk"]);
    }

    #[test]
    fn test_contains_words() {
        assert!(contains_words("Buy milk (2%)", "MILK"));
        assert!(!contains_words("Buy milkshake", "milk"));
        assert!(!contains_words("Buy milk", ""));
    }

    #[test]
    fn test_config_validation() {
        assert!(ResolverConfig::default().validate().is_ok());

        let config = ResolverConfig {
            acceptance_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ResolverConfig {
            suggestion_threshold: 0.9,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ResolverConfig {
            max_candidates: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
