//! Transcript text normalisation
//!
//! Speech recognisers are inconsistent about case, diacritics and which
//! Unicode code point they emit for a given Urdu letter. Everything that
//! compares spoken text against rules or task titles goes through the folds
//! in this module so both sides are normalised identically.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Runs of whitespace
static WHITESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Punctuation and symbols (Latin and Arabic script)
static PUNCTUATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{P}\p{S}]+").unwrap());

/// Sentence punctuation recognisers append to the end of an utterance
static TRAILING_PUNCTUATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.!?,;:۔؟،]+$").unwrap());

/// Quotes wrapping a dictated title
static WRAPPING_QUOTES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["'“”‘’«»]+|["'“”‘’«»]+$"#).unwrap());

/// Returns true for combining marks and joiners that carry no matching weight
fn is_ignorable(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'   // Latin combining diacritics
        | '\u{0610}'..='\u{061A}' // Arabic honorific marks
        | '\u{064B}'..='\u{065F}' // harakat (zabar, zer, pesh, tashdid...)
        | '\u{0670}'              // superscript alef
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E4}'
        | '\u{06E7}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}'
        | '\u{0640}'              // tatweel
        | '\u{200C}'..='\u{200F}' // ZWNJ, ZWJ, direction marks
    )
}

/// Fold a lowercase letter to its matching form
fn fold_letter(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        // Arabic code points recognisers emit in place of Urdu letters
        'ي' | 'ى' | 'ئ' => 'ی',
        'ك' => 'ک',
        'ه' | 'ۀ' => 'ہ',
        'أ' | 'إ' | 'ٱ' => 'ا',
        // Arabic-Indic and Extended Arabic-Indic digits
        '\u{0660}'..='\u{0669}' => char::from_u32('0' as u32 + (c as u32 - 0x0660)).unwrap_or(c),
        '\u{06F0}'..='\u{06F9}' => char::from_u32('0' as u32 + (c as u32 - 0x06F0)).unwrap_or(c),
        _ => c,
    }
}

/// Append the folded form of `c` (case-folded, diacritics removed) to `out`
fn push_folded(c: char, out: &mut String) {
    if is_ignorable(c) {
        return;
    }
    for lower in c.to_lowercase() {
        if !is_ignorable(lower) {
            out.push(fold_letter(lower));
        }
    }
}

/// Case-fold, strip diacritics, collapse whitespace and trim
pub fn fold(text: &str) -> String {
    FoldedText::new(text).into_folded()
}

/// Fold only the non-ASCII characters of a regex pattern
///
/// Rule patterns are written in their folded form, but this keeps a pattern
/// typed with an Arabic `ي` or `ك` matching what `fold` produces. ASCII is
/// left alone so escapes such as `\S` keep their meaning.
pub fn fold_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            push_folded(c, &mut out);
        }
    }
    out
}

/// Normalise a task title or spoken fragment for similarity scoring
///
/// Folds the text, replaces punctuation and symbols with spaces, then
/// collapses whitespace. "Buy milk (2%)!" becomes "buy milk 2".
pub fn normalise_title(text: &str) -> String {
    let folded = fold(text);
    let stripped = PUNCTUATION_PATTERN.replace_all(&folded, " ");
    normalise_whitespace(&stripped)
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalise_whitespace(text: &str) -> String {
    WHITESPACE_PATTERN.replace_all(text, " ").trim().to_string()
}

/// Clean a title fragment cut out of a transcript
///
/// Collapses whitespace, drops sentence punctuation the recogniser appended
/// and unwraps quotes, keeping the speaker's casing.
pub fn clean_fragment(fragment: &str) -> String {
    let collapsed = normalise_whitespace(fragment);
    let unquoted = WRAPPING_QUOTES_PATTERN.replace_all(&collapsed, "");
    let trimmed = TRAILING_PUNCTUATION_PATTERN.replace(&unquoted, "");
    WRAPPING_QUOTES_PATTERN
        .replace_all(trimmed.trim(), "")
        .trim()
        .to_string()
}

/// First `max_chars` characters of `text`, for log lines
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Byte range of one source character and where its folded form begins
#[derive(Debug, Clone, Copy)]
struct SourceSpan {
    folded_start: usize,
    source_start: usize,
    source_end: usize,
}

/// A folded view of a transcript that can map matches back to the source
///
/// Rules match against the folded text, but titles must be extracted from
/// the original so the speaker's casing and spelling survive.
#[derive(Debug)]
pub struct FoldedText<'a> {
    source: &'a str,
    folded: String,
    spans: Vec<SourceSpan>,
}

impl<'a> FoldedText<'a> {
    /// Fold `source`, recording the origin of every folded character
    pub fn new(source: &'a str) -> Self {
        let mut folded = String::with_capacity(source.len());
        let mut spans = Vec::with_capacity(source.len());
        let mut pending_space = false;
        let mut scratch = String::new();

        for (start, c) in source.char_indices() {
            if c.is_whitespace() {
                pending_space = !folded.is_empty();
                continue;
            }

            scratch.clear();
            push_folded(c, &mut scratch);
            if scratch.is_empty() {
                continue;
            }

            if pending_space {
                spans.push(SourceSpan {
                    folded_start: folded.len(),
                    source_start: start,
                    source_end: start,
                });
                folded.push(' ');
                pending_space = false;
            }

            spans.push(SourceSpan {
                folded_start: folded.len(),
                source_start: start,
                source_end: start + c.len_utf8(),
            });
            folded.push_str(&scratch);
        }

        Self {
            source,
            folded,
            spans,
        }
    }

    /// The folded text
    pub fn as_str(&self) -> &str {
        &self.folded
    }

    /// Whether nothing but whitespace and marks was folded
    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    /// Consume into the folded string
    pub fn into_folded(self) -> String {
        self.folded
    }

    /// Slice of the original text that produced `range` of the folded text
    pub fn source_slice(&self, range: Range<usize>) -> &'a str {
        let in_range = |span: &&SourceSpan| {
            span.folded_start >= range.start && span.folded_start < range.end
        };
        let first = self.spans.iter().find(in_range);
        let last = self.spans.iter().rev().find(in_range);

        match (first, last) {
            (Some(first), Some(last)) if first.source_start <= last.source_end => {
                &self.source[first.source_start..last.source_end]
            }
            _ => "",
        }
    }
}
