//! Supported command languages
//!
//! The session language is always chosen by the caller. Urdu covers both
//! Urdu script and Roman Urdu transliteration, since speech recognisers set
//! to `ur-PK` emit either depending on the speaker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language of a voice session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ur")]
    Urdu,
}

impl Locale {
    /// All locales with a rule table and message catalogue
    pub const ALL: [Locale; 2] = [Locale::English, Locale::Urdu];

    /// Short language code ("en", "ur")
    pub fn code(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Urdu => "ur",
        }
    }

    /// BCP-47 tag handed to the speech platform
    pub fn speech_tag(&self) -> &'static str {
        match self {
            Locale::English => "en-US",
            Locale::Urdu => "ur-PK",
        }
    }

    /// Parse a language code or BCP-47 tag ("en", "en-GB", "ur-PK")
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::English),
            "ur" => Some(Locale::Urdu),
            _ => None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_accepts_tags() {
        assert_eq!(Locale::from_code("en"), Some(Locale::English));
        assert_eq!(Locale::from_code("en-GB"), Some(Locale::English));
        assert_eq!(Locale::from_code("ur_PK"), Some(Locale::Urdu));
        assert_eq!(Locale::from_code(" UR "), Some(Locale::Urdu));
        assert_eq!(Locale::from_code("de"), None);
        assert_eq!(Locale::from_code(""), None);
    }

    #[test]
    fn test_locale_serialises_as_code() {
        assert_eq!(serde_json::to_string(&Locale::Urdu).unwrap(), "\"ur\"");
        assert_eq!(
            serde_json::from_str::<Locale>("\"en\"").unwrap(),
            Locale::English
        );
    }
}
