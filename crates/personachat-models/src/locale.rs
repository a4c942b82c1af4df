//! Client locale handling.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Locales the browser client ships translations for.
///
/// Unknown locale tags fall back to English, matching the behavior of the
/// web client's locale switcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Tr,
}

impl Locale {
    /// Parse a locale tag, falling back to English for anything unknown.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "tr" => Locale::Tr,
            _ => Locale::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Tr => "tr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_locales() {
        assert_eq!(Locale::parse("en"), Locale::En);
        assert_eq!(Locale::parse("tr"), Locale::Tr);
    }

    #[test]
    fn test_parse_unknown_falls_back_to_english() {
        assert_eq!(Locale::parse("de"), Locale::En);
        assert_eq!(Locale::parse(""), Locale::En);
    }
}
