//! Unicode normalization applied before pre-tokenization.

use crate::error::TokenizerError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Normalization form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum NormalizationForm {
    /// No normalization
    #[default]
    None,
    /// Canonical composition
    NFC,
    /// Canonical decomposition
    NFD,
    /// Compatibility composition
    NFKC,
    /// Compatibility decomposition
    NFKD,
}

impl FromStr for NormalizationForm {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "nfc" => Ok(Self::NFC),
            "nfd" => Ok(Self::NFD),
            "nfkc" => Ok(Self::NFKC),
            "nfkd" => Ok(Self::NFKD),
            other => Err(TokenizerError::InvalidConfig(format!(
                "unknown normalization form: {other}"
            ))),
        }
    }
}

impl fmt::Display for NormalizationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::NFC => "nfc",
            Self::NFD => "nfd",
            Self::NFKC => "nfkc",
            Self::NFKD => "nfkd",
        };
        f.write_str(name)
    }
}

/// Unicode normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    /// Normalization form to apply
    form: NormalizationForm,
}

impl Normalizer {
    /// Create a new normalizer.
    pub fn new(form: NormalizationForm) -> Self {
        Self { form }
    }

    /// Normalize text. Borrows when normalization is disabled.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self.form {
            NormalizationForm::None => Cow::Borrowed(text),
            NormalizationForm::NFC => Cow::Owned(text.nfc().collect()),
            NormalizationForm::NFD => Cow::Owned(text.nfd().collect()),
            NormalizationForm::NFKC => Cow::Owned(text.nfkc().collect()),
            NormalizationForm::NFKD => Cow::Owned(text.nfkd().collect()),
        }
    }

    /// Check if normalization is enabled.
    pub fn is_enabled(&self) -> bool {
        self.form != NormalizationForm::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfc_normalization() {
        let normalizer = Normalizer::new(NormalizationForm::NFC);
        let text = "e\u{0301}"; // e + combining acute accent
        assert_eq!(normalizer.normalize(text), "\u{00e9}");
    }

    #[test]
    fn test_nfd_normalization() {
        let normalizer = Normalizer::new(NormalizationForm::NFD);
        assert_eq!(normalizer.normalize("\u{00e9}"), "e\u{0301}");
    }

    #[test]
    fn test_default_is_disabled() {
        let normalizer = Normalizer::default();
        assert!(!normalizer.is_enabled());
        assert!(matches!(normalizer.normalize("Hello"), Cow::Borrowed("Hello")));
    }

    #[test]
    fn test_parse_form() {
        assert_eq!("NFKC".parse::<NormalizationForm>(), Ok(NormalizationForm::NFKC));
        assert_eq!("none".parse::<NormalizationForm>(), Ok(NormalizationForm::None));
        assert!("nfx".parse::<NormalizationForm>().is_err());
        assert_eq!(NormalizationForm::NFD.to_string(), "nfd");
    }
}
