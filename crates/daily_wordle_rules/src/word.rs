//! Validated five-letter words.

use crate::{RulesError, WORD_LENGTH};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// A five-letter word, always stored in uppercase.
///
/// Construction is the only place length and alphabet are checked, so any
/// `Word` in hand can be scored without further validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word {
    text: String,
}

impl Word {
    /// Parses and normalises a word.
    ///
    /// Input is case-insensitive and is not trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidLength`] unless the input has exactly five
    /// characters, and [`RulesError::NonAlphabetic`] if any of them is not an
    /// ASCII letter.
    #[instrument(fields(text = %text))]
    pub fn parse(text: &str) -> Result<Self, RulesError> {
        let actual = text.chars().count();
        if actual != WORD_LENGTH {
            return Err(RulesError::InvalidLength {
                expected: WORD_LENGTH,
                actual,
            });
        }

        if !text.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RulesError::NonAlphabetic {
                word: text.to_string(),
            });
        }

        Ok(Self {
            text: text.to_ascii_uppercase(),
        })
    }

    /// Returns the uppercase text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the letters as ASCII bytes.
    pub fn letters(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

impl FromStr for Word {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Word {
    type Error = RulesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.text
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
