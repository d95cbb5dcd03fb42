//! Guess scoring.
//!
//! Scoring is two-pass so repeated letters are handled the standard way:
//! exact matches claim their target letters first, then the remaining
//! guess letters claim unconsumed target letters left to right.

use crate::{RulesError, WORD_LENGTH, Word};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Verdict for a single guess letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Right letter in the right position.
    Exact,
    /// Letter appears at another, not yet consumed, target position.
    Present,
    /// No remaining target position holds this letter.
    Absent,
}

impl Verdict {
    /// Returns the one-character symbol used in stored feedback strings.
    pub fn symbol(self) -> char {
        match self {
            Self::Exact => 'G',
            Self::Present => 'O',
            Self::Absent => '-',
        }
    }

    /// Decodes a stored feedback symbol.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'G' => Some(Self::Exact),
            'O' => Some(Self::Present),
            '-' => Some(Self::Absent),
            _ => None,
        }
    }
}

/// Verdicts for one guess, in guess-position order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Feedback {
    verdicts: [Verdict; WORD_LENGTH],
}

impl Feedback {
    /// Scores `guess` against `target`.
    #[instrument(skip(target, guess), fields(target = %target, guess = %guess))]
    pub fn compute(target: &Word, guess: &Word) -> Self {
        let target = target.letters();
        let guess = guess.letters();

        let mut verdicts = [Verdict::Absent; WORD_LENGTH];
        let mut consumed = [false; WORD_LENGTH];

        for i in 0..WORD_LENGTH {
            if guess[i] == target[i] {
                verdicts[i] = Verdict::Exact;
                consumed[i] = true;
            }
        }

        for i in 0..WORD_LENGTH {
            if verdicts[i] == Verdict::Exact {
                continue;
            }
            let claim = (0..WORD_LENGTH).find(|&j| !consumed[j] && target[j] == guess[i]);
            if let Some(j) = claim {
                consumed[j] = true;
                verdicts[i] = Verdict::Present;
            }
        }

        let feedback = Self { verdicts };
        debug!(feedback = %feedback, "Guess scored");
        feedback
    }

    /// Returns the verdicts in guess-position order.
    pub fn verdicts(&self) -> &[Verdict; WORD_LENGTH] {
        &self.verdicts
    }

    /// True when every letter is an exact match.
    pub fn is_solved(&self) -> bool {
        self.verdicts.iter().all(|v| *v == Verdict::Exact)
    }
}

/// Scores `guess` against `target`, validating both words first.
///
/// # Errors
///
/// Returns a [`RulesError`] if either input is not a five-letter word.
#[instrument]
pub fn evaluate(target: &str, guess: &str) -> Result<Feedback, RulesError> {
    let target = Word::parse(target)?;
    let guess = Word::parse(guess)?;
    Ok(Feedback::compute(&target, &guess))
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for verdict in self.verdicts {
            write!(f, "{}", verdict.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for Feedback {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RulesError::InvalidFeedback {
            feedback: s.to_string(),
        };

        if s.chars().count() != WORD_LENGTH {
            return Err(invalid());
        }

        let mut verdicts = [Verdict::Absent; WORD_LENGTH];
        for (slot, symbol) in verdicts.iter_mut().zip(s.chars()) {
            *slot = Verdict::from_symbol(symbol).ok_or_else(invalid)?;
        }
        Ok(Self { verdicts })
    }
}

impl TryFrom<String> for Feedback {
    type Error = RulesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Feedback> for String {
    fn from(feedback: Feedback) -> Self {
        feedback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use Verdict::{Absent, Exact, Present};

    fn score(target: &str, guess: &str) -> [Verdict; WORD_LENGTH] {
        *evaluate(target, guess).unwrap().verdicts()
    }

    #[test]
    fn test_identical_words_are_solved() {
        for word in ["APPLE", "speed", "VIVID", "jumpy"] {
            let feedback = evaluate(word, word).unwrap();
            assert!(feedback.is_solved(), "{word} should score all exact");
        }
    }

    #[test]
    fn test_duplicate_letters_speed_erase() {
        // E claims the first free E, S claims S, last E claims the second E.
        assert_eq!(
            score("SPEED", "ERASE"),
            [Present, Absent, Absent, Present, Present]
        );
        assert_eq!(evaluate("SPEED", "ERASE").unwrap().to_string(), "O--OO");
    }

    #[test]
    fn test_exact_match_consumed_before_present() {
        // The middle P is exact, so only one P is left for the leading P.
        assert_eq!(score("APPLE", "PAPPY"), [Present, Present, Exact, Absent, Absent]);
    }

    #[test]
    fn test_repeated_guess_letter_with_single_target_letter() {
        // Only one E in CRANE and it is taken by the exact match.
        assert_eq!(score("CRANE", "EERIE"), [Absent, Absent, Present, Absent, Exact]);
    }

    #[test]
    fn test_leftmost_guess_letter_wins_the_present_claim() {
        assert_eq!(score("ABBEY", "KEEPS"), [Absent, Present, Absent, Absent, Absent]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(score("river", "RIVER"), [Exact; WORD_LENGTH]);
        assert_eq!(score("Ocean", "cANOE"), score("OCEAN", "CANOE"));
    }

    #[test]
    fn test_no_common_letters() {
        assert_eq!(score("BRAVE", "MUSIC"), [Absent; WORD_LENGTH]);
    }

    #[test]
    fn test_invalid_length_fails_fast() {
        assert!(matches!(
            evaluate("APPLE", "APPLES"),
            Err(RulesError::InvalidLength { actual: 6, .. })
        ));
        assert!(matches!(
            evaluate("APP", "APPLE"),
            Err(RulesError::InvalidLength { actual: 3, .. })
        ));
    }

    #[test]
    fn test_matches_never_exceed_target_letter_count() {
        let words = [
            "SPEED", "ERASE", "APPLE", "PAPPY", "EERIE", "CRANE", "LLAMA", "ALLAY", "GEESE",
            "EEEEE", "ABBEY", "BOBBY", "STONE", "NOTES",
        ];
        for target in words {
            for guess in words {
                let feedback = evaluate(target, guess).unwrap();
                assert_eq!(feedback.verdicts().len(), WORD_LENGTH);
                for letter in guess.bytes() {
                    let in_target = target.bytes().filter(|b| *b == letter).count();
                    let credited = guess
                        .bytes()
                        .zip(feedback.verdicts())
                        .filter(|(b, v)| *b == letter && **v != Absent)
                        .count();
                    assert!(
                        credited <= in_target,
                        "{guess} vs {target}: {} credited {credited} > {in_target}",
                        letter as char
                    );
                }
            }
        }
    }

    #[test]
    fn test_parse_stored_feedback() {
        let feedback: Feedback = "GO-OG".parse().unwrap();
        assert_eq!(
            feedback.verdicts(),
            &[Exact, Present, Absent, Present, Exact]
        );
        assert!("GGGG".parse::<Feedback>().is_err());
        assert!("GGGGX".parse::<Feedback>().is_err());
    }

    #[test]
    fn test_symbols_are_distinct() {
        let symbols: Vec<char> = Verdict::iter().map(Verdict::symbol).collect();
        for verdict in Verdict::iter() {
            assert_eq!(Verdict::from_symbol(verdict.symbol()), Some(verdict));
        }
        assert_eq!(symbols, vec!['G', 'O', '-']);
    }
}
