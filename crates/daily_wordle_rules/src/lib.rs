//! Pure rules for the daily five-letter word game.
//!
//! This crate has no I/O and no notion of time. It provides:
//!
//! - [`Word`]: a validated five-letter word, normalised to uppercase
//! - [`Feedback`]: the per-letter verdicts for a guess against a target
//! - [`Progress`]: the per-game state machine (`Active → Won | Lost`)
//!
//! # Example
//!
//! ```
//! use daily_wordle_rules::{evaluate, Verdict};
//!
//! let feedback = evaluate("speed", "erase")?;
//! assert_eq!(feedback.to_string(), "O--OO");
//! assert_eq!(feedback.verdicts()[1], Verdict::Absent);
//! # Ok::<(), daily_wordle_rules::RulesError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod feedback;
mod progress;
mod word;

pub use error::RulesError;
pub use feedback::{Feedback, Verdict, evaluate};
pub use progress::{GameStatus, Progress, Transition};
pub use word::Word;

/// Number of letters in every target word and every guess.
pub const WORD_LENGTH: usize = 5;

/// Number of guesses a player gets in every game.
pub const GUESSES_ALLOWED: u32 = 5;
