//! Rule violations.

/// Error raised when input or state breaks the game rules.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RulesError {
    /// The word does not have exactly five characters.
    #[display("Word must be exactly {} letters, got {}", expected, actual)]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// The word contains something other than ASCII letters.
    #[display("Word must contain only letters A-Z: '{}'", word)]
    NonAlphabetic {
        /// The rejected input.
        word: String,
    },

    /// A stored feedback string could not be decoded.
    #[display("Invalid feedback string: '{}'", feedback)]
    InvalidFeedback {
        /// The rejected input.
        feedback: String,
    },

    /// The game already reached a terminal state.
    #[display("Game is already finished")]
    AlreadyFinished,

    /// Every allowed guess has been used.
    #[display("All {} guesses have been used", allowed)]
    GuessesExhausted {
        /// Guesses allowed in the game.
        allowed: u32,
    },
}
