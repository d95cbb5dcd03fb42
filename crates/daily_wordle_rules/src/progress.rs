//! Per-game progress state machine.
//!
//! A game starts `Active` and ends in exactly one of two terminal states:
//! `Won` on an all-exact guess, `Lost` when the last allowed guess misses.
//! Nothing leaves a terminal state.

use crate::{Feedback, GUESSES_ALLOWED, RulesError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// Guesses are still accepted.
    Active,
    /// A guess matched every letter.
    Won,
    /// All guesses were used without a match.
    Lost,
}

impl GameStatus {
    /// True for both terminal states.
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Outcome of recording one guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Game is still active.
    Continue,
    /// The guess solved the word.
    Won,
    /// The guess used the last attempt without solving the word.
    Lost,
}

/// Guess counter plus lifecycle state for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    guesses_allowed: u32,
    guesses_made: u32,
    status: GameStatus,
}

impl Progress {
    /// Fresh game: active, no guesses made.
    pub fn new() -> Self {
        Self {
            guesses_allowed: GUESSES_ALLOWED,
            guesses_made: 0,
            status: GameStatus::Active,
        }
    }

    /// Rebuilds progress from stored flags.
    ///
    /// `won` takes precedence over `finished`, so a record flagged as won is
    /// always read back as [`GameStatus::Won`].
    #[instrument]
    pub fn restore(guesses_allowed: u32, guesses_made: u32, won: bool, finished: bool) -> Self {
        let status = match (won, finished) {
            (true, _) => GameStatus::Won,
            (false, true) => GameStatus::Lost,
            (false, false) => GameStatus::Active,
        };
        if won && !finished {
            warn!("Stored game is won but not finished; treating as won");
        }
        Self {
            guesses_allowed,
            guesses_made,
            status,
        }
    }

    /// Records a scored guess and advances the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::AlreadyFinished`] in a terminal state and
    /// [`RulesError::GuessesExhausted`] if the counter is already at the limit.
    #[instrument(skip(self), fields(made = self.guesses_made, status = %self.status))]
    pub fn record(&mut self, feedback: &Feedback) -> Result<Transition, RulesError> {
        if self.status.is_finished() {
            return Err(RulesError::AlreadyFinished);
        }
        if self.is_exhausted() {
            return Err(RulesError::GuessesExhausted {
                allowed: self.guesses_allowed,
            });
        }

        self.guesses_made += 1;

        let transition = if feedback.is_solved() {
            self.status = GameStatus::Won;
            Transition::Won
        } else if self.guesses_made >= self.guesses_allowed {
            self.status = GameStatus::Lost;
            Transition::Lost
        } else {
            Transition::Continue
        };

        debug!(made = self.guesses_made, ?transition, "Guess recorded");
        Ok(transition)
    }

    /// Ends an active game as lost and clamps the counter to the limit.
    ///
    /// Used when a stored game is found with its counter already exhausted.
    #[instrument(skip(self))]
    pub fn force_finish(&mut self) {
        self.guesses_made = self.guesses_made.min(self.guesses_allowed);
        if self.status == GameStatus::Active {
            info!(made = self.guesses_made, "Forcing exhausted game to finish");
            self.status = GameStatus::Lost;
        }
    }

    /// True once no further guess fits under the limit.
    pub fn is_exhausted(&self) -> bool {
        self.guesses_made >= self.guesses_allowed
    }

    /// Guesses left before the game is lost.
    pub fn guesses_remaining(&self) -> u32 {
        self.guesses_allowed.saturating_sub(self.guesses_made)
    }

    /// Guesses allowed in this game.
    pub fn guesses_allowed(&self) -> u32 {
        self.guesses_allowed
    }

    /// Guesses made so far.
    pub fn guesses_made(&self) -> u32 {
        self.guesses_made
    }

    /// Current lifecycle state.
    pub fn status(&self) -> GameStatus {
        self.status
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}
