//! Game session error types.

use daily_wordle_rules::RulesError;

use crate::store::{GameId, PlayerId, StoreError};

/// Which cap a [`SessionError::QuotaExceeded`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum QuotaKind {
    /// The player already started the maximum number of games today.
    #[display("daily game limit reached")]
    Daily,
    /// The game already used every allowed guess.
    #[display("no guesses remaining")]
    Guesses,
}

/// Failure of a game session operation.
///
/// Every variant except [`SessionError::Storage`] is a client error that
/// leaves stored state untouched, apart from the finalize performed before
/// `QuotaExceeded { kind: Guesses }` is returned.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SessionError {
    /// A player or game id did not resolve.
    #[from(ignore)]
    #[display("{} {} not found", entity, id)]
    NotFound {
        /// Kind of record looked up.
        entity: &'static str,
        /// The missing id.
        id: i32,
    },

    /// The guess text is not a five-letter word.
    #[from(ignore)]
    #[display("Invalid guess: {}", reason)]
    InvalidGuess {
        /// Why the word was rejected.
        reason: RulesError,
    },

    /// The game already ended.
    #[from(ignore)]
    #[display("Game {} is already finished", game_id)]
    GameFinished {
        /// The finished game.
        game_id: GameId,
    },

    /// A daily or per-game cap was hit.
    #[from(ignore)]
    #[display("Quota exceeded: {}", kind)]
    QuotaExceeded {
        /// Which cap.
        kind: QuotaKind,
    },

    /// Every active word has already been won by the player.
    #[from(ignore)]
    #[display("No words available for player {}", player_id)]
    NoWordsAvailable {
        /// The player.
        player_id: PlayerId,
    },

    /// Infrastructure failure from the backend.
    #[display("{}", _0)]
    Storage(StoreError),
}

impl SessionError {
    pub(crate) fn player_not_found(id: PlayerId) -> Self {
        Self::NotFound {
            entity: "Player",
            id,
        }
    }

    pub(crate) fn game_not_found(id: GameId) -> Self {
        Self::NotFound { entity: "Game", id }
    }

    /// True for errors caused by the request rather than the infrastructure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
