//! Database models and domain types.

use chrono::NaiveDateTime;
use daily_wordle_rules::{Feedback, GUESSES_ALLOWED, GameStatus, Progress};
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tracing::instrument;

use crate::db::schema;
use crate::store::{GameId, PlayerId, StoreError, WordId};

/// Player profile database model.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::players)]
pub struct Player {
    id: PlayerId,
    username: String,
    role: String,
    created_at: NaiveDateTime,
}

impl Player {
    /// Parses the stored role string into a [`PlayerRole`].
    #[instrument(skip(self), fields(role = %self.role))]
    pub fn parse_role(&self) -> Result<PlayerRole, StoreError> {
        PlayerRole::from_db_string(&self.role)
    }

    pub(crate) fn from_new(id: PlayerId, new: NewPlayer) -> Self {
        Self {
            id,
            username: new.username,
            role: new.role,
            created_at: new.created_at,
        }
    }
}

/// Insertable player model.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::players)]
pub struct NewPlayer {
    username: String,
    role: String,
    created_at: NaiveDateTime,
}

/// Role a player account holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerRole {
    /// Plays games.
    Player,
    /// Manages words and reads reports.
    Admin,
}

impl PlayerRole {
    /// Converts the role to the string stored in the database.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Player => "PLAYER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parses the role from the string stored in the database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the string is not a valid role.
    #[instrument(skip(s), fields(s = %s))]
    pub fn from_db_string(s: &str) -> Result<Self, StoreError> {
        match s {
            "PLAYER" => Ok(Self::Player),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(StoreError::corrupt(format!("Invalid role: '{}'", s))),
        }
    }
}

/// Catalog word database model.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, AsChangeset, Getters)]
#[diesel(table_name = schema::words)]
pub struct WordEntry {
    id: WordId,
    word: String,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl WordEntry {
    pub(crate) fn from_new(id: WordId, new: NewWordEntry) -> Self {
        Self {
            id,
            word: new.word,
            is_active: new.is_active,
            created_at: new.created_at,
            updated_at: new.updated_at,
        }
    }

    pub(crate) fn set_word(&mut self, word: String, now: NaiveDateTime) {
        self.word = word;
        self.updated_at = now;
    }

    pub(crate) fn set_active(&mut self, active: bool, now: NaiveDateTime) {
        self.is_active = active;
        self.updated_at = now;
    }
}

/// Insertable word model.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::words)]
pub struct NewWordEntry {
    word: String,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// One game session database model.
///
/// `won` implies `finished`, and `finished_at` is set exactly when
/// `finished` is. The target word never changes after creation.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Queryable,
    Identifiable,
    Associations,
    Selectable,
    AsChangeset,
    Getters,
)]
#[diesel(table_name = schema::games)]
#[diesel(belongs_to(Player))]
#[diesel(treat_none_as_null = true)]
pub struct Game {
    id: GameId,
    player_id: PlayerId,
    word_id: WordId,
    won: bool,
    guesses_allowed: i32,
    guesses_made: i32,
    finished: bool,
    started_at: NaiveDateTime,
    finished_at: Option<NaiveDateTime>,
}

impl Game {
    /// Lifecycle state derived from the stored flags.
    pub fn status(&self) -> GameStatus {
        match (self.won, self.finished) {
            (true, _) => GameStatus::Won,
            (false, true) => GameStatus::Lost,
            (false, false) => GameStatus::Active,
        }
    }

    /// Rebuilds the rules state machine for this game.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a stored counter is negative.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn progress(&self) -> Result<Progress, StoreError> {
        let counter = |value: i32, name: &str| {
            u32::try_from(value).map_err(|_| {
                StoreError::corrupt(format!("Game {} has invalid {}: {}", self.id, name, value))
            })
        };
        Ok(Progress::restore(
            counter(self.guesses_allowed, "guesses_allowed")?,
            counter(self.guesses_made, "guesses_made")?,
            self.won,
            self.finished,
        ))
    }

    /// Copies the state machine back onto the record.
    ///
    /// `finished_at` is stamped with `now` the first time the game finishes
    /// and is never overwritten afterwards.
    pub(crate) fn apply_progress(&mut self, progress: &Progress, now: NaiveDateTime) {
        self.guesses_made = i32::try_from(progress.guesses_made()).unwrap_or(i32::MAX);
        self.won = progress.status() == GameStatus::Won;
        self.finished = progress.status().is_finished();
        if self.finished && self.finished_at.is_none() {
            self.finished_at = Some(now);
        }
    }

    pub(crate) fn from_new(id: GameId, new: NewGame) -> Self {
        Self {
            id,
            player_id: new.player_id,
            word_id: new.word_id,
            won: new.won,
            guesses_allowed: new.guesses_allowed,
            guesses_made: new.guesses_made,
            finished: new.finished,
            started_at: new.started_at,
            finished_at: None,
        }
    }
}

/// Insertable game model.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    player_id: PlayerId,
    word_id: WordId,
    won: bool,
    guesses_allowed: i32,
    guesses_made: i32,
    finished: bool,
    started_at: NaiveDateTime,
}

impl NewGame {
    /// A game that has not been played yet.
    pub fn fresh(player_id: PlayerId, word_id: WordId, started_at: NaiveDateTime) -> Self {
        Self {
            player_id,
            word_id,
            won: false,
            guesses_allowed: GUESSES_ALLOWED as i32,
            guesses_made: 0,
            finished: false,
            started_at,
        }
    }
}

/// One submitted guess database model.
#[derive(
    Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations, Selectable, Getters,
)]
#[diesel(table_name = schema::guesses)]
#[diesel(belongs_to(Game))]
pub struct Guess {
    id: i32,
    game_id: GameId,
    guessed_word: String,
    feedback: String,
    guessed_at: NaiveDateTime,
}

impl Guess {
    /// Parses the stored feedback symbols.
    #[instrument(skip(self), fields(feedback = %self.feedback))]
    pub fn parse_feedback(&self) -> Result<Feedback, StoreError> {
        self.feedback
            .parse()
            .map_err(|e| StoreError::corrupt(format!("Guess {} has bad feedback: {}", self.id, e)))
    }

    pub(crate) fn from_new(id: i32, new: NewGuess) -> Self {
        Self {
            id,
            game_id: new.game_id,
            guessed_word: new.guessed_word,
            feedback: new.feedback,
            guessed_at: new.guessed_at,
        }
    }
}

/// Insertable guess model.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::guesses)]
pub struct NewGuess {
    game_id: GameId,
    guessed_word: String,
    feedback: String,
    guessed_at: NaiveDateTime,
}
