//! Collaborator interfaces the game engine talks to, plus the in-memory backend.
//!
//! Each trait is one collaborator. A backend usually implements all of them
//! over the same tables; [`Backend`] names that combination.

mod error;
mod memory;
mod window;

pub use error::{StoreError, StoreErrorKind};
pub use memory::MemoryStore;
pub use window::DayWindow;

use crate::db::{
    Game, Guess, NewGame, NewGuess, NewPlayer, NewWordEntry, Player, PlayerRole, WordEntry,
};

/// Identifier of a player record.
pub type PlayerId = i32;

/// Identifier of a game record.
pub type GameId = i32;

/// Identifier of a catalog word.
pub type WordId = i32;

/// Resolves the authenticated player identifier handed to the engine.
pub trait IdentityLookup {
    /// Returns the player, or `None` if the id is unknown.
    fn resolve(&self, player_id: PlayerId) -> Result<Option<Player>, StoreError>;
}

/// Player registry used by seeding and reporting.
pub trait PlayerDirectory {
    /// Registers a player. Usernames are unique.
    fn create_player(&self, player: NewPlayer) -> Result<Player, StoreError>;

    /// Looks a player up by username.
    fn find_player_by_name(&self, username: &str) -> Result<Option<Player>, StoreError>;

    /// Lists players holding `role`, oldest first.
    fn list_players_by_role(&self, role: PlayerRole) -> Result<Vec<Player>, StoreError>;
}

/// Source of target words.
pub trait WordCatalog {
    /// Active words that `player_id` has never won a game with, ordered by id.
    fn active_words_unwon_by(&self, player_id: PlayerId) -> Result<Vec<WordEntry>, StoreError>;

    /// Looks a word up by id, active or not.
    fn find_word(&self, word_id: WordId) -> Result<Option<WordEntry>, StoreError>;
}

/// Word lifecycle management.
pub trait WordAdmin {
    /// Inserts a word. Word text is unique.
    fn create_word(&self, word: NewWordEntry) -> Result<WordEntry, StoreError>;

    /// Lists every word, ordered by id.
    fn list_words(&self) -> Result<Vec<WordEntry>, StoreError>;

    /// Looks a word up by its exact text.
    fn find_word_by_text(&self, text: &str) -> Result<Option<WordEntry>, StoreError>;

    /// Writes back a modified word.
    fn save_word(&self, word: &WordEntry) -> Result<WordEntry, StoreError>;

    /// Deletes a word. Returns `false` if it did not exist.
    fn delete_word(&self, word_id: WordId) -> Result<bool, StoreError>;

    /// True when any game targets the word.
    fn word_in_use(&self, word_id: WordId) -> Result<bool, StoreError>;

    /// Number of words in the catalog.
    fn count_words(&self) -> Result<i64, StoreError>;
}

/// Durable game records.
pub trait GameStore {
    /// Inserts a new game and returns it with its id.
    fn create_game(&self, game: NewGame) -> Result<Game, StoreError>;

    /// Writes back a modified game.
    fn save_game(&self, game: &Game) -> Result<Game, StoreError>;

    /// Looks a game up by id.
    fn find_game(&self, game_id: GameId) -> Result<Option<Game>, StoreError>;

    /// Unfinished games the player started inside `today`, oldest first.
    fn find_unfinished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError>;

    /// Games the player started inside `today`, finished or not.
    fn count_started_today(&self, player_id: PlayerId, today: &DayWindow)
    -> Result<i64, StoreError>;

    /// Finished games the player started inside `today`, oldest first.
    fn find_finished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError>;

    /// Every game the player has started, oldest first.
    fn find_games_by_player(&self, player_id: PlayerId) -> Result<Vec<Game>, StoreError>;

    /// Games whose finish time falls inside `window`, by finish time.
    fn find_finished_between(&self, window: &DayWindow) -> Result<Vec<Game>, StoreError>;

    /// Distinct players holding `role` who started a game inside `window`.
    fn count_players_started_between(
        &self,
        window: &DayWindow,
        role: PlayerRole,
    ) -> Result<i64, StoreError>;
}

/// Durable guess records.
pub trait GuessStore {
    /// Inserts a guess and returns it with its id.
    fn save_guess(&self, guess: NewGuess) -> Result<Guess, StoreError>;

    /// Inserts a guess and writes back its game as one unit.
    ///
    /// Either both rows change or neither does, so the stored guess count
    /// always matches the game's `guesses_made`.
    fn record_guess(&self, game: &Game, guess: NewGuess) -> Result<Guess, StoreError>;

    /// Guesses made in a game, in submission order.
    fn find_guesses_by_game(&self, game_id: GameId) -> Result<Vec<Guess>, StoreError>;
}

/// Everything the service layer needs from one storage backend.
pub trait Backend:
    IdentityLookup
    + PlayerDirectory
    + WordCatalog
    + WordAdmin
    + GameStore
    + GuessStore
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Backend for T where
    T: IdentityLookup
        + PlayerDirectory
        + WordCatalog
        + WordAdmin
        + GameStore
        + GuessStore
        + Clone
        + Send
        + Sync
        + 'static
{
}
