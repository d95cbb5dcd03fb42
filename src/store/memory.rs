//! In-process backend used by tests and the `--memory` server mode.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument};

use crate::db::{
    Game, Guess, NewGame, NewGuess, NewPlayer, NewWordEntry, Player, PlayerRole, WordEntry,
};
use crate::store::{
    DayWindow, GameId, GameStore, GuessStore, IdentityLookup, PlayerDirectory, PlayerId,
    StoreError, WordAdmin, WordCatalog, WordId,
};

#[derive(Debug, Default)]
struct Tables {
    players: Vec<Player>,
    words: Vec<WordEntry>,
    games: Vec<Game>,
    guesses: Vec<Guess>,
    last_player_id: i32,
    last_word_id: i32,
    last_game_id: i32,
    last_guess_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Thread-safe in-memory tables with the same constraints as the SQLite schema.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::unavailable("In-memory store lock poisoned"))
    }
}

fn sorted_by_start(mut games: Vec<Game>) -> Vec<Game> {
    games.sort_by_key(|g| (*g.started_at(), *g.id()));
    games
}

impl IdentityLookup for MemoryStore {
    #[instrument(skip(self))]
    fn resolve(&self, player_id: PlayerId) -> Result<Option<Player>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.players.iter().find(|p| *p.id() == player_id).cloned())
    }
}

impl PlayerDirectory for MemoryStore {
    #[instrument(skip(self, player), fields(username = %player.username()))]
    fn create_player(&self, player: NewPlayer) -> Result<Player, StoreError> {
        let mut tables = self.tables()?;
        if tables
            .players
            .iter()
            .any(|p| p.username() == player.username())
        {
            return Err(StoreError::conflict(format!(
                "UNIQUE constraint failed: players.username ({})",
                player.username()
            )));
        }
        let id = next_id(&mut tables.last_player_id);
        let player = Player::from_new(id, player);
        tables.players.push(player.clone());
        debug!(player_id = id, "Player created");
        Ok(player)
    }

    #[instrument(skip(self))]
    fn find_player_by_name(&self, username: &str) -> Result<Option<Player>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .players
            .iter()
            .find(|p| p.username() == username)
            .cloned())
    }

    #[instrument(skip(self))]
    fn list_players_by_role(&self, role: PlayerRole) -> Result<Vec<Player>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .players
            .iter()
            .filter(|p| p.role() == role.to_db_string())
            .cloned()
            .collect())
    }
}

impl WordCatalog for MemoryStore {
    #[instrument(skip(self))]
    fn active_words_unwon_by(&self, player_id: PlayerId) -> Result<Vec<WordEntry>, StoreError> {
        let tables = self.tables()?;
        let won: HashSet<WordId> = tables
            .games
            .iter()
            .filter(|g| *g.player_id() == player_id && *g.won())
            .map(|g| *g.word_id())
            .collect();
        Ok(tables
            .words
            .iter()
            .filter(|w| *w.is_active() && !won.contains(w.id()))
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    fn find_word(&self, word_id: WordId) -> Result<Option<WordEntry>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.words.iter().find(|w| *w.id() == word_id).cloned())
    }
}

impl WordAdmin for MemoryStore {
    #[instrument(skip(self, word), fields(word = %word.word()))]
    fn create_word(&self, word: NewWordEntry) -> Result<WordEntry, StoreError> {
        let mut tables = self.tables()?;
        if tables.words.iter().any(|w| w.word() == word.word()) {
            return Err(StoreError::conflict(format!(
                "UNIQUE constraint failed: words.word ({})",
                word.word()
            )));
        }
        let id = next_id(&mut tables.last_word_id);
        let word = WordEntry::from_new(id, word);
        tables.words.push(word.clone());
        Ok(word)
    }

    #[instrument(skip(self))]
    fn list_words(&self) -> Result<Vec<WordEntry>, StoreError> {
        Ok(self.tables()?.words.clone())
    }

    #[instrument(skip(self))]
    fn find_word_by_text(&self, text: &str) -> Result<Option<WordEntry>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.words.iter().find(|w| w.word() == text).cloned())
    }

    #[instrument(skip(self, word), fields(word_id = word.id()))]
    fn save_word(&self, word: &WordEntry) -> Result<WordEntry, StoreError> {
        let mut tables = self.tables()?;
        if tables
            .words
            .iter()
            .any(|w| w.id() != word.id() && w.word() == word.word())
        {
            return Err(StoreError::conflict(format!(
                "UNIQUE constraint failed: words.word ({})",
                word.word()
            )));
        }
        let slot = tables
            .words
            .iter_mut()
            .find(|w| w.id() == word.id())
            .ok_or_else(|| StoreError::missing(format!("Word {} does not exist", word.id())))?;
        *slot = word.clone();
        Ok(word.clone())
    }

    #[instrument(skip(self))]
    fn delete_word(&self, word_id: WordId) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.words.len();
        tables.words.retain(|w| *w.id() != word_id);
        Ok(tables.words.len() < before)
    }

    #[instrument(skip(self))]
    fn word_in_use(&self, word_id: WordId) -> Result<bool, StoreError> {
        let tables = self.tables()?;
        Ok(tables.games.iter().any(|g| *g.word_id() == word_id))
    }

    #[instrument(skip(self))]
    fn count_words(&self) -> Result<i64, StoreError> {
        Ok(self.tables()?.words.len() as i64)
    }
}

impl GameStore for MemoryStore {
    #[instrument(skip(self, game), fields(player_id = game.player_id()))]
    fn create_game(&self, game: NewGame) -> Result<Game, StoreError> {
        let mut tables = self.tables()?;
        let id = next_id(&mut tables.last_game_id);
        let game = Game::from_new(id, game);
        tables.games.push(game.clone());
        debug!(game_id = id, "Game created");
        Ok(game)
    }

    #[instrument(skip(self, game), fields(game_id = game.id()))]
    fn save_game(&self, game: &Game) -> Result<Game, StoreError> {
        let mut tables = self.tables()?;
        let slot = tables
            .games
            .iter_mut()
            .find(|g| g.id() == game.id())
            .ok_or_else(|| StoreError::missing(format!("Game {} does not exist", game.id())))?;
        *slot = game.clone();
        Ok(game.clone())
    }

    #[instrument(skip(self))]
    fn find_game(&self, game_id: GameId) -> Result<Option<Game>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.games.iter().find(|g| *g.id() == game_id).cloned())
    }

    #[instrument(skip(self, today), fields(date = %today.date()))]
    fn find_unfinished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError> {
        let tables = self.tables()?;
        let games = tables
            .games
            .iter()
            .filter(|g| *g.player_id() == player_id)
            .filter(|g| today.contains(*g.started_at()) && !*g.finished())
            .cloned()
            .collect();
        Ok(sorted_by_start(games))
    }

    #[instrument(skip(self, today), fields(date = %today.date()))]
    fn count_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<i64, StoreError> {
        let tables = self.tables()?;
        let count = tables
            .games
            .iter()
            .filter(|g| *g.player_id() == player_id && today.contains(*g.started_at()))
            .count();
        Ok(count as i64)
    }

    #[instrument(skip(self, today), fields(date = %today.date()))]
    fn find_finished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError> {
        let tables = self.tables()?;
        let games = tables
            .games
            .iter()
            .filter(|g| *g.player_id() == player_id)
            .filter(|g| today.contains(*g.started_at()) && *g.finished())
            .cloned()
            .collect();
        Ok(sorted_by_start(games))
    }

    #[instrument(skip(self))]
    fn find_games_by_player(&self, player_id: PlayerId) -> Result<Vec<Game>, StoreError> {
        let tables = self.tables()?;
        let games = tables
            .games
            .iter()
            .filter(|g| *g.player_id() == player_id)
            .cloned()
            .collect();
        Ok(sorted_by_start(games))
    }

    #[instrument(skip(self, window), fields(date = %window.date()))]
    fn find_finished_between(&self, window: &DayWindow) -> Result<Vec<Game>, StoreError> {
        let tables = self.tables()?;
        let mut games: Vec<Game> = tables
            .games
            .iter()
            .filter(|g| g.finished_at().is_some_and(|at| window.contains(at)))
            .cloned()
            .collect();
        games.sort_by_key(|g| (*g.finished_at(), *g.id()));
        Ok(games)
    }

    #[instrument(skip(self, window), fields(date = %window.date()))]
    fn count_players_started_between(
        &self,
        window: &DayWindow,
        role: PlayerRole,
    ) -> Result<i64, StoreError> {
        let tables = self.tables()?;
        let holders: HashSet<PlayerId> = tables
            .players
            .iter()
            .filter(|p| p.role() == role.to_db_string())
            .map(|p| *p.id())
            .collect();
        let players: HashSet<PlayerId> = tables
            .games
            .iter()
            .filter(|g| window.contains(*g.started_at()) && holders.contains(g.player_id()))
            .map(|g| *g.player_id())
            .collect();
        Ok(players.len() as i64)
    }
}

impl GuessStore for MemoryStore {
    #[instrument(skip(self, guess), fields(game_id = guess.game_id()))]
    fn save_guess(&self, guess: NewGuess) -> Result<Guess, StoreError> {
        let mut tables = self.tables()?;
        let id = next_id(&mut tables.last_guess_id);
        let guess = Guess::from_new(id, guess);
        tables.guesses.push(guess.clone());
        Ok(guess)
    }

    #[instrument(skip(self, game, guess), fields(game_id = game.id()))]
    fn record_guess(&self, game: &Game, guess: NewGuess) -> Result<Guess, StoreError> {
        let mut tables = self.tables()?;
        let slot = tables
            .games
            .iter()
            .position(|g| g.id() == game.id())
            .ok_or_else(|| StoreError::missing(format!("Game {} does not exist", game.id())))?;
        let id = next_id(&mut tables.last_guess_id);
        let guess = Guess::from_new(id, guess);
        tables.games[slot] = game.clone();
        tables.guesses.push(guess.clone());
        debug!(guess_id = id, "Guess recorded");
        Ok(guess)
    }

    #[instrument(skip(self))]
    fn find_guesses_by_game(&self, game_id: GameId) -> Result<Vec<Guess>, StoreError> {
        let tables = self.tables()?;
        let mut guesses: Vec<Guess> = tables
            .guesses
            .iter()
            .filter(|g| *g.game_id() == game_id)
            .cloned()
            .collect();
        guesses.sort_by_key(|g| (*g.guessed_at(), *g.id()));
        Ok(guesses)
    }
}
