//! Diesel-backed implementation of every store trait.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{
    Game, Guess, NewGame, NewGuess, NewPlayer, NewWordEntry, Player, PlayerRole, WordEntry,
    schema,
};
use crate::store::{
    DayWindow, GameId, GameStore, GuessStore, IdentityLookup, PlayerDirectory, PlayerId,
    StoreError, WordAdmin, WordCatalog, WordId,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Milliseconds a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// SQLite repository for the whole game database.
///
/// Opens a fresh connection per call, so clones are cheap and can be shared
/// across request handlers.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// The file is created on first connection if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, StoreError> {
        if db_path.trim().is_empty() {
            return Err(StoreError::unavailable("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Applies any embedded migrations that have not run yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if connecting or migrating fails.
    #[instrument(skip(self), fields(db_path = %self.db_path))]
    pub fn run_migrations(&self) -> Result<usize, StoreError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::unavailable(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::unavailable(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;
        Ok(conn)
    }
}

impl IdentityLookup for GameRepository {
    #[instrument(skip(self))]
    fn resolve(&self, player_id: PlayerId) -> Result<Option<Player>, StoreError> {
        let mut conn = self.connection()?;
        let player = schema::players::table
            .find(player_id)
            .first::<Player>(&mut conn)
            .optional()?;
        debug!(found = player.is_some(), "Player lookup");
        Ok(player)
    }
}

impl PlayerDirectory for GameRepository {
    #[instrument(skip(self, player), fields(username = %player.username()))]
    fn create_player(&self, player: NewPlayer) -> Result<Player, StoreError> {
        let mut conn = self.connection()?;
        let player = diesel::insert_into(schema::players::table)
            .values(&player)
            .returning(Player::as_returning())
            .get_result(&mut conn)?;
        info!(player_id = player.id(), username = %player.username(), "Player created");
        Ok(player)
    }

    #[instrument(skip(self))]
    fn find_player_by_name(&self, username: &str) -> Result<Option<Player>, StoreError> {
        let mut conn = self.connection()?;
        let player = schema::players::table
            .filter(schema::players::username.eq(username))
            .first::<Player>(&mut conn)
            .optional()?;
        Ok(player)
    }

    #[instrument(skip(self))]
    fn list_players_by_role(&self, role: PlayerRole) -> Result<Vec<Player>, StoreError> {
        let mut conn = self.connection()?;
        let players = schema::players::table
            .filter(schema::players::role.eq(role.to_db_string()))
            .order(schema::players::id.asc())
            .load::<Player>(&mut conn)?;
        debug!(count = players.len(), "Players loaded");
        Ok(players)
    }
}

impl WordCatalog for GameRepository {
    #[instrument(skip(self))]
    fn active_words_unwon_by(&self, player_id: PlayerId) -> Result<Vec<WordEntry>, StoreError> {
        let mut conn = self.connection()?;

        let won_words = schema::games::table
            .filter(schema::games::player_id.eq(player_id))
            .filter(schema::games::won.eq(true))
            .select(schema::games::word_id);

        let words = schema::words::table
            .filter(schema::words::is_active.eq(true))
            .filter(schema::words::id.ne_all(won_words))
            .order(schema::words::id.asc())
            .load::<WordEntry>(&mut conn)?;

        debug!(count = words.len(), "Candidate words loaded");
        Ok(words)
    }

    #[instrument(skip(self))]
    fn find_word(&self, word_id: WordId) -> Result<Option<WordEntry>, StoreError> {
        let mut conn = self.connection()?;
        let word = schema::words::table
            .find(word_id)
            .first::<WordEntry>(&mut conn)
            .optional()?;
        Ok(word)
    }
}

impl WordAdmin for GameRepository {
    #[instrument(skip(self, word), fields(word = %word.word()))]
    fn create_word(&self, word: NewWordEntry) -> Result<WordEntry, StoreError> {
        let mut conn = self.connection()?;
        let word = diesel::insert_into(schema::words::table)
            .values(&word)
            .returning(WordEntry::as_returning())
            .get_result(&mut conn)?;
        info!(word_id = word.id(), "Word created");
        Ok(word)
    }

    #[instrument(skip(self))]
    fn list_words(&self) -> Result<Vec<WordEntry>, StoreError> {
        let mut conn = self.connection()?;
        let words = schema::words::table
            .order(schema::words::id.asc())
            .load::<WordEntry>(&mut conn)?;
        Ok(words)
    }

    #[instrument(skip(self))]
    fn find_word_by_text(&self, text: &str) -> Result<Option<WordEntry>, StoreError> {
        let mut conn = self.connection()?;
        let word = schema::words::table
            .filter(schema::words::word.eq(text))
            .first::<WordEntry>(&mut conn)
            .optional()?;
        Ok(word)
    }

    #[instrument(skip(self, word), fields(word_id = word.id()))]
    fn save_word(&self, word: &WordEntry) -> Result<WordEntry, StoreError> {
        let mut conn = self.connection()?;
        let word = diesel::update(schema::words::table.find(*word.id()))
            .set(word)
            .returning(WordEntry::as_returning())
            .get_result(&mut conn)?;
        Ok(word)
    }

    #[instrument(skip(self))]
    fn delete_word(&self, word_id: WordId) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let deleted =
            diesel::delete(schema::words::table.find(word_id)).execute(&mut conn)?;
        info!(deleted, "Word delete executed");
        Ok(deleted > 0)
    }

    #[instrument(skip(self))]
    fn word_in_use(&self, word_id: WordId) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .filter(schema::games::word_id.eq(word_id))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(games > 0)
    }

    #[instrument(skip(self))]
    fn count_words(&self) -> Result<i64, StoreError> {
        let mut conn = self.connection()?;
        let count = schema::words::table.count().get_result::<i64>(&mut conn)?;
        Ok(count)
    }
}

impl GameStore for GameRepository {
    #[instrument(skip(self, game), fields(player_id = game.player_id(), word_id = game.word_id()))]
    fn create_game(&self, game: NewGame) -> Result<Game, StoreError> {
        let mut conn = self.connection()?;
        let game = diesel::insert_into(schema::games::table)
            .values(&game)
            .returning(Game::as_returning())
            .get_result(&mut conn)?;
        info!(game_id = game.id(), "Game created");
        Ok(game)
    }

    #[instrument(skip(self, game), fields(game_id = game.id()))]
    fn save_game(&self, game: &Game) -> Result<Game, StoreError> {
        let mut conn = self.connection()?;
        let game = diesel::update(schema::games::table.find(*game.id()))
            .set(game)
            .returning(Game::as_returning())
            .get_result(&mut conn)?;
        debug!(status = %game.status(), "Game saved");
        Ok(game)
    }

    #[instrument(skip(self))]
    fn find_game(&self, game_id: GameId) -> Result<Option<Game>, StoreError> {
        let mut conn = self.connection()?;
        let game = schema::games::table
            .find(game_id)
            .first::<Game>(&mut conn)
            .optional()?;
        Ok(game)
    }

    #[instrument(skip(self, today), fields(date = %today.date()))]
    fn find_unfinished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .filter(schema::games::player_id.eq(player_id))
            .filter(schema::games::started_at.ge(*today.start()))
            .filter(schema::games::started_at.lt(*today.end()))
            .filter(schema::games::finished.eq(false))
            .order((schema::games::started_at.asc(), schema::games::id.asc()))
            .load::<Game>(&mut conn)?;
        Ok(games)
    }

    #[instrument(skip(self, today), fields(date = %today.date()))]
    fn count_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<i64, StoreError> {
        let mut conn = self.connection()?;
        let count = schema::games::table
            .filter(schema::games::player_id.eq(player_id))
            .filter(schema::games::started_at.ge(*today.start()))
            .filter(schema::games::started_at.lt(*today.end()))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count)
    }

    #[instrument(skip(self, today), fields(date = %today.date()))]
    fn find_finished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .filter(schema::games::player_id.eq(player_id))
            .filter(schema::games::started_at.ge(*today.start()))
            .filter(schema::games::started_at.lt(*today.end()))
            .filter(schema::games::finished.eq(true))
            .order((schema::games::started_at.asc(), schema::games::id.asc()))
            .load::<Game>(&mut conn)?;
        Ok(games)
    }

    #[instrument(skip(self))]
    fn find_games_by_player(&self, player_id: PlayerId) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .filter(schema::games::player_id.eq(player_id))
            .order((schema::games::started_at.asc(), schema::games::id.asc()))
            .load::<Game>(&mut conn)?;
        Ok(games)
    }

    #[instrument(skip(self, window), fields(date = %window.date()))]
    fn find_finished_between(&self, window: &DayWindow) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .filter(schema::games::finished_at.ge(*window.start()))
            .filter(schema::games::finished_at.lt(*window.end()))
            .order((schema::games::finished_at.asc(), schema::games::id.asc()))
            .load::<Game>(&mut conn)?;
        Ok(games)
    }

    #[instrument(skip(self, window), fields(date = %window.date()))]
    fn count_players_started_between(
        &self,
        window: &DayWindow,
        role: PlayerRole,
    ) -> Result<i64, StoreError> {
        let mut conn = self.connection()?;
        let count = schema::games::table
            .inner_join(schema::players::table)
            .filter(schema::games::started_at.ge(*window.start()))
            .filter(schema::games::started_at.lt(*window.end()))
            .filter(schema::players::role.eq(role.to_db_string()))
            .select(diesel::dsl::count_distinct(schema::games::player_id))
            .get_result::<i64>(&mut conn)?;
        Ok(count)
    }
}

impl GuessStore for GameRepository {
    #[instrument(skip(self, guess), fields(game_id = guess.game_id()))]
    fn save_guess(&self, guess: NewGuess) -> Result<Guess, StoreError> {
        let mut conn = self.connection()?;
        let guess = diesel::insert_into(schema::guesses::table)
            .values(&guess)
            .returning(Guess::as_returning())
            .get_result(&mut conn)?;
        debug!(guess_id = guess.id(), "Guess saved");
        Ok(guess)
    }

    #[instrument(skip(self, game, guess), fields(game_id = game.id()))]
    fn record_guess(&self, game: &Game, guess: NewGuess) -> Result<Guess, StoreError> {
        let mut conn = self.connection()?;
        let guess = conn.transaction::<_, StoreError, _>(|conn| {
            let guess = diesel::insert_into(schema::guesses::table)
                .values(&guess)
                .returning(Guess::as_returning())
                .get_result(conn)?;
            let updated = diesel::update(schema::games::table.find(*game.id()))
                .set(game)
                .execute(conn)?;
            if updated == 0 {
                return Err(StoreError::missing(format!("Game {} does not exist", game.id())));
            }
            Ok(guess)
        })?;
        debug!(guess_id = guess.id(), status = %game.status(), "Guess recorded");
        Ok(guess)
    }

    #[instrument(skip(self))]
    fn find_guesses_by_game(&self, game_id: GameId) -> Result<Vec<Guess>, StoreError> {
        let mut conn = self.connection()?;
        let guesses = schema::guesses::table
            .filter(schema::guesses::game_id.eq(game_id))
            .order((schema::guesses::guessed_at.asc(), schema::guesses::id.asc()))
            .load::<Guess>(&mut conn)?;
        Ok(guesses)
    }
}
