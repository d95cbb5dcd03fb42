//! Game session management: word selection, daily quota, and guess handling.

use std::sync::{Arc, Mutex, PoisonError};

use daily_wordle_rules::{Feedback, Transition, Word};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::db::{Game, Guess, NewGame, NewGuess, WordEntry};
use crate::error::{QuotaKind, SessionError};
use crate::locks::KeyedLocks;
use crate::store::{
    DayWindow, GameId, GameStore, GuessStore, IdentityLookup, PlayerId, StoreError, WordCatalog,
};

/// Maximum number of games a player may start in one calendar day.
pub const DAILY_GAME_QUOTA: i64 = 3;

/// Owns the game lifecycle for every player.
///
/// `start` is serialized per player and `guess` per game, so the
/// check-then-write sequences in both cannot interleave within one process.
#[derive(Debug)]
pub struct SessionManager<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    player_locks: KeyedLocks<PlayerId>,
    game_locks: KeyedLocks<GameId>,
}

impl<B> SessionManager<B>
where
    B: IdentityLookup + WordCatalog + GameStore + GuessStore,
{
    /// Creates a manager on the system clock with an entropy-seeded generator.
    #[instrument(skip(backend))]
    pub fn new(backend: B) -> Self {
        info!("Creating session manager");
        Self::with_parts(backend, Arc::new(SystemClock), StdRng::from_entropy())
    }

    /// Creates a manager with an explicit clock and random source.
    pub fn with_parts(backend: B, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Self {
            backend,
            clock,
            rng: Mutex::new(rng),
            player_locks: KeyedLocks::new(),
            game_locks: KeyedLocks::new(),
        }
    }

    /// The storage backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The clock used for timestamps and the daily window.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Starts a game for the player, or returns their unfinished game from today.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotFound`] if the player is unknown.
    /// - [`SessionError::QuotaExceeded`] once [`DAILY_GAME_QUOTA`] games were started today.
    /// - [`SessionError::NoWordsAvailable`] if the player has won every active word.
    #[instrument(skip(self))]
    pub fn start(&self, player_id: PlayerId) -> Result<Game, SessionError> {
        let slot = self.player_locks.slot(player_id);
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if self.backend.resolve(player_id)?.is_none() {
            warn!(player_id, "Start requested for unknown player");
            return Err(SessionError::player_not_found(player_id));
        }

        let now = self.clock.now();
        let today = DayWindow::containing(now);

        if let Some(game) = self
            .backend
            .find_unfinished_started_today(player_id, &today)?
            .into_iter()
            .next()
        {
            info!(player_id, game_id = game.id(), "Reusing unfinished game");
            return Ok(game);
        }

        let started = self.backend.count_started_today(player_id, &today)?;
        if started >= DAILY_GAME_QUOTA {
            warn!(player_id, started, "Daily game quota reached");
            return Err(SessionError::QuotaExceeded {
                kind: QuotaKind::Daily,
            });
        }

        let candidates = self.backend.active_words_unwon_by(player_id)?;
        let word = self
            .choose(&candidates)
            .ok_or(SessionError::NoWordsAvailable { player_id })?;
        debug!(
            player_id,
            word_id = word.id(),
            candidates = candidates.len(),
            "Selected target word"
        );

        let game = self
            .backend
            .create_game(NewGame::fresh(player_id, *word.id(), now))?;
        info!(player_id, game_id = game.id(), "Started new game");
        Ok(game)
    }

    /// Applies a guess to a game and returns the stored guess.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotFound`] if the game is unknown.
    /// - [`SessionError::GameFinished`] if the game already ended.
    /// - [`SessionError::QuotaExceeded`] if every guess was used; the game is
    ///   finalized before returning.
    /// - [`SessionError::InvalidGuess`] if the text is not a five-letter word.
    #[instrument(skip(self))]
    pub fn guess(&self, game_id: GameId, guess_text: &str) -> Result<Guess, SessionError> {
        let slot = self.game_locks.slot(game_id);
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let mut game = self
            .backend
            .find_game(game_id)?
            .ok_or_else(|| SessionError::game_not_found(game_id))?;

        if *game.finished() {
            warn!(game_id, "Guess submitted to finished game");
            return Err(SessionError::GameFinished { game_id });
        }

        let mut progress = game.progress()?;
        let now = self.clock.now();

        if progress.is_exhausted() {
            warn!(
                game_id,
                guesses_made = game.guesses_made(),
                "Unfinished game has no guesses left, finalizing"
            );
            progress.force_finish();
            game.apply_progress(&progress, now);
            self.backend.save_game(&game)?;
            return Err(SessionError::QuotaExceeded {
                kind: QuotaKind::Guesses,
            });
        }

        let guess = Word::parse(guess_text).map_err(|reason| {
            debug!(game_id, error = %reason, "Rejected guess text");
            SessionError::InvalidGuess { reason }
        })?;

        let target = self.target_word(&game)?;
        let feedback = Feedback::compute(&target, &guess);

        // Advance a copy first so a rules error leaves nothing behind.
        let transition = progress
            .record(&feedback)
            .map_err(|e| StoreError::corrupt(format!("Game {} state rejected guess: {}", game_id, e)))?;

        game.apply_progress(&progress, now);
        let stored = self.backend.record_guess(
            &game,
            NewGuess::new(game_id, guess.to_string(), feedback.to_string(), now),
        )?;

        match transition {
            Transition::Won => info!(game_id, guesses = progress.guesses_made(), "Game won"),
            Transition::Lost => info!(game_id, "Game lost"),
            Transition::Continue => debug!(
                game_id,
                feedback = %feedback,
                remaining = progress.guesses_remaining(),
                "Guess recorded"
            ),
        }

        Ok(stored)
    }

    /// Looks a game up by id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the game is unknown.
    #[instrument(skip(self))]
    pub fn get_game_by_id(&self, game_id: GameId) -> Result<Game, SessionError> {
        self.backend
            .find_game(game_id)?
            .ok_or_else(|| SessionError::game_not_found(game_id))
    }

    /// Finished games the player started today, oldest first.
    ///
    /// An unknown player simply has no games.
    #[instrument(skip(self))]
    pub fn get_games_played_today(&self, player_id: PlayerId) -> Result<Vec<Game>, SessionError> {
        let today = DayWindow::containing(self.clock.now());
        let games = self
            .backend
            .find_finished_started_today(player_id, &today)?;
        debug!(player_id, count = games.len(), "Listed games played today");
        Ok(games)
    }

    /// Guesses made in a game, in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the game is unknown.
    #[instrument(skip(self))]
    pub fn game_guesses(&self, game_id: GameId) -> Result<Vec<Guess>, SessionError> {
        if self.backend.find_game(game_id)?.is_none() {
            return Err(SessionError::game_not_found(game_id));
        }
        Ok(self.backend.find_guesses_by_game(game_id)?)
    }

    /// The target word of a game, as stored in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the word row is missing or malformed.
    #[instrument(skip(self, game), fields(game_id = game.id()))]
    pub fn target_word(&self, game: &Game) -> Result<Word, SessionError> {
        let entry = self.backend.find_word(*game.word_id())?.ok_or_else(|| {
            StoreError::corrupt(format!(
                "Game {} references missing word {}",
                game.id(),
                game.word_id()
            ))
        })?;
        let word = Word::parse(entry.word()).map_err(|e| {
            StoreError::corrupt(format!("Word {} is not playable: {}", entry.id(), e))
        })?;
        Ok(word)
    }

    fn choose<'a>(&self, candidates: &'a [WordEntry]) -> Option<&'a WordEntry> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        candidates.choose(&mut *rng)
    }
}
