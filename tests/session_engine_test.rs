//! Tests for the game session manager on the in-memory backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use daily_wordle::{
    Clock, DAILY_GAME_QUOTA, DayWindow, Game, GameId, GameStatus, GameStore, Guess, GuessStore,
    IdentityLookup, ManualClock, MemoryStore, NewGame, NewGuess, NewPlayer, NewWordEntry, Player,
    PlayerDirectory, PlayerId, PlayerRole, QuotaKind, SessionError, SessionManager, StoreError,
    StoreErrorKind, WordAdmin, WordCatalog, WordEntry, WordId, WordService,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

struct Fixture {
    store: MemoryStore,
    clock: ManualClock,
    sessions: SessionManager<MemoryStore>,
    player: PlayerId,
}

impl Fixture {
    fn new(words: &[&str]) -> Self {
        let now = at(19, 9, 0);
        let store = MemoryStore::new();
        let player = store
            .create_player(NewPlayer::new("alice".to_string(), "PLAYER".to_string(), now))
            .unwrap();
        for word in words {
            store
                .create_word(NewWordEntry::new(word.to_string(), true, now, now))
                .unwrap();
        }
        let clock = ManualClock::new(now);
        let sessions = SessionManager::with_parts(
            store.clone(),
            Arc::new(clock.clone()),
            StdRng::seed_from_u64(7),
        );
        Self {
            store,
            clock,
            sessions,
            player: *player.id(),
        }
    }

    fn target(&self, game_id: i32) -> String {
        let game = self.sessions.get_game_by_id(game_id).unwrap();
        self.sessions.target_word(&game).unwrap().to_string()
    }

    /// Plays a game to a loss with a guess that never matches.
    fn lose(&self, game_id: i32) {
        for _ in 0..5 {
            self.sessions.guess(game_id, "zzzzz").unwrap();
        }
    }

    fn started_today(&self) -> i64 {
        let today = DayWindow::containing(self.clock.now());
        self.store.count_started_today(self.player, &today).unwrap()
    }
}

#[test]
fn test_start_reuses_unfinished_game() {
    let fx = Fixture::new(&["APPLE", "BRAVE", "CLOUD"]);

    let first = fx.sessions.start(fx.player).unwrap();
    fx.clock.advance(TimeDelta::minutes(5));
    let second = fx.sessions.start(fx.player).unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(first.word_id(), second.word_id());
    assert_eq!(fx.started_today(), 1);
}

#[test]
fn test_new_game_initial_state() {
    let fx = Fixture::new(&["APPLE"]);
    let game = fx.sessions.start(fx.player).unwrap();

    assert_eq!(*game.guesses_allowed(), 5);
    assert_eq!(*game.guesses_made(), 0);
    assert!(!*game.won());
    assert!(!*game.finished());
    assert_eq!(*game.started_at(), at(19, 9, 0));
    assert!(game.finished_at().is_none());
    assert_eq!(game.status(), GameStatus::Active);
}

#[test]
fn test_fourth_start_exceeds_daily_quota() {
    let fx = Fixture::new(&["APPLE"]);

    for _ in 0..DAILY_GAME_QUOTA {
        let game = fx.sessions.start(fx.player).unwrap();
        fx.lose(*game.id());
    }

    let result = fx.sessions.start(fx.player);
    assert!(matches!(
        result,
        Err(SessionError::QuotaExceeded {
            kind: QuotaKind::Daily
        })
    ));
    assert_eq!(fx.started_today(), DAILY_GAME_QUOTA);
}

#[test]
fn test_new_day_resets_quota() {
    let fx = Fixture::new(&["APPLE"]);
    for _ in 0..DAILY_GAME_QUOTA {
        let game = fx.sessions.start(fx.player).unwrap();
        fx.lose(*game.id());
    }
    assert!(fx.sessions.start(fx.player).is_err());

    fx.clock.set(at(20, 0, 0));
    let game = fx.sessions.start(fx.player).unwrap();
    assert_eq!(*game.started_at(), at(20, 0, 0));
}

#[test]
fn test_yesterdays_unfinished_game_is_not_reused() {
    let fx = Fixture::new(&["APPLE"]);
    let yesterday = fx.sessions.start(fx.player).unwrap();

    fx.clock.set(at(20, 8, 0));
    let today = fx.sessions.start(fx.player).unwrap();

    assert_ne!(yesterday.id(), today.id());
    // The stale game still accepts guesses.
    fx.sessions.guess(*yesterday.id(), "zzzzz").unwrap();
}

#[test]
fn test_win_finishes_game() {
    let fx = Fixture::new(&["APPLE", "BRAVE"]);
    let game = fx.sessions.start(fx.player).unwrap();
    let target = fx.target(*game.id());

    fx.sessions.guess(*game.id(), "zzzzz").unwrap();
    fx.clock.advance(TimeDelta::minutes(3));
    let winning = fx.sessions.guess(*game.id(), &target.to_lowercase()).unwrap();

    assert_eq!(winning.guessed_word(), &target);
    assert_eq!(winning.feedback(), "GGGGG");
    assert!(winning.parse_feedback().unwrap().is_solved());

    let game = fx.sessions.get_game_by_id(*game.id()).unwrap();
    assert!(*game.won());
    assert!(*game.finished());
    assert_eq!(*game.guesses_made(), 2);
    assert_eq!(*game.finished_at(), Some(at(19, 9, 3)));
    assert_eq!(game.status(), GameStatus::Won);
}

#[test]
fn test_fifth_miss_loses_game() {
    let fx = Fixture::new(&["APPLE"]);
    let game = fx.sessions.start(fx.player).unwrap();

    for made in 1..=4 {
        fx.sessions.guess(*game.id(), "zzzzz").unwrap();
        let current = fx.sessions.get_game_by_id(*game.id()).unwrap();
        assert_eq!(*current.guesses_made(), made);
        assert!(!*current.finished());
    }
    fx.sessions.guess(*game.id(), "zzzzz").unwrap();

    let game = fx.sessions.get_game_by_id(*game.id()).unwrap();
    assert!(*game.finished());
    assert!(!*game.won());
    assert_eq!(*game.guesses_made(), 5);
    assert!(game.finished_at().is_some());
    assert_eq!(game.status(), GameStatus::Lost);
}

#[test]
fn test_guess_on_finished_game_is_rejected() {
    let fx = Fixture::new(&["APPLE"]);
    let game = fx.sessions.start(fx.player).unwrap();
    fx.lose(*game.id());
    let before = fx.sessions.get_game_by_id(*game.id()).unwrap();

    let result = fx.sessions.guess(*game.id(), "apple");

    assert!(matches!(
        result,
        Err(SessionError::GameFinished { game_id }) if game_id == *game.id()
    ));
    assert_eq!(fx.store.find_guesses_by_game(*game.id()).unwrap().len(), 5);
    assert_eq!(fx.sessions.get_game_by_id(*game.id()).unwrap(), before);
}

#[test]
fn test_invalid_guess_changes_nothing() {
    let fx = Fixture::new(&["APPLE"]);
    let game = fx.sessions.start(fx.player).unwrap();

    for text in ["abc", "abcdef", "ab1de", "", " apple"] {
        let result = fx.sessions.guess(*game.id(), text);
        assert!(
            matches!(result, Err(SessionError::InvalidGuess { .. })),
            "{text:?} should be rejected"
        );
    }

    let game = fx.sessions.get_game_by_id(*game.id()).unwrap();
    assert_eq!(*game.guesses_made(), 0);
    assert!(fx.store.find_guesses_by_game(*game.id()).unwrap().is_empty());
}

#[test]
fn test_guess_is_stored_uppercase_with_feedback() {
    let fx = Fixture::new(&["SPEED"]);
    let game = fx.sessions.start(fx.player).unwrap();

    let guess = fx.sessions.guess(*game.id(), "erase").unwrap();

    assert_eq!(guess.guessed_word(), "ERASE");
    assert_eq!(guess.feedback(), "O--OO");
    assert_eq!(*guess.guessed_at(), at(19, 9, 0));
    assert_eq!(fx.sessions.game_guesses(*game.id()).unwrap(), vec![guess]);
}

#[test]
fn test_unknown_ids_are_not_found() {
    let fx = Fixture::new(&["APPLE"]);

    assert!(matches!(
        fx.sessions.start(999),
        Err(SessionError::NotFound { entity: "Player", id: 999 })
    ));
    assert!(matches!(
        fx.sessions.guess(999, "apple"),
        Err(SessionError::NotFound { entity: "Game", id: 999 })
    ));
    assert!(matches!(
        fx.sessions.get_game_by_id(999),
        Err(SessionError::NotFound { .. })
    ));
    assert!(matches!(
        fx.sessions.game_guesses(999),
        Err(SessionError::NotFound { .. })
    ));
}

#[test]
fn test_no_words_available() {
    let fx = Fixture::new(&[]);
    assert!(matches!(
        fx.sessions.start(fx.player),
        Err(SessionError::NoWordsAvailable { .. })
    ));
    assert_eq!(fx.started_today(), 0);
}

#[test]
fn test_won_words_are_not_offered_again() {
    let fx = Fixture::new(&["APPLE", "BRAVE"]);

    let first = fx.sessions.start(fx.player).unwrap();
    let first_target = fx.target(*first.id());
    fx.sessions.guess(*first.id(), &first_target).unwrap();

    let second = fx.sessions.start(fx.player).unwrap();
    let second_target = fx.target(*second.id());
    assert_ne!(first_target, second_target);
    fx.sessions.guess(*second.id(), &second_target).unwrap();

    assert!(matches!(
        fx.sessions.start(fx.player),
        Err(SessionError::NoWordsAvailable { .. })
    ));
}

#[test]
fn test_inactive_words_are_not_offered() {
    let fx = Fixture::new(&["APPLE", "BRAVE"]);
    let apple = fx.store.find_word_by_text("APPLE").unwrap().unwrap();
    WordService::new(fx.store.clone())
        .update(*apple.id(), None, Some(false))
        .unwrap();

    for _ in 0..3 {
        let game = fx.sessions.start(fx.player).unwrap();
        assert_eq!(fx.target(*game.id()), "BRAVE");
        fx.lose(*game.id());
    }
}

#[test]
fn test_today_listing_excludes_unfinished_and_earlier_games() {
    let fx = Fixture::new(&["APPLE"]);

    fx.clock.set(at(18, 22, 0));
    let yesterday = fx.sessions.start(fx.player).unwrap();
    fx.lose(*yesterday.id());

    fx.clock.set(at(19, 8, 0));
    let finished = fx.sessions.start(fx.player).unwrap();
    fx.lose(*finished.id());
    fx.clock.set(at(19, 10, 0));
    let second_finished = fx.sessions.start(fx.player).unwrap();
    fx.lose(*second_finished.id());
    fx.clock.set(at(19, 11, 0));
    let open = fx.sessions.start(fx.player).unwrap();

    let listed: Vec<_> = fx
        .sessions
        .get_games_played_today(fx.player)
        .unwrap()
        .iter()
        .map(|g| *g.id())
        .collect();

    assert_eq!(listed, vec![*finished.id(), *second_finished.id()]);
    assert!(!listed.contains(yesterday.id()));
    assert!(!listed.contains(open.id()));
}

#[test]
fn test_today_listing_for_unknown_player_is_empty() {
    let fx = Fixture::new(&["APPLE"]);
    assert!(fx.sessions.get_games_played_today(404).unwrap().is_empty());
}

#[test]
fn test_exhausted_unfinished_game_is_finalized() {
    let fx = Fixture::new(&["APPLE"]);
    let word = fx.store.find_word_by_text("APPLE").unwrap().unwrap();
    let stale = fx
        .store
        .create_game(NewGame::new(
            fx.player,
            *word.id(),
            false,
            5,
            5,
            false,
            at(19, 8, 0),
        ))
        .unwrap();

    let result = fx.sessions.guess(*stale.id(), "apple");
    assert!(matches!(
        result,
        Err(SessionError::QuotaExceeded {
            kind: QuotaKind::Guesses
        })
    ));

    let game = fx.sessions.get_game_by_id(*stale.id()).unwrap();
    assert!(*game.finished());
    assert!(!*game.won());
    assert_eq!(*game.finished_at(), Some(at(19, 9, 0)));
    assert!(fx.store.find_guesses_by_game(*stale.id()).unwrap().is_empty());

    assert!(matches!(
        fx.sessions.guess(*stale.id(), "apple"),
        Err(SessionError::GameFinished { .. })
    ));
}

#[test]
fn test_concurrent_starts_create_one_game() {
    let fx = Fixture::new(&["APPLE", "BRAVE", "CLOUD", "DREAM"]);

    let ids: Vec<i32> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| *fx.sessions.start(fx.player).unwrap().id()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(fx.started_today(), 1);
}

#[test]
fn test_concurrent_guesses_never_exceed_allowance() {
    let fx = Fixture::new(&["APPLE"]);
    let game = fx.sessions.start(fx.player).unwrap();
    let game_id = *game.id();

    let results: Vec<Result<_, SessionError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..12)
            .map(|_| scope.spawn(|| fx.sessions.guess(game_id, "zzzzz")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(SessionError::GameFinished { .. })))
        .count();
    assert_eq!(accepted, 5);
    assert_eq!(rejected, 7);

    let game = fx.sessions.get_game_by_id(game_id).unwrap();
    assert_eq!(*game.guesses_made(), 5);
    assert!(*game.finished());
    assert_eq!(fx.store.find_guesses_by_game(game_id).unwrap().len(), 5);
}

/// Delegates to a [`MemoryStore`] but fails the next guess write on request.
#[derive(Clone)]
struct FailingWrites {
    inner: MemoryStore,
    fail_next: Arc<AtomicBool>,
}

impl IdentityLookup for FailingWrites {
    fn resolve(&self, player_id: PlayerId) -> Result<Option<Player>, StoreError> {
        self.inner.resolve(player_id)
    }
}

impl WordCatalog for FailingWrites {
    fn active_words_unwon_by(&self, player_id: PlayerId) -> Result<Vec<WordEntry>, StoreError> {
        self.inner.active_words_unwon_by(player_id)
    }

    fn find_word(&self, word_id: WordId) -> Result<Option<WordEntry>, StoreError> {
        self.inner.find_word(word_id)
    }
}

impl GameStore for FailingWrites {
    fn create_game(&self, game: NewGame) -> Result<Game, StoreError> {
        self.inner.create_game(game)
    }

    fn save_game(&self, game: &Game) -> Result<Game, StoreError> {
        self.inner.save_game(game)
    }

    fn find_game(&self, game_id: GameId) -> Result<Option<Game>, StoreError> {
        self.inner.find_game(game_id)
    }

    fn find_unfinished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError> {
        self.inner.find_unfinished_started_today(player_id, today)
    }

    fn count_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<i64, StoreError> {
        self.inner.count_started_today(player_id, today)
    }

    fn find_finished_started_today(
        &self,
        player_id: PlayerId,
        today: &DayWindow,
    ) -> Result<Vec<Game>, StoreError> {
        self.inner.find_finished_started_today(player_id, today)
    }

    fn find_games_by_player(&self, player_id: PlayerId) -> Result<Vec<Game>, StoreError> {
        self.inner.find_games_by_player(player_id)
    }

    fn find_finished_between(&self, window: &DayWindow) -> Result<Vec<Game>, StoreError> {
        self.inner.find_finished_between(window)
    }

    fn count_players_started_between(
        &self,
        window: &DayWindow,
        role: PlayerRole,
    ) -> Result<i64, StoreError> {
        self.inner.count_players_started_between(window, role)
    }
}

impl GuessStore for FailingWrites {
    fn save_guess(&self, guess: NewGuess) -> Result<Guess, StoreError> {
        self.inner.save_guess(guess)
    }

    fn record_guess(&self, game: &Game, guess: NewGuess) -> Result<Guess, StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::unavailable("disk full"));
        }
        self.inner.record_guess(game, guess)
    }

    fn find_guesses_by_game(&self, game_id: GameId) -> Result<Vec<Guess>, StoreError> {
        self.inner.find_guesses_by_game(game_id)
    }
}

#[test]
fn test_failed_guess_write_leaves_game_consistent() {
    let fx = Fixture::new(&["APPLE"]);
    let store = FailingWrites {
        inner: fx.store.clone(),
        fail_next: Arc::new(AtomicBool::new(false)),
    };
    let sessions = SessionManager::with_parts(
        store.clone(),
        Arc::new(fx.clock.clone()),
        StdRng::seed_from_u64(7),
    );
    let game_id = *sessions.start(fx.player).unwrap().id();

    store.fail_next.store(true, Ordering::SeqCst);
    assert!(matches!(
        sessions.guess(game_id, "zzzzz"),
        Err(SessionError::Storage(_))
    ));
    assert_eq!(*sessions.get_game_by_id(game_id).unwrap().guesses_made(), 0);
    assert!(fx.store.find_guesses_by_game(game_id).unwrap().is_empty());

    for _ in 0..5 {
        sessions.guess(game_id, "zzzzz").unwrap();
    }
    assert!(matches!(
        sessions.guess(game_id, "zzzzz"),
        Err(SessionError::GameFinished { .. })
    ));

    let game = sessions.get_game_by_id(game_id).unwrap();
    assert_eq!(*game.guesses_made(), 5);
    assert_eq!(fx.store.find_guesses_by_game(game_id).unwrap().len(), 5);
}

#[test]
fn test_record_guess_for_missing_game_writes_nothing() {
    let fx = Fixture::new(&["APPLE"]);
    let game = fx.sessions.start(fx.player).unwrap();
    let empty = MemoryStore::new();

    let guess = NewGuess::new(*game.id(), "ZZZZZ".to_string(), "-----".to_string(), fx.clock.now());
    let result = empty.record_guess(&game, guess);
    assert!(matches!(result, Err(e) if *e.kind() == StoreErrorKind::Missing));
    assert!(empty.find_guesses_by_game(*game.id()).unwrap().is_empty());
}
