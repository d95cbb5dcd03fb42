//! Daily Wordle library - a daily five-letter word game engine
//!
//! Players start a game, submit five-letter guesses and get per-letter
//! feedback until they solve the word or run out of attempts. Each player
//! may start three games per calendar day.
//!
//! # Architecture
//!
//! - **Rules**: scoring and the per-game state machine (`daily_wordle_rules`)
//! - **Session**: game lifecycle, daily quota and guess handling
//! - **Store**: collaborator traits with in-memory and SQLite backends
//! - **Services**: word administration, reports and default data
//! - **Server**: axum HTTP interface
//!
//! # Example
//!
//! ```
//! use daily_wordle::{MemoryStore, PlayerDirectory, SessionManager, SystemClock, seed_defaults};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! seed_defaults(&store, &SystemClock)?;
//! let player = store.find_player_by_name("player")?.ok_or("no player")?;
//!
//! let sessions = SessionManager::new(store);
//! let game = sessions.start(*player.id())?;
//! let guess = sessions.guess(*game.id(), "crane")?;
//! assert_eq!(guess.guessed_word(), "CRANE");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod clock;
mod config;
mod db;
mod error;
mod locks;
mod report_service;
mod seed;
mod server;
mod session;
mod store;
mod word_service;

// Crate-level exports - Game rules
pub use daily_wordle_rules::{
    Feedback, GUESSES_ALLOWED, GameStatus, Progress, RulesError, Transition, Verdict,
    WORD_LENGTH, Word, evaluate,
};

// Crate-level exports - Time
pub use clock::{Clock, ManualClock, SystemClock};

// Crate-level exports - Configuration
pub use config::{ConfigError, DATABASE_URL_VAR, DEFAULT_CONFIG_FILE, ServerConfig, StorageMode};

// Crate-level exports - Database types
pub use db::{
    Game, GameRepository, Guess, NewGame, NewGuess, NewPlayer, NewWordEntry, Player, PlayerRole,
    WordEntry,
};

// Crate-level exports - Storage
pub use store::{
    Backend, DayWindow, GameId, GameStore, GuessStore, IdentityLookup, MemoryStore,
    PlayerDirectory, PlayerId, StoreError, StoreErrorKind, WordAdmin, WordCatalog, WordId,
};

// Crate-level exports - Session management
pub use error::{QuotaKind, SessionError};
pub use locks::KeyedLocks;
pub use session::{DAILY_GAME_QUOTA, SessionManager};

// Crate-level exports - Services
pub use report_service::{DailyReport, PlayerDayStats, ReportError, ReportService, parse_report_date};
pub use seed::{DEFAULT_WORDS, SeedSummary, seed_defaults};
pub use word_service::{WordError, WordService};

// Crate-level exports - HTTP server
pub use server::{
    ApiError, AppState, GameView, GuessRequest, GuessView, PlayerView, StartQuery, WordRequest,
    WordView, router,
};
