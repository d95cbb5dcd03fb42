//! SQLite persistence for players, words, games and guesses.

mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use models::{
    Game, Guess, NewGame, NewGuess, NewPlayer, NewWordEntry, Player, PlayerRole, WordEntry,
};
pub use repository::GameRepository;
