//! Default accounts and word list for a fresh installation.

use derive_getters::Getters;
use tracing::{debug, info, instrument};

use crate::clock::Clock;
use crate::db::{NewPlayer, NewWordEntry, PlayerRole};
use crate::store::{PlayerDirectory, StoreError, WordAdmin};

/// Words loaded into an empty catalog.
pub const DEFAULT_WORDS: [&str; 20] = [
    "APPLE", "BRAVE", "CLOUD", "DREAM", "EARTH", "FLAME", "GRASS", "HOUSE", "JUMPY", "KNIFE",
    "LIGHT", "MUSIC", "NORTH", "OCEAN", "PEARL", "QUIET", "RIVER", "STONE", "TREND", "VIVID",
];

const DEFAULT_ACCOUNTS: [(&str, PlayerRole); 2] =
    [("admin", PlayerRole::Admin), ("player", PlayerRole::Player)];

/// What a seeding run added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct SeedSummary {
    players_created: usize,
    words_created: usize,
}

/// Creates the default accounts that are missing and fills an empty catalog.
///
/// Running it again adds nothing.
#[instrument(skip(backend, clock))]
pub fn seed_defaults<B>(backend: &B, clock: &dyn Clock) -> Result<SeedSummary, StoreError>
where
    B: PlayerDirectory + WordAdmin,
{
    let now = clock.now();
    let mut summary = SeedSummary::default();

    for (username, role) in DEFAULT_ACCOUNTS {
        if backend.find_player_by_name(username)?.is_some() {
            debug!(username, "Account already present");
            continue;
        }
        backend.create_player(NewPlayer::new(
            username.to_string(),
            role.to_db_string().to_string(),
            now,
        ))?;
        summary.players_created += 1;
    }

    if backend.count_words()? == 0 {
        for word in DEFAULT_WORDS {
            backend.create_word(NewWordEntry::new(word.to_string(), true, now, now))?;
            summary.words_created += 1;
        }
    } else {
        debug!("Word catalog already populated");
    }

    info!(
        players = summary.players_created,
        words = summary.words_created,
        "Seeding complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::store::MemoryStore;
    use daily_wordle_rules::Word;

    #[test]
    fn test_default_words_are_playable() {
        for word in DEFAULT_WORDS {
            assert_eq!(Word::parse(word).unwrap().as_str(), word);
        }
    }

    #[test]
    fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        let first = seed_defaults(&store, &SystemClock).unwrap();
        assert_eq!(*first.players_created(), 2);
        assert_eq!(*first.words_created(), 20);

        let second = seed_defaults(&store, &SystemClock).unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(store.count_words().unwrap(), 20);

        let admin = store.find_player_by_name("admin").unwrap().unwrap();
        assert_eq!(admin.parse_role().unwrap(), PlayerRole::Admin);
    }
}
