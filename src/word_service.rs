//! Word catalog administration.

use std::sync::Arc;

use daily_wordle_rules::{RulesError, Word};
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::db::{NewWordEntry, WordEntry};
use crate::store::{StoreError, WordAdmin, WordCatalog, WordId};

/// Failure of a word administration operation.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum WordError {
    /// No word has this id.
    #[from(ignore)]
    #[display("Word {} not found", word_id)]
    NotFound {
        /// The missing id.
        word_id: WordId,
    },

    /// The text is not a five-letter word.
    #[from(ignore)]
    #[display("Invalid word: {}", reason)]
    Invalid {
        /// Why the text was rejected.
        reason: RulesError,
    },

    /// Another catalog entry already has this text.
    #[from(ignore)]
    #[display("Word {} already exists", word)]
    Duplicate {
        /// The conflicting text.
        word: String,
    },

    /// Games reference the word, so its text is frozen.
    #[from(ignore)]
    #[display("Word {} is used by existing games and cannot be {}", word_id, action)]
    InUse {
        /// The referenced word.
        word_id: WordId,
        /// The refused change, `"renamed"` or `"deleted"`.
        action: &'static str,
    },

    /// Infrastructure failure from the backend.
    #[display("{}", _0)]
    Storage(StoreError),
}

/// Service layer for managing the word catalog.
///
/// Word text is always stored uppercase.
#[derive(Debug, Clone)]
pub struct WordService<B> {
    backend: B,
    clock: Arc<dyn Clock>,
}

impl<B: WordAdmin + WordCatalog> WordService<B> {
    /// Creates a word service on the system clock.
    #[instrument(skip(backend))]
    pub fn new(backend: B) -> Self {
        info!("Creating WordService");
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    /// Creates a word service with an explicit clock.
    pub fn with_clock(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Adds an active word to the catalog.
    ///
    /// # Errors
    ///
    /// [`WordError::Invalid`] for malformed text, [`WordError::Duplicate`]
    /// if the word already exists.
    #[instrument(skip(self))]
    pub fn create(&self, text: &str) -> Result<WordEntry, WordError> {
        let word = Word::parse(text).map_err(|reason| WordError::Invalid { reason })?;
        self.ensure_unique(&word, None)?;

        let now = self.clock.now();
        let entry = self
            .backend
            .create_word(NewWordEntry::new(word.to_string(), true, now, now))
            .map_err(|e| duplicate_or_storage(e, &word))?;
        info!(word_id = entry.id(), word = %word, "Word created");
        Ok(entry)
    }

    /// Every word in the catalog, by id.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<WordEntry>, WordError> {
        let words = self.backend.list_words()?;
        debug!(count = words.len(), "Listed words");
        Ok(words)
    }

    /// Looks a word up by id.
    ///
    /// # Errors
    ///
    /// Returns [`WordError::NotFound`] if the id is unknown.
    #[instrument(skip(self))]
    pub fn get(&self, word_id: WordId) -> Result<WordEntry, WordError> {
        self.backend
            .find_word(word_id)?
            .ok_or(WordError::NotFound { word_id })
    }

    /// Changes the text, the active flag, or both.
    ///
    /// The text of a word that any game targets cannot change; its active
    /// flag can.
    ///
    /// # Errors
    ///
    /// [`WordError::NotFound`], [`WordError::Invalid`], [`WordError::Duplicate`]
    /// or [`WordError::InUse`].
    #[instrument(skip(self))]
    pub fn update(
        &self,
        word_id: WordId,
        text: Option<&str>,
        active: Option<bool>,
    ) -> Result<WordEntry, WordError> {
        let mut entry = self.get(word_id)?;
        let now = self.clock.now();

        if let Some(text) = text {
            let word = Word::parse(text).map_err(|reason| WordError::Invalid { reason })?;
            if word.as_str() != entry.word() {
                if self.backend.word_in_use(word_id)? {
                    warn!(word_id, word = %word, "Refusing to rename word referenced by games");
                    return Err(WordError::InUse {
                        word_id,
                        action: "renamed",
                    });
                }
                self.ensure_unique(&word, Some(word_id))?;
                entry.set_word(word.to_string(), now);
            }
        }
        if let Some(active) = active {
            entry.set_active(active, now);
        }

        let saved = self.backend.save_word(&entry).map_err(|e| {
            if e.is_conflict() {
                WordError::Duplicate {
                    word: entry.word().clone(),
                }
            } else {
                WordError::Storage(e)
            }
        })?;
        info!(
            word_id,
            word = %saved.word(),
            active = saved.is_active(),
            "Word updated"
        );
        Ok(saved)
    }

    /// Removes a word no game refers to.
    ///
    /// # Errors
    ///
    /// [`WordError::NotFound`] or [`WordError::InUse`].
    #[instrument(skip(self))]
    pub fn delete(&self, word_id: WordId) -> Result<(), WordError> {
        if self.backend.word_in_use(word_id)? {
            warn!(word_id, "Refusing to delete word referenced by games");
            return Err(WordError::InUse {
                word_id,
                action: "deleted",
            });
        }
        if !self.backend.delete_word(word_id)? {
            return Err(WordError::NotFound { word_id });
        }
        info!(word_id, "Word deleted");
        Ok(())
    }

    fn ensure_unique(&self, word: &Word, except: Option<WordId>) -> Result<(), WordError> {
        match self.backend.find_word_by_text(word.as_str())? {
            Some(existing) if Some(*existing.id()) != except => {
                debug!(word = %word, existing_id = existing.id(), "Duplicate word");
                Err(WordError::Duplicate {
                    word: word.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Maps a uniqueness failure that raced past [`WordService`]'s own check.
fn duplicate_or_storage(err: StoreError, word: &Word) -> WordError {
    if err.is_conflict() {
        WordError::Duplicate {
            word: word.to_string(),
        }
    } else {
        WordError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::NewGame;
    use crate::store::{GameStore, MemoryStore};
    use chrono::NaiveDate;

    fn service() -> (WordService<MemoryStore>, MemoryStore) {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let store = MemoryStore::new();
        let service = WordService::with_clock(store.clone(), Arc::new(ManualClock::new(now)));
        (service, store)
    }

    #[test]
    fn test_create_uppercases_and_activates() {
        let (service, _) = service();
        let entry = service.create("grape").unwrap();
        assert_eq!(entry.word(), "GRAPE");
        assert!(*entry.is_active());
    }

    #[test]
    fn test_create_rejects_bad_words() {
        let (service, _) = service();
        assert!(matches!(
            service.create("toolong"),
            Err(WordError::Invalid { .. })
        ));
        assert!(matches!(
            service.create("ab1de"),
            Err(WordError::Invalid { .. })
        ));
        service.create("GRAPE").unwrap();
        assert!(matches!(
            service.create("grape"),
            Err(WordError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_update_text_and_flag() {
        let (service, _) = service();
        let entry = service.create("grape").unwrap();
        let other = service.create("lemon").unwrap();

        let updated = service.update(*entry.id(), Some("mango"), Some(false)).unwrap();
        assert_eq!(updated.word(), "MANGO");
        assert!(!*updated.is_active());

        // Keeping its own text is not a duplicate.
        service.update(*entry.id(), Some("MANGO"), None).unwrap();
        assert!(matches!(
            service.update(*other.id(), Some("mango"), None),
            Err(WordError::Duplicate { .. })
        ));
        assert!(matches!(
            service.update(999, None, Some(true)),
            Err(WordError::NotFound { word_id: 999 })
        ));
    }

    #[test]
    fn test_delete_refuses_words_in_use() {
        let (service, store) = service();
        let used = service.create("grape").unwrap();
        let free = service.create("lemon").unwrap();
        store
            .create_game(NewGame::fresh(1, *used.id(), *used.created_at()))
            .unwrap();

        assert!(matches!(
            service.delete(*used.id()),
            Err(WordError::InUse { .. })
        ));
        service.delete(*free.id()).unwrap();
        assert!(matches!(
            service.delete(*free.id()),
            Err(WordError::NotFound { .. })
        ));
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_rename_refuses_words_in_use() {
        let (service, store) = service();
        let used = service.create("apple").unwrap();
        store
            .create_game(NewGame::fresh(1, *used.id(), *used.created_at()))
            .unwrap();

        let err = service
            .update(*used.id(), Some("mango"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            WordError::InUse {
                action: "renamed",
                ..
            }
        ));
        assert_eq!(service.get(*used.id()).unwrap().word(), "APPLE");

        // Same text and the active flag stay editable.
        let updated = service
            .update(*used.id(), Some("apple"), Some(false))
            .unwrap();
        assert_eq!(updated.word(), "APPLE");
        assert!(!*updated.is_active());
    }
}
