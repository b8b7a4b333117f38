use ghexplorer_store::SharedStore;
use std::collections::BTreeMap;
use tracing::warn;

/// Storage key holding the id -> note mapping
pub const NOTES_KEY: &str = "githubNotes";

/// Free-text notes attached to repositories.
///
/// Stored as a JSON object keyed by the repository id in string form.
pub struct NoteStore {
    storage: SharedStore,
    notes: BTreeMap<String, String>,
}

impl NoteStore {
    pub fn load(storage: SharedStore) -> Self {
        let notes = match storage.get(NOTES_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt notes: {}", e);
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read notes: {}", e);
                BTreeMap::new()
            }
        };

        Self { storage, notes }
    }

    pub fn get(&self, id: u64) -> Option<&str> {
        self.notes.get(&id.to_string()).map(String::as_str)
    }

    /// Save a note. Blank text removes it.
    pub fn set(&mut self, id: u64, text: &str) {
        if text.trim().is_empty() {
            self.remove(id);
            return;
        }

        self.notes.insert(id.to_string(), text.to_string());
        self.persist();
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let removed = self.notes.remove(&id.to_string()).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn persist(&self) {
        match serde_json::to_string(&self.notes) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(NOTES_KEY, &raw) {
                    warn!("Failed to persist notes: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize notes: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghexplorer_store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    #[test]
    fn test_set_get_and_reload() {
        let memory = Arc::new(MemoryStore::new());
        let mut notes = NoteStore::load(memory.clone());

        notes.set(42, "check the async runtime");
        assert_eq!(notes.get(42), Some("check the async runtime"));

        let reloaded = NoteStore::load(memory.clone());
        assert_eq!(reloaded.get(42), Some("check the async runtime"));
        assert_eq!(
            memory.get(NOTES_KEY).unwrap().as_deref(),
            Some(r#"{"42":"check the async runtime"}"#)
        );
    }

    #[test]
    fn test_blank_note_removes() {
        let memory = Arc::new(MemoryStore::new());
        let mut notes = NoteStore::load(memory);

        notes.set(1, "x");
        notes.set(1, "   ");
        assert_eq!(notes.get(1), None);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_reads_notes_written_by_other_clients() {
        let memory = Arc::new(MemoryStore::new());
        memory.set(NOTES_KEY, r#"{"7":"from the web app"}"#).unwrap();

        let notes = NoteStore::load(memory);
        assert_eq!(notes.get(7), Some("from the web app"));
    }

    #[test]
    fn test_corrupt_notes_load_empty() {
        let memory = Arc::new(MemoryStore::new());
        memory.set(NOTES_KEY, "[1,2,3]").unwrap();

        assert!(NoteStore::load(memory).is_empty());
    }
}
