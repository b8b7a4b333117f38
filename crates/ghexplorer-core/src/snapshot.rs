// Last search result set, reused by the stats view
use crate::models::Repository;
use ghexplorer_store::KeyValueStore;
use tracing::{debug, warn};

/// Storage key holding the most recent search results
pub const SEARCHED_REPOS_KEY: &str = "searchedRepos";

pub fn save_last_search(storage: &dyn KeyValueStore, repos: &[Repository]) {
    match serde_json::to_string(repos) {
        Ok(raw) => {
            if let Err(e) = storage.set(SEARCHED_REPOS_KEY, &raw) {
                warn!("Failed to store last search: {}", e);
            }
        }
        Err(e) => warn!("Failed to serialize last search: {}", e),
    }
}

/// `None` when nothing usable is stored; callers fall back to a fetch
pub fn load_last_search(storage: &dyn KeyValueStore) -> Option<Vec<Repository>> {
    let raw = match storage.get(SEARCHED_REPOS_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!("Could not read last search: {}", e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(repos) => Some(repos),
        Err(e) => {
            debug!("Stored search snapshot unusable: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::repo;
    use ghexplorer_store::MemoryStore;

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStore::new();
        save_last_search(&storage, &[repo(1, "a"), repo(2, "b")]);

        let loaded = load_last_search(&storage).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].id, 2);
    }

    #[test]
    fn test_absent_or_corrupt_is_none() {
        let storage = MemoryStore::new();
        assert!(load_last_search(&storage).is_none());

        storage.set(SEARCHED_REPOS_KEY, "nope").unwrap();
        assert!(load_last_search(&storage).is_none());
    }
}
