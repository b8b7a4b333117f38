use crate::models::Repository;
use ghexplorer_store::SharedStore;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Storage key holding the serialized bookmark list
pub const BOOKMARKS_KEY: &str = "githubBookmarks";

const EVENT_CAPACITY: usize = 64;

/// Change notifications for views that display bookmark state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkEvent {
    Added(u64),
    /// An add for an id that was already saved
    AlreadyBookmarked(u64),
    Removed(u64),
    Cleared,
}

impl BookmarkEvent {
    /// Short user-facing message, the terminal's version of a toast
    pub fn message(&self) -> &'static str {
        match self {
            BookmarkEvent::Added(_) => "Repository bookmarked!",
            BookmarkEvent::AlreadyBookmarked(_) => "Already bookmarked!",
            BookmarkEvent::Removed(_) => "Removed from bookmarks",
            BookmarkEvent::Cleared => "Cleared all bookmarks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyBookmarked,
}

/// Saved repositories, mirrored to persistent storage after every change.
///
/// The store is owned by whoever creates it and handed to views by
/// reference. Views that need to react to changes made elsewhere call
/// [`BookmarkStore::subscribe`].
pub struct BookmarkStore {
    storage: SharedStore,
    bookmarks: Vec<Repository>,
    events: broadcast::Sender<BookmarkEvent>,
}

impl BookmarkStore {
    /// Hydrate from storage. Missing, unreadable or corrupt data gives an
    /// empty collection rather than an error.
    pub fn load(storage: SharedStore) -> Self {
        let bookmarks = match storage.get(BOOKMARKS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Repository>>(&raw) {
                Ok(list) => dedup_by_id(list),
                Err(e) => {
                    warn!("Ignoring corrupt bookmark data: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read bookmarks: {}", e);
                Vec::new()
            }
        };

        debug!("Loaded {} bookmarks", bookmarks.len());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            storage,
            bookmarks,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookmarkEvent> {
        self.events.subscribe()
    }

    pub fn add(&mut self, repo: Repository) -> AddOutcome {
        let id = repo.id;
        if self.contains(id) {
            self.notify(BookmarkEvent::AlreadyBookmarked(id));
            return AddOutcome::AlreadyBookmarked;
        }

        self.bookmarks.push(repo);
        self.persist();
        self.notify(BookmarkEvent::Added(id));
        AddOutcome::Added
    }

    /// Returns whether anything was removed
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|r| r.id != id);

        if self.bookmarks.len() == before {
            return false;
        }

        self.persist();
        self.notify(BookmarkEvent::Removed(id));
        true
    }

    /// Empty the collection and drop the persisted key entirely
    pub fn clear(&mut self) {
        self.bookmarks.clear();
        if let Err(e) = self.storage.delete(BOOKMARKS_KEY) {
            warn!("Failed to delete stored bookmarks: {}", e);
        }
        self.notify(BookmarkEvent::Cleared);
    }

    /// Add when absent, remove when present. Returns the new state.
    pub fn toggle(&mut self, repo: &Repository) -> bool {
        if self.remove(repo.id) {
            false
        } else {
            self.add(repo.clone());
            true
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.bookmarks.iter().any(|r| r.id == id)
    }

    /// Bookmarks in the order they were added
    pub fn list(&self) -> &[Repository] {
        &self.bookmarks
    }

    pub fn get(&self, id: u64) -> Option<&Repository> {
        self.bookmarks.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Case-insensitive match on name, description and owner
    pub fn filter(&self, term: &str) -> Vec<&Repository> {
        let needle = term.trim().to_lowercase();
        self.bookmarks
            .iter()
            .filter(|r| needle.is_empty() || r.search_text().to_lowercase().contains(&needle))
            .collect()
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.bookmarks) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize bookmarks: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set(BOOKMARKS_KEY, &raw) {
            warn!("Failed to persist bookmarks: {}", e);
        }
    }

    fn notify(&self, event: BookmarkEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// First occurrence wins
fn dedup_by_id(list: Vec<Repository>) -> Vec<Repository> {
    let mut seen = std::collections::HashSet::new();
    list.into_iter().filter(|r| seen.insert(r.id)).collect()
}
