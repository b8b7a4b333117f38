// Local key-value persistence
// Everything the app remembers between sessions goes through here

pub mod kv;
pub mod sqlite;

pub use kv::{KeyValueStore, MemoryStore, SharedStore, StoreError};
pub use sqlite::SqliteStore;

pub type Result<T> = std::result::Result<T, StoreError>;
