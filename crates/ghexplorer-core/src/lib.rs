// Everything the explorer knows that isn't drawing or HTTP
pub mod bookmarks;
pub mod config;
pub mod debounce;
pub mod error;
pub mod feed;
pub mod models;
pub mod notes;
pub mod providers;
pub mod search;
pub mod snapshot;
pub mod stats;

pub use bookmarks::{AddOutcome, BookmarkEvent, BookmarkStore, BOOKMARKS_KEY};
pub use config::Config;
pub use debounce::Debouncer;
pub use error::Error;
pub use feed::{is_near_end, FeedController, FeedQuery, FeedState, FetchOutcome, FetchTicket};
pub use models::{Owner, Repository};
pub use notes::{NoteStore, NOTES_KEY};
pub use providers::GitHubProvider;
pub use search::{SearchFilters, SearchProvider, POPULAR_LANGUAGES};
pub use snapshot::{load_last_search, save_last_search, SEARCHED_REPOS_KEY};
pub use stats::{Bucket, RepoStats};

pub use ghexplorer_api::{SearchParams, SortKey, SortOrder};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
