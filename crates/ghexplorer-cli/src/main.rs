mod commands;

use anyhow::Context;
use clap::Parser;
use ghexplorer_core::{Config, GitHubProvider, SearchProvider, SortKey, SortOrder};
use ghexplorer_store::{MemoryStore, SharedStore, SqliteStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ghexplorer")]
#[command(version, about = "Explore trending GitHub repositories from the terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage database for bookmarks, notes and the last search
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, global = true, env = "GHEXPLORER_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List the most starred repositories
    Trending {
        /// stars, forks or updated
        #[arg(long, default_value_t = SortKey::Stars)]
        sort: SortKey,

        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search repositories
    Search {
        /// Search query
        query: String,

        /// Only repositories in this language
        #[arg(long)]
        language: Option<String>,

        /// Only repositories with at least this many stars
        #[arg(long, default_value_t = 0)]
        min_stars: u32,

        #[arg(long, default_value_t = SortKey::Stars)]
        sort: SortKey,

        #[arg(long, default_value_t = SortOrder::Desc)]
        order: SortOrder,

        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Manage bookmarks (lists them by default)
    Bookmarks {
        #[command(subcommand)]
        action: Option<BookmarkCommand>,
    },
    /// Show or set the note for a repository id. Empty text removes it.
    Note { id: u64, text: Option<String> },
    /// Chart the last search, or the trending list if there is none
    Stats {
        /// Width of the longest bar
        #[arg(long, default_value_t = 40)]
        width: usize,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommand {
    /// Write the current settings to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

#[derive(clap::Subcommand)]
enum BookmarkCommand {
    /// List bookmarks
    List {
        /// Only bookmarks matching this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Bookmark a repository by owner/name
    Add { full_name: String },
    /// Remove a bookmark by repository id
    Remove { id: u64 },
    /// Remove every bookmark
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let tui = cli.command.is_none();

    init_logging(tui)?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(url) = cli.api_url {
        config.github.api_url = url;
    }
    if let Some(db) = cli.db {
        config.storage.db_path = Some(db);
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path().context("Failed to locate config file")?,
    };

    if let Some(Commands::Config { action }) = &cli.command {
        match action {
            ConfigCommand::Init { force } => commands::init_config(&config, &config_path, *force)?,
            ConfigCommand::Path => println!("{}", config_path.display()),
        }
        return Ok(());
    }

    let storage = open_storage(&config);
    let provider: Arc<dyn SearchProvider> = Arc::new(
        GitHubProvider::from_config(&config.github).context("Failed to build GitHub client")?,
    );

    match cli.command {
        None => {
            let app = ghexplorer_tui::App::new(config.feed.clone(), storage);
            ghexplorer_tui::run_tui(app, provider).await?;
        }
        Some(Commands::Trending { sort, pages }) => {
            commands::trending(&config, provider.as_ref(), sort, pages).await?;
        }
        Some(Commands::Search {
            query,
            language,
            min_stars,
            sort,
            order,
            pages,
        }) => {
            let filters = ghexplorer_core::SearchFilters {
                query,
                language,
                min_stars,
                sort,
                order,
            };
            commands::search(&config, provider.as_ref(), &storage, filters, pages).await?;
        }
        Some(Commands::Bookmarks { action }) => {
            let action = action.unwrap_or(BookmarkCommand::List { filter: None });
            match action {
                BookmarkCommand::List { filter } => commands::list_bookmarks(storage, filter),
                BookmarkCommand::Add { full_name } => {
                    commands::add_bookmark(provider.as_ref(), storage, &full_name).await?
                }
                BookmarkCommand::Remove { id } => commands::remove_bookmark(storage, id),
                BookmarkCommand::Clear => commands::clear_bookmarks(storage),
            }
        }
        Some(Commands::Note { id, text }) => commands::note(storage, id, text),
        Some(Commands::Stats { width }) => {
            commands::stats(&config, provider.as_ref(), &storage, width).await?;
        }
        // Handled before storage is opened
        Some(Commands::Config { .. }) => {}
    }

    Ok(())
}

/// Subcommands log to stderr. The TUI owns the terminal, so it logs to a
/// file in the data directory instead.
fn init_logging(tui: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ghexplorer=info".into());

    if tui {
        let dir = Config::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("ghexplorer.log"))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// SQLite when possible; memory otherwise so the app still runs
fn open_storage(config: &Config) -> SharedStore {
    let opened = config
        .db_path()
        .map_err(anyhow::Error::from)
        .and_then(|path| SqliteStore::open(&path).map_err(anyhow::Error::from));

    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Storage unavailable, nothing will be saved: {:#}", e);
            MemoryStore::shared()
        }
    }
}
