// Non-interactive subcommands
use anyhow::{bail, Context};
use chrono::Utc;
use ghexplorer_core::{
    feed, load_last_search, save_last_search, AddOutcome, BookmarkStore, Bucket, Config,
    FeedController, FeedQuery, FetchOutcome, NoteStore, RepoStats, Repository, SearchFilters,
    SearchParams, SearchProvider, SortKey, SortOrder,
};
use ghexplorer_store::SharedStore;
use std::path::Path;
use tracing::info;

pub async fn trending(
    config: &Config,
    provider: &dyn SearchProvider,
    sort: SortKey,
    pages: u32,
) -> anyhow::Result<()> {
    let mut controller = FeedController::new(config.feed.trending_per_page);
    let query = FeedQuery::new(config.feed.trending_query.clone(), sort, SortOrder::Desc);

    fetch_pages(&mut controller, provider, query, pages, |_| {}).await?;
    print_repos(controller.items(), None);
    Ok(())
}

pub async fn search(
    config: &Config,
    provider: &dyn SearchProvider,
    storage: &SharedStore,
    filters: SearchFilters,
    pages: u32,
) -> anyhow::Result<()> {
    if filters.is_blank() {
        bail!("Search query is empty");
    }

    let mut controller = FeedController::new(config.feed.search_per_page);
    info!("Searching for: {}", filters.build_query());

    fetch_pages(&mut controller, provider, filters.feed_query(), pages, |items| {
        save_last_search(storage.as_ref(), items)
    })
    .await?;

    if controller.items().is_empty() {
        println!("No repositories found");
    } else {
        print_repos(controller.items(), None);
    }
    Ok(())
}

/// Drive a feed for up to `pages` pages. `on_page` sees the accumulated
/// items after each page that added something, and once with no items when
/// the first page comes back empty.
async fn fetch_pages<F>(
    controller: &mut FeedController,
    provider: &dyn SearchProvider,
    query: FeedQuery,
    pages: u32,
    mut on_page: F,
) -> anyhow::Result<()>
where
    F: FnMut(&[Repository]),
{
    let mut ticket = controller.set_query(query);
    let mut fetched = 0;

    while let Some(t) = ticket.take() {
        match feed::drive(controller, provider, t).await {
            FetchOutcome::Appended(_) => on_page(controller.items()),
            FetchOutcome::Failed => {
                bail!(
                    "Request failed: {}",
                    controller.error().unwrap_or("unknown error")
                );
            }
            FetchOutcome::Exhausted => {
                if controller.items().is_empty() {
                    on_page(controller.items());
                }
                break;
            }
            FetchOutcome::Stale => break,
        }

        fetched += 1;
        if fetched >= pages.max(1) {
            break;
        }
        ticket = controller.request_next_page();
    }

    Ok(())
}

pub fn list_bookmarks(storage: SharedStore, filter: Option<String>) {
    let bookmarks = BookmarkStore::load(storage.clone());
    let notes = NoteStore::load(storage);

    let matches: Vec<Repository> = bookmarks
        .filter(filter.as_deref().unwrap_or(""))
        .into_iter()
        .cloned()
        .collect();

    if matches.is_empty() {
        println!("No bookmarks");
    } else {
        print_repos(&matches, Some(&notes));
    }
}

pub async fn add_bookmark(
    provider: &dyn SearchProvider,
    storage: SharedStore,
    full_name: &str,
) -> anyhow::Result<()> {
    let full_name = full_name.trim();
    if !full_name.contains('/') {
        bail!("Expected owner/name, got '{}'", full_name);
    }

    let mut params = SearchParams::new(format!("repo:{}", full_name));
    params.per_page = 1;
    let repo = provider
        .search(&params)
        .await
        .with_context(|| format!("Failed to look up {}", full_name))?
        .into_iter()
        .next();

    let Some(repo) = repo else {
        bail!("Repository {} not found", full_name);
    };

    let mut bookmarks = BookmarkStore::load(storage);
    let id = repo.id;
    match bookmarks.add(repo) {
        AddOutcome::Added => println!("Repository bookmarked! ({} #{})", full_name, id),
        AddOutcome::AlreadyBookmarked => println!("Already bookmarked!"),
    }
    Ok(())
}

pub fn remove_bookmark(storage: SharedStore, id: u64) {
    let mut bookmarks = BookmarkStore::load(storage);
    if bookmarks.remove(id) {
        println!("Removed from bookmarks");
    } else {
        println!("No bookmark with id {}", id);
    }
}

pub fn clear_bookmarks(storage: SharedStore) {
    let mut bookmarks = BookmarkStore::load(storage);
    bookmarks.clear();
    println!("Cleared all bookmarks");
}

pub fn note(storage: SharedStore, id: u64, text: Option<String>) {
    let mut notes = NoteStore::load(storage);

    match text {
        Some(text) => {
            notes.set(id, &text);
            if notes.get(id).is_some() {
                println!("Note saved");
            } else {
                println!("Note removed");
            }
        }
        None => match notes.get(id) {
            Some(note) => println!("{}", note),
            None => println!("No note for {}", id),
        },
    }
}

pub async fn stats(
    config: &Config,
    provider: &dyn SearchProvider,
    storage: &SharedStore,
    width: usize,
) -> anyhow::Result<()> {
    let repos = match load_last_search(storage.as_ref()) {
        Some(repos) => repos,
        None => {
            info!("No stored search, charting the trending list");
            let mut params = SearchParams::new(config.feed.trending_query.clone());
            params.sort = SortKey::Stars;
            params.order = SortOrder::Desc;
            params.per_page = config.feed.search_per_page;
            provider.search(&params).await.context("Failed to fetch repositories")?
        }
    };

    let Some(stats) = RepoStats::compute(&repos, config.feed.language_top_n, Utc::now()) else {
        println!("No data");
        return Ok(());
    };

    println!("{} repositories\n", stats.total);
    print_chart("Languages", &stats.languages, width);
    print_chart("Stars", &stats.stars, width);
    print_chart("Open issues", &stats.issues, width);
    print_chart("Updates per month", &stats.activity, width);
    print_chart("Most watched", &stats.watchers, width);
    Ok(())
}

/// Write `config` out as a starting point for editing
pub fn init_config(config: &Config, path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", path.display());
    }

    config
        .save_to(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_repos(repos: &[Repository], notes: Option<&NoteStore>) {
    for repo in repos {
        println!(
            "{:>10}  ★{:<8} {:<40} {}",
            repo.id,
            repo.stars,
            repo.full_name,
            repo.language.as_deref().unwrap_or("-")
        );
        if let Some(desc) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            println!("{:>12}{}", "", desc);
        }
        if let Some(note) = notes.and_then(|n| n.get(repo.id)) {
            println!("{:>12}note: {}", "", note);
        }
    }
}

fn print_chart(title: &str, buckets: &[Bucket], width: usize) {
    println!("{}", title);
    for line in chart_lines(buckets, width) {
        println!("{}", line);
    }
    println!();
}

/// Text bar chart, bars scaled so the largest count spans `width`
fn chart_lines(buckets: &[Bucket], width: usize) -> Vec<String> {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let label_width = buckets.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);

    buckets
        .iter()
        .map(|b| {
            let len = if max == 0 {
                0
            } else {
                (b.count as usize * width) / max as usize
            };
            format!(
                "  {:<lw$} {} {}",
                b.label,
                "█".repeat(len),
                b.count,
                lw = label_width
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers every request with the same page
    struct FixedProvider(Vec<Repository>);

    #[async_trait::async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(&self, _params: &SearchParams) -> ghexplorer_core::Result<Vec<Repository>> {
            Ok(self.0.clone())
        }
    }

    fn repo(id: u64) -> Repository {
        Repository {
            id,
            name: format!("r{}", id),
            full_name: format!("octo/r{}", id),
            owner: ghexplorer_core::Owner {
                login: "octo".to_string(),
                avatar_url: String::new(),
            },
            description: None,
            html_url: format!("https://github.com/octo/r{}", id),
            stars: 1,
            forks: 0,
            open_issues: 0,
            watchers: 0,
            language: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_search_replaces_stored_results() {
        let config = Config::default();
        let storage = ghexplorer_store::MemoryStore::shared();

        let filters = SearchFilters {
            query: "a".to_string(),
            ..SearchFilters::default()
        };
        search(&config, &FixedProvider(vec![repo(1), repo(2)]), &storage, filters.clone(), 1)
            .await
            .unwrap();
        assert_eq!(load_last_search(storage.as_ref()).map(|r| r.len()), Some(2));

        search(&config, &FixedProvider(Vec::new()), &storage, filters, 1)
            .await
            .unwrap();
        assert_eq!(load_last_search(storage.as_ref()).map(|r| r.len()), Some(0));
    }

    fn bucket(label: &str, count: u64) -> Bucket {
        Bucket {
            label: label.to_string(),
            count,
        }
    }

    #[test]
    fn test_chart_lines_scale_to_width() {
        let lines = chart_lines(&[bucket("Go", 2), bucket("Rust", 1)], 10);
        assert_eq!(lines[0], format!("  Go   {} 2", "█".repeat(10)));
        assert_eq!(lines[1], format!("  Rust {} 1", "█".repeat(5)));
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ghexplorer").join("config.toml");

        let mut config = Config::default();
        config.feed.debounce_ms = 250;
        init_config(&config, &path, false).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        assert!(init_config(&Config::default(), &path, false).is_err());
        init_config(&Config::default(), &path, true).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_chart_lines_all_zero() {
        let lines = chart_lines(&[bucket("0-50", 0)], 10);
        assert_eq!(lines, vec!["  0-50  0".to_string()]);
    }
}
