// TUI application state and event handling
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ghexplorer_core::{
    config::FeedConfig, is_near_end, load_last_search, save_last_search, BookmarkEvent,
    BookmarkStore, FeedController, FeedQuery, FetchOutcome, FetchTicket, NoteStore, RepoStats,
    Repository, SearchFilters, SearchParams, SortKey, SortOrder,
};
use ghexplorer_store::SharedStore;
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

/// How long a toast stays in the status bar
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Sort keys the trending view cycles through
const TRENDING_SORTS: [SortKey; 3] = [SortKey::Stars, SortKey::Forks, SortKey::Updated];

/// Minimum-star presets for the search filter
const MIN_STAR_STEPS: [u32; 5] = [0, 100, 1_000, 10_000, 50_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Trending,
    Search,
    Bookmarks,
    Stats,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Home,
        Route::Trending,
        Route::Search,
        Route::Bookmarks,
        Route::Stats,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Trending => "Trending",
            Route::Search => "Search",
            Route::Bookmarks => "Bookmarks",
            Route::Stats => "Stats",
        }
    }

    pub fn index(self) -> usize {
        Route::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    fn from_digit(c: char) -> Option<Route> {
        let idx = c.to_digit(10)? as usize;
        idx.checked_sub(1).and_then(|i| Route::ALL.get(i).copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,             // Navigating lists
    Searching,          // Typing the search query
    FilteringBookmarks, // Typing in the bookmark filter
    EditingNote,        // Writing a note for the selected repo
}

/// The two paginated views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedView {
    Trending,
    Search,
}

/// Side effects the runner performs on behalf of the app
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Fetch(FeedView, FetchTicket),
    DebounceSearch(FeedQuery),
    CancelDebounce,
    /// Fill the stats view, from the stored search or a fresh fetch
    LoadStats,
    OpenUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsState {
    NotLoaded,
    Loading,
    /// `None` means there was nothing to aggregate
    Ready(Option<RepoStats>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    shown_at: Instant,
}

pub struct App {
    pub should_quit: bool,
    pub route: Route,
    pub input_mode: InputMode,
    pub show_help: bool,

    pub trending: FeedController,
    pub trending_sort: SortKey,
    pub trending_list: ListState,

    pub search: FeedController,
    pub filters: SearchFilters,
    pub search_list: ListState,

    pub bookmarks: BookmarkStore,
    pub bookmark_filter: String,
    pub bookmarks_list: ListState,

    pub notes: NoteStore,
    pub note_buffer: String,
    note_target: Option<u64>,

    pub stats: StatsState,
    pub toast: Option<Toast>,
    /// Sticky message for failures that aren't tied to a feed
    pub status: Option<String>,

    storage: SharedStore,
    /// Bumped whenever the stored search changes
    snapshot_generation: u64,
    bookmark_events: broadcast::Receiver<BookmarkEvent>,
    feed_config: FeedConfig,
}

impl App {
    pub fn new(feed_config: FeedConfig, storage: SharedStore) -> Self {
        let bookmarks = BookmarkStore::load(storage.clone());
        let bookmark_events = bookmarks.subscribe();
        let notes = NoteStore::load(storage.clone());

        Self {
            should_quit: false,
            route: Route::Home,
            input_mode: InputMode::Normal,
            show_help: false,
            trending: FeedController::new(feed_config.trending_per_page),
            trending_sort: SortKey::Stars,
            trending_list: ListState::default(),
            search: FeedController::new(feed_config.search_per_page),
            filters: SearchFilters::default(),
            search_list: ListState::default(),
            bookmarks,
            bookmark_filter: String::new(),
            bookmarks_list: ListState::default(),
            notes,
            note_buffer: String::new(),
            note_target: None,
            stats: StatsState::NotLoaded,
            toast: None,
            status: None,
            storage,
            snapshot_generation: 0,
            bookmark_events,
            feed_config,
        }
    }

    pub fn feed_config(&self) -> &FeedConfig {
        &self.feed_config
    }

    pub fn trending_query(&self) -> FeedQuery {
        FeedQuery::new(
            self.feed_config.trending_query.clone(),
            self.trending_sort,
            SortOrder::Desc,
        )
    }

    /// Request used when the stats view has no stored search to work from
    pub fn stats_fallback_params(&self) -> SearchParams {
        let mut params = SearchParams::new(self.feed_config.trending_query.clone());
        params.sort = SortKey::Stars;
        params.order = SortOrder::Desc;
        params.per_page = self.feed_config.search_per_page;
        params
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn switch_route(&mut self, route: Route) -> Vec<Action> {
        let mut actions = Vec::new();
        self.route = route;
        self.input_mode = InputMode::Normal;
        self.show_help = false;

        match route {
            Route::Trending if self.trending.query().is_none() => {
                let query = self.trending_query();
                if let Some(ticket) = self.trending.set_query(query) {
                    actions.push(Action::Fetch(FeedView::Trending, ticket));
                }
            }
            Route::Search if self.filters.is_blank() => {
                self.input_mode = InputMode::Searching;
            }
            Route::Stats if self.stats == StatsState::NotLoaded => {
                self.stats = StatsState::Loading;
                actions.push(Action::LoadStats);
            }
            _ => {}
        }

        actions
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return Vec::new();
        }

        self.status = None;

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Searching => self.handle_search_input(key),
            InputMode::FilteringBookmarks => {
                self.handle_bookmark_filter_input(key);
                Vec::new()
            }
            InputMode::EditingNote => {
                self.handle_note_input(key);
                Vec::new()
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                Vec::new()
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                Vec::new()
            }
            KeyCode::Char(c @ '1'..='5') => match Route::from_digit(c) {
                Some(route) => self.switch_route(route),
                None => Vec::new(),
            },
            KeyCode::Tab => {
                let next = Route::ALL[(self.route.index() + 1) % Route::ALL.len()];
                self.switch_route(next)
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(10),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::Enter => self
                .selected_repository()
                .map(|repo| vec![Action::OpenUrl(repo.url())])
                .unwrap_or_default(),
            KeyCode::Char('b') => {
                self.toggle_selected_bookmark();
                Vec::new()
            }
            KeyCode::Char('n') => {
                self.begin_note();
                Vec::new()
            }
            KeyCode::Char('r') => self.retry(),
            KeyCode::Char('/') => {
                match self.route {
                    Route::Search => self.input_mode = InputMode::Searching,
                    Route::Bookmarks => self.input_mode = InputMode::FilteringBookmarks,
                    _ => {}
                }
                Vec::new()
            }
            _ => match self.route {
                Route::Trending => self.handle_trending_key(key),
                Route::Search => self.handle_search_filter_key(key),
                Route::Bookmarks => {
                    self.handle_bookmarks_key(key);
                    Vec::new()
                }
                _ => Vec::new(),
            },
        }
    }

    fn handle_trending_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code != KeyCode::Char('s') {
            return Vec::new();
        }

        let idx = TRENDING_SORTS
            .iter()
            .position(|k| *k == self.trending_sort)
            .unwrap_or(0);
        self.trending_sort = TRENDING_SORTS[(idx + 1) % TRENDING_SORTS.len()];
        self.trending_list.select(None);

        let query = self.trending_query();
        self.trending
            .set_query(query)
            .map(|ticket| vec![Action::Fetch(FeedView::Trending, ticket)])
            .unwrap_or_default()
    }

    fn handle_search_filter_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Char('l') => self.filters.cycle_language(),
            KeyCode::Char('s') => self.filters.cycle_sort(),
            KeyCode::Char('o') => self.filters.toggle_order(),
            KeyCode::Char('m') => {
                let idx = MIN_STAR_STEPS
                    .iter()
                    .position(|s| *s == self.filters.min_stars)
                    .unwrap_or(0);
                self.filters.min_stars = MIN_STAR_STEPS[(idx + 1) % MIN_STAR_STEPS.len()];
            }
            _ => return Vec::new(),
        }

        // Filter changes apply immediately
        let mut actions = vec![Action::CancelDebounce];
        actions.extend(self.run_search(self.filters.feed_query()));
        actions
    }

    fn handle_bookmarks_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_repository().map(|r| r.id) {
                    self.bookmarks.remove(id);
                    self.clamp_bookmark_selection();
                }
            }
            KeyCode::Char('C') => {
                self.bookmarks.clear();
                self.bookmarks_list.select(None);
            }
            _ => {}
        }
    }

    fn handle_search_input(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                Vec::new()
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let mut actions = vec![Action::CancelDebounce];
                actions.extend(self.run_search(self.filters.feed_query()));
                actions
            }
            KeyCode::Char(c) => {
                self.filters.query.push(c);
                vec![Action::DebounceSearch(self.filters.feed_query())]
            }
            KeyCode::Backspace => {
                self.filters.query.pop();
                vec![Action::DebounceSearch(self.filters.feed_query())]
            }
            _ => Vec::new(),
        }
    }

    fn handle_bookmark_filter_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Char(c) => self.bookmark_filter.push(c),
            KeyCode::Backspace => {
                self.bookmark_filter.pop();
            }
            _ => return,
        }
        self.clamp_bookmark_selection();
    }

    fn handle_note_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.note_target = None;
                self.note_buffer.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => self.save_note(),
            KeyCode::Char(c) => self.note_buffer.push(c),
            KeyCode::Backspace => {
                self.note_buffer.pop();
            }
            _ => {}
        }
    }

    /// A debounced query arrived. Only acted on if the text hasn't moved on.
    pub fn apply_search_query(&mut self, query: FeedQuery) -> Vec<Action> {
        if query != self.filters.feed_query() {
            debug!("Ignoring outdated debounced query '{}'", query.query);
            return Vec::new();
        }
        self.run_search(query)
    }

    fn run_search(&mut self, query: FeedQuery) -> Vec<Action> {
        let changed = self.search.query() != Some(&query);
        let ticket = self.search.set_query(query);
        if changed {
            self.search_list.select(None);
        }

        ticket
            .map(|t| vec![Action::Fetch(FeedView::Search, t)])
            .unwrap_or_default()
    }

    /// Fold a finished fetch into its feed
    pub fn apply_fetch(
        &mut self,
        view: FeedView,
        ticket: &FetchTicket,
        result: ghexplorer_core::Result<Vec<Repository>>,
    ) -> FetchOutcome {
        let (feed, list) = match view {
            FeedView::Trending => (&mut self.trending, &mut self.trending_list),
            FeedView::Search => (&mut self.search, &mut self.search_list),
        };

        let outcome = feed.complete(ticket, result);
        if list.selected().is_none() && !feed.items().is_empty() {
            list.select(Some(0));
        }

        // An empty first page still replaces the previous search
        let replaces_snapshot = match outcome {
            FetchOutcome::Appended(_) => true,
            FetchOutcome::Exhausted => self.search.items().is_empty(),
            FetchOutcome::Failed | FetchOutcome::Stale => false,
        };

        if view == FeedView::Search && replaces_snapshot {
            save_last_search(self.storage.as_ref(), self.search.items());
            self.snapshot_generation += 1;
            // Recompute from the new results next time the stats view opens
            if self.stats != StatsState::Loading {
                self.stats = StatsState::NotLoaded;
            }
        }

        outcome
    }

    pub fn snapshot_generation(&self) -> u64 {
        self.snapshot_generation
    }

    /// Fold in a fallback stats fetch started at `generation`. If a search
    /// was stored meanwhile the response is dropped and stats reload from it.
    pub fn apply_stats_fetch(
        &mut self,
        generation: u64,
        result: ghexplorer_core::Result<Vec<Repository>>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Vec<Action> {
        if generation != self.snapshot_generation {
            debug!("Dropping stats fetch from generation {}", generation);
            return if self.stats == StatsState::Loading {
                vec![Action::LoadStats]
            } else {
                Vec::new()
            };
        }

        self.set_stats_source(result, now);
        Vec::new()
    }

    pub fn set_stats_source(
        &mut self,
        result: ghexplorer_core::Result<Vec<Repository>>,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        self.stats = match result {
            Ok(repos) => StatsState::Ready(RepoStats::compute(
                &repos,
                self.feed_config.language_top_n,
                now,
            )),
            Err(e) => StatsState::Failed(e.to_string()),
        };
    }

    fn retry(&mut self) -> Vec<Action> {
        match self.route {
            Route::Trending => self
                .trending
                .retry()
                .map(|t| vec![Action::Fetch(FeedView::Trending, t)])
                .unwrap_or_default(),
            Route::Search => self
                .search
                .retry()
                .map(|t| vec![Action::Fetch(FeedView::Search, t)])
                .unwrap_or_default(),
            Route::Stats if self.stats != StatsState::Loading => {
                self.stats = StatsState::Loading;
                vec![Action::LoadStats]
            }
            _ => Vec::new(),
        }
    }

    fn move_selection(&mut self, delta: isize) -> Vec<Action> {
        let threshold = self.feed_config.scroll_threshold;
        let (feed, list, view) = match self.route {
            Route::Trending => (&mut self.trending, &mut self.trending_list, FeedView::Trending),
            Route::Search => (&mut self.search, &mut self.search_list, FeedView::Search),
            Route::Bookmarks => {
                let len = self.visible_bookmarks().len();
                step(&mut self.bookmarks_list, len, delta);
                return Vec::new();
            }
            _ => return Vec::new(),
        };

        let len = feed.items().len();
        match step(list, len, delta) {
            Some(selected) if is_near_end(selected, len, threshold) => feed
                .request_next_page()
                .map(|t| vec![Action::Fetch(view, t)])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn visible_bookmarks(&self) -> Vec<&Repository> {
        self.bookmarks.filter(&self.bookmark_filter)
    }

    pub fn selected_repository(&self) -> Option<&Repository> {
        match self.route {
            Route::Trending => self
                .trending_list
                .selected()
                .and_then(|i| self.trending.items().get(i)),
            Route::Search => self
                .search_list
                .selected()
                .and_then(|i| self.search.items().get(i)),
            Route::Bookmarks => self
                .bookmarks_list
                .selected()
                .and_then(|i| self.visible_bookmarks().get(i).copied()),
            _ => None,
        }
    }

    fn toggle_selected_bookmark(&mut self) {
        if let Some(repo) = self.selected_repository().cloned() {
            self.bookmarks.toggle(&repo);
            if self.route == Route::Bookmarks {
                self.clamp_bookmark_selection();
            }
        }
    }

    fn begin_note(&mut self) {
        if let Some(id) = self.selected_repository().map(|r| r.id) {
            self.note_buffer = self.notes.get(id).unwrap_or_default().to_string();
            self.note_target = Some(id);
            self.input_mode = InputMode::EditingNote;
        }
    }

    fn save_note(&mut self) {
        if let Some(id) = self.note_target.take() {
            let text = std::mem::take(&mut self.note_buffer);
            let had_note = self.notes.get(id).is_some();
            self.notes.set(id, &text);

            if self.notes.get(id).is_some() {
                self.show_toast("Note saved");
            } else if had_note {
                self.show_toast("Note removed");
            }
        }
        self.input_mode = InputMode::Normal;
    }

    fn clamp_bookmark_selection(&mut self) {
        let len = self.visible_bookmarks().len();
        let selected = self.bookmarks_list.selected();
        self.bookmarks_list.select(match (selected, len) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        });
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            shown_at: Instant::now(),
        });
    }

    /// Turn pending bookmark notifications into a toast
    pub fn drain_bookmark_events(&mut self) {
        loop {
            match self.bookmark_events.try_recv() {
                Ok(event) => self.show_toast(event.message()),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("Skipped {} bookmark events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    pub fn expire_toast(&mut self, now: Instant) {
        if self
            .toast
            .as_ref()
            .is_some_and(|t| now.duration_since(t.shown_at) >= TOAST_DURATION)
        {
            self.toast = None;
        }
    }

    /// Results of the last search, if any were stored
    pub fn stored_search(&self) -> Option<Vec<Repository>> {
        load_last_search(self.storage.as_ref())
    }

    pub fn note_target(&self) -> Option<u64> {
        self.note_target
    }
}

/// Move a list selection by `delta`, clamped to the list
fn step(list: &mut ListState, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        list.select(None);
        return None;
    }

    let current = list.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1) as usize;
    list.select(Some(next));
    Some(next)
}
