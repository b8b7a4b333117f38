// TUI event loop and terminal management
use crate::app::{Action, App, FeedView};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ghexplorer_core::{Debouncer, FeedQuery, FetchTicket, Repository, SearchProvider};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How often the input thread wakes up when nothing happens
const TICK_RATE: Duration = Duration::from_millis(250);

/// Everything the event loop reacts to
#[derive(Debug)]
pub enum AppEvent {
    Input(KeyEvent),
    Tick,
    /// A search query that survived the debounce window
    SearchQuery(FeedQuery),
    Fetched {
        view: FeedView,
        ticket: FetchTicket,
        result: ghexplorer_core::Result<Vec<Repository>>,
    },
    /// Fallback stats source, tagged with the snapshot generation it started at
    StatsFetched {
        generation: u64,
        result: ghexplorer_core::Result<Vec<Repository>>,
    },
}

pub async fn run_tui(app: App, provider: Arc<dyn SearchProvider>) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app, provider).await;

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    provider: Arc<dyn SearchProvider>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_input_thread(tx.clone());

    let delay = Duration::from_millis(app.feed_config().debounce_ms);
    let mut debouncer = Debouncer::new(delay, tx.clone());
    info!("TUI started");

    loop {
        terminal.draw(|f| crate::ui::render(f, &mut app))?;

        let Some(event) = rx.recv().await else {
            break;
        };

        let actions = match event {
            AppEvent::Input(key) => app.handle_key(key),
            AppEvent::Tick => {
                app.expire_toast(Instant::now());
                Vec::new()
            }
            AppEvent::SearchQuery(query) => app.apply_search_query(query),
            AppEvent::Fetched {
                view,
                ticket,
                result,
            } => {
                let outcome = app.apply_fetch(view, &ticket, result);
                debug!(?view, page = ticket.page, ?outcome, "fetch applied");
                Vec::new()
            }
            AppEvent::StatsFetched { generation, result } => {
                app.apply_stats_fetch(generation, result, Utc::now())
            }
        };

        app.drain_bookmark_events();

        for action in actions {
            perform(action, &mut app, &provider, &tx, &mut debouncer);
        }

        if app.should_quit {
            break;
        }
    }

    info!("TUI exiting");
    Ok(())
}

fn perform(
    action: Action,
    app: &mut App,
    provider: &Arc<dyn SearchProvider>,
    tx: &mpsc::UnboundedSender<AppEvent>,
    debouncer: &mut Debouncer<AppEvent>,
) {
    match action {
        Action::Fetch(view, ticket) => {
            let provider = Arc::clone(provider);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = provider.search(&ticket.params()).await;
                // Loop gone means we're shutting down
                let _ = tx.send(AppEvent::Fetched {
                    view,
                    ticket,
                    result,
                });
            });
        }
        Action::DebounceSearch(query) => debouncer.trigger(AppEvent::SearchQuery(query)),
        Action::CancelDebounce => debouncer.cancel(),
        Action::LoadStats => match app.stored_search() {
            Some(repos) => {
                debug!("Stats from {} stored search results", repos.len());
                app.set_stats_source(Ok(repos), Utc::now());
            }
            None => {
                let params = app.stats_fallback_params();
                let generation = app.snapshot_generation();
                let provider = Arc::clone(provider);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = provider.search(&params).await;
                    let _ = tx.send(AppEvent::StatsFetched { generation, result });
                });
            }
        },
        Action::OpenUrl(url) => {
            if let Err(e) = open::that(&url) {
                warn!("Failed to open {}: {}", url, e);
                app.status = Some(format!("Failed to open browser: {}", e));
            }
        }
    }
}

/// Terminal input is blocking, so it gets its own thread
fn spawn_input_thread(tx: mpsc::UnboundedSender<AppEvent>) {
    std::thread::spawn(move || loop {
        let event = match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Input(key),
                // Redraw on resize
                Ok(Event::Resize(..)) => AppEvent::Tick,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Reading terminal input failed: {}", e);
                    break;
                }
            },
            Ok(false) => AppEvent::Tick,
            Err(e) => {
                warn!("Polling terminal input failed: {}", e);
                break;
            }
        };

        if tx.send(event).is_err() {
            break;
        }
    });
}
