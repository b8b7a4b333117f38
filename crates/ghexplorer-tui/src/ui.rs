// UI rendering logic
use crate::{
    app::{App, FeedView, InputMode, Route, StatsState},
    help_ui::{centered_rect, render_keybindings_help},
    sparkline::bucket_sparkline,
};
use ghexplorer_core::{Bucket, FeedController, FeedState, NoteStore, RepoStats, Repository};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Route tabs
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);

    match app.route {
        Route::Home => render_home(frame, app, chunks[1]),
        Route::Trending => render_feed_view(frame, app, FeedView::Trending, chunks[1]),
        Route::Search => render_search(frame, app, chunks[1]),
        Route::Bookmarks => render_bookmarks(frame, app, chunks[1]),
        Route::Stats => render_stats(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);

    if app.input_mode == InputMode::EditingNote {
        render_note_popup(frame, app, frame.area());
    }

    if app.show_help {
        render_keybindings_help(frame, frame.area());
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Route::ALL
        .iter()
        .enumerate()
        .map(|(i, route)| Line::from(format!("{} {}", i + 1, route.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.route.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    " GitHub Explorer ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    frame.render_widget(tabs, area);
}

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
    let accent = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Discover Top Open Source Repositories",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Find trending repositories, analyze project stats,"),
        Line::from("and keep track of your favorites."),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{}", app.bookmarks.len()), accent),
            Span::raw(" bookmarks   "),
            Span::styled(format!("{}", app.notes.len()), accent),
            Span::raw(" notes"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("2", accent),
            Span::raw(" trending   "),
            Span::styled("3", accent),
            Span::raw(" search   "),
            Span::styled("4", accent),
            Span::raw(" bookmarks   "),
            Span::styled("5", accent),
            Span::raw(" stats   "),
            Span::styled("?", accent),
            Span::raw(" help"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Length(1), // Active filters
            Constraint::Min(3),    // Results
        ])
        .split(area);

    let editing = app.input_mode == InputMode::Searching;
    let input = Paragraph::new(app.filters.query.as_str())
        .style(if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search repositories (/ to edit) "),
        );
    frame.render_widget(input, chunks[0]);

    if editing {
        frame.set_cursor_position((
            chunks[0].x + 1 + app.filters.query.chars().count() as u16,
            chunks[0].y + 1,
        ));
    }

    let filters = &app.filters;
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Cyan);
    let filter_line = Line::from(vec![
        Span::styled(" language ", label),
        Span::styled(filters.language.as_deref().unwrap_or("all").to_string(), value),
        Span::styled("  min stars ", label),
        Span::styled(filters.min_stars.to_string(), value),
        Span::styled("  sort ", label),
        Span::styled(filters.sort.to_string(), value),
        Span::styled("  order ", label),
        Span::styled(filters.order.to_string(), value),
    ]);
    frame.render_widget(Paragraph::new(filter_line), chunks[1]);

    if app.search.state() == FeedState::Idle {
        let hint = Paragraph::new("Type a query to search GitHub")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Results "))
            .alignment(Alignment::Center);
        frame.render_widget(hint, chunks[2]);
        return;
    }

    render_feed_view(frame, app, FeedView::Search, chunks[2]);
}

fn render_feed_view(frame: &mut Frame, app: &mut App, view: FeedView, area: Rect) {
    let chunks = split_list_detail(area);

    let (feed, list_state, title) = match view {
        FeedView::Trending => (
            &app.trending,
            &mut app.trending_list,
            format!(" Trending by {} ", app.trending_sort),
        ),
        FeedView::Search => (&app.search, &mut app.search_list, " Results ".to_string()),
    };

    let repos: Vec<&Repository> = feed.items().iter().collect();
    let mut items = repo_list_items(&repos, app.bookmarks.list(), &app.notes);
    if let Some(footer) = feed_footer(feed) {
        items.push(footer);
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}({}) ", title, feed.items().len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, chunks[0], list_state);

    let selected = list_state.selected().and_then(|i| feed.items().get(i));
    render_details(frame, chunks[1], selected, app);
}

fn render_bookmarks(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let filtering = app.input_mode == InputMode::FilteringBookmarks;
    let filter = Paragraph::new(app.bookmark_filter.as_str())
        .style(if filtering {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Filter bookmarks (/ to edit) "),
        );
    frame.render_widget(filter, chunks[0]);

    let panes = split_list_detail(chunks[1]);
    let visible = app.bookmarks.filter(&app.bookmark_filter);

    if visible.is_empty() {
        let message = if app.bookmarks.is_empty() {
            "No bookmarks yet. Press b on any repository to save it."
        } else {
            "No bookmarks match the filter"
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Bookmarks "))
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, panes[0]);
        render_details(frame, panes[1], None, app);
        return;
    }

    let items = repo_list_items(&visible, app.bookmarks.list(), &app.notes);
    let title = format!(" Bookmarks ({}/{}) ", visible.len(), app.bookmarks.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let selected = app.selected_repository().cloned();
    frame.render_stateful_widget(list, panes[0], &mut app.bookmarks_list);
    render_details(frame, panes[1], selected.as_ref(), app);
}

fn split_list_detail(area: Rect) -> std::rc::Rc<[Rect]> {
    let (list_pct, detail_pct) = if area.width < 100 { (50, 50) } else { (45, 55) };
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(list_pct),
            Constraint::Percentage(detail_pct),
        ])
        .split(area)
}

fn repo_list_items<'a>(
    repos: &[&'a Repository],
    bookmarked: &[Repository],
    notes: &NoteStore,
) -> Vec<ListItem<'a>> {
    repos
        .iter()
        .map(|&repo| {
            let is_bookmarked = bookmarked.iter().any(|b| b.id == repo.id);
            let has_note = notes.get(repo.id).is_some();

            let line1 = Line::from(vec![
                Span::styled(
                    if is_bookmarked { "● " } else { "  " },
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(
                    format!("★{:>7} ", format_number(repo.stars)),
                    Style::default().fg(Color::Rgb(255, 215, 0)),
                ),
                Span::styled(
                    repo.full_name.as_str(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    if has_note { " ✎" } else { "" },
                    Style::default().fg(Color::Green),
                ),
            ]);

            let line2 = Line::from(vec![
                Span::raw("           "),
                Span::styled(
                    repo.language.as_deref().unwrap_or("-"),
                    Style::default().fg(Color::Blue),
                ),
                Span::raw("  "),
                Span::styled(
                    truncate(repo.description.as_deref().unwrap_or(""), 60),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            ListItem::new(vec![line1, line2])
        })
        .collect()
}

/// Trailing row describing where pagination stands
fn feed_footer(feed: &FeedController) -> Option<ListItem<'static>> {
    let line = match feed.state() {
        FeedState::Fetching => Line::from(Span::styled(
            "  Loading...",
            Style::default().fg(Color::Cyan),
        )),
        FeedState::Failed => Line::from(Span::styled(
            format!("  {} (r to retry)", feed.error().unwrap_or("Request failed")),
            Style::default().fg(Color::Red),
        )),
        FeedState::Exhausted if feed.items().is_empty() => Line::from(Span::styled(
            "  No repositories found",
            Style::default().fg(Color::DarkGray),
        )),
        FeedState::Exhausted => Line::from(Span::styled(
            "  No more results",
            Style::default().fg(Color::DarkGray),
        )),
        FeedState::Idle | FeedState::Ready => return None,
    };
    Some(ListItem::new(line))
}

fn render_details(frame: &mut Frame, area: Rect, repo: Option<&Repository>, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");

    let Some(repo) = repo else {
        let empty = Paragraph::new("Nothing selected")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(
            repo.full_name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(repo.description.clone().unwrap_or_else(|| "No description".into())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Stars    ", label),
            Span::raw(format_number(repo.stars)),
            Span::styled("   Forks  ", label),
            Span::raw(format_number(repo.forks)),
        ]),
        Line::from(vec![
            Span::styled("Issues   ", label),
            Span::raw(format_number(repo.open_issues)),
            Span::styled("   Watchers  ", label),
            Span::raw(format_number(repo.watchers)),
        ]),
        Line::from(vec![
            Span::styled("Language ", label),
            Span::raw(repo.language.clone().unwrap_or_else(|| "-".into())),
        ]),
        Line::from(vec![
            Span::styled("Updated  ", label),
            Span::raw(repo.updated_at.format("%Y-%m-%d").to_string()),
        ]),
        Line::from(vec![
            Span::styled("Owner    ", label),
            Span::raw(repo.owner.login.clone()),
        ]),
        Line::from(Span::styled(repo.url(), Style::default().fg(Color::Blue))),
        Line::from(""),
    ];

    if app.bookmarks.contains(repo.id) {
        lines.push(Line::from(Span::styled(
            "● Bookmarked",
            Style::default().fg(Color::Magenta),
        )));
    }

    if let Some(note) = app.notes.get(repo.id) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Note", label)));
        lines.push(Line::from(Span::styled(
            note.to_string(),
            Style::default().fg(Color::Green),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let stats = match &app.stats {
        StatsState::Ready(Some(stats)) => stats,
        other => {
            let (text, color) = match other {
                StatsState::Failed(e) => (format!("{} (r to retry)", e), Color::Red),
                StatsState::Ready(None) => ("No data to chart".to_string(), Color::DarkGray),
                _ => ("Loading stats...".to_string(), Color::Cyan),
            };
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(color))
                .block(Block::default().borders(Borders::ALL).title(" Stats "))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(area);

    render_stats_header(frame, stats, rows[0]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(rows[2]);

    horizontal_chart(frame, " Languages ", &stats.languages, Color::Cyan, top[0]);
    vertical_chart(frame, " Updates per month ", &stats.activity, Color::Green, 6, top[1]);
    vertical_chart(frame, " Stars ", &stats.stars, Color::Yellow, 8, bottom[0]);
    vertical_chart(frame, " Open issues ", &stats.issues, Color::Red, 7, bottom[1]);
    horizontal_chart(frame, " Most watched ", &stats.watchers, Color::Magenta, bottom[2]);
}

fn render_stats_header(frame: &mut Frame, stats: &RepoStats, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} repositories", stats.total),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("   activity ", Style::default().fg(Color::DarkGray)),
        Span::styled(bucket_sparkline(&stats.activity), Style::default().fg(Color::Green)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn vertical_chart(
    frame: &mut Frame,
    title: &str,
    buckets: &[Bucket],
    color: Color,
    bar_width: u16,
    area: Rect,
) {
    let data: Vec<(&str, u64)> = buckets.iter().map(|b| (b.label.as_str(), b.count)).collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .data(&data[..])
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));
    frame.render_widget(chart, area);
}

fn horizontal_chart(frame: &mut Frame, title: &str, buckets: &[Bucket], color: Color, area: Rect) {
    let data: Vec<(&str, u64)> = buckets.iter().map(|b| (b.label.as_str(), b.count)).collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .direction(Direction::Horizontal)
        .data(&data[..])
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));
    frame.render_widget(chart, area);
}

fn render_note_popup(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup);

    let title = app
        .note_target()
        .map(|id| format!(" Note for #{} (ENTER save, ESC cancel) ", id))
        .unwrap_or_else(|| " Note ".to_string());

    let input = Paragraph::new(app.note_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(input, popup);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(toast) = &app.toast {
        Span::styled(
            toast.message.clone(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else if let Some(message) = &app.status {
        Span::styled(message.clone(), Style::default().fg(Color::Red))
    } else {
        match app.input_mode {
            InputMode::Searching => Span::styled(
                "SEARCH | type to search | ENTER: search now | ESC: done",
                Style::default().fg(Color::Yellow),
            ),
            InputMode::FilteringBookmarks => Span::styled(
                "FILTER | type to filter | ENTER/ESC: done",
                Style::default().fg(Color::Yellow),
            ),
            InputMode::EditingNote => Span::styled(
                "NOTE | ENTER: save (empty removes) | ESC: cancel",
                Style::default().fg(Color::Green),
            ),
            InputMode::Normal => Span::raw(match app.route {
                Route::Home => "1-5: switch view | ?: help | q: quit",
                Route::Trending => "j/k: move | s: sort | b: bookmark | n: note | ENTER: open | r: retry | q: quit",
                Route::Search => "/: edit | l: language | m: min stars | s/o: sort | b: bookmark | ENTER: open | q: quit",
                Route::Bookmarks => "/: filter | d: remove | C: clear all | n: note | ENTER: open | q: quit",
                Route::Stats => "r: reload | 1-5: switch view | q: quit",
            }),
        }
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

fn format_number(num: u32) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}k", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
