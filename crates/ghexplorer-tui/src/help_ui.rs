use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Render keybindings help popup
pub fn render_keybindings_help(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup_area);

    let help_text = Paragraph::new(keybindings_content())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Keybindings ")
                .title_alignment(Alignment::Center)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_text, popup_area);
}

fn keybindings_content() -> Vec<Line<'static>> {
    let section = |title: &str| -> Line<'static> {
        Line::from(vec![Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )])
    };

    let key = |k: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("  {:12}", k),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(desc.to_string()),
        ])
    };

    vec![
        section("Global"),
        key("1-5 / TAB", "Home, Trending, Search, Bookmarks, Stats"),
        key("q / Ctrl+C", "Quit"),
        key("?", "Toggle this help"),
        Line::from(""),
        section("Lists"),
        key("j / k", "Move down / up (more results load near the end)"),
        key("ENTER", "Open repository in the browser"),
        key("b", "Bookmark / unbookmark"),
        key("n", "Edit note"),
        key("r", "Retry after an error / reload stats"),
        Line::from(""),
        section("Trending"),
        key("s", "Cycle sort: stars, forks, updated"),
        Line::from(""),
        section("Search"),
        key("/", "Edit query (runs after you stop typing)"),
        key("l", "Cycle language"),
        key("m", "Cycle minimum stars"),
        key("s / o", "Cycle sort / toggle order"),
        Line::from(""),
        section("Bookmarks"),
        key("/", "Filter by name, description or owner"),
        key("d", "Remove selected"),
        key("C", "Clear all"),
    ]
}

/// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
