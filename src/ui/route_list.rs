//! Paged route list with search/filter status and page links

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Focus, Mode};
use crate::data::Route;
use crate::pagination::Page;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.focus == Focus::Routes {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(" Routes ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(filter_line(app)), chunks[0]);

    let visible = app.tracker.visible_routes();
    let lines: Vec<Line> = if visible.items.is_empty() {
        let message = if app.tracker.routes().is_empty() {
            "No routes yet. Press 'a' to add one."
        } else {
            "No routes match the current filter."
        };
        vec![Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        visible
            .items
            .iter()
            .enumerate()
            .flat_map(|(i, (number, route))| {
                route_lines(*number, route, i == app.route_cursor && app.focus == Focus::Routes)
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines), chunks[1]);

    frame.render_widget(Paragraph::new(page_bar(&visible.page)), chunks[2]);
}

/// Search box and filter state
fn filter_line(app: &App) -> Line<'static> {
    let searching = app.mode == Mode::Search;
    let term = if searching {
        format!("{}_", app.search_input)
    } else {
        app.tracker.search().to_string()
    };
    let search_style = if searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let filter = if app.tracker.completed_only() {
        Span::styled("  [completed only]", Style::default().fg(Color::Green))
    } else {
        Span::raw("")
    };

    Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::DarkGray)),
        Span::styled(term, search_style),
        filter,
    ])
}

/// Heading, transport/dates and optional description for one route
fn route_lines(number: usize, route: &Route, selected: bool) -> Vec<Line<'static>> {
    let marker = if selected { "> " } else { "  " };
    let check = if route.completed { "[x]" } else { "[ ]" };
    let mut title_style = Style::default().add_modifier(Modifier::BOLD);
    if selected {
        title_style = title_style.fg(Color::Yellow);
    }

    let dates = match (route.start_date, route.end_date) {
        (Some(start), Some(end)) => format!("{} - {}", start, end),
        (Some(start), None) => format!("from {}", start),
        (None, Some(end)) => format!("until {}", end),
        (None, None) => "no dates".to_string(),
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw(marker),
            Span::raw(format!("{}. {} ", number, check)),
            Span::styled(route.name.clone(), title_style),
            Span::styled(
                format!("  {}", route.destination),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(Span::styled(
            format!("       {} | {}", route.transport, dates),
            Style::default().fg(Color::Gray),
        )),
    ];
    if !route.description.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("       {}", route.description),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

/// Page links for the visible window, with the current page highlighted
fn page_bar(page: &Page) -> Line<'static> {
    let mut spans = Vec::new();
    let arrow_style = |enabled: bool| {
        if enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    spans.push(Span::styled("< ", arrow_style(page.has_prev())));
    for n in page.window() {
        if n == page.current {
            spans.push(Span::styled(
                format!("[{}]", n),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(format!(" {} ", n)));
        }
    }
    spans.push(Span::styled(" >", arrow_style(page.has_next())));
    spans.push(Span::styled(
        format!("  {} route(s)", page.total_items),
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}
