//! UI rendering for the triplog TUI
//!
//! Draws the main screen (stats header, paged route list, notes and weather
//! panels, footer) and the modal overlays for the current input mode.

pub mod forms;
pub mod help_overlay;
pub mod route_list;
pub mod side_panel;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Mode, NotificationLevel};

/// Renders the whole screen for the current application state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    route_list::render(frame, app, body[0]);
    side_panel::render(frame, app, body[1]);

    render_footer(frame, app, chunks[2]);

    match &app.mode {
        Mode::RouteForm => forms::render_route_form(frame, app),
        Mode::NoteForm => forms::render_note_form(frame, app),
        Mode::WeatherInput => forms::render_weather_input(frame, app),
        Mode::ConfirmDelete(target) => forms::render_confirm_delete(frame, app, target),
        Mode::Browse | Mode::Search => {}
    }

    if app.show_help {
        help_overlay::render(frame);
    }
}

/// Title plus the route and note counters
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.tracker.stats();
    let line = Line::from(vec![
        Span::styled(
            " Triplog ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  Routes: {}  Completed: {}  Notes: {}",
            stats.total_routes, stats.completed_routes, stats.total_notes
        )),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Shows the active notification, or key hints when there is none
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.notification {
        Some(n) => Line::from(Span::styled(
            format!(" {}", n.message),
            Style::default().fg(notification_color(n.level)),
        )),
        None => Line::from(Span::styled(
            " a:add  e:edit  d:delete  n:note  /:search  c:completed  w:weather  ?:help  q:quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn notification_color(level: NotificationLevel) -> Color {
    match level {
        NotificationLevel::Success => Color::Green,
        NotificationLevel::Info => Color::Cyan,
        NotificationLevel::Warning => Color::Yellow,
        NotificationLevel::Error => Color::Red,
    }
}

/// Helper function to create a centered rect
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::app::NotificationLevel;

    #[test]
    fn test_header_shows_stats() {
        let (mut app, _dir) = create_test_app();
        add_route(&mut app, "Sea", "Odesa", true);
        add_route(&mut app, "Hills", "Lviv", false);

        let content = render_to_string(100, 30, |frame| render(frame, &app));
        assert!(content.contains("Routes: 2"));
        assert!(content.contains("Completed: 1"));
        assert!(content.contains("Notes: 0"));
    }

    #[test]
    fn test_footer_shows_notification() {
        let (mut app, _dir) = create_test_app();
        app.notify(NotificationLevel::Warning, "Enter a city name");

        let content = render_to_string(100, 30, |frame| render(frame, &app));
        assert!(content.contains("Enter a city name"));
        assert!(!content.contains("?:help"));
    }

    #[test]
    fn test_overlay_follows_mode() {
        let (mut app, _dir) = create_test_app();
        app.mode = Mode::WeatherInput;
        let content = render_to_string(100, 30, |frame| render(frame, &app));
        assert!(content.contains("City"));

        app.mode = Mode::Browse;
        app.show_help = true;
        let content = render_to_string(100, 30, |frame| render(frame, &app));
        assert!(content.contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_centered_rect_fits_area() {
        let area = Rect::new(0, 0, 80, 24);
        let rect = centered_rect(40, 10, area);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.height, 10);
        assert_eq!(rect.x, 20);
        assert_eq!(rect.y, 7);
    }
}
