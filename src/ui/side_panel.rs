//! Weather and notes panels on the right-hand side

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use crate::data::WeatherReport;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(area);

    render_weather(frame, app, chunks[0]);
    render_notes(frame, app, chunks[1]);
}

fn render_weather(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Weather ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let lines = match &app.weather {
        None => vec![Line::from(Span::styled(
            "Press 'w' to look up a city",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(fetched) => weather_lines(fetched.data()),
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn weather_lines(report: &WeatherReport) -> Vec<Line<'static>> {
    let mut heading = vec![Span::styled(
        format!("{}, {}", report.city, report.country),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if report.is_demo() {
        heading.push(Span::styled(
            "  (demo data)",
            Style::default().fg(Color::Yellow),
        ));
    }

    let wind = match report.wind_direction {
        Some(deg) => format!("Wind: {} km/h, {}\u{b0}", report.wind_speed, deg),
        None => format!("Wind: {} km/h", report.wind_speed),
    };

    vec![
        Line::from(heading),
        Line::from(format!(
            "{} {}\u{b0}C",
            report.condition.icon(),
            report.temperature
        )),
        Line::from(report.description.clone()),
        Line::from(wind),
        Line::from(Span::styled(
            format!("Observed: {}", report.observed_at),
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn render_notes(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.focus == Focus::Notes {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(" Notes ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let notes = app.tracker.notes();
    let lines: Vec<Line> = if notes.is_empty() {
        vec![Line::from(Span::styled(
            "No notes. Press 'n' to add one.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        notes
            .iter()
            .enumerate()
            .flat_map(|(i, note)| {
                let selected = app.focus == Focus::Notes && i == app.note_cursor;
                let title_style = if selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let mut lines = vec![Line::from(vec![
                    Span::raw(if selected { "> " } else { "  " }),
                    Span::styled(note.title.clone(), title_style),
                    Span::styled(
                        format!("  {}", note.created_at.format("%Y-%m-%d")),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])];
                if !note.content.is_empty() {
                    lines.push(Line::from(format!("  {}", note.content)));
                }
                lines
            })
            .collect()
    };

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}
