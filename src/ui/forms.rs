//! Modal overlays for data entry
//!
//! Each overlay clears the area behind it and draws a bordered box centred
//! on the screen.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, DeleteTarget, NoteField, RouteField};
use crate::data::Transport;

use super::centered_rect;

fn overlay_block(title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn field_line(label: &str, value: String, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let value = if focused { format!("{}_", value) } else { value };
    Line::from(vec![
        Span::styled(format!(" {:<13}", label), label_style),
        Span::raw(value),
    ])
}

fn hint_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", text),
        Style::default().fg(Color::DarkGray),
    ))
}

pub fn render_route_form(frame: &mut Frame, app: &App) {
    let form = &app.route_form;
    let area = centered_rect(60, 14, frame.area());
    frame.render_widget(Clear, area);

    let title = if form.editing.is_some() {
        "Edit route"
    } else {
        "New route"
    };

    let mut lines = vec![Line::from("")];
    for field in RouteField::ALL {
        let focused = form.field == field;
        let line = match field {
            RouteField::Name => field_line(field.label(), form.draft.name.clone(), focused),
            RouteField::Destination => {
                field_line(field.label(), form.draft.destination.clone(), focused)
            }
            RouteField::StartDate => {
                field_line(field.label(), form.draft.start_date.clone(), focused)
            }
            RouteField::EndDate => field_line(field.label(), form.draft.end_date.clone(), focused),
            RouteField::Description => {
                field_line(field.label(), form.draft.description.clone(), focused)
            }
            RouteField::Transport => transport_line(form.draft.transport, focused),
            RouteField::Completed => {
                let mark = if form.draft.completed { "[x]" } else { "[ ]" };
                let label_style = if focused {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Line::from(vec![
                    Span::styled(format!(" {:<13}", field.label()), label_style),
                    Span::raw(mark),
                ])
            }
        };
        lines.push(line);
    }
    lines.push(Line::from(""));
    lines.push(hint_line("Dates as YYYY-MM-DD. Tab: next field"));
    lines.push(hint_line("\u{2190}/\u{2192}: transport  Space: completed"));
    lines.push(hint_line("Enter: save  Esc: cancel"));

    frame.render_widget(Paragraph::new(lines).block(overlay_block(title)), area);
}

/// All selectable transports with the current one highlighted
fn transport_line(current: Transport, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![Span::styled(
        format!(" {:<13}", RouteField::Transport.label()),
        label_style,
    )];
    for transport in Transport::SELECTABLE {
        if transport == current {
            spans.push(Span::styled(
                format!("[{}] ", transport),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(
                format!(" {}  ", transport),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    Line::from(spans)
}

pub fn render_note_form(frame: &mut Frame, app: &App) {
    let form = &app.note_form;
    let area = centered_rect(60, 8, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        field_line(
            "Title",
            form.draft.title.clone(),
            form.field == NoteField::Title,
        ),
        field_line(
            "Content",
            form.draft.content.clone(),
            form.field == NoteField::Content,
        ),
        Line::from(""),
        hint_line("Tab: switch field  Enter: save  Esc: cancel"),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block("New note")), area);
}

pub fn render_weather_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        field_line("City", app.weather_input.clone(), true),
        Line::from(""),
        hint_line("Enter: look up  Esc: cancel"),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block("Weather")), area);
}

pub fn render_confirm_delete(frame: &mut Frame, app: &App, target: &DeleteTarget) {
    let area = centered_rect(50, 5, frame.area());
    frame.render_widget(Clear, area);

    let question = match target {
        DeleteTarget::Route(id) => {
            let name = app
                .tracker
                .find_route(id)
                .map(|r| r.name.as_str())
                .unwrap_or("this route");
            format!(" Delete route \"{}\"?", name)
        }
        DeleteTarget::Note(_) => " Delete this note?".to_string(),
    };

    let lines = vec![
        Line::from(""),
        Line::from(question),
        hint_line("y: delete  n/Esc: keep"),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block("Confirm")), area);
}
