// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use rediscope_app::{Mode, NotificationKind, SessionView, Ttl, ValuePayload};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};

const HIGHLIGHT_SYMBOL: &str = "> ";
const INPUT_CURSOR: &str = "▏";

pub fn render(frame: &mut ratatui::Frame<'_>, view: &SessionView<'_>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let tabs = Tabs::new(tab_titles(view))
        .block(
            Block::default()
                .title(header_title(view))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(usize::from(view.active_database));
    frame.render_widget(tabs, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(layout[1]);
    render_key_list(frame, body[0], view);

    let value = Paragraph::new(
        view.value
            .as_ref()
            .map(|value| value_text(value.payload))
            .unwrap_or_default(),
    )
    .wrap(Wrap { trim: false })
    .block(Block::default().title(value_title(view)).borders(Borders::ALL));
    frame.render_widget(value, body[1]);

    let status = Paragraph::new(status_text(view))
        .style(status_style(view))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if view.mode == Mode::Help {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_key_list(frame: &mut ratatui::Frame<'_>, area: Rect, view: &SessionView<'_>) {
    let items = view
        .keys
        .iter()
        .map(|key| ListItem::new(*key))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(
            Block::default()
                .title(key_list_title(view))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(HIGHLIGHT_SYMBOL);
    let mut state = ListState::default().with_selected(view.highlight);
    frame.render_stateful_widget(list, area, &mut state);
}

pub fn tab_titles(view: &SessionView<'_>) -> Vec<String> {
    (0..view.database_count)
        .map(|index| {
            if view.switching_to == Some(index) {
                format!("db{index}…")
            } else {
                format!("db{index}")
            }
        })
        .collect()
}

fn header_title(view: &SessionView<'_>) -> String {
    if view.endpoint.is_empty() {
        "rediscope".to_owned()
    } else {
        format!("rediscope {}", view.endpoint)
    }
}

pub fn key_list_title(view: &SessionView<'_>) -> String {
    let mut title = format!("keys {}/{}", view.page_number, view.page_count);
    if view.can_advance {
        title.push('+');
    }
    if view.filter_committed && view.mode != Mode::Filtering {
        title.push_str(&format!(" [{}]", view.filter_text));
    }
    if view.listing_pending {
        title.push_str(" loading");
    }
    title
}

pub fn value_title(view: &SessionView<'_>) -> String {
    let Some(value) = view.value.as_ref() else {
        return "value".to_owned();
    };
    let kind = value.payload.key_type().as_str();
    match value.ttl {
        Ttl::Expires(seconds) => {
            format!("{} ({kind}, expires in {seconds} seconds)", value.key)
        }
        Ttl::Persistent => format!("{} ({kind})", value.key),
    }
}

/// Strings are shown as-is; structured values are pretty-printed JSON.
pub fn value_text(payload: &ValuePayload) -> String {
    match payload {
        ValuePayload::Text(text) => text.clone(),
        _ => serde_json::to_string_pretty(&payload.to_json())
            .unwrap_or_else(|_| payload.to_plain_text()),
    }
}

pub fn status_text(view: &SessionView<'_>) -> String {
    match view.mode {
        Mode::Filtering => return format!("/{}{INPUT_CURSOR}", view.filter_text),
        Mode::EditingValue => {
            let key = view.value.as_ref().map_or("", |value| value.key);
            let staged = view.staged_edit.unwrap_or_default();
            return format!("edit {key}: {staged}{INPUT_CURSOR}  (enter save | esc cancel)");
        }
        Mode::Listing | Mode::Help => {}
    }

    if let Some(notification) = view.notification {
        return format!("{}: {}", notification.kind.as_str(), notification.text);
    }
    format!(
        "{} | j/k move | n/p page | / filter | enter edit | tab db | y copy | x/X delete | r refresh | ? help | q quit",
        view.mode.as_str().to_ascii_uppercase()
    )
}

fn status_style(view: &SessionView<'_>) -> Style {
    let color = match view.notification.map(|notification| notification.kind) {
        _ if matches!(view.mode, Mode::Filtering | Mode::EditingValue) => Color::White,
        Some(NotificationKind::Error) => Color::Red,
        Some(NotificationKind::Warning) => Color::Yellow,
        Some(NotificationKind::Info) => Color::Green,
        None => Color::Gray,
    };
    Style::default().fg(color)
}

pub fn help_overlay_text() -> &'static str {
    "navigation: j/k or up/down move | g/G first/last key\n\
pages: n/l/right next | p/h/left previous\n\
filter: / edit | enter apply | esc cancel\n\
value: enter edit (strings) | y copy | r refresh\n\
keys: x delete highlighted | X delete every visible key\n\
databases: tab next | shift+tab previous\n\
quit: q, esc or ctrl+c outside filter and edit\n\
any key closes this help"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
