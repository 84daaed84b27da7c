use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::tui::screen::Screen;

pub fn draw(
    frame: &mut Frame,
    screen: &Screen,
    trail: &str,
    status_message: Option<&str>,
    last_refresh: Option<chrono::DateTime<chrono::Local>>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Shortcut hints
    let mut legend = Vec::new();
    for (key, label) in screen.shortcuts() {
        legend.push(Span::styled(
            format!(" {}", key),
            Style::default().fg(Color::Cyan).bold(),
        ));
        legend.push(Span::styled(
            format!(" {} ", label),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(legend)), chunks[0]);

    // Rows
    let focus = screen.focus();
    let items: Vec<ListItem> = screen
        .items()
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let style = if focus == Some(idx) {
                Style::default().fg(Color::White).bg(Color::Indexed(236)).bold()
            } else {
                Style::default().fg(Color::Reset)
            };
            ListItem::new(Span::styled(item.text.as_str(), style))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .highlight_style(Style::default().bg(Color::Indexed(236)));
    let mut list_state = ListState::default();
    list_state.select(focus);
    frame.render_stateful_widget(list, chunks[1], &mut list_state);

    // Title with breadcrumb and refresh time
    let title_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(12)])
        .split(chunks[2]);
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", screen.title()),
            Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
        ),
        Span::styled(format!(" {}", trail), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(title), title_chunks[0]);

    let refresh_time = last_refresh
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{} ", refresh_time),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Right),
        title_chunks[1],
    );

    // Status bar
    if let Some(status) = status_message {
        let status_line = Line::from(vec![Span::styled(
            format!(" {}", status),
            Style::default().fg(Color::Yellow),
        )]);
        frame.render_widget(Paragraph::new(status_line), chunks[3]);
    }
}
