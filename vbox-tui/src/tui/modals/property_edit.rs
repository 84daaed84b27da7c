//! Modal for editing a VM property

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::extract::EditableProperty;

/// What the user decided in the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Confirm(String),
    Cancel,
}

#[derive(Debug, Clone)]
pub struct PropertyEditModal {
    pub vm: String,
    pub label: String,
    pub unit: Option<&'static str>,
    pub current: String,
    pub input: String,
}

impl PropertyEditModal {
    pub fn new(vm: String, property: &EditableProperty, current_value: &str) -> Self {
        Self {
            vm,
            label: property.label.to_string(),
            unit: property.unit,
            current: current_value.to_string(),
            input: property.strip_unit(current_value).to_string(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Option<EditOutcome> {
        match code {
            KeyCode::Esc => Some(EditOutcome::Cancel),
            KeyCode::Enter => Some(EditOutcome::Confirm(self.input.clone())),
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.input.push(c);
                None
            }
            _ => None,
        }
    }
}

pub fn draw(frame: &mut Frame, modal: &PropertyEditModal) {
    let area = centered_rect(50, 8, frame.area());
    frame.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", modal.vm),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled("|", Style::default().fg(Color::DarkGray)),
        Span::styled(" Esc", Style::default().fg(Color::Yellow)),
        Span::styled(": cancel ", Style::default().fg(Color::DarkGray)),
    ]);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block.clone(), area);

    let inner = block.inner(area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Current value
            Constraint::Length(2), // New value
            Constraint::Length(1), // Hint
        ])
        .split(inner);

    let label_style = Style::default().fg(Color::Cyan);

    let current_line = Line::from(vec![
        Span::styled(format!(" {}: ", modal.label), label_style),
        Span::styled(&modal.current, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(current_line), chunks[0]);

    let input_line = Line::from(vec![
        Span::styled(" New value: ", label_style),
        Span::styled(&modal.input, Style::default().fg(Color::Yellow)),
        Span::styled("_", Style::default().fg(Color::Yellow)),
        Span::styled(
            modal.unit.map(|u| format!(" {}", u)).unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[1]);

    let hint = Line::from(vec![
        Span::styled("\u{21b5}", Style::default().fg(Color::White).bold()),
        Span::styled(" Apply", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(hint).alignment(Alignment::Center), chunks[2]);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height.min(100)) / 2),
            Constraint::Length(height),
            Constraint::Percentage((100 - height.min(100)) / 2),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::editable_property;

    fn memory_modal() -> PropertyEditModal {
        let property = editable_property("Memory size").unwrap();
        PropertyEditModal::new("web".to_string(), property, "2048MB")
    }

    #[test]
    fn prefilled_without_unit() {
        let modal = memory_modal();
        assert_eq!(modal.input, "2048");
        assert_eq!(modal.unit, Some("MB"));
    }

    #[test]
    fn typing_then_confirm() {
        let mut modal = memory_modal();
        for _ in 0..4 {
            assert_eq!(modal.handle_key(KeyCode::Backspace), None);
        }
        for c in "4096".chars() {
            modal.handle_key(KeyCode::Char(c));
        }
        modal.handle_key(KeyCode::Char('x'));
        assert_eq!(
            modal.handle_key(KeyCode::Enter),
            Some(EditOutcome::Confirm("4096".to_string()))
        );
    }

    #[test]
    fn escape_cancels() {
        let mut modal = memory_modal();
        assert_eq!(modal.handle_key(KeyCode::Esc), Some(EditOutcome::Cancel));
    }
}
