//! Single-line text input over tui-input.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Changed(String),
    Confirmed(String),
    Cancelled,
    None,
}

pub struct FilterInput {
    input: Input,
    placeholder: String,
    prefix: &'static str,
    masked: bool,
}

impl FilterInput {
    pub fn new(prefix: &'static str, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            placeholder: placeholder.into(),
            prefix,
            masked: false,
        }
    }

    /// Render every character as `*`.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Esc cancels, Enter confirms, everything else edits.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc => InputAction::Cancelled,
            KeyCode::Enter => InputAction::Confirmed(self.input.value().to_string()),
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() == before {
                    InputAction::None
                } else {
                    InputAction::Changed(self.input.value().to_string())
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let prefix_w = self.prefix.chars().count();
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prefix_w as u16 + 1) as usize);
        let value = self.input.value();
        let span = if value.is_empty() {
            Span::styled(
                format!("{}{}", self.prefix, self.placeholder),
                theme.muted_text(),
            )
        } else {
            let shown: String = if self.masked {
                "*".repeat(value.chars().count().saturating_sub(scroll))
            } else {
                value.chars().skip(scroll).collect()
            };
            Span::styled(
                format!("{}{}", self.prefix, shown),
                Style::default().fg(theme.filter_fg),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(span)).style(Style::default().bg(theme.filter_bg)),
            area,
        );

        if area.width > 0 {
            let cursor_x =
                area.x + prefix_w as u16 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_reports_changes() {
        let mut input = FilterInput::new("/ ", "search");
        assert_eq!(
            input.handle_key(key(KeyCode::Char('a'))),
            InputAction::Changed("a".into())
        );
        assert_eq!(
            input.handle_key(key(KeyCode::Char('b'))),
            InputAction::Changed("ab".into())
        );
        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            InputAction::Confirmed("ab".into())
        );
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputAction::Cancelled);
    }

    #[test]
    fn backspace_on_empty_is_no_change() {
        let mut input = FilterInput::new("/ ", "search");
        assert_eq!(input.handle_key(key(KeyCode::Backspace)), InputAction::None);
    }
}
