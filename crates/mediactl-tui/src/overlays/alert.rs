//! Blocking alert: stays until acknowledged.

use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::component::{Component, Transition};
use crate::message::Message;
use crate::theme::Theme;

pub struct AlertOverlay {
    message: String,
}

impl AlertOverlay {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Component for AlertOverlay {
    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::Key(key) if matches!(key.code, KeyCode::Enter | KeyCode::Esc) => {
                Transition::dismiss()
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let lines = vec![
            Line::from(Span::styled(
                self.message.clone(),
                Style::default().fg(theme.error),
            )),
            Line::default(),
            Line::from(Span::styled("enter to dismiss", theme.muted_text())),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }

    fn title(&self) -> String {
        "Error".to_string()
    }

    fn preferred_size(&self) -> (u16, u16) {
        let lines = (self.message.chars().count() / 56 + 1) as u16;
        (60, lines + 5)
    }
}
