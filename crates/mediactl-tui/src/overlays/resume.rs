//! Resume or start over.

use mediactl_proto::protocol::Metadata;
use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::command::Command;
use crate::component::{Component, Transition};
use crate::message::Message;
use crate::theme::Theme;
use crate::widgets::player_bar::fmt_time;

pub struct ResumeOverlay {
    item: Metadata,
    compact: bool,
    /// 0 resumes, 1 starts over.
    choice: usize,
}

impl ResumeOverlay {
    pub fn new(item: Metadata, compact: bool) -> Self {
        Self {
            item,
            compact,
            choice: 0,
        }
    }

    fn offset_ms(&self) -> u64 {
        if self.choice == 0 {
            self.item.view_offset.unwrap_or(0)
        } else {
            0
        }
    }
}

impl Component for ResumeOverlay {
    fn update(&mut self, msg: &Message) -> Transition {
        let Message::Key(key) = msg else {
            return Transition::none();
        };
        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('k') | KeyCode::Tab => {
                self.choice = 1 - self.choice;
                Transition::none()
            }
            KeyCode::Enter => Transition::Dismiss(Command::message(Message::PlayMedia {
                item: Box::new(self.item.clone()),
                compact: self.compact,
                offset_ms: self.offset_ms(),
                no_report: false,
            })),
            KeyCode::Esc => Transition::dismiss(),
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let at = fmt_time(self.item.view_offset.unwrap_or(0) as f64 / 1000.0);
        let options = [format!("Resume from {at}"), "Start from the beginning".to_string()];
        let mut lines = vec![
            Line::from(Span::styled(self.item.display_title(), theme.accent_text())),
            Line::default(),
        ];
        for (i, label) in options.into_iter().enumerate() {
            let (marker, style) = if i == self.choice {
                ("› ", theme.selected())
            } else {
                ("  ", theme.text())
            };
            lines.push(Line::from(Span::styled(format!("{marker}{label}"), style)));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn title(&self) -> String {
        "Play".to_string()
    }

    fn preferred_size(&self) -> (u16, u16) {
        (50, 6)
    }
}
