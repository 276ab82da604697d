//! Help overlay: global keys and those of the active tab.

use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::component::{Component, Transition};
use crate::message::{HelpKey, Message};
use crate::theme::Theme;

pub struct HelpOverlay {
    global: Vec<HelpKey>,
    local: Vec<HelpKey>,
    scroll: u16,
}

impl HelpOverlay {
    pub fn new(global: &[HelpKey], local: Vec<HelpKey>) -> Self {
        Self {
            global: global.to_vec(),
            local,
            scroll: 0,
        }
    }

    fn line_count(&self) -> usize {
        self.global.len() + self.local.len() + if self.local.is_empty() { 1 } else { 3 }
    }
}

impl Component for HelpOverlay {
    fn update(&mut self, msg: &Message) -> Transition {
        let Message::Key(key) = msg else {
            return Transition::none();
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Transition::dismiss(),
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = (self.scroll + 1).min(self.line_count() as u16);
                Transition::none()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
                Transition::none()
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let section = |title: &'static str| {
            Line::from(Span::styled(
                title,
                theme.accent_text().add_modifier(Modifier::BOLD),
            ))
        };
        let row = |k: &HelpKey| {
            Line::from(vec![
                Span::styled(format!("  {:<12}", k.key), theme.text()),
                Span::styled(k.desc, theme.secondary_text()),
            ])
        };
        let mut lines = vec![section("Global")];
        lines.extend(self.global.iter().map(row));
        if !self.local.is_empty() {
            lines.push(Line::default());
            lines.push(section("This view"));
            lines.extend(self.local.iter().map(row));
        }
        frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), area);
    }

    fn title(&self) -> String {
        "Keys".to_string()
    }

    fn preferred_size(&self) -> (u16, u16) {
        (56, self.line_count() as u16 + 2)
    }
}
