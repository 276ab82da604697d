//! Settings overlay: edits a copy of the config and hands it back on save.

use mediactl_proto::config::{Config, IconType, LibraryNameFormat};
use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::cycle;
use crate::command::Command;
use crate::component::{Component, Transition};
use crate::message::Message;
use crate::theme::{Theme, THEME_NAMES};
use crate::widgets::pane::fit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Theme,
    IconType,
    LibraryNameFormat,
    DefaultViewMode,
    CloseVideoOnQuit,
    AutoHomeLogin,
    NoCache,
}

const FIELDS: [Field; 7] = [
    Field::Theme,
    Field::IconType,
    Field::LibraryNameFormat,
    Field::DefaultViewMode,
    Field::CloseVideoOnQuit,
    Field::AutoHomeLogin,
    Field::NoCache,
];

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Theme => "Theme",
            Field::IconType => "Icons",
            Field::LibraryNameFormat => "Library names",
            Field::DefaultViewMode => "Default view",
            Field::CloseVideoOnQuit => "Close video on quit",
            Field::AutoHomeLogin => "Home user login",
            Field::NoCache => "Disable cache",
        }
    }
}

fn on_off(v: bool) -> &'static str {
    if v {
        "on"
    } else {
        "off"
    }
}

pub struct SettingsOverlay {
    config: Config,
    original_theme: String,
    selected: usize,
}

impl SettingsOverlay {
    pub fn new(config: Config) -> Self {
        Self {
            original_theme: config.theme.clone(),
            config,
            selected: 0,
        }
    }

    fn value(&self, field: Field) -> String {
        let c = &self.config;
        match field {
            Field::Theme => c.theme.clone(),
            Field::IconType => c.icon_type.label().to_string(),
            Field::LibraryNameFormat => c.library_name_format.label().to_string(),
            Field::DefaultViewMode => c.default_view_mode.label().to_string(),
            Field::CloseVideoOnQuit => on_off(c.close_video_on_quit).to_string(),
            Field::AutoHomeLogin => on_off(c.auto_home_login).to_string(),
            Field::NoCache => on_off(c.no_cache).to_string(),
        }
    }

    /// Change the selected field. Theme changes preview immediately.
    fn change(&mut self, forward: bool) -> Command {
        let c = &mut self.config;
        match FIELDS[self.selected] {
            Field::Theme => {
                let current = THEME_NAMES
                    .iter()
                    .copied()
                    .find(|n| *n == c.theme)
                    .unwrap_or(THEME_NAMES[0]);
                c.theme = cycle(THEME_NAMES, current, forward).to_string();
                return Command::message(Message::ThemeChanged(c.theme.clone()));
            }
            Field::IconType => c.icon_type = cycle(&IconType::ALL, c.icon_type, forward),
            Field::LibraryNameFormat => {
                c.library_name_format =
                    cycle(&LibraryNameFormat::ALL, c.library_name_format, forward)
            }
            Field::DefaultViewMode => c.default_view_mode = c.default_view_mode.toggled(),
            Field::CloseVideoOnQuit => c.close_video_on_quit = !c.close_video_on_quit,
            Field::AutoHomeLogin => c.auto_home_login = !c.auto_home_login,
            Field::NoCache => c.no_cache = !c.no_cache,
        }
        Command::none()
    }
}

impl Component for SettingsOverlay {
    fn update(&mut self, msg: &Message) -> Transition {
        let Message::Key(key) = msg else {
            return Transition::none();
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Transition::none()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(FIELDS.len() - 1);
                Transition::none()
            }
            KeyCode::Left | KeyCode::Char('h') => self.change(false).into(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => self.change(true).into(),
            KeyCode::Enter => Transition::Dismiss(Command::message(Message::SettingsSaved(
                Box::new(self.config.clone()),
            ))),
            KeyCode::Esc => {
                if self.config.theme != self.original_theme {
                    Transition::Dismiss(Command::message(Message::ThemeChanged(
                        self.original_theme.clone(),
                    )))
                } else {
                    Transition::dismiss()
                }
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut lines: Vec<Line> = FIELDS
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let style = if i == self.selected {
                    theme.selected()
                } else {
                    theme.text()
                };
                Line::from(vec![
                    Span::styled(fit(f.label(), 24), style),
                    Span::styled(format!("‹ {} ›", self.value(*f)), theme.accent_text()),
                ])
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "←/→ change · enter save · esc cancel",
            theme.muted_text(),
        )));
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn title(&self) -> String {
        "Settings".to_string()
    }

    fn preferred_size(&self) -> (u16, u16) {
        (52, FIELDS.len() as u16 + 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::testing::{ch, press};

    #[tokio::test]
    async fn theme_previews_and_cancel_restores() {
        let mut s = SettingsOverlay::new(Config::default());
        let Transition::Stay(cmd) = s.update(&press(KeyCode::Right)) else {
            panic!("expected stay");
        };
        assert!(matches!(
            cmd.collect().await.as_slice(),
            [Message::ThemeChanged(t)] if t == "nord"
        ));
        let Transition::Dismiss(cmd) = s.update(&press(KeyCode::Esc)) else {
            panic!("expected dismiss");
        };
        assert!(matches!(
            cmd.collect().await.as_slice(),
            [Message::ThemeChanged(t)] if t == "default"
        ));
    }

    #[tokio::test]
    async fn enter_saves_edited_copy() {
        let config = Config::default();
        let close = config.close_video_on_quit;
        let mut s = SettingsOverlay::new(config);
        for _ in 0..4 {
            let _ = s.update(&ch('j'));
        }
        let _ = s.update(&ch(' '));
        let Transition::Dismiss(cmd) = s.update(&press(KeyCode::Enter)) else {
            panic!("expected dismiss");
        };
        match cmd.collect().await.as_slice() {
            [Message::SettingsSaved(saved)] => assert_eq!(saved.close_video_on_quit, !close),
            other => panic!("unexpected {other:?}"),
        }
    }
}
