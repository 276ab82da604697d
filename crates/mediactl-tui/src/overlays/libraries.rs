//! Library configuration: visibility and tab order.

use mediactl_proto::config::Config;
use mediactl_proto::protocol::Library;
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
use crate::tab_manager::ordered_libraries;
use crate::theme::Theme;
use crate::widgets::scrollable_list::ScrollableList;

struct Row {
    library: Library,
    hidden: bool,
}

pub struct LibrariesOverlay {
    config: Config,
    rows: ScrollableList<Row>,
}

impl LibrariesOverlay {
    pub fn new(config: Config, libraries: &[Library]) -> Self {
        let mut rows = ScrollableList::new();
        rows.set_items(
            ordered_libraries(libraries, &config)
                .into_iter()
                .map(|library| Row {
                    hidden: config.library_options(&library.key).hidden,
                    library,
                })
                .collect(),
        );
        Self { config, rows }
    }

    fn move_selected(&mut self, down: bool) {
        let i = self.rows.selected;
        let j = if down { i + 1 } else { i.wrapping_sub(1) };
        if j < self.rows.len() {
            self.rows.items.swap(i, j);
            self.rows.select(j);
        }
    }

    fn saved(&self) -> Config {
        let mut config = self.config.clone();
        for row in &self.rows.items {
            config.set_library_hidden(&row.library.key, row.hidden);
        }
        if let Some(server) = config.active_server_mut() {
            server.libraries.order = self.rows.items.iter().map(|r| r.library.key.clone()).collect();
        }
        config
    }
}

impl Component for LibrariesOverlay {
    fn update(&mut self, msg: &Message) -> Transition {
        let Message::Key(key) = msg else {
            return Transition::none();
        };
        match key.code {
            KeyCode::Char('K') => self.move_selected(false),
            KeyCode::Char('J') => self.move_selected(true),
            KeyCode::Char(' ') => {
                if let Some(row) = self.rows.items.get_mut(self.rows.selected) {
                    row.hidden = !row.hidden;
                }
            }
            KeyCode::Enter => {
                return Transition::Dismiss(Command::message(Message::SettingsSaved(Box::new(
                    self.saved(),
                ))))
            }
            KeyCode::Esc => return Transition::dismiss(),
            code => {
                self.rows.handle_nav_key(code, 10);
            }
        }
        Transition::none()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let height = area.height.saturating_sub(2) as usize;
        self.rows.ensure_visible(height);
        let selected = self.rows.selected;
        let mut lines: Vec<Line> = self
            .rows
            .visible_items(height)
            .into_iter()
            .map(|(i, row)| {
                let mark = if row.hidden { "[ ]" } else { "[x]" };
                let style = if i == selected {
                    theme.selected()
                } else if row.hidden {
                    theme.muted_text()
                } else {
                    theme.text()
                };
                Line::from(Span::styled(
                    format!("{mark} {}  ({})", row.library.title, row.library.kind),
                    style,
                ))
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "space show/hide · J/K reorder · enter save",
            theme.muted_text(),
        )));
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn title(&self) -> String {
        "Libraries".to_string()
    }

    fn preferred_size(&self) -> (u16, u16) {
        (52, self.rows.len() as u16 + 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::testing::{ch, press};
    use mediactl_proto::config::ServerConfig;

    fn setup() -> (Config, Vec<Library>) {
        let mut config = Config::default();
        config.servers.insert(
            "srv".into(),
            ServerConfig {
                url: "http://srv".into(),
                ..Default::default()
            },
        );
        let libs = ["1", "2", "3"]
            .iter()
            .map(|k| Library {
                key: k.to_string(),
                title: format!("Lib {k}"),
                ..Default::default()
            })
            .collect();
        (config, libs)
    }

    #[tokio::test]
    async fn hide_and_reorder_are_saved() {
        let (config, libs) = setup();
        let mut o = LibrariesOverlay::new(config, &libs);
        let _ = o.update(&ch(' '));
        let _ = o.update(&ch('J'));
        let Transition::Dismiss(cmd) = o.update(&press(KeyCode::Enter)) else {
            panic!("expected dismiss");
        };
        let msgs = cmd.collect().await;
        let [Message::SettingsSaved(saved)] = msgs.as_slice() else {
            panic!("unexpected {msgs:?}");
        };
        assert!(saved.library_options("1").hidden);
        assert!(!saved.library_options("2").hidden);
        let order = &saved.active_server().unwrap().1.libraries.order;
        assert_eq!(order, &["2", "1", "3"]);
    }
}
