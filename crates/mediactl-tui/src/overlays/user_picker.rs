//! Home user picker, with PIN entry for protected users.

use mediactl_proto::protocol::HomeUser;
use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::command::Command;
use crate::component::{Component, Transition};
use crate::message::Message;
use crate::theme::Theme;
use crate::widgets::filter_input::{FilterInput, InputAction};
use crate::widgets::scrollable_list::ScrollableList;

enum Stage {
    Choose,
    Pin(FilterInput),
    /// Waiting for the switch to finish.
    Switching,
}

pub struct UserPicker {
    users: ScrollableList<HomeUser>,
    stage: Stage,
    error: Option<String>,
}

impl UserPicker {
    pub fn new(users: Vec<HomeUser>) -> Self {
        let mut list = ScrollableList::new();
        list.set_items(users);
        Self {
            users: list,
            stage: Stage::Choose,
            error: None,
        }
    }

    fn switch(&mut self, pin: Option<String>) -> Transition {
        let Some(user) = self.users.selected_item().cloned() else {
            return Transition::none();
        };
        self.stage = Stage::Switching;
        self.error = None;
        Command::message(Message::SwitchUser { user, pin }).into()
    }
}

impl Component for UserPicker {
    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::UserSwitched { .. } => return Transition::dismiss(),
            Message::InvalidPin => {
                self.error = Some("Wrong PIN".to_string());
                self.stage = Stage::Pin(FilterInput::new("PIN ", "").masked());
                return Transition::none();
            }
            Message::Error(_) if matches!(self.stage, Stage::Switching) => {
                self.stage = Stage::Choose;
                return Transition::none();
            }
            _ => {}
        }
        let Message::Key(key) = msg else {
            return Transition::none();
        };
        match &mut self.stage {
            Stage::Switching => match key.code {
                KeyCode::Esc => Transition::dismiss(),
                _ => Transition::none(),
            },
            Stage::Pin(input) => match input.handle_key(*key) {
                InputAction::Confirmed(pin) if !pin.is_empty() => self.switch(Some(pin)),
                InputAction::Cancelled => {
                    self.stage = Stage::Choose;
                    Transition::none()
                }
                _ => Transition::none(),
            },
            Stage::Choose => {
                if self.users.handle_nav_key(key.code, 10) {
                    return Transition::none();
                }
                match key.code {
                    KeyCode::Esc => Transition::dismiss(),
                    KeyCode::Enter => match self.users.selected_item().map(|u| u.protected) {
                        Some(true) => {
                            self.stage = Stage::Pin(FilterInput::new("PIN ", "").masked());
                            Transition::none()
                        }
                        Some(false) => self.switch(None),
                        None => Transition::none(),
                    },
                    _ => Transition::none(),
                }
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [list, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(area);
        let selected = self.users.selected;
        let lines: Vec<Line> = self
            .users
            .items
            .iter()
            .enumerate()
            .map(|(i, u)| {
                let mut tags = Vec::new();
                if u.admin {
                    tags.push("admin");
                }
                if u.restricted {
                    tags.push("managed");
                }
                if u.protected {
                    tags.push("🔒");
                }
                let style = if i == selected {
                    theme.selected()
                } else {
                    theme.text()
                };
                Line::from(vec![
                    Span::styled(format!("{:<24}", u.title), style),
                    Span::styled(tags.join(" "), theme.muted_text()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), list);

        let line_area = Rect {
            y: status.y + 1,
            height: 1,
            ..status
        };
        match &self.stage {
            Stage::Pin(input) => input.draw(frame, line_area, theme),
            Stage::Switching => frame.render_widget(
                Paragraph::new(Span::styled("Switching…", theme.muted_text())),
                line_area,
            ),
            Stage::Choose => {
                if let Some(err) = &self.error {
                    frame.render_widget(
                        Paragraph::new(Span::styled(err.clone(), Style::default().fg(theme.error))),
                        line_area,
                    );
                }
            }
        }
    }

    fn title(&self) -> String {
        "Switch user".to_string()
    }

    fn preferred_size(&self) -> (u16, u16) {
        (44, self.users.len() as u16 + 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::testing::{ch, press};

    fn users() -> Vec<HomeUser> {
        vec![
            HomeUser {
                uuid: "a".into(),
                title: "Alex".into(),
                ..Default::default()
            },
            HomeUser {
                uuid: "k".into(),
                title: "Kid".into(),
                protected: true,
                ..Default::default()
            },
        ]
    }

    fn switch_of(t: Transition) -> impl std::future::Future<Output = Vec<Message>> {
        let Transition::Stay(cmd) = t else {
            panic!("expected stay");
        };
        cmd.collect()
    }

    #[tokio::test]
    async fn unprotected_user_switches_directly() {
        let mut p = UserPicker::new(users());
        let msgs = switch_of(p.update(&press(KeyCode::Enter))).await;
        assert!(matches!(
            msgs.as_slice(),
            [Message::SwitchUser { user, pin: None }] if user.uuid == "a"
        ));
        assert!(matches!(
            p.update(&Message::UserSwitched {
                auth_token: "t".into(),
                access_token: "t".into()
            }),
            Transition::Dismiss(_)
        ));
    }

    #[tokio::test]
    async fn protected_user_asks_for_pin_and_retries() {
        let mut p = UserPicker::new(users());
        let _ = p.update(&ch('j'));
        let _ = p.update(&press(KeyCode::Enter));
        for c in "1234".chars() {
            let _ = p.update(&ch(c));
        }
        let msgs = switch_of(p.update(&press(KeyCode::Enter))).await;
        assert!(matches!(
            msgs.as_slice(),
            [Message::SwitchUser { pin: Some(pin), .. }] if pin == "1234"
        ));

        let _ = p.update(&Message::InvalidPin);
        assert!(matches!(p.stage, Stage::Pin(_)));
        assert_eq!(p.error.as_deref(), Some("Wrong PIN"));
    }
}
