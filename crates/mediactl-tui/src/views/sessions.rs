//! Sessions tab: who is playing what right now.

use mediactl_proto::protocol::Metadata;
use ratatui::crossterm::event::KeyCode;
use ratatui::{layout::Rect, Frame};

use crate::command::Command;
use crate::component::{Component, HelpProvider, PlayableProvider, Refreshable, Transition};
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::views::{home::select, RemoteList};

pub struct SessionsView {
    ctx: AppContext,
    sessions: RemoteList<Metadata>,
}

impl SessionsView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            sessions: RemoteList::new(),
        }
    }

    fn fetch(&mut self) -> Command {
        self.sessions.loading = true;
        let client = self.ctx.client.clone();
        Command::attempt(async move { Ok(Message::SessionsLoaded(client.sessions().await?)) })
    }
}

fn row(s: &Metadata) -> String {
    let user = s.user.as_ref().map(|u| u.title.as_str()).unwrap_or("?");
    let (device, state) = s
        .player
        .as_ref()
        .map(|p| (p.title.as_str(), p.state.as_str()))
        .unwrap_or(("?", ""));
    let progress = match (s.view_offset, s.duration) {
        (Some(o), Some(d)) if d > 0 => format!("{:>3}%", o * 100 / d),
        _ => String::new(),
    };
    format!(
        "{user:<14} {device:<18} {state:<8} {progress}  {}",
        s.display_title()
    )
}

impl Component for SessionsView {
    fn init(&mut self) -> Command {
        if self.sessions.loading {
            return Command::none();
        }
        self.fetch()
    }

    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::SessionsLoaded(sessions) => {
                self.sessions.loaded(sessions.clone());
                Transition::none()
            }
            Message::Key(key) => {
                if self.sessions.handle_key(key.code) {
                    return Transition::none();
                }
                match (key.code, self.sessions.selected()) {
                    (KeyCode::Enter, Some(item)) => select(item).into(),
                    _ => Transition::none(),
                }
            }
            Message::Mouse(event) => {
                self.sessions.handle_mouse(event);
                Transition::none()
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.sessions
            .draw(frame, area, theme, "Nobody is playing anything", row);
    }

    fn as_refreshable(&mut self) -> Option<&mut dyn Refreshable> {
        Some(self)
    }

    fn as_help_provider(&self) -> Option<&dyn HelpProvider> {
        Some(self)
    }

    fn as_playable(&self) -> Option<&dyn PlayableProvider> {
        Some(self)
    }
}

impl Refreshable for SessionsView {
    fn refresh(&mut self) -> Command {
        self.fetch()
    }
}

impl HelpProvider for SessionsView {
    fn help_keys(&self) -> Vec<HelpKey> {
        vec![
            HelpKey::new("enter", "open in library"),
            HelpKey::new("r", "refresh"),
        ]
    }
}

impl PlayableProvider for SessionsView {
    fn selected_metadata(&self) -> Option<Metadata> {
        self.sessions.selected().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediactl_proto::protocol::{SessionPlayer, SessionUser};

    #[test]
    fn row_shows_user_device_and_progress() {
        let s = Metadata {
            title: "Heat".into(),
            year: Some(1995),
            view_offset: Some(30_000),
            duration: Some(120_000),
            user: Some(SessionUser {
                title: "sam".into(),
            }),
            player: Some(SessionPlayer {
                title: "Living Room".into(),
                state: "playing".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let r = row(&s);
        assert!(r.starts_with("sam"));
        assert!(r.contains("Living Room"));
        assert!(r.contains(" 25%"));
        assert!(r.ends_with("Heat (1995)"));
    }
}
