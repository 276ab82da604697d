//! History tab: recently watched items.

use mediactl_proto::protocol::Metadata;
use ratatui::crossterm::event::KeyCode;
use ratatui::{layout::Rect, Frame};

use crate::command::Command;
use crate::component::{Component, HelpProvider, PlayableProvider, Refreshable, Transition};
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::views::{fmt_timestamp, home::select, RemoteList};

const HISTORY_LIMIT: usize = 200;

pub struct HistoryView {
    ctx: AppContext,
    entries: RemoteList<Metadata>,
}

impl HistoryView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            entries: RemoteList::new(),
        }
    }

    fn fetch(&mut self) -> Command {
        self.entries.loading = true;
        let client = self.ctx.client.clone();
        Command::attempt(async move {
            Ok(Message::HistoryLoaded(client.history(HISTORY_LIMIT).await?))
        })
    }
}

fn row(item: &Metadata) -> String {
    let when = item.viewed_at.map(fmt_timestamp).unwrap_or_default();
    format!("{when:<16}  {}", item.display_title())
}

impl Component for HistoryView {
    fn init(&mut self) -> Command {
        if self.entries.loading {
            return Command::none();
        }
        self.fetch()
    }

    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::HistoryLoaded(entries) => {
                self.entries.loaded(entries.clone());
                Transition::none()
            }
            Message::Key(key) => {
                if self.entries.handle_key(key.code) {
                    return Transition::none();
                }
                match (key.code, self.entries.selected()) {
                    (KeyCode::Enter, Some(item)) => select(item).into(),
                    _ => Transition::none(),
                }
            }
            Message::Mouse(event) => {
                self.entries.handle_mouse(event);
                Transition::none()
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.entries.draw(frame, area, theme, "No history", row);
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

impl Refreshable for HistoryView {
    fn refresh(&mut self) -> Command {
        self.fetch()
    }
}

impl HelpProvider for HistoryView {
    fn help_keys(&self) -> Vec<HelpKey> {
        vec![
            HelpKey::new("enter", "open in library"),
            HelpKey::new("r", "refresh"),
        ]
    }
}

impl PlayableProvider for HistoryView {
    fn selected_metadata(&self) -> Option<Metadata> {
        self.entries.selected().cloned()
    }
}
