//! Search Status tab: what the local search index holds.

use mediactl_proto::search::SectionStatus;
use ratatui::{layout::Rect, Frame};

use crate::command::Command;
use crate::component::{Component, HelpProvider, Refreshable, Transition};
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::views::RemoteList;

pub struct SearchStatusView {
    ctx: AppContext,
    sections: RemoteList<SectionStatus>,
}

impl SearchStatusView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            sections: RemoteList::new(),
        }
    }

    fn reload(&mut self) {
        let status = self.ctx.index.status();
        self.sections.loaded(status);
    }
}

fn row(s: &SectionStatus) -> String {
    let when = s
        .updated_at
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "never".to_string());
    format!("{:<30} {:>7} items   {when}", s.title, s.items)
}

impl Component for SearchStatusView {
    fn init(&mut self) -> Command {
        self.reload();
        Command::none()
    }

    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::IndexUpdated => self.reload(),
            Message::RefreshIndex => self.sections.loading = true,
            Message::Key(key) => {
                self.sections.handle_key(key.code);
            }
            Message::Mouse(event) => {
                self.sections.handle_mouse(event);
            }
            _ => {}
        }
        Transition::none()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.sections
            .draw(frame, area, theme, "Index is empty; press r to build it", row);
    }

    fn as_refreshable(&mut self) -> Option<&mut dyn Refreshable> {
        Some(self)
    }

    fn as_help_provider(&self) -> Option<&dyn HelpProvider> {
        Some(self)
    }
}

impl Refreshable for SearchStatusView {
    fn refresh(&mut self) -> Command {
        Command::message(Message::RefreshIndex)
    }
}

impl HelpProvider for SearchStatusView {
    fn help_keys(&self) -> Vec<HelpKey> {
        vec![HelpKey::new("r", "rebuild index")]
    }
}
