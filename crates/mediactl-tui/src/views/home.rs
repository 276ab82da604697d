//! Home tab: what to continue and what is new.

use mediactl_proto::protocol::Metadata;
use ratatui::crossterm::event::KeyCode;
use ratatui::{layout::Rect, Frame};

use crate::command::Command;
use crate::component::{Component, HelpProvider, PlayableProvider, Refreshable, Transition};
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::views::RemoteList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shelf {
    OnDeck,
    RecentlyAdded,
}

impl Shelf {
    fn label(self) -> &'static str {
        match self {
            Shelf::OnDeck => "Continue",
            Shelf::RecentlyAdded => "New     ",
        }
    }
}

pub struct HomeView {
    ctx: AppContext,
    rows: RemoteList<(Shelf, Metadata)>,
}

impl HomeView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            rows: RemoteList::new(),
        }
    }

    fn fetch(&mut self) -> Command {
        self.rows.loading = true;
        let client = self.ctx.client.clone();
        Command::attempt(async move {
            let (on_deck, recently_added) =
                tokio::try_join!(client.on_deck(), client.recently_added())?;
            Ok(Message::HomeLoaded {
                on_deck,
                recently_added,
            })
        })
    }
}

/// Open `item` in its library tab.
pub fn select(item: &Metadata) -> Command {
    Command::message(Message::SelectMedia {
        rating_key: item.rating_key.clone(),
        kind: item.kind.clone(),
        section_id: item.section_id(),
    })
}

impl Component for HomeView {
    fn init(&mut self) -> Command {
        if self.rows.loading || !self.rows.list.is_empty() {
            return Command::none();
        }
        self.fetch()
    }

    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::HomeLoaded {
                on_deck,
                recently_added,
            } => {
                let rows = on_deck
                    .iter()
                    .map(|m| (Shelf::OnDeck, m.clone()))
                    .chain(recently_added.iter().map(|m| (Shelf::RecentlyAdded, m.clone())))
                    .collect();
                self.rows.loaded(rows);
                Transition::none()
            }
            Message::Key(key) => {
                if self.rows.handle_key(key.code) {
                    return Transition::none();
                }
                match (key.code, self.rows.selected()) {
                    (KeyCode::Enter, Some((_, item))) => select(item).into(),
                    _ => Transition::none(),
                }
            }
            Message::Mouse(event) => {
                self.rows.handle_mouse(event);
                Transition::none()
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.rows
            .draw(frame, area, theme, "Nothing on deck", |(shelf, item)| {
                format!("{}  {}", shelf.label(), item.display_title())
            });
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

impl Refreshable for HomeView {
    fn refresh(&mut self) -> Command {
        self.fetch()
    }
}

impl HelpProvider for HomeView {
    fn help_keys(&self) -> Vec<HelpKey> {
        vec![HelpKey::new("enter", "open in library")]
    }
}

impl PlayableProvider for HomeView {
    fn selected_metadata(&self) -> Option<Metadata> {
        self.rows.selected().map(|(_, m)| m.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::context;
    use ratatui::crossterm::event::{KeyEvent, KeyModifiers};
    use serde_json::json;

    #[tokio::test]
    async fn enter_selects_into_library() {
        let mut home = HomeView::new(context());
        let _ = home.init();
        let _ = home.update(&Message::HomeLoaded {
            on_deck: vec![Metadata {
                rating_key: "42".into(),
                kind: "episode".into(),
                library_section_id: Some(json!(2)),
                ..Default::default()
            }],
            recently_added: vec![],
        });
        let Transition::Stay(cmd) =
            home.update(&Message::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
        else {
            panic!("expected stay");
        };
        let msgs = cmd.collect().await;
        assert!(matches!(
            msgs.as_slice(),
            [Message::SelectMedia { rating_key, section_id: Some(s), .. }]
                if rating_key == "42" && s == "2"
        ));
    }
}
