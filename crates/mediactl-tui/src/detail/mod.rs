//! Drill-down detail frames inside a library tab.

mod item;
mod show;

pub use item::ItemDetail;
pub use show::ShowDetail;

use ratatui::{layout::Rect, Frame};

use crate::command::Command;
use crate::component::Component;
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::view_stack::ViewStack;

pub const DETAIL_KEYS: &[HelpKey] = &[
    HelpKey::new("esc", "back"),
    HelpKey::new("B", "back to library"),
    HelpKey::new("enter", "open / play"),
    HelpKey::new("r", "refresh"),
];

/// The frame that fits an item of `kind`.
pub fn frame_for(ctx: &AppContext, rating_key: &str, kind: &str) -> Box<dyn Component> {
    match kind {
        "show" => Box::new(ShowDetail::new(ctx.clone(), rating_key)),
        _ => Box::new(ItemDetail::new(ctx.clone(), rating_key)),
    }
}

/// Fetch an item and, for containers, its children.
pub fn fetch_detail(ctx: &AppContext, rating_key: &str, with_children: bool) -> Command {
    let client = ctx.client.clone();
    let rating_key = rating_key.to_string();
    Command::attempt(async move {
        let item = client.metadata(&rating_key).await?;
        let children = if with_children {
            client.children(&rating_key).await?
        } else {
            Vec::new()
        };
        Ok(Message::DetailLoaded {
            rating_key,
            item: Box::new(item),
            children,
        })
    })
}

/// Stack of detail frames over a library listing.
#[derive(Default)]
pub struct DetailManager {
    stack: ViewStack,
}

impl DetailManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Box<dyn Component>) -> Command {
        self.stack.push(frame)
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn top(&self) -> Option<&dyn Component> {
        self.stack.top()
    }

    pub fn top_mut(&mut self) -> Option<&mut Box<dyn Component>> {
        self.stack.top_mut()
    }

    /// Route `msg` to the top frame. Back pops only a frame at its root;
    /// BackToLibrary always empties the stack.
    pub fn update(&mut self, msg: &Message) -> (Command, bool) {
        if let Message::Resize { width, height } = msg {
            self.stack.set_size(*width, *height);
        }
        let Some(top) = self.stack.top() else {
            return (Command::none(), false);
        };
        match msg {
            Message::Back => {
                let at_root = top.as_root_checker().map_or(true, |r| r.is_at_root());
                if at_root {
                    self.stack.pop();
                    (Command::none(), true)
                } else {
                    let (cmd, _) = self.stack.forward(msg);
                    (cmd, true)
                }
            }
            Message::BackToLibrary => {
                self.stack.clear();
                (Command::none(), true)
            }
            Message::MediaPage { .. }
            | Message::MediaPageFailed { .. }
            | Message::JumpToDetail { .. } => (Command::none(), false),
            Message::Key(_) | Message::Mouse(_) => {
                let (cmd, _) = self.stack.forward(msg);
                (cmd, true)
            }
            _ => {
                let (cmd, _) = self.stack.forward(msg);
                (cmd, false)
            }
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if let Some(top) = self.stack.top_mut() {
            top.draw(frame, area, theme);
        }
    }
}

/// `95 min` style runtime from milliseconds.
pub fn fmt_runtime(ms: u64) -> String {
    let minutes = ms / 60_000;
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}
