//! Navigator: modal overlays stacked over the tabs.

use ratatui::{
    layout::Rect,
    widgets::{Block, Clear},
    Frame,
};

use crate::command::Command;
use crate::component::Component;
use crate::message::Message;
use crate::theme::Theme;
use crate::view_stack::ViewStack;
use crate::widgets::pane::pane;

#[derive(Default)]
pub struct Navigator {
    stack: ViewStack,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, overlay: Box<dyn Component>) -> Command {
        self.stack.push(overlay)
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Route `msg` to the top overlay. `captured` tells the caller not to
    /// handle the message itself.
    pub fn update(&mut self, msg: &Message) -> (Command, bool) {
        if let Message::Resize { width, height } = msg {
            self.stack.set_size(*width, *height);
        }
        if self.stack.is_empty() {
            return (Command::none(), false);
        }
        let (cmd, dismissed) = self.stack.forward(msg);
        let captured = match msg {
            Message::Resize { .. } => false,
            Message::Key(_) | Message::Mouse(_) => true,
            _ => dismissed,
        };
        (cmd, captured)
    }

    /// Draw every overlay centered over `area`, bottom of the stack first.
    pub fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        for overlay in self.stack.frames_mut() {
            let rect = centered(area, overlay.preferred_size());
            // Whole rows go, so nothing of the base is left beside the box.
            frame.render_widget(
                Clear,
                Rect {
                    x: area.x,
                    y: rect.y,
                    width: area.width,
                    height: rect.height,
                },
            );
            frame.render_widget(Block::default().style(theme.text()), rect);
            let title = overlay.title();
            let block = pane(&title, true, theme);
            let inner = block.inner(rect);
            frame.render_widget(block, rect);
            overlay.draw(frame, inner, theme);
        }
    }
}

/// A rect of at most `size`, centered in `area`.
pub fn centered(area: Rect, (width, height): (u16, u16)) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
