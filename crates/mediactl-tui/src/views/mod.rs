//! Root views of the tabs.

pub mod history;
pub mod home;
pub mod media;
pub mod search_status;
pub mod sessions;
pub mod tasks;

use ratatui::crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::Theme;
use crate::widgets::pane::fit;
use crate::widgets::scrollable_list::ScrollableList;

/// A list filled by a background fetch, with the usual movement keys.
pub struct RemoteList<T> {
    pub list: ScrollableList<T>,
    pub loading: bool,
    area: Rect,
}

impl<T> RemoteList<T> {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            loading: false,
            area: Rect::default(),
        }
    }

    pub fn loaded(&mut self, items: Vec<T>) {
        self.list.set_items(items);
        self.loading = false;
    }

    pub fn selected(&self) -> Option<&T> {
        self.list.selected_item()
    }

    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let page = self.area.height.saturating_sub(1) as usize;
        self.list.handle_nav_key(code, page)
    }

    /// Wheel scrolls, a left click selects the row under the pointer.
    pub fn handle_mouse(&mut self, event: &MouseEvent) -> bool {
        match event.kind {
            MouseEventKind::ScrollDown => {
                self.list.select_down(1);
                true
            }
            MouseEventKind::ScrollUp => {
                self.list.select_up(1);
                true
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let a = self.area;
                if event.column < a.x
                    || event.column >= a.x + a.width
                    || event.row < a.y
                    || event.row >= a.y + a.height
                {
                    return false;
                }
                self.list.handle_click((event.row - a.y) as usize)
            }
            _ => false,
        }
    }

    pub fn draw(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        empty: &str,
        row: impl Fn(&T) -> String,
    ) {
        self.area = area;
        if self.list.is_empty() {
            let text = if self.loading { "Loading…" } else { empty };
            frame.render_widget(Paragraph::new(Span::styled(text, theme.muted_text())), area);
            return;
        }
        let height = area.height as usize;
        let width = area.width as usize;
        self.list.ensure_visible(height);
        let selected = self.list.selected;
        let lines: Vec<Line> = self
            .list
            .visible_items(height)
            .into_iter()
            .map(|(i, item)| {
                let style = if i == selected {
                    theme.selected()
                } else {
                    theme.text()
                };
                Line::from(Span::styled(fit(&row(item), width), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }
}

impl<T> Default for RemoteList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Local time for a unix timestamp.
pub fn fmt_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_default()
}
