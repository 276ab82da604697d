//! Generic scrollable list state.

use ratatui::crossterm::event::KeyCode;

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    /// Replace the items, keeping the selection where it still fits.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.clamp();
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    fn clamp(&mut self) {
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
        if self.scroll_offset > self.selected {
            self.scroll_offset = self.selected;
        }
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index;
        self.clamp();
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Rows left below the selection.
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.selected + 1)
    }

    /// Returns (index, &item) pairs visible in `height` rows.
    /// Call ensure_visible first to update scroll_offset.
    pub fn visible_items(&self, height: usize) -> Vec<(usize, &T)> {
        if height == 0 || self.items.is_empty() {
            return Vec::new();
        }
        let start = self.scroll_offset.min(self.items.len());
        let end = (start + height).min(self.items.len());
        (start..end).map(|i| (i, &self.items[i])).collect()
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected.saturating_sub(height - 1);
        }
    }

    /// Handle a click at `row` within the rendered area.
    /// Returns true if selection changed.
    pub fn handle_click(&mut self, row: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < self.items.len() && target != self.selected {
            self.selected = target;
            return true;
        }
        false
    }

    /// Apply a movement key. Returns false for keys that are not movement.
    pub fn handle_nav_key(&mut self, code: KeyCode, page: usize) -> bool {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.select_down(1),
            KeyCode::PageUp => self.select_up(page.max(1)),
            KeyCode::PageDown => self.select_down(page.max(1)),
            KeyCode::Home | KeyCode::Char('g') => self.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.select_last(),
            _ => return false,
        }
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}
