//! A library tab: the paged listing of one section, with detail frames on top.

use mediactl_proto::config::ViewMode;
use mediactl_proto::protocol::{Library, Metadata};
use ratatui::crossterm::event::{KeyCode, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::debug;

use crate::client::PAGE_SIZE;
use crate::command::{alert_for, Command};
use crate::component::{
    Component, DetailHost, HelpProvider, PlayableProvider, Refreshable, Transition,
};
use crate::context::AppContext;
use crate::detail::{fmt_runtime, frame_for, DetailManager};
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::views::RemoteList;
use crate::widgets::pane::{fit, truncate};

/// Fetch the next page once the selection is this close to the end.
const PREFETCH_ROWS: usize = 20;
const POSTER_WIDTH: u16 = 24;
const POSTER_HEIGHT: u16 = 5;

const LIST_KEYS: &[HelpKey] = &[
    HelpKey::new("j/k", "move"),
    HelpKey::new("enter", "details"),
    HelpKey::new("v", "list / poster"),
    HelpKey::new("r", "refresh"),
];

pub struct MediaView {
    ctx: AppContext,
    library: Library,
    view_mode: ViewMode,
    items: RemoteList<Metadata>,
    total: usize,
    /// Bumped on refresh; pages from older generations are dropped.
    generation: u64,
    details: DetailManager,
    columns: usize,
    poster_row: usize,
    poster_area: Rect,
}

impl MediaView {
    pub fn new(ctx: AppContext, library: Library, view_mode: ViewMode) -> Self {
        Self {
            ctx,
            library,
            view_mode,
            items: RemoteList::new(),
            total: 0,
            generation: 0,
            details: DetailManager::new(),
            columns: 1,
            poster_row: 0,
            poster_area: Rect::default(),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    fn fetch_page(&mut self, fresh: bool) -> Command {
        self.items.loading = true;
        let client = self.ctx.client.clone();
        let section_id = self.library.key.clone();
        let generation = self.generation;
        let start = self.items.list.len();
        Command::perform(async move {
            match client.section_page(&section_id, start, PAGE_SIZE, fresh).await {
                Ok(page) => Message::MediaPage {
                    section_id,
                    generation,
                    items: page.items,
                    total: page.total,
                },
                Err(e) => Message::MediaPageFailed {
                    section_id,
                    generation,
                    alert: alert_for(&e),
                },
            }
        })
    }

    fn maybe_prefetch(&mut self) -> Command {
        let list = &self.items.list;
        if self.items.loading || list.len() >= self.total || list.remaining() >= PREFETCH_ROWS {
            return Command::none();
        }
        self.fetch_page(false)
    }

    fn on_page(&mut self, section_id: &str, generation: u64, items: &[Metadata], total: usize) {
        if section_id != self.library.key || generation != self.generation {
            debug!(
                "MediaView: dropping stale page for {} (generation {} != {})",
                section_id, generation, self.generation
            );
            return;
        }
        self.items.list.extend(items.iter().cloned());
        self.total = total.max(self.items.list.len());
        self.items.loading = false;
    }

    fn on_page_failed(&mut self, section_id: &str, generation: u64) {
        if section_id != self.library.key || generation != self.generation {
            return;
        }
        self.items.loading = false;
    }

    fn open_selected(&mut self) -> Command {
        let Some(item) = self.items.selected().cloned() else {
            return Command::none();
        };
        self.show_detail(&item.rating_key, &item.kind)
    }

    fn handle_key(&mut self, code: KeyCode) -> Command {
        let moved = match (self.view_mode, code) {
            (ViewMode::Poster, KeyCode::Left) => {
                self.items.list.select_up(1);
                true
            }
            (ViewMode::Poster, KeyCode::Right) => {
                self.items.list.select_down(1);
                true
            }
            (ViewMode::Poster, KeyCode::Up | KeyCode::Char('k')) => {
                self.items.list.select_up(self.columns);
                true
            }
            (ViewMode::Poster, KeyCode::Down | KeyCode::Char('j')) => {
                self.items.list.select_down(self.columns);
                true
            }
            _ => self.items.handle_key(code),
        };
        if moved {
            return self.maybe_prefetch();
        }
        match code {
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('v') => {
                self.view_mode = self.view_mode.toggled();
                Command::message(Message::ViewModeChanged {
                    section_id: self.library.key.clone(),
                    mode: self.view_mode,
                })
            }
            _ => Command::none(),
        }
    }

    fn handle_mouse(&mut self, event: &MouseEvent) -> Command {
        let moved = match (self.view_mode, event.kind) {
            (ViewMode::Poster, MouseEventKind::ScrollDown) => {
                self.items.list.select_down(self.columns);
                true
            }
            (ViewMode::Poster, MouseEventKind::ScrollUp) => {
                self.items.list.select_up(self.columns);
                true
            }
            (ViewMode::Poster, _) => false,
            (ViewMode::List, _) => self.items.handle_mouse(event),
        };
        if moved {
            self.maybe_prefetch()
        } else {
            Command::none()
        }
    }

    fn row(item: &Metadata) -> String {
        let mut row = item.display_title();
        match item.kind.as_str() {
            "show" => {
                if let Some(n) = item.child_count {
                    row.push_str(&format!("  {n} seasons"));
                }
                if let (Some(l), Some(v)) = (item.leaf_count, item.viewed_leaf_count) {
                    row.push_str(&format!("  {v}/{l}"));
                }
            }
            _ => {
                if let Some(d) = item.duration {
                    row.push_str(&format!("  {}", fmt_runtime(d)));
                }
                if item.view_count.unwrap_or(0) > 0 {
                    row.push_str("  ✓");
                } else if item.has_resume_point() {
                    row.push_str("  ◐");
                }
            }
        }
        row
    }

    fn draw_posters(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.poster_area = area;
        let list = &self.items.list;
        if list.is_empty() {
            let text = if self.items.loading { "Loading…" } else { "Empty library" };
            frame.render_widget(Paragraph::new(Span::styled(text, theme.muted_text())), area);
            return;
        }
        self.columns = (area.width / POSTER_WIDTH).max(1) as usize;
        let rows = (area.height / POSTER_HEIGHT).max(1) as usize;
        let selected_row = list.selected / self.columns;
        if selected_row < self.poster_row {
            self.poster_row = selected_row;
        } else if selected_row >= self.poster_row + rows {
            self.poster_row = selected_row + 1 - rows;
        }

        let inner_w = POSTER_WIDTH.saturating_sub(2) as usize;
        for r in 0..rows {
            for c in 0..self.columns {
                let i = (self.poster_row + r) * self.columns + c;
                let Some(item) = list.items.get(i) else {
                    return;
                };
                let cell = Rect {
                    x: area.x + c as u16 * POSTER_WIDTH,
                    y: area.y + r as u16 * POSTER_HEIGHT,
                    width: POSTER_WIDTH.min(area.width),
                    height: POSTER_HEIGHT.min(area.height.saturating_sub(r as u16 * POSTER_HEIGHT)),
                };
                if cell.height < 3 {
                    return;
                }
                let focused = i == list.selected;
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style(focused));
                let inner = block.inner(cell);
                frame.render_widget(block, cell);
                let title_style = if focused {
                    theme.accent_text().add_modifier(Modifier::BOLD)
                } else {
                    theme.text()
                };
                let sub = match (item.year, item.kind.as_str()) {
                    (_, "episode") => item.grandparent_title.clone().unwrap_or_default(),
                    (Some(y), _) => y.to_string(),
                    _ => String::new(),
                };
                let lines = vec![
                    Line::from(Span::styled(truncate(&item.title, inner_w), title_style)),
                    Line::from(Span::styled(truncate(&sub, inner_w), theme.muted_text())),
                    Line::from(Span::styled(
                        if item.view_count.unwrap_or(0) > 0 { "✓" } else { "" },
                        theme.secondary_text(),
                    )),
                ];
                frame.render_widget(Paragraph::new(lines), inner);
            }
        }
    }
}

impl Component for MediaView {
    fn init(&mut self) -> Command {
        if !self.items.list.is_empty() || self.items.loading {
            return Command::none();
        }
        self.fetch_page(false)
    }

    fn update(&mut self, msg: &Message) -> Transition {
        if let Message::MediaPage {
            section_id,
            generation,
            items,
            total,
        } = msg
        {
            self.on_page(section_id, *generation, items, *total);
            return Transition::none();
        }
        if let Message::MediaPageFailed {
            section_id,
            generation,
            ..
        } = msg
        {
            self.on_page_failed(section_id, *generation);
            return Transition::none();
        }
        let (cmd, captured) = self.details.update(msg);
        if captured {
            return cmd.into();
        }
        let own = match msg {
            Message::Key(key) => self.handle_key(key.code),
            Message::Mouse(event) => self.handle_mouse(event),
            _ => Command::none(),
        };
        cmd.and(own).into()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if !self.details.is_empty() {
            self.details.draw(frame, area, theme);
            return;
        }
        let [body, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
        match self.view_mode {
            ViewMode::List => self.items.draw(frame, body, theme, "Empty library", Self::row),
            ViewMode::Poster => self.draw_posters(frame, body, theme),
        }
        let count = if self.total == 0 {
            String::new()
        } else {
            format!("{}/{}", self.items.list.selected + 1, self.total)
        };
        let loading = if self.items.loading { " · loading" } else { "" };
        frame.render_widget(
            Paragraph::new(Span::styled(
                fit(
                    &format!("{count} · {}{loading}", self.view_mode.label()),
                    status.width as usize,
                ),
                theme.muted_text(),
            )),
            status,
        );
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

    fn as_detail_host(&mut self) -> Option<&mut dyn DetailHost> {
        Some(self)
    }
}

impl Refreshable for MediaView {
    fn refresh(&mut self) -> Command {
        if let Some(top) = self.details.top_mut() {
            return match top.as_refreshable() {
                Some(r) => r.refresh(),
                None => Command::none(),
            };
        }
        self.generation += 1;
        self.items.list.clear();
        self.total = 0;
        self.poster_row = 0;
        self.fetch_page(true)
    }
}

impl HelpProvider for MediaView {
    fn help_keys(&self) -> Vec<HelpKey> {
        match self.details.top().and_then(|t| t.as_help_provider()) {
            Some(h) => h.help_keys(),
            None => LIST_KEYS.to_vec(),
        }
    }
}

impl PlayableProvider for MediaView {
    fn selected_metadata(&self) -> Option<Metadata> {
        if let Some(top) = self.details.top() {
            return top.as_playable().and_then(|p| p.selected_metadata());
        }
        self.items.selected().cloned()
    }
}

impl DetailHost for MediaView {
    fn section_id(&self) -> &str {
        &self.library.key
    }

    fn show_detail(&mut self, rating_key: &str, kind: &str) -> Command {
        self.details.clear();
        self.details.push(frame_for(&self.ctx, rating_key, kind))
    }

    fn detail_depth(&self) -> usize {
        self.details.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::context;
    use crate::message::Alert;
    use ratatui::crossterm::event::{KeyEvent, KeyModifiers};

    fn library() -> Library {
        Library {
            key: "1".into(),
            title: "Movies".into(),
            kind: "movie".into(),
            ..Default::default()
        }
    }

    fn items(range: std::ops::Range<usize>) -> Vec<Metadata> {
        range
            .map(|i| Metadata {
                rating_key: i.to_string(),
                title: format!("Movie {i}"),
                kind: "movie".into(),
                ..Default::default()
            })
            .collect()
    }

    fn page(generation: u64, range: std::ops::Range<usize>, total: usize) -> Message {
        Message::MediaPage {
            section_id: "1".into(),
            generation,
            items: items(range),
            total,
        }
    }

    fn press(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn view() -> MediaView {
        MediaView::new(context(), library(), ViewMode::List)
    }

    #[tokio::test]
    async fn pages_append_and_stale_pages_are_dropped() {
        let mut v = view();
        let _ = v.init();
        let _ = v.update(&page(0, 0..100, 250));
        assert_eq!(v.items.list.len(), 100);

        let _ = v.update(&Message::MediaPage {
            section_id: "2".into(),
            generation: 0,
            items: items(0..100),
            total: 100,
        });
        assert_eq!(v.items.list.len(), 100);

        let _ = v.refresh();
        let _ = v.update(&page(0, 100..200, 250));
        assert!(v.items.list.is_empty());
        let _ = v.update(&page(1, 0..100, 250));
        assert_eq!(v.items.list.len(), 100);
    }

    #[tokio::test]
    async fn prefetches_near_the_end() {
        let mut v = view();
        let _ = v.init();
        let _ = v.update(&page(0, 0..100, 250));
        v.items.list.select(70);
        let Transition::Stay(cmd) = v.update(&press(KeyCode::Down)) else {
            panic!("expected stay");
        };
        assert!(cmd.is_none());

        v.items.list.select(85);
        let Transition::Stay(cmd) = v.update(&press(KeyCode::Down)) else {
            panic!("expected stay");
        };
        assert_eq!(cmd.len(), 1);
        assert!(v.items.loading);

        // One page in flight at a time.
        let Transition::Stay(cmd) = v.update(&press(KeyCode::Down)) else {
            panic!("expected stay");
        };
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn failed_page_clears_loading_and_allows_retry() {
        let mut v = view();
        let msgs = v.init().collect().await;
        assert!(matches!(
            &msgs[..],
            [Message::MediaPageFailed { section_id, generation: 0, .. }] if section_id == "1"
        ));
        assert!(v.init().is_none());

        let _ = v.update(&msgs[0]);
        assert!(!v.items.loading);
        assert_eq!(v.init().len(), 1);
    }

    #[tokio::test]
    async fn stale_failure_keeps_current_request_pending() {
        let mut v = view();
        let _ = v.init();
        let _ = v.refresh();
        assert!(v.items.loading);
        let _ = v.update(&Message::MediaPageFailed {
            section_id: "1".into(),
            generation: 0,
            alert: Alert::transient("timeout"),
        });
        assert!(v.items.loading);
    }

    #[tokio::test]
    async fn no_prefetch_past_total() {
        let mut v = view();
        let _ = v.init();
        let _ = v.update(&page(0, 0..40, 40));
        v.items.list.select_last();
        let Transition::Stay(cmd) = v.update(&press(KeyCode::Up)) else {
            panic!("expected stay");
        };
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn toggling_view_mode_is_announced() {
        let mut v = view();
        let Transition::Stay(cmd) = v.update(&press(KeyCode::Char('v'))) else {
            panic!("expected stay");
        };
        assert_eq!(v.view_mode(), ViewMode::Poster);
        let msgs = cmd.collect().await;
        assert!(matches!(
            msgs.as_slice(),
            [Message::ViewModeChanged { section_id, mode: ViewMode::Poster }] if section_id == "1"
        ));
    }

    #[tokio::test]
    async fn enter_opens_detail_and_back_returns() {
        let mut v = view();
        let _ = v.init();
        let _ = v.update(&page(0, 0..3, 3));
        let _ = v.update(&press(KeyCode::Enter));
        assert_eq!(v.detail_depth(), 1);

        // Keys now belong to the detail frame.
        let _ = v.update(&press(KeyCode::Down));
        assert_eq!(v.items.list.selected, 0);

        let _ = v.update(&Message::Back);
        assert_eq!(v.detail_depth(), 0);
    }

    #[tokio::test]
    async fn pages_still_land_while_detail_is_open() {
        let mut v = view();
        let _ = v.init();
        let _ = v.show_detail("7", "movie");
        let _ = v.update(&page(0, 0..10, 10));
        assert_eq!(v.items.list.len(), 10);
        assert_eq!(v.detail_depth(), 1);
    }
}
