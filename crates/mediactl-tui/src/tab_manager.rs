//! Tab Manager: the ordered top-level views and which one is active.

use std::collections::HashMap;

use mediactl_proto::config::{Config, IconType};
use mediactl_proto::protocol::Library;
use tracing::debug;

use crate::command::Command;
use crate::component::{Component, Transition};
use crate::context::AppContext;
use crate::message::Message;
use crate::views::{
    history::HistoryView, home::HomeView, media::MediaView, search_status::SearchStatusView,
    sessions::SessionsView, tasks::TasksView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Home,
    Library,
    Sessions,
    History,
    Tasks,
    SearchStatus,
}

impl TabKind {
    fn icon(self, icon_type: IconType) -> &'static str {
        let (emoji, nf, ascii) = match self {
            TabKind::Home => ("🏠", "\u{f015}", "H"),
            TabKind::Library => ("📁", "\u{f07b}", "L"),
            TabKind::Sessions => ("📡", "\u{f1eb}", "S"),
            TabKind::History => ("🕘", "\u{f1da}", "Y"),
            TabKind::Tasks => ("🛠", "\u{f0ad}", "T"),
            TabKind::SearchStatus => ("🔎", "\u{f002}", "?"),
        };
        match icon_type {
            IconType::Emoji => emoji,
            IconType::NerdFonts => nf,
            IconType::Ascii => ascii,
        }
    }
}

pub struct Tab {
    pub id: String,
    pub title: String,
    pub kind: TabKind,
    pub component: Box<dyn Component>,
}

/// Libraries in tab order: the configured order first, then the server's.
pub fn ordered_libraries(libraries: &[Library], config: &Config) -> Vec<Library> {
    let order: &[String] = config
        .active_server()
        .map(|(_, s)| s.libraries.order.as_slice())
        .unwrap_or_default();
    let mut out: Vec<Library> = order
        .iter()
        .filter_map(|key| libraries.iter().find(|l| &l.key == key).cloned())
        .collect();
    out.extend(
        libraries
            .iter()
            .filter(|l| !order.contains(&l.key))
            .cloned(),
    );
    out
}

/// Sidebar label for a library, honouring icon and name-format settings.
pub fn library_label(library: &Library, config: &Config) -> String {
    let opts = config.library_options(&library.key);
    let configured = opts.icon(config.icon_type);
    let icon = if configured.is_empty() {
        let (emoji, nf, ascii) = library.default_icons();
        match config.icon_type {
            IconType::Emoji => emoji,
            IconType::NerdFonts => nf,
            IconType::Ascii => ascii,
        }
    } else {
        configured
    };
    config.library_name_format.apply(icon, &library.title)
}

fn build(kind: TabKind, library: Option<Library>, config: &Config, ctx: &AppContext) -> Box<dyn Component> {
    let ctx = ctx.clone();
    match (kind, library) {
        (TabKind::Library, Some(library)) => {
            let mode = config.library_view_mode(&library.key);
            Box::new(MediaView::new(ctx, library, mode))
        }
        (TabKind::Sessions, _) => Box::new(SessionsView::new(ctx)),
        (TabKind::History, _) => Box::new(HistoryView::new(ctx)),
        (TabKind::Tasks, _) => Box::new(TasksView::new(ctx)),
        (TabKind::SearchStatus, _) => Box::new(SearchStatusView::new(ctx)),
        _ => Box::new(HomeView::new(ctx)),
    }
}

#[derive(Default)]
pub struct TabManager {
    tabs: Vec<Tab>,
    active: usize,
}

impl TabManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the tab list for `libraries`. Tabs whose id survives keep
    /// their component; the active tab stays active when it still exists.
    pub fn rebuild(&mut self, libraries: &[Library], config: &Config, ctx: &AppContext) -> Command {
        let active_id = self.active().map(|t| t.id.clone());
        let mut old: HashMap<String, Tab> =
            self.tabs.drain(..).map(|t| (t.id.clone(), t)).collect();

        let fixed = |kind: TabKind, name: &str| {
            config
                .library_name_format
                .apply(kind.icon(config.icon_type), name)
        };
        let mut specs = vec![(
            "home".to_string(),
            fixed(TabKind::Home, "Home"),
            TabKind::Home,
            None,
        )];
        for library in ordered_libraries(libraries, config) {
            if config.library_options(&library.key).hidden {
                continue;
            }
            specs.push((
                format!("library:{}", library.key),
                library_label(&library, config),
                TabKind::Library,
                Some(library),
            ));
        }
        for (id, kind, name) in [
            ("sessions", TabKind::Sessions, "Sessions"),
            ("history", TabKind::History, "History"),
            ("tasks", TabKind::Tasks, "Tasks"),
            ("search-status", TabKind::SearchStatus, "Search Status"),
        ] {
            specs.push((id.to_string(), fixed(kind, name), kind, None));
        }

        for (id, title, kind, library) in specs {
            let tab = match old.remove(&id) {
                Some(mut tab) => {
                    tab.title = title;
                    tab
                }
                None => Tab {
                    component: build(kind, library, config, ctx),
                    id,
                    title,
                    kind,
                },
            };
            self.tabs.push(tab);
        }
        debug!(
            "TabManager: rebuilt {} tabs, {} dropped",
            self.tabs.len(),
            old.len()
        );

        self.active = active_id
            .and_then(|id| self.position(&id))
            .unwrap_or(0);
        match self.tabs.get_mut(self.active) {
            Some(tab) => tab.component.init(),
            None => Command::none(),
        }
    }

    /// Activate tab `index` and run its init. Out of range does nothing.
    pub fn set_active(&mut self, index: usize) -> Command {
        let Some(tab) = self.tabs.get_mut(index) else {
            return Command::none();
        };
        self.active = index;
        tab.component.init()
    }

    pub fn next(&mut self) -> Command {
        if self.tabs.is_empty() {
            return Command::none();
        }
        self.set_active((self.active + 1) % self.tabs.len())
    }

    pub fn prev(&mut self) -> Command {
        if self.tabs.is_empty() {
            return Command::none();
        }
        let n = self.tabs.len();
        self.set_active((self.active + n - 1) % n)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.active)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn first_of(&self, kind: TabKind) -> Option<usize> {
        self.tabs.iter().position(|t| t.kind == kind)
    }

    pub fn labels(&self) -> Vec<String> {
        self.tabs.iter().map(|t| t.title.clone()).collect()
    }

    fn apply(tab: &mut Tab, transition: Transition) -> Command {
        match transition {
            Transition::Stay(cmd) => cmd,
            Transition::Replace(next, cmd) => {
                tab.component = next;
                cmd
            }
            // Tabs are permanent.
            Transition::Dismiss(cmd) => cmd,
        }
    }

    /// Deliver `msg` to the active tab only.
    pub fn update_active(&mut self, msg: &Message) -> Command {
        match self.tabs.get_mut(self.active) {
            Some(tab) => {
                let t = tab.component.update(msg);
                Self::apply(tab, t)
            }
            None => Command::none(),
        }
    }

    /// Deliver `msg` to every tab; each ignores what is not its own.
    pub fn broadcast(&mut self, msg: &Message) -> Command {
        let mut cmd = Command::none();
        for tab in &mut self.tabs {
            let t = tab.component.update(msg);
            cmd = cmd.and(Self::apply(tab, t));
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::context;
    use mediactl_proto::config::{LibraryOptions, ServerConfig};
    use mediactl_proto::protocol::Metadata;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn lib(key: &str, title: &str) -> Library {
        Library {
            key: key.into(),
            title: title.into(),
            kind: "movie".into(),
            ..Default::default()
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.servers.insert(
            "srv".into(),
            ServerConfig {
                url: "http://srv".into(),
                ..Default::default()
            },
        );
        config
    }

    fn ids(tabs: &TabManager) -> Vec<&str> {
        tabs.tabs().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn fixed_tabs_surround_libraries() {
        let mut tabs = TabManager::new();
        let _ = tabs.rebuild(&[lib("1", "Movies"), lib("2", "Shows")], &config(), &context());
        assert_eq!(
            ids(&tabs),
            vec![
                "home",
                "library:1",
                "library:2",
                "sessions",
                "history",
                "tasks",
                "search-status"
            ]
        );
    }

    #[test]
    fn hidden_libraries_are_skipped_and_order_is_honoured() {
        let mut config = config();
        let server = config.servers.get_mut("srv").unwrap();
        server.libraries.order = vec!["3".into(), "1".into()];
        server.libraries.settings.insert(
            "2".into(),
            LibraryOptions {
                hidden: true,
                ..Default::default()
            },
        );
        let mut tabs = TabManager::new();
        let _ = tabs.rebuild(
            &[lib("1", "A"), lib("2", "B"), lib("3", "C"), lib("4", "D")],
            &config,
            &context(),
        );
        assert_eq!(
            &ids(&tabs)[1..4],
            &["library:3", "library:1", "library:4"]
        );
    }

    #[test]
    fn set_active_out_of_range_is_noop() {
        let mut tabs = TabManager::new();
        let _ = tabs.rebuild(&[], &config(), &context());
        let _ = tabs.set_active(2);
        let cmd = tabs.set_active(99);
        assert!(cmd.is_none());
        assert_eq!(tabs.active_index(), 2);
    }

    #[test]
    fn next_and_prev_wrap() {
        let mut tabs = TabManager::new();
        let _ = tabs.rebuild(&[], &config(), &context());
        let n = tabs.len();
        let _ = tabs.prev();
        assert_eq!(tabs.active_index(), n - 1);
        let _ = tabs.next();
        assert_eq!(tabs.active_index(), 0);
    }

    #[test]
    fn empty_manager_is_inert() {
        let mut tabs = TabManager::new();
        assert!(tabs.next().is_none());
        assert!(tabs.prev().is_none());
        assert!(tabs.update_active(&Message::Tick).is_none());
    }

    #[tokio::test]
    async fn rebuild_preserves_tab_state() {
        let ctx = context();
        let config = config();
        let mut tabs = TabManager::new();
        let _ = tabs.rebuild(&[lib("1", "A"), lib("2", "B")], &config, &ctx);
        let a = tabs.position("library:1").unwrap();
        let _ = tabs.set_active(a);
        let _ = tabs.update_active(&Message::MediaPage {
            section_id: "1".into(),
            generation: 0,
            items: (0..10)
                .map(|i| Metadata {
                    rating_key: i.to_string(),
                    ..Default::default()
                })
                .collect(),
            total: 10,
        });
        for _ in 0..5 {
            let _ = tabs.update_active(&Message::Key(KeyEvent::new(
                KeyCode::Down,
                KeyModifiers::NONE,
            )));
        }

        let _ = tabs.rebuild(&[lib("1", "A"), lib("2", "B"), lib("3", "C")], &config, &ctx);
        assert_eq!(tabs.len(), 8);
        assert_eq!(tabs.active().unwrap().id, "library:1");
        let selected = tabs
            .active()
            .unwrap()
            .component
            .as_playable()
            .and_then(|p| p.selected_metadata())
            .unwrap();
        assert_eq!(selected.rating_key, "5");
    }

    #[test]
    fn rebuild_falls_back_to_first_tab_when_active_disappears() {
        let ctx = context();
        let mut tabs = TabManager::new();
        let _ = tabs.rebuild(&[lib("1", "A")], &config(), &ctx);
        let _ = tabs.set_active(1);
        let _ = tabs.rebuild(&[lib("2", "B")], &config(), &ctx);
        assert_eq!(tabs.active_index(), 0);
    }

    #[test]
    fn labels_follow_icon_settings() {
        let mut config = config();
        config.icon_type = IconType::Ascii;
        config.library_name_format = mediactl_proto::config::LibraryNameFormat::Name;
        assert_eq!(library_label(&lib("1", "Movies"), &config), "Movies");
    }
}
