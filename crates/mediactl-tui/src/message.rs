//! Message enum: every event the runtime processes, one at a time.

use mediactl_proto::config::{Config, ViewMode};
use mediactl_proto::protocol::{ButlerTask, HomeUser, Library, Metadata};
use ratatui::crossterm::event::{KeyEvent, MouseEvent};

/// An error to show the user. Blocking alerts are modal and need an explicit
/// dismiss; the rest are transient toasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub blocking: bool,
}

impl Alert {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            blocking: false,
        }
    }

    pub fn blocking(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            blocking: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    // ── Terminal ─────────────────────────────────────────────────────────────
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
    /// Playback poll while the player is active.
    Tick,

    // ── Player ───────────────────────────────────────────────────────────────
    PlayerStatusChanged,
    /// Ask the controller to fetch and play an item.
    RequestPlay { rating_key: String, compact: bool },
    /// The item has a resume point; let the user choose.
    ResumeChoice { item: Box<Metadata>, compact: bool },
    PlayMedia {
        item: Box<Metadata>,
        compact: bool,
        offset_ms: u64,
        no_report: bool,
    },

    // ── Navigation ───────────────────────────────────────────────────────────
    /// Generic drill-up; pops a detail frame only when it is at its root.
    Back,
    /// Leave every detail frame and return to the library listing.
    BackToLibrary,
    /// Open an item picked outside its library tab (search, home, history).
    SelectMedia {
        rating_key: String,
        kind: String,
        section_id: Option<String>,
    },
    JumpToDetail {
        section_id: String,
        rating_key: String,
        kind: String,
        return_tab: usize,
    },

    // ── Data ─────────────────────────────────────────────────────────────────
    DataReloaded(Vec<Library>),
    MediaPage {
        section_id: String,
        generation: u64,
        items: Vec<Metadata>,
        total: usize,
    },
    /// A page request failed; the tab stops waiting and the alert is shown.
    MediaPageFailed {
        section_id: String,
        generation: u64,
        alert: Alert,
    },
    DetailLoaded {
        rating_key: String,
        item: Box<Metadata>,
        children: Vec<Metadata>,
    },
    HomeLoaded {
        on_deck: Vec<Metadata>,
        recently_added: Vec<Metadata>,
    },
    SessionsLoaded(Vec<Metadata>),
    HistoryLoaded(Vec<Metadata>),
    TasksLoaded(Vec<ButlerTask>),
    TaskStarted(String),
    /// Re-read every library into the search index.
    RefreshIndex,
    IndexUpdated,

    // ── Settings ─────────────────────────────────────────────────────────────
    ThemeChanged(String),
    SettingsSaved(Box<Config>),
    ViewModeChanged { section_id: String, mode: ViewMode },

    // ── Users ────────────────────────────────────────────────────────────────
    UserSelection(Vec<HomeUser>),
    SwitchUser { user: HomeUser, pin: Option<String> },
    UserSwitched {
        auth_token: String,
        access_token: String,
    },
    InvalidPin,

    // ── System ───────────────────────────────────────────────────────────────
    Error(Alert),
    Quit,
}

/// One line of the help overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpKey {
    pub key: &'static str,
    pub desc: &'static str,
}

impl HelpKey {
    pub const fn new(key: &'static str, desc: &'static str) -> Self {
        Self { key, desc }
    }
}
