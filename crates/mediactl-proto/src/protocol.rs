//! Wire types for the media server's JSON API and for the progress reports
//! sent back to it.

use serde::{Deserialize, Serialize};

/// Every server response is wrapped in a `MediaContainer`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "MediaContainer", default)]
    pub media_container: MediaContainer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContainer {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<Metadata>,
    #[serde(rename = "Directory", default)]
    pub directory: Vec<Library>,
}

impl MediaContainer {
    /// Total number of items the server holds for this listing, falling back
    /// to the page length when the server omits it.
    pub fn total(&self) -> usize {
        self.total_size
            .or(self.size)
            .map(|n| n as usize)
            .unwrap_or(self.metadata.len())
    }
}

/// A library section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Library {
    /// Fallback icons when the library has none configured.
    pub fn default_icons(&self) -> (&'static str, &'static str, &'static str) {
        match self.kind.as_str() {
            "movie" => ("🎬", "󰿎", "[M]"),
            "show" => ("📺", "󰟴", "[T]"),
            "artist" => ("🎵", "󰎆", "[A]"),
            "photo" => ("📷", "󰉏", "[P]"),
            _ => ("📁", "󰉋", "[L]"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub key: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub video_resolution: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(rename = "Part", default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionPlayer {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub state: String,
}

/// An item as returned by listing, metadata, session and history calls.
/// Fields not present in a particular response default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub rating_key: String,
    #[serde(default)]
    pub key: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_title: Option<String>,
    #[serde(default)]
    pub grandparent_title: Option<String>,
    #[serde(default)]
    pub parent_rating_key: Option<String>,
    #[serde(default)]
    pub grandparent_rating_key: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub parent_index: Option<u32>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub studio: Option<String>,
    #[serde(default)]
    pub content_rating: Option<String>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Resume point in milliseconds.
    #[serde(default)]
    pub view_offset: Option<u64>,
    #[serde(default)]
    pub view_count: Option<u32>,
    #[serde(default)]
    pub leaf_count: Option<u32>,
    #[serde(default)]
    pub viewed_leaf_count: Option<u32>,
    #[serde(default)]
    pub child_count: Option<u32>,
    #[serde(rename = "librarySectionID", default)]
    pub library_section_id: Option<serde_json::Value>,
    #[serde(default)]
    pub library_section_title: Option<String>,
    #[serde(default)]
    pub added_at: Option<i64>,
    #[serde(default)]
    pub viewed_at: Option<i64>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(rename = "Media", default)]
    pub media: Vec<Media>,
    #[serde(rename = "Genre", default)]
    pub genres: Vec<Tag>,
    #[serde(rename = "User", default)]
    pub user: Option<SessionUser>,
    #[serde(rename = "Player", default)]
    pub player: Option<SessionPlayer>,
}

impl Metadata {
    pub fn is_playable(&self) -> bool {
        matches!(
            self.kind.as_str(),
            "movie" | "episode" | "clip" | "track" | "video"
        )
    }

    pub fn is_trailer(&self) -> bool {
        self.kind == "clip" && self.subtype.as_deref() == Some("trailer")
    }

    /// Key of the first playable part, e.g. `/library/parts/1/1/file.mkv`.
    pub fn stream_part(&self) -> Option<&Part> {
        self.media.iter().flat_map(|m| m.parts.iter()).next()
    }

    /// Library section id as a string; the server sends it as a number.
    pub fn section_id(&self) -> Option<String> {
        match self.library_section_id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn display_title(&self) -> String {
        match self.kind.as_str() {
            "episode" => {
                let show = self.grandparent_title.as_deref().unwrap_or_default();
                match (self.parent_index, self.index) {
                    (Some(s), Some(e)) => format!("{show} - S{s:02}E{e:02} - {}", self.title),
                    _ if !show.is_empty() => format!("{show} - {}", self.title),
                    _ => self.title.clone(),
                }
            }
            "season" => match self.parent_title.as_deref() {
                Some(show) if !show.is_empty() => format!("{show} - {}", self.title),
                _ => self.title.clone(),
            },
            _ => match self.year {
                Some(y) => format!("{} ({y})", self.title),
                None => self.title.clone(),
            },
        }
    }

    pub fn has_resume_point(&self) -> bool {
        self.view_offset.unwrap_or(0) > 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ButlerTask {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    /// Days between runs.
    #[serde(default)]
    pub interval: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ButlerEnvelope {
    #[serde(rename = "ButlerTasks", default)]
    pub tasks: ButlerTasks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ButlerTasks {
    #[serde(rename = "ButlerTask", default)]
    pub task: Vec<ButlerTask>,
}

/// A managed user of the account's home.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeUser {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub restricted: bool,
    /// A PIN is required to switch to this user.
    #[serde(default)]
    pub protected: bool,
}

/// `/api/v2/home/users` answers either a bare array or `{ "users": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HomeUsersResponse {
    List(Vec<HomeUser>),
    Wrapped { users: Vec<HomeUser> },
}

impl HomeUsersResponse {
    pub fn into_users(self) -> Vec<HomeUser> {
        match self {
            HomeUsersResponse::List(users) | HomeUsersResponse::Wrapped { users } => users,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchedUser {
    #[serde(default)]
    pub auth_token: String,
}

/// A device on the account; servers carry their per-user access token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub client_identifier: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub provides: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

/// Playback progress sent to the server's timeline endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineReport {
    pub rating_key: String,
    pub state: PlaybackState,
    pub time_ms: u64,
    pub duration_ms: u64,
}

impl TimelineReport {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ratingKey", self.rating_key.clone()),
            ("key", format!("/library/metadata/{}", self.rating_key)),
            ("state", self.state.as_str().to_string()),
            ("time", self.time_ms.to_string()),
            ("duration", self.duration_ms.to_string()),
        ]
    }
}
