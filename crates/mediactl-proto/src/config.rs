use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IconType {
    Ascii,
    #[default]
    Emoji,
    #[serde(rename = "nerdfonts")]
    NerdFonts,
}

impl IconType {
    pub const ALL: [IconType; 3] = [IconType::Ascii, IconType::Emoji, IconType::NerdFonts];

    pub fn label(self) -> &'static str {
        match self {
            IconType::Ascii => "ascii",
            IconType::Emoji => "emoji",
            IconType::NerdFonts => "nerdfonts",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LibraryNameFormat {
    IconOnly,
    #[default]
    IconName,
    NameIcon,
    Name,
}

impl LibraryNameFormat {
    pub const ALL: [LibraryNameFormat; 4] = [
        LibraryNameFormat::IconOnly,
        LibraryNameFormat::IconName,
        LibraryNameFormat::NameIcon,
        LibraryNameFormat::Name,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LibraryNameFormat::IconOnly => "icon_only",
            LibraryNameFormat::IconName => "icon_name",
            LibraryNameFormat::NameIcon => "name_icon",
            LibraryNameFormat::Name => "name",
        }
    }

    pub fn apply(self, icon: &str, name: &str) -> String {
        if icon.is_empty() {
            return name.to_string();
        }
        match self {
            LibraryNameFormat::IconOnly => icon.to_string(),
            LibraryNameFormat::IconName => format!("{icon} {name}"),
            LibraryNameFormat::NameIcon => format!("{name} {icon}"),
            LibraryNameFormat::Name => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    List,
    #[default]
    Poster,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Poster,
            ViewMode::Poster => ViewMode::List,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Poster => "poster",
        }
    }
}

/// Per-library presentation settings, keyed by section id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LibraryOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_nf: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_ascii: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
}

impl LibraryOptions {
    pub fn icon(&self, icon_type: IconType) -> &str {
        match icon_type {
            IconType::Emoji => &self.icon_emoji,
            IconType::NerdFonts => &self.icon_nf,
            IconType::Ascii => &self.icon_ascii,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub settings: BTreeMap<String, LibraryOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub libraries: LibraryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeUser {
    /// Account token returned by a home user switch.
    #[serde(default)]
    pub auth_token: String,
    /// Server-specific access token for the switched user.
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub home_user: HomeUser,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub icon_type: IconType,
    #[serde(default)]
    pub library_name_format: LibraryNameFormat,
    #[serde(default)]
    pub default_view_mode: ViewMode,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub no_cache: bool,
    #[serde(default = "default_true")]
    pub auto_home_login: bool,
    #[serde(default)]
    pub close_video_on_quit: bool,
    /// Explicit player binary; PATH lookup when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_binary: Option<PathBuf>,
    #[serde(default)]
    pub default_server: String,
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_cache_dir() -> PathBuf {
    platform::cache_dir()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            home_user: HomeUser::default(),
            theme: default_theme(),
            icon_type: IconType::default(),
            library_name_format: LibraryNameFormat::default(),
            default_view_mode: ViewMode::default(),
            cache_dir: default_cache_dir(),
            no_cache: false,
            auto_home_login: true,
            close_video_on_quit: false,
            player_binary: None,
            default_server: String::new(),
            servers: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Missing files load as defaults without being written back.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// The selected server: `default_server` when set, otherwise the only
    /// configured server.
    pub fn active_server(&self) -> Option<(&str, &ServerConfig)> {
        if !self.default_server.is_empty() {
            return self
                .servers
                .get_key_value(&self.default_server)
                .map(|(k, v)| (k.as_str(), v));
        }
        if self.servers.len() == 1 {
            return self.servers.iter().next().map(|(k, v)| (k.as_str(), v));
        }
        None
    }

    pub fn active_server_mut(&mut self) -> Option<&mut ServerConfig> {
        let id = self.active_server().map(|(id, _)| id.to_string())?;
        self.servers.get_mut(&id)
    }

    /// Token used for server requests: the switched home user's access token
    /// wins over the account token.
    pub fn effective_token(&self) -> &str {
        if self.home_user.access_token.is_empty() {
            &self.token
        } else {
            &self.home_user.access_token
        }
    }

    pub fn library_options(&self, section_id: &str) -> LibraryOptions {
        self.active_server()
            .and_then(|(_, s)| s.libraries.settings.get(section_id).cloned())
            .unwrap_or_default()
    }

    pub fn library_view_mode(&self, section_id: &str) -> ViewMode {
        self.library_options(section_id)
            .view_mode
            .unwrap_or(self.default_view_mode)
    }

    pub fn set_library_view_mode(&mut self, section_id: &str, mode: ViewMode) {
        if let Some(server) = self.active_server_mut() {
            server
                .libraries
                .settings
                .entry(section_id.to_string())
                .or_default()
                .view_mode = Some(mode);
        }
    }

    pub fn set_library_hidden(&mut self, section_id: &str, hidden: bool) {
        if let Some(server) = self.active_server_mut() {
            server
                .libraries
                .settings
                .entry(section_id.to_string())
                .or_default()
                .hidden = hidden;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_server() -> Config {
        let mut config = Config::default();
        config.servers.insert(
            "abc".to_string(),
            ServerConfig {
                name: "den".to_string(),
                url: "http://srv:32400".to_string(),
                libraries: LibraryConfig::default(),
            },
        );
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme, "default");
        assert!(config.auto_home_login);
        assert!(!config.close_video_on_quit);
        assert_eq!(config.default_view_mode, ViewMode::Poster);
        assert!(config.cache_dir.ends_with(platform::APP_NAME));
        assert!(config.active_server().is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            token = "t"
            icon_type = "nerdfonts"

            [servers.abc]
            url = "http://srv:32400"
            "#,
        )
        .unwrap();
        assert_eq!(config.icon_type, IconType::NerdFonts);
        assert!(config.auto_home_login);
        let (id, server) = config.active_server().unwrap();
        assert_eq!(id, "abc");
        assert_eq!(server.url, "http://srv:32400");
    }

    #[test]
    fn home_user_token_wins() {
        let mut config = with_server();
        config.token = "account".to_string();
        assert_eq!(config.effective_token(), "account");
        config.home_user.access_token = "kid".to_string();
        assert_eq!(config.effective_token(), "kid");
    }

    #[test]
    fn library_view_mode_overrides_default() {
        let mut config = with_server();
        assert_eq!(config.library_view_mode("1"), ViewMode::Poster);
        config.set_library_view_mode("1", ViewMode::List);
        assert_eq!(config.library_view_mode("1"), ViewMode::List);
        assert_eq!(config.library_view_mode("2"), ViewMode::Poster);
    }

    #[test]
    fn save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = with_server();
        config.close_video_on_quit = true;
        config.set_library_hidden("7", true);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.close_video_on_quit);
        assert!(loaded.library_options("7").hidden);
    }

    #[test]
    fn name_format_without_icon_is_plain_name() {
        assert_eq!(LibraryNameFormat::IconOnly.apply("", "Movies"), "Movies");
        assert_eq!(LibraryNameFormat::NameIcon.apply("*", "Movies"), "Movies *");
    }
}
