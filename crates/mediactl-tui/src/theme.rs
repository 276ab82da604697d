//! Named color palettes and the styles built from them.

use ratatui::style::{Color, Modifier, Style};

pub const DEFAULT_THEME: &str = "default";

/// Every palette the settings overlay offers, in display order.
pub const THEME_NAMES: &[&str] = &["default", "nord", "gruvbox", "mono"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub accent: Color,
    pub playing: Color,
    pub paused: Color,
    pub error: Color,
    pub muted: Color,
    pub secondary: Color,
    pub primary: Color,
    pub selection_bg: Color,
    pub border: Color,
    pub border_focused: Color,
    pub filter_bg: Color,
    pub filter_fg: Color,
    pub toast_info: Color,
    pub toast_success: Color,
    pub toast_warning: Color,
    pub toast_error: Color,
}

// ── Palettes ──────────────────────────────────────────────────────────────────

const DEFAULT: Theme = Theme {
    name: "default",
    accent: Color::Rgb(229, 160, 13),
    playing: Color::Rgb(80, 200, 120),
    paused: Color::Rgb(255, 184, 80),
    error: Color::Rgb(255, 80, 80),
    muted: Color::Rgb(72, 72, 88),
    secondary: Color::Rgb(115, 115, 138),
    primary: Color::Rgb(210, 210, 225),
    selection_bg: Color::Rgb(28, 28, 40),
    border: Color::Rgb(40, 40, 52),
    border_focused: Color::Rgb(229, 160, 13),
    filter_bg: Color::Rgb(20, 20, 32),
    filter_fg: Color::Rgb(255, 200, 80),
    toast_info: Color::Rgb(80, 160, 220),
    toast_success: Color::Rgb(80, 200, 120),
    toast_warning: Color::Rgb(255, 184, 80),
    toast_error: Color::Rgb(255, 95, 95),
};

const NORD: Theme = Theme {
    name: "nord",
    accent: Color::Rgb(136, 192, 208),
    playing: Color::Rgb(163, 190, 140),
    paused: Color::Rgb(235, 203, 139),
    error: Color::Rgb(191, 97, 106),
    muted: Color::Rgb(76, 86, 106),
    secondary: Color::Rgb(129, 161, 193),
    primary: Color::Rgb(236, 239, 244),
    selection_bg: Color::Rgb(59, 66, 82),
    border: Color::Rgb(67, 76, 94),
    border_focused: Color::Rgb(136, 192, 208),
    filter_bg: Color::Rgb(59, 66, 82),
    filter_fg: Color::Rgb(235, 203, 139),
    toast_info: Color::Rgb(94, 129, 172),
    toast_success: Color::Rgb(163, 190, 140),
    toast_warning: Color::Rgb(235, 203, 139),
    toast_error: Color::Rgb(191, 97, 106),
};

const GRUVBOX: Theme = Theme {
    name: "gruvbox",
    accent: Color::Rgb(254, 128, 25),
    playing: Color::Rgb(184, 187, 38),
    paused: Color::Rgb(250, 189, 47),
    error: Color::Rgb(251, 73, 52),
    muted: Color::Rgb(102, 92, 84),
    secondary: Color::Rgb(168, 153, 132),
    primary: Color::Rgb(235, 219, 178),
    selection_bg: Color::Rgb(60, 56, 54),
    border: Color::Rgb(80, 73, 69),
    border_focused: Color::Rgb(254, 128, 25),
    filter_bg: Color::Rgb(50, 48, 47),
    filter_fg: Color::Rgb(250, 189, 47),
    toast_info: Color::Rgb(131, 165, 152),
    toast_success: Color::Rgb(184, 187, 38),
    toast_warning: Color::Rgb(250, 189, 47),
    toast_error: Color::Rgb(251, 73, 52),
};

const MONO: Theme = Theme {
    name: "mono",
    accent: Color::White,
    playing: Color::White,
    paused: Color::Gray,
    error: Color::White,
    muted: Color::DarkGray,
    secondary: Color::Gray,
    primary: Color::White,
    selection_bg: Color::DarkGray,
    border: Color::DarkGray,
    border_focused: Color::White,
    filter_bg: Color::Reset,
    filter_fg: Color::White,
    toast_info: Color::Gray,
    toast_success: Color::White,
    toast_warning: Color::White,
    toast_error: Color::White,
};

impl Theme {
    /// Look up a palette by name; unknown names fall back to the default.
    pub fn named(name: &str) -> Self {
        match name {
            "nord" => NORD,
            "gruvbox" => GRUVBOX,
            "mono" => MONO,
            _ => DEFAULT,
        }
    }

    // ── Predefined styles ─────────────────────────────────────────────────────

    pub fn text(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn secondary_text(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn muted_text(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn accent_text(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn filter(&self) -> Style {
        Style::default().fg(self.filter_fg).bg(self.filter_bg)
    }
}

impl Default for Theme {
    fn default() -> Self {
        DEFAULT
    }
}
