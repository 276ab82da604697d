//! Toast notifications: transient messages in the top-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn icon(self) -> &'static str {
        match self {
            Severity::Info => "·",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

/// Background work that stays on screen until it resolves.
struct Spinner {
    message: String,
    frame: usize,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinner: Option<Spinner>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinner: None,
            max_visible: 4,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, duration: Duration) {
        let msg = message.into();
        self.toasts.retain(|t| t.message != msg);
        self.toasts.push_back(Toast {
            message: msg,
            severity,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info, Duration::from_secs(3));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(8));
    }

    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some(Spinner {
            message: message.into(),
            frame: 0,
        });
    }

    /// Replace the spinner with a normal expiring toast.
    pub fn resolve_spinner(&mut self, severity: Severity, message: impl Into<String>) {
        self.spinner = None;
        self.push(message, severity, Duration::from_secs(3));
    }

    pub fn dismiss_spinner(&mut self) {
        self.spinner = None;
    }

    /// Drop expired toasts and advance the spinner.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        if let Some(ref mut s) = self.spinner {
            s.frame = (s.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    fn line_area(area: Rect, y: u16, text: &str, max_width: u16) -> Rect {
        let w = (text.chars().count() as u16 + 4).min(max_width);
        Rect {
            x: area.x + area.width.saturating_sub(w + 1),
            y,
            width: w,
            height: 1,
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if self.is_empty() || area.height < 2 {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 60).min(area.width);
        let bottom = area.y + area.height;
        let mut y = area.y + 1;

        if let Some(ref s) = self.spinner {
            let icon = SPINNER_FRAMES[s.frame % SPINNER_FRAMES.len()];
            let toast_area = Self::line_area(area, y, &s.message, max_width);
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!(" {} {} ", icon, &s.message),
                    Style::default()
                        .fg(theme.toast_info)
                        .add_modifier(Modifier::BOLD),
                ))),
                toast_area,
            );
            y += 1;
        }

        for toast in self.toasts.iter().rev().take(self.max_visible) {
            if y >= bottom {
                break;
            }
            let color = match toast.severity {
                Severity::Info => theme.toast_info,
                Severity::Success => theme.toast_success,
                Severity::Warning => theme.toast_warning,
                Severity::Error => theme.toast_error,
            };
            let toast_area = Self::line_area(area, y, &toast.message, max_width);
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!(" {} {} ", toast.severity.icon(), &toast.message),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))),
                toast_area,
            );
            y += 1;
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}
