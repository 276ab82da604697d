//! Player bar: what is playing and how far along it is.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::player::PlayerStatus;
use crate::theme::Theme;
use crate::widgets::pane::truncate;
use mediactl_proto::protocol::PlaybackState;

pub const HEIGHT: u16 = 2;

pub fn draw_player_bar(frame: &mut Frame, area: Rect, status: &PlayerStatus, theme: &Theme) {
    if area.height == 0 || area.width < 8 {
        return;
    }
    let (icon, color) = match status.state {
        PlaybackState::Playing => ("▶", theme.playing),
        PlaybackState::Paused => ("⏸", theme.paused),
        PlaybackState::Stopped => ("■", theme.muted),
    };
    let mode = if status.compact { " [terminal]" } else { "" };
    let title_w = (area.width as usize).saturating_sub(4 + mode.len());
    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(
            truncate(&status.title, title_w),
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(mode, theme.muted_text()),
    ]);
    frame.render_widget(
        Paragraph::new(line),
        Rect {
            height: 1,
            ..area
        },
    );
    if area.height > 1 {
        let bar_area = Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        draw_progress(
            frame,
            bar_area,
            status.progress(),
            status.time_pos,
            status.duration,
            theme,
        );
    }
}

/// Render a smooth progress bar with elapsed and total labels.
pub fn draw_progress(
    frame: &mut Frame,
    area: Rect,
    progress: f64,
    time_pos: f64,
    duration: f64,
    theme: &Theme,
) {
    if area.width < 4 || area.height == 0 {
        return;
    }
    let left = fmt_time(time_pos);
    let right = fmt_time(duration);
    let label_w = (left.len() + right.len() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;
    let bar = progress_cells(progress, bar_w);

    let spans = vec![
        Span::styled(format!("{left} "), theme.secondary_text()),
        Span::styled(bar, Style::default().fg(theme.accent)),
        Span::styled(format!(" {right}"), theme.muted_text()),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Eighth-block fill of `width` cells.
fn progress_cells(progress: f64, width: usize) -> String {
    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full = eighths / 8;
    let mut bar = String::with_capacity(width * 3);
    for _ in 0..full {
        bar.push('█');
    }
    if full < width {
        bar.push(BLOCKS[eighths % 8]);
        for _ in (full + 1)..width {
            bar.push(' ');
        }
    }
    bar
}

pub fn fmt_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00".to_string();
    }
    let s = secs as u64;
    let h = s / 3600;
    let m = (s % 3600) / 60;
    let s = s % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
