//! Footer: key hints on the left, server on the right.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::message::HelpKey;
use crate::theme::Theme;

pub fn draw_footer(frame: &mut Frame, area: Rect, hints: &[HelpKey], server: &str, theme: &Theme) {
    let right = if server.is_empty() {
        String::new()
    } else {
        format!(" {server} ")
    };
    let budget = (area.width as usize).saturating_sub(right.width());

    let mut spans = Vec::new();
    let mut used = 0;
    for hint in hints {
        let w = hint.key.width() + hint.desc.width() + 3;
        if used + w > budget {
            break;
        }
        spans.push(Span::styled(
            format!(" {}", hint.key),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {} ", hint.desc), theme.muted_text()));
        used += w;
    }
    if !right.is_empty() {
        spans.push(Span::raw(" ".repeat(budget.saturating_sub(used))));
        spans.push(Span::styled(right, theme.secondary_text()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
