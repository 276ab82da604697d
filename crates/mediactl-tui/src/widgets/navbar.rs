//! Sidebar listing the tabs.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::Theme;
use crate::widgets::pane::{fit, pane};

pub const WIDTH: u16 = 24;

pub fn draw_navbar(frame: &mut Frame, area: Rect, labels: &[String], active: usize, theme: &Theme) {
    let block = pane("mediactl", false, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let lines: Vec<Line> = labels
        .iter()
        .enumerate()
        .take(inner.height as usize)
        .map(|(i, label)| {
            if i == active {
                Line::from(Span::styled(
                    fit(&format!("▌{label}"), width),
                    Style::default()
                        .fg(theme.accent)
                        .bg(theme.selection_bg)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(fit(&format!(" {label}"), width), theme.text()))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Tab index under a click at terminal row `y`, given the navbar's area.
pub fn hit_test(area: Rect, y: u16, tab_count: usize) -> Option<usize> {
    let top = area.y + 1;
    if y < top || y >= area.y + area.height.saturating_sub(1) {
        return None;
    }
    let idx = (y - top) as usize;
    (idx < tab_count).then_some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn hit_test_skips_border() {
        let area = Rect::new(0, 0, WIDTH, 10);
        assert_eq!(hit_test(area, 0, 3), None);
        assert_eq!(hit_test(area, 1, 3), Some(0));
        assert_eq!(hit_test(area, 3, 3), Some(2));
        assert_eq!(hit_test(area, 4, 3), None);
        assert_eq!(hit_test(area, 9, 30), None);
    }

    #[test]
    fn active_tab_is_marked() {
        let mut terminal = Terminal::new(TestBackend::new(WIDTH, 6)).unwrap();
        let labels = vec!["Home".to_string(), "Movies".to_string()];
        terminal
            .draw(|f| draw_navbar(f, f.area(), &labels, 1, &Theme::default()))
            .unwrap();
        let buf = terminal.backend().buffer();
        let row: String = (0..WIDTH).map(|x| buf[(x, 2)].symbol().to_string()).collect();
        assert!(row.contains("▌Movies"), "{row}");
    }
}
