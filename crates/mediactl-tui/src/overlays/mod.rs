//! Modal overlays pushed onto the navigator.

pub mod alert;
pub mod help;
pub mod libraries;
pub mod resume;
pub mod search;
pub mod settings;
pub mod user_picker;

/// The entry after (or before) `current` in `all`, wrapping around.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let Some(pos) = all.iter().position(|v| *v == current) else {
        return all.first().copied().unwrap_or(current);
    };
    let n = all.len();
    let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
    all[next]
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::message::Message;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    pub fn press(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    pub fn ch(c: char) -> Message {
        press(KeyCode::Char(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_both_ways() {
        let all = [1, 2, 3];
        assert_eq!(cycle(&all, 3, true), 1);
        assert_eq!(cycle(&all, 1, false), 3);
        assert_eq!(cycle(&all, 9, true), 1);
    }
}
