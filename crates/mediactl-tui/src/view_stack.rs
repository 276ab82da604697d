//! An ordered stack of frames; the top one receives input.

use crate::command::Command;
use crate::component::{Component, Transition};
use crate::message::Message;

#[derive(Default)]
pub struct ViewStack {
    frames: Vec<Box<dyn Component>>,
    size: Option<(u16, u16)>,
}

impl ViewStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame, run its init and, when the size is known, size it.
    pub fn push(&mut self, mut frame: Box<dyn Component>) -> Command {
        let mut cmd = frame.init();
        self.frames.push(frame);
        if let Some((width, height)) = self.size {
            let (resize_cmd, _) = self.forward(&Message::Resize { width, height });
            cmd = cmd.and(resize_cmd);
        }
        cmd
    }

    pub fn pop(&mut self) -> Option<Box<dyn Component>> {
        self.frames.pop()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn top(&self) -> Option<&dyn Component> {
        self.frames.last().map(|f| f.as_ref())
    }

    pub fn top_mut(&mut self) -> Option<&mut Box<dyn Component>> {
        self.frames.last_mut()
    }

    pub fn frames_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Component>> {
        self.frames.iter_mut()
    }

    pub fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = Some((width, height));
    }

    /// Hand `msg` to the top frame and apply its transition. Returns the
    /// resulting command and whether the frame dismissed itself.
    pub fn forward(&mut self, msg: &Message) -> (Command, bool) {
        let Some(top) = self.frames.last_mut() else {
            return (Command::none(), false);
        };
        match top.update(msg) {
            Transition::Stay(cmd) => (cmd, false),
            Transition::Replace(next, cmd) => {
                *top = next;
                (cmd, false)
            }
            Transition::Dismiss(cmd) => {
                self.frames.pop();
                (cmd, true)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scriptable frame for stack tests.

    use super::*;
    use crate::component::{RootChecker, Transition};
    use crate::theme::Theme;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{layout::Rect, Frame};
    use std::sync::{Arc, Mutex};

    pub fn key(c: char) -> Message {
        Message::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    /// Records what it receives; `x` dismisses, `n` replaces itself.
    #[derive(Clone, Default)]
    pub struct Probe {
        pub log: Arc<Mutex<Vec<String>>>,
        pub name: &'static str,
        pub depth: Arc<Mutex<usize>>,
    }

    impl Probe {
        pub fn named(name: &'static str) -> Self {
            Self {
                name,
                ..Default::default()
            }
        }

        pub fn seen(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Component for Probe {
        fn init(&mut self) -> Command {
            self.log.lock().unwrap().push(format!("{}:init", self.name));
            Command::none()
        }

        fn update(&mut self, msg: &Message) -> Transition {
            let entry = match msg {
                Message::Key(k) => match k.code {
                    KeyCode::Char(c) => format!("{}:key:{c}", self.name),
                    _ => format!("{}:key", self.name),
                },
                Message::Resize { width, height } => {
                    format!("{}:resize:{width}x{height}", self.name)
                }
                Message::Back => {
                    let mut depth = self.depth.lock().unwrap();
                    *depth = depth.saturating_sub(1);
                    format!("{}:back", self.name)
                }
                other => format!("{}:{other:?}", self.name),
            };
            self.log.lock().unwrap().push(entry);
            match msg {
                Message::Key(k) if k.code == KeyCode::Char('x') => Transition::dismiss(),
                Message::Key(k) if k.code == KeyCode::Char('n') => {
                    let mut next = self.clone();
                    next.name = "next";
                    Transition::Replace(Box::new(next), Command::none())
                }
                _ => Transition::none(),
            }
        }

        fn draw(&mut self, _frame: &mut Frame, _area: Rect, _theme: &Theme) {}

        fn preferred_size(&self) -> (u16, u16) {
            (20, 4)
        }

        fn as_root_checker(&self) -> Option<&dyn RootChecker> {
            Some(self)
        }
    }

    impl RootChecker for Probe {
        fn is_at_root(&self) -> bool {
            *self.depth.lock().unwrap() == 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn push_runs_init_and_sizes_when_known() {
        let mut stack = ViewStack::new();
        let a = Probe::named("a");
        let _ = stack.push(Box::new(a.clone()));
        assert_eq!(a.seen(), vec!["a:init"]);

        stack.set_size(80, 24);
        let b = Probe::named("b");
        let _ = stack.push(Box::new(b.clone()));
        assert_eq!(b.seen(), vec!["b:init", "b:resize:80x24"]);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn pop_on_empty_is_noop() {
        let mut stack = ViewStack::new();
        assert!(stack.pop().is_none());
        let (cmd, dismissed) = stack.forward(&key('a'));
        assert!(cmd.is_none());
        assert!(!dismissed);
    }

    #[test]
    fn replace_swaps_top() {
        let mut stack = ViewStack::new();
        let a = Probe::named("a");
        let _ = stack.push(Box::new(a.clone()));
        let _ = stack.forward(&key('n'));
        let _ = stack.forward(&key('z'));
        assert_eq!(stack.len(), 1);
        assert_eq!(a.seen(), vec!["a:init", "a:key:n", "next:key:z"]);
    }
}
