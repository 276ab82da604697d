//! Component trait: the interface every tab, overlay and detail frame
//! implements, and the optional capabilities a component may expose.
//!
//! Components own their state and render themselves. They never touch shared
//! state directly: anything that has to happen elsewhere is returned as a
//! `Command` whose `Message` re-enters the loop.

use mediactl_proto::protocol::Metadata;
use ratatui::{layout::Rect, Frame};

use crate::command::Command;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;

/// What a component wants done with itself after handling a message.
#[must_use]
pub enum Transition {
    Stay(Command),
    /// Swap this component for another one in the same slot.
    Replace(Box<dyn Component>, Command),
    /// Remove this component from its stack.
    Dismiss(Command),
}

impl Transition {
    pub fn none() -> Self {
        Transition::Stay(Command::none())
    }

    pub fn dismiss() -> Self {
        Transition::Dismiss(Command::none())
    }
}

impl From<Command> for Transition {
    fn from(cmd: Command) -> Self {
        Transition::Stay(cmd)
    }
}

pub trait Component: Send {
    /// Called when the component becomes visible. Must be safe to call
    /// repeatedly.
    fn init(&mut self) -> Command {
        Command::none()
    }

    fn update(&mut self, msg: &Message) -> Transition;

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Border title when shown as an overlay.
    fn title(&self) -> String {
        String::new()
    }

    /// Outer size (width, height) wanted when shown as an overlay.
    fn preferred_size(&self) -> (u16, u16) {
        (60, 20)
    }

    fn as_root_checker(&self) -> Option<&dyn RootChecker> {
        None
    }

    fn as_refreshable(&mut self) -> Option<&mut dyn Refreshable> {
        None
    }

    fn as_help_provider(&self) -> Option<&dyn HelpProvider> {
        None
    }

    fn as_playable(&self) -> Option<&dyn PlayableProvider> {
        None
    }

    fn as_detail_host(&mut self) -> Option<&mut dyn DetailHost> {
        None
    }
}

// ── Capabilities ──────────────────────────────────────────────────────────────

/// Decides whether a generic back signal pops the frame or is handled inside.
pub trait RootChecker {
    fn is_at_root(&self) -> bool;
}

pub trait Refreshable {
    fn refresh(&mut self) -> Command;
}

pub trait HelpProvider {
    fn help_keys(&self) -> Vec<HelpKey>;
}

pub trait PlayableProvider {
    fn selected_metadata(&self) -> Option<Metadata>;
}

/// A tab that can open item details for its library.
pub trait DetailHost {
    fn section_id(&self) -> &str;
    fn show_detail(&mut self, rating_key: &str, kind: &str) -> Command;
    fn detail_depth(&self) -> usize;
}
