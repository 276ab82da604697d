use mediactl_proto::protocol::Metadata;
use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::{fetch_detail, fmt_runtime, DETAIL_KEYS};
use crate::command::Command;
use crate::component::{Component, HelpProvider, PlayableProvider, Refreshable, Transition};
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::widgets::player_bar::fmt_time;

/// Summary page for a single movie, episode or other leaf item.
pub struct ItemDetail {
    ctx: AppContext,
    rating_key: String,
    item: Option<Metadata>,
    loading: bool,
}

impl ItemDetail {
    pub fn new(ctx: AppContext, rating_key: &str) -> Self {
        Self {
            ctx,
            rating_key: rating_key.to_string(),
            item: None,
            loading: false,
        }
    }

    fn lines(&self, item: &Metadata, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            item.display_title(),
            theme.accent_text().add_modifier(Modifier::BOLD),
        ))];

        let mut facts = Vec::new();
        if let Some(d) = item.duration {
            facts.push(fmt_runtime(d));
        }
        if let Some(r) = &item.content_rating {
            facts.push(r.clone());
        }
        if let Some(s) = &item.studio {
            facts.push(s.clone());
        }
        if let Some(res) = item.media.first().and_then(|m| m.video_resolution.clone()) {
            facts.push(res);
        }
        lines.push(Line::from(Span::styled(
            facts.join(" · "),
            theme.secondary_text(),
        )));

        if !item.genres.is_empty() {
            let genres: Vec<&str> = item.genres.iter().map(|g| g.tag.as_str()).collect();
            lines.push(Line::from(Span::styled(genres.join(", "), theme.muted_text())));
        }

        let state = if item.has_resume_point() {
            format!(
                "In progress · {}",
                fmt_time(item.view_offset.unwrap_or(0) as f64 / 1000.0)
            )
        } else if item.view_count.unwrap_or(0) > 0 {
            "Watched".to_string()
        } else {
            "Unwatched".to_string()
        };
        lines.push(Line::from(Span::styled(state, theme.text())));
        lines.push(Line::default());

        if let Some(summary) = &item.summary {
            lines.push(Line::from(Span::styled(summary.clone(), theme.text())));
        }
        if !item.is_playable() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "No playable media",
                Style::default().fg(theme.error),
            )));
        }
        lines
    }
}

impl Component for ItemDetail {
    fn init(&mut self) -> Command {
        if self.item.is_some() || self.loading {
            return Command::none();
        }
        self.loading = true;
        fetch_detail(&self.ctx, &self.rating_key, false)
    }

    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::DetailLoaded {
                rating_key, item, ..
            } if *rating_key == self.rating_key => {
                self.item = Some(item.as_ref().clone());
                self.loading = false;
                Transition::none()
            }
            Message::Key(key) => match key.code {
                KeyCode::Esc | KeyCode::Backspace => Command::message(Message::Back).into(),
                KeyCode::Char('B') => Command::message(Message::BackToLibrary).into(),
                KeyCode::Enter => Command::message(Message::RequestPlay {
                    rating_key: self.rating_key.clone(),
                    compact: false,
                })
                .into(),
                _ => Transition::none(),
            },
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let lines = match &self.item {
            Some(item) => self.lines(item, theme),
            None => vec![Line::from(Span::styled("Loading…", theme.muted_text()))],
        };
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }

    fn as_refreshable(&mut self) -> Option<&mut dyn Refreshable> {
        Some(self)
    }

    fn as_help_provider(&self) -> Option<&dyn HelpProvider> {
        Some(self)
    }

    fn as_playable(&self) -> Option<&dyn PlayableProvider> {
        Some(self)
    }
}

impl Refreshable for ItemDetail {
    fn refresh(&mut self) -> Command {
        self.loading = true;
        fetch_detail(&self.ctx, &self.rating_key, false)
    }
}

impl HelpProvider for ItemDetail {
    fn help_keys(&self) -> Vec<HelpKey> {
        DETAIL_KEYS.to_vec()
    }
}

impl PlayableProvider for ItemDetail {
    fn selected_metadata(&self) -> Option<Metadata> {
        self.item.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::context;

    #[test]
    fn ignores_other_items() {
        let mut detail = ItemDetail::new(context(), "5");
        let _ = detail.update(&Message::DetailLoaded {
            rating_key: "6".into(),
            item: Box::new(Metadata::default()),
            children: vec![],
        });
        assert!(detail.selected_metadata().is_none());

        let _ = detail.update(&Message::DetailLoaded {
            rating_key: "5".into(),
            item: Box::new(Metadata {
                rating_key: "5".into(),
                title: "Heat".into(),
                ..Default::default()
            }),
            children: vec![],
        });
        assert_eq!(detail.selected_metadata().unwrap().title, "Heat");
    }

    #[test]
    fn item_frames_are_always_at_root() {
        let detail = ItemDetail::new(context(), "5");
        assert!(detail.as_root_checker().is_none());
    }
}
