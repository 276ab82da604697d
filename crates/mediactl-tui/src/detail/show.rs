use mediactl_proto::protocol::Metadata;
use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::{fetch_detail, fmt_runtime, DETAIL_KEYS};
use crate::command::Command;
use crate::component::{
    Component, HelpProvider, PlayableProvider, Refreshable, RootChecker, Transition,
};
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::widgets::pane::{fit, truncate};
use crate::widgets::scrollable_list::ScrollableList;

struct Season {
    meta: Metadata,
    episodes: ScrollableList<Metadata>,
    loading: bool,
}

/// A show and its seasons. Opening a season drills down inside this frame.
pub struct ShowDetail {
    ctx: AppContext,
    rating_key: String,
    show: Option<Metadata>,
    seasons: ScrollableList<Metadata>,
    season: Option<Season>,
    loading: bool,
    page: usize,
}

impl ShowDetail {
    pub fn new(ctx: AppContext, rating_key: &str) -> Self {
        Self {
            ctx,
            rating_key: rating_key.to_string(),
            show: None,
            seasons: ScrollableList::new(),
            season: None,
            loading: false,
            page: 10,
        }
    }

    fn open_season(&mut self) -> Command {
        let Some(meta) = self.seasons.selected_item().cloned() else {
            return Command::none();
        };
        let cmd = fetch_detail(&self.ctx, &meta.rating_key, true);
        self.season = Some(Season {
            meta,
            episodes: ScrollableList::new(),
            loading: true,
        });
        cmd
    }

    fn on_loaded(&mut self, rating_key: &str, item: &Metadata, children: &[Metadata]) {
        if rating_key == self.rating_key {
            self.show = Some(item.clone());
            self.seasons.set_items(children.to_vec());
            self.loading = false;
        }
        if let Some(season) = self.season.as_mut() {
            if season.meta.rating_key == rating_key {
                season.meta = item.clone();
                season.episodes.set_items(children.to_vec());
                season.loading = false;
            }
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(show) = &self.show else {
            frame.render_widget(
                Paragraph::new(Span::styled("Loading…", theme.muted_text())),
                area,
            );
            return;
        };
        let mut title = vec![Span::styled(
            show.display_title(),
            theme.accent_text().add_modifier(Modifier::BOLD),
        )];
        if let Some(season) = &self.season {
            title.push(Span::styled(" › ", theme.muted_text()));
            title.push(Span::styled(season.meta.title.clone(), theme.text()));
        }
        let mut lines = vec![Line::from(title)];
        let mut facts = Vec::new();
        if let Some(studio) = &show.studio {
            facts.push(studio.clone());
        }
        if let Some(rating) = &show.content_rating {
            facts.push(rating.clone());
        }
        if let (Some(leaves), Some(viewed)) = (show.leaf_count, show.viewed_leaf_count) {
            facts.push(format!("{viewed}/{leaves} watched"));
        }
        lines.push(Line::from(Span::styled(
            facts.join(" · "),
            theme.secondary_text(),
        )));
        if let Some(summary) = &show.summary {
            lines.push(Line::from(Span::styled(summary.clone(), theme.text())));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }
}

fn season_row(season: &Metadata) -> String {
    let count = match (season.leaf_count, season.viewed_leaf_count) {
        (Some(l), Some(v)) => format!("  {v}/{l}"),
        (Some(l), None) => format!("  {l} episodes"),
        _ => String::new(),
    };
    format!("{}{count}", season.title)
}

fn episode_row(ep: &Metadata) -> String {
    let watched = if ep.view_count.unwrap_or(0) > 0 {
        "✓"
    } else if ep.has_resume_point() {
        "◐"
    } else {
        " "
    };
    let runtime = ep.duration.map(fmt_runtime).unwrap_or_default();
    format!("{watched} E{:02} {}  {runtime}", ep.index.unwrap_or(0), ep.title)
}

impl Component for ShowDetail {
    fn init(&mut self) -> Command {
        if self.show.is_some() || self.loading {
            return Command::none();
        }
        self.loading = true;
        fetch_detail(&self.ctx, &self.rating_key, true)
    }

    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::DetailLoaded {
                rating_key,
                item,
                children,
            } => {
                self.on_loaded(rating_key, item, children);
                Transition::none()
            }
            Message::Back => {
                self.season = None;
                Transition::none()
            }
            Message::Key(key) => {
                let page = self.page;
                let list = match self.season.as_mut() {
                    Some(season) => &mut season.episodes,
                    None => &mut self.seasons,
                };
                if list.handle_nav_key(key.code, page) {
                    return Transition::none();
                }
                match key.code {
                    KeyCode::Esc | KeyCode::Backspace => Command::message(Message::Back).into(),
                    KeyCode::Char('B') => Command::message(Message::BackToLibrary).into(),
                    KeyCode::Enter => match &self.season {
                        Some(season) => match season.episodes.selected_item() {
                            Some(ep) => Command::message(Message::RequestPlay {
                                rating_key: ep.rating_key.clone(),
                                compact: false,
                            })
                            .into(),
                            None => Transition::none(),
                        },
                        None => self.open_season().into(),
                    },
                    _ => Transition::none(),
                }
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .areas(area);
        self.draw_header(frame, header, theme);

        let height = body.height as usize;
        self.page = height.saturating_sub(1).max(1);
        let width = body.width as usize;
        let (list, loading, row): (&mut ScrollableList<Metadata>, bool, fn(&Metadata) -> String) =
            match self.season.as_mut() {
                Some(season) => (&mut season.episodes, season.loading, episode_row),
                None => (&mut self.seasons, self.loading, season_row),
            };
        if list.is_empty() {
            let text = if loading { "Loading…" } else { "Nothing here" };
            frame.render_widget(Paragraph::new(Span::styled(text, theme.muted_text())), body);
            return;
        }
        list.ensure_visible(height);
        let selected = list.selected;
        let lines: Vec<Line> = list
            .visible_items(height)
            .into_iter()
            .map(|(i, item)| {
                let style = if i == selected {
                    theme.selected()
                } else {
                    theme.text()
                };
                Line::from(Span::styled(fit(&row(item), width), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), body);

        let summary = list
            .selected_item()
            .and_then(|m| m.summary.clone())
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(Span::styled(
                truncate(&summary, width * 3),
                theme.secondary_text(),
            ))
            .wrap(Wrap { trim: true }),
            footer,
        );
    }

    fn as_root_checker(&self) -> Option<&dyn RootChecker> {
        Some(self)
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

impl RootChecker for ShowDetail {
    fn is_at_root(&self) -> bool {
        self.season.is_none()
    }
}

impl Refreshable for ShowDetail {
    fn refresh(&mut self) -> Command {
        match self.season.as_mut() {
            Some(season) => {
                season.loading = true;
                fetch_detail(&self.ctx, &season.meta.rating_key, true)
            }
            None => {
                self.loading = true;
                fetch_detail(&self.ctx, &self.rating_key, true)
            }
        }
    }
}

impl HelpProvider for ShowDetail {
    fn help_keys(&self) -> Vec<HelpKey> {
        DETAIL_KEYS.to_vec()
    }
}

impl PlayableProvider for ShowDetail {
    fn selected_metadata(&self) -> Option<Metadata> {
        match &self.season {
            Some(season) => season.episodes.selected_item().cloned(),
            None => self.seasons.selected_item().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::context;
    use crate::detail::DetailManager;
    use ratatui::crossterm::event::{KeyEvent, KeyModifiers};

    fn meta(key: &str, title: &str) -> Metadata {
        Metadata {
            rating_key: key.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    fn press(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn loaded(key: &str, children: Vec<Metadata>) -> Message {
        Message::DetailLoaded {
            rating_key: key.into(),
            item: Box::new(meta(key, "x")),
            children,
        }
    }

    #[tokio::test]
    async fn season_drill_down_absorbs_back() {
        let mut details = DetailManager::new();
        let _ = details.push(Box::new(ShowDetail::new(context(), "10")));
        let _ = details.update(&loaded("10", vec![meta("11", "Season 1"), meta("12", "Season 2")]));

        let _ = details.update(&press(KeyCode::Down));
        let _ = details.update(&press(KeyCode::Enter));
        let _ = details.update(&loaded("12", vec![meta("120", "Pilot")]));
        let top = details.top().unwrap();
        assert!(!top.as_root_checker().unwrap().is_at_root());
        assert_eq!(
            top.as_playable().unwrap().selected_metadata().unwrap().rating_key,
            "120"
        );

        let _ = details.update(&Message::Back);
        assert_eq!(details.depth(), 1);
        assert!(details.top().unwrap().as_root_checker().unwrap().is_at_root());

        let _ = details.update(&Message::Back);
        assert_eq!(details.depth(), 0);
    }

    #[tokio::test]
    async fn episode_enter_requests_play() {
        let mut show = ShowDetail::new(context(), "10");
        let _ = show.update(&loaded("10", vec![meta("11", "Season 1")]));
        let _ = show.update(&press(KeyCode::Enter));
        let _ = show.update(&loaded("11", vec![meta("111", "Pilot")]));
        let Transition::Stay(cmd) = show.update(&press(KeyCode::Enter)) else {
            panic!("expected stay");
        };
        let msgs = cmd.collect().await;
        assert!(matches!(
            msgs.as_slice(),
            [Message::RequestPlay { rating_key, compact: false }] if rating_key == "111"
        ));
    }

    #[tokio::test]
    async fn escape_emits_back() {
        let mut show = ShowDetail::new(context(), "10");
        let Transition::Stay(cmd) = show.update(&press(KeyCode::Esc)) else {
            panic!("expected stay");
        };
        assert!(matches!(cmd.collect().await.as_slice(), [Message::Back]));
    }
}
