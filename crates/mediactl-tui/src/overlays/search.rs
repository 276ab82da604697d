//! Fuzzy search over the local index.

use std::sync::Arc;

use mediactl_proto::search::{SearchHit, SearchIndex};
use ratatui::crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::command::Command;
use crate::component::{Component, Transition};
use crate::message::Message;
use crate::theme::Theme;
use crate::widgets::filter_input::{FilterInput, InputAction};
use crate::widgets::pane::fit;
use crate::widgets::scrollable_list::ScrollableList;

const MAX_RESULTS: usize = 50;

pub struct SearchOverlay {
    index: Arc<SearchIndex>,
    input: FilterInput,
    results: ScrollableList<SearchHit>,
}

impl SearchOverlay {
    pub fn new(index: Arc<SearchIndex>) -> Self {
        Self {
            index,
            input: FilterInput::new("/ ", "search titles"),
            results: ScrollableList::new(),
        }
    }

    fn run_query(&mut self, query: &str) {
        self.results.set_items(self.index.search(query, MAX_RESULTS));
        self.results.select_first();
    }

    fn choose(&self) -> Transition {
        match self.results.selected_item() {
            Some(hit) => Transition::Dismiss(Command::message(Message::SelectMedia {
                rating_key: hit.entry.rating_key.clone(),
                kind: hit.entry.kind.clone(),
                section_id: Some(hit.entry.section_id.clone()),
            })),
            None => Transition::none(),
        }
    }
}

impl Component for SearchOverlay {
    fn update(&mut self, msg: &Message) -> Transition {
        let Message::Key(key) = msg else {
            return Transition::none();
        };
        match key.code {
            KeyCode::Up => {
                self.results.select_up(1);
                return Transition::none();
            }
            KeyCode::Down => {
                self.results.select_down(1);
                return Transition::none();
            }
            _ => {}
        }
        match self.input.handle_key(*key) {
            InputAction::Changed(q) => {
                self.run_query(&q);
                Transition::none()
            }
            InputAction::Confirmed(_) => self.choose(),
            InputAction::Cancelled => Transition::dismiss(),
            InputAction::None => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [input, results] =
            Layout::vertical([Constraint::Length(2), Constraint::Min(1)]).areas(area);
        self.input.draw(
            frame,
            Rect {
                height: 1,
                ..input
            },
            theme,
        );

        if self.results.is_empty() {
            let hint = if self.index.is_empty() {
                "The index is empty; it is built in the background after startup"
            } else if self.input.text().is_empty() {
                "Type to search"
            } else {
                "No matches"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(hint, theme.muted_text())),
                results,
            );
            return;
        }
        let height = results.height as usize;
        let width = results.width as usize;
        self.results.ensure_visible(height);
        let selected = self.results.selected;
        let lines: Vec<Line> = self
            .results
            .visible_items(height)
            .into_iter()
            .map(|(i, hit)| {
                let e = &hit.entry;
                let year = e.year.map(|y| format!(" ({y})")).unwrap_or_default();
                let style = if i == selected {
                    theme.selected()
                } else {
                    theme.text()
                };
                Line::from(vec![
                    Span::styled(fit(&format!("{}{year}", e.title), width.saturating_sub(10)), style),
                    Span::styled(format!(" {:>8}", e.kind), theme.muted_text()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), results);
    }

    fn title(&self) -> String {
        "Search".to_string()
    }

    fn preferred_size(&self) -> (u16, u16) {
        (70, 22)
    }
}
