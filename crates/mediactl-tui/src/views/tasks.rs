//! Tasks tab: the server's maintenance jobs.

use mediactl_proto::protocol::ButlerTask;
use ratatui::crossterm::event::KeyCode;
use ratatui::{layout::Rect, Frame};

use crate::command::Command;
use crate::component::{Component, HelpProvider, Refreshable, Transition};
use crate::context::AppContext;
use crate::message::{HelpKey, Message};
use crate::theme::Theme;
use crate::views::RemoteList;

pub struct TasksView {
    ctx: AppContext,
    tasks: RemoteList<ButlerTask>,
}

impl TasksView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            tasks: RemoteList::new(),
        }
    }

    fn fetch(&mut self) -> Command {
        self.tasks.loading = true;
        let client = self.ctx.client.clone();
        Command::attempt(async move { Ok(Message::TasksLoaded(client.butler_tasks().await?)) })
    }

    fn run_selected(&self) -> Command {
        let Some(task) = self.tasks.selected() else {
            return Command::none();
        };
        let client = self.ctx.client.clone();
        let name = task.name.clone();
        let title = if task.title.is_empty() {
            task.name.clone()
        } else {
            task.title.clone()
        };
        Command::attempt(async move {
            client.run_task(&name).await?;
            Ok(Message::TaskStarted(title))
        })
    }
}

fn row(task: &ButlerTask) -> String {
    let state = if task.enabled { "on " } else { "off" };
    let every = task
        .interval
        .map(|d| format!("every {d}d"))
        .unwrap_or_default();
    let title = if task.title.is_empty() {
        &task.name
    } else {
        &task.title
    };
    format!("{state}  {title:<36} {every:<10} {}", task.description)
}

impl Component for TasksView {
    fn init(&mut self) -> Command {
        if self.tasks.loading || !self.tasks.list.is_empty() {
            return Command::none();
        }
        self.fetch()
    }

    fn update(&mut self, msg: &Message) -> Transition {
        match msg {
            Message::TasksLoaded(tasks) => {
                self.tasks.loaded(tasks.clone());
                Transition::none()
            }
            Message::Key(key) => {
                if self.tasks.handle_key(key.code) {
                    return Transition::none();
                }
                match key.code {
                    KeyCode::Enter => self.run_selected().into(),
                    _ => Transition::none(),
                }
            }
            Message::Mouse(event) => {
                self.tasks.handle_mouse(event);
                Transition::none()
            }
            _ => Transition::none(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.tasks.draw(frame, area, theme, "No tasks", row);
    }

    fn as_refreshable(&mut self) -> Option<&mut dyn Refreshable> {
        Some(self)
    }

    fn as_help_provider(&self) -> Option<&dyn HelpProvider> {
        Some(self)
    }
}

impl Refreshable for TasksView {
    fn refresh(&mut self) -> Command {
        self.fetch()
    }
}

impl HelpProvider for TasksView {
    fn help_keys(&self) -> Vec<HelpKey> {
        vec![HelpKey::new("enter", "run task"), HelpKey::new("r", "refresh")]
    }
}
