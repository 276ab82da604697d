//! Command: deferred work that runs off the main loop and feeds its result
//! back as a Message.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::message::{Alert, Message};

/// Failures that stop an operation before any state is created. They surface
/// as blocking alerts rather than toasts.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Precondition {
    #[error("no active server configured; add one to {0}")]
    NoActiveServer(String),
    #[error("player binary not found: {0}")]
    PlayerMissing(String),
}

/// Turn an error into the alert the controller shows.
pub fn alert_for(err: &anyhow::Error) -> Alert {
    if let Some(p) = err.downcast_ref::<Precondition>() {
        Alert::blocking(p.to_string())
    } else {
        Alert::transient(format!("{err:#}"))
    }
}

type Task = BoxFuture<'static, Option<Message>>;

/// A batch of independent tasks. An empty batch does nothing.
#[must_use]
#[derive(Default)]
pub struct Command {
    tasks: Vec<Task>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Command {
    pub fn none() -> Self {
        Self::default()
    }

    /// Deliver `msg` on the next turn of the loop.
    pub fn message(msg: Message) -> Self {
        Self::perform(async move { msg })
    }

    pub fn perform<F>(fut: F) -> Self
    where
        F: Future<Output = Message> + Send + 'static,
    {
        Self {
            tasks: vec![fut.map(Some).boxed()],
        }
    }

    /// Side-effect only work; a `None` result enqueues nothing.
    pub fn optional<F>(fut: F) -> Self
    where
        F: Future<Output = Option<Message>> + Send + 'static,
    {
        Self {
            tasks: vec![fut.boxed()],
        }
    }

    /// Fallible work; an error becomes `Message::Error`.
    pub fn attempt<F>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<Message>> + Send + 'static,
    {
        Self::optional(async move {
            match fut.await {
                Ok(msg) => Some(msg),
                Err(e) => Some(Message::Error(alert_for(&e))),
            }
        })
    }

    /// Fallible work that may have nothing to report.
    pub fn attempt_optional<F>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<Option<Message>>> + Send + 'static,
    {
        Self::optional(async move {
            match fut.await {
                Ok(msg) => msg,
                Err(e) => Some(Message::Error(alert_for(&e))),
            }
        })
    }

    pub fn batch(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            tasks: commands.into_iter().flat_map(|c| c.tasks).collect(),
        }
    }

    pub fn and(mut self, other: Command) -> Self {
        self.tasks.extend(other.tasks);
        self
    }

    pub fn is_none(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Run every task to completion in order. Used by tests to drive a
    /// component without a runtime loop.
    pub async fn collect(self) -> Vec<Message> {
        let mut out = Vec::new();
        for task in self.tasks {
            if let Some(msg) = task.await {
                out.push(msg);
            }
        }
        out
    }
}

/// Runs commands on the tokio runtime and queues their results for the
/// controller.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Message>,
}

impl Dispatcher {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self { tx }
    }

    pub fn sender(&self) -> mpsc::Sender<Message> {
        self.tx.clone()
    }

    pub fn dispatch(&self, command: Command) {
        if command.is_none() {
            return;
        }
        debug!("Dispatcher: scheduling {} task(s)", command.len());
        for task in command.tasks {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                if let Some(msg) = task.await {
                    if tx.send(msg).await.is_err() {
                        warn!("Dispatcher: message queue closed, dropping result");
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn attempt_turns_errors_into_messages() {
        let msgs = Command::attempt(async { Err(anyhow::anyhow!("boom")) })
            .collect()
            .await;
        match &msgs[..] {
            [Message::Error(alert)] => {
                assert_eq!(alert.message, "boom");
                assert!(!alert.blocking);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn precondition_errors_are_blocking() {
        let msgs = Command::attempt(async {
            Err(anyhow::Error::new(Precondition::PlayerMissing("mpv".into())))
        })
        .collect()
        .await;
        assert!(matches!(&msgs[..], [Message::Error(a)] if a.blocking));
    }

    #[tokio::test]
    async fn batch_keeps_every_task() {
        let cmd = Command::batch([
            Command::message(Message::Tick),
            Command::none(),
            Command::optional(async { None }),
            Command::message(Message::Quit),
        ]);
        assert_eq!(cmd.len(), 3);
        assert_eq!(cmd.collect().await.len(), 2);
    }

    #[tokio::test]
    async fn dispatcher_delivers_to_queue() {
        let (tx, mut rx) = mpsc::channel(8);
        let dispatcher = Dispatcher::new(tx);
        dispatcher.dispatch(Command::batch([
            Command::message(Message::Tick),
            Command::message(Message::Tick),
        ]));
        for _ in 0..2 {
            assert!(matches!(rx.recv().await, Some(Message::Tick)));
        }
    }
}
