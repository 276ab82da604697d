//! In-process stand-in for mpv's JSON IPC server, plus fake launcher and
//! progress sink for driving the player manager in tests.

use mediactl_proto::protocol::TimelineReport;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, watch};

use super::launcher::Launcher;
use super::report::ProgressSink;
use crate::command::Precondition;

#[derive(Debug, Clone)]
enum FakeEvent {
    Property(String, Value),
    Raw(Value),
}

struct FakeState {
    path: PathBuf,
    props: Mutex<Map<String, Value>>,
    commands: Mutex<Vec<Value>>,
    live_clients: AtomicUsize,
    unresponsive: AtomicBool,
    events: broadcast::Sender<FakeEvent>,
    dead: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct FakePlayer {
    state: Arc<FakeState>,
}

impl FakePlayer {
    /// Bind `path` and start serving. Must run inside a tokio runtime.
    pub fn start(path: &Path) -> Self {
        let listener = UnixListener::bind(path).unwrap();
        let (events, _) = broadcast::channel(64);
        let (dead, _) = watch::channel(false);
        let mut props = Map::new();
        props.insert("mpv-version".into(), json!("mpv 0.38.0"));
        props.insert("pause".into(), json!(false));
        props.insert("idle-active".into(), json!(true));
        let state = Arc::new(FakeState {
            path: path.to_path_buf(),
            props: Mutex::new(props),
            commands: Mutex::new(Vec::new()),
            live_clients: AtomicUsize::new(0),
            unresponsive: AtomicBool::new(false),
            events,
            dead,
        });
        tokio::spawn(accept_loop(listener, state.clone()));
        Self { state }
    }

    pub fn set_prop(&self, name: &str, value: Value) {
        self.state.props.lock().unwrap().insert(name.into(), value);
    }

    pub fn prop(&self, name: &str) -> Option<Value> {
        self.state.props.lock().unwrap().get(name).cloned()
    }

    pub fn emit(&self, event: Value) {
        let _ = self.state.events.send(FakeEvent::Raw(event));
    }

    pub fn commands_named(&self, name: &str) -> Vec<Value> {
        self.state
            .commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c[0] == name)
            .cloned()
            .collect()
    }

    pub fn live_clients(&self) -> usize {
        self.state.live_clients.load(Ordering::SeqCst)
    }

    pub fn set_unresponsive(&self, on: bool) {
        self.state.unresponsive.store(on, Ordering::SeqCst);
    }

    pub fn is_dead(&self) -> bool {
        *self.state.dead.borrow()
    }

    /// Crash: drop every connection without a shutdown event.
    pub fn kill(&self) {
        self.state.die();
    }
}

impl FakeState {
    fn die(&self) {
        self.dead.send_replace(true);
        let _ = std::fs::remove_file(&self.path);
    }

    fn set_and_broadcast(&self, name: &str, value: Value) {
        self.props.lock().unwrap().insert(name.into(), value.clone());
        let _ = self.events.send(FakeEvent::Property(name.into(), value));
    }

    /// Answer one request. Returns the lines to write and whether to quit.
    fn handle(&self, line: &str, observed: &mut Vec<(u64, String)>) -> (Vec<Value>, bool) {
        let Ok(req) = serde_json::from_str::<Value>(line) else {
            return (Vec::new(), false);
        };
        let id = req["request_id"].clone();
        let cmd = req["command"].clone();
        self.commands.lock().unwrap().push(cmd.clone());

        let ok = |data: Value| json!({"request_id": id, "error": "success", "data": data});
        let mut out = Vec::new();
        let mut quit = false;
        match cmd[0].as_str().unwrap_or_default() {
            "get_property" => {
                let name = cmd[1].as_str().unwrap_or_default();
                match self.props.lock().unwrap().get(name) {
                    Some(v) => out.push(ok(v.clone())),
                    None => out.push(json!({"request_id": id, "error": "property unavailable"})),
                }
            }
            "set_property" => {
                let name = cmd[1].as_str().unwrap_or_default().to_string();
                out.push(ok(Value::Null));
                self.set_and_broadcast(&name, cmd[2].clone());
            }
            "observe_property" => {
                let obs_id = cmd[1].as_u64().unwrap_or_default();
                let name = cmd[2].as_str().unwrap_or_default().to_string();
                out.push(ok(Value::Null));
                let current = self.props.lock().unwrap().get(&name).cloned();
                out.push(json!({
                    "event": "property-change", "id": obs_id, "name": name,
                    "data": current.unwrap_or(Value::Null)
                }));
                observed.push((obs_id, name));
            }
            "loadfile" => {
                let start = cmd[4]
                    .as_str()
                    .and_then(|o| o.strip_prefix("start="))
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(0.0);
                out.push(ok(Value::Null));
                self.set_and_broadcast("path", cmd[1].clone());
                self.set_and_broadcast("idle-active", json!(false));
                self.set_and_broadcast("time-pos", json!(start));
                self.set_and_broadcast("duration", json!(1800.0));
            }
            "quit" => {
                out.push(ok(Value::Null));
                out.push(json!({"event": "shutdown"}));
                quit = true;
            }
            _ => out.push(ok(Value::Null)),
        }
        (out, quit)
    }
}

async fn accept_loop(listener: UnixListener, state: Arc<FakeState>) {
    let mut dead = state.dead.subscribe();
    loop {
        tokio::select! {
            _ = dead.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    tokio::spawn(serve_client(stream, state.clone()));
                }
                Err(_) => break,
            }
        }
    }
}

async fn write_line(w: &mut OwnedWriteHalf, v: &Value) -> bool {
    w.write_all(format!("{v}\n").as_bytes()).await.is_ok()
}

async fn serve_client(stream: UnixStream, state: Arc<FakeState>) {
    state.live_clients.fetch_add(1, Ordering::SeqCst);
    let mut events = state.events.subscribe();
    let mut dead = state.dead.subscribe();
    let (r, mut w) = stream.into_split();
    let mut lines = BufReader::new(r).lines();
    let mut observed: Vec<(u64, String)> = Vec::new();

    loop {
        tokio::select! {
            _ = dead.changed() => break,
            event = events.recv() => {
                let line = match event {
                    Ok(FakeEvent::Raw(v)) => v,
                    Ok(FakeEvent::Property(name, data)) => {
                        let Some((id, _)) = observed.iter().find(|(_, n)| *n == name) else {
                            continue;
                        };
                        json!({"event": "property-change", "id": id, "name": name, "data": data})
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if !write_line(&mut w, &line).await {
                    break;
                }
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if state.unresponsive.load(Ordering::SeqCst) {
                    continue;
                }
                let (out, quit) = state.handle(&line, &mut observed);
                for v in &out {
                    let _ = write_line(&mut w, v).await;
                }
                if quit {
                    state.die();
                    break;
                }
            }
        }
    }
    state.live_clients.fetch_sub(1, Ordering::SeqCst);
}

#[derive(Default)]
pub struct FakeLauncher {
    pub missing: AtomicBool,
    /// Launch succeeds but nothing ever listens.
    pub silent: AtomicBool,
    launches: Mutex<Vec<bool>>,
    players: Mutex<Vec<FakePlayer>>,
}

impl FakeLauncher {
    pub fn launches(&self) -> Vec<bool> {
        self.launches.lock().unwrap().clone()
    }

    pub fn player(&self, i: usize) -> FakePlayer {
        self.players.lock().unwrap()[i].clone()
    }
}

impl Launcher for FakeLauncher {
    fn ensure_available(&self) -> anyhow::Result<()> {
        if self.missing.load(Ordering::SeqCst) {
            return Err(Precondition::PlayerMissing("mpv".into()).into());
        }
        Ok(())
    }

    fn launch(&self, socket: &Path, compact: bool) -> anyhow::Result<()> {
        self.launches.lock().unwrap().push(compact);
        if !self.silent.load(Ordering::SeqCst) {
            let player = FakePlayer::start(socket);
            self.players.lock().unwrap().push(player);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingSink {
    reports: Mutex<Vec<TimelineReport>>,
}

impl CountingSink {
    pub fn reports(&self) -> Vec<TimelineReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn count_for(&self, key: &str) -> usize {
        self.reports()
            .iter()
            .filter(|r| r.rating_key == key)
            .count()
    }
}

impl ProgressSink for CountingSink {
    fn report(&self, report: TimelineReport) {
        self.reports.lock().unwrap().push(report);
    }
}
