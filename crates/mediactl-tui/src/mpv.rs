/// mpv JSON IPC client with separated reader/writer tasks.
///
/// ```text
///   mpv::connect(path)
///         │
///         ├── writer_task   ← receives PendingRequest via mpsc, writes JSON lines
///         └── reader_task   ← reads JSON lines from the socket
///                                ├── response (has request_id) → matched oneshot::Sender
///                                └── event / property-change   → event_tx channel
/// ```
///
/// `MpvHandle` is cheaply cloneable. The event channel closes when the
/// connection does, which is how listeners notice a dead player.
///
/// Platform notes:
/// - Unix:    Unix domain sockets
/// - Windows: Named pipes  \\.\pipe\<name>
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

// ── global request-id counter ─────────────────────────────────────────────────

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ── observation property IDs ──────────────────────────────────────────────────

pub const OBS_TIME_POS: u64 = 1;
pub const OBS_PAUSE: u64 = 2;
pub const OBS_DURATION: u64 = 3;

/// Namespace for the item metadata stored on the player process.
pub const USER_DATA_PREFIX: &str = "user-data/mediactl";

// ── internal channel types ────────────────────────────────────────────────────

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String, // serialised JSON line (already has '\n')
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// An event or property-change that arrived unsolicited (no request_id).
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// Returns `Some((obs_id, data))` if this is a property-change event.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.raw.get("event")?.as_str()? == "property-change" {
            let id = self.raw.get("id")?.as_u64()?;
            let data = self.raw.get("data").unwrap_or(&Value::Null);
            Some((id, data))
        } else {
            None
        }
    }

    /// Returns the event name, e.g. "end-file", "shutdown".
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }
}

// ── public handle ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
    reader: Arc<AbortHandle>,
}

impl MpvHandle {
    /// Send a command and wait for its response. Resolves to the full
    /// response object on `"error": "success"`.
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let msg = json!({ "command": command, "request_id": req_id });
        let mut raw = serde_json::to_string(&msg)?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;

        tokio::time::timeout(REQUEST_TIMEOUT, reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    /// Stop reading from the socket. The connection closes once every clone
    /// of the handle is dropped.
    pub fn close(&self) {
        self.reader.abort();
    }
}

// ── connect ──────────────────────────────────────────────────────────────────

#[cfg(unix)]
pub async fn connect(path: &Path, event_tx: mpsc::Sender<MpvEvent>) -> anyhow::Result<MpvHandle> {
    let stream = UnixStream::connect(path).await?;
    debug!("mpv: connected to {}", path.display());
    let (read_half, write_half) = stream.into_split();
    Ok(start_io_tasks(BufReader::new(read_half), write_half, event_tx))
}

#[cfg(windows)]
pub async fn connect(path: &Path, event_tx: mpsc::Sender<MpvEvent>) -> anyhow::Result<MpvHandle> {
    let client = ClientOptions::new().open(path)?;
    debug!("mpv: connected to named pipe {}", path.display());
    let (read_half, write_half) = tokio::io::split(client);
    Ok(start_io_tasks(BufReader::new(read_half), write_half, event_tx))
}

/// Whether an IPC endpoint is present at `path`.
#[cfg(unix)]
pub fn endpoint_exists(path: &Path) -> bool {
    path.exists()
}

#[cfg(windows)]
pub fn endpoint_exists(path: &Path) -> bool {
    ClientOptions::new().open(path).is_ok()
}

fn start_io_tasks<R, W>(
    reader: BufReader<R>,
    writer: W,
    event_tx: mpsc::Sender<MpvEvent>,
) -> MpvHandle
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    // req_id → reply channel. Writer inserts, reader resolves.
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(writer, cmd_rx, pending.clone()));
    let reader = tokio::spawn(reader_task(reader, pending, event_tx));

    MpvHandle {
        tx: cmd_tx,
        reader: Arc::new(reader.abort_handle()),
    }
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, event_tx: mpsc::Sender<MpvEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                fail_pending(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) {
                    let mut map = pending.lock().await;
                    if let Some(tx) = map.remove(&req_id) {
                        let result = if val["error"].as_str() == Some("success") {
                            Ok(val)
                        } else {
                            let err = val["error"].as_str().unwrap_or("unknown error").to_string();
                            debug!("mpv reader: response req={} err={}", req_id, err);
                            Err(anyhow::anyhow!("mpv error: {}", err))
                        };
                        let _ = tx.send(result);
                    } else {
                        debug!("mpv reader: response for unknown req={}", req_id);
                    }
                } else {
                    debug!("mpv reader: event {}", trimmed);
                    // Nobody listening is fine; keep draining responses.
                    let _ = event_tx.send(MpvEvent { raw: val }).await;
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                fail_pending(&pending, "mpv IPC read error").await;
                break;
            }
        }
    }
}

async fn fail_pending(pending: &PendingMap, reason: &str) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("{}", reason)));
    }
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register reply channel before writing so reader can match it
        pending.lock().await.insert(req.req_id, req.reply);
        debug!("mpv writer: send req={} payload={}", req.req_id, req.payload.trim());
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

// ── convenience wrappers ─────────────────────────────────────────────────────

impl MpvHandle {
    pub async fn get_property(&self, name: &str) -> anyhow::Result<Value> {
        let resp = self.send(json!(["get_property", name])).await?;
        Ok(resp.get("data").cloned().unwrap_or(Value::Null))
    }

    pub async fn get_string(&self, name: &str) -> Option<String> {
        match self.get_property(name).await {
            Ok(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub async fn get_f64(&self, name: &str) -> Option<f64> {
        self.get_property(name).await.ok()?.as_f64()
    }

    pub async fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_property(name).await.ok()?.as_bool()
    }

    pub async fn set_property(&self, name: &str, value: Value) -> anyhow::Result<()> {
        self.send(json!(["set_property", name, value])).await?;
        Ok(())
    }

    /// Replace whatever is playing with `url`, starting at `start_secs`.
    pub async fn loadfile(&self, url: &str, start_secs: f64) -> anyhow::Result<()> {
        let options = format!("start={:.3}", start_secs);
        self.send(json!(["loadfile", url, "replace", -1, options]))
            .await?;
        Ok(())
    }

    pub async fn show_text(&self, text: &str, duration_ms: u64) -> anyhow::Result<()> {
        self.send(json!(["show-text", text, duration_ms])).await?;
        Ok(())
    }

    pub async fn quit(&self) -> anyhow::Result<()> {
        self.send(json!(["quit"])).await?;
        Ok(())
    }

    /// Liveness probe: a cheap read-only property bounded by `timeout`.
    pub async fn probe(&self, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, self.send(json!(["get_property", "mpv-version"]))).await,
            Ok(Ok(_))
        )
    }

    /// Subscribe to the properties the player listener tracks. Must be called
    /// after every fresh connection.
    pub async fn observe_playback(&self) {
        let props = [
            (OBS_TIME_POS, "time-pos"),
            (OBS_PAUSE, "pause"),
            (OBS_DURATION, "duration"),
        ];
        for (id, name) in &props {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }
}

pub fn user_data(field: &str) -> String {
    format!("{USER_DATA_PREFIX}/{field}")
}
