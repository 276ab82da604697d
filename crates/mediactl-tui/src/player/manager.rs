//! PlayerManager: owns the single IPC connection to the external player.
//!
//! ```text
//!   play / reconnect / toggle_pause / stop      (Commands, serialized by `conn`)
//!         │
//!         ├── attach()  → existing socket → probe → restore status
//!         ├── spawn()   → Launcher → poll socket → probe
//!         └── install() → listener task (generation N)
//!                             ├── property-change → status + PlayerStatusChanged
//!                             ├── end-file        → Stopped + final report
//!                             ├── shutdown / EOF  → teardown if still generation N
//!                             └── heartbeat tick  → progress report
//! ```

use anyhow::Context;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use mediactl_proto::protocol::PlaybackState;

use super::launcher::Launcher;
use super::report::ProgressSink;
use super::status::PlayerStatus;
use super::PlayRequest;
use crate::command::Command;
use crate::message::Message;
use crate::mpv::{self, MpvEvent, MpvHandle, OBS_DURATION, OBS_PAUSE, OBS_TIME_POS};

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub socket_path: PathBuf,
    /// Progress re-report interval while playing.
    pub heartbeat: Duration,
    /// Bound on the liveness probe.
    pub probe_timeout: Duration,
    pub spawn_attempts: u32,
    pub spawn_interval: Duration,
}

impl PlayerSettings {
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            heartbeat: Duration::from_secs(10),
            probe_timeout: Duration::from_millis(200),
            spawn_attempts: 50,
            spawn_interval: Duration::from_millis(100),
        }
    }
}

struct Connection {
    handle: MpvHandle,
    generation: u64,
    compact: bool,
    stop: Option<oneshot::Sender<()>>,
}

type Slot<'a> = MutexGuard<'a, Option<Connection>>;

struct Inner {
    settings: PlayerSettings,
    launcher: Arc<dyn Launcher>,
    reporter: Arc<dyn ProgressSink>,
    updates: mpsc::Sender<Message>,
    status: RwLock<PlayerStatus>,
    /// Held for the whole of every operation touching the connection.
    conn: Mutex<Option<Connection>>,
    generation: AtomicU64,
}

#[derive(Clone)]
pub struct PlayerManager {
    inner: Arc<Inner>,
}

impl PlayerManager {
    pub fn new(
        settings: PlayerSettings,
        launcher: Arc<dyn Launcher>,
        reporter: Arc<dyn ProgressSink>,
        updates: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                launcher,
                reporter,
                updates,
                status: RwLock::new(PlayerStatus::default()),
                conn: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    // ── status ───────────────────────────────────────────────────────────────

    pub fn status(&self) -> PlayerStatus {
        self.inner
            .status
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn status_mut(&self) -> RwLockWriteGuard<'_, PlayerStatus> {
        self.inner.status.write().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    pub async fn is_connected(&self) -> bool {
        self.inner.conn.lock().await.is_some()
    }

    /// Compact-mode flag of the live connection, if any.
    #[cfg(test)]
    pub async fn connection_mode(&self) -> Option<bool> {
        self.inner.conn.lock().await.as_ref().map(|c| c.compact)
    }

    fn notify(&self) {
        if let Err(e) = self.inner.updates.try_send(Message::PlayerStatusChanged) {
            debug!("PlayerManager: status update not queued: {}", e);
        }
    }

    fn report(&self, status: &PlayerStatus) {
        if let Some(report) = status.timeline() {
            self.inner.reporter.report(report);
        }
    }

    // ── commands ─────────────────────────────────────────────────────────────

    pub fn play(&self, request: PlayRequest) -> Command {
        let pm = self.clone();
        Command::attempt(async move {
            pm.play_now(request).await?;
            Ok(Message::PlayerStatusChanged)
        })
    }

    pub fn reconnect(&self) -> Command {
        let pm = self.clone();
        Command::optional(async move {
            pm.reconnect_now()
                .await
                .then_some(Message::PlayerStatusChanged)
        })
    }

    pub fn toggle_pause(&self) -> Command {
        let pm = self.clone();
        Command::attempt_optional(async move {
            Ok(pm
                .toggle_pause_now()
                .await?
                .then_some(Message::PlayerStatusChanged))
        })
    }

    /// Stop playback and keep the runtime going.
    pub fn stop_playback(&self) -> Command {
        let pm = self.clone();
        Command::perform(async move {
            pm.stop_now().await;
            Message::PlayerStatusChanged
        })
    }

    /// Stop playback, then quit the runtime.
    pub fn stop(&self) -> Command {
        let pm = self.clone();
        Command::perform(async move {
            pm.stop_now().await;
            Message::Quit
        })
    }

    // ── operations ───────────────────────────────────────────────────────────

    pub async fn play_now(&self, request: PlayRequest) -> anyhow::Result<()> {
        self.inner.launcher.ensure_available()?;
        let mut slot = self.inner.conn.lock().await;

        if let Some(conn) = slot.as_ref() {
            if !conn.handle.probe(self.inner.settings.probe_timeout).await {
                info!("PlayerManager: connection unresponsive, cleaning up");
                self.teardown(&mut slot);
            }
        }
        if slot.is_none() {
            self.attach(&mut slot).await;
        }
        if let Some(conn) = slot.as_ref() {
            if conn.compact != request.compact {
                info!(
                    "PlayerManager: mode change compact={} -> {}, restarting player",
                    conn.compact, request.compact
                );
                let mut last = self.status();
                if last.is_active() {
                    last.state = PlaybackState::Stopped;
                    self.report(&last);
                }
                if let Err(e) = conn.handle.quit().await {
                    debug!("PlayerManager: quit before mode change failed: {:#}", e);
                }
                self.teardown(&mut slot);
            } else {
                let current = self.status();
                if !current.key.is_empty() && current.key != request.key {
                    debug!("PlayerManager: switching from {}", current.key);
                    self.report(&current);
                }
            }
        }
        let handle = match slot.as_ref() {
            Some(conn) => conn.handle.clone(),
            None => self.spawn(&mut slot, request.compact).await?,
        };

        let start_secs = request.start_offset_ms as f64 / 1000.0;
        *self.status_mut() = PlayerStatus {
            title: request.title.clone(),
            file: request.url.clone(),
            key: request.key.clone(),
            state: PlaybackState::Playing,
            time_pos: start_secs,
            duration: 0.0,
            no_report: request.no_report,
            compact: request.compact,
        };

        if let Err(e) = handle.loadfile(&request.url, start_secs).await {
            self.status_mut().state = PlaybackState::Stopped;
            self.notify();
            return Err(e).context("player rejected the media");
        }
        let props = [
            ("pause".to_string(), json!(false)),
            ("force-media-title".to_string(), json!(request.title)),
            (mpv::user_data("title"), json!(request.title)),
            (mpv::user_data("key"), json!(request.key)),
            (mpv::user_data("no-report"), json!(request.no_report)),
            (mpv::user_data("compact"), json!(request.compact)),
        ];
        for (name, value) in props {
            if let Err(e) = handle.set_property(&name, value).await {
                warn!("PlayerManager: set {} failed: {:#}", name, e);
            }
        }
        if let Err(e) = handle
            .show_text(&format!("Loading {}...", request.title), 5000)
            .await
        {
            debug!("PlayerManager: show-text failed: {:#}", e);
        }
        drop(slot);

        info!("PlayerManager: playing {} ({})", request.title, request.key);
        self.report(&self.status());
        self.notify();
        Ok(())
    }

    /// Attach to a player left running by a previous session. Returns whether
    /// a connection was established.
    pub async fn reconnect_now(&self) -> bool {
        let mut slot = self.inner.conn.lock().await;
        if slot.is_some() {
            return false;
        }
        self.attach(&mut slot).await;
        let connected = slot.is_some();
        drop(slot);
        if connected {
            self.notify();
        }
        connected
    }

    /// Flip pause. Returns false when there is no responsive player.
    pub async fn toggle_pause_now(&self) -> anyhow::Result<bool> {
        let slot = self.inner.conn.lock().await;
        let Some(conn) = slot.as_ref() else {
            return Ok(false);
        };
        if !conn.handle.probe(self.inner.settings.probe_timeout).await {
            return Ok(false);
        }
        let paused = conn.handle.get_bool("pause").await.unwrap_or(false);
        conn.handle
            .set_property("pause", json!(!paused))
            .await
            .context("toggling pause")?;
        {
            let mut status = self.status_mut();
            if status.is_active() {
                status.state = if paused {
                    PlaybackState::Playing
                } else {
                    PlaybackState::Paused
                };
            }
        }
        drop(slot);
        self.notify();
        Ok(true)
    }

    pub async fn stop_now(&self) {
        let mut slot = self.inner.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            let mut last = self.status();
            if last.is_active() {
                last.state = PlaybackState::Stopped;
                self.report(&last);
            }
            if conn.handle.probe(self.inner.settings.probe_timeout).await {
                if let Err(e) = conn.handle.quit().await {
                    debug!("PlayerManager: quit failed: {:#}", e);
                }
            }
            self.teardown(&mut slot);
        } else {
            *self.status_mut() = PlayerStatus::default();
        }
        drop(slot);
        info!("PlayerManager: stopped");
        self.notify();
    }

    // ── connection lifecycle ─────────────────────────────────────────────────

    async fn attach(&self, slot: &mut Slot<'_>) {
        let path = &self.inner.settings.socket_path;
        if !mpv::endpoint_exists(path) {
            return;
        }
        let (event_tx, event_rx) = mpsc::channel(64);
        let handle = match mpv::connect(path, event_tx).await {
            Ok(h) => h,
            Err(e) => {
                info!("PlayerManager: stale socket {}: {}", path.display(), e);
                self.remove_socket();
                return;
            }
        };
        if !handle.probe(self.inner.settings.probe_timeout).await {
            info!("PlayerManager: existing player unresponsive");
            handle.close();
            self.remove_socket();
            return;
        }
        let compact = self.restore_status(&handle).await;
        info!("PlayerManager: attached to running player");
        self.install(slot, handle, event_rx, compact);
    }

    async fn spawn(&self, slot: &mut Slot<'_>, compact: bool) -> anyhow::Result<MpvHandle> {
        let settings = &self.inner.settings;
        self.remove_socket();
        self.inner
            .launcher
            .launch(&settings.socket_path, compact)
            .context("starting player")?;

        for _ in 0..settings.spawn_attempts {
            tokio::time::sleep(settings.spawn_interval).await;
            if !mpv::endpoint_exists(&settings.socket_path) {
                continue;
            }
            let (event_tx, event_rx) = mpsc::channel(64);
            let Ok(handle) = mpv::connect(&settings.socket_path, event_tx).await else {
                continue;
            };
            if handle.probe(settings.probe_timeout).await {
                self.install(slot, handle.clone(), event_rx, compact);
                return Ok(handle);
            }
            handle.close();
        }
        self.remove_socket();
        anyhow::bail!(
            "player did not open its IPC socket at {}",
            settings.socket_path.display()
        )
    }

    fn install(
        &self,
        slot: &mut Slot<'_>,
        handle: MpvHandle,
        events: mpsc::Receiver<MpvEvent>,
        compact: bool,
    ) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(
            self.clone()
                .listen(generation, handle.clone(), events, stop_rx),
        );
        **slot = Some(Connection {
            handle,
            generation,
            compact,
            stop: Some(stop_tx),
        });
        debug!("PlayerManager: connection generation {}", generation);
    }

    /// Drop the connection, stop its listener and forget the status.
    fn teardown(&self, slot: &mut Slot<'_>) {
        if let Some(mut conn) = slot.take() {
            if let Some(stop) = conn.stop.take() {
                let _ = stop.send(());
            }
            conn.handle.close();
            debug!("PlayerManager: tore down generation {}", conn.generation);
        }
        *self.status_mut() = PlayerStatus::default();
        self.remove_socket();
    }

    #[cfg(unix)]
    fn remove_socket(&self) {
        let path = &self.inner.settings.socket_path;
        match std::fs::remove_file(path) {
            Ok(()) => debug!("PlayerManager: removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("PlayerManager: failed to remove {}: {}", path.display(), e),
        }
    }

    #[cfg(windows)]
    fn remove_socket(&self) {}

    /// Rebuild the status from what the player remembers. Returns the
    /// compact-mode flag the player was started with.
    async fn restore_status(&self, handle: &MpvHandle) -> bool {
        let mut title = handle
            .get_string(&mpv::user_data("title"))
            .await
            .unwrap_or_default();
        if title.is_empty() {
            title = handle.get_string("media-title").await.unwrap_or_default();
        }
        let key = handle
            .get_string(&mpv::user_data("key"))
            .await
            .unwrap_or_default();
        let file = handle.get_string("path").await.unwrap_or_default();
        let paused = handle.get_bool("pause").await.unwrap_or(false);
        let idle = handle.get_bool("idle-active").await.unwrap_or(false);
        let time_pos = handle.get_f64("time-pos").await.unwrap_or(0.0);
        let duration = handle.get_f64("duration").await.unwrap_or(0.0);
        let no_report = handle
            .get_bool(&mpv::user_data("no-report"))
            .await
            .unwrap_or(false);
        let compact = handle
            .get_bool(&mpv::user_data("compact"))
            .await
            .unwrap_or(false);

        let state = if idle {
            PlaybackState::Stopped
        } else if paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
        debug!("PlayerManager: restored key={} state={}", key, state.as_str());
        *self.status_mut() = PlayerStatus {
            title,
            file,
            key,
            state,
            time_pos,
            duration,
            no_report,
            compact,
        };
        compact
    }

    // ── listener ─────────────────────────────────────────────────────────────

    async fn listen(
        self,
        generation: u64,
        handle: MpvHandle,
        mut events: mpsc::Receiver<MpvEvent>,
        mut stop: oneshot::Receiver<()>,
    ) {
        handle.observe_playback().await;
        let mut heartbeat = tokio::time::interval(self.inner.settings.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    debug!("PlayerManager: listener {} stopped", generation);
                    return;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("PlayerManager: IPC connection closed");
                        break;
                    };
                    match event.event_name() {
                        Some("shutdown") => {
                            info!("PlayerManager: player shut down");
                            break;
                        }
                        Some("end-file") => self.on_end_file(&event),
                        Some("property-change") => self.on_property_change(&event),
                        _ => {}
                    }
                }
                _ = heartbeat.tick() => {
                    let status = self.status();
                    if status.is_active() && !status.key.is_empty() {
                        self.report(&status);
                    }
                }
            }
        }

        // The player went away on its own.
        let mut slot = self.inner.conn.lock().await;
        if slot.as_ref().map(|c| c.generation) != Some(generation) {
            return;
        }
        let mut last = self.status();
        self.teardown(&mut slot);
        drop(slot);
        self.notify();
        if !last.key.is_empty() && !last.no_report {
            last.state = PlaybackState::Stopped;
            self.report(&last);
        }
    }

    fn on_end_file(&self, event: &MpvEvent) {
        // "stop" means replaced by loadfile; "quit" is followed by shutdown.
        let reason = event.raw.get("reason").and_then(Value::as_str);
        if !reason.map_or(true, |r| r == "eof" || r == "error") {
            return;
        }
        let snapshot = {
            let mut status = self.status_mut();
            if !status.is_active() {
                return;
            }
            status.state = PlaybackState::Stopped;
            status.clone()
        };
        info!("PlayerManager: end of file for {}", snapshot.key);
        self.report(&snapshot);
        self.notify();
    }

    fn on_property_change(&self, event: &MpvEvent) {
        let Some((id, data)) = event.as_property_change() else {
            return;
        };
        {
            let mut status = self.status_mut();
            match id {
                OBS_TIME_POS => match data.as_f64() {
                    Some(t) => status.time_pos = t,
                    None => return,
                },
                OBS_DURATION => match data.as_f64() {
                    Some(d) => status.duration = d,
                    None => return,
                },
                OBS_PAUSE => {
                    // Only a play revives a stopped item.
                    let Some(paused) = data.as_bool() else {
                        return;
                    };
                    if !status.is_active() {
                        return;
                    }
                    status.state = if paused {
                        PlaybackState::Paused
                    } else {
                        PlaybackState::Playing
                    };
                }
                _ => return,
            }
        }
        self.notify();
    }
}
