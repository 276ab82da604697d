use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use mediactl_proto::protocol::PlaybackState;

use super::fake::{CountingSink, FakeLauncher, FakePlayer};
use super::{PlayRequest, PlayerManager, PlayerSettings};
use crate::command::Precondition;
use crate::message::Message;

struct Harness {
    pm: PlayerManager,
    launcher: Arc<FakeLauncher>,
    sink: Arc<CountingSink>,
    updates: mpsc::Receiver<Message>,
    dir: tempfile::TempDir,
}

fn harness(heartbeat: Duration) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = PlayerSettings::new(dir.path().join("mpv.sock"));
    settings.heartbeat = heartbeat;
    settings.spawn_interval = Duration::from_millis(10);
    settings.spawn_attempts = 20;
    let launcher = Arc::new(FakeLauncher::default());
    let sink = Arc::new(CountingSink::default());
    let (tx, updates) = mpsc::channel(1024);
    let pm = PlayerManager::new(settings, launcher.clone(), sink.clone(), tx);
    Harness {
        pm,
        launcher,
        sink,
        updates,
        dir,
    }
}

fn request(key: &str, compact: bool) -> PlayRequest {
    PlayRequest {
        url: "http://srv/part1?token=t".into(),
        title: "Pilot".into(),
        key: key.into(),
        no_report: false,
        compact,
        start_offset_ms: 90_000,
    }
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn cold_play_spawns_and_reports_position() {
    let h = harness(Duration::from_millis(100));
    h.pm.play_now(request("100", false)).await.unwrap();

    assert_eq!(h.launcher.launches(), vec![false]);
    assert!(h.pm.is_connected().await);
    let status = h.pm.status();
    assert_eq!(status.title, "Pilot");
    assert_eq!(status.key, "100");
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.time_pos, 90.0);

    let player = h.launcher.player(0);
    let loads = player.commands_named("loadfile");
    assert_eq!(
        loads[0],
        json!(["loadfile", "http://srv/part1?token=t", "replace", -1, "start=90.000"])
    );
    assert_eq!(player.prop("user-data/mediactl/key"), Some(json!("100")));
    assert_eq!(player.prop("force-media-title"), Some(json!("Pilot")));

    // load report plus at least one heartbeat
    assert!(eventually(|| h.sink.count_for("100") >= 2).await);
    assert!(h.sink.reports().iter().all(|r| r.time_ms == 90_000));
}

#[tokio::test]
async fn heartbeat_reports_while_active() {
    let h = harness(Duration::from_millis(100));
    h.pm.play_now(request("100", false)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(550)).await;
    assert!(h.sink.count_for("100") >= 4, "{:?}", h.sink.reports());
}

#[tokio::test]
async fn mode_switch_restarts_player() {
    let h = harness(Duration::from_secs(10));
    h.pm.play_now(request("100", false)).await.unwrap();
    h.pm.play_now(request("200", true)).await.unwrap();

    assert_eq!(h.launcher.launches(), vec![false, true]);
    let outgoing: Vec<_> = h
        .sink
        .reports()
        .into_iter()
        .filter(|r| r.rating_key == "100")
        .map(|r| r.state)
        .collect();
    assert_eq!(outgoing, vec![PlaybackState::Playing, PlaybackState::Stopped]);
    assert_eq!(h.sink.count_for("200"), 1);
    let first = h.launcher.player(0);
    assert_eq!(first.commands_named("quit").len(), 1);
    assert!(first.is_dead());
    assert!(eventually(|| first.live_clients() == 0).await);
    assert_eq!(h.pm.connection_mode().await, Some(true));
    assert!(h.pm.status().compact);
    assert_eq!(h.launcher.player(1).live_clients(), 1);
}

#[tokio::test]
async fn same_mode_reuses_connection_and_reports_outgoing_item() {
    let h = harness(Duration::from_secs(10));
    h.pm.play_now(request("100", false)).await.unwrap();
    assert_eq!(h.sink.count_for("100"), 1);

    h.pm.play_now(request("200", false)).await.unwrap();
    assert_eq!(h.launcher.launches().len(), 1);
    assert_eq!(h.sink.count_for("100"), 2);
    assert_eq!(h.sink.count_for("200"), 1);
    assert_eq!(h.launcher.player(0).live_clients(), 1);
}

#[tokio::test]
async fn stop_reports_once_and_tears_down() {
    let h = harness(Duration::from_millis(100));
    h.pm.play_now(request("100", false)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    h.pm.stop_now().await;
    let after_stop = h.sink.reports();
    let last = after_stop.last().unwrap();
    assert_eq!(last.state, PlaybackState::Stopped);
    assert_eq!(last.rating_key, "100");
    assert!(!h.pm.is_connected().await);
    assert_eq!(h.pm.status(), Default::default());
    assert_eq!(h.launcher.player(0).commands_named("quit").len(), 1);

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(h.sink.reports().len(), after_stop.len());
}

#[tokio::test]
async fn end_of_file_reports_stopped() {
    let h = harness(Duration::from_secs(10));
    h.pm.play_now(request("100", false)).await.unwrap();
    h.launcher
        .player(0)
        .emit(json!({"event": "end-file", "reason": "eof"}));

    assert!(eventually(|| h.pm.status().state == PlaybackState::Stopped).await);
    assert!(eventually(|| h.sink.count_for("100") == 2).await);
    assert_eq!(
        h.sink.reports().last().unwrap().state,
        PlaybackState::Stopped
    );
    assert!(h.pm.is_connected().await);
}

#[tokio::test]
async fn replaced_file_is_not_end_of_playback() {
    let h = harness(Duration::from_secs(10));
    h.pm.play_now(request("100", false)).await.unwrap();
    h.launcher
        .player(0)
        .emit(json!({"event": "end-file", "reason": "stop"}));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.pm.status().state, PlaybackState::Playing);
}

#[tokio::test]
async fn player_death_tears_down_connection() {
    let mut h = harness(Duration::from_secs(10));
    h.pm.play_now(request("100", false)).await.unwrap();
    while h.updates.try_recv().is_ok() {}

    h.launcher.player(0).kill();
    let mut connected = true;
    for _ in 0..200 {
        connected = h.pm.is_connected().await;
        if !connected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!connected);
    assert!(!h.pm.status().is_active());
    assert!(eventually(|| h.sink.count_for("100") == 2).await);
    assert_eq!(
        h.sink.reports().last().unwrap().state,
        PlaybackState::Stopped
    );
    assert!(matches!(
        h.updates.try_recv(),
        Ok(Message::PlayerStatusChanged)
    ));
    assert!(!h.dir.path().join("mpv.sock").exists());
}

#[tokio::test]
async fn reconnect_restores_running_player() {
    let h = harness(Duration::from_secs(10));
    let player = FakePlayer::start(&h.dir.path().join("mpv.sock"));
    player.set_prop("user-data/mediactl/title", json!("Pilot"));
    player.set_prop("user-data/mediactl/key", json!("100"));
    player.set_prop("user-data/mediactl/compact", json!(true));
    player.set_prop("path", json!("http://srv/part1"));
    player.set_prop("idle-active", json!(false));
    player.set_prop("pause", json!(true));
    player.set_prop("time-pos", json!(42.0));
    player.set_prop("duration", json!(1800.0));

    assert!(h.pm.reconnect_now().await);
    let status = h.pm.status();
    assert_eq!(status.title, "Pilot");
    assert_eq!(status.key, "100");
    assert_eq!(status.state, PlaybackState::Paused);
    assert_eq!(status.time_pos, 42.0);
    assert!(status.compact);
    assert_eq!(h.pm.connection_mode().await, Some(true));

    // a second reconnect never opens another connection
    assert!(!h.pm.reconnect_now().await);
    assert_eq!(player.live_clients(), 1);
    assert!(h.launcher.launches().is_empty());
}

#[tokio::test]
async fn reconnect_falls_back_to_title_when_no_user_data() {
    let h = harness(Duration::from_secs(10));
    let player = FakePlayer::start(&h.dir.path().join("mpv.sock"));
    player.set_prop("media-title", json!("Some File"));

    assert!(h.pm.reconnect_now().await);
    let status = h.pm.status();
    assert_eq!(status.title, "Some File");
    assert_eq!(status.state, PlaybackState::Stopped);
}

#[tokio::test]
async fn reconnect_removes_stale_socket() {
    let h = harness(Duration::from_secs(10));
    let sock = h.dir.path().join("mpv.sock");
    std::fs::write(&sock, b"").unwrap();

    assert!(!h.pm.reconnect_now().await);
    assert!(!sock.exists());
    assert!(!h.pm.is_connected().await);
}

#[tokio::test]
async fn attached_player_in_other_mode_is_replaced() {
    let h = harness(Duration::from_secs(10));
    let player = FakePlayer::start(&h.dir.path().join("mpv.sock"));
    player.set_prop("user-data/mediactl/compact", json!(true));

    h.pm.play_now(request("100", false)).await.unwrap();
    assert_eq!(player.commands_named("quit").len(), 1);
    assert_eq!(h.launcher.launches(), vec![false]);
    assert_eq!(h.pm.connection_mode().await, Some(false));
}

#[tokio::test]
async fn unresponsive_player_is_respawned() {
    let h = harness(Duration::from_secs(10));
    h.pm.play_now(request("100", false)).await.unwrap();
    h.launcher.player(0).set_unresponsive(true);

    h.pm.play_now(request("200", false)).await.unwrap();
    assert_eq!(h.launcher.launches().len(), 2);
    assert!(h.pm.is_connected().await);
    assert_eq!(h.pm.status().key, "200");
}

#[tokio::test]
async fn missing_player_is_a_precondition_failure() {
    let h = harness(Duration::from_secs(10));
    h.launcher.missing.store(true, Ordering::SeqCst);

    let err = h.pm.play_now(request("100", false)).await.unwrap_err();
    assert!(err.downcast_ref::<Precondition>().is_some());
    assert!(h.launcher.launches().is_empty());
    assert!(!h.pm.is_connected().await);
    assert!(!h.pm.status().is_active());
}

#[tokio::test]
async fn silent_player_fails_without_leaving_a_socket() {
    let h = harness(Duration::from_secs(10));
    h.launcher.silent.store(true, Ordering::SeqCst);

    assert!(h.pm.play_now(request("100", false)).await.is_err());
    assert!(!h.pm.is_connected().await);
    assert!(!h.dir.path().join("mpv.sock").exists());
}

#[tokio::test]
async fn toggle_pause_flips_remote_and_local_state() {
    let h = harness(Duration::from_secs(10));
    assert!(!h.pm.toggle_pause_now().await.unwrap());

    h.pm.play_now(request("100", false)).await.unwrap();
    assert!(h.pm.toggle_pause_now().await.unwrap());
    assert!(h.pm.status().is_paused());
    assert_eq!(h.launcher.player(0).prop("pause"), Some(json!(true)));

    assert!(h.pm.toggle_pause_now().await.unwrap());
    assert_eq!(h.pm.status().state, PlaybackState::Playing);
}

#[tokio::test]
async fn suppressed_items_never_report() {
    let h = harness(Duration::from_millis(50));
    let mut req = request("100", false);
    req.no_report = true;
    h.pm.play_now(req).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    h.pm.stop_now().await;
    assert!(h.sink.reports().is_empty());
}

#[tokio::test]
async fn stop_command_quits_runtime() {
    let h = harness(Duration::from_secs(10));
    h.pm.play_now(request("100", false)).await.unwrap();
    let msgs = h.pm.stop().collect().await;
    assert!(matches!(&msgs[..], [Message::Quit]));
    assert!(!h.pm.is_connected().await);
}
