mod client;
mod command;
mod component;
mod context;
mod controller;
mod detail;
mod message;
mod mpv;
mod navigator;
mod overlays;
mod player;
mod tab_manager;
mod theme;
mod view_stack;
mod views;
mod widgets;

use std::sync::Arc;

use mediactl_proto::cache::Cache;
use mediactl_proto::config::Config;
use mediactl_proto::platform;
use mediactl_proto::search::SearchIndex;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::client::ServerClient;
use crate::command::{alert_for, Dispatcher};
use crate::context::AppContext;
use crate::controller::Controller;
use crate::message::Message;
use crate::player::{MpvLauncher, PlayerManager, PlayerSettings, ServerProgressSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("mediactl.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // MEDIACTL_LOG wins over RUST_LOG; HTTP internals stay quiet by default.
    let log_filter = std::env::var("MEDIACTL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::new(log_filter))
        .with_ansi(false)
        .init();

    eprintln!("mediactl log: {}", log_path.display());
    tracing::info!("mediactl starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config_path = Config::config_path();
    let config = match Config::load_from(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config unreadable, using defaults: {:#}", e);
            Config::default()
        }
    };
    std::fs::create_dir_all(&config.cache_dir)?;

    // ── Shared stores ────────────────────────────────────────────────────────
    let cache = Arc::new(Cache::new(config.cache_dir.join("responses"), !config.no_cache));
    let index = Arc::new(SearchIndex::open(config.cache_dir.join("search-index.json")));

    // Queue between Commands / terminal input and the Controller.
    let (tx, rx) = mpsc::channel::<Message>(1024);

    let client = match ServerClient::from_config(&config, cache.clone()) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("no usable server: {:#}", e);
            let _ = tx.try_send(Message::Error(alert_for(&e)));
            ServerClient::new("", "", "", "", cache.clone())?
        }
    };

    // ── Player ───────────────────────────────────────────────────────────────
    let player = PlayerManager::new(
        PlayerSettings::new(platform::mpv_socket_path(&config.cache_dir)),
        Arc::new(MpvLauncher::new(
            config.player_binary.clone(),
            data_dir.join("mpv.log"),
        )),
        Arc::new(ServerProgressSink::new(client.clone())),
        tx.clone(),
    );

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let ctx = AppContext::new(client, cache, index);
    let controller = Controller::new(config, config_path, ctx, player);
    controller.run(rx, Dispatcher::new(tx)).await?;

    tracing::info!("mediactl exited");
    Ok(())
}
