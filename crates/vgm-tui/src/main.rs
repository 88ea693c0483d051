mod action;
mod adapter;
mod app;
mod app_state;
mod component;
mod components;
mod mpv;
mod theme;
mod widgets;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use vgm_core::config::Config;
use vgm_core::{BufferDelay, Controls, FixedDelay, HttpSource, Poller};

use crate::adapter::ChannelAdapter;
use crate::app::{App, AppMessage};
use crate::mpv::{MpvDriver, MpvEvent, MpvPlayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = vgm_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("tui.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG overrides; HTTP client internals are noisy at debug
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("vgm-radio log: {}", log_path.display());
    info!("vgm-radio starting…");

    let config = Config::load().unwrap_or_else(|e| {
        warn!("config: {:#}; using defaults", e);
        Config::default()
    });
    info!("Config path: {:?}", Config::config_path());

    // ── mpv ──────────────────────────────────────────────────────────────────
    let (mpv_tx, mut mpv_rx) = mpsc::channel::<MpvEvent>(64);
    let mut driver = MpvDriver::new();
    let handle = driver
        .spawn_and_connect(config.player.mpv_path.as_deref(), mpv_tx)
        .await?;
    let player = MpvPlayer::new(handle);

    // ── Poller → UI ──────────────────────────────────────────────────────────
    let (tx, rx) = mpsc::channel::<AppMessage>(256);

    let mpv_fwd = tx.clone();
    tokio::spawn(async move {
        while let Some(ev) = mpv_rx.recv().await {
            if mpv_fwd.send(AppMessage::Mpv(ev)).await.is_err() {
                break;
            }
        }
    });

    let buffer: Arc<dyn BufferDelay> = match config.timing.buffer_delay_secs {
        Some(secs) => Arc::new(FixedDelay(secs)),
        None => Arc::new(player.clone()),
    };
    let source = Arc::new(HttpSource::from_config(&config.source)?);
    let adapter = Arc::new(ChannelAdapter::new(tx.clone()));
    let poller = Poller::from_config(&config, source, adapter, buffer).spawn();

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let controls = Controls::new(
        player,
        config.source.stream_url.clone(),
        config.player.initial_volume,
    );
    let result = App::new(controls, poller, config.fallback.clone())
        .run(rx, tx)
        .await;

    driver.kill().await;
    result
}
