mod http;
mod status;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Serves what mpd is playing as JSON for the vgm-radio players.
#[derive(Parser, Debug)]
#[command(name = "vgm-metadata", version)]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Library root laid out as <game>/<track>, with an optional
    /// <game>/cover.txt holding the cover URL
    #[arg(long)]
    music_dir: PathBuf,

    /// mpc binary (defaults to the one on PATH)
    #[arg(long)]
    mpc: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,vgm_metadata=debug")),
        )
        .init();

    let mpc = args
        .mpc
        .or_else(|| vgm_core::platform::find_on_path(vgm_core::platform::mpc_binary_name()))
        .unwrap_or_else(|| PathBuf::from(vgm_core::platform::mpc_binary_name()));
    info!("Using mpc at {:?}, music dir {:?}", mpc, args.music_dir);

    let state = http::AppState {
        status: Arc::new(http::MpcCommand::new(mpc)),
        music_dir: args.music_dir,
    };
    http::serve(&args.bind, args.port, state).await
}
