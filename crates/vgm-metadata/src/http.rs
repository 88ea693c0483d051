use crate::status::{parse_status, DOWN_MESSAGE};
use async_trait::async_trait;
use axum::{extract::State, response::Json, routing::get, Router};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use vgm_core::snapshot::MetadataResponse;

/// Produces the raw `mpc -f %file%` output.
#[async_trait]
pub trait StatusCommand: Send + Sync {
    async fn run(&self) -> anyhow::Result<String>;
}

pub struct MpcCommand {
    binary: PathBuf,
}

impl MpcCommand {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl StatusCommand for MpcCommand {
    async fn run(&self) -> anyhow::Result<String> {
        let output = tokio::process::Command::new(&self.binary)
            .args(["-f", "%file%"])
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub status: Arc<dyn StatusCommand>,
    pub music_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metadata", get(get_metadata))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(bind_address: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Metadata server listening on http://{}/metadata", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn get_metadata(State(state): State<AppState>) -> Json<MetadataResponse> {
    Json(current(&state).await.unwrap_or_else(|e| {
        debug!("metadata unavailable: {:#}", e);
        MetadataResponse::error(DOWN_MESSAGE)
    }))
}

async fn current(state: &AppState) -> anyhow::Result<MetadataResponse> {
    let output = state.status.run().await?;
    let song = parse_status(&output)?;
    let cover = read_cover(&state.music_dir, &song.game).await;
    Ok(MetadataResponse::Snapshot(song.to_wire(cover)))
}

/// `<music_dir>/<game>/cover.txt` holds the cover URL. Missing or unreadable
/// means no cover, never an error.
async fn read_cover(music_dir: &Path, game: &str) -> String {
    if !is_plain_dir_name(game) {
        warn!("refusing cover lookup for game '{}'", game);
        return String::new();
    }
    let path = music_dir.join(game).join("cover.txt");
    match tokio::fs::read_to_string(&path).await {
        Ok(s) => s.trim().to_string(),
        Err(e) => {
            debug!("no cover at {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn is_plain_dir_name(name: &str) -> bool {
    let mut parts = Path::new(name).components();
    matches!(
        (parts.next(), parts.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Canned(Option<&'static str>);

    #[async_trait]
    impl StatusCommand for Canned {
        async fn run(&self) -> anyhow::Result<String> {
            match self.0 {
                Some(s) => Ok(s.to_string()),
                None => anyhow::bail!("mpd not running"),
            }
        }
    }

    const PLAYING: &str = "Chrono Trigger/Corridors of Time.mp3\n\
        [playing] #12/140   1:23/3:00 (46%)\n\
        volume: 80%   repeat: on    random: on    single: off   consume: off\n";

    async fn get(state: AppState) -> (StatusCode, serde_json::Value, Option<String>) {
        let req = Request::builder()
            .uri("/metadata")
            .header("origin", "https://somewhere.example")
            .body(Body::empty())
            .unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let cors = resp
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap(), cors)
    }

    fn state(output: Option<&'static str>, music_dir: &Path) -> AppState {
        AppState {
            status: Arc::new(Canned(output)),
            music_dir: music_dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_playing_with_cover() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Chrono Trigger")).unwrap();
        std::fs::write(
            dir.path().join("Chrono Trigger").join("cover.txt"),
            "https://img.example/ct.png\n",
        )
        .unwrap();

        let (status, body, cors) = get(state(Some(PLAYING), dir.path())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(cors.is_some());
        assert_eq!(body["game"], "Chrono Trigger");
        assert_eq!(body["track"], "Corridors of Time (3:00)");
        assert_eq!(body["cover"], "https://img.example/ct.png");
        assert_eq!(body["remainingTime"], 97.0);
        assert_eq!(body["trackLength"], 180.0);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_missing_cover_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (_, body, _) = get(state(Some(PLAYING), dir.path())).await;
        assert_eq!(body["cover"], "");
        assert_eq!(body["game"], "Chrono Trigger");
    }

    #[tokio::test]
    async fn test_stopped_or_failing_mpc_reports_down() {
        let dir = tempfile::tempdir().unwrap();
        for output in [Some("volume: 80%\n"), None] {
            let (status, body, _) = get(state(output, dir.path())).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, serde_json::json!({ "error": DOWN_MESSAGE }));
        }
    }

    #[test]
    fn test_cover_lookup_stays_in_music_dir() {
        assert!(is_plain_dir_name("Chrono Trigger"));
        assert!(!is_plain_dir_name(".."));
        assert!(!is_plain_dir_name("a/b"));
        assert!(!is_plain_dir_name("/etc"));
        assert!(!is_plain_dir_name(""));
    }
}
