/// mpv IPC driver with separated reader/writer tasks.
///
/// ```text
///   MpvDriver::spawn_and_connect()
///         │
///         ├── writer_task   ← MpvRequest via mpsc, serialised → socket
///         └── reader_task   ← JSON lines from socket
///                                ├── response (has request_id) → matched oneshot
///                                └── event                     → event channel
/// ```
///
/// `MpvPlayer` wraps the handle as the stream's audio element and as the
/// poller's buffer-delay estimator.
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};
use vgm_core::{AudioElement, BufferDelay};

#[cfg(unix)]
use tokio::net::UnixStream;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String, // serialised JSON line, '\n' included
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// Something mpv sent without being asked.
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    /// The live stream ran out on its own (server hung up or errored), as
    /// opposed to us stopping or replacing it.
    pub fn is_stream_end(&self) -> bool {
        self.event_name() == Some("end-file")
            && matches!(
                self.raw.get("reason").and_then(|r| r.as_str()),
                Some("eof") | Some("error")
            )
    }
}

/// Cloneable handle to the writer task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
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

        tokio::time::timeout(REPLY_TIMEOUT, reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    pub async fn set_property(&self, name: &str, value: Value) -> anyhow::Result<()> {
        self.send(json!(["set_property", name, value])).await?;
        Ok(())
    }

    pub async fn get_f64(&self, name: &str) -> anyhow::Result<f64> {
        let resp = self.send(json!(["get_property", name])).await?;
        resp["data"]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("mpv property {} is not a number", name))
    }
}

/// Wire up reader and writer tasks over any duplex byte stream.
pub fn start_io_tasks<S>(stream: S, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));

    MpvHandle { tx: cmd_tx }
}

/// Owns the mpv child process. The process is killed when the driver drops.
pub struct MpvDriver {
    socket_name: String,
    process: Option<tokio::process::Child>,
}

impl MpvDriver {
    pub fn new() -> Self {
        Self {
            socket_name: vgm_core::platform::mpv_socket_name(),
            process: None,
        }
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        mpv_path: Option<&Path>,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        let mpv_binary = vgm_core::platform::find_mpv_binary(mpv_path)
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;
        info!("mpv: spawning {:?}", mpv_binary);

        let data_dir = vgm_core::platform::data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join("mpv-stderr.log"))?;

        let child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(vgm_core::platform::mpv_socket_arg())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: spawned process with pid {:?}", child.id());
        self.process = Some(child);

        for _ in 0..50 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to IPC socket");
        Ok(start_io_tasks(stream, event_tx))
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        mpv_path: Option<&Path>,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        use tokio::net::windows::named_pipe::ClientOptions;

        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
        let mpv_binary = vgm_core::platform::find_mpv_binary(mpv_path)
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;
        info!("mpv: spawning {:?}", mpv_binary);

        let child = tokio::process::Command::new(mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(vgm_core::platform::mpv_socket_arg())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        self.process = Some(child);

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                info!("mpv: connected to named pipe");
                return Ok(start_io_tasks(client, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }

    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
    }
}

async fn reader_task<R>(mut reader: BufReader<R>, pending: Pending, event_tx: mpsc::Sender<MpvEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    let reason = loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break "mpv IPC connection closed".to_string(),
            Ok(_) => {}
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                break format!("mpv IPC read error: {}", e);
            }
        }
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
            let Some(tx) = pending.lock().await.remove(&req_id) else {
                debug!("mpv reader: response for unknown req={}", req_id);
                continue;
            };
            let result = if val["error"].as_str() == Some("success") {
                Ok(val)
            } else {
                let err = val["error"].as_str().unwrap_or("unknown error");
                Err(anyhow::anyhow!("mpv error: {}", err))
            };
            let _ = tx.send(result);
        } else {
            debug!("mpv reader: event {}", trimmed);
            // try_send: a slow UI must not stall replies behind it
            if event_tx.try_send(MpvEvent { raw: val }).is_err() {
                debug!("mpv reader: event dropped");
            }
        }
    };

    debug!("mpv reader: {}", reason);
    for (_, tx) in pending.lock().await.drain() {
        let _ = tx.send(Err(anyhow::anyhow!(reason.clone())));
    }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: Pending)
where
    W: AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // register before writing so the reader can always match the reply
        pending.lock().await.insert(req.req_id, req.reply);
        debug!("mpv writer: send {}", req.payload.trim());
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

/// The live stream's audio element, backed by mpv.
#[derive(Clone)]
pub struct MpvPlayer {
    handle: MpvHandle,
}

impl MpvPlayer {
    pub fn new(handle: MpvHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl AudioElement for MpvPlayer {
    async fn load(&mut self, url: &str) -> anyhow::Result<()> {
        self.handle.send(json!(["loadfile", url, "replace"])).await?;
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.handle.send(json!(["stop"])).await?;
        Ok(())
    }

    async fn set_gain(&mut self, gain: f32) -> anyhow::Result<()> {
        let pct = (gain * 100.0).clamp(0.0, 100.0);
        self.handle.set_property("volume", json!(pct)).await
    }

    async fn set_muted(&mut self, muted: bool) -> anyhow::Result<()> {
        self.handle.set_property("mute", json!(muted)).await
    }
}

#[async_trait]
impl BufferDelay for MpvPlayer {
    /// Seconds of audio mpv holds ahead of what is audible. Unavailable while
    /// idle, which the schedule treats as "use the default".
    async fn estimate(&self) -> Option<f64> {
        match self.handle.get_f64("demuxer-cache-duration").await {
            Ok(secs) => Some(secs),
            Err(e) => {
                debug!("mpv: no buffer estimate: {}", e);
                None
            }
        }
    }
}
