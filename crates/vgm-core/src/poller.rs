//! The self-rescheduling metadata loop.
//!
//! ```text
//!   spawn() ──► cycle ──► sleep(delay) ──► cycle ──► sleep(delay) ──► …
//!                 │                          │
//!                 ├─ Ok  → on_snapshot   delay = remaining + buffer
//!                 └─ Err → on_server_down delay = retry
//! ```
//!
//! Exactly one fetch is in flight or one sleep is pending at any moment. The
//! loop never ends on its own; it stops when its `PollerHandle` is shut down
//! or dropped.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapter::PresentationAdapter;
use crate::config::Config;
use crate::error::PlaybackError;
use crate::schedule::{BufferDelay, NoEstimate, Schedule};
use crate::snapshot::PlaybackSnapshot;
use crate::source::MetadataSource;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Asking the player for its buffer depth must not hold up scheduling.
const ESTIMATE_TIMEOUT: Duration = Duration::from_secs(1);

/// What one cycle did and how long until the next.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub delay: Duration,
    pub outcome: CycleOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Updated {
        remaining_secs: f64,
        buffer_secs: f64,
    },
    Down {
        reason: String,
    },
}

pub struct Poller {
    source: Arc<dyn MetadataSource>,
    adapter: Arc<dyn PresentationAdapter>,
    buffer: Arc<dyn BufferDelay>,
    schedule: Schedule,
    request_timeout: Duration,
}

impl Poller {
    pub fn new(source: Arc<dyn MetadataSource>, adapter: Arc<dyn PresentationAdapter>) -> Self {
        Self {
            source,
            adapter,
            buffer: Arc::new(NoEstimate),
            schedule: Schedule::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_config(
        config: &Config,
        source: Arc<dyn MetadataSource>,
        adapter: Arc<dyn PresentationAdapter>,
        buffer: Arc<dyn BufferDelay>,
    ) -> Self {
        Self::new(source, adapter)
            .with_buffer_delay(buffer)
            .with_schedule(Schedule::from_config(&config.timing))
            .with_request_timeout(config.source.request_timeout())
    }

    pub fn with_buffer_delay(mut self, buffer: Arc<dyn BufferDelay>) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// One bounded fetch. A source that stalls past the request timeout is
    /// reported as `Timeout`, whatever the source itself does.
    pub async fn poll(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        match tokio::time::timeout(self.request_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(PlaybackError::Timeout),
        }
    }

    /// Poll once, hand the result to the adapter, and work out the next
    /// delay. Never fails.
    pub async fn cycle(&self) -> CycleReport {
        match self.poll().await {
            Ok(snapshot) => {
                let adapter = &self.adapter;
                guarded("on_snapshot", || adapter.on_snapshot(&snapshot));

                let estimate = tokio::time::timeout(ESTIMATE_TIMEOUT, self.buffer.estimate())
                    .await
                    .unwrap_or(None);
                let buffer_secs = self.schedule.buffer_secs(estimate);
                let delay = self.schedule.after_snapshot(snapshot.remaining_time, estimate);
                debug!(
                    "poller: '{}' / '{}' remaining={:.1}s buffer={:.1}s next in {:.1}s",
                    snapshot.game,
                    snapshot.track,
                    snapshot.remaining_time,
                    buffer_secs,
                    delay.as_secs_f64()
                );
                CycleReport {
                    delay,
                    outcome: CycleOutcome::Updated {
                        remaining_secs: snapshot.remaining_time,
                        buffer_secs,
                    },
                }
            }
            Err(e) => {
                let delay = self.schedule.after_failure();
                if e.is_application() {
                    info!("poller: {}; retrying in {:.0}s", e, delay.as_secs_f64());
                } else {
                    warn!("poller: {}; retrying in {:.0}s", e, delay.as_secs_f64());
                }
                let adapter = &self.adapter;
                guarded("on_server_down", || adapter.on_server_down());
                CycleReport {
                    delay,
                    outcome: CycleOutcome::Down {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    /// Run the loop on a tokio task. The first poll happens immediately.
    pub fn spawn(self) -> PollerHandle {
        let token = CancellationToken::new();
        let wake = Arc::new(Notify::new());
        let (report_tx, report_rx) = watch::channel(None);

        let task = tokio::spawn(self.run(token.clone(), Arc::clone(&wake), report_tx));

        PollerHandle {
            token,
            wake,
            reports: report_rx,
            task: Some(task),
        }
    }

    async fn run(
        self,
        token: CancellationToken,
        wake: Arc<Notify>,
        reports: watch::Sender<Option<CycleReport>>,
    ) {
        info!("poller: starting");
        loop {
            let report = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                report = self.cycle() => report,
            };
            let delay = report.delay;
            reports.send_replace(Some(report));

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = wake.notified() => debug!("poller: early poll requested"),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!("poller: stopped");
    }
}

/// Run an adapter callback so that neither an error nor a panic reaches the
/// loop.
fn guarded(name: &str, f: impl FnOnce() -> anyhow::Result<()>) {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("poller: {} failed: {:#}", name, e),
        Err(_) => warn!("poller: {} panicked", name),
    }
}

/// Owner of a running poll loop. Dropping it stops the loop.
pub struct PollerHandle {
    token: CancellationToken,
    wake: Arc<Notify>,
    reports: watch::Receiver<Option<CycleReport>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Cut the pending sleep short and poll right away. If a fetch is in
    /// flight, the next cycle starts as soon as it completes.
    pub fn poll_now(&self) {
        self.wake.notify_one();
    }

    /// Latest cycle report, updated after every cycle.
    pub fn reports(&self) -> watch::Receiver<Option<CycleReport>> {
        self.reports.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for the task to wind down. No adapter callback
    /// runs after this returns.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("poller: task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
