//! Hands poll results to the UI loop without ever waiting on it.

use tokio::sync::mpsc::{self, error::TrySendError};
use vgm_core::{PlaybackSnapshot, PresentationAdapter};

use crate::app::AppMessage;

pub struct ChannelAdapter {
    tx: mpsc::Sender<AppMessage>,
}

impl ChannelAdapter {
    pub fn new(tx: mpsc::Sender<AppMessage>) -> Self {
        Self { tx }
    }

    fn send(&self, msg: AppMessage) -> anyhow::Result<()> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => anyhow::anyhow!("ui queue full, update dropped"),
            TrySendError::Closed(_) => anyhow::anyhow!("ui loop has exited"),
        })
    }
}

impl PresentationAdapter for ChannelAdapter {
    fn on_snapshot(&self, snapshot: &PlaybackSnapshot) -> anyhow::Result<()> {
        self.send(AppMessage::Snapshot(snapshot.clone()))
    }

    fn on_server_down(&self) -> anyhow::Result<()> {
        self.send(AppMessage::ServerDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PlaybackSnapshot {
        PlaybackSnapshot {
            game: "Chrono Trigger".into(),
            track: "Corridors of Time".into(),
            cover: None,
            remaining_time: 42.0,
            track_length: None,
        }
    }

    #[test]
    fn test_forwards_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let adapter = ChannelAdapter::new(tx);
        adapter.on_snapshot(&snapshot()).unwrap();
        // full queue is an error, not a wait
        assert!(adapter.on_server_down().is_err());

        match rx.try_recv().unwrap() {
            AppMessage::Snapshot(s) => assert_eq!(s.game, "Chrono Trigger"),
            _ => panic!("expected a snapshot"),
        }
        adapter.on_server_down().unwrap();
        assert!(matches!(rx.try_recv().unwrap(), AppMessage::ServerDown));
    }

    #[test]
    fn test_closed_ui_is_an_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(ChannelAdapter::new(tx).on_snapshot(&snapshot()).is_err());
    }
}
