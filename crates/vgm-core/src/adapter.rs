//! The presentation side of the poll loop.

use crate::config::FallbackConfig;
use crate::snapshot::PlaybackSnapshot;

/// Receives the outcome of every poll.
///
/// Implementations render; they must not block. An `Err` is logged by the
/// poller and otherwise ignored, so a broken renderer can never stall the
/// schedule.
pub trait PresentationAdapter: Send + Sync {
    fn on_snapshot(&self, snapshot: &PlaybackSnapshot) -> anyhow::Result<()>;

    /// The source is unreachable or reported an error. Show the fallback and
    /// drop any "playing" indication.
    fn on_server_down(&self) -> anyhow::Result<()>;
}

/// What the screen shows. Built fresh from each snapshot, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub page_title: String,
    pub game: String,
    pub track: String,
    pub cover: Option<String>,
    pub track_length: Option<f64>,
    pub degraded: bool,
}

impl NowPlaying {
    pub fn from_snapshot(snapshot: &PlaybackSnapshot) -> Self {
        Self {
            page_title: snapshot.page_title(),
            game: snapshot.game.clone(),
            track: snapshot.track.clone(),
            cover: snapshot.cover.clone(),
            track_length: snapshot.track_length,
            degraded: false,
        }
    }

    pub fn server_down(fallback: &FallbackConfig) -> Self {
        Self {
            page_title: format!("♫ {}", fallback.game),
            game: fallback.game.clone(),
            track: fallback.track.clone(),
            cover: fallback.cover.clone().filter(|c| !c.trim().is_empty()),
            track_length: None,
            degraded: true,
        }
    }

    /// Placeholder until the first poll completes.
    pub fn loading() -> Self {
        Self {
            page_title: "♫".to_string(),
            game: String::new(),
            track: "Loading…".to_string(),
            cover: None,
            track_length: None,
            degraded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrono_trigger() -> PlaybackSnapshot {
        PlaybackSnapshot {
            game: "Chrono Trigger".into(),
            track: "Corridors of Time".into(),
            cover: Some("ct.png".into()),
            remaining_time: 42.0,
            track_length: Some(180.0),
        }
    }

    #[test]
    fn test_render_snapshot() {
        let view = NowPlaying::from_snapshot(&chrono_trigger());
        assert_eq!(view.game, "Chrono Trigger");
        assert_eq!(view.track, "Corridors of Time");
        assert_eq!(view.page_title, "♫ Chrono Trigger");
        assert_eq!(view.cover.as_deref(), Some("ct.png"));
        assert!(!view.degraded);
    }

    #[test]
    fn test_render_is_idempotent() {
        let snap = chrono_trigger();
        let first = NowPlaying::from_snapshot(&snap);
        let second = NowPlaying::from_snapshot(&snap);
        assert_eq!(first, second);
    }

    #[test]
    fn test_server_down_view() {
        let view = NowPlaying::server_down(&FallbackConfig::default());
        assert!(view.degraded);
        assert_eq!(view.game, "Music server is down");
        assert_eq!(view.track, "I'm probably doing maintenance");
        assert_eq!(view.cover, None);
    }
}
