//! AppState: everything the widgets read to draw a frame.

use std::time::Instant;

use vgm_core::{ClientPlaybackState, CycleOutcome, CycleReport, NowPlaying, PlaybackSnapshot};

pub struct AppState {
    pub now_playing: NowPlaying,
    pub playback: ClientPlaybackState,
    /// When the current snapshot arrived and how much was left then.
    pub fetched: Option<(Instant, f64)>,
    pub last_report: Option<CycleReport>,
    pub last_error: Option<String>,
    /// Latest complaint from the audio element, shown in the status bar.
    pub player_error: Option<String>,
    pub fullscreen: bool,
    pub show_debug: bool,
}

impl AppState {
    pub fn new(playback: ClientPlaybackState) -> Self {
        Self {
            now_playing: NowPlaying::loading(),
            playback,
            fetched: None,
            last_report: None,
            last_error: None,
            player_error: None,
            fullscreen: false,
            show_debug: false,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: &PlaybackSnapshot, now: Instant) {
        self.now_playing = NowPlaying::from_snapshot(snapshot);
        self.fetched = Some((now, snapshot.remaining_time));
    }

    pub fn apply_server_down(&mut self, view: NowPlaying) {
        self.now_playing = view;
        self.fetched = None;
    }

    pub fn apply_report(&mut self, report: CycleReport) {
        if let CycleOutcome::Down { reason } = &report.outcome {
            self.last_error = Some(reason.clone());
        }
        self.last_report = Some(report);
    }

    /// `(elapsed, length)` of the current track as of `now`, counting down
    /// from the server's figure. `None` when the length is unknown.
    pub fn track_position(&self, now: Instant) -> Option<(f64, f64)> {
        let length = self.now_playing.track_length?;
        let (at, remaining) = self.fetched?;
        let left = (remaining - now.duration_since(at).as_secs_f64()).max(0.0);
        Some(((length - left).clamp(0.0, length), length))
    }
}
