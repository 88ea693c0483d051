//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;
use vgm_core::snapshot::parse_payload;
use vgm_core::{MetadataSource, NowPlaying, PlaybackError, PlaybackSnapshot, PresentationAdapter};

/// One scripted answer from the fake metadata source.
pub enum Reply {
    Snapshot(PlaybackSnapshot),
    /// Raw response body, run through the real payload parser.
    Body(&'static [u8]),
    /// Never answers.
    Stall,
}

/// Answers from a fixed script, then stalls forever. Records when each
/// fetch started on tokio's (possibly paused) clock.
pub struct ScriptedSource {
    replies: Mutex<VecDeque<Reply>>,
    fetched_at: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fetched_at: Mutex::new(Vec::new()),
        })
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetched_at.lock().unwrap().clone()
    }

    /// Offsets of every fetch relative to the first one, in whole seconds.
    pub fn fetch_offsets_secs(&self) -> Vec<f64> {
        let times = self.fetch_times();
        let Some(first) = times.first().copied() else {
            return Vec::new();
        };
        times
            .iter()
            .map(|t| (t.duration_since(first).as_secs_f64() * 1000.0).round() / 1000.0)
            .collect()
    }
}

#[async_trait]
impl MetadataSource for ScriptedSource {
    async fn fetch(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.fetched_at.lock().unwrap().push(Instant::now());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Stall);
        match reply {
            Reply::Snapshot(s) => Ok(s),
            Reply::Body(body) => parse_payload(body),
            Reply::Stall => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Snapshot(NowPlaying),
    ServerDown,
}

#[derive(Clone, Copy, PartialEq)]
pub enum Misbehave {
    No,
    Error,
    Panic,
}

/// Records every callback; can be told to fail.
pub struct RecordingAdapter {
    events: Mutex<Vec<Rendered>>,
    misbehave: Misbehave,
}

impl RecordingAdapter {
    pub fn new() -> Arc<Self> {
        Self::misbehaving(Misbehave::No)
    }

    pub fn misbehaving(misbehave: Misbehave) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            misbehave,
        })
    }

    pub fn events(&self) -> Vec<Rendered> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Rendered) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        match self.misbehave {
            Misbehave::No => Ok(()),
            Misbehave::Error => anyhow::bail!("render target gone"),
            Misbehave::Panic => panic!("renderer exploded"),
        }
    }
}

impl PresentationAdapter for RecordingAdapter {
    fn on_snapshot(&self, snapshot: &PlaybackSnapshot) -> anyhow::Result<()> {
        self.record(Rendered::Snapshot(NowPlaying::from_snapshot(snapshot)))
    }

    fn on_server_down(&self) -> anyhow::Result<()> {
        self.record(Rendered::ServerDown)
    }
}

pub fn snapshot(game: &str, track: &str, remaining: f64) -> PlaybackSnapshot {
    PlaybackSnapshot {
        game: game.to_string(),
        track: track.to_string(),
        cover: None,
        remaining_time: remaining,
        track_length: None,
    }
}

pub fn chrono_trigger() -> PlaybackSnapshot {
    PlaybackSnapshot {
        game: "Chrono Trigger".to_string(),
        track: "Corridors of Time".to_string(),
        cover: Some("ct.png".to_string()),
        remaining_time: 42.0,
        track_length: Some(180.0),
    }
}
