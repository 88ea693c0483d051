//! User-facing playback controls over a live stream.
//!
//! The stream can't be paused: stopping disconnects, and playing reconnects
//! with a fresh `t=<epoch ms>` query parameter so no cache layer hands back a
//! stale segment.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::state::{slider_for_key, ClientPlaybackState};

/// The thing that actually makes sound.
#[async_trait]
pub trait AudioElement: Send {
    /// Connect to `url` and start playing, replacing any current stream.
    async fn load(&mut self, url: &str) -> anyhow::Result<()>;
    /// Disconnect. Must be harmless when nothing is playing.
    async fn stop(&mut self) -> anyhow::Result<()>;
    async fn set_gain(&mut self, gain: f32) -> anyhow::Result<()>;
    async fn set_muted(&mut self, muted: bool) -> anyhow::Result<()>;
}

/// Append (or replace) the cache-busting `t` parameter.
pub fn cache_busted_url(base: &str, timestamp_ms: i64) -> anyhow::Result<String> {
    let mut url = reqwest::Url::parse(base)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "t")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("t", &timestamp_ms.to_string());
    Ok(url.to_string())
}

pub struct Controls<A: AudioElement> {
    audio: A,
    stream_url: String,
    state: ClientPlaybackState,
}

impl<A: AudioElement> Controls<A> {
    pub fn new(audio: A, stream_url: impl Into<String>, initial_volume: f32) -> Self {
        Self {
            audio,
            stream_url: stream_url.into(),
            state: ClientPlaybackState::new(initial_volume),
        }
    }

    pub fn state(&self) -> ClientPlaybackState {
        self.state
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub async fn toggle_playback(&mut self) -> anyhow::Result<()> {
        if self.state.is_playing {
            self.stop().await
        } else {
            self.play().await
        }
    }

    pub async fn play(&mut self) -> anyhow::Result<()> {
        let url = cache_busted_url(&self.stream_url, chrono::Utc::now().timestamp_millis())?;
        info!("controls: connecting to {}", url);
        self.audio.load(&url).await?;
        self.audio.set_gain(self.state.gain()).await?;
        self.audio.set_muted(self.state.is_muted).await?;
        self.state.is_playing = true;
        Ok(())
    }

    /// Disconnect from the stream. The state flips to stopped even if the
    /// player complains, since a failed stop leaves nothing we can resume.
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        let was_playing = std::mem::replace(&mut self.state.is_playing, false);
        if was_playing {
            info!("controls: disconnecting");
        }
        self.audio.stop().await
    }

    pub async fn toggle_mute(&mut self) -> anyhow::Result<()> {
        self.state.is_muted = !self.state.is_muted;
        debug!("controls: muted={}", self.state.is_muted);
        self.audio.set_muted(self.state.is_muted).await
    }

    pub async fn set_volume_slider(&mut self, slider: f32) -> anyhow::Result<()> {
        self.state.volume = slider.clamp(0.0, 1.0);
        debug!(
            "controls: volume slider={:.2} gain={:.3}",
            self.state.volume,
            self.state.gain()
        );
        self.audio.set_gain(self.state.gain()).await
    }

    /// Number-key shortcut; returns the new slider position.
    pub async fn set_volume_key(&mut self, key: char) -> anyhow::Result<f32> {
        let slider = slider_for_key(key);
        self.set_volume_slider(slider).await?;
        Ok(slider)
    }
}
