//! Local playback state. Touched only by user input, never by the poller.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientPlaybackState {
    pub is_playing: bool,
    pub is_muted: bool,
    /// Slider position in `0.0..=1.0`, not the gain.
    pub volume: f32,
}

impl Default for ClientPlaybackState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ClientPlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            is_playing: false,
            is_muted: false,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn gain(&self) -> f32 {
        slider_to_gain(self.volume)
    }

    pub fn play_icon(&self) -> &'static str {
        if self.is_playing {
            "■"
        } else {
            "▶"
        }
    }

    pub fn mute_icon(&self) -> &'static str {
        if self.is_muted {
            "🔇"
        } else {
            "🔊"
        }
    }
}

/// Loudness is perceived roughly logarithmically, so the slider drives the
/// gain quadratically.
pub fn slider_to_gain(slider: f32) -> f32 {
    let v = slider.clamp(0.0, 1.0);
    v * v
}

/// Slider position for a number key: `'1'..='9'` map to tenths, `'0'` and
/// anything else to full volume.
pub fn slider_for_key(key: char) -> f32 {
    match key.to_digit(10) {
        Some(d) if d > 0 => d as f32 / 10.0,
        _ => 1.0,
    }
}
