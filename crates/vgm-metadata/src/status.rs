//! Parsing `mpc -f %file%` output.
//!
//! While something is playing, mpc prints exactly three lines:
//!
//! ```text
//! Chrono Trigger/Corridors of Time.mp3
//! [playing] #12/140   1:23/3:00 (46%)
//! volume: 80%   repeat: on    random: on    single: off   consume: off
//! ```
//!
//! Stopped or idle, it prints only the options line. Music is laid out as
//! `<game>/<track>.<ext>` under the music directory.

use std::path::Path;

use vgm_core::snapshot::{parse_clock, WireSnapshot};

/// What the listener sees while mpd is unavailable or idle.
pub const DOWN_MESSAGE: &str = "Music server is down";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StatusError {
    #[error("expected 3 status lines, got {0}")]
    LineCount(usize),
    #[error("cannot split '{0}' into game and track")]
    FileLayout(String),
    #[error("no elapsed/total time in '{0}'")]
    NoTime(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSong {
    pub game: String,
    pub track: String,
    pub elapsed_secs: u64,
    pub total_secs: u64,
    /// Total as mpc printed it, e.g. `3:00`.
    pub total_text: String,
}

impl CurrentSong {
    pub fn remaining_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.elapsed_secs)
    }

    /// The wire form, with the track length appended to the track name.
    pub fn to_wire(&self, cover: String) -> WireSnapshot {
        WireSnapshot {
            game: self.game.clone(),
            track: format!("{} ({})", self.track, self.total_text),
            cover: Some(cover),
            remaining_time: self.remaining_secs() as f64,
            track_length: Some(self.total_secs as f64),
        }
    }
}

pub fn parse_status(output: &str) -> Result<CurrentSong, StatusError> {
    let lines: Vec<&str> = output.lines().collect();
    if lines.len() != 3 {
        return Err(StatusError::LineCount(lines.len()));
    }

    let file = lines[0].trim();
    let (game, rest) = file
        .split_once('/')
        .ok_or_else(|| StatusError::FileLayout(file.to_string()))?;
    let track = Path::new(rest)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StatusError::FileLayout(file.to_string()))?;
    if game.is_empty() {
        return Err(StatusError::FileLayout(file.to_string()));
    }

    let status = lines[1];
    let (elapsed_secs, total_secs, total_text) = status
        .split_whitespace()
        .find_map(|token| {
            let (elapsed, total) = token.split_once('/')?;
            Some((parse_clock(elapsed)?, parse_clock(total)?, total.to_string()))
        })
        .ok_or_else(|| StatusError::NoTime(status.to_string()))?;

    Ok(CurrentSong {
        game: game.to_string(),
        track: track.to_string(),
        elapsed_secs,
        total_secs,
        total_text,
    })
}
