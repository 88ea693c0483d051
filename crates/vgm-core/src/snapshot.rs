//! The metadata wire contract and the normalized snapshot built from it.
//!
//! The endpoint answers either with
//!
//! ```json
//! { "game": "...", "track": "...", "cover": "...", "remainingTime": 42, "trackLength": 180 }
//! ```
//!
//! or with `{ "error": "..." }`. Older servers sent `remaining` instead of
//! `remainingTime` and omitted `trackLength`; both are accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::PlaybackError;

/// One fetched, immutable description of what is playing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub game: String,
    pub track: String,
    pub cover: Option<String>,
    /// Seconds left in the track as measured by the server at fetch time.
    pub remaining_time: f64,
    pub track_length: Option<f64>,
}

impl PlaybackSnapshot {
    /// Saturates at `Duration::MAX` for values too large to represent.
    pub fn remaining(&self) -> Duration {
        Duration::try_from_secs_f64(self.remaining_time).unwrap_or(Duration::MAX)
    }

    pub fn page_title(&self) -> String {
        format!("♫ {}", self.game)
    }
}

/// Success body of the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSnapshot {
    pub game: String,
    pub track: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(alias = "remaining")]
    pub remaining_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_length: Option<f64>,
}

/// Error body of the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub error: String,
}

/// Either body; serializes untagged so the JSON matches the contract exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataResponse {
    Snapshot(WireSnapshot),
    Error(WireError),
}

impl MetadataResponse {
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(WireError { error: msg.into() })
    }
}

impl From<WireSnapshot> for PlaybackSnapshot {
    fn from(w: WireSnapshot) -> Self {
        let cover = w
            .cover
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self {
            game: w.game,
            track: w.track,
            cover,
            // a server clock running slightly past the end reports < 0
            remaining_time: w.remaining_time.max(0.0),
            track_length: w.track_length.filter(|l| *l >= 0.0),
        }
    }
}

/// Decode a metadata response body.
///
/// A document carrying a non-null `error` field is an application error even
/// when the other fields are present; anything that is not a JSON object
/// with the snapshot fields is malformed.
pub fn parse_payload(body: &[u8]) -> Result<PlaybackSnapshot, PlaybackError> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(PlaybackError::malformed("expected a JSON object"));
    }
    match value.get("error") {
        None | Some(Value::Null) => {}
        Some(Value::String(msg)) => return Err(PlaybackError::Application(msg.clone())),
        Some(other) => return Err(PlaybackError::Application(other.to_string())),
    }
    let wire: WireSnapshot = serde_json::from_value(value)?;
    if !wire.remaining_time.is_finite() {
        return Err(PlaybackError::malformed("remainingTime is not a finite number"));
    }
    Ok(wire.into())
}

/// Render seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Parse `m:ss` or `h:mm:ss` into seconds.
pub fn parse_clock(text: &str) -> Option<u64> {
    let mut total = 0u64;
    let mut parts = 0;
    for part in text.trim().split(':') {
        let n: u64 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(n)?;
        parts += 1;
    }
    (2..=3).contains(&parts).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let body = br#"{"game":"Chrono Trigger","track":"Corridors of Time","cover":"ct.png","remainingTime":42,"trackLength":180}"#;
        let snap = parse_payload(body).unwrap();
        assert_eq!(snap.game, "Chrono Trigger");
        assert_eq!(snap.track, "Corridors of Time");
        assert_eq!(snap.cover.as_deref(), Some("ct.png"));
        assert_eq!(snap.remaining(), Duration::from_secs(42));
        assert_eq!(snap.track_length, Some(180.0));
        assert_eq!(snap.page_title(), "♫ Chrono Trigger");
    }

    #[test]
    fn test_legacy_field_name_and_missing_length() {
        let body = br#"{"game":"Mother","track":"Pollyanna","cover":"","remaining":12.5}"#;
        let snap = parse_payload(body).unwrap();
        assert_eq!(snap.remaining_time, 12.5);
        assert_eq!(snap.track_length, None);
        assert_eq!(snap.cover, None);
    }

    #[test]
    fn test_cover_is_trimmed_and_nullable() {
        let body = br#"{"game":"g","track":"t","cover":"https://x/c.png\n","remainingTime":1}"#;
        assert_eq!(parse_payload(body).unwrap().cover.as_deref(), Some("https://x/c.png"));

        let body = br#"{"game":"g","track":"t","cover":null,"remainingTime":1}"#;
        assert_eq!(parse_payload(body).unwrap().cover, None);
    }

    #[test]
    fn test_huge_remaining_saturates() {
        let snap = parse_payload(br#"{"game":"g","track":"t","remainingTime":1e20}"#).unwrap();
        assert_eq!(snap.remaining(), Duration::MAX);
    }

    #[test]
    fn test_negative_remaining_is_clamped() {
        let body = br#"{"game":"g","track":"t","cover":"","remainingTime":-3}"#;
        assert_eq!(parse_payload(body).unwrap().remaining_time, 0.0);
    }

    #[test]
    fn test_error_field_wins() {
        let err = parse_payload(br#"{"error":"down"}"#).unwrap_err();
        assert!(matches!(err, PlaybackError::Application(ref m) if m == "down"));

        let err = parse_payload(br#"{"error":"x","game":"g","track":"t","remainingTime":1}"#)
            .unwrap_err();
        assert!(err.is_application());
    }

    #[test]
    fn test_malformed_bodies() {
        let bodies: [&[u8]; 5] = [
            b"<html>502 Bad Gateway</html>",
            b"",
            b"[1,2,3]",
            br#"{"game":"g"}"#,
            br#"{"game":"g","track":"t","remainingTime":"soon"}"#,
        ];
        for body in bodies {
            let err = parse_payload(body).unwrap_err();
            assert!(matches!(err, PlaybackError::Malformed(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_response_serializes_untagged() {
        let ok = MetadataResponse::Snapshot(WireSnapshot {
            game: "g".into(),
            track: "t (3:00)".into(),
            cover: Some(String::new()),
            remaining_time: 10.0,
            track_length: Some(180.0),
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["remainingTime"], 10.0);
        assert_eq!(json["trackLength"], 180.0);
        assert!(json.get("error").is_none());

        let err = serde_json::to_string(&MetadataResponse::error("Music server is down")).unwrap();
        assert_eq!(err, r#"{"error":"Music server is down"}"#);
    }

    #[test]
    fn test_clock_helpers() {
        assert_eq!(format_clock(225.0), "3:45");
        assert_eq!(format_clock(5.0), "0:05");
        assert_eq!(format_clock(3723.0), "1:02:03");
        assert_eq!(parse_clock("3:45"), Some(225));
        assert_eq!(parse_clock("1:02:03"), Some(3723));
        assert_eq!(parse_clock("45"), None);
        assert_eq!(parse_clock("a:bc"), None);
    }
}
