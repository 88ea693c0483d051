//! Failure modes of a single metadata poll.
//!
//! Every variant means the same thing to the client: the source is "down".
//! The split only exists so logs can tell a dead network apart from a player
//! that answered with an explicit error.

/// Why a poll did not produce a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Connection refused, DNS failure, reset mid-body, ...
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request did not finish within the configured bound.
    #[error("request timed out")]
    Timeout,

    /// Anything other than 200 OK.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Body was not JSON or lacked required fields.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The source answered with `{ "error": ... }`.
    #[error("source reported an error: {0}")]
    Application(String),
}

impl PlaybackError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// True for errors the source itself reported, as opposed to transport
    /// or decoding failures on our side.
    pub fn is_application(&self) -> bool {
        matches!(self, Self::Application(_))
    }
}

impl From<serde_json::Error> for PlaybackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_malformed() {
        let err: PlaybackError = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();
        assert!(matches!(err, PlaybackError::Malformed(_)));
        assert!(!err.is_application());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PlaybackError::Application("down".into()).to_string(),
            "source reported an error: down"
        );
        assert_eq!(PlaybackError::Status(502).to_string(), "unexpected HTTP status 502");
    }
}
