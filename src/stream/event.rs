use serde::Deserialize;
use serde_json::Value;

use crate::export::{ExportPayload, Row};

const DEFAULT_PROGRESS_MESSAGE: &str = "Processing...";
const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";
const COMPLETE_PERCENT: f64 = 100.0;

/// One parsed frame of the export progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Progress { percent: f64, message: String },
    Complete { message: String, payload: ExportPayload },
    Error { message: String },
}

impl ExportEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExportEvent::Progress { .. })
    }

    /// Classify a frame's JSON payload.
    ///
    /// An `error` key wins whatever its siblings hold. A frame is a completion
    /// only at `progress: 100` with both datasets present; anything else is an
    /// ordinary progress update.
    pub fn parse(payload: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(payload)?;

        if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
            let message = match error {
                Value::String(text) if !text.trim().is_empty() => text.clone(),
                Value::String(_) => UNKNOWN_SERVER_ERROR.to_string(),
                other => other.to_string(),
            };
            return Ok(ExportEvent::Error { message });
        }

        let raw: RawFrame = serde_json::from_value(value)?;
        let percent = raw.progress.as_ref().and_then(Value::as_f64);
        let message = raw
            .status
            .as_ref()
            .and_then(Value::as_str)
            .filter(|status| !status.is_empty())
            .unwrap_or(DEFAULT_PROGRESS_MESSAGE)
            .to_string();

        match (percent, raw.playlists, raw.tracks) {
            (Some(percent), Some(playlists), Some(tracks)) if percent == COMPLETE_PERCENT => {
                Ok(ExportEvent::Complete {
                    message,
                    payload: ExportPayload {
                        playlists,
                        playlists_headers: raw.playlists_headers.unwrap_or_default(),
                        tracks,
                    },
                })
            }
            _ => Ok(ExportEvent::Progress {
                percent: percent.unwrap_or(0.0),
                message,
            }),
        }
    }
}

/// Sibling fields of a non-error frame. `progress` and `status` are read
/// leniently; a mistyped value falls back to its default.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    progress: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    playlists: Option<Vec<Row>>,
    #[serde(default)]
    playlists_headers: Option<Row>,
    #[serde(default)]
    tracks: Option<Vec<Row>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_progress_frames() {
        let event = ExportEvent::parse(r#"{"status": "Downloading playlists...", "progress": 15}"#)
            .expect("parse");
        assert_eq!(
            event,
            ExportEvent::Progress {
                percent: 15.0,
                message: "Downloading playlists...".to_string()
            }
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn error_wins_over_other_fields() {
        let event = ExportEvent::parse(r#"{"error": "quota exceeded", "progress": 0}"#).expect("parse");
        assert_eq!(
            event,
            ExportEvent::Error {
                message: "quota exceeded".to_string()
            }
        );
        assert!(event.is_terminal());
    }

    #[test]
    fn empty_error_still_terminates() {
        let event = ExportEvent::parse(r#"{"error": ""}"#).expect("parse");
        assert_eq!(
            event,
            ExportEvent::Error {
                message: UNKNOWN_SERVER_ERROR.to_string()
            }
        );
    }

    #[test]
    fn completion_requires_both_datasets() {
        let bare = ExportEvent::parse(r#"{"progress": 100, "status": "done"}"#).expect("parse");
        assert!(matches!(bare, ExportEvent::Progress { percent, .. } if percent == 100.0));

        let half = ExportEvent::parse(r#"{"progress": 100, "playlists": [["P1"]]}"#).expect("parse");
        assert!(!half.is_terminal());

        let full = ExportEvent::parse(
            r#"{"progress": 100, "status": "done", "playlists": [["P1"]],
                "playlists_headers": ["name"], "tracks": [["T1", "A1"]]}"#,
        )
        .expect("parse");
        match full {
            ExportEvent::Complete { message, payload } => {
                assert_eq!(message, "done");
                assert_eq!(payload.playlists, vec![vec![json!("P1")]]);
                assert_eq!(payload.playlists_headers, vec![json!("name")]);
                assert_eq!(payload.tracks, vec![vec![json!("T1"), json!("A1")]]);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn datasets_before_full_progress_do_not_complete() {
        let early = ExportEvent::parse(
            r#"{"progress": 40, "status": "x", "playlists": [], "tracks": []}"#,
        )
        .expect("parse");
        assert_eq!(
            early,
            ExportEvent::Progress {
                percent: 40.0,
                message: "x".to_string()
            }
        );

        let unnumbered = ExportEvent::parse(r#"{"playlists": [], "tracks": []}"#).expect("parse");
        assert!(!unnumbered.is_terminal());
    }

    #[test]
    fn error_survives_mistyped_siblings() {
        let event = ExportEvent::parse(r#"{"error": "quota exceeded", "progress": null, "status": 5}"#)
            .expect("parse");
        assert_eq!(
            event,
            ExportEvent::Error {
                message: "quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn mistyped_status_falls_back_to_default_message() {
        let event = ExportEvent::parse(r#"{"progress": "soon", "status": 5}"#).expect("parse");
        assert_eq!(
            event,
            ExportEvent::Progress {
                percent: 0.0,
                message: DEFAULT_PROGRESS_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let event = ExportEvent::parse(r#"{"status": null}"#).expect("parse");
        assert_eq!(
            event,
            ExportEvent::Progress {
                percent: 0.0,
                message: DEFAULT_PROGRESS_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn rejects_non_json_payloads() {
        assert!(ExportEvent::parse("not json").is_err());
        assert!(ExportEvent::parse("42").is_err());
    }
}
