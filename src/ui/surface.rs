use std::time::Duration;

use tokio::time::Instant;

use crate::progress::ProgressFrame;

/// Which part of the client the user may interact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Login,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

#[derive(Debug, Clone)]
struct PostedStatus {
    message: StatusMessage,
    expires_at: Instant,
}

/// Ephemeral status line. Each message carries its own expiry, so the expiry
/// of an old message can never remove one posted after it.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    posted: Option<PostedStatus>,
}

impl StatusBoard {
    /// Show `text` for `ttl`, replacing whatever is visible.
    pub fn post(&mut self, kind: StatusKind, text: impl Into<String>, ttl: Duration) {
        self.posted = Some(PostedStatus {
            message: StatusMessage {
                kind,
                text: text.into(),
            },
            expires_at: Instant::now() + ttl,
        });
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.posted.as_ref().map(|posted| &posted.message)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.posted.as_ref().map(|posted| posted.expires_at)
    }

    /// Clear the visible message if its lifetime is over. Returns true if something was cleared.
    pub fn expire_due(&mut self, now: Instant) -> bool {
        match &self.posted {
            Some(posted) if posted.expires_at <= now => {
                self.posted = None;
                true
            }
            _ => false,
        }
    }
}

/// The single status/progress surface shared by the session gate and the export client.
#[derive(Debug, Clone)]
pub struct Surface {
    pub section: Section,
    pub controls_enabled: bool,
    pub progress_visible: bool,
    pub progress: ProgressFrame,
    pub progress_status: String,
    pub status: StatusBoard,
}

pub const IDLE_PROGRESS_STATUS: &str = "Waiting for server...";

impl Default for Surface {
    fn default() -> Self {
        Self {
            section: Section::Login,
            controls_enabled: true,
            progress_visible: false,
            progress: ProgressFrame { percent: 0.0 },
            progress_status: IDLE_PROGRESS_STATUS.to_string(),
            status: StatusBoard::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn status_expires_after_its_ttl() {
        let mut board = StatusBoard::default();
        board.post(StatusKind::Success, "Signed out", Duration::from_secs(3));

        assert!(!board.expire_due(Instant::now()));
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(board.expire_due(Instant::now()));
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_does_not_clear_newer_message() {
        let mut board = StatusBoard::default();
        board.post(StatusKind::Error, "first", Duration::from_secs(3));
        tokio::time::advance(Duration::from_secs(2)).await;
        board.post(StatusKind::Success, "second", Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!board.expire_due(Instant::now()));
        assert_eq!(board.current().map(|m| m.text.as_str()), Some("second"));
    }
}
