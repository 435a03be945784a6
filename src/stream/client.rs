use std::future::{pending, Future};
use std::time::Duration;

use chrono::NaiveDate;
use futures::StreamExt;
use tokio::time::{sleep_until, Instant};

use crate::config::{Config, TimingConfig};
use crate::error::{AppError, ExportFailure, Result};
use crate::export::{deliver_export, ExportPayload, FileSink};
use crate::progress::ProgressAnimator;
use crate::ui::{StatusKind, Surface, IDLE_PROGRESS_STATUS};
use crate::utils::today;

use super::event::ExportEvent;
use super::transport::FrameStream;

const FAR_FUTURE: Duration = Duration::from_secs(24 * 60 * 60);

/// How a finished job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { files: Vec<String> },
    Failed(ExportFailure),
}

enum Wake {
    Frame(Option<Result<String>>),
    Reset,
    Animate,
    StatusExpired,
}

/// Owns one export job at a time: its progress stream, its progress animation
/// and the delayed reset that follows a completed export.
pub struct ExportStreamClient<S> {
    sink: S,
    animator: ProgressAnimator,
    frame_interval: Duration,
    timings: TimingConfig,
    date_source: fn() -> NaiveDate,
    stream: Option<FrameStream>,
    next_frame_at: Option<Instant>,
    reset_at: Option<Instant>,
    active: bool,
    outcome: Option<JobOutcome>,
}

impl<S: FileSink> ExportStreamClient<S> {
    pub fn new(sink: S, config: &Config) -> Self {
        Self {
            sink,
            animator: ProgressAnimator::from_config(&config.animation),
            frame_interval: config.animation.frame_interval,
            timings: config.timings.clone(),
            date_source: today,
            stream: None,
            next_frame_at: None,
            reset_at: None,
            active: false,
            outcome: None,
        }
    }

    /// Replace the calendar used for export filenames.
    pub fn with_date_source(mut self, date_source: fn() -> NaiveDate) -> Self {
        self.date_source = date_source;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn animator(&self) -> &ProgressAnimator {
        &self.animator
    }

    /// True from `start` until the controls are handed back.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Outcome of the most recent job, once it reached a terminal event.
    pub fn outcome(&self) -> Option<&JobOutcome> {
        self.outcome.as_ref()
    }

    /// Begin a job: take the controls, reset the bar and open the stream with `open`.
    /// A stream that cannot be opened ends the job as a transport failure.
    pub async fn start<F, Fut>(&mut self, surface: &mut Surface, open: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FrameStream>>,
    {
        if self.active {
            return Err(AppError::JobActive);
        }

        self.active = true;
        self.outcome = None;
        self.reset_at = None;
        self.stop_animation();

        surface.controls_enabled = false;
        surface.progress_visible = true;
        surface.progress = self.animator.frame();
        surface.progress_status = IDLE_PROGRESS_STATUS.to_string();

        match open().await {
            Ok(source) => {
                self.stream = Some(source);
                log::info!("Export job started");
            }
            Err(err) => self.transport_failed(surface, err.to_string()),
        }
        Ok(())
    }

    /// Anything left to wait for: frames, animation, a pending reset or a visible status.
    pub fn has_pending_work(&self, surface: &Surface) -> bool {
        self.is_streaming()
            || self.next_frame_at.is_some()
            || self.reset_at.is_some()
            || surface.status.deadline().is_some()
    }

    /// Wait for the earliest pending wake-up and apply it to `surface`.
    /// Returns false without waiting when nothing is pending.
    pub async fn tick(&mut self, surface: &mut Surface) -> bool {
        if !self.has_pending_work(surface) {
            return false;
        }

        let far = Instant::now() + FAR_FUTURE;
        let reset_at = self.reset_at;
        let frame_at = self.next_frame_at;
        let status_at = surface.status.deadline();
        let streaming = self.is_streaming();

        let wake = tokio::select! {
            biased;
            item = next_frame(&mut self.stream), if streaming => Wake::Frame(item),
            _ = sleep_until(reset_at.unwrap_or(far)), if reset_at.is_some() => Wake::Reset,
            _ = sleep_until(frame_at.unwrap_or(far)), if frame_at.is_some() => Wake::Animate,
            _ = sleep_until(status_at.unwrap_or(far)), if status_at.is_some() => Wake::StatusExpired,
        };

        match wake {
            Wake::Frame(Some(Ok(payload))) => self.handle_payload(surface, &payload),
            Wake::Frame(Some(Err(err))) => self.transport_failed(surface, err.to_string()),
            Wake::Frame(None) => self.transport_failed(
                surface,
                "stream ended before the export finished".to_string(),
            ),
            Wake::Reset => self.finish_reset(surface),
            Wake::Animate => self.animate(surface),
            Wake::StatusExpired => {
                surface.status.expire_due(Instant::now());
            }
        }
        true
    }

    /// Drive the current job until the controls are handed back and the bar is at rest,
    /// calling `on_update` after every change. Visible statuses are left to expire later.
    pub async fn run_until_idle<F>(&mut self, surface: &mut Surface, mut on_update: F) -> Option<JobOutcome>
    where
        F: FnMut(&Surface),
    {
        on_update(surface);
        while self.active || self.animator.is_running() {
            if !self.tick(surface).await {
                break;
            }
            on_update(surface);
        }
        self.outcome.clone()
    }

    fn handle_payload(&mut self, surface: &mut Surface, payload: &str) {
        if !self.is_streaming() {
            log::debug!("Ignoring frame received after the stream closed");
            return;
        }

        let event = match ExportEvent::parse(payload) {
            Ok(event) => event,
            Err(err) => {
                log::warn!("Skipping malformed progress frame: {}", err);
                return;
            }
        };

        if event.is_terminal() {
            self.close_stream();
        }

        match event {
            ExportEvent::Progress { percent, message } => {
                log::debug!("progress {:.0}%: {}", percent, message);
                self.retarget(percent);
                surface.progress_status = message;
            }
            ExportEvent::Error { message } => {
                self.fail(surface, ExportFailure::StreamProtocol(message));
            }
            ExportEvent::Complete { message, payload } => {
                surface.progress_status = message;
                self.complete(surface, payload);
            }
        }
    }

    fn complete(&mut self, surface: &mut Surface, payload: ExportPayload) {
        self.retarget(100.0);

        let files = deliver_export(&self.sink, &payload, (self.date_source)());
        log::info!("Export complete: {}", files.join(", "));

        surface.status.post(
            StatusKind::Success,
            format!("Files downloaded: {}", files.join(", ")),
            self.timings.result_status_ttl,
        );
        self.reset_at = Some(Instant::now() + self.timings.reset_delay);
        self.outcome = Some(JobOutcome::Completed { files });
    }

    fn transport_failed(&mut self, surface: &mut Surface, detail: String) {
        log::error!("Export stream connection failed: {}", detail);
        self.close_stream();
        self.fail(surface, ExportFailure::StreamTransport(detail));
    }

    fn fail(&mut self, surface: &mut Surface, failure: ExportFailure) {
        let text = failure.to_string();
        if let ExportFailure::StreamProtocol(message) = &failure {
            log::error!("Export failed on the server: {}", message);
        }

        surface.progress_status = text.clone();
        surface
            .status
            .post(StatusKind::Error, text, self.timings.result_status_ttl);
        surface.controls_enabled = true;

        self.active = false;
        self.outcome = Some(JobOutcome::Failed(failure));
    }

    fn finish_reset(&mut self, surface: &mut Surface) {
        self.reset_at = None;
        self.stop_animation();

        surface.progress_visible = false;
        surface.progress = self.animator.frame();
        surface.progress_status = IDLE_PROGRESS_STATUS.to_string();
        surface.controls_enabled = true;

        self.active = false;
    }

    fn animate(&mut self, surface: &mut Surface) {
        surface.progress = self.animator.step();
        self.next_frame_at = self
            .animator
            .is_running()
            .then(|| Instant::now() + self.frame_interval);
    }

    fn retarget(&mut self, percent: f64) {
        if self.animator.set_target(percent) {
            self.next_frame_at = Some(Instant::now() + self.frame_interval);
        } else if !self.animator.is_running() {
            self.next_frame_at = None;
        }
    }

    fn stop_animation(&mut self) {
        self.animator.reset();
        self.next_frame_at = None;
    }

    fn close_stream(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Export stream closed");
        }
    }
}

async fn next_frame(stream: &mut Option<FrameStream>) -> Option<Result<String>> {
    match stream {
        Some(stream) => stream.next().await,
        None => pending().await,
    }
}
