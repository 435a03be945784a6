use std::path::{Path, PathBuf};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;

use crate::config::Config;
use crate::error::{AppError, ExportFailure, Result};
use crate::export::{summarize_csv_file, DownloadDir};
use crate::session::{ApiClient, SessionGate, SessionState, SystemBrowser};
use crate::stream::{ExportStreamClient, JobOutcome};
use crate::ui::{Section, StatusKind, Surface, TerminalPanel};
use crate::utils::{format_file_modified, list_csv_files};

/// Cells in the text progress bar printed by the `export` command.
const PROGRESS_TRACK: u16 = 20;

/// Wires the session gate, the export client and the shared surface to the
/// command line and to the interactive panel.
pub struct AppController {
    config: Config,
    gate: SessionGate<ApiClient, SystemBrowser>,
    client: ExportStreamClient<DownloadDir>,
    surface: Surface,
}

enum Flow {
    Continue,
    Exit,
}

enum Wake {
    Input(Option<std::io::Result<Event>>),
    Ticked,
}

impl AppController {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.server)?;
        let gate = SessionGate::new(api, SystemBrowser, &config.timings);
        let client = ExportStreamClient::new(DownloadDir::new(&config.download_dir), &config);

        Ok(Self {
            config,
            gate,
            client,
            surface: Surface::default(),
        })
    }

    pub async fn run_interactive(&mut self) -> Result<()> {
        self.gate.refresh(&mut self.surface).await;

        let mut panel = TerminalPanel::new()?;
        let mut keys = EventStream::new();

        loop {
            panel.draw(&self.surface)?;

            let pending = self.client.has_pending_work(&self.surface);
            let wake = tokio::select! {
                event = keys.next() => Wake::Input(event),
                _ = self.client.tick(&mut self.surface), if pending => Wake::Ticked,
            };

            match wake {
                Wake::Input(Some(Ok(Event::Key(key)))) if key.kind == KeyEventKind::Press => {
                    if let Flow::Exit = self.handle_key(key).await? {
                        break;
                    }
                }
                Wake::Input(Some(Ok(_))) | Wake::Ticked => {}
                Wake::Input(Some(Err(err))) => return Err(err.into()),
                Wake::Input(None) => break,
            }
        }

        panel.restore()
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Flow::Exit);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Flow::Exit),
            _ if !self.surface.controls_enabled => {}
            KeyCode::Char('r') => {
                self.gate.refresh(&mut self.surface).await;
            }
            KeyCode::Char('l') if self.surface.section == Section::Login => {
                if self.gate.login(&mut self.surface).await.is_ok() {
                    self.surface.status.post(
                        StatusKind::Info,
                        "Finish signing in in your browser, then press r",
                        self.config.timings.result_status_ttl,
                    );
                }
            }
            KeyCode::Char('o') if self.surface.section == Section::Export => {
                // A failure is already on the status line.
                let _ = self.gate.logout(&mut self.surface).await;
            }
            KeyCode::Char('e') => self.request_export().await?,
            _ => {}
        }
        Ok(Flow::Continue)
    }

    async fn request_export(&mut self) -> Result<()> {
        if self.gate.state() != SessionState::Authenticated {
            self.surface.status.post(
                StatusKind::Error,
                "Sign in before exporting",
                self.config.timings.result_status_ttl,
            );
            return Ok(());
        }

        match self.begin_export().await {
            Err(AppError::JobActive) => {
                log::debug!("Ignoring export request while a job is running");
                Ok(())
            }
            other => other,
        }
    }

    async fn begin_export(&mut self) -> Result<()> {
        let api = self.gate.backend();
        self.client
            .start(&mut self.surface, move || api.open_export_stream())
            .await
    }

    pub async fn print_status(&mut self) -> Result<()> {
        let state = self.gate.refresh(&mut self.surface).await;
        match state {
            SessionState::Authenticated => println!("Signed in to {}", self.config.server.base_url),
            SessionState::Unauthenticated => {
                println!("Not signed in to {}", self.config.server.base_url)
            }
        }
        Ok(())
    }

    pub async fn login(&mut self) -> Result<()> {
        let url = self
            .gate
            .login(&mut self.surface)
            .await
            .map_err(|failure| AppError::message(failure.to_string()))?;
        println!("Opened {} in your browser.", url);
        println!("Run `playlist-export status` once you have signed in.");
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.gate
            .logout(&mut self.surface)
            .await
            .map_err(|failure| AppError::message(failure.to_string()))?;
        println!("Signed out");
        Ok(())
    }

    /// Run one export to completion, echoing progress as it arrives.
    pub async fn export(&mut self) -> Result<()> {
        if self.gate.refresh(&mut self.surface).await != SessionState::Authenticated {
            return Err(AppError::NotAuthenticated);
        }

        self.begin_export().await?;

        let mut last_status = String::new();
        let outcome = self
            .client
            .run_until_idle(&mut self.surface, |surface| {
                if surface.progress_visible && surface.progress_status != last_status {
                    last_status = surface.progress_status.clone();
                    println!("{}", progress_line(surface));
                }
            })
            .await;

        match outcome {
            Some(JobOutcome::Completed { files }) => {
                for file in files {
                    println!("Saved {}", self.config.download_dir.join(file).display());
                }
                Ok(())
            }
            Some(JobOutcome::Failed(failure)) => Err(AppError::message(describe_failure(&failure))),
            None => Err(AppError::message("export ended without a result")),
        }
    }

    /// Summarize one CSV file, or list the exports in the download directory.
    pub fn inspect(&self, file: Option<&Path>) -> Result<()> {
        let Some(file) = file else {
            let entries = list_csv_files(&self.config.download_dir);
            if entries.is_empty() {
                println!("No CSV files in {}", self.config.download_dir.display());
            }
            for entry in entries {
                println!(
                    "{}  {:>10} bytes  {}",
                    format_file_modified(entry.modified),
                    entry.size,
                    entry.name
                );
            }
            return Ok(());
        };

        let path = self.resolve_export_path(file);
        let summary = summarize_csv_file(&path)?;
        println!("{}", path.display());
        println!("  records: {}", summary.records);
        println!("  columns: {}", summary.max_columns);
        if !summary.first_record.is_empty() {
            println!("  first:   {}", summary.first_record.join(" | "));
        }
        Ok(())
    }

    fn resolve_export_path(&self, file: &Path) -> PathBuf {
        if file.is_relative() && !file.exists() {
            let candidate = self.config.download_dir.join(file);
            if candidate.exists() {
                return candidate;
            }
        }
        file.to_path_buf()
    }
}

fn progress_line(surface: &Surface) -> String {
    let filled = usize::from(surface.progress.width(PROGRESS_TRACK));
    format!(
        "[{:<width$}] {:>4}  {}",
        "#".repeat(filled),
        surface.progress.label(),
        surface.progress_status,
        width = usize::from(PROGRESS_TRACK)
    )
}

fn describe_failure(failure: &ExportFailure) -> String {
    match failure {
        ExportFailure::StreamTransport(detail) => format!("{}: {}", failure, detail),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressFrame;

    fn controller(download_dir: &Path) -> AppController {
        let mut config = Config::builtin();
        config.download_dir = download_dir.to_path_buf();
        AppController::new(config).expect("controller")
    }

    #[test]
    fn transport_failures_keep_their_detail() {
        let failure = ExportFailure::StreamTransport("connection refused".to_string());
        assert_eq!(describe_failure(&failure), "Connection error: connection refused");

        let failure = ExportFailure::StreamProtocol("quota exceeded".to_string());
        assert_eq!(describe_failure(&failure), "Error: quota exceeded");
    }

    #[test]
    fn progress_line_fills_the_track() {
        let surface = Surface {
            progress: ProgressFrame { percent: 50.0 },
            progress_status: "Fetching tracks".to_string(),
            ..Surface::default()
        };
        assert_eq!(
            progress_line(&surface),
            "[##########          ]  50%  Fetching tracks"
        );
    }

    #[test]
    fn relative_names_resolve_into_download_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("tracks_2024-06-30.csv"), "a,b").expect("write");
        let controller = controller(dir.path());

        let resolved = controller.resolve_export_path(Path::new("tracks_2024-06-30.csv"));
        assert_eq!(resolved, dir.path().join("tracks_2024-06-30.csv"));

        let missing = controller.resolve_export_path(Path::new("missing.csv"));
        assert_eq!(missing, PathBuf::from("missing.csv"));
    }

    #[tokio::test]
    async fn export_refused_when_server_unreachable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::builtin();
        config.server.base_url = "http://127.0.0.1:9".to_string();
        config.download_dir = dir.path().to_path_buf();
        let mut controller = AppController::new(config).expect("controller");

        let err = controller.export().await.expect_err("export should be refused");
        assert!(matches!(err, AppError::NotAuthenticated));
        assert!(!controller.client.is_active());
    }
}
