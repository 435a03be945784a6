use std::io::{Stdout, Write};

use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};

use crate::error::Result;

use super::styles::{gauge_style, secondary_line, status_style, title_span};
use super::surface::{Section, Surface};

/// Rows taken by the panel, borders included.
pub const PANEL_HEIGHT: u16 = 7;

/// Raw-mode inline panel below the shell prompt. The terminal is restored on drop.
pub struct TerminalPanel {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl TerminalPanel {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(PANEL_HEIGHT),
            },
        )?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    pub fn draw(&mut self, surface: &Surface) -> Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.size();
            render_surface(frame, area, surface);
        })?;
        Ok(())
    }

    /// Restore the terminal once, regardless of how many times it is called.
    pub fn restore(&mut self) -> Result<()> {
        if !self.restored {
            self.terminal.show_cursor()?;
            terminal::disable_raw_mode()?;
            let mut stdout = std::io::stdout();
            writeln!(stdout)?;
            stdout.flush()?;
            self.restored = true;
        }
        Ok(())
    }
}

impl Drop for TerminalPanel {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

pub fn section_title(section: Section) -> &'static str {
    match section {
        Section::Login => "Sign in",
        Section::Export => "Export playlists",
    }
}

pub fn key_hints(surface: &Surface) -> &'static str {
    if !surface.controls_enabled {
        return "export running...  [q] quit";
    }
    match surface.section {
        Section::Login => "[l] log in  [r] refresh  [q] quit",
        Section::Export => "[e] export  [o] log out  [r] refresh  [q] quit",
    }
}

/// Draw the section, progress gauge, progress status, status line and key hints.
pub fn render_surface(frame: &mut Frame, area: Rect, surface: &Surface) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title_span(section_title(surface.section)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    if surface.progress_visible {
        let gauge = Gauge::default()
            .gauge_style(gauge_style())
            .ratio(surface.progress.ratio())
            .label(surface.progress.label());
        frame.render_widget(gauge, rows[0]);
        frame.render_widget(Paragraph::new(surface.progress_status.as_str()), rows[1]);
    } else {
        frame.render_widget(Paragraph::new(secondary_line("no export running")), rows[0]);
    }

    if let Some(status) = surface.status.current() {
        let line = Line::from(Span::styled(status.text.as_str(), status_style(status.kind)));
        frame.render_widget(Paragraph::new(line), rows[2]);
    }

    frame.render_widget(Paragraph::new(secondary_line(key_hints(surface))), rows[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ratatui::backend::TestBackend;

    use crate::progress::ProgressFrame;
    use crate::ui::StatusKind;

    fn rendered(surface: &Surface) -> String {
        let backend = TestBackend::new(60, PANEL_HEIGHT);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal
            .draw(|frame| {
                let area = frame.size();
                render_surface(frame, area, surface);
            })
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn idle_login_panel_shows_login_hints() {
        let text = rendered(&Surface::default());
        assert!(text.contains("Sign in"), "{text}");
        assert!(text.contains("no export running"), "{text}");
        assert!(text.contains("[l] log in"), "{text}");
    }

    #[tokio::test]
    async fn running_export_shows_gauge_and_status() {
        let mut surface = Surface {
            section: Section::Export,
            controls_enabled: false,
            progress_visible: true,
            progress: ProgressFrame { percent: 42.4 },
            progress_status: "Fetching tracks for Road trip".to_string(),
            ..Surface::default()
        };
        surface
            .status
            .post(StatusKind::Error, "Connection error", Duration::from_secs(5));

        let text = rendered(&surface);
        assert!(text.contains("Export playlists"), "{text}");
        assert!(text.contains("42%"), "{text}");
        assert!(text.contains("Fetching tracks for Road trip"), "{text}");
        assert!(text.contains("Connection error"), "{text}");
        assert!(text.contains("export running"), "{text}");
    }
}
