pub mod styles;
pub mod surface;
pub mod terminal;

pub use surface::{Section, StatusBoard, StatusKind, StatusMessage, Surface, IDLE_PROGRESS_STATUS};
pub use terminal::{key_hints, render_surface, TerminalPanel, PANEL_HEIGHT};
