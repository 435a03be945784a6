use std::borrow::Cow;

use ratatui::prelude::Stylize;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::surface::StatusKind;

/// Accent color used for the panel title and the progress gauge.
pub const ACCENT: Color = Color::Indexed(208);

pub fn title_span<'a>(text: impl Into<Cow<'a, str>>) -> Span<'a> {
    let owned = text.into().into_owned();
    Span::from(owned).bold().fg(ACCENT)
}

/// Dimmed line for hints and idle placeholders.
pub fn secondary_line<'a>(text: impl Into<Cow<'a, str>>) -> Line<'a> {
    let owned = text.into().into_owned();
    Line::from(owned.dim())
}

pub fn gauge_style() -> Style {
    Style::default().fg(ACCENT).bg(Color::DarkGray)
}

pub fn status_style(kind: StatusKind) -> Style {
    let color = match kind {
        StatusKind::Info => Color::Cyan,
        StatusKind::Success => Color::Green,
        StatusKind::Error => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
