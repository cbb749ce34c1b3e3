//! Terminal colorization for status output
//!
//! Applies ANSI escape codes to status lines using crossterm.

use crossterm::style::{Color, Stylize};

/// Outcome a status line reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
}

impl Status {
    fn marker(&self) -> &'static str {
        match self {
            Status::Ok => "✓",
            Status::Failed => "✗",
        }
    }

    fn color(&self) -> Color {
        match self {
            Status::Ok => Color::Green,
            Status::Failed => Color::Red,
        }
    }
}

/// Format a `✓`/`✗` status line
///
/// Only the marker is colored, so the message stays readable when copied.
pub fn status_line(status: Status, message: &str, colorize: bool) -> String {
    if colorize {
        format!("{} {}", status.marker().with(status.color()).bold(), message)
    } else {
        format!("{} {}", status.marker(), message)
    }
}
