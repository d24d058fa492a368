//! Color constants for the terminal user interface.

use ratatui::style::Color;

// These accent the board columns and cards by task status.

/// Used for backlog tasks
pub const SLATE_BLUE: Color = Color::Rgb(86, 110, 160);
/// Used for in-progress tasks
pub const AMBER: Color = Color::Rgb(224, 160, 32);
/// Used for tasks whose descendants are being worked
pub const DIM_TEAL: Color = Color::Rgb(52, 110, 110);
/// Used for completed tasks
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
