//! ANSI colouring for terminal output.
//!
//! Only the handful of colours the reporter needs.  Callers decide whether colour is wanted; see [use_color].
use std::io::IsTerminal;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Cyan,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Cyan => 36,
        }
    }
}

pub fn paint(enabled: bool, color: Color, text: &str) -> String {
    if !enabled || text.is_empty() {
        return text.to_string();
    }

    format!("\u{1b}[{}m{text}\u{1b}[0m", color.code())
}

/// Colour when stderr is a terminal and `NO_COLOR` is unset.
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}
