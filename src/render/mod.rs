//! Console front end: a terminal [`ViewProjection`](crate::view::ViewProjection)
//! and a [`Shell`](crate::view::Shell) that reports to stderr.

mod console;
mod terminal;

pub use console::ConsoleShell;
pub use terminal::{Layout, SharedBuffer, TerminalView};
