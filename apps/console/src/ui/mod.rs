//! Text rendering and the interactive shell.

pub mod render;
pub mod shell;
