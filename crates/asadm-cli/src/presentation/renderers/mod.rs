pub mod row;

pub use row::{RenderError, RenderOptions, TerminalSize, render};
