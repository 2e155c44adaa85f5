pub mod renderers;
pub mod sheet;
pub mod templates;
pub mod views;
