pub mod config;
pub mod console;

pub use config::*;
pub use console::{hide_console, show_console};
