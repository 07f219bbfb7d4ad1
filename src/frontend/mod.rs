pub mod tui;

pub use tui::{StartupOptions, TuiApplication};
