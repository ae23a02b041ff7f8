pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod fetch;
pub mod process;
pub mod render;
pub mod stats;

pub use app::{ReloadOutcome, Viewer, ViewerState};
pub use error::LoadError;
