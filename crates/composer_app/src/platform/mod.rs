//! Terminal front-end: CLI, configuration, logging and the message loop.
mod app;
mod config;
mod effects;
mod logging;
mod ui;

pub use app::{run_app, Cli};
