#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod keymap;
pub mod launcher;
pub mod logging;
pub mod preload;
pub mod store;
pub mod trending;
pub mod ui;
pub mod viewport;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
