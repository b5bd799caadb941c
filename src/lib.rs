pub mod buffer;
pub mod collect;
pub mod config;
pub mod dialog;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod menu;
pub mod platform;
pub mod prompt;
pub mod runner;
pub mod settings;
pub mod tray;
pub mod verify;

pub const APP_NAME: &str = "Script Tray";
