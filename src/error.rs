use thiserror::Error;

use crate::menu::MenuError;
use crate::settings::SettingKey;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the tray core. None of them are fatal to the process.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error loading setting {key}.\n\n{source}")]
    SettingsLoad {
        key: SettingKey,
        #[source]
        source: anyhow::Error,
    },

    #[error("Error saving setting {key}.\n\n{source}")]
    SettingsSave {
        key: SettingKey,
        #[source]
        source: anyhow::Error,
    },

    #[error("Error clearing settings.\n\n{0}")]
    SettingsClear(#[source] anyhow::Error),

    #[error(transparent)]
    MalformedMenu(#[from] MenuError),

    #[error("Command:  {command}\nReturn Code:  {}\nError:  {stderr}", code_label(.code))]
    CommandExecution {
        command: String,
        code: Option<i32>,
        stderr: String,
        stdout: Option<String>,
    },

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Signal-terminated processes have no exit code.
pub fn code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}
