use anyhow::{anyhow, Result};

use crate::tray::startup::StartupManager;

#[cfg(target_os = "macos")]
mod launch_agent;
#[cfg(all(unix, not(target_os = "macos")))]
pub mod xdg_autostart;

/// Login-item registration for the current OS.
pub fn startup_manager() -> Result<Box<dyn StartupManager + Send>> {
    #[cfg(target_os = "macos")]
    {
        return Ok(Box::new(launch_agent::LaunchAgent::for_current_user()?));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        return Ok(Box::new(xdg_autostart::XdgAutostart::for_current_user()?));
    }

    #[cfg(not(unix))]
    {
        Err(anyhow!("Start at login is not supported on this OS"))
    }
}

/// Used when no startup manager could be created; reports as disabled.
#[derive(Debug, Default)]
pub struct NoStartup;

impl StartupManager for NoStartup {
    fn is_enabled(&self) -> Result<bool> {
        Ok(false)
    }

    fn set_enabled(&self, _enabled: bool) -> Result<()> {
        Err(anyhow!("Start at login is not available"))
    }
}
