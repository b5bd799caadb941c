use anyhow::Result;

/// Registers the tray to open when the user logs in.
pub trait StartupManager {
    /// Whether the login item is currently installed.
    fn is_enabled(&self) -> Result<bool>;

    /// Installs or removes the login item. Removing one that is absent is not an error.
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}
