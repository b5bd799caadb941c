use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};

use crate::tray::startup::StartupManager;

const DESKTOP_FILE: &str = "scripttray.desktop";

/// Freedesktop autostart entry (`$XDG_CONFIG_HOME/autostart`).
#[derive(Debug, Clone)]
pub struct XdgAutostart {
    entry: PathBuf,
    exe: PathBuf,
}

impl XdgAutostart {
    pub fn new(autostart_dir: impl AsRef<Path>, exe: impl Into<PathBuf>) -> Self {
        Self {
            entry: autostart_dir.as_ref().join(DESKTOP_FILE),
            exe: exe.into(),
        }
    }

    pub fn for_current_user() -> Result<Self> {
        let config_home = match env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let home = env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
                PathBuf::from(home).join(".config")
            }
        };
        let exe = env::current_exe().context("current_exe")?;
        Ok(Self::new(config_home.join("autostart"), exe))
    }

    fn desktop_entry(&self) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec=\"{}\"\nX-GNOME-Autostart-enabled=true\n",
            crate::APP_NAME,
            self.exe.display()
        )
    }
}

impl StartupManager for XdgAutostart {
    fn is_enabled(&self) -> Result<bool> {
        Ok(self.entry.exists())
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            if let Some(parent) = self.entry.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(&self.entry, self.desktop_entry())
                .with_context(|| format!("write {}", self.entry.display()))?;
        } else if self.entry.exists() {
            fs::remove_file(&self.entry)
                .with_context(|| format!("remove {}", self.entry.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_desktop_entry() {
        let dir = tempfile::tempdir().unwrap();
        let autostart = XdgAutostart::new(dir.path().join("autostart"), "/usr/bin/scripttray");

        assert!(!autostart.is_enabled().unwrap());
        autostart.set_enabled(true).unwrap();
        assert!(autostart.is_enabled().unwrap());

        let text = fs::read_to_string(dir.path().join("autostart").join(DESKTOP_FILE)).unwrap();
        assert!(text.contains("Exec=\"/usr/bin/scripttray\""));

        autostart.set_enabled(false).unwrap();
        assert!(!autostart.is_enabled().unwrap());
        // Disabling twice is fine.
        autostart.set_enabled(false).unwrap();
    }
}
