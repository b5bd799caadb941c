use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::settings::{SettingKey, SettingsStore};

pub const CONFIG_DIR_ENV: &str = "SCRIPTTRAY_CONFIG_DIR";

/// Directory holding one `<key>.json` file per setting.
pub fn resolve_settings_dir() -> Option<PathBuf> {
    if let Ok(p) = env::var(CONFIG_DIR_ENV) {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    if let Some(appdata) = env::var_os("APPDATA") {
        return Some(PathBuf::from(appdata).join("scripttray"));
    }

    if let Some(home) = env::var_os("HOME") {
        return Some(PathBuf::from(home).join(".config").join("scripttray"));
    }

    None
}

/// File-backed settings store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open_default() -> Result<Self> {
        let dir = resolve_settings_dir().ok_or_else(|| {
            anyhow!("No settings directory available (set {CONFIG_DIR_ENV} or ensure APPDATA/HOME is present)")
        })?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_path(&self, key: SettingKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self, key: SettingKey) -> Result<Option<Value>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let v: Value =
            serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(v))
    }

    fn save(&mut self, key: SettingKey, value: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create settings dir {}", self.dir.display()))?;

        let path = self.key_path(key);
        let mut s = serde_json::to_string_pretty(value).context("serialize setting")?;
        s.push('\n');
        fs::write(&path, s.as_bytes()).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        for key in SettingKey::ALL {
            let path = self.key_path(key);
            if path.exists() {
                fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}
