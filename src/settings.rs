use std::{collections::BTreeMap, fmt};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Persisted setting keys. The string forms are the on-disk key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SettingKey {
    #[serde(rename = "encoding")]
    Encoding,
    #[serde(rename = "appList")]
    AppList,
    #[serde(rename = "launchCmds")]
    LaunchCmds,
    #[serde(rename = "debug")]
    Debug,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::Encoding,
        SettingKey::AppList,
        SettingKey::LaunchCmds,
        SettingKey::Debug,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Encoding => "encoding",
            SettingKey::AppList => "appList",
            SettingKey::LaunchCmds => "launchCmds",
            SettingKey::Debug => "debug",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Only the list-shaped settings are edited as raw JSON.
    pub fn is_json_editable(self) -> bool {
        matches!(self, SettingKey::AppList | SettingKey::LaunchCmds)
    }

    /// Changing these keys changes what the tray menu shows.
    pub fn affects_menu(self) -> bool {
        matches!(self, SettingKey::AppList | SettingKey::LaunchCmds)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_ENCODING: &str = "utf8";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Encoding used to decode command output.
    pub encoding: String,
    /// Applications that must be resolvable on `PATH` at startup.
    pub app_list: Vec<String>,
    /// Raw menu configuration, parsed by [`crate::menu::parse`] on every rebuild.
    pub launch_cmds: Value,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            app_list: Vec::new(),
            launch_cmds: Value::Array(Vec::new()),
            debug: false,
        }
    }
}

/// Durable key/value persistence for [`Settings`].
pub trait SettingsStore: Send {
    fn load(&self, key: SettingKey) -> anyhow::Result<Option<Value>>;
    fn save(&mut self, key: SettingKey, value: &Value) -> anyhow::Result<()>;
    fn clear(&mut self) -> anyhow::Result<()>;
}

impl Settings {
    /// Loads every key, falling back to the default for any key that is
    /// missing or fails to load. Failures are returned for reporting.
    pub fn load(store: &dyn SettingsStore) -> (Self, Vec<Error>) {
        let mut settings = Settings::default();
        let mut errors = Vec::new();

        for key in SettingKey::ALL {
            let loaded = store
                .load(key)
                .and_then(|v| match v {
                    Some(value) => settings.set_value(key, value),
                    None => Ok(()),
                });
            if let Err(source) = loaded {
                tracing::warn!(%key, error = %source, "falling back to default");
                errors.push(Error::SettingsLoad { key, source });
            }
        }

        (settings, errors)
    }

    pub fn value(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::Encoding => Value::String(self.encoding.clone()),
            SettingKey::AppList => {
                Value::Array(self.app_list.iter().cloned().map(Value::String).collect())
            }
            SettingKey::LaunchCmds => self.launch_cmds.clone(),
            SettingKey::Debug => Value::Bool(self.debug),
        }
    }

    /// Replaces one field from its JSON form. The field is untouched on error.
    pub fn set_value(&mut self, key: SettingKey, value: Value) -> anyhow::Result<()> {
        match key {
            SettingKey::Encoding => {
                let Value::String(s) = value else {
                    return Err(anyhow!("encoding must be a string"));
                };
                self.encoding = s;
            }
            SettingKey::AppList => {
                self.app_list = serde_json::from_value(value)
                    .context("appList must be an array of strings")?;
            }
            SettingKey::LaunchCmds => {
                if !value.is_array() && !value.is_null() {
                    return Err(anyhow!("launchCmds must be an array"));
                }
                self.launch_cmds = value;
            }
            SettingKey::Debug => {
                self.debug = value
                    .as_bool()
                    .ok_or_else(|| anyhow!("debug must be a boolean"))?;
            }
        }
        Ok(())
    }

    pub fn save(&self, store: &mut dyn SettingsStore, key: SettingKey) -> Result<(), Error> {
        store
            .save(key, &self.value(key))
            .map_err(|source| Error::SettingsSave { key, source })?;
        tracing::debug!(%key, "saved setting");
        Ok(())
    }

    /// Saves every key, continuing past failures.
    pub fn save_all(&self, store: &mut dyn SettingsStore) -> Vec<Error> {
        SettingKey::ALL
            .into_iter()
            .filter_map(|key| self.save(store, key).err())
            .collect()
    }

    /// Clears the store, restores defaults in memory, then persists them once.
    pub fn reset(&mut self, store: &mut dyn SettingsStore) -> Vec<Error> {
        let mut errors = Vec::new();
        if let Err(e) = store.clear() {
            errors.push(Error::SettingsClear(e));
        }
        *self = Settings::default();
        errors.extend(self.save_all(store));
        errors
    }
}

/// In-memory store. Records every save so callers can check write patterns.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<SettingKey, Value>,
    saves: Vec<SettingKey>,
    failing: Option<SettingKey>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: SettingKey, value: Value) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Makes every load and save of `key` fail.
    pub fn failing(mut self, key: SettingKey) -> Self {
        self.failing = Some(key);
        self
    }

    pub fn get(&self, key: SettingKey) -> Option<&Value> {
        self.values.get(&key)
    }

    pub fn saves(&self) -> &[SettingKey] {
        &self.saves
    }

    fn check(&self, key: SettingKey) -> anyhow::Result<()> {
        if self.failing == Some(key) {
            return Err(anyhow!("store unavailable for {key}"));
        }
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: SettingKey) -> anyhow::Result<Option<Value>> {
        self.check(key)?;
        Ok(self.values.get(&key).cloned())
    }

    fn save(&mut self, key: SettingKey, value: &Value) -> anyhow::Result<()> {
        self.check(key)?;
        self.values.insert(key, value.clone());
        self.saves.push(key);
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.values.clear();
        Ok(())
    }
}
