use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::SettingKey;

/// Sent to the JSON settings editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorRequest {
    #[serde(rename = "label")]
    pub key: SettingKey,
    pub json: Value,
}

/// Returned by the editor when the user submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorResult {
    #[serde(rename = "label")]
    pub key: SettingKey,
    pub old: Value,
    pub new: Value,
}

impl EditorRequest {
    pub fn submit(&self, new: Value) -> EditorResult {
        EditorResult {
            key: self.key,
            old: self.json.clone(),
            new,
        }
    }
}
