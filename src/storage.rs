/// Persisted settings in chrome.storage.sync
///
/// Values are decoded once at the storage boundary. Only a JSON boolean
/// counts; a missing or null key means the default, and anything else is
/// logged and treated as the default too.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const AUTO_GROUPING_KEY: &str = "autoGroupingEnabled";
pub const DARK_MODE_KEY: &str = "darkMode";

pub const DEFAULT_AUTO_GROUPING: bool = true;
pub const DEFAULT_DARK_MODE: bool = false;

/// Keys this extension reads, for `chrome.storage.sync.get`
pub const SETTINGS_KEYS: [&str; 2] = [AUTO_GROUPING_KEY, DARK_MODE_KEY];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub auto_grouping_enabled: bool,
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            auto_grouping_enabled: DEFAULT_AUTO_GROUPING,
            dark_mode: DEFAULT_DARK_MODE,
        }
    }
}

/// One entry of a storage change notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default)]
    pub new_value: Option<Value>,
    #[serde(default)]
    pub old_value: Option<Value>,
}

impl Settings {
    /// Decode the result of a storage `get`
    pub fn from_storage(stored: &Map<String, Value>) -> Settings {
        Settings {
            auto_grouping_enabled: decode_flag(AUTO_GROUPING_KEY, stored.get(AUTO_GROUPING_KEY), DEFAULT_AUTO_GROUPING),
            dark_mode: decode_flag(DARK_MODE_KEY, stored.get(DARK_MODE_KEY), DEFAULT_DARK_MODE),
        }
    }

    /// Keys absent from storage, with the defaults to write for them
    pub fn missing_defaults(stored: &Map<String, Value>) -> Map<String, Value> {
        let defaults = Settings::default();
        let mut missing = Map::new();

        if !stored.contains_key(AUTO_GROUPING_KEY) {
            missing.insert(AUTO_GROUPING_KEY.to_string(), Value::Bool(defaults.auto_grouping_enabled));
        }
        if !stored.contains_key(DARK_MODE_KEY) {
            missing.insert(DARK_MODE_KEY.to_string(), Value::Bool(defaults.dark_mode));
        }

        missing
    }

    /// Apply one changed key; returns true if it was one of ours and the
    /// decoded value differs
    pub fn apply_change(&mut self, key: &str, new_value: Option<&Value>) -> bool {
        let (slot, default) = match key {
            AUTO_GROUPING_KEY => (&mut self.auto_grouping_enabled, DEFAULT_AUTO_GROUPING),
            DARK_MODE_KEY => (&mut self.dark_mode, DEFAULT_DARK_MODE),
            _ => return false,
        };

        let decoded = decode_flag(key, new_value, default);
        let changed = *slot != decoded;
        *slot = decoded;
        changed
    }

    /// Apply a whole change notification; returns true if anything changed
    pub fn apply_changes<'a, I>(&mut self, changes: I) -> bool
    where
        I: IntoIterator<Item = (&'a String, &'a StorageChange)>,
    {
        changes
            .into_iter()
            .fold(false, |changed, (key, change)| {
                self.apply_change(key, change.new_value.as_ref()) || changed
            })
    }
}

fn decode_flag(key: &str, value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        None | Some(Value::Null) => default,
        Some(other) => {
            warn!("Ignoring non-boolean value for {}: {}", key, other);
            default
        }
    }
}
