/// `TabHost` over the chrome.* extension APIs, plus settings and messaging
/// helpers shared by the background worker and the popup

use crate::host::{HostError, HostResult, TabHost, TabQuery};
use crate::operations::{BulkCommand, BulkSummary};
use crate::storage::{SETTINGS_KEYS, Settings};
use crate::tab_data::{GroupColor, GroupId, Tab, TabGroup, TabId, WindowSnapshot};
use async_trait::async_trait;
use log::info;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryTabs(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryWindows() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getGroup(group_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn groupTabs(tab_ids: JsValue, group_id: Option<i32>) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateGroup(group_id: i32, title: &str, color: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn ungroupTabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn setMuted(tab_id: i32, muted: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn activateTab(tab_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getSettings(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setSettings(values: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendBulkCommand(command: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = watchTabs)]
    fn watch_tabs_js(on_change: &js_sys::Function) -> js_sys::Function;

    #[wasm_bindgen(js_name = registerListeners)]
    fn register_listeners_js(
        on_created: &js_sys::Function,
        on_updated: &js_sys::Function,
        on_window_removed: &js_sys::Function,
        on_storage_changed: &js_sys::Function,
        on_message: &js_sys::Function,
    );
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum QueryArgs {
    All,
    #[serde(rename_all = "camelCase")]
    Window { window_id: i32 },
    CurrentWindow,
}

impl From<TabQuery> for QueryArgs {
    fn from(query: TabQuery) -> Self {
        match query {
            TabQuery::All => QueryArgs::All,
            TabQuery::Window(window_id) => QueryArgs::Window { window_id: window_id.0 },
            TabQuery::CurrentWindow => QueryArgs::CurrentWindow,
        }
    }
}

/// Callbacks the background worker hands to `register_listeners`
pub struct Listeners<'a> {
    pub on_created: &'a js_sys::Function,
    pub on_updated: &'a js_sys::Function,
    pub on_window_removed: &'a js_sys::Function,
    pub on_storage_changed: &'a js_sys::Function,
    pub on_message: &'a js_sys::Function,
}

pub fn register_listeners(listeners: &Listeners<'_>) {
    register_listeners_js(
        listeners.on_created,
        listeners.on_updated,
        listeners.on_window_removed,
        listeners.on_storage_changed,
        listeners.on_message,
    );
}

/// Subscription to tab open/close/load events; dropping it unsubscribes
pub struct TabWatch {
    _on_change: Closure<dyn Fn()>,
    unsubscribe: js_sys::Function,
}

impl Drop for TabWatch {
    fn drop(&mut self) {
        if let Err(e) = self.unsubscribe.call0(&JsValue::NULL) {
            log::warn!("Failed to remove tab listeners: {:?}", e);
        }
    }
}

/// Run `on_change` whenever a tab is opened, closed or finishes loading
pub fn watch_tabs(on_change: impl Fn() + 'static) -> TabWatch {
    let on_change = Closure::wrap(Box::new(on_change) as Box<dyn Fn()>);
    let unsubscribe = watch_tabs_js(on_change.as_ref().unchecked_ref());
    TabWatch {
        _on_change: on_change,
        unsubscribe,
    }
}

/// The browser, reached through `bridge.js`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeHost;

#[async_trait(?Send)]
impl TabHost for ChromeHost {
    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<Tab>> {
        let tabs_js = queryTabs(to_js(&QueryArgs::from(query))?).await.map_err(rejected)?;
        from_js(tabs_js)
    }

    async fn query_windows(&self) -> HostResult<Vec<WindowSnapshot>> {
        let windows_js = queryWindows().await.map_err(rejected)?;
        from_js(windows_js)
    }

    async fn get_group(&self, group_id: GroupId) -> HostResult<TabGroup> {
        let group_js = getGroup(group_id.0)
            .await
            .map_err(|_| HostError::GroupNotFound(group_id))?;
        from_js(group_js)
    }

    async fn group_tabs(&self, tab_ids: &[TabId], group_id: Option<GroupId>) -> HostResult<GroupId> {
        let group_js = groupTabs(to_js(tab_ids)?, group_id.map(|g| g.0))
            .await
            .map_err(rejected)?;
        from_js(group_js)
    }

    async fn update_group(&self, group_id: GroupId, title: &str, color: GroupColor) -> HostResult<()> {
        updateGroup(group_id.0, title, color.as_str())
            .await
            .map_err(rejected)
    }

    async fn ungroup_tabs(&self, tab_ids: &[TabId]) -> HostResult<()> {
        ungroupTabs(to_js(tab_ids)?).await.map_err(rejected)
    }

    async fn set_muted(&self, tab_id: TabId, muted: bool) -> HostResult<()> {
        setMuted(tab_id.0, muted).await.map_err(rejected)
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> HostResult<()> {
        removeTabs(to_js(tab_ids)?).await.map_err(rejected)
    }

    async fn activate_tab(&self, tab_id: TabId) -> HostResult<()> {
        activateTab(tab_id.0).await.map_err(rejected)
    }
}

/// Read settings, writing defaults for keys that were never stored
pub async fn load_settings() -> HostResult<Settings> {
    let stored_js = getSettings(to_js(&SETTINGS_KEYS)?).await.map_err(rejected)?;
    let stored: Map<String, Value> = if stored_js.is_null() || stored_js.is_undefined() {
        Map::new()
    } else {
        from_js(stored_js)?
    };

    let missing = Settings::missing_defaults(&stored);
    if !missing.is_empty() {
        info!("Initializing settings: {:?}", missing.keys().collect::<Vec<_>>());
        setSettings(to_js(&missing)?).await.map_err(rejected)?;
    }

    Ok(Settings::from_storage(&stored))
}

pub async fn save_setting(key: &str, value: bool) -> HostResult<()> {
    let mut values = Map::new();
    values.insert(key.to_string(), Value::Bool(value));
    setSettings(to_js(&values)?).await.map_err(rejected)
}

/// Ask the background worker to run a bulk action
pub async fn send_bulk_command(command: BulkCommand) -> HostResult<BulkSummary> {
    let summary_js = sendBulkCommand(to_js(&command)?).await.map_err(rejected)?;
    from_js(summary_js)
}

pub fn to_js<T: Serialize + ?Sized>(value: &T) -> HostResult<JsValue> {
    // Maps must become plain objects for the chrome APIs
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| HostError::Decode(format!("{:?}", e)))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> HostResult<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Decode(format!("{:?}", e)))
}

fn rejected(err: JsValue) -> HostError {
    let message = match err.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    };
    HostError::Rejected(message)
}
