/// Background worker: owns the grouping state and reacts to browser events
use crate::chrome::{self, ChromeHost, Listeners, from_js, to_js};
use crate::group_store::GroupStore;
use crate::operations::{BulkActions, BulkCommand};
use crate::reconciler::{GroupOutcome, GroupingReconciler};
use crate::storage::{Settings, StorageChange};
use crate::tab_data::{Tab, TabChange, WindowId};
use log::{debug, error, warn};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

struct Background {
    reconciler: GroupingReconciler<ChromeHost>,
    bulk: BulkActions<ChromeHost>,
    settings: Cell<Settings>,
}

impl Background {
    fn new() -> Self {
        let host = Rc::new(ChromeHost);
        let store = GroupStore::shared();
        Background {
            reconciler: GroupingReconciler::new(host.clone(), store.clone()),
            bulk: BulkActions::new(host, store),
            settings: Cell::new(Settings::default()),
        }
    }

    fn apply_settings(&self, settings: Settings) {
        self.settings.set(settings);
        self.reconciler.set_auto_grouping(settings.auto_grouping_enabled);
    }
}

/// Wire the event listeners; the closures keep the state alive for the
/// lifetime of the worker
pub fn start() {
    let background = Rc::new(Background::new());

    {
        let background = background.clone();
        spawn_local(async move {
            match chrome::load_settings().await {
                Ok(settings) => background.apply_settings(settings),
                Err(e) => error!("Failed to load settings, using defaults: {}", e),
            }
        });
    }

    let on_created = {
        let background = background.clone();
        Closure::wrap(Box::new(move |tab_js: JsValue| {
            let Some(tab) = decode::<Tab>("created tab", tab_js) else { return };
            let background = background.clone();
            spawn_local(async move {
                let outcome = background.reconciler.on_tab_created(&tab).await;
                log_outcome(&tab, &outcome);
            });
        }) as Box<dyn Fn(JsValue)>)
    };

    let on_updated = {
        let background = background.clone();
        Closure::wrap(Box::new(move |change_js: JsValue, tab_js: JsValue| {
            let Some(change) = decode::<TabChange>("tab change", change_js) else { return };
            let Some(tab) = decode::<Tab>("updated tab", tab_js) else { return };
            let background = background.clone();
            spawn_local(async move {
                let outcome = background.reconciler.on_tab_updated(&change, &tab).await;
                log_outcome(&tab, &outcome);
            });
        }) as Box<dyn Fn(JsValue, JsValue)>)
    };

    let on_window_removed = {
        let background = background.clone();
        Closure::wrap(Box::new(move |window_id: i32| {
            background.reconciler.on_window_removed(WindowId(window_id));
        }) as Box<dyn Fn(i32)>)
    };

    let on_storage_changed = {
        let background = background.clone();
        Closure::wrap(Box::new(move |changes_js: JsValue, area: String| {
            if area != "sync" {
                return;
            }
            let Some(changes) = decode::<HashMap<String, StorageChange>>("storage change", changes_js)
            else {
                return;
            };
            let mut settings = background.settings.get();
            if settings.apply_changes(&changes) {
                background.apply_settings(settings);
            }
        }) as Box<dyn Fn(JsValue, String)>)
    };

    let on_message = {
        let background = background.clone();
        Closure::wrap(Box::new(move |message: JsValue| -> js_sys::Promise {
            let background = background.clone();
            future_to_promise(async move {
                let command: BulkCommand = from_js(message).map_err(|e| JsValue::from_str(&e.to_string()))?;
                let summary = background.bulk.run(command).await;
                to_js(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
            })
        }) as Box<dyn Fn(JsValue) -> js_sys::Promise>)
    };

    chrome::register_listeners(&Listeners {
        on_created: on_created.as_ref().unchecked_ref(),
        on_updated: on_updated.as_ref().unchecked_ref(),
        on_window_removed: on_window_removed.as_ref().unchecked_ref(),
        on_storage_changed: on_storage_changed.as_ref().unchecked_ref(),
        on_message: on_message.as_ref().unchecked_ref(),
    });

    on_created.forget();
    on_updated.forget();
    on_window_removed.forget();
    on_storage_changed.forget();
    on_message.forget();
}

fn decode<T: serde::de::DeserializeOwned>(what: &str, value: JsValue) -> Option<T> {
    match from_js(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("Ignoring undecodable {}: {}", what, e);
            None
        }
    }
}

fn log_outcome(tab: &Tab, outcome: &GroupOutcome) {
    match outcome {
        GroupOutcome::Failed { label, error } => {
            warn!("Auto-grouping tab {} as {} failed: {}", tab.id, label, error);
        }
        other => debug!("Auto-grouping tab {}: {:?}", tab.id, other),
    }
}
