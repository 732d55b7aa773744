/// Tab Herder - Chrome Extension that auto-groups tabs by domain
/// Built with Rust + WASM + Yew

pub mod background;
pub mod category;
pub mod chrome;
pub mod domain;
pub mod group_store;
pub mod host;
pub mod operations;
pub mod reconciler;
pub mod search;
pub mod storage;
pub mod tab_data;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export the domain classifier for JavaScript access
#[wasm_bindgen]
pub fn classify_domain(url: &str) -> Option<String> {
    domain::classify_domain(url)
}

// Start auto-grouping in the background service worker
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
