mod api;
mod app;
mod components;
mod config;
mod editor;
mod logging;
mod models;
mod pages;
mod state;
mod storage;
mod toc;
mod util;

use crate::config::EnvConfig;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init(&EnvConfig::from_window().log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "toc admin starting");
    mount_to_body(app::App);
}
