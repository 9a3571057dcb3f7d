// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Dynamic driver loading: libraries register themselves through the
//! `radiod_register_driver` entry point, same shape as
//! `trx_app::plugins::load_backend_plugins` with a new entrypoint name.

use std::ptr::NonNull;

use libloading::Library;

use crate::registry::DriverRegistry;

const PLUGIN_ENV: &str = "RADIOD_PLUGIN_DIRS";
const APP_NAME: &str = "radiod";
const DRIVER_ENTRYPOINT: &str = "radiod_register_driver";

/// Scans the configured plugin directories and loads every driver plugin
/// found, registering each into `registry` via its `radiod_register_driver`
/// entry point. The loaded `Library` handles are returned so the caller can
/// keep them alive for the process lifetime (dropping them would unload the
/// driver code out from under any running producer thread).
pub fn load_driver_plugins(registry: &mut DriverRegistry) -> Vec<Library> {
    let search_paths = radiod_app::plugins::plugin_search_paths(PLUGIN_ENV, APP_NAME);
    let context = NonNull::from(registry).cast::<std::ffi::c_void>();
    radiod_app::plugins::load_plugins_for_entrypoint(DRIVER_ENTRYPOINT, &search_paths, context)
}
