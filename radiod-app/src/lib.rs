// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod config;
pub mod logging;
pub mod plugins;
pub mod util;

pub use config::IniDocument;
pub use logging::init_logging;
pub use util::normalize_name;
