// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Front-end driver abstraction: the polymorphic surface over concrete
//! radios (rx888, airspy, airspyhf, funcube, rtlsdr, sig_gen, sdrplay),
//! discovered either from a compiled-in registry or dynamically loaded.

pub mod driver;
pub mod drivers;
pub mod plugins;
pub mod registry;

pub use driver::{DriverConfig, FrontendDriver, SampleSink, SetupStatus};
pub use registry::DriverRegistry;
