// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod agc;
pub mod channel;
pub mod config;
pub mod demod;
pub mod engine;
pub mod filter_input;
pub mod filter_output;
pub mod notch;
pub mod sap;
pub mod tuning;
pub mod wisdom;
pub mod worker;

pub use channel::{
    Channel, ChannelParams, ChannelParamsOverlay, ChannelRegistry, ChannelState, ChannelStats,
};
pub use config::EngineConfig;
pub use engine::Engine;
pub use filter_input::{FilterBlock, FilterInput, FilterInputSink};
pub use filter_output::FilterOutput;
pub use notch::{NotchSpec, NotchTable};
pub use tuning::{compute_tuning, Tuning};
pub use wisdom::WisdomCache;
