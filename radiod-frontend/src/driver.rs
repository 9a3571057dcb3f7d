// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::BTreeMap;

use num_complex::Complex;
use radiod_core::EngineError;

/// The hardware section of the config file for one front end, as a flat
/// key/value map (already section-merged by the caller).
pub type DriverConfig = BTreeMap<String, String>;

/// Result of a successful `FrontendDriver::setup` call.
#[derive(Debug, Clone, Copy)]
pub struct SetupStatus {
    pub samprate_hz: f64,
    pub isreal: bool,
}

/// Where a started driver pushes its sample blocks. Implemented by the
/// filter-input stage in `radiod-engine`; kept as a trait here so this crate
/// has no dependency on the engine crate.
pub trait SampleSink: Send {
    /// `samples` is real-valued audio-rate IQ for `isreal` front ends
    /// (packed one real sample per `Complex::re`, `im` ignored) or true
    /// complex IQ otherwise, matching what `setup` reported.
    fn push_block(&self, samples: &[Complex<f32>]) -> Result<(), EngineError>;
}

/// Polymorphic front-end driver surface: `{setup, start, tune?, gain?,
/// atten?}`. `tune`/`gain`/`atten` are optional; a driver backing a
/// fixed-tuned or fixed-gain device simply doesn't override them, and
/// callers treat the default `Err` as a warning, not a failure.
pub trait FrontendDriver: Send {
    fn setup(&mut self, cfg: &DriverConfig) -> Result<SetupStatus, EngineError>;

    /// Spawns whatever production mechanism the driver needs (a thread, a
    /// callback registration, ...) and begins pushing blocks into `sink`.
    /// Returns once the producer is running; it does not block for the
    /// lifetime of the stream.
    fn start(&mut self, sink: Box<dyn SampleSink>) -> Result<(), EngineError>;

    fn tune(&mut self, _hz: f64) -> Result<f64, EngineError> {
        Err(EngineError::DriverFailure(
            "tune not supported by this device".into(),
        ))
    }

    fn gain(&mut self, _db: f64) -> Result<f64, EngineError> {
        Err(EngineError::DriverFailure(
            "gain not supported by this device".into(),
        ))
    }

    fn atten(&mut self, _db: f64) -> Result<f64, EngineError> {
        Err(EngineError::DriverFailure(
            "atten not supported by this device".into(),
        ))
    }
}
