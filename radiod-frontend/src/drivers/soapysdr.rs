// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! SoapySDR-backed front end, covering the `rtlsdr` driver name (and any
//! other SoapySDR-compatible device reachable via a `args=` string).
//! Adapted from the teacher's `RealIqSource`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use num_complex::Complex;
use radiod_core::EngineError;
use soapysdr::Device;

use crate::driver::{DriverConfig, FrontendDriver, SampleSink, SetupStatus};

const READ_TIMEOUT_US: i64 = 1_000_000;
const READ_BLOCK_SIZE: usize = 4096;

pub struct SoapySdrDriver {
    args: String,
    device: Option<Device>,
    stop: Arc<AtomicBool>,
}

impl SoapySdrDriver {
    pub fn new(args: &str) -> Self {
        Self {
            args: args.to_string(),
            device: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FrontendDriver for SoapySdrDriver {
    fn setup(&mut self, cfg: &DriverConfig) -> Result<SetupStatus, EngineError> {
        let args = cfg.get("args").cloned().unwrap_or_else(|| self.args.clone());
        tracing::info!("Initializing SoapySDR device with args: {}", args);

        let device = Device::new(args.as_str())
            .map_err(|e| EngineError::HardwareSetup(format!("SoapySDR open failed: {}", e)))?;

        let samprate_hz: f64 = cfg
            .get("samprate")
            .map(|v| v.parse())
            .transpose()
            .map_err(|_| EngineError::Config("invalid samprate".into()))?
            .unwrap_or(2_048_000.0);

        device
            .set_sample_rate(soapysdr::Direction::Rx, 0, samprate_hz)
            .map_err(|e| EngineError::HardwareSetup(format!("set_sample_rate: {}", e)))?;

        if let Some(freq) = cfg.get("freq") {
            let freq_hz: f64 = freq
                .parse()
                .map_err(|_| EngineError::Config("invalid freq".into()))?;
            device
                .set_frequency(soapysdr::Direction::Rx, 0, freq_hz, ())
                .map_err(|e| EngineError::HardwareSetup(format!("set_frequency: {}", e)))?;
        }

        if let Some(gain) = cfg.get("gain") {
            let gain_db: f64 = gain
                .parse()
                .map_err(|_| EngineError::Config("invalid gain".into()))?;
            if let Err(e) = device.set_gain(soapysdr::Direction::Rx, 0, gain_db) {
                tracing::warn!("Failed to set gain: {}; using device default", e);
            }
        }

        self.args = args;
        self.device = Some(device);

        Ok(SetupStatus {
            samprate_hz,
            isreal: false,
        })
    }

    fn start(&mut self, sink: Box<dyn SampleSink>) -> Result<(), EngineError> {
        let device = self
            .device
            .take()
            .ok_or_else(|| EngineError::DriverFailure("start called before setup".into()))?;

        let mut stream = device
            .rx_stream::<Complex<f32>>(&[0])
            .map_err(|e| EngineError::HardwareSetup(format!("rx_stream: {}", e)))?;
        stream
            .activate(None)
            .map_err(|e| EngineError::HardwareSetup(format!("activate: {}", e)))?;

        let stop = Arc::clone(&self.stop);

        thread::Builder::new()
            .name("soapysdr-producer".into())
            .spawn(move || {
                // `device` is kept alive in this closure so it isn't
                // dropped out from under the stream for the stream's
                // lifetime.
                let _device = device;
                let mut buf = vec![Complex::new(0.0f32, 0.0f32); READ_BLOCK_SIZE];
                let mut backoff_ms = 1u64;

                while !stop.load(Ordering::Relaxed) {
                    match stream.read(&[&mut buf], READ_TIMEOUT_US) {
                        Ok(n) => {
                            backoff_ms = 1;
                            if sink.push_block(&buf[..n]).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("SoapySDR stream read error: {}", e);
                            thread::sleep(std::time::Duration::from_millis(backoff_ms));
                            backoff_ms = (backoff_ms * 2).min(250);
                        }
                    }
                }
            })
            .map_err(|e| EngineError::DriverFailure(e.to_string()))?;

        Ok(())
    }

    fn tune(&mut self, hz: f64) -> Result<f64, EngineError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| EngineError::DriverFailure("tune called before setup".into()))?;
        device
            .set_frequency(soapysdr::Direction::Rx, 0, hz, ())
            .map_err(|e| EngineError::DriverFailure(format!("retune failed: {}", e)))?;
        Ok(hz)
    }

    fn gain(&mut self, db: f64) -> Result<f64, EngineError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| EngineError::DriverFailure("gain called before setup".into()))?;
        device
            .set_gain(soapysdr::Direction::Rx, 0, db)
            .map_err(|e| EngineError::DriverFailure(format!("set_gain failed: {}", e)))?;
        Ok(db)
    }
}

impl Drop for SoapySdrDriver {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
