// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Synthetic signal generator front end: a complex tone plus optional
//! uniform noise at a configurable sample rate. Has no real hardware
//! counterpart; it exists so the testable-property scenarios in the
//! specification (silent startup, spur suppression, tuning round-trip) can
//! run without real hardware, the same role `MockIqSource` plays in the
//! teacher's own test suite.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use num_complex::Complex;
use radiod_core::EngineError;

use crate::driver::{DriverConfig, FrontendDriver, SampleSink, SetupStatus};

const DEFAULT_SAMPRATE_HZ: f64 = 1_200_000.0;
const DEFAULT_BLOCK_SIZE: usize = 4096;

struct SigGenState {
    tone_hz: f64,
    noise_amplitude: f64,
    phase: f64,
}

/// A simple xorshift PRNG: deterministic, dependency-free noise for tests.
struct Xorshift64(u64);

impl Xorshift64 {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        // Map to [-1.0, 1.0).
        ((x >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}

pub struct SigGenDriver {
    samprate_hz: f64,
    block_size: usize,
    state: Arc<Mutex<SigGenState>>,
    stop: Arc<std::sync::atomic::AtomicBool>,
    seed: Arc<AtomicU64>,
}

impl SigGenDriver {
    pub fn new() -> Self {
        Self {
            samprate_hz: DEFAULT_SAMPRATE_HZ,
            block_size: DEFAULT_BLOCK_SIZE,
            state: Arc::new(Mutex::new(SigGenState {
                tone_hz: 0.0,
                noise_amplitude: 0.0,
                phase: 0.0,
            })),
            stop: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            seed: Arc::new(AtomicU64::new(0x9E3779B97F4A7C15)),
        }
    }
}

impl Default for SigGenDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontendDriver for SigGenDriver {
    fn setup(&mut self, cfg: &DriverConfig) -> Result<SetupStatus, EngineError> {
        if let Some(rate) = cfg.get("samprate") {
            self.samprate_hz = rate
                .parse()
                .map_err(|_| EngineError::Config(format!("invalid samprate {:?}", rate)))?;
        }
        if let Some(block) = cfg.get("block") {
            self.block_size = block
                .parse()
                .map_err(|_| EngineError::Config(format!("invalid block {:?}", block)))?;
        }
        let tone_hz = cfg
            .get("tone")
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|_| EngineError::Config("invalid tone".into()))?
            .unwrap_or(0.0);
        let noise_amplitude = cfg
            .get("noise")
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|_| EngineError::Config("invalid noise".into()))?
            .unwrap_or(0.0);

        let mut state = self.state.lock().unwrap();
        state.tone_hz = tone_hz;
        state.noise_amplitude = noise_amplitude;

        Ok(SetupStatus {
            samprate_hz: self.samprate_hz,
            isreal: false,
        })
    }

    fn start(&mut self, sink: Box<dyn SampleSink>) -> Result<(), EngineError> {
        let state = Arc::clone(&self.state);
        let stop = Arc::clone(&self.stop);
        let seed = Arc::clone(&self.seed);
        let samprate_hz = self.samprate_hz;
        let block_size = self.block_size;
        let block_period = Duration::from_secs_f64(block_size as f64 / samprate_hz);

        thread::Builder::new()
            .name("sig-gen-producer".into())
            .spawn(move || {
                let mut rng = Xorshift64(seed.load(Ordering::Relaxed));
                let mut buf = vec![Complex::new(0.0f32, 0.0f32); block_size];

                while !stop.load(Ordering::Relaxed) {
                    {
                        let mut st = state.lock().unwrap();
                        let phase_inc = std::f64::consts::TAU * st.tone_hz / samprate_hz;
                        for sample in buf.iter_mut() {
                            let tone = Complex::from_polar(1.0f32, st.phase as f32);
                            let noise = if st.noise_amplitude > 0.0 {
                                Complex::new(
                                    (rng.next_f64() * st.noise_amplitude) as f32,
                                    (rng.next_f64() * st.noise_amplitude) as f32,
                                )
                            } else {
                                Complex::new(0.0, 0.0)
                            };
                            *sample = tone + noise;
                            st.phase += phase_inc;
                            if st.phase > std::f64::consts::PI {
                                st.phase -= std::f64::consts::TAU;
                            }
                        }
                    }

                    if sink.push_block(&buf).is_err() {
                        break;
                    }
                    thread::sleep(block_period);
                }
            })
            .map_err(|e| EngineError::DriverFailure(e.to_string()))?;

        Ok(())
    }

    fn tune(&mut self, hz: f64) -> Result<f64, EngineError> {
        self.state.lock().unwrap().tone_hz = hz;
        Ok(hz)
    }
}

impl Drop for SigGenDriver {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct CollectingSink {
        blocks: Arc<StdMutex<Vec<Vec<Complex<f32>>>>>,
    }

    impl SampleSink for CollectingSink {
        fn push_block(&self, samples: &[Complex<f32>]) -> Result<(), EngineError> {
            self.blocks.lock().unwrap().push(samples.to_vec());
            Ok(())
        }
    }

    #[test]
    fn setup_parses_samprate_and_tone() {
        let mut driver = SigGenDriver::new();
        let mut cfg = DriverConfig::new();
        cfg.insert("samprate".into(), "48000".into());
        cfg.insert("tone".into(), "1000".into());
        let status = driver.setup(&cfg).unwrap();
        assert_eq!(status.samprate_hz, 48000.0);
        assert!(!status.isreal);
    }

    #[test]
    fn start_produces_at_least_one_block() {
        let mut driver = SigGenDriver::new();
        let mut cfg = DriverConfig::new();
        cfg.insert("samprate".into(), "48000".into());
        cfg.insert("block".into(), "64".into());
        driver.setup(&cfg).unwrap();

        let blocks = Arc::new(StdMutex::new(Vec::new()));
        let sink = CollectingSink {
            blocks: Arc::clone(&blocks),
        };
        driver.start(Box::new(sink)).unwrap();

        thread::sleep(Duration::from_millis(50));
        drop(driver);

        assert!(!blocks.lock().unwrap().is_empty());
    }

    #[test]
    fn tune_updates_tone_frequency() {
        let mut driver = SigGenDriver::new();
        assert_eq!(driver.tune(5000.0).unwrap(), 5000.0);
        assert_eq!(driver.state.lock().unwrap().tone_hz, 5000.0);
    }
}
