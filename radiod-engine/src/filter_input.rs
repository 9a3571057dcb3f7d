// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The shared overlap-save forward FFT: couples one front-end producer to
//! an unbounded number of per-channel consumers. Each new block is
//! published as an immutable `Arc<FilterBlock>` identified by a
//! monotonically increasing sequence number — the broadcast-snapshot
//! redesign `spec.md` §9 calls for, replacing a bare condition-variable
//! handoff of mutable shared state.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use radiod_core::EngineError;
use radiod_frontend::driver::SampleSink;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::notch::{NotchSpec, NotchTable};

/// One published forward-transform result: `N` complex bins tagged with the
/// block sequence number that produced them. Read-only to every subscriber
/// for the duration of one cycle.
pub struct FilterBlock {
    pub seq: u64,
    pub bins: Vec<Complex<f32>>,
}

struct Inner {
    pending: VecDeque<Complex<f32>>,
    tail: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    notch: NotchTable,
    seq: u64,
    latest: Option<Arc<FilterBlock>>,
}

pub struct FilterInput {
    l: usize,
    m: usize,
    n: usize,
    isreal: bool,
    samprate_hz: f64,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl FilterInput {
    /// Allocates buffers and plans the forward transform. Fails with
    /// `EngineError::Config` when `l` or `m` is zero.
    pub fn new(
        l: usize,
        m: usize,
        isreal: bool,
        samprate_hz: f64,
        spurs: &[NotchSpec],
    ) -> Result<Self, EngineError> {
        if l == 0 || m == 0 {
            return Err(EngineError::Config(
                "filter input requires L > 0 and M > 0".into(),
            ));
        }
        let n = l + m - 1;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let ifft = planner.plan_fft_inverse(n);

        Ok(Self {
            l,
            m,
            n,
            isreal,
            samprate_hz,
            fft,
            ifft,
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                tail: vec![Complex::new(0.0, 0.0); m - 1],
                scratch: vec![Complex::new(0.0, 0.0); n],
                notch: NotchTable::new(spurs),
                seq: 0,
                latest: None,
            }),
            cond: Condvar::new(),
        })
    }

    pub fn l(&self) -> usize {
        self.l
    }
    pub fn m(&self) -> usize {
        self.m
    }
    pub fn n(&self) -> usize {
        self.n
    }
    pub fn isreal(&self) -> bool {
        self.isreal
    }
    pub fn samprate_hz(&self) -> f64 {
        self.samprate_hz
    }

    /// The inverse transform plan, shared by every channel's filter output
    /// so planning happens once per FFT size rather than once per channel.
    pub fn inverse_fft(&self) -> Arc<dyn Fft<f32>> {
        Arc::clone(&self.ifft)
    }

    /// The forward transform plan — the same one used to build each shared
    /// block, needed by `build_bandpass_response` so a channel's frequency
    /// response is computed with the same time→frequency convention as the
    /// blocks it will multiply against (using the inverse plan here would
    /// produce a conjugated/mirrored response instead).
    pub fn forward_fft(&self) -> Arc<dyn Fft<f32>> {
        Arc::clone(&self.fft)
    }

    /// Accepts freshly arrived time-domain samples, accumulating them until
    /// at least `L` new samples are available, then performs the forward
    /// transform and publishes a new block for each full `L`-sample group.
    pub fn ingest(&self, samples: &[Complex<f32>]) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.pending.extend(samples.iter().copied());

        while inner.pending.len() >= self.l {
            let new_samples: Vec<Complex<f32>> = inner.pending.drain(..self.l).collect();

            {
                let Inner {
                    tail, scratch, ..
                } = &mut *inner;
                scratch[..tail.len()].copy_from_slice(tail);
                scratch[tail.len()..].copy_from_slice(&new_samples);
            }

            self.fft.process(&mut inner.scratch);
            inner.notch.apply(&mut inner.scratch);

            let bins = inner.scratch.clone();
            inner.seq += 1;
            let seq = inner.seq;
            inner.latest = Some(Arc::new(FilterBlock { seq, bins }));

            // Carry the last M-1 samples of this block's time-domain input
            // forward as the next block's overlap tail.
            let m1 = self.m - 1;
            if m1 > 0 {
                if self.l >= m1 {
                    inner.tail.copy_from_slice(&new_samples[self.l - m1..]);
                } else {
                    let keep_old = m1 - self.l;
                    inner.tail.copy_within(self.l.., 0);
                    inner.tail[keep_old..].copy_from_slice(&new_samples);
                }
            }

            self.cond.notify_all();
        }

        Ok(())
    }

    /// Blocks until a block newer than `last_seen` is published, then
    /// returns a clone of the `Arc`. `last_seen = 0` returns the very first
    /// block produced. Readers that fall behind observe a gap (the returned
    /// block's `seq` may be more than `last_seen + 1`) without panicking —
    /// callers detect this and continue from the new snapshot.
    pub fn wait_for_block(&self, last_seen: u64) -> Arc<FilterBlock> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(block) = &inner.latest {
                if block.seq > last_seen {
                    return Arc::clone(block);
                }
            }
            inner = self.cond.wait(inner).unwrap();
        }
    }

    /// Same as [`wait_for_block`], but gives up and returns `None` after
    /// `timeout` without a new block, so a per-channel worker can re-check
    /// its own shutdown flag instead of blocking forever once the front end
    /// stops producing.
    pub fn wait_for_block_timeout(
        &self,
        last_seen: u64,
        timeout: Duration,
    ) -> Option<Arc<FilterBlock>> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(block) = &inner.latest {
                if block.seq > last_seen {
                    return Some(Arc::clone(block));
                }
            }
            let (guard, result) = self.cond.wait_timeout(inner, timeout).unwrap();
            inner = guard;
            if result.timed_out() {
                if let Some(block) = &inner.latest {
                    if block.seq > last_seen {
                        return Some(Arc::clone(block));
                    }
                }
                return None;
            }
        }
    }
}

/// Adapts `FilterInput` to the `SampleSink` contract front-end drivers push
/// blocks through, without making `radiod-frontend` depend on the engine.
pub struct FilterInputSink(pub Arc<FilterInput>);

impl SampleSink for FilterInputSink {
    fn push_block(&self, samples: &[Complex<f32>]) -> Result<(), EngineError> {
        self.0.ingest(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_length_parameters() {
        assert!(FilterInput::new(0, 4, false, 48_000.0, &[]).is_err());
        assert!(FilterInput::new(4, 0, false, 48_000.0, &[]).is_err());
    }

    #[test]
    fn n_equals_l_plus_m_minus_one() {
        let fi = FilterInput::new(16, 5, false, 48_000.0, &[]).unwrap();
        assert_eq!(fi.n(), 20);
    }

    #[test]
    fn ingest_publishes_one_block_per_l_samples() {
        let fi = Arc::new(FilterInput::new(8, 3, false, 48_000.0, &[]).unwrap());
        let samples = vec![Complex::new(1.0f32, 0.0); 8];
        fi.ingest(&samples).unwrap();

        let block = fi.wait_for_block(0);
        assert_eq!(block.seq, 1);
        assert_eq!(block.bins.len(), fi.n());
    }

    #[test]
    fn wait_for_block_timeout_returns_none_without_a_new_block() {
        let fi = FilterInput::new(8, 3, false, 48_000.0, &[]).unwrap();
        let result = fi.wait_for_block_timeout(0, std::time::Duration::from_millis(20));
        assert!(result.is_none());
    }

    #[test]
    fn wait_for_block_timeout_returns_the_block_once_published() {
        let fi = Arc::new(FilterInput::new(8, 3, false, 48_000.0, &[]).unwrap());
        let samples = vec![Complex::new(1.0f32, 0.0); 8];
        fi.ingest(&samples).unwrap();
        let result = fi.wait_for_block_timeout(0, std::time::Duration::from_millis(200));
        assert!(result.is_some());
    }

    #[test]
    fn sequence_numbers_strictly_increase() {
        let fi = Arc::new(FilterInput::new(4, 3, false, 48_000.0, &[]).unwrap());
        let samples = vec![Complex::new(1.0f32, 0.0); 16];
        fi.ingest(&samples).unwrap();

        let mut last = 0u64;
        for _ in 0..4 {
            let block = fi.wait_for_block(last);
            assert!(block.seq > last);
            last = block.seq;
        }
    }
}
