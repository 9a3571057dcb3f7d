// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-channel filter output: the five-step pipeline that turns one shared
//! frequency-domain block into this channel's L time-domain samples.
//! Reuses the teacher's windowed-sinc FIR design and FFT-based overlap-save
//! bookkeeping (`dsp/filter.rs`), restructured so the forward transform is
//! shared across channels instead of recomputed per channel.

use std::f32::consts::{PI, TAU};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::Fft;

use crate::filter_input::{FilterBlock, FilterInput};
use crate::tuning::{compute_tuning, Tuning};

fn windowed_sinc_coeffs(cutoff_norm: f32, taps: usize) -> Vec<f32> {
    assert!(taps >= 1, "filter must have at least 1 tap");
    let m = (taps - 1) as f32;
    let mut coeffs = Vec::with_capacity(taps);
    for i in 0..taps {
        let x = i as f32 - m / 2.0;
        let sinc = if x == 0.0 {
            2.0 * cutoff_norm
        } else {
            (2.0 * PI * cutoff_norm * x).sin() / (PI * x)
        };
        let window = if taps == 1 {
            1.0
        } else {
            0.5 * (1.0 - (2.0 * PI * i as f32 / m).cos())
        };
        coeffs.push(sinc * window);
    }
    coeffs
}

/// Builds the precomputed frequency-domain bandpass response for a channel
/// passing `[low_hz, high_hz]` of baseband (post-shift) spectrum, as a
/// Hamming-windowed-sinc low-pass modulated up to the band center, FFT'd to
/// exactly `n` bins (the shared transform size — no independent rounding
/// to a power of two, unlike a standalone per-channel kernel, since this
/// response must align bin-for-bin with the shared forward transform).
/// `fft` must be the *forward* plan (the same one used to build each shared
/// block) so the response's bins line up with the block's own convention;
/// passing the inverse plan here would yield a conjugated/mirrored response.
pub fn build_bandpass_response(
    low_hz: f64,
    high_hz: f64,
    samprate_hz: f64,
    taps: usize,
    n: usize,
    fft: &dyn Fft<f32>,
) -> Vec<Complex<f32>> {
    let bandwidth = (high_hz - low_hz).abs().max(1.0);
    let center_hz = (low_hz + high_hz) / 2.0;
    let cutoff_norm = ((bandwidth / 2.0) / samprate_hz) as f32;

    let lowpass = windowed_sinc_coeffs(cutoff_norm, taps);
    let m = (taps - 1) as f32;

    let mut h_buf: Vec<Complex<f32>> = lowpass
        .iter()
        .enumerate()
        .map(|(i, &coeff)| {
            let x = i as f32 - m / 2.0;
            let phase = TAU * (center_hz as f32) * x / samprate_hz as f32;
            Complex::from_polar(coeff, phase)
        })
        .collect();
    h_buf.resize(n, Complex::new(0.0, 0.0));
    fft.process(&mut h_buf);
    h_buf
}

/// Per-channel filter-output state: the integer bin shift, the precomputed
/// bandpass response, the fractional-bin time-domain rotator, and the
/// overlap-save bookkeeping needed to deliver exactly `L` samples per block.
pub struct FilterOutput {
    n: usize,
    l: usize,
    m: usize,
    shift: i64,
    rotator_inc: f32,
    rotator_phase: f32,
    response: Vec<Complex<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    last_seen_seq: u64,
    bandwidth_clamped: AtomicBool,
}

impl FilterOutput {
    pub fn new(
        filter_input: &FilterInput,
        freq_hz: f64,
        low_hz: f64,
        high_hz: f64,
        taps: usize,
    ) -> Result<Self, radiod_core::EngineError> {
        let n = filter_input.n();
        let l = filter_input.l();
        let m = filter_input.m();
        let samprate_hz = filter_input.samprate_hz();

        let Tuning { shift, remainder } = compute_tuning(
            n,
            m,
            samprate_hz,
            freq_hz,
            filter_input.isreal(),
        )?;

        let (clamped_low, clamped_high) = clamp_bandwidth(low_hz, high_hz, samprate_hz);
        let was_clamped = clamped_low != low_hz || clamped_high != high_hz;

        let ifft = filter_input.inverse_fft();
        let forward_fft = filter_input.forward_fft();
        let response = build_bandpass_response(
            clamped_low,
            clamped_high,
            samprate_hz,
            taps,
            n,
            &*forward_fft,
        );

        Ok(Self {
            n,
            l,
            m,
            shift,
            // The integer bin shift leaves a residual tone at +remainder Hz
            // (DFT shift theorem); canceling it to DC needs the opposite
            // sign here, exp(-j2*pi*remainder*n/samprate), not +.
            rotator_inc: -(TAU as f64 * remainder / samprate_hz) as f32,
            rotator_phase: 0.0,
            response,
            ifft,
            scratch: vec![Complex::new(0.0, 0.0); n],
            last_seen_seq: 0,
            bandwidth_clamped: AtomicBool::new(was_clamped),
        })
    }

    /// Processes one new shared block, returning exactly `L` time-domain
    /// samples, or `None` (with `gap` set) if this call observed a skipped
    /// sequence number — the caller logs `BlockGap` and continues with the
    /// freshly delivered block regardless.
    pub fn process(&mut self, block: &FilterBlock) -> (Vec<f32>, Option<u64>) {
        let gap = if self.last_seen_seq != 0 && block.seq > self.last_seen_seq + 1 {
            Some(block.seq - self.last_seen_seq - 1)
        } else {
            None
        };
        self.last_seen_seq = block.seq;

        // Step 1: integer bin shift — rotate the spectrum so the target
        // frequency lands near bin 0.
        for (dst_idx, bin) in self.scratch.iter_mut().enumerate() {
            let src_idx = ((dst_idx as i64 + self.shift).rem_euclid(self.n as i64)) as usize;
            *bin = block.bins[src_idx];
        }

        // Step 2: multiply by the precomputed bandpass response.
        let scale = 1.0 / self.n as f32;
        for (bin, &h) in self.scratch.iter_mut().zip(self.response.iter()) {
            *bin = Complex::new(
                (bin.re * h.re - bin.im * h.im) * scale,
                (bin.re * h.im + bin.im * h.re) * scale,
            );
        }

        // Step 3: inverse transform, discard the first M-1 overlap samples.
        self.ifft.process(&mut self.scratch);
        let overlap = self.m - 1;
        let time_domain = &self.scratch[overlap..overlap + self.l];

        // Step 4: fractional-bin fine frequency correction via a complex
        // rotator, taking the real part as the channel's baseband output
        // (the demodulator receives full complex IQ via `process_complex`
        // for modes that need it; real-valued callers use this directly).
        let mut output = Vec::with_capacity(self.l);
        for sample in time_domain {
            let rotator = Complex::from_polar(1.0, self.rotator_phase);
            let rotated = sample * rotator;
            output.push(rotated.re);
            self.rotator_phase += self.rotator_inc;
            if self.rotator_phase > PI {
                self.rotator_phase -= TAU;
            } else if self.rotator_phase < -PI {
                self.rotator_phase += TAU;
            }
        }

        (output, gap)
    }

    /// Same as [`process`] but retains the complex baseband samples,
    /// needed by demodulators that require full IQ (AM, FM, SSB all
    /// consume complex samples in this engine — see `demod::Demodulator`).
    pub fn process_complex(&mut self, block: &FilterBlock) -> (Vec<Complex<f32>>, Option<u64>) {
        let gap = if self.last_seen_seq != 0 && block.seq > self.last_seen_seq + 1 {
            Some(block.seq - self.last_seen_seq - 1)
        } else {
            None
        };
        self.last_seen_seq = block.seq;

        for (dst_idx, bin) in self.scratch.iter_mut().enumerate() {
            let src_idx = ((dst_idx as i64 + self.shift).rem_euclid(self.n as i64)) as usize;
            *bin = block.bins[src_idx];
        }

        let scale = 1.0 / self.n as f32;
        for (bin, &h) in self.scratch.iter_mut().zip(self.response.iter()) {
            *bin = Complex::new(
                (bin.re * h.re - bin.im * h.im) * scale,
                (bin.re * h.im + bin.im * h.re) * scale,
            );
        }

        self.ifft.process(&mut self.scratch);
        let overlap = self.m - 1;
        let time_domain = &self.scratch[overlap..overlap + self.l];

        let mut output = Vec::with_capacity(self.l);
        for &sample in time_domain {
            let rotator = Complex::from_polar(1.0, self.rotator_phase);
            output.push(sample * rotator);
            self.rotator_phase += self.rotator_inc;
            if self.rotator_phase > PI {
                self.rotator_phase -= TAU;
            } else if self.rotator_phase < -PI {
                self.rotator_phase += TAU;
            }
        }

        (output, gap)
    }

    pub fn bandwidth_was_clamped(&self) -> bool {
        self.bandwidth_clamped.load(Ordering::Relaxed)
    }
}

/// Clamps `[low_hz, high_hz]` to the Nyquist window, latching a one-time
/// `BandwidthClamped` report rather than one per block.
fn clamp_bandwidth(low_hz: f64, high_hz: f64, samprate_hz: f64) -> (f64, f64) {
    let nyquist = samprate_hz / 2.0;
    (low_hz.max(-nyquist), high_hz.min(nyquist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notch::NotchSpec;

    fn complex_tone(freq_hz: f64, samprate_hz: f64, len: usize) -> Vec<Complex<f32>> {
        (0..len)
            .map(|n| {
                let phase = TAU as f64 * freq_hz * n as f64 / samprate_hz;
                Complex::from_polar(1.0f32, phase as f32)
            })
            .collect()
    }

    #[test]
    fn delivers_exactly_l_samples_per_block() {
        let samprate = 48_000.0;
        let fi = FilterInput::new(256, 33, false, samprate, &[] as &[NotchSpec]).unwrap();
        let mut fo = FilterOutput::new(&fi, 1000.0, -3000.0, 3000.0, 32).unwrap();

        let samples = complex_tone(1000.0, samprate, fi.l());
        fi.ingest(&samples).unwrap();
        let block = fi.wait_for_block(0);
        let (out, gap) = fo.process(&block);

        assert_eq!(out.len(), fi.l());
        assert!(gap.is_none());
    }

    #[test]
    fn detects_block_gap_without_panicking() {
        let samprate = 48_000.0;
        let fi = FilterInput::new(64, 9, false, samprate, &[] as &[NotchSpec]).unwrap();
        let mut fo = FilterOutput::new(&fi, 0.0, -3000.0, 3000.0, 8).unwrap();

        let samples = complex_tone(0.0, samprate, fi.l() * 3);
        fi.ingest(&samples).unwrap();

        let first = fi.wait_for_block(0);
        let (_, gap0) = fo.process(&first);
        assert!(gap0.is_none());

        // Skip straight to the third block, simulating a reader that fell
        // behind; it must report the gap and keep going, not panic.
        let third = fi.wait_for_block(2);
        let (out, gap) = fo.process(&third);
        assert_eq!(out.len(), fi.l());
        assert_eq!(gap, Some(1));
    }

    #[test]
    fn clamp_bandwidth_limits_to_nyquist() {
        let (low, high) = clamp_bandwidth(-100_000.0, 100_000.0, 48_000.0);
        assert_eq!(low, -24_000.0);
        assert_eq!(high, 24_000.0);
    }
}
