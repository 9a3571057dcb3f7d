// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Pluggable demodulator entry points, each consuming one channel's complex
//! baseband IQ block and producing real-valued audio samples.

pub mod am;
pub mod fm;
pub mod math;
#[cfg(target_arch = "aarch64")]
pub mod math_arm;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod math_x86;
pub mod ssb;

use rustfft::num_complex::Complex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demodulator {
    Am,
    Usb,
    Lsb,
    Cw,
    Fm,
}

impl Demodulator {
    /// Dispatches to the concrete demodulator. FM carries its own
    /// discriminator phase memory across calls, so it is not reentrant from
    /// more than one caller at a time per channel — the same constraint the
    /// source places on its per-channel `ChannelDsp`.
    pub fn demodulate(
        &self,
        samples: &[Complex<f32>],
        fm_state: &mut Option<Complex<f32>>,
    ) -> Vec<f32> {
        match self {
            Demodulator::Am => am::demod_am(samples),
            Demodulator::Usb => ssb::demod_usb(samples),
            Demodulator::Lsb => ssb::demod_lsb(samples),
            Demodulator::Cw => ssb::demod_cw(samples),
            Demodulator::Fm => fm::demod_fm(samples, fm_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_reaches_every_variant_without_panicking() {
        let samples = vec![Complex::new(1.0f32, 0.0); 8];
        let mut fm_state: Option<Complex<f32>> = None;
        for demod in [
            Demodulator::Am,
            Demodulator::Usb,
            Demodulator::Lsb,
            Demodulator::Cw,
            Demodulator::Fm,
        ] {
            let out = demod.demodulate(&samples, &mut fm_state);
            assert_eq!(out.len(), samples.len());
        }
    }
}
