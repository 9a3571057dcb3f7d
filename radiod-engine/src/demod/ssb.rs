// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Single-sideband and CW demodulation. The sideband selection already
//! happened upstream, in the channel's asymmetric `[low_hz, high_hz]`
//! bandpass response — by the time samples reach here, taking the real part
//! of the baseband IQ recovers the audio for USB, LSB, or CW alike.

use rustfft::num_complex::Complex;

pub fn demod_usb(samples: &[Complex<f32>]) -> Vec<f32> {
    samples.iter().map(|s| s.re).collect()
}

pub fn demod_lsb(samples: &[Complex<f32>]) -> Vec<f32> {
    samples.iter().map(|s| s.re).collect()
}

pub fn demod_cw(samples: &[Complex<f32>]) -> Vec<f32> {
    samples.iter().map(|s| s.re).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_three_modes_pass_through_the_real_component() {
        let samples = vec![Complex::new(0.5f32, -0.25), Complex::new(-0.3, 0.1)];
        let expected: Vec<f32> = samples.iter().map(|s| s.re).collect();
        assert_eq!(demod_usb(&samples), expected);
        assert_eq!(demod_lsb(&samples), expected);
        assert_eq!(demod_cw(&samples), expected);
    }
}
