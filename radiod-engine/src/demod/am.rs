// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Envelope (AM) demodulation: the IQ magnitude.

use rustfft::num_complex::Complex;

pub fn demod_am(samples: &[Complex<f32>]) -> Vec<f32> {
    samples.iter().map(|s| s.norm()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_unit_tone_is_one() {
        let samples = vec![Complex::new(0.0f32, 1.0), Complex::new(1.0, 0.0)];
        let out = demod_am(&samples);
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn silence_demodulates_to_silence() {
        let samples = vec![Complex::new(0.0f32, 0.0); 16];
        assert!(demod_am(&samples).iter().all(|&v| v == 0.0));
    }
}
