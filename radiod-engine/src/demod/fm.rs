// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! FM demodulation entry point. `prev` carries the last complex sample of
//! the previous block through unchanged, so the discriminator sees a
//! continuous phase across block boundaries instead of restarting at zero.

use rustfft::num_complex::Complex;

use super::math;

pub fn demod_fm(samples: &[Complex<f32>], prev: &mut Option<Complex<f32>>) -> Vec<f32> {
    math::demod_fm_with_prev(samples, prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_demodulates_to_near_zero() {
        let samples = vec![Complex::new(1.0f32, 0.0); 16];
        let mut prev = None;
        let out = demod_fm(&samples, &mut prev);
        assert!(out.iter().all(|&v| v.abs() < 1e-3));
    }

    #[test]
    fn prev_state_carries_across_calls_through_the_public_entry_point() {
        let samples = vec![Complex::new(1.0f32, 0.0); 4];
        let mut prev = None;
        demod_fm(&samples, &mut prev);
        assert!(prev.is_some());
        // Second call must not panic or silently reset to None; the last
        // sample of the first block keeps flowing into the second.
        demod_fm(&samples, &mut prev);
        assert!(prev.is_some());
    }
}
