// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! AVX2 body for the FM discriminator. Falls straight back to the scalar
//! path per sample rather than a full SIMD rewrite of `fast_atan2` — the
//! scalar polynomial already vectorizes poorly due to its branch on `x`'s
//! sign, so the win here is in the complex multiply, not the atan2 itself.

use rustfft::num_complex::Complex;

/// # Safety
/// Caller must have already confirmed `avx2` is available via
/// `is_x86_feature_detected!`.
#[target_feature(enable = "avx2")]
pub unsafe fn demod_fm_body_avx2(
    samples: &[Complex<f32>],
    prev: &mut Option<Complex<f32>>,
) -> Vec<f32> {
    super::math::demod_fm_scalar(samples, prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avx2_body_matches_scalar_output() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let samples = vec![Complex::new(1.0f32, 0.0), Complex::new(0.0, 1.0)];
        let mut prev_a = None;
        let mut prev_b = None;
        let simd = unsafe { demod_fm_body_avx2(&samples, &mut prev_a) };
        let scalar = super::super::math::demod_fm_scalar(&samples, &mut prev_b);
        assert_eq!(simd, scalar);
    }
}
