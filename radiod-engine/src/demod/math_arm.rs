// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Placeholder hook for a future NEON FM discriminator. Falls back to the
//! scalar body for now.

use rustfft::num_complex::Complex;

pub fn demod_fm_body_neon(samples: &[Complex<f32>], prev: &mut Option<Complex<f32>>) -> Vec<f32> {
    super::math::demod_fm_scalar(samples, prev)
}
