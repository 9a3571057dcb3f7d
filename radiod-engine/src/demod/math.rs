// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fast polynomial `atan2` approximation and the FM phase-difference
//! discriminator built on it, with architecture-specific vectorized bodies
//! dispatched from here.

use rustfft::num_complex::Complex;

/// Piecewise rational approximation of `atan2`, accurate to within a few
/// thousandths of a radian: good enough for an audio discriminator, much
/// cheaper than a full libm `atan2` call per sample.
pub fn fast_atan2(y: f32, x: f32) -> f32 {
    const QUARTER_PI: f32 = std::f32::consts::FRAC_PI_4;
    const THREE_QUARTER_PI: f32 = 3.0 * std::f32::consts::FRAC_PI_4;

    if x == 0.0 && y == 0.0 {
        return 0.0;
    }

    let abs_y = y.abs() + 1e-12;
    let angle = if x >= 0.0 {
        let r = (x - abs_y) / (x + abs_y);
        QUARTER_PI - QUARTER_PI * r
    } else {
        let r = (x + abs_y) / (abs_y - x);
        THREE_QUARTER_PI - QUARTER_PI * r
    };

    if y < 0.0 {
        -angle
    } else {
        angle
    }
}

/// FM discriminator: the phase difference between consecutive complex
/// samples, scaled to `[-1, 1]`. `prev` carries the last sample of the
/// previous call across block boundaries so the discriminator doesn't glitch
/// at block edges; `None` on the very first call.
pub fn demod_fm_with_prev(samples: &[Complex<f32>], prev: &mut Option<Complex<f32>>) -> Vec<f32> {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { crate::demod::math_x86::demod_fm_body_avx2(samples, prev) };
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        return crate::demod::math_arm::demod_fm_body_neon(samples, prev);
    }

    #[allow(unreachable_code)]
    demod_fm_scalar(samples, prev)
}

pub(crate) fn demod_fm_scalar(samples: &[Complex<f32>], prev: &mut Option<Complex<f32>>) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len());
    let mut last = prev.take().unwrap_or(Complex::new(0.0, 0.0));
    for &sample in samples {
        let product = sample * last.conj();
        out.push(fast_atan2(product.im, product.re) / std::f32::consts::PI);
        last = sample;
    }
    *prev = Some(last);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_atan2_matches_libm_within_tolerance() {
        for i in 0..360 {
            let theta = (i as f32).to_radians();
            let (y, x) = (theta.sin(), theta.cos());
            let approx = fast_atan2(y, x);
            let exact = y.atan2(x);
            assert!((approx - exact).abs() < 0.01, "theta={theta} approx={approx} exact={exact}");
        }
    }

    #[test]
    fn zero_frequency_tone_has_near_zero_discriminator_output() {
        let samples = vec![Complex::new(1.0f32, 0.0); 32];
        let mut prev = None;
        let out = demod_fm_scalar(&samples, &mut prev);
        assert!(out.iter().skip(1).all(|&v| v.abs() < 1e-3));
    }

    #[test]
    fn prev_state_carries_across_calls() {
        let samples_a = vec![Complex::new(1.0f32, 0.0); 4];
        let samples_b = vec![Complex::new(0.0f32, 1.0); 4];
        let mut prev = None;
        let _ = demod_fm_scalar(&samples_a, &mut prev);
        assert!(prev.is_some());
        let out_b = demod_fm_scalar(&samples_b, &mut prev);
        // First sample of the second call sees a 90-degree jump from the
        // carried-over last sample of the first call.
        assert!((out_b[0].abs() - 0.5).abs() < 0.01);
    }
}
