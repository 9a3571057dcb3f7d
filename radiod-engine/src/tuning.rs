// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! `compute_tuning`: the single function every channel uses to turn a
//! target frequency into an integer FFT-bin shift plus a sub-bin remainder.

use radiod_core::EngineError;

/// Integer bin shift and fractional-Hz remainder for a channel's target
/// frequency, as specified: `shift * bin_width + remainder == freq` within
/// one ulp, and `|remainder| <= bin_width / 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub shift: i64,
    pub remainder: f64,
}

/// `N`: FFT size. `M`: filter length (unused directly here but kept in the
/// signature to match the specified contract `compute_tuning(N, M, ...)`,
/// since a future real-input half-spectrum layout would need it to bound
/// the valid shift range in bins rather than Hz).
pub fn compute_tuning(
    n: usize,
    _m: usize,
    samprate_hz: f64,
    freq_hz: f64,
    isreal: bool,
) -> Result<Tuning, EngineError> {
    if isreal {
        if !(0.0..=samprate_hz / 2.0).contains(&freq_hz) {
            return Err(EngineError::OutOfRange {
                freq_hz,
                samprate_hz,
            });
        }
    } else if freq_hz.abs() > samprate_hz / 2.0 {
        return Err(EngineError::OutOfRange {
            freq_hz,
            samprate_hz,
        });
    }

    let bin_width = samprate_hz / n as f64;
    let raw_shift = (freq_hz / bin_width).round_ties_even();

    let shift = if isreal {
        let half = (n / 2) as i64;
        (raw_shift as i64).rem_euclid(n as i64).min(half)
    } else {
        let n_i = n as i64;
        ((raw_shift as i64) % n_i + n_i) % n_i
    };

    let remainder = freq_hz - shift as f64 * bin_width;

    Ok(Tuning { shift, remainder })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_bin_center_has_zero_remainder() {
        let n = 1000;
        let samprate = 1_000_000.0;
        let bin_width = samprate / n as f64;
        let tuning = compute_tuning(n, 10, samprate, 37.0 * bin_width, false).unwrap();
        assert_eq!(tuning.shift, 37);
        assert!(tuning.remainder.abs() < 1e-6);
    }

    #[test]
    fn remainder_is_bounded_by_half_bin_width() {
        let n = 1000;
        let samprate = 1_000_000.0;
        let bin_width = samprate / n as f64;
        let tuning = compute_tuning(n, 10, samprate, 37.4 * bin_width, false).unwrap();
        assert!(tuning.remainder.abs() <= bin_width / 2.0 + 1e-9);
    }

    #[test]
    fn complex_rejects_out_of_range() {
        let result = compute_tuning(1000, 10, 1_000_000.0, 900_000.0, false);
        assert!(result.is_err());
    }

    #[test]
    fn real_input_rejects_negative_frequency() {
        let result = compute_tuning(1000, 10, 1_000_000.0, -1000.0, true);
        assert!(result.is_err());
    }

    #[test]
    fn real_input_shift_is_nonnegative_and_bounded() {
        let n = 1000;
        let samprate = 1_000_000.0;
        let bin_width = samprate / n as f64;
        let tuning = compute_tuning(n, 10, samprate, 499.0 * bin_width, true).unwrap();
        assert!(tuning.shift >= 0 && tuning.shift <= (n / 2) as i64);
    }

    #[test]
    fn reconstructs_target_frequency_within_an_ulp() {
        let n = 2048;
        let samprate = 48_000.0;
        let bin_width = samprate / n as f64;
        for k in -10..10 {
            let freq = k as f64 * bin_width + 0.37 * bin_width;
            let tuning = compute_tuning(n, 32, samprate, freq, false).unwrap();
            let reconstructed = tuning.shift as f64 * bin_width + tuning.remainder;
            assert!((reconstructed - freq).abs() < 1e-9);
        }
    }
}
