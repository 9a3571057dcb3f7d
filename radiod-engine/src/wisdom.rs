// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! FFT plan-size bookkeeping. `rustfft` has no on-disk wisdom format of its
//! own (unlike FFTW, which the teacher never linked either), and a
//! `FftPlanner` only caches plans within its own lifetime, so there is
//! nothing to literally reuse across process restarts. What this module
//! persists instead is the *set of transform sizes* a previous run actually
//! used, so a future run can plan them up front in one planner instance
//! before the first block arrives, rather than discovering the size
//! lazily on the first call into `FilterInput::new`.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rustfft::FftPlanner;

/// The set of transform sizes seen by previous runs, loaded from and saved
/// to a plain newline-separated text file at the configured `wisdom-file`
/// path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WisdomCache {
    sizes: BTreeSet<usize>,
}

impl WisdomCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a cache from `path`. A missing or unreadable file yields an
    /// empty cache rather than an error — this is a warm-up hint, not a
    /// required input.
    pub fn load(path: &Path) -> Self {
        let Ok(text) = fs::read_to_string(path) else {
            return Self::default();
        };
        let sizes = text
            .lines()
            .filter_map(|line| line.trim().parse::<usize>().ok())
            .collect();
        Self { sizes }
    }

    /// Writes the current size set back to `path`, one size per line.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let body = self
            .sizes
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(path, body)
    }

    pub fn record(&mut self, n: usize) {
        self.sizes.insert(n);
    }

    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.sizes.iter().copied()
    }

    /// Plans a forward and inverse transform for every remembered size,
    /// discarding the plans immediately. The only effect worth having is
    /// whatever internal table-building `rustfft` does during planning;
    /// there is no shared cache to populate beyond this call's own
    /// `FftPlanner` instance, so this is useful only as a one-time warm-up
    /// immediately before constructing the real `FilterInput`.
    pub fn prewarm(&self) {
        let mut planner = FftPlanner::<f32>::new();
        for n in &self.sizes {
            let _ = planner.plan_fft_forward(*n);
            let _ = planner.plan_fft_inverse(*n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let dir = std::env::temp_dir().join(format!(
            "radiod-wisdom-test-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wisdom");

        let mut cache = WisdomCache::new();
        cache.record(1024);
        cache.record(2048);
        cache.save(&path).unwrap();

        let loaded = WisdomCache::load(&path);
        let mut sizes: Vec<usize> = loaded.sizes().collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1024, 2048]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let cache = WisdomCache::load(Path::new("/nonexistent/radiod-wisdom-file"));
        assert_eq!(cache.sizes().count(), 0);
    }

    #[test]
    fn prewarm_does_not_panic_on_an_empty_cache() {
        WisdomCache::new().prewarm();
    }
}
