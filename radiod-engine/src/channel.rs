// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Channel registry and lifecycle: an explicit `ChannelParams` value type
//! distinct from `Channel` (the shallow-copy-templates redesign
//! `spec.md` §9 calls for), an SSRC-keyed registry with collision probing,
//! and the Created → Running → {Idle → Terminating → Destroyed} state
//! machine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use radiod_core::EngineError;

use crate::demod::Demodulator;
use crate::filter_input::FilterInput;
use crate::filter_output::FilterOutput;

const SSRC_PROBE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Created,
    Running,
    Idle,
    Terminating,
    Destroyed,
}

/// Fully resolved parameters for one channel, produced by overlaying
/// compiled defaults, `[global]`, the preset database entry, and the
/// channel's own section, in that increasing-priority order.
#[derive(Debug, Clone)]
pub struct ChannelParams {
    pub preset: Option<String>,
    pub freq_hz: f64,
    pub low_hz: f64,
    pub high_hz: f64,
    pub taps: usize,
    pub demod: Demodulator,
    pub lifetime_blocks: u64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            preset: None,
            freq_hz: 0.0,
            low_hz: -3_000.0,
            high_hz: 3_000.0,
            taps: 64,
            demod: Demodulator::Usb,
            // 20000/Blocktime(ms) blocks at the default 20ms blocktime.
            lifetime_blocks: 1_000,
        }
    }
}

/// A sparse overlay applied on top of a base `ChannelParams`: only the
/// fields present as `Some` are overwritten, so four overlays compose into
/// one set of parameters without the earlier ones needing to know what the
/// later ones set.
#[derive(Debug, Clone, Default)]
pub struct ChannelParamsOverlay {
    pub preset: Option<String>,
    pub freq_hz: Option<f64>,
    pub low_hz: Option<f64>,
    pub high_hz: Option<f64>,
    pub taps: Option<usize>,
    pub demod: Option<Demodulator>,
    pub lifetime_blocks: Option<u64>,
}

impl ChannelParamsOverlay {
    /// Overwrites `base`'s fields with every `Some` value this overlay
    /// carries, leaving fields that are `None` untouched.
    pub fn apply_to(&self, base: &mut ChannelParams) {
        if let Some(v) = self.preset.clone() {
            base.preset = Some(v);
        }
        if let Some(v) = self.freq_hz {
            base.freq_hz = v;
        }
        if let Some(v) = self.low_hz {
            base.low_hz = v;
        }
        if let Some(v) = self.high_hz {
            base.high_hz = v;
        }
        if let Some(v) = self.taps {
            base.taps = v;
        }
        if let Some(v) = self.demod {
            base.demod = v;
        }
        if let Some(v) = self.lifetime_blocks {
            base.lifetime_blocks = v;
        }
    }
}

impl ChannelParams {
    /// Resolves the four-level priority chain: compiled defaults, then
    /// `[global]`, then the preset DB entry (if any — a missing preset
    /// name is a warning at the call site, not an error here), then the
    /// channel's own section.
    pub fn resolve(
        defaults: &ChannelParams,
        global: &ChannelParamsOverlay,
        preset: Option<&ChannelParamsOverlay>,
        section: &ChannelParamsOverlay,
    ) -> ChannelParams {
        let mut params = defaults.clone();
        global.apply_to(&mut params);
        if let Some(preset) = preset {
            preset.apply_to(&mut params);
        }
        section.apply_to(&mut params);
        params
    }
}

/// Output-side bookkeeping a channel's worker thread updates after every
/// block it demodulates. Stands in for the RTP state (`ssrc`, sequence,
/// byte count, timestamp) `spec.md` §3 lists on `Channel`, without
/// reproducing the RTP/RTCP packetizer itself (out of scope per §1).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelStats {
    pub blocks_processed: u64,
    pub samples_produced: u64,
    pub rtp_timestamp: u32,
    pub last_gap: Option<u64>,
}

/// A registered, fully constructed channel. There is no partially visible
/// state: a channel either exists in the registry with all of these fields
/// populated, or it does not exist at all.
pub struct Channel {
    pub ssrc: u32,
    pub state: ChannelState,
    pub params: ChannelParams,
    pub filter_output: FilterOutput,
    pub lifetime_remaining: u64,
    pub stats: ChannelStats,
    /// Cleared by `ChannelRegistry::destroy` and by `tick()` on reaching
    /// `Terminating`; this channel's worker thread polls it to know when to
    /// stop without needing a handle back into the registry.
    pub(crate) running: Arc<AtomicBool>,
}

impl Channel {
    /// Transition Created → Running.
    pub fn start_demod(&mut self) {
        if self.state == ChannelState::Created {
            self.state = ChannelState::Running;
        }
    }

    /// Called from the status thread: recomputes tuning and resets the
    /// idle-timeout countdown. Safe to call while the channel is active.
    pub fn set_freq(
        &mut self,
        filter_input: &FilterInput,
        freq_hz: f64,
    ) -> Result<(), EngineError> {
        self.filter_output = FilterOutput::new(
            filter_input,
            freq_hz,
            self.params.low_hz,
            self.params.high_hz,
            self.params.taps,
        )?;
        self.params.freq_hz = freq_hz;
        self.lifetime_remaining = self.params.lifetime_blocks;
        if self.state == ChannelState::Idle {
            self.state = ChannelState::Running;
        }
        Ok(())
    }

    /// One reaper tick: if `freq == 0` and the idle countdown has reached
    /// zero without a command resetting it, transition Running → Idle →
    /// Terminating. Returns `true` once the channel has reached
    /// `Terminating` and should be removed from the registry.
    fn tick(&mut self) -> bool {
        if self.state != ChannelState::Running && self.state != ChannelState::Idle {
            return self.state == ChannelState::Terminating;
        }
        if self.params.freq_hz != 0.0 {
            return false;
        }
        if self.lifetime_remaining == 0 {
            self.state = match self.state {
                ChannelState::Running => ChannelState::Idle,
                ChannelState::Idle => ChannelState::Terminating,
                other => other,
            };
            if self.state == ChannelState::Terminating {
                self.running.store(false, Ordering::Relaxed);
            }
            return self.state == ChannelState::Terminating;
        }
        self.lifetime_remaining -= 1;
        false
    }
}

/// Default SSRC for a channel derived from a bare `freq`/`freq0..freq9`
/// entry with no explicit `ssrc=` key: the numeric frequency value itself,
/// truncated to 32 bits, matching the source's behavior of deriving the
/// default straight from the parsed frequency.
pub fn default_ssrc_for_freq(freq_hz: f64) -> u32 {
    freq_hz.max(0.0) as u32
}

/// Process-wide mapping from SSRC to channel, guarded by one mutex (per
/// `spec.md` §5's "the channel registry is protected by one mutex").
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Mutex<HashMap<u32, Arc<Mutex<Channel>>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new channel at `ssrc`, probing `ssrc, ssrc+1, ...` up to
    /// 100 times if there's a collision. SSRC 0 is reserved and skipped.
    pub fn create_chan(
        &self,
        ssrc: u32,
        filter_input: &FilterInput,
        params: ChannelParams,
    ) -> Result<Arc<Mutex<Channel>>, EngineError> {
        let mut channels = self.channels.lock().unwrap();

        for probe in 0..SSRC_PROBE_LIMIT {
            let candidate = ssrc.wrapping_add(probe);
            if candidate == 0 || channels.contains_key(&candidate) {
                continue;
            }

            let filter_output = FilterOutput::new(
                filter_input,
                params.freq_hz,
                params.low_hz,
                params.high_hz,
                params.taps,
            )?;
            let channel = Channel {
                ssrc: candidate,
                state: ChannelState::Created,
                lifetime_remaining: params.lifetime_blocks,
                params,
                filter_output,
                stats: ChannelStats::default(),
                running: Arc::new(AtomicBool::new(true)),
            };
            let handle = Arc::new(Mutex::new(channel));
            channels.insert(candidate, Arc::clone(&handle));
            return Ok(handle);
        }

        Err(EngineError::SsrcExhausted { base: ssrc })
    }

    pub fn lookup(&self, ssrc: u32) -> Option<Arc<Mutex<Channel>>> {
        self.channels.lock().unwrap().get(&ssrc).cloned()
    }

    pub fn active_ssrcs(&self) -> Vec<u32> {
        self.channels.lock().unwrap().keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    /// Transitions `ssrc` to Terminating and removes it from the registry.
    /// Joining its demod/RTCP/SAP worker threads is the caller's
    /// responsibility (this only gates further lookups).
    pub fn destroy(&self, ssrc: u32) -> bool {
        let mut channels = self.channels.lock().unwrap();
        if let Some(channel) = channels.remove(&ssrc) {
            let mut channel = channel.lock().unwrap();
            channel.state = ChannelState::Terminating;
            channel.running.store(false, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// One reaper cycle: ticks every channel's idle countdown and removes
    /// any that reached Terminating this cycle.
    pub fn reap_idle(&self) -> Vec<u32> {
        let mut channels = self.channels.lock().unwrap();
        let mut destroyed = Vec::new();
        channels.retain(|&ssrc, channel| {
            let done = channel.lock().unwrap().tick();
            if done {
                destroyed.push(ssrc);
            }
            !done
        });
        destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notch::NotchSpec;

    fn fresh_input() -> FilterInput {
        FilterInput::new(64, 9, false, 48_000.0, &[] as &[NotchSpec]).unwrap()
    }

    #[test]
    fn priority_resolution_overlays_in_order() {
        let defaults = ChannelParams::default();
        let global = ChannelParamsOverlay {
            low_hz: Some(-2_000.0),
            ..Default::default()
        };
        let preset = ChannelParamsOverlay {
            high_hz: Some(2_500.0),
            ..Default::default()
        };
        let section = ChannelParamsOverlay {
            freq_hz: Some(7_040_000.0),
            ..Default::default()
        };

        let resolved = ChannelParams::resolve(&defaults, &global, Some(&preset), &section);
        assert_eq!(resolved.low_hz, -2_000.0, "global overlay applies");
        assert_eq!(resolved.high_hz, 2_500.0, "preset overlay applies");
        assert_eq!(resolved.freq_hz, 7_040_000.0, "section overlay applies");
        assert_eq!(resolved.taps, defaults.taps, "unset fields keep defaults");
    }

    #[test]
    fn section_overrides_preset_which_overrides_global() {
        let defaults = ChannelParams::default();
        let global = ChannelParamsOverlay {
            freq_hz: Some(1.0),
            ..Default::default()
        };
        let preset = ChannelParamsOverlay {
            freq_hz: Some(2.0),
            ..Default::default()
        };
        let section = ChannelParamsOverlay {
            freq_hz: Some(3.0),
            ..Default::default()
        };
        let resolved = ChannelParams::resolve(&defaults, &global, Some(&preset), &section);
        assert_eq!(resolved.freq_hz, 3.0);
    }

    #[test]
    fn create_and_lookup_round_trip() {
        let fi = fresh_input();
        let registry = ChannelRegistry::new();
        let params = ChannelParams {
            freq_hz: 7_040_000.0,
            ..Default::default()
        };
        let handle = registry.create_chan(7_040_000, &fi, params).unwrap();
        assert_eq!(handle.lock().unwrap().ssrc, 7_040_000);
        assert!(registry.lookup(7_040_000).is_some());
    }

    #[test]
    fn ssrc_collision_probes_to_next_free_slot() {
        let fi = fresh_input();
        let registry = ChannelRegistry::new();
        registry
            .create_chan(42, &fi, ChannelParams::default())
            .unwrap();
        let second = registry
            .create_chan(42, &fi, ChannelParams::default())
            .unwrap();
        assert_eq!(second.lock().unwrap().ssrc, 43);
    }

    #[test]
    fn at_most_one_channel_per_ssrc() {
        let fi = fresh_input();
        let registry = ChannelRegistry::new();
        registry
            .create_chan(1, &fi, ChannelParams::default())
            .unwrap();
        assert_eq!(registry.count(), 1);
        assert!(registry.lookup(2).is_none());
    }

    #[test]
    fn idle_channel_is_destroyed_after_lifetime_expires() {
        let fi = fresh_input();
        let registry = ChannelRegistry::new();
        let params = ChannelParams {
            freq_hz: 0.0,
            lifetime_blocks: 3,
            ..Default::default()
        };
        let handle = registry.create_chan(99, &fi, params).unwrap();
        handle.lock().unwrap().start_demod();

        for _ in 0..3 {
            assert!(registry.reap_idle().is_empty());
        }
        // Running -> Idle on this tick (countdown exhausted), then
        // Idle -> Terminating on the following tick.
        registry.reap_idle();
        let destroyed = registry.reap_idle();
        assert_eq!(destroyed, vec![99]);
        assert!(registry.lookup(99).is_none());
    }

    #[test]
    fn default_ssrc_matches_truncated_frequency() {
        assert_eq!(default_ssrc_for_freq(7_040_000.0), 7_040_000);
    }
}
