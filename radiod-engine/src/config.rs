// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Engine-semantic extraction on top of `radiod_app::config::IniDocument`:
//! turning `[global]`, preset, and per-channel sections into the overlays
//! `ChannelParams::resolve` consumes, and the multi-frequency (`freq`,
//! `freq0`..`freq9`) channel syntax into one SSRC per frequency.

use radiod_app::config::IniDocument;

use crate::channel::ChannelParamsOverlay;
use crate::demod::Demodulator;

/// Wraps a parsed config document with the key names and multi-value
/// conventions specific to channel/frontend setup.
pub struct EngineConfig {
    doc: IniDocument,
}

impl EngineConfig {
    pub fn new(doc: IniDocument) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &IniDocument {
        &self.doc
    }

    /// The `[global]` section's overlay, or an empty one if absent.
    pub fn global_overlay(&self) -> ChannelParamsOverlay {
        self.doc
            .section("global")
            .map(overlay_from_section)
            .unwrap_or_default()
    }

    /// `hardware = <section>` from `[global]`, naming the front-end's own
    /// section (e.g. `[rx888]`).
    pub fn hardware_section_name(&self) -> Option<&str> {
        self.doc
            .section("global")
            .and_then(|s| s.get("hardware"))
            .map(String::as_str)
    }

    /// Every section name that isn't `global` and isn't itself a preset
    /// table (sections named `preset:<name>` are reserved for presets).
    pub fn channel_section_names(&self) -> Vec<&str> {
        self.doc
            .section_names()
            .filter(|n| *n != "global" && !n.starts_with("preset:"))
            .collect()
    }

    pub fn preset_overlay(&self, preset: &str) -> Option<ChannelParamsOverlay> {
        self.doc
            .section(&format!("preset:{preset}"))
            .map(overlay_from_section)
    }

    pub fn channel_overlay(&self, section: &str) -> ChannelParamsOverlay {
        self.doc
            .section(section)
            .map(overlay_from_section)
            .unwrap_or_default()
    }

    pub fn channel_disabled(&self, section: &str) -> bool {
        self.doc
            .section(section)
            .and_then(|s| s.get("disable"))
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn channel_ssrc(&self, section: &str) -> Option<u32> {
        self.doc
            .section(section)
            .and_then(|s| s.get("ssrc"))
            .and_then(|v| v.parse().ok())
    }

    /// Collects `freq`, `freq0`, `freq1`, ... `freq9` from a channel section:
    /// ka9q-radio-style config files let one section spawn multiple
    /// channels sharing every other parameter but tuned to different
    /// frequencies.
    pub fn channel_freqs(&self, section: &str) -> Vec<f64> {
        let Some(map) = self.doc.section(section) else {
            return Vec::new();
        };
        let mut freqs = Vec::new();
        if let Some(v) = map.get("freq") {
            if let Ok(f) = v.parse() {
                freqs.push(f);
            }
        }
        for i in 0..10 {
            if let Some(v) = map.get(&format!("freq{i}")) {
                if let Ok(f) = v.parse() {
                    freqs.push(f);
                }
            }
        }
        freqs
    }
}

fn overlay_from_section(section: &std::collections::BTreeMap<String, String>) -> ChannelParamsOverlay {
    ChannelParamsOverlay {
        preset: section.get("preset").cloned(),
        freq_hz: section.get("freq").and_then(|v| v.parse().ok()),
        low_hz: section
            .get("low")
            .or_else(|| section.get("low_hz"))
            .and_then(|v| v.parse().ok()),
        high_hz: section
            .get("high")
            .or_else(|| section.get("high_hz"))
            .and_then(|v| v.parse().ok()),
        taps: section.get("taps").and_then(|v| v.parse().ok()),
        demod: section.get("mode").and_then(|v| parse_demod(v)),
        lifetime_blocks: section.get("lifetime").and_then(|v| v.parse().ok()),
    }
}

fn parse_demod(name: &str) -> Option<Demodulator> {
    match name.to_ascii_lowercase().as_str() {
        "am" => Some(Demodulator::Am),
        "usb" => Some(Demodulator::Usb),
        "lsb" => Some(Demodulator::Lsb),
        "cw" => Some(Demodulator::Cw),
        "fm" => Some(Demodulator::Fm),
        _ => None,
    }
}
