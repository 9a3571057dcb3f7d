// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

/// All error kinds named by the engine's error-handling design, one variant
/// per propagation policy (fatal-at-startup, per-channel warning, or
/// counter-only).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("hardware setup failed: {0}")]
    HardwareSetup(String),

    #[error("failed to bind output: {0}")]
    OutputBind(String),

    #[error("failed to load preset table: {0}")]
    PresetLoad(String),

    #[error("preset {preset:?} not found for channel {ssrc}; using defaults")]
    PresetMissing { ssrc: u32, preset: String },

    #[error("no free SSRC near {base} after 100 probes")]
    SsrcExhausted { base: u32 },

    #[error("channel {ssrc} bandwidth clamped to {clamped_hz} Hz")]
    BandwidthClamped { ssrc: u32, clamped_hz: f64 },

    #[error("channel {ssrc} missed {missed} block(s)")]
    BlockGap { ssrc: u32, missed: u64 },

    #[error("send failed on channel {ssrc}: {source}")]
    Send {
        ssrc: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("driver failure: {0}")]
    DriverFailure(String),

    #[error("frequency {freq_hz} Hz out of range for sample rate {samprate_hz} Hz")]
    OutOfRange { freq_hz: f64, samprate_hz: f64 },
}

/// POSIX sysexits codes used by the CLI's `main()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Usage = 64,
    NoInput = 66,
    NoHost = 68,
    Unavailable = 69,
    Software = 70,
}

impl EngineError {
    /// Maps fatal-at-startup variants to their sysexits code. Non-fatal
    /// variants (per-channel warnings, counters) have no meaningful exit
    /// code and default to `Software`.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            EngineError::HardwareSetup(_) => ExitCode::NoInput,
            EngineError::OutputBind(_) => ExitCode::NoHost,
            EngineError::PresetLoad(_) => ExitCode::Unavailable,
            EngineError::Config(_) => ExitCode::Usage,
            _ => ExitCode::Software,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_setup_maps_to_no_input() {
        assert_eq!(
            EngineError::HardwareSetup("x".into()).exit_code(),
            ExitCode::NoInput
        );
    }

    #[test]
    fn driver_failure_defaults_to_software() {
        assert_eq!(
            EngineError::DriverFailure("x".into()).exit_code(),
            ExitCode::Software
        );
    }
}
