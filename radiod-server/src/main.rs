// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

mod cli;
mod net;
mod signals;
mod status;

use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use radiod_app::{init_logging, normalize_name};
use radiod_core::ExitCode;
use radiod_engine::channel::ChannelParams;
use radiod_engine::config::EngineConfig;
use radiod_engine::Engine;
use radiod_frontend::plugins::load_driver_plugins;
use radiod_frontend::registry::register_builtin_drivers;

use cli::Cli;

const DEFAULT_BLOCKTIME_MS: f64 = 20.0;
const DEFAULT_OVERLAP: usize = 5;

/// Grace period between requesting worker shutdown and forcibly aborting
/// the status task, matching `original_source/main.c`'s `sleep(1)` in
/// `closedown()`.
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(1);

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    let verbosity = init_logging(cli.verbose);

    match run(cli, verbosity) {
        Ok(code) => ProcessExitCode::from(code as u8),
        Err(e) => {
            error!("{e}");
            ProcessExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(
    cli: Cli,
    verbosity: radiod_app::logging::VerbosityHandle,
) -> Result<ExitCode, radiod_core::EngineError> {
    let doc = radiod_app::config::IniDocument::load_resolving(&cli.config)?;
    let config = EngineConfig::new(doc);

    if cli.dump_config {
        for name in config.document().section_names() {
            println!("[{name}]");
        }
        return Ok(ExitCode::Success);
    }

    let hardware_name = cli
        .driver
        .clone()
        .or_else(|| config.hardware_section_name().map(str::to_string))
        .ok_or_else(|| radiod_core::EngineError::Config("no hardware driver configured".into()))?;

    let hardware_section = config
        .document()
        .section(&hardware_name)
        .cloned()
        .unwrap_or_default();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| radiod_core::EngineError::Config(format!("tokio runtime: {e}")))?;

    runtime.block_on(async_main(cli, config, hardware_name, hardware_section, verbosity))
}

async fn async_main(
    cli: Cli,
    config: EngineConfig,
    hardware_name: String,
    hardware_section: std::collections::BTreeMap<String, String>,
    verbosity: radiod_app::logging::VerbosityHandle,
) -> Result<ExitCode, radiod_core::EngineError> {
    let samprate_hz: f64 = hardware_section
        .get("samprate")
        .and_then(|v| v.parse().ok())
        .unwrap_or(2_400_000.0);

    let blocktime_ms: f64 = config
        .document()
        .section("global")
        .and_then(|s| s.get("blocktime"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_BLOCKTIME_MS);

    let l = ((samprate_hz * blocktime_ms / 1000.0).round()) as usize;
    let overlap: usize = config
        .document()
        .section("global")
        .and_then(|s| s.get("overlap"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_OVERLAP);
    let m = l / (overlap.max(2) - 1) + 1;

    let wisdom_path = config
        .document()
        .section("global")
        .and_then(|s| s.get("wisdom-file"))
        .map(std::path::PathBuf::from);
    let mut wisdom = wisdom_path
        .as_deref()
        .map(radiod_engine::WisdomCache::load)
        .unwrap_or_default();
    wisdom.prewarm();
    wisdom.record(l + m - 1);
    if let Some(path) = wisdom_path.as_deref() {
        if let Err(e) = wisdom.save(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to save FFT wisdom file");
        }
    }

    let mut engine = Engine::new(l, m, false, samprate_hz, &[])?;
    register_builtin_drivers(&mut engine.drivers);
    let _plugin_libs = load_driver_plugins(&mut engine.drivers);

    let driver_name = normalize_name(&hardware_name);
    info!(driver = %driver_name, samprate_hz, l, m, "starting front end");
    engine.start_frontend(&driver_name, &hardware_section)?;

    let defaults = ChannelParams::default();
    let global_overlay = config.global_overlay();
    for section in config.channel_section_names() {
        if config.channel_disabled(section) {
            continue;
        }
        let section_overlay = config.channel_overlay(section);
        let preset_overlay = section_overlay
            .preset
            .as_deref()
            .and_then(|name| config.preset_overlay(name));

        let freqs = config.channel_freqs(section);
        let explicit_ssrc = config.channel_ssrc(section);

        if freqs.is_empty() {
            let params = ChannelParams::resolve(&defaults, &global_overlay, preset_overlay.as_ref(), &section_overlay);
            let ssrc = explicit_ssrc.unwrap_or_else(|| radiod_engine::channel::default_ssrc_for_freq(params.freq_hz));
            create_and_start(&engine, ssrc, params, section);
        } else {
            for freq_hz in freqs {
                let mut overlay = section_overlay.clone();
                overlay.freq_hz = Some(freq_hz);
                let params = ChannelParams::resolve(&defaults, &global_overlay, preset_overlay.as_ref(), &overlay);
                let ssrc = explicit_ssrc.unwrap_or_else(|| radiod_engine::channel::default_ssrc_for_freq(freq_hz));
                create_and_start(&engine, ssrc, params, section);
            }
        }
    }

    let engine = Arc::new(engine);

    let fired = if !cli.no_status {
        let status_name = config
            .document()
            .section("global")
            .and_then(|s| s.get("status"))
            .cloned()
            .unwrap_or_else(|| "radiod-status".to_string());
        let group = net::group_addr_for_name(&status_name);
        let std_socket = net::join_multicast(group, 5006, 1)?;
        std_socket
            .set_nonblocking(true)
            .map_err(|e| radiod_core::EngineError::OutputBind(format!("nonblocking: {e}")))?;
        let socket = tokio::net::UdpSocket::from_std(std_socket)
            .map_err(|e| radiod_core::EngineError::OutputBind(format!("tokio socket: {e}")))?;
        info!(group = %group, "joined status/command multicast group");

        let status_engine = Arc::clone(&engine);
        let group_addr = std::net::SocketAddr::new(std::net::IpAddr::V4(group), 5006);
        let status_task = tokio::spawn(status::run_status_loop(status_engine, socket, group_addr));

        let fired = signals::wait_for_shutdown_signal(verbosity).await;
        engine.shutdown();
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        status_task.abort();
        let _ = status_task.await;
        fired
    } else {
        let fired = signals::wait_for_shutdown_signal(verbosity).await;
        engine.shutdown();
        fired
    };

    Ok(fired.exit_code())
}

fn create_and_start(engine: &Engine, ssrc: u32, params: ChannelParams, section: &str) {
    match engine.create_channel(ssrc, params) {
        Ok(handle) => {
            handle.lock().unwrap().start_demod();
            info!(ssrc, section, "channel started");
        }
        Err(e) => error!(ssrc, section, error = %e, "failed to create channel"),
    }
}
