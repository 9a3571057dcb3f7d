// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Signal handling: SIGINT/SIGQUIT/SIGTERM request a graceful shutdown;
//! SIGPIPE is ignored (`tokio::signal::unix` already leaves write-side
//! errors to be surfaced as `io::Error`, so the only thing to do is not
//! die); SIGUSR1/SIGUSR2 step the live log verbosity up or down.

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use radiod_app::logging::VerbosityHandle;
use radiod_core::ExitCode;

/// Which shutdown signal fired, so the caller can pick the right exit code:
/// `closedown()`'s contract is exit 0 on SIGTERM, 70 (software) otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Quit,
    Terminate,
}

impl ShutdownSignal {
    pub fn exit_code(self) -> ExitCode {
        match self {
            ShutdownSignal::Terminate => ExitCode::Success,
            ShutdownSignal::Interrupt | ShutdownSignal::Quit => ExitCode::Software,
        }
    }
}

/// Runs until a shutdown signal arrives, adjusting `verbosity` live on
/// SIGUSR1 (louder) / SIGUSR2 (quieter) in the meantime.
pub async fn wait_for_shutdown_signal(mut verbosity: VerbosityHandle) -> ShutdownSignal {
    let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler");
    let mut sigquit = signal(SignalKind::quit()).expect("SIGQUIT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
    let mut sigusr1 = signal(SignalKind::user_defined1()).expect("SIGUSR1 handler");
    let mut sigusr2 = signal(SignalKind::user_defined2()).expect("SIGUSR2 handler");

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                return ShutdownSignal::Interrupt;
            }
            _ = sigquit.recv() => {
                info!("received SIGQUIT, shutting down");
                return ShutdownSignal::Quit;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                return ShutdownSignal::Terminate;
            }
            _ = sigusr1.recv() => {
                verbosity.increase();
                info!("SIGUSR1: verbosity increased to {}", verbosity.level());
            }
            _ = sigusr2.recv() => {
                verbosity.decrease();
                info!("SIGUSR2: verbosity decreased to {}", verbosity.level());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminate_maps_to_success() {
        assert_eq!(ShutdownSignal::Terminate.exit_code(), ExitCode::Success);
    }

    #[test]
    fn interrupt_and_quit_map_to_software() {
        assert_eq!(ShutdownSignal::Interrupt.exit_code(), ExitCode::Software);
        assert_eq!(ShutdownSignal::Quit.exit_code(), ExitCode::Software);
    }
}
