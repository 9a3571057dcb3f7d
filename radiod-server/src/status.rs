// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The status/command multicast loop: receives TLV-encoded commands
//! (`Create`/`Retune`/`SetPreset`/`Destroy`/`Query`) addressed to a channel
//! SSRC, applies them against the engine's channel registry, replies to
//! `Query` directly, and periodically multicasts every active channel's
//! status back out to the group. Idle-channel reaping is handled by a
//! separate block-paced thread (`radiod_engine::worker::spawn_reaper`), not
//! by this loop's wall-clock ticker.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{info, warn};

use radiod_engine::channel::{Channel, ChannelParams, ChannelParamsOverlay, ChannelState};
use radiod_engine::Engine;

/// How often every active channel's status is re-announced even without an
/// incoming `Query`.
const STATUS_PERIOD: Duration = Duration::from_secs(1);

/// One parsed command from the status/command socket.
#[derive(Debug, Clone)]
pub enum Command {
    Create { ssrc: u32, params: ChannelParams },
    Retune { ssrc: u32, freq_hz: f64 },
    SetPreset { ssrc: u32, overlay: ChannelParamsOverlay },
    Destroy { ssrc: u32 },
    Query { ssrc: u32 },
}

/// Applies one command against the engine, logging (not propagating) any
/// per-channel failure — a malformed or stale command must never bring the
/// daemon down. `Query` is handled by the caller directly (it needs the
/// socket to reply on), so it is accepted here only for completeness and
/// falls through to a lookup-and-warn-on-miss, same as every other variant.
pub fn apply_command(engine: &Engine, command: Command) {
    match command {
        Command::Create { ssrc, params } => match engine.create_channel(ssrc, params) {
            Ok(handle) => {
                handle.lock().unwrap().start_demod();
                info!(ssrc, "channel created");
            }
            Err(e) => warn!(ssrc, error = %e, "failed to create channel"),
        },
        Command::Retune { ssrc, freq_hz } => {
            let Some(handle) = engine.channels.lookup(ssrc) else {
                warn!(ssrc, "retune: no such channel");
                return;
            };
            if let Err(e) = handle.lock().unwrap().set_freq(&engine.filter_input, freq_hz) {
                warn!(ssrc, error = %e, "retune failed");
            }
        }
        Command::SetPreset { ssrc, overlay } => {
            let Some(handle) = engine.channels.lookup(ssrc) else {
                warn!(ssrc, "set-preset: no such channel");
                return;
            };
            let mut channel = handle.lock().unwrap();
            let mut params = channel.params.clone();
            overlay.apply_to(&mut params);
            let freq_hz = params.freq_hz;
            channel.params = params;
            drop(channel);
            if overlay.freq_hz.is_some() {
                if let Some(handle) = engine.channels.lookup(ssrc) {
                    let _ = handle.lock().unwrap().set_freq(&engine.filter_input, freq_hz);
                }
            }
        }
        Command::Destroy { ssrc } => {
            if !engine.channels.destroy(ssrc) {
                warn!(ssrc, "destroy: no such channel");
            } else {
                info!(ssrc, "channel destroyed");
            }
        }
        Command::Query { ssrc } => {
            if engine.channels.lookup(ssrc).is_none() {
                warn!(ssrc, "query: no such channel");
            }
        }
    }
}

/// Runs the status/command loop until `engine.is_stopping()`. `socket` is
/// already bound and joined to the status multicast group by the caller
/// (`net::join_multicast`); `group_addr` is that same group's address,
/// used as the destination for periodic status broadcasts.
pub async fn run_status_loop(engine: Arc<Engine>, socket: UdpSocket, group_addr: SocketAddr) {
    let mut buf = [0u8; 1500];
    let mut ticker = tokio::time::interval(STATUS_PERIOD);

    loop {
        if engine.is_stopping() {
            return;
        }
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, addr)) => handle_datagram(&engine, &socket, addr, &buf[..len]).await,
                    Err(e) => warn!(error = %e, "status socket recv failed"),
                }
            }
            _ = ticker.tick() => {
                broadcast_status(&engine, &socket, group_addr).await;
            }
        }
    }
}

/// Decodes one incoming datagram and either replies directly (`Query`) or
/// applies the command against the registry.
async fn handle_datagram(engine: &Engine, socket: &UdpSocket, addr: SocketAddr, payload: &[u8]) {
    match decode_command(payload) {
        Some(Command::Query { ssrc }) => match engine.channels.lookup(ssrc) {
            Some(handle) => {
                let body = encode_status(ssrc, &handle.lock().unwrap());
                if let Err(e) = socket.send_to(&body, addr).await {
                    warn!(error = %e, ssrc, "status reply send failed");
                }
            }
            None => warn!(ssrc, "query: no such channel"),
        },
        Some(command) => apply_command(engine, command),
        None => {}
    }
}

/// Sends one `Status` TLV per active channel to the multicast group, at
/// least once every `STATUS_PERIOD` regardless of incoming queries.
async fn broadcast_status(engine: &Engine, socket: &UdpSocket, group_addr: SocketAddr) {
    for ssrc in engine.channels.active_ssrcs() {
        let Some(handle) = engine.channels.lookup(ssrc) else {
            continue;
        };
        let body = encode_status(ssrc, &handle.lock().unwrap());
        if let Err(e) = socket.send_to(&body, group_addr).await {
            warn!(error = %e, "status broadcast send failed");
            return;
        }
    }
}

/// Encodes one channel's status as a single-byte opcode (3) followed by
/// `ssrc` (u32 BE), `freq_hz` (f64 BE), a one-byte `ChannelState` code, and
/// `blocks_processed` (u64 BE). A named interface, not a wire-compatible
/// reimplementation of any existing protocol's Status TLV.
fn encode_status(ssrc: u32, channel: &Channel) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + 4 + 8 + 1 + 8);
    buf.push(3u8);
    buf.extend_from_slice(&ssrc.to_be_bytes());
    buf.extend_from_slice(&channel.params.freq_hz.to_be_bytes());
    buf.push(channel_state_code(channel.state));
    buf.extend_from_slice(&channel.stats.blocks_processed.to_be_bytes());
    buf
}

fn channel_state_code(state: ChannelState) -> u8 {
    match state {
        ChannelState::Created => 0,
        ChannelState::Running => 1,
        ChannelState::Idle => 2,
        ChannelState::Terminating => 3,
        ChannelState::Destroyed => 4,
    }
}

/// Decodes a single-byte opcode + fixed-layout payload. This is a named
/// interface, not a wire-compatible reimplementation of any specific
/// existing protocol: opcode 0 = Query(ssrc), 1 = Retune(ssrc, freq_hz as
/// f64), 2 = Destroy(ssrc). `Create`/`SetPreset` require a config-derived
/// `ChannelParams`/overlay and are issued internally from config loading,
/// not over the wire.
fn decode_command(payload: &[u8]) -> Option<Command> {
    if payload.is_empty() {
        return None;
    }
    let opcode = payload[0];
    let ssrc = u32::from_be_bytes(payload.get(1..5)?.try_into().ok()?);
    match opcode {
        0 => Some(Command::Query { ssrc }),
        1 => {
            let freq_hz = f64::from_be_bytes(payload.get(5..13)?.try_into().ok()?);
            Some(Command::Retune { ssrc, freq_hz })
        }
        2 => Some(Command::Destroy { ssrc }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_query_command() {
        let mut payload = vec![0u8];
        payload.extend_from_slice(&42u32.to_be_bytes());
        match decode_command(&payload) {
            Some(Command::Query { ssrc }) => assert_eq!(ssrc, 42),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn decodes_retune_command() {
        let mut payload = vec![1u8];
        payload.extend_from_slice(&7u32.to_be_bytes());
        payload.extend_from_slice(&14_074_000.0f64.to_be_bytes());
        match decode_command(&payload) {
            Some(Command::Retune { ssrc, freq_hz }) => {
                assert_eq!(ssrc, 7);
                assert_eq!(freq_hz, 14_074_000.0);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn truncated_payload_decodes_to_none() {
        assert!(decode_command(&[1, 0, 0]).is_none());
    }

    #[test]
    fn unknown_opcode_decodes_to_none() {
        let mut payload = vec![255u8];
        payload.extend_from_slice(&1u32.to_be_bytes());
        assert!(decode_command(&payload).is_none());
    }

    #[test]
    fn status_encoding_carries_ssrc_freq_and_state() {
        let engine = Engine::new(64, 9, false, 48_000.0, &[]).unwrap();
        let handle = engine
            .create_channel(
                9,
                ChannelParams {
                    freq_hz: 14_074_000.0,
                    ..Default::default()
                },
            )
            .unwrap();
        handle.lock().unwrap().start_demod();

        let body = encode_status(9, &handle.lock().unwrap());
        assert_eq!(body[0], 3u8);
        assert_eq!(u32::from_be_bytes(body[1..5].try_into().unwrap()), 9);
        assert_eq!(
            f64::from_be_bytes(body[5..13].try_into().unwrap()),
            14_074_000.0
        );
        assert_eq!(body[13], channel_state_code(ChannelState::Running));
        engine.shutdown();
    }
}
