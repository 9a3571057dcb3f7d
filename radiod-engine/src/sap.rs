// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Session Announcement Protocol: periodic multicast advertisement of a
//! channel's RTP stream so passive listeners (media players, other
//! receivers) can discover it without querying the status/command channel.
//! This is a named interface, not a deeply implemented subsystem: it builds
//! the SDP payload and exposes the send cadence, leaving the actual socket
//! plumbing to `radiod-server::net`.

use std::time::Duration;

/// Announcements repeat on this period regardless of channel activity,
/// matching the advertised protocol's "announce periodically, don't wait for
/// a request" model.
pub const SAP_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(300);

/// One channel's advertised session: enough to build an SDP body naming its
/// multicast group, RTP payload type, and a human-readable description.
#[derive(Debug, Clone)]
pub struct SapSession {
    pub name: String,
    pub group_addr: std::net::Ipv4Addr,
    pub rtp_port: u16,
    pub payload_type: u8,
    pub samprate_hz: u32,
}

impl SapSession {
    /// Builds the SDP body describing this session, per RFC 4566's minimal
    /// required field set.
    pub fn to_sdp(&self) -> String {
        format!(
            "v=0\r\n\
             o=- 0 0 IN IP4 {addr}\r\n\
             s={name}\r\n\
             c=IN IP4 {addr}\r\n\
             t=0 0\r\n\
             m=audio {port} RTP/AVP {pt}\r\n\
             a=rtpmap:{pt} L16/{rate}\r\n",
            addr = self.group_addr,
            name = self.name,
            port = self.rtp_port,
            pt = self.payload_type,
            rate = self.samprate_hz,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdp_body_names_the_multicast_group_and_sample_rate() {
        let session = SapSession {
            name: "20m-ft8".into(),
            group_addr: "239.10.20.30".parse().unwrap(),
            rtp_port: 5004,
            payload_type: 111,
            samprate_hz: 12_000,
        };
        let sdp = session.to_sdp();
        assert!(sdp.contains("239.10.20.30"));
        assert!(sdp.contains("12000"));
        assert!(sdp.contains("20m-ft8"));
    }
}
