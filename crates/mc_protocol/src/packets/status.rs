//! The `Status` state: server list ping, handled by the downstream listener
//! per spec §4.6 (the upstream client never sends a status request).

use std::io::Write;

use crate::{Decode, Encode};

/// Serverbound, empty body; requests [`StatusResponse`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusRequest;

impl StatusRequest {
    pub const ID: i32 = 0x00;
}

impl Encode for StatusRequest {
    fn encode(&self, _w: impl Write) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Decode for StatusRequest {
    fn decode(_r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self)
    }
}

/// Clientbound: a JSON string matching the vanilla server-list-ping schema.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusResponse {
    pub json: String,
}

impl StatusResponse {
    pub const ID: i32 = 0x00;

    /// Builds the JSON body vanilla clients expect: version name/protocol,
    /// player count/max, and a chat-component description (the MOTD).
    pub fn build(protocol: i32, version_name: &str, motd: &str, online: usize, max: usize) -> Self {
        let json = serde_json::json!({
            "version": { "name": version_name, "protocol": protocol },
            "players": { "max": max, "online": online, "sample": [] },
            "description": { "text": motd },
        })
        .to_string();
        Self { json }
    }
}

impl Encode for StatusResponse {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        self.json.encode(w)
    }
}

impl Decode for StatusResponse {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self { json: String::decode(r)? })
    }
}

/// Serverbound and clientbound (echoed verbatim): an opaque i64 payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ping {
    pub payload: i64,
}

impl Ping {
    pub const SERVERBOUND_ID: i32 = 0x01;
    pub const CLIENTBOUND_ID: i32 = 0x01;
}

impl Encode for Ping {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        self.payload.encode(w)
    }
}

impl Decode for Ping {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self { payload: i64::decode(r)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_payload_round_trips() {
        let ping = Ping { payload: -123_456_789 };
        let mut buf = Vec::new();
        ping.encode(&mut buf).unwrap();
        let mut slice = buf.as_slice();
        assert_eq!(Ping::decode(&mut slice).unwrap(), ping);
    }

    #[test]
    fn status_response_json_contains_the_protocol_number() {
        let resp = StatusResponse::build(340, "1.12.2", "2b2t Proxy", 3, 8);
        assert!(resp.json.contains("340"));
        assert!(resp.json.contains("2b2t Proxy"));
    }
}
