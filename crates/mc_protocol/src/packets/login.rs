//! The `Login` state, driven from both sides: [`crate::auth`] does the
//! cryptography, these structs are just the wire shapes.

use std::io::Write;

use uuid::Uuid;

use crate::chat::ChatComponent;
use crate::{Decode, Encode, VarInt};

/// Clientbound, id 0x00: ends the login attempt with a reason. Upstream, a
/// disconnect here becomes the session's `disconnectReason`; downstream, the
/// listener uses it to reject bad protocol versions and unknown profiles.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginDisconnect {
    pub reason: ChatComponent,
}

impl LoginDisconnect {
    pub const ID: i32 = 0x00;
}

impl Encode for LoginDisconnect {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        self.reason.encode(w)
    }
}

impl Decode for LoginDisconnect {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self { reason: ChatComponent::decode(r)? })
    }
}

/// Clientbound, id 0x01: `EncryptionRequest`.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionRequest {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl EncryptionRequest {
    pub const ID: i32 = 0x01;
}

impl Encode for EncryptionRequest {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.server_id.encode(&mut w)?;
        VarInt(self.public_key.len() as i32).encode(&mut w)?;
        w.write_all(&self.public_key)?;
        VarInt(self.verify_token.len() as i32).encode(&mut w)?;
        w.write_all(&self.verify_token)?;
        Ok(())
    }
}

impl Decode for EncryptionRequest {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let server_id = String::decode(r)?;
        let public_key = decode_byte_array(r)?;
        let verify_token = decode_byte_array(r)?;
        Ok(Self { server_id, public_key, verify_token })
    }
}

/// Clientbound, id 0x02: carries the now-authoritative uuid/username.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub username: String,
}

impl LoginSuccess {
    pub const ID: i32 = 0x02;
}

impl Encode for LoginSuccess {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        // This revision encodes the uuid as its hyphenated string form, not
        // the 16 raw bytes later revisions use.
        self.uuid.hyphenated().to_string().encode(&mut w)?;
        self.username.encode(w)
    }
}

impl Decode for LoginSuccess {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let uuid_str = String::decode(r)?;
        let normalized = crate::normalize_uuid(&uuid_str)?;
        let uuid = Uuid::parse_str(&normalized)?;
        Ok(Self { uuid, username: String::decode(r)? })
    }
}

/// Clientbound, id 0x03: installs a compression threshold for all following
/// packets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetCompression {
    pub threshold: i32,
}

impl SetCompression {
    pub const ID: i32 = 0x03;
}

impl Encode for SetCompression {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        VarInt(self.threshold).encode(w)
    }
}

impl Decode for SetCompression {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self { threshold: VarInt::decode(r)?.0 })
    }
}

/// Serverbound, id 0x00: the only packet sent before encryption is settled.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginStart {
    pub username: String,
}

impl LoginStart {
    pub const ID: i32 = 0x00;
}

impl Encode for LoginStart {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        self.username.encode(w)
    }
}

impl Decode for LoginStart {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self { username: String::decode(r)? })
    }
}

/// Serverbound, id 0x01: the client's response to [`EncryptionRequest`].
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl EncryptionResponse {
    pub const ID: i32 = 0x01;
}

impl Encode for EncryptionResponse {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        VarInt(self.shared_secret.len() as i32).encode(&mut w)?;
        w.write_all(&self.shared_secret)?;
        VarInt(self.verify_token.len() as i32).encode(&mut w)?;
        w.write_all(&self.verify_token)?;
        Ok(())
    }
}

impl Decode for EncryptionResponse {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self {
            shared_secret: decode_byte_array(r)?,
            verify_token: decode_byte_array(r)?,
        })
    }
}

fn decode_byte_array(r: &mut &[u8]) -> anyhow::Result<Vec<u8>> {
    let len = VarInt::decode(r)?.0;
    anyhow::ensure!(len >= 0, "negative byte array length");
    let len = len as usize;
    anyhow::ensure!(r.len() >= len, "not enough bytes for a {len}-byte array");
    let (data, rest) = r.split_at(len);
    let out = data.to_vec();
    *r = rest;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_success_normalizes_bare_uuids_on_decode() {
        let mut buf = Vec::new();
        "550e8400e29b41d4a716446655440000".to_owned().encode(&mut buf).unwrap();
        "Notch".to_owned().encode(&mut buf).unwrap();

        let mut slice = buf.as_slice();
        let decoded = LoginSuccess::decode(&mut slice).unwrap();
        assert_eq!(decoded.uuid.hyphenated().to_string(), "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(decoded.username, "Notch");
    }

    #[test]
    fn encryption_request_round_trips() {
        let req = EncryptionRequest {
            server_id: String::new(),
            public_key: vec![1, 2, 3, 4],
            verify_token: vec![9, 9, 9, 9],
        };
        let mut buf = Vec::new();
        req.encode(&mut buf).unwrap();
        let mut slice = buf.as_slice();
        assert_eq!(EncryptionRequest::decode(&mut slice).unwrap(), req);
        assert!(slice.is_empty());
    }
}
