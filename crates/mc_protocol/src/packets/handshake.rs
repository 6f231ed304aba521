//! The single packet of the `Handshake` state, sent serverbound only.

use std::io::Write;

use crate::{Decode, Encode, VarInt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextState {
    Status,
    Login,
}

impl Encode for NextState {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        let n = match self {
            NextState::Status => 1,
            NextState::Login => 2,
        };
        VarInt(n).encode(w)
    }
}

impl Decode for NextState {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        match VarInt::decode(r)?.0 {
            1 => Ok(NextState::Status),
            2 => Ok(NextState::Login),
            n => Err(anyhow::anyhow!("invalid handshake next_state {n}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: NextState,
}

impl Handshake {
    pub const ID: i32 = 0x00;
}

impl Encode for Handshake {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        VarInt(self.protocol_version).encode(&mut w)?;
        self.server_address.encode(&mut w)?;
        self.server_port.encode(&mut w)?;
        self.next_state.encode(w)
    }
}

impl Decode for Handshake {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self {
            protocol_version: VarInt::decode(r)?.0,
            server_address: String::decode(r)?,
            server_port: u16::decode(r)?,
            next_state: NextState::decode(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_login_handshake() {
        let hs = Handshake {
            protocol_version: 340,
            server_address: "connect.2b2t.org".to_owned(),
            server_port: 25565,
            next_state: NextState::Login,
        };
        let mut buf = Vec::new();
        hs.encode(&mut buf).unwrap();
        let mut slice = buf.as_slice();
        assert_eq!(Handshake::decode(&mut slice).unwrap(), hs);
        assert!(slice.is_empty());
    }
}
