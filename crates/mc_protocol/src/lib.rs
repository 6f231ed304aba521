//! Wire codec for Minecraft protocol revision 340 ("1.12.2").
//!
//! This crate is intentionally narrower than a general multi-version
//! protocol library: it encodes and decodes exactly the scalar types, packet
//! framing, and auxiliary structures (block positions, item slots, chat
//! components) this one revision needs. Packet *schemas* (which fields a
//! given id carries) live in [`crate::packets`]; this module and its
//! siblings provide the primitives every schema is built from.

pub mod auth;
pub mod block_pos;
pub mod chat;
pub mod codec;
pub mod item;
pub mod metadata;
pub mod packets;
pub mod var_int;

use std::io::Write;

pub use block_pos::BlockPos;
pub use chat::ChatComponent;
pub use codec::{PacketDecoder, PacketEncoder};
pub use item::ItemStack;
pub use metadata::Metadata;
pub use var_int::VarInt;

/// The fixed protocol revision this crate speaks. The proxy rejects any
/// handshake that names a different value.
pub const PROTOCOL_VERSION: i32 = 340;

/// The human-readable client version string reported in status responses
/// and outdated-client/server disconnect messages.
pub const MINECRAFT_VERSION: &str = "1.12.2";

/// The largest packet (post length-prefix) this codec will accept, matching
/// the vanilla client's own limit.
pub const MAX_PACKET_SIZE: i32 = 2_097_152;

/// A type that can be written in the wire format.
pub trait Encode {
    fn encode(&self, w: impl Write) -> anyhow::Result<()>;
}

/// A type that can be read from the wire format.
///
/// Unlike a zero-copy protocol library, decoding here always produces owned
/// values: packets decoded off the upstream socket are frequently retained
/// far longer than the read buffer (they become part of the world mirror's
/// snapshot), so borrowing from the input would just force an eager clone at
/// the call site anyway.
pub trait Decode: Sized {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self>;
}

macro_rules! impl_int_scalar {
    ($($t:ty => $read:ident, $write:ident);* $(;)?) => {
        $(
            impl Encode for $t {
                fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
                    use byteorder::{BigEndian, WriteBytesExt};
                    w.$write::<BigEndian>(*self)?;
                    Ok(())
                }
            }

            impl Decode for $t {
                fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
                    use byteorder::{BigEndian, ReadBytesExt};
                    Ok(r.$read::<BigEndian>()?)
                }
            }
        )*
    };
}

impl_int_scalar! {
    i16 => read_i16, write_i16;
    u16 => read_u16, write_u16;
    i32 => read_i32, write_i32;
    u32 => read_u32, write_u32;
    i64 => read_i64, write_i64;
    u64 => read_u64, write_u64;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
}

impl Encode for i8 {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        w.write_all(&[*self as u8])?;
        Ok(())
    }
}

impl Decode for i8 {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        use byteorder::ReadBytesExt;
        Ok(r.read_i8()?)
    }
}

impl Encode for u8 {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        w.write_all(&[*self])?;
        Ok(())
    }
}

impl Decode for u8 {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        use byteorder::ReadBytesExt;
        Ok(r.read_u8()?)
    }
}

impl Encode for bool {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        (*self as u8).encode(w)
    }
}

impl Decode for bool {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(u8::decode(r)? != 0)
    }
}

/// Strings are VarInt-length-prefixed UTF-8, as every other string-bearing
/// field in this protocol revision.
impl Encode for str {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        VarInt(self.len() as i32).encode(&mut w)?;
        w.write_all(self.as_bytes())?;
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        self.as_str().encode(w)
    }
}

impl Decode for String {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let len = VarInt::decode(r)?.0;
        anyhow::ensure!(len >= 0, "attempt to decode string of negative length");
        let len = len as usize;
        anyhow::ensure!(
            r.len() >= len,
            "not enough bytes remaining to decode a {len}-byte string"
        );
        let (data, rest) = r.split_at(len);
        let s = std::str::from_utf8(data)?.to_owned();
        *r = rest;
        Ok(s)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        match self {
            Some(v) => {
                true.encode(&mut w)?;
                v.encode(w)
            }
            None => false.encode(w),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(if bool::decode(r)? {
            Some(T::decode(r)?)
        } else {
            None
        })
    }
}

impl Encode for uuid::Uuid {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        self.as_u128().encode(w)
    }
}

impl Decode for uuid::Uuid {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(uuid::Uuid::from_u128(u128::decode(r)?))
    }
}

impl Encode for u128 {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        w.write_all(&self.to_be_bytes())?;
        Ok(())
    }
}

impl Decode for u128 {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        anyhow::ensure!(r.len() >= 16, "not enough bytes remaining to decode a u128");
        let (data, rest) = r.split_at(16);
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(data);
        *r = rest;
        Ok(u128::from_be_bytes(bytes))
    }
}

impl Encode for mc_nbt::Compound {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        Ok(mc_nbt::to_binary(self, "", w)?)
    }
}

impl Decode for mc_nbt::Compound {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        // A bare TAG_End byte encodes "no compound present" for the handful
        // of fields (item tags) that are optional at the NBT level rather
        // than wrapped in a protocol-level `Option`.
        if r.first() == Some(&0) {
            *r = &r[1..];
            return Ok(mc_nbt::Compound::new());
        }
        Ok(mc_nbt::from_binary(r)?.1)
    }
}

/// Parses a UUID accepted in either hyphenated or bare 32-hex-digit form
/// (spec §6) and normalizes it to bare hex for internal storage/comparison.
pub fn normalize_uuid(input: &str) -> anyhow::Result<String> {
    let uuid = if input.contains('-') {
        uuid::Uuid::parse_str(input)?
    } else {
        let hyphenated = format!(
            "{}-{}-{}-{}-{}",
            &input.get(0..8).ok_or_else(|| anyhow::anyhow!("uuid too short"))?,
            &input.get(8..12).ok_or_else(|| anyhow::anyhow!("uuid too short"))?,
            &input.get(12..16).ok_or_else(|| anyhow::anyhow!("uuid too short"))?,
            &input.get(16..20).ok_or_else(|| anyhow::anyhow!("uuid too short"))?,
            &input.get(20..32).ok_or_else(|| anyhow::anyhow!("uuid too short"))?,
        );
        uuid::Uuid::parse_str(&hyphenated)?
    };
    Ok(uuid.simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_round_trip() {
        let s = "hello, 2b2t".to_owned();
        let mut buf = Vec::new();
        s.encode(&mut buf).unwrap();

        let mut slice = buf.as_slice();
        assert_eq!(String::decode(&mut slice).unwrap(), s);
        assert!(slice.is_empty());
    }

    #[test]
    fn normalizes_bare_and_hyphenated_uuids_identically() {
        let hyphenated = "550e8400-e29b-41d4-a716-446655440000";
        let bare = "550e8400e29b41d4a716446655440000";
        assert_eq!(normalize_uuid(hyphenated).unwrap(), bare);
        assert_eq!(normalize_uuid(bare).unwrap(), bare);
    }
}
