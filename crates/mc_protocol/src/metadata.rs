//! Entity metadata: the heterogeneous, self-describing key/value stream
//! embedded in `EntityMetadata` (0x3C) and the spawn packets. Decoded (not
//! left as an opaque blob) because the bridge's fireworks-entity eid rewrite
//! (spec §4.5) has to inspect index 7 of a specific entity's stream.

use std::io::Write;

use uuid::Uuid;

use crate::{BlockPos, ChatComponent, Decode, Encode, ItemStack, VarInt};

const TERMINATOR: u8 = 0xff;

#[derive(Clone, Debug, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    VarInt(i32),
    Float(f32),
    String(String),
    Chat(ChatComponent),
    OptChat(Option<ChatComponent>),
    Slot(ItemStack),
    Boolean(bool),
    Rotation(f32, f32, f32),
    Position(BlockPos),
    OptPosition(Option<BlockPos>),
    Direction(i32),
    OptUuid(Option<Uuid>),
    BlockId(i32),
}

impl MetadataValue {
    fn type_id(&self) -> i32 {
        match self {
            MetadataValue::Byte(_) => 0,
            MetadataValue::VarInt(_) => 1,
            MetadataValue::Float(_) => 2,
            MetadataValue::String(_) => 3,
            MetadataValue::Chat(_) => 4,
            MetadataValue::OptChat(_) => 5,
            MetadataValue::Slot(_) => 6,
            MetadataValue::Boolean(_) => 7,
            MetadataValue::Rotation(..) => 8,
            MetadataValue::Position(_) => 9,
            MetadataValue::OptPosition(_) => 10,
            MetadataValue::Direction(_) => 11,
            MetadataValue::OptUuid(_) => 12,
            MetadataValue::BlockId(_) => 13,
        }
    }

    fn encode_value(&self, mut w: impl Write) -> anyhow::Result<()> {
        match self {
            MetadataValue::Byte(v) => v.encode(w),
            MetadataValue::VarInt(v) => VarInt(*v).encode(w),
            MetadataValue::Float(v) => v.encode(w),
            MetadataValue::String(v) => v.encode(w),
            MetadataValue::Chat(v) => v.encode(w),
            MetadataValue::OptChat(v) => match v {
                Some(c) => {
                    true.encode(&mut w)?;
                    c.encode(w)
                }
                None => false.encode(w),
            },
            MetadataValue::Slot(v) => v.encode(w),
            MetadataValue::Boolean(v) => v.encode(w),
            MetadataValue::Rotation(x, y, z) => {
                x.encode(&mut w)?;
                y.encode(&mut w)?;
                z.encode(w)
            }
            MetadataValue::Position(v) => v.encode(w),
            MetadataValue::OptPosition(v) => match v {
                Some(p) => {
                    true.encode(&mut w)?;
                    p.encode(w)
                }
                None => false.encode(w),
            },
            MetadataValue::Direction(v) => VarInt(*v).encode(w),
            MetadataValue::OptUuid(v) => match v {
                Some(u) => {
                    true.encode(&mut w)?;
                    u.encode(w)
                }
                None => false.encode(w),
            },
            MetadataValue::BlockId(v) => VarInt(*v).encode(w),
        }
    }

    fn decode_value(type_id: i32, r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(match type_id {
            0 => MetadataValue::Byte(i8::decode(r)?),
            1 => MetadataValue::VarInt(VarInt::decode(r)?.0),
            2 => MetadataValue::Float(f32::decode(r)?),
            3 => MetadataValue::String(String::decode(r)?),
            4 => MetadataValue::Chat(ChatComponent::decode(r)?),
            5 => MetadataValue::OptChat(if bool::decode(r)? {
                Some(ChatComponent::decode(r)?)
            } else {
                None
            }),
            6 => MetadataValue::Slot(ItemStack::decode(r)?),
            7 => MetadataValue::Boolean(bool::decode(r)?),
            8 => MetadataValue::Rotation(f32::decode(r)?, f32::decode(r)?, f32::decode(r)?),
            9 => MetadataValue::Position(BlockPos::decode(r)?),
            10 => MetadataValue::OptPosition(if bool::decode(r)? {
                Some(BlockPos::decode(r)?)
            } else {
                None
            }),
            11 => MetadataValue::Direction(VarInt::decode(r)?.0),
            12 => MetadataValue::OptUuid(if bool::decode(r)? { Some(Uuid::decode(r)?) } else { None }),
            13 => MetadataValue::BlockId(VarInt::decode(r)?.0),
            other => anyhow::bail!("unknown entity metadata type id {other}"),
        })
    }

    /// The payload the fireworks-entity rewrite cares about: `Some(eid)` if
    /// this is a VarInt-typed value, per spec §4.5's "index 7 type 1" check.
    pub fn as_var_int(&self) -> Option<i32> {
        match self {
            MetadataValue::VarInt(v) => Some(*v),
            _ => None,
        }
    }
}

/// An entire metadata stream: an ordered list of `(index, value)` pairs
/// terminated by a `0xff` index byte.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata(pub Vec<(u8, MetadataValue)>);

impl Metadata {
    pub fn get(&self, index: u8) -> Option<&MetadataValue> {
        self.0.iter().find(|(i, _)| *i == index).map(|(_, v)| v)
    }

    pub fn set(&mut self, index: u8, value: MetadataValue) {
        if let Some(entry) = self.0.iter_mut().find(|(i, _)| *i == index) {
            entry.1 = value;
        } else {
            self.0.push((index, value));
        }
    }
}

impl Encode for Metadata {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        for (index, value) in &self.0 {
            index.encode(&mut w)?;
            VarInt(value.type_id()).encode(&mut w)?;
            value.encode_value(&mut w)?;
        }
        TERMINATOR.encode(w)
    }
}

impl Decode for Metadata {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let mut entries = Vec::new();
        loop {
            let index = u8::decode(r)?;
            if index == TERMINATOR {
                break;
            }
            let type_id = VarInt::decode(r)?.0;
            entries.push((index, MetadataValue::decode_value(type_id, r)?));
        }
        Ok(Self(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_mixed_metadata_stream() {
        let mut meta = Metadata::default();
        meta.set(0, MetadataValue::Byte(0));
        meta.set(7, MetadataValue::VarInt(9_999_999));
        meta.set(2, MetadataValue::OptChat(Some(ChatComponent::text("hi"))));

        let mut buf = Vec::new();
        meta.encode(&mut buf).unwrap();

        let mut slice = buf.as_slice();
        let decoded = Metadata::decode(&mut slice).unwrap();
        assert_eq!(decoded, meta);
        assert!(slice.is_empty());
    }

    #[test]
    fn as_var_int_extracts_the_fireworks_shooter_eid() {
        let mut meta = Metadata::default();
        meta.set(7, MetadataValue::VarInt(42));
        assert_eq!(meta.get(7).and_then(MetadataValue::as_var_int), Some(42));
        assert_eq!(meta.get(0), None);
    }
}
