use std::fmt;
use std::io::Write;

use crate::{Decode, Encode};

const X_BITS: u32 = 26;
const Z_BITS: u32 = 26;
const Y_BITS: u32 = 12;

const X_MASK: i64 = (1 << X_BITS) - 1; // 0x3FFFFFF
const Z_MASK: i64 = (1 << Z_BITS) - 1; // 0x3FFFFFF
const Y_MASK: i64 = (1 << Y_BITS) - 1; // 0xFFF

const Z_SHIFT: u32 = 0;
const Y_SHIFT: u32 = Z_BITS;
const X_SHIFT: u32 = Z_BITS + Y_BITS;

/// An absolute block position, packed into a single `i64` on the wire as
/// `(x & 0x3FFFFFF) << 38 | (y & 0xFFF) << 26 | (z & 0x3FFFFFF)` — the
/// layout this legacy revision uses (later revisions reorder the fields).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn pack(self) -> i64 {
        ((self.x as i64 & X_MASK) << X_SHIFT)
            | ((self.y as i64 & Y_MASK) << Y_SHIFT)
            | ((self.z as i64 & Z_MASK) << Z_SHIFT)
    }

    pub const fn unpack(packed: i64) -> Self {
        let x = sign_extend((packed >> X_SHIFT) & X_MASK, X_BITS);
        let y = sign_extend((packed >> Y_SHIFT) & Y_MASK, Y_BITS);
        let z = sign_extend((packed >> Z_SHIFT) & Z_MASK, Z_BITS);
        Self { x, y, z }
    }
}

const fn sign_extend(value: i64, bits: u32) -> i32 {
    let shift = 64 - bits;
    ((value << shift) >> shift) as i32
}

impl Encode for BlockPos {
    fn encode(&self, w: impl Write) -> anyhow::Result<()> {
        self.pack().encode(w)
    }
}

impl Decode for BlockPos {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(BlockPos::unpack(i64::decode(r)?))
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_unpacks_without_loss() {
        let samples = [
            BlockPos::new(0, 0, 0),
            BlockPos::new(1, 1, 1),
            BlockPos::new(-1, -1, -1),
            BlockPos::new(33_554_431, 2047, 33_554_431),
            BlockPos::new(-33_554_432, -2048, -33_554_432),
            BlockPos::new(8, 65, 8),
        ];

        for pos in samples {
            assert_eq!(BlockPos::unpack(pos.pack()), pos, "pos = {pos}");
        }
    }

    #[test]
    fn packed_layout_matches_the_bit_formula() {
        let pos = BlockPos::new(8, 65, 8);
        let expected = ((8i64 & 0x3FF_FFFF) << 38) | ((65i64 & 0xFFF) << 26) | (8i64 & 0x3FF_FFFF);
        assert_eq!(pos.pack(), expected);
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let pos = BlockPos::new(-100, 70, 12345);
        let mut buf = Vec::new();
        pos.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), 8);

        let mut slice = buf.as_slice();
        assert_eq!(BlockPos::decode(&mut slice).unwrap(), pos);
    }
}
