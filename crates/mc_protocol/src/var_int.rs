use std::io::Write;

use anyhow::bail;
use byteorder::ReadBytesExt;
use thiserror::Error;

use crate::{Decode, Encode};

/// An `i32` encoded with the protocol's variable-length integer format: 7
/// payload bits per byte, little-endian group order, MSB of each byte set
/// iff another byte follows. At most [`VarInt::MAX_SIZE`] bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct VarInt(pub i32);

impl VarInt {
    pub const MAX_SIZE: usize = 5;

    /// The exact number of bytes [`Encode::encode`] will write for this
    /// value.
    pub fn written_size(self) -> usize {
        match self.0 {
            0 => 1,
            n => (31 - n.leading_zeros() as usize) / 7 + 1,
        }
    }

    /// Reads a VarInt's raw `i32` value without requiring the full `Decode`
    /// machinery, distinguishing "not enough bytes yet" from "malformed".
    /// Used by the frame reader to probe for a complete length prefix.
    pub fn decode_partial(mut r: impl std::io::Read) -> Result<i32, VarIntDecodeError> {
        let mut val = 0;
        for i in 0..Self::MAX_SIZE {
            let byte = r.read_u8().map_err(|_| VarIntDecodeError::Incomplete)?;
            val |= (byte as i32 & 0b0111_1111) << (i * 7);
            if byte & 0b1000_0000 == 0 {
                return Ok(val);
            }
        }
        Err(VarIntDecodeError::TooLarge)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum VarIntDecodeError {
    #[error("incomplete VarInt")]
    Incomplete,
    #[error("VarInt is too large (6th continuation byte)")]
    TooLarge,
}

impl Encode for VarInt {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        let mut val = self.0 as u32;
        loop {
            let mut byte = (val & 0b0111_1111) as u8;
            val >>= 7;
            if val != 0 {
                byte |= 0b1000_0000;
            }
            w.write_all(&[byte])?;
            if val == 0 {
                return Ok(());
            }
        }
    }
}

impl Decode for VarInt {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let mut val = 0;
        for i in 0..Self::MAX_SIZE {
            let byte = r.read_u8()?;
            val |= (byte as i32 & 0b0111_1111) << (i * 7);
            if byte & 0b1000_0000 == 0 {
                return Ok(VarInt(val));
            }
        }
        bail!("VarInt is too large")
    }
}

impl From<i32> for VarInt {
    fn from(i: i32) -> Self {
        VarInt(i)
    }
}

impl From<VarInt> for i32 {
    fn from(i: VarInt) -> Self {
        i.0
    }
}

#[cfg(test)]
mod tests {
    use rand::{thread_rng, Rng};

    use super::*;

    #[test]
    fn written_size_matches_actual_output() {
        let mut rng = thread_rng();
        let mut buf = vec![];

        for n in (0..10_000)
            .map(|_| rng.gen())
            .chain([0, i32::MIN, i32::MAX, -1, 1])
            .map(VarInt)
        {
            buf.clear();
            n.encode(&mut buf).unwrap();
            assert_eq!(buf.len(), n.written_size());
        }
    }

    #[test]
    fn round_trip() {
        let mut rng = thread_rng();
        let mut buf = vec![];

        for n in (0..100_000).map(|_| rng.gen()).chain([0, i32::MIN, i32::MAX]) {
            VarInt(n).encode(&mut buf).unwrap();

            let mut slice = buf.as_slice();
            assert!(slice.len() <= VarInt::MAX_SIZE);
            assert_eq!(n, VarInt::decode(&mut slice).unwrap().0);
            assert!(slice.is_empty());

            buf.clear();
        }
    }

    #[test]
    fn rejects_a_sixth_continuation_byte() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut slice = &bytes[..];
        assert!(VarInt::decode(&mut slice).is_err());
    }
}
