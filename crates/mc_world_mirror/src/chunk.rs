//! Chunk storage and the section bit-packing codec (spec §4.3's `ChunkData`
//! handler, §4.4's full-chunk re-encode).

use anyhow::ensure;
use mc_nbt::Compound;
use mc_protocol::packets::play_clientbound::ChunkData;
use mc_protocol::var_int::VarInt;
use mc_protocol::{Decode, Encode};

pub const SECTION_COUNT: usize = 16;
pub const BLOCKS_PER_SECTION: usize = 4096;
pub const BLOCK_LIGHT_BYTES: usize = 2048;
pub const SKY_LIGHT_BYTES: usize = 2048;
pub const BIOME_BYTES: usize = 256;

/// The bits-per-block this proxy always re-emits on replay: wide enough to
/// hold any vanilla 1.12.2 block state id without a palette lookup.
pub const REPLAY_BITS_PER_BLOCK: u32 = 13;

#[derive(Clone, Debug, PartialEq)]
pub struct ChunkSection {
    pub blocks: Vec<u16>,
    pub block_light: Vec<u8>,
    pub sky_light: Option<Vec<u8>>,
}

impl ChunkSection {
    pub fn empty(has_sky_light: bool) -> Self {
        Self {
            blocks: vec![0; BLOCKS_PER_SECTION],
            block_light: vec![0; BLOCK_LIGHT_BYTES],
            sky_light: has_sky_light.then(|| vec![0; SKY_LIGHT_BYTES]),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub x: i32,
    pub z: i32,
    pub sections: Vec<Option<ChunkSection>>,
    pub biomes: Vec<u8>,
    pub block_entities: Vec<Compound>,
}

impl Chunk {
    pub fn empty(x: i32, z: i32) -> Self {
        Self {
            x,
            z,
            sections: vec![None; SECTION_COUNT],
            biomes: vec![0; BIOME_BYTES],
            block_entities: Vec::new(),
        }
    }

    /// `chunks[x][z].sections[y>>4]`'s flat block index for a position
    /// local to the chunk, per spec §4.3's `BlockChange` handler formula.
    pub fn local_block_index(local_x: i32, y: i32, local_z: i32) -> usize {
        (((y & 15) << 8) | ((local_z & 15) << 4) | (local_x & 15)) as usize
    }
}

/// Parses a `ChunkData` packet's payload, applying it on top of an existing
/// chunk when present (a non-full-chunk packet only updates the sections
/// named in its bitmask) or building a fresh one.
pub fn decode_chunk_data(packet: &ChunkData, dimension: i32, existing: Option<Chunk>) -> anyhow::Result<Chunk> {
    let has_sky_light = dimension == 0;
    let mut chunk = if packet.full_chunk || existing.is_none() {
        Chunk::empty(packet.chunk_x, packet.chunk_z)
    } else {
        existing.unwrap()
    };

    let mut r = &packet.data[..];
    let mask = packet.primary_bit_mask.0;

    for section_index in 0..SECTION_COUNT {
        if mask & (1 << section_index) == 0 {
            continue;
        }

        let bits_per_block = u8::decode(&mut r)? as u32;
        ensure!(bits_per_block > 0, "chunk section has zero bits per block");

        let palette = if bits_per_block <= 8 {
            let palette_len = VarInt::decode(&mut r)?.0;
            ensure!(palette_len >= 0, "negative palette length");
            let mut palette = Vec::with_capacity(palette_len as usize);
            for _ in 0..palette_len {
                palette.push(VarInt::decode(&mut r)?.0);
            }
            Some(palette)
        } else {
            None
        };

        let longs_len = VarInt::decode(&mut r)?.0;
        ensure!(longs_len >= 0, "negative data array length");
        let mut longs = Vec::with_capacity(longs_len as usize);
        for _ in 0..longs_len {
            longs.push(i64::decode(&mut r)? as u64);
        }

        let blocks = unpack_blocks(&longs, bits_per_block, &palette)?;

        let block_light = read_bytes(&mut r, BLOCK_LIGHT_BYTES)?;
        let sky_light = has_sky_light.then(|| read_bytes(&mut r, SKY_LIGHT_BYTES)).transpose()?;

        chunk.sections[section_index] = Some(ChunkSection { blocks, block_light, sky_light });
    }

    if packet.full_chunk {
        chunk.biomes = read_bytes(&mut r, BIOME_BYTES)?;
    }

    chunk.block_entities = packet.block_entities.clone();

    Ok(chunk)
}

/// Re-encodes a full chunk column using the fixed `REPLAY_BITS_PER_BLOCK`
/// direct palette this proxy always emits on replay (spec §4.4, item 12).
pub fn encode_full_chunk(chunk: &Chunk, dimension: i32) -> anyhow::Result<ChunkData> {
    let has_sky_light = dimension == 0;
    let mut mask = 0i32;
    let mut data = Vec::new();

    for (index, section) in chunk.sections.iter().enumerate() {
        let Some(section) = section else { continue };
        mask |= 1 << index;

        (REPLAY_BITS_PER_BLOCK as u8).encode(&mut data)?;

        let longs = pack_blocks(&section.blocks, REPLAY_BITS_PER_BLOCK);
        VarInt(longs.len() as i32).encode(&mut data)?;
        for long in &longs {
            (*long as i64).encode(&mut data)?;
        }

        data.write_all_bytes(&section.block_light);
        if has_sky_light {
            let sky = section.sky_light.clone().unwrap_or_else(|| vec![0xff; SKY_LIGHT_BYTES]);
            data.write_all_bytes(&sky);
        }
    }

    data.write_all_bytes(&chunk.biomes);

    Ok(ChunkData {
        chunk_x: chunk.x,
        chunk_z: chunk.z,
        full_chunk: true,
        primary_bit_mask: VarInt(mask),
        data,
        block_entities: chunk.block_entities.clone(),
    })
}

/// Small helper so section-encoding reads like the sequential byte writer
/// every other `Encode` impl in this crate pack uses.
trait ByteSink {
    fn write_all_bytes(&mut self, bytes: &[u8]);
}

impl ByteSink for Vec<u8> {
    fn write_all_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

fn read_bytes(r: &mut &[u8], len: usize) -> anyhow::Result<Vec<u8>> {
    ensure!(r.len() >= len, "truncated chunk section payload, wanted {len} bytes");
    let (data, rest) = r.split_at(len);
    let out = data.to_vec();
    *r = rest;
    Ok(out)
}

fn unpack_blocks(longs: &[u64], bits_per_block: u32, palette: &Option<Vec<i32>>) -> anyhow::Result<Vec<u16>> {
    let mask = (1u64 << bits_per_block) - 1;
    let mut blocks = Vec::with_capacity(BLOCKS_PER_SECTION);

    for block_index in 0..BLOCKS_PER_SECTION {
        let bit_index = block_index as u32 * bits_per_block;
        let long_index = (bit_index / 64) as usize;
        let bit_offset = bit_index % 64;

        ensure!(long_index < longs.len(), "chunk section data array too short");

        let mut value = longs[long_index] >> bit_offset;
        if bit_offset + bits_per_block > 64 {
            ensure!(long_index + 1 < longs.len(), "chunk section data array too short");
            value |= longs[long_index + 1] << (64 - bit_offset);
        }
        value &= mask;

        let state_id = match palette {
            Some(palette) => {
                let palette_index = value as usize;
                ensure!(palette_index < palette.len(), "palette index out of range");
                palette[palette_index]
            }
            None => value as i32,
        };

        blocks.push(state_id as u16);
    }

    Ok(blocks)
}

fn pack_blocks(blocks: &[u16], bits_per_block: u32) -> Vec<u64> {
    let values_per_long = 64 / bits_per_block;
    let longs_needed = (blocks.len() as u32).div_ceil(values_per_long) as usize;
    let mut longs = vec![0u64; longs_needed];

    for (block_index, &value) in blocks.iter().enumerate() {
        let bit_index = block_index as u32 * bits_per_block;
        let long_index = (bit_index / 64) as usize;
        let bit_offset = bit_index % 64;

        longs[long_index] |= (value as u64) << bit_offset;
        if bit_offset + bits_per_block > 64 {
            longs[long_index + 1] |= (value as u64) >> (64 - bit_offset);
        }
    }

    longs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_blocks_round_trip_at_replay_width() {
        let mut blocks = vec![0u16; BLOCKS_PER_SECTION];
        for (i, b) in blocks.iter_mut().enumerate() {
            *b = (i % 8000) as u16;
        }

        let longs = pack_blocks(&blocks, REPLAY_BITS_PER_BLOCK);
        let unpacked = unpack_blocks(&longs, REPLAY_BITS_PER_BLOCK, &None).unwrap();
        assert_eq!(unpacked, blocks);
    }

    #[test]
    fn pack_and_unpack_blocks_round_trip_at_narrow_palette_width() {
        let mut blocks = vec![0u16; BLOCKS_PER_SECTION];
        for (i, b) in blocks.iter_mut().enumerate() {
            *b = (i % 16) as u16;
        }

        let longs = pack_blocks(&blocks, 4);
        let unpacked = unpack_blocks(&longs, 4, &None).unwrap();
        assert_eq!(unpacked, blocks);
    }

    #[test]
    fn full_chunk_round_trips_through_decode_and_encode() {
        let mut chunk = Chunk::empty(0, 0);
        let mut section = ChunkSection::empty(true);
        section.blocks.fill(1);
        chunk.sections[0] = Some(section);

        let packet = encode_full_chunk(&chunk, 0).unwrap();
        let decoded = decode_chunk_data(&packet, 0, None).unwrap();

        assert_eq!(decoded.sections[0].as_ref().unwrap().blocks, vec![1u16; BLOCKS_PER_SECTION]);
        assert!(decoded.sections[1].is_none());
    }

    #[test]
    fn local_block_index_matches_the_spec_formula() {
        assert_eq!(Chunk::local_block_index(3, 17, 9), ((17 & 15) << 8) | ((9 & 15) << 4) | (3 & 15));
    }
}
