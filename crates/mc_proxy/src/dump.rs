//! Packet dump sink: when a profile enables `enablePacketDumps`, every
//! upstream-received packet (except keep-alives) is handed to a sink
//! implementing this trait. This crate ships one concrete implementation, a
//! gzip file matching the record format spec §6 names exactly.

use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;

/// The direction tag a dump record carries (spec §6: 0=inbound, 1=outbound).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    fn byte(self) -> u8 {
        match self {
            Direction::Inbound => 0,
            Direction::Outbound => 1,
        }
    }
}

/// A sink for raw packet bytes tagged with direction and timestamp (spec
/// §1's external collaborator list, §6's dump format).
pub trait DumpSink: Send + Sync {
    fn record(&mut self, direction: Direction, unix_millis: f64, bytes: &[u8]) -> anyhow::Result<()>;
}

/// Writes records to a gzip (level 4) file at `dumps/<ISO-8601>.<profile-id>.dump.gz`.
pub struct GzFileDumpSink {
    encoder: GzEncoder<std::fs::File>,
}

impl GzFileDumpSink {
    pub fn create(dump_dir: &Path, profile_id: &str, started_at_iso8601: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dump_dir)?;
        let path: PathBuf = dump_dir.join(format!("{started_at_iso8601}.{profile_id}.dump.gz"));
        let file = std::fs::File::create(path)?;
        Ok(Self { encoder: GzEncoder::new(file, Compression::new(4)) })
    }
}

impl DumpSink for GzFileDumpSink {
    fn record(&mut self, direction: Direction, unix_millis: f64, bytes: &[u8]) -> anyhow::Result<()> {
        self.encoder.write_u32::<BigEndian>(bytes.len() as u32)?;
        self.encoder.write_u8(direction.byte())?;
        self.encoder.write_f64::<BigEndian>(unix_millis)?;
        self.encoder.write_all(bytes)?;
        Ok(())
    }
}

/// The upstream keep-alive id this revision uses; dump records exclude it
/// (spec §6) since it carries no information and would otherwise dominate a
/// long-running session's dump size.
pub const KEEP_ALIVE_ID: i32 = 0x1F;

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;

    #[test]
    fn records_round_trip_through_the_gzip_stream() {
        let dir = std::env::temp_dir().join(format!("mc_proxy_dump_test_{}", std::process::id()));
        let sink_path;
        {
            let mut sink = GzFileDumpSink::create(&dir, "profile-id", "2024-01-01T00-00-00").unwrap();
            sink.record(Direction::Inbound, 1000.0, &[1, 2, 3]).unwrap();
            sink.record(Direction::Outbound, 2000.5, &[4, 5]).unwrap();
            sink_path = dir.join("2024-01-01T00-00-00.profile-id.dump.gz");
        }

        let mut raw = Vec::new();
        GzDecoder::new(std::fs::File::open(&sink_path).unwrap())
            .read_to_end(&mut raw)
            .unwrap();

        assert_eq!(&raw[0..4], &3u32.to_be_bytes());
        assert_eq!(raw[4], 0);
        assert_eq!(&raw[5..13], &1000.0f64.to_be_bytes());
        assert_eq!(&raw[13..16], &[1, 2, 3]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
