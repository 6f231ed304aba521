//! Socket-level packet read/write helpers shared by the upstream client and
//! the downstream listener: feed a [`PacketDecoder`] off a
//! [`tokio::net::TcpStream`] half and flush a [`PacketEncoder`] back out,
//! the same `read_buf`-into-decoder loop `packet_inspector` uses for its own
//! proxy plumbing.

use anyhow::Context;
use mc_protocol::codec::{PacketDecoder, PacketEncoder, RawPacket};
use mc_protocol::Encode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

const READ_BUF_SIZE: usize = 4096;

/// Reads bytes off `read` until the decoder yields a complete frame, or
/// `Ok(None)` once the peer has closed the socket cleanly.
pub async fn read_packet(read: &mut OwnedReadHalf, dec: &mut PacketDecoder) -> anyhow::Result<Option<RawPacket>> {
    loop {
        if let Some(packet) = dec.try_next_packet()? {
            return Ok(Some(packet));
        }

        let mut buf = bytes::BytesMut::with_capacity(READ_BUF_SIZE);
        let n = read.read_buf(&mut buf).await.context("reading from socket")?;
        if n == 0 {
            return Ok(None);
        }
        dec.decrypt_in_place(&mut buf[..n]);
        dec.queue_bytes(buf);
    }
}

/// Appends one packet to `enc` and flushes everything it holds to `write`.
pub async fn send_packet<P: Encode>(write: &mut OwnedWriteHalf, enc: &mut PacketEncoder, id: i32, packet: &P) -> anyhow::Result<()> {
    enc.append_packet(id, packet)?;
    flush(write, enc).await
}

/// Flushes whatever `enc` has buffered (used by the bridge, which appends
/// packets to the encoder without necessarily having just encoded one).
pub async fn flush(write: &mut OwnedWriteHalf, enc: &mut PacketEncoder) -> anyhow::Result<()> {
    let bytes = enc.take();
    if !bytes.is_empty() {
        write.write_all(&bytes).await.context("writing to socket")?;
    }
    Ok(())
}

/// Wraps an already-encoded packet body so it can be re-appended to an
/// encoder verbatim — the bridge's pass-through path for packets it does
/// not need to rewrite.
pub struct RawBody<'a>(pub &'a [u8]);

impl Encode for RawBody<'_> {
    fn encode(&self, mut w: impl std::io::Write) -> anyhow::Result<()> {
        w.write_all(self.0)?;
        Ok(())
    }
}
