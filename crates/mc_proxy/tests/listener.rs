//! End-to-end coverage of the downstream listener's handshake, run against
//! an in-process `DownstreamListener` bound to a loopback port (spec §4.6):
//! the status-ping scenario and the outdated-client rejection.

use std::sync::Arc;
use std::time::Duration;

use mc_protocol::codec::{PacketDecoder, PacketEncoder};
use mc_protocol::packets::handshake::{Handshake, NextState};
use mc_protocol::packets::login::LoginDisconnect;
use mc_protocol::packets::status::{Ping, StatusRequest, StatusResponse};
use mc_proxy::listener::DownstreamListener;
use mc_proxy::observer::BroadcastObserver;
use mc_proxy::profile::{Profile, ProfileStore};
use mc_proxy::session::SessionManager;
use tokio::net::TcpStream;

struct EmptyProfileStore;

impl ProfileStore for EmptyProfileStore {
    fn profiles_for_owner(&self, _owner: &str) -> Vec<Profile> {
        Vec::new()
    }

    fn refresh_token(&self, _profile: &mut Profile) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn owns_profile(&self, _owner: &str, _profile_id: &str) -> bool {
        false
    }

    fn profile_count(&self) -> usize {
        0
    }
}

async fn spawn_listener(port: u16) {
    let manager = SessionManager::new(
        "127.0.0.1:1".to_owned(),
        reqwest::Client::new(),
        std::env::temp_dir(),
        Arc::new(BroadcastObserver::new()),
        Arc::new(EmptyProfileStore),
    );
    let listener = Arc::new(
        DownstreamListener::new(format!("127.0.0.1:{port}"), "test server".to_owned(), 256, manager, reqwest::Client::new())
            .unwrap(),
    );
    tokio::spawn(listener.run());
    // Give the listener a moment to bind before the test dials in.
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn raw_send(write: &mut tokio::net::tcp::OwnedWriteHalf, enc: &mut PacketEncoder, id: i32, body: &impl mc_protocol::Encode) {
    enc.append_packet(id, body).unwrap();
    let bytes = enc.take();
    use tokio::io::AsyncWriteExt;
    write.write_all(&bytes).await.unwrap();
}

async fn raw_recv(read: &mut tokio::net::tcp::OwnedReadHalf, dec: &mut PacketDecoder) -> mc_protocol::codec::RawPacket {
    use tokio::io::AsyncReadExt;
    loop {
        if let Some(packet) = dec.try_next_packet().unwrap() {
            return packet;
        }
        let mut buf = bytes::BytesMut::with_capacity(4096);
        let n = read.read_buf(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before a full packet arrived");
        dec.queue_bytes(buf);
    }
}

#[tokio::test]
async fn status_ping_reports_protocol_340_and_echoes_the_payload() {
    spawn_listener(38_211).await;

    let stream = TcpStream::connect("127.0.0.1:38211").await.unwrap();
    let (mut read, mut write) = stream.into_split();
    let mut enc = PacketEncoder::new();
    let mut dec = PacketDecoder::new();

    raw_send(&mut write, &mut enc, Handshake::ID, &Handshake {
        protocol_version: 340,
        server_address: "localhost".to_owned(),
        server_port: 38_211,
        next_state: NextState::Status,
    })
    .await;
    raw_send(&mut write, &mut enc, StatusRequest::ID, &StatusRequest).await;

    let response = raw_recv(&mut read, &mut dec).await;
    let status = response.decode_body::<StatusResponse>().unwrap();
    assert!(status.json.contains("\"protocol\":340"));
    assert!(status.json.contains("test server"));

    raw_send(&mut write, &mut enc, Ping::SERVERBOUND_ID, &Ping { payload: 424_242 }).await;
    let pong = raw_recv(&mut read, &mut dec).await;
    assert_eq!(pong.decode_body::<Ping>().unwrap().payload, 424_242);
}

#[tokio::test]
async fn mismatched_protocol_version_is_rejected_before_login_start() {
    spawn_listener(38_212).await;

    let stream = TcpStream::connect("127.0.0.1:38212").await.unwrap();
    let (mut read, mut write) = stream.into_split();
    let mut enc = PacketEncoder::new();
    let mut dec = PacketDecoder::new();

    raw_send(&mut write, &mut enc, Handshake::ID, &Handshake {
        protocol_version: 47,
        server_address: "localhost".to_owned(),
        server_port: 38_212,
        next_state: NextState::Login,
    })
    .await;

    let packet = raw_recv(&mut read, &mut dec).await;
    assert_eq!(packet.id, LoginDisconnect::ID);
    let disconnect = packet.decode_body::<LoginDisconnect>().unwrap();
    assert_eq!(disconnect.reason.translate.as_deref(), Some("multiplayer.disconnect.outdated_client"));
}
