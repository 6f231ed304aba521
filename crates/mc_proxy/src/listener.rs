//! Accepts downstream TCP connections and drives the `Status`/`Login`
//! handshake before handing a freshly authenticated client off to its
//! matching session (spec §4.6) — the inbound mirror of [`crate::upstream`].

use std::sync::Arc;
use std::time::Duration;

use mc_protocol::auth::{self, ServerKeyPair};
use mc_protocol::chat::ChatComponent;
use mc_protocol::codec::{PacketDecoder, PacketEncoder};
use mc_protocol::packets::handshake::{Handshake, NextState};
use mc_protocol::packets::login::{EncryptionRequest, EncryptionResponse, LoginDisconnect, LoginStart, LoginSuccess, SetCompression};
use mc_protocol::packets::play_clientbound::ChatMessage;
use mc_protocol::packets::play_serverbound::ChatMessageServerbound;
use mc_protocol::packets::status::{Ping, StatusResponse};
use mc_protocol::{MINECRAFT_VERSION, PROTOCOL_VERSION};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::io::{read_packet, send_packet};
use crate::management::{self, ManagementCommand};
use crate::profile::Profile;
use crate::session::SessionManager;

/// How often the idle loop re-broadcasts the profile listing (spec §4.6).
const IDLE_LISTING_INTERVAL: Duration = Duration::from_secs(10);

/// The downstream-facing half of the proxy: one TCP listener, one RSA
/// keypair generated at startup (vanilla servers do the same), and a
/// reference to the [`SessionManager`] every successful login attaches to.
pub struct DownstreamListener {
    addr: String,
    motd: String,
    compression_threshold: i32,
    server_keys: ServerKeyPair,
    manager: Arc<SessionManager>,
    http: reqwest::Client,
}

impl DownstreamListener {
    pub fn new(
        addr: String,
        motd: String,
        compression_threshold: i32,
        manager: Arc<SessionManager>,
        http: reqwest::Client,
    ) -> anyhow::Result<Self> {
        Ok(Self { addr, motd, compression_threshold, server_keys: ServerKeyPair::generate()?, manager, http })
    }

    /// Binds and accepts forever, spawning one task per connection. Each
    /// connection drives its own handshake independently, so one slow or
    /// malformed client can't stall another.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        tracing::info!(addr = %self.addr, "downstream listener bound");

        loop {
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true).ok();
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = this.handle_connection(stream).await {
                    tracing::debug!(%peer, error = %e, "downstream connection ended");
                }
            });
        }
    }

    async fn handle_connection(&self, stream: TcpStream) -> anyhow::Result<()> {
        let (mut read, mut write) = stream.into_split();
        let mut decoder = PacketDecoder::new();
        let mut encoder = PacketEncoder::new();

        let handshake_packet = read_packet(&mut read, &mut decoder)
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed during handshake"))?;
        let handshake = handshake_packet.decode_body::<Handshake>()?;

        match handshake.next_state {
            NextState::Status => self.handle_status(&mut read, &mut write, &mut decoder, &mut encoder).await,
            NextState::Login => self.handle_login(read, write, decoder, encoder, handshake.protocol_version).await,
        }
    }

    /// Spec §4.6's status scenario: a JSON status response naming the
    /// current session count and total profile count, then an echoed ping.
    async fn handle_status(
        &self,
        read: &mut OwnedReadHalf,
        write: &mut OwnedWriteHalf,
        decoder: &mut PacketDecoder,
        encoder: &mut PacketEncoder,
    ) -> anyhow::Result<()> {
        read_packet(read, decoder).await?.ok_or_else(|| anyhow::anyhow!("connection closed before status request"))?;

        let response = StatusResponse::build(
            PROTOCOL_VERSION,
            MINECRAFT_VERSION,
            &self.motd,
            self.manager.open_session_count(),
            self.manager.profiles().profile_count(),
        );
        send_packet(write, encoder, StatusResponse::ID, &response).await?;

        if let Some(packet) = read_packet(read, decoder).await? {
            let ping = packet.decode_body::<Ping>()?;
            send_packet(write, encoder, Ping::CLIENTBOUND_ID, &ping).await?;
        }
        Ok(())
    }

    /// Spec §4.6's login scenario: protocol-version gate, profile match,
    /// encryption, compression, `LoginSuccess`, then hand-off to the
    /// matched session (or the idle listing loop if that fails).
    async fn handle_login(
        &self,
        mut read: OwnedReadHalf,
        mut write: OwnedWriteHalf,
        mut decoder: PacketDecoder,
        mut encoder: PacketEncoder,
        protocol_version: i32,
    ) -> anyhow::Result<()> {
        if protocol_version != PROTOCOL_VERSION {
            let key = if protocol_version < PROTOCOL_VERSION {
                "multiplayer.disconnect.outdated_client"
            } else {
                "multiplayer.disconnect.outdated_server"
            };
            let reason = ChatComponent::translate(key, vec![ChatComponent::text(MINECRAFT_VERSION)]);
            send_packet(&mut write, &mut encoder, LoginDisconnect::ID, &LoginDisconnect { reason }).await?;
            return Ok(());
        }

        let login_packet = read_packet(&mut read, &mut decoder)
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed before login start"))?;
        let username = login_packet.decode_body::<LoginStart>()?.username;

        let Some(profile) = self.manager.profiles().profile_named(&username, &username) else {
            let reason = ChatComponent::text("You need to connect via one of your profiles");
            send_packet(&mut write, &mut encoder, LoginDisconnect::ID, &LoginDisconnect { reason }).await?;
            return Ok(());
        };

        let verify_token: [u8; 4] = rand::random();
        let request = EncryptionRequest {
            server_id: String::new(),
            public_key: self.server_keys.public_key_der.clone(),
            verify_token: verify_token.to_vec(),
        };
        send_packet(&mut write, &mut encoder, EncryptionRequest::ID, &request).await?;

        let response_packet = read_packet(&mut read, &mut decoder)
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed during encryption negotiation"))?;
        let response = response_packet.decode_body::<EncryptionResponse>()?;

        let shared_secret = self.server_keys.decrypt(&response.shared_secret)?;
        let decrypted_verify = self.server_keys.decrypt(&response.verify_token)?;
        auth::verify_token_matches(&verify_token, &decrypted_verify)?;

        let shared_secret: [u8; 16] =
            shared_secret.try_into().map_err(|_| anyhow::anyhow!("shared secret was not 16 bytes"))?;

        let hash = auth::server_hash(&shared_secret, &self.server_keys.public_key_der);
        let hash_hex = auth::auth_digest(&hash);
        auth::has_joined(&self.http, &username, &hash_hex).await?;

        decoder.enable_encryption(&shared_secret);
        encoder.enable_encryption(&shared_secret);

        decoder.set_compression(true);
        encoder.set_compression(Some(self.compression_threshold as u32));
        send_packet(&mut write, &mut encoder, SetCompression::ID, &SetCompression { threshold: self.compression_threshold }).await?;

        // This revision's `LoginSuccess` carries an all-zeros uuid and the
        // client's real username (spec §6) rather than a Mojang-issued id.
        send_packet(&mut write, &mut encoder, LoginSuccess::ID, &LoginSuccess { uuid: uuid::Uuid::nil(), username: username.clone() })
            .await?;

        self.serve_play(read, write, decoder, encoder, profile, username).await
    }

    /// Auto-connects and attaches to the profile matching this login (spec
    /// §4.6). If that connect attempt fails, the client falls back to the
    /// idle listing loop rather than being dropped outright.
    async fn serve_play(
        &self,
        read: OwnedReadHalf,
        write: OwnedWriteHalf,
        decoder: PacketDecoder,
        encoder: PacketEncoder,
        profile: Profile,
        owner: String,
    ) -> anyhow::Result<()> {
        match self.manager.ensure_connected(profile.clone()).await {
            Ok(handle) => {
                if let Err(e) = handle.attach(read, write, decoder, encoder).await {
                    tracing::warn!(profile = %profile.id, error = %e, "failed to attach freshly logged-in client to its session");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(profile = %profile.id, error = %e, "auto-connect on login failed, falling back to the idle listing");
                serve_unattached(read, write, decoder, encoder, owner, Arc::clone(&self.manager)).await
            }
        }
    }
}

/// Serves a downstream connection that isn't attached to any session: every
/// ten seconds it lists the owner's profiles and their connection/queue
/// state, and between ticks it watches for `/connect`/`/disconnect` chat
/// commands (spec §4.6). Returns once the connection closes or a `/connect`
/// hands the socket off to a session.
pub(crate) async fn serve_unattached(
    mut read: OwnedReadHalf,
    mut write: OwnedWriteHalf,
    mut decoder: PacketDecoder,
    mut encoder: PacketEncoder,
    owner: String,
    manager: Arc<SessionManager>,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(IDLE_LISTING_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let profiles = manager.profiles().profiles_for_owner(&owner);
                let listing = management::profile_listing(&profiles, |id| manager.status(id));
                let message = ChatMessage { message: listing, position: 1 };
                if send_packet(&mut write, &mut encoder, ChatMessage::ID, &message).await.is_err() {
                    return Ok(());
                }
            }

            packet = read_packet(&mut read, &mut decoder) => {
                let Some(packet) = packet? else { return Ok(()) };
                if packet.id != ChatMessageServerbound::ID {
                    continue;
                }
                let Ok(chat) = packet.decode_body::<ChatMessageServerbound>() else { continue };
                let Some(command) = management::parse(&chat.message) else { continue };

                match command {
                    ManagementCommand::Connect(arg) => {
                        let Some(target) = manager.resolve_profile(&owner, &arg) else { continue };
                        match manager.ensure_connected(target.clone()).await {
                            Ok(handle) => {
                                if let Err(e) = handle.attach(read, write, decoder, encoder).await {
                                    tracing::warn!(profile = %target.id, error = %e, "failed to attach idle client to its session");
                                }
                                return Ok(());
                            }
                            Err(e) => tracing::warn!(profile = %target.id, error = %e, "failed to connect from the idle listing"),
                        }
                    }
                    ManagementCommand::Disconnect(arg) => {
                        if let Some(target) = manager.resolve_profile(&owner, &arg) {
                            manager.disconnect(&target.id).await;
                        }
                    }
                }
            }
        }
    }
}
