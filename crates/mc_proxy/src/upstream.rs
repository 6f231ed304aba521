//! The durable client half of a session: logging in to the remote server
//! (spec §4.2) and dispatching its Play-phase packet stream into a
//! [`WorldMirror`] (spec §4.3's per-id handler table).

use mc_protocol::auth::{self, ServerKeyPair};
use mc_protocol::chat::ChatComponent;
use mc_protocol::codec::{PacketDecoder, PacketEncoder, RawPacket};
use mc_protocol::packets::handshake::{Handshake, NextState};
use mc_protocol::packets::login::{EncryptionRequest, EncryptionResponse, LoginStart, LoginSuccess, SetCompression};
use mc_protocol::packets::play_clientbound::*;
use mc_protocol::var_int::VarInt;
use mc_protocol::{Decode, Encode, PROTOCOL_VERSION};
use mc_world_mirror::mirror::{PlayerListEntry, WorldMirror};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::error::{ProxyError, Result};
use crate::io::{read_packet, send_packet};
use crate::profile::Profile;

/// The upstream keep-alive id (spec §4.2): echoed back immediately by this
/// side, and the only packet excluded from the dump sink.
pub const KEEP_ALIVE_ID: i32 = 0x1F;
/// Play-phase disconnect (spec §4.2's failure semantics).
pub const PLAY_DISCONNECT_ID: i32 = 0x1A;
pub const CHAT_MESSAGE_SERVERBOUND_ID: i32 = 0x02;

/// An authenticated upstream connection, parked at the start of the `Play`
/// state and ready to be driven by the session loop.
pub struct UpstreamConnection {
    pub read: OwnedReadHalf,
    pub write: OwnedWriteHalf,
    pub decoder: PacketDecoder,
    pub encoder: PacketEncoder,
    pub uuid: uuid::Uuid,
    pub username: String,
}

/// Drives the `Handshake → Login` state machine against `addr` (spec
/// §4.2). A `Disconnect` sent during login surfaces as
/// [`ProxyError::Connect`], carrying the server's chat component reason.
pub async fn connect(addr: &str, profile: &Profile, http: &reqwest::Client) -> Result<UpstreamConnection> {
    let stream = TcpStream::connect(addr).await.map_err(ProxyError::Transport)?;
    stream.set_nodelay(true).ok();
    let (mut read, mut write) = stream.into_split();

    let (host, port) = split_host_port(addr);

    let mut decoder = PacketDecoder::new();
    let mut encoder = PacketEncoder::new();

    send_packet(&mut write, &mut encoder, Handshake::ID, &Handshake {
        protocol_version: PROTOCOL_VERSION,
        server_address: host,
        server_port: port,
        next_state: NextState::Login,
    })
    .await?;
    send_packet(&mut write, &mut encoder, LoginStart::ID, &LoginStart { username: profile.name.clone() }).await?;

    loop {
        let packet = read_packet(&mut read, &mut decoder)
            .await?
            .ok_or_else(|| ProxyError::Auth("upstream closed the connection during login".to_owned()))?;

        match packet.id {
            id if id == mc_protocol::packets::login::LoginDisconnect::ID => {
                let disconnect = packet.decode_body::<mc_protocol::packets::login::LoginDisconnect>()?;
                return Err(ProxyError::connect(disconnect.reason));
            }
            EncryptionRequest::ID => {
                let request = packet.decode_body::<EncryptionRequest>()?;
                let shared_secret: [u8; 16] = rand::random();

                let hash = auth::server_hash(&shared_secret, &request.public_key);
                let hash_hex = auth::auth_digest(&hash);
                auth::join_session_server(http, &profile.access_token, &profile_uuid(profile)?, &hash_hex)
                    .await
                    .map_err(|e| ProxyError::Auth(e.to_string()))?;

                let encrypted_secret = auth::encrypt_with_server_public_key(&request.public_key, &shared_secret)
                    .map_err(|e| ProxyError::Auth(e.to_string()))?;
                let encrypted_verify = auth::encrypt_with_server_public_key(&request.public_key, &request.verify_token)
                    .map_err(|e| ProxyError::Auth(e.to_string()))?;

                send_packet(&mut write, &mut encoder, EncryptionResponse::ID, &EncryptionResponse {
                    shared_secret: encrypted_secret,
                    verify_token: encrypted_verify,
                })
                .await?;

                decoder.enable_encryption(&shared_secret);
                encoder.enable_encryption(&shared_secret);
            }
            SetCompression::ID => {
                let set = packet.decode_body::<SetCompression>()?;
                decoder.set_compression(true);
                encoder.set_compression(Some(set.threshold as u32));
            }
            LoginSuccess::ID => {
                let success = packet.decode_body::<LoginSuccess>()?;
                return Ok(UpstreamConnection {
                    read,
                    write,
                    decoder,
                    encoder,
                    uuid: success.uuid,
                    username: success.username,
                });
            }
            other => {
                tracing::debug!(id = format!("0x{other:02x}"), "ignoring unexpected packet during upstream login");
            }
        }
    }
}

fn profile_uuid(profile: &Profile) -> Result<uuid::Uuid> {
    let normalized = mc_protocol::normalize_uuid(&profile.id).map_err(|e| ProxyError::Validation(e.to_string()))?;
    uuid::Uuid::parse_str(&normalized).map_err(|e| ProxyError::Validation(e.to_string()))
}

fn split_host_port(addr: &str) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (host.to_owned(), port.parse().unwrap_or(25565)),
        None => (addr.to_owned(), 25565),
    }
}

/// What dispatching one upstream packet into the mirror implies for the
/// session loop beyond the mutation already applied.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Handled with no further session-level action required.
    Handled,
    /// `0x2F PlayerPositionAndLook`: echo `TeleportConfirm` with this id.
    TeleportConfirm(i32),
    /// `0x1A PlayDisconnect`: the session is ending.
    Disconnected(ChatComponent),
}

/// Routes one decoded upstream packet to the matching `WorldMirror` handler
/// (spec §4.3's per-id table). Packets the mirror doesn't track (pure
/// pass-through traffic the bridge forwards unchanged) fall through the
/// catch-all with no effect.
pub fn dispatch_to_mirror(mirror: &mut WorldMirror, packet: &RawPacket) -> anyhow::Result<DispatchOutcome> {
    match packet.id {
        SpawnObject::ID => mirror.on_spawn_object(&packet.decode_body()?),
        SpawnExperienceOrb::ID => mirror.on_spawn_experience_orb(&packet.decode_body()?),
        SpawnMob::ID => mirror.on_spawn_mob(&packet.decode_body()?),
        SpawnPainting::ID => mirror.on_spawn_painting(&packet.decode_body()?),
        SpawnPlayer::ID => mirror.on_spawn_player(&packet.decode_body()?),
        UpdateBlockEntity::ID => mirror.on_update_block_entity(&packet.decode_body()?),
        BlockChange::ID => mirror.on_block_change(&packet.decode_body()?),
        BossBar::ID => mirror.on_boss_bar(&packet.decode_body()?),
        ChatMessage::ID => mirror.on_chat_message(&packet.decode_body()?),
        MultiBlockChange::ID => mirror.on_multi_block_change(&packet.decode_body()?),
        WindowItems::ID => mirror.on_window_items(&packet.decode_body()?),
        SetSlot::ID => mirror.on_set_slot(&packet.decode_body()?),
        Explosion::ID => mirror.on_explosion(&packet.decode_body()?),
        UnloadChunk::ID => mirror.on_unload_chunk(&packet.decode_body()?),
        ChangeGameState::ID => mirror.on_change_game_state(&packet.decode_body()?),
        ChunkData::ID => mirror.on_chunk_data(&packet.decode_body()?)?,
        JoinGame::ID => mirror.on_join_game(&packet.decode_body()?),
        PlayerAbilitiesClientbound::ID => mirror.on_player_abilities(&packet.decode_body()?),
        PlayerListItemAdd::ID => dispatch_player_list_item(mirror, &packet.body)?,
        PlayerPositionAndLookClientbound::ID => {
            let teleport_id = mirror.on_player_position_and_look(&packet.decode_body()?);
            return Ok(DispatchOutcome::TeleportConfirm(teleport_id));
        }
        UnlockRecipes::ID => mirror.on_unlock_recipes(&packet.decode_body()?),
        DestroyEntities::ID => mirror.on_destroy_entities(&packet.decode_body()?),
        Respawn::ID => mirror.on_respawn(&packet.decode_body()?),
        EntityRelativeMove::ID => mirror.on_entity_relative_move(&packet.decode_body()?),
        EntityLookAndRelativeMove::ID => mirror.on_entity_look_and_relative_move(&packet.decode_body()?),
        EntityTeleport::ID => mirror.on_entity_teleport(&packet.decode_body()?),
        EntityVelocity::ID => mirror.on_entity_velocity(&packet.decode_body()?),
        EntityMetadataPacket::ID => mirror.on_entity_metadata(&packet.decode_body()?),
        EntityEquipment::ID => mirror.on_entity_equipment(&packet.decode_body()?),
        EntityProperties::ID => mirror.on_entity_properties(&packet.decode_body()?),
        SetPassengers::ID => mirror.on_set_passengers(&packet.decode_body()?),
        AttachEntity::ID => mirror.on_attach_entity(&packet.decode_body()?),
        Camera::ID => mirror.on_camera(&packet.decode_body()?),
        HeldItemChangeClientbound::ID => mirror.on_held_item_change(&packet.decode_body()?),
        SetExperience::ID => mirror.on_set_experience(&packet.decode_body()?),
        UpdateHealth::ID => mirror.on_update_health(&packet.decode_body()?),
        SpawnPosition::ID => mirror.on_spawn_position(&packet.decode_body()?),
        TimeUpdate::ID => mirror.on_time_update(&packet.decode_body()?),
        PlayerListHeaderAndFooter::ID => mirror.on_player_list_header_and_footer(&packet.decode_body()?),
        TeamsRaw::ID => mirror.on_teams(&packet.decode_body()?),
        PlayDisconnect::ID => {
            let disconnect = packet.decode_body::<PlayDisconnect>()?;
            return Ok(DispatchOutcome::Disconnected(disconnect.reason));
        }
        _ => {}
    }
    Ok(DispatchOutcome::Handled)
}

/// `0x2E PlayerListItem`'s body is action-tagged (spec §4.3); all five
/// actions (add, update-gamemode, update-latency, update-display-name,
/// remove) mutate the mirror's cached player-list entries.
fn dispatch_player_list_item(mirror: &mut WorldMirror, body: &[u8]) -> anyhow::Result<()> {
    let mut r = body;
    let action = VarInt::decode(&mut r)?.0;
    match action {
        PlayerListItemAdd::ACTION_ADD => {
            let packet = PlayerListItemAdd::decode(&mut &body[..])?;
            mirror.on_player_list_item_add(&packet);
        }
        PlayerListItemAdd::ACTION_UPDATE_GAMEMODE => {
            let count = VarInt::decode(&mut r)?.0;
            anyhow::ensure!(count >= 0, "negative PlayerListItem entry count");
            for _ in 0..count {
                let uuid = uuid::Uuid::decode(&mut r)?;
                let gamemode = VarInt::decode(&mut r)?.0;
                mirror.on_player_list_item_update_gamemode(&PlayerListItemUpdateGamemode { uuid, gamemode });
            }
        }
        PlayerListItemAdd::ACTION_UPDATE_LATENCY => {
            let count = VarInt::decode(&mut r)?.0;
            anyhow::ensure!(count >= 0, "negative PlayerListItem entry count");
            for _ in 0..count {
                let uuid = uuid::Uuid::decode(&mut r)?;
                let ping = VarInt::decode(&mut r)?.0;
                mirror.on_player_list_item_update_ping(uuid, ping);
            }
        }
        PlayerListItemAdd::ACTION_UPDATE_DISPLAY_NAME => {
            let count = VarInt::decode(&mut r)?.0;
            anyhow::ensure!(count >= 0, "negative PlayerListItem entry count");
            for _ in 0..count {
                let uuid = uuid::Uuid::decode(&mut r)?;
                let display_name = Option::<ChatComponent>::decode(&mut r)?;
                mirror.on_player_list_item_update_display_name(uuid, display_name);
            }
        }
        PlayerListItemAdd::ACTION_REMOVE_PLAYER => {
            let count = VarInt::decode(&mut r)?.0;
            anyhow::ensure!(count >= 0, "negative PlayerListItem entry count");
            for _ in 0..count {
                let uuid = uuid::Uuid::decode(&mut r)?;
                mirror.on_player_list_item_remove(uuid);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Builds the fallback entry used when replaying to a downstream client
/// that only ever saw itself via `JoinGame`, never a `PlayerListItem` add —
/// vanilla servers always send one, but a defensive default keeps replay
/// total.
pub fn self_player_list_entry(uuid: uuid::Uuid, name: String, gamemode: i32) -> PlayerListEntry {
    PlayerListEntry { uuid, name, properties: Vec::new(), gamemode, ping: 0, display_name: None }
}
