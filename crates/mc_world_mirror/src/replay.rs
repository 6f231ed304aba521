//! Synthesizes a full clientbound join sequence from a `WorldMirror`
//! snapshot (spec §4.4). The emitted packets are replayed into a fresh
//! mirror to validate idempotence in tests — see spec §8.

use mc_protocol::codec::RawPacket;
use mc_protocol::packets::play_clientbound::*;
use mc_protocol::var_int::VarInt;
use mc_protocol::Encode;

use crate::chunk::encode_full_chunk;
use crate::entity::Entity;
use crate::mirror::{full_inventory_slots, WorldMirror};

fn raw<P: Encode>(id: i32, packet: &P) -> anyhow::Result<RawPacket> {
    let mut body = Vec::new();
    packet.encode(&mut body)?;
    Ok(RawPacket { id, body: body[..].into() })
}

/// Substitutes `mirror.eid` for `client_eid` in a single eid field — the
/// local player's upstream id never reaches a downstream client.
fn remap(eid: i32, mirror: &WorldMirror, client_eid: i32) -> i32 {
    if eid == mirror.eid { client_eid } else { eid }
}

/// Produces the ordered clientbound packet sequence that brings a fresh
/// client from "just logged in" to the mirror's current state.
///
/// `respawn` mirrors spec §4.4 item 1: set when this isn't the client's
/// first `JoinGame` in this connection, forcing a dimension round-trip so
/// the client's world actually reloads.
pub fn emit(mirror: &WorldMirror, client_eid: i32, respawn: bool) -> anyhow::Result<Vec<RawPacket>> {
    let mut out = Vec::new();

    // 1. JoinGame (optionally preceded by a sentinel-dimension Respawn pair).
    // Gamemode's spectator bit (3) never reaches a downstream client,
    // regardless of whether the mirror already stripped it on ingestion.
    let replay_gamemode = mirror.gamemode & JoinGame::SPECTATOR_BIT.wrapping_sub(1);
    let join = JoinGame {
        entity_id: client_eid,
        gamemode: replay_gamemode,
        dimension: mirror.dimension,
        difficulty: mirror.difficulty,
        max_players: 0,
        level_type: mirror.level_type.clone(),
        reduced_debug_info: false,
    };
    if respawn {
        let sentinel_dimension = if mirror.dimension == 1 { 0 } else { 1 };
        out.push(raw(Respawn::ID, &Respawn {
            dimension: sentinel_dimension,
            difficulty: mirror.difficulty,
            gamemode: replay_gamemode,
            level_type: mirror.level_type.clone(),
        })?);
        out.push(raw(Respawn::ID, &Respawn {
            dimension: mirror.dimension,
            difficulty: mirror.difficulty,
            gamemode: replay_gamemode,
            level_type: mirror.level_type.clone(),
        })?);
    }
    out.push(raw(JoinGame::ID, &join)?);

    // 2. PlayerAbilities.
    let mut flags = 0u8;
    if mirror.invulnerable {
        flags |= PlayerAbilitiesClientbound::FLAG_INVULNERABLE;
    }
    if mirror.flying {
        flags |= PlayerAbilitiesClientbound::FLAG_FLYING;
    }
    if mirror.allow_flying {
        flags |= PlayerAbilitiesClientbound::FLAG_ALLOW_FLYING;
    }
    if mirror.creative_mode {
        flags |= PlayerAbilitiesClientbound::FLAG_CREATIVE_MODE;
    }
    out.push(raw(PlayerAbilitiesClientbound::ID, &PlayerAbilitiesClientbound {
        flags,
        flying_speed: mirror.flying_speed,
        field_of_view_modifier: mirror.fov,
    })?);

    // 3. PlayerListItem action=add, every cached player.
    let entries = mirror
        .players
        .values()
        .map(|p| PlayerListAddEntry {
            uuid: p.uuid,
            name: p.name.clone(),
            properties: p.properties.clone(),
            gamemode: p.gamemode,
            ping: p.ping,
            display_name: p.display_name.clone(),
        })
        .collect();
    out.push(raw(PlayerListItemAdd::ID, &PlayerListItemAdd { entries })?);

    // 4. Teams, one create packet per cached team.
    for (name, team) in &mirror.teams {
        out.push(raw(TeamsCreate::ID, &TeamsCreate {
            team_name: name.clone(),
            display_name: team.display_name.clone(),
            prefix: team.prefix.clone(),
            suffix: team.suffix.clone(),
            friendly_fire: team.friendly_fire,
            name_tag_visibility: team.name_tag_visibility.clone(),
            collision_rule: team.collision_rule.clone(),
            color: team.color,
            players: team.players.clone(),
        })?);
    }

    // 5. WindowItems, window 0, exactly 46 slots.
    out.push(raw(WindowItems::ID, &WindowItems {
        window_id: 0,
        slots: full_inventory_slots(&mirror.inventory),
    })?);

    // 6. Maps, full 128x128 payload per cached map.
    for (&id, map) in &mirror.maps {
        out.push(raw(MapDataPacket::ID, &MapDataPacket {
            map_id: VarInt(id),
            scale: map.scale,
            tracking_position: map.tracking_position,
            icons: map.icons.clone(),
            columns: 128,
            rows: 128,
            x: 0,
            z: 0,
            data: map.data.clone(),
        })?);
    }

    // 7. Held item, experience, health, tab list, spawn, time, rain/fade.
    out.push(raw(HeldItemChangeClientbound::ID, &HeldItemChangeClientbound { slot: mirror.held_item })?);
    out.push(raw(SetExperience::ID, &SetExperience {
        experience_bar: mirror.xp_bar,
        level: VarInt(mirror.level),
        total_experience: VarInt(mirror.total_xp),
    })?);
    if mirror.health_initialized {
        out.push(raw(UpdateHealth::ID, &UpdateHealth {
            health: mirror.health,
            food: VarInt(mirror.food),
            food_saturation: mirror.saturation,
        })?);
    }
    if let (Some(header), Some(footer)) = (&mirror.player_list_header, &mirror.player_list_footer) {
        out.push(raw(PlayerListHeaderAndFooter::ID, &PlayerListHeaderAndFooter {
            header: header.clone(),
            footer: footer.clone(),
        })?);
    }
    out.push(raw(SpawnPosition::ID, &SpawnPosition { location: mirror.spawn_position })?);
    out.push(raw(TimeUpdate::ID, &TimeUpdate {
        world_age: mirror.world_age as i64,
        time_of_day: mirror.time as i64,
    })?);
    if mirror.raining {
        out.push(raw(ChangeGameState::ID, &ChangeGameState { reason: ChangeGameState::REASON_BEGIN_RAINING, value: 0.0 })?);
    }
    out.push(raw(ChangeGameState::ID, &ChangeGameState { reason: ChangeGameState::REASON_FADE_VALUE, value: mirror.fade_value })?);
    out.push(raw(ChangeGameState::ID, &ChangeGameState { reason: ChangeGameState::REASON_FADE_TIME, value: mirror.fade_time })?);

    // 8. UnlockRecipes, all recipe ids, same list passed for both displayed
    // and known since the mirror doesn't distinguish the two on replay.
    let recipe_ids: Vec<VarInt> = mirror.unlocked_recipes.iter().copied().map(VarInt).collect();
    out.push(raw(UnlockRecipes::ID, &UnlockRecipes {
        action: VarInt(UnlockRecipes::ACTION_INIT),
        crafting_book_open: false,
        filtering_craftable: false,
        recipe_ids: recipe_ids.clone(),
        recipe_ids_to_display: recipe_ids,
    })?);

    // 9. PlayerPositionAndLook, absolute, flags=0.
    out.push(raw(PlayerPositionAndLookClientbound::ID, &PlayerPositionAndLookClientbound {
        x: mirror.player.x,
        y: mirror.player.y,
        z: mirror.player.z,
        yaw: mirror.player.yaw,
        pitch: mirror.player.pitch,
        flags: 0,
        teleport_id: VarInt(0),
    })?);

    // 10. Every non-local entity: spawn, metadata, properties, equipment.
    // The local player gets metadata only.
    for (&eid, entity) in &mirror.entities {
        if eid == mirror.eid {
            if let Entity::Player { metadata, .. } = entity {
                out.push(raw(EntityMetadataPacket::ID, &EntityMetadataPacket {
                    entity_id: VarInt(client_eid),
                    metadata: metadata.clone(),
                })?);
            }
            continue;
        }

        out.push(spawn_packet(eid, entity)?);

        if let Some(metadata) = entity_metadata(entity) {
            out.push(raw(EntityMetadataPacket::ID, &EntityMetadataPacket {
                entity_id: VarInt(eid),
                metadata: metadata.clone(),
            })?);
        }

        let common = entity.common();
        if !common.properties.is_empty() {
            out.push(raw(EntityProperties::ID, &EntityProperties {
                entity_id: VarInt(eid),
                properties: common
                    .properties
                    .iter()
                    .map(|(key, prop)| EntityProperty { key: key.clone(), value: prop.value })
                    .collect(),
            })?);
        }
        for (&slot, item) in &common.equipment {
            out.push(raw(EntityEquipment::ID, &EntityEquipment {
                entity_id: VarInt(eid),
                slot: VarInt(slot),
                item: item.clone(),
            })?);
        }
    }

    // 11. Camera, then passenger graph and attachments.
    if let Some(camera_id) = mirror.camera {
        out.push(raw(Camera::ID, &Camera { camera_id: VarInt(remap(camera_id, mirror, client_eid)) })?);
    }
    for (&eid, entity) in &mirror.entities {
        let common = entity.common();
        if !common.passengers.is_empty() {
            out.push(raw(SetPassengers::ID, &SetPassengers {
                entity_id: VarInt(remap(eid, mirror, client_eid)),
                passenger_ids: common.passengers.iter().map(|&p| VarInt(remap(p, mirror, client_eid))).collect(),
            })?);
        }
        if let Some(holder) = common.attached_eid {
            out.push(raw(AttachEntity::ID, &AttachEntity {
                attached_entity_id: remap(eid, mirror, client_eid),
                holding_entity_id: remap(holder, mirror, client_eid),
            })?);
        }
    }

    // 12. Every cached chunk, re-encoded full with a direct 13-bit palette.
    for row in mirror.chunks.values() {
        for chunk in row.values() {
            out.push(raw(ChunkData::ID, &encode_full_chunk(chunk, mirror.dimension)?)?);
        }
    }

    Ok(out)
}

fn entity_metadata(entity: &Entity) -> Option<&mc_protocol::metadata::Metadata> {
    match entity {
        Entity::Mob { metadata, .. } | Entity::Player { metadata, .. } => Some(metadata),
        _ => None,
    }
}

fn spawn_packet(eid: i32, entity: &Entity) -> anyhow::Result<RawPacket> {
    match entity {
        Entity::Object { uuid, object_type, object_data, position, velocity, pitch, yaw, .. } => raw(SpawnObject::ID, &SpawnObject {
            entity_id: VarInt(eid),
            object_uuid: *uuid,
            object_type: *object_type,
            x: position.x,
            y: position.y,
            z: position.z,
            pitch: *pitch,
            yaw: *yaw,
            data: *object_data,
            velocity_x: velocity.x,
            velocity_y: velocity.y,
            velocity_z: velocity.z,
        }),
        Entity::Orb { position, orb_count, .. } => raw(SpawnExperienceOrb::ID, &SpawnExperienceOrb {
            entity_id: VarInt(eid),
            x: position.x,
            y: position.y,
            z: position.z,
            count: *orb_count,
        }),
        Entity::Global { object_type, position, .. } => raw(SpawnObject::ID, &SpawnObject {
            entity_id: VarInt(eid),
            object_uuid: uuid::Uuid::nil(),
            object_type: *object_type,
            x: position.x,
            y: position.y,
            z: position.z,
            pitch: 0,
            yaw: 0,
            data: 0,
            velocity_x: 0,
            velocity_y: 0,
            velocity_z: 0,
        }),
        Entity::Mob { uuid, mob_type, position, velocity, pitch, yaw, head_pitch, metadata, .. } => raw(SpawnMob::ID, &SpawnMob {
            entity_id: VarInt(eid),
            entity_uuid: *uuid,
            entity_type: VarInt(*mob_type),
            x: position.x,
            y: position.y,
            z: position.z,
            yaw: *yaw,
            pitch: *pitch,
            head_pitch: *head_pitch,
            velocity_x: velocity.x,
            velocity_y: velocity.y,
            velocity_z: velocity.z,
            metadata: metadata.clone(),
        }),
        Entity::Painting { uuid, painting_title, location, painting_direction, .. } => raw(SpawnPainting::ID, &SpawnPainting {
            entity_id: VarInt(eid),
            entity_uuid: *uuid,
            title: painting_title.clone(),
            location: *location,
            direction: *painting_direction,
        }),
        Entity::Player { uuid, position, yaw, pitch, metadata, .. } => raw(SpawnPlayer::ID, &SpawnPlayer {
            entity_id: VarInt(eid),
            player_uuid: *uuid,
            x: position.x,
            y: position.y,
            z: position.z,
            yaw: *yaw,
            pitch: *pitch,
            metadata: metadata.clone(),
        }),
    }
}

/// Replays an emitted sequence into a fresh mirror, used by the idempotence
/// test (spec §8) and nowhere else — a real downstream session never
/// re-derives a mirror from its own replay traffic.
#[cfg(test)]
pub fn replay_into_fresh_mirror(packets: &[RawPacket], dimension_for_chunks: i32) -> anyhow::Result<WorldMirror> {
    let mut mirror = WorldMirror::new();
    for packet in packets {
        match packet.id {
            id if id == JoinGame::ID => mirror.on_join_game(&packet.decode_body::<JoinGame>()?),
            id if id == PlayerAbilitiesClientbound::ID => mirror.on_player_abilities(&packet.decode_body::<PlayerAbilitiesClientbound>()?),
            id if id == PlayerListItemAdd::ID => mirror.on_player_list_item_add(&packet.decode_body::<PlayerListItemAdd>()?),
            id if id == WindowItems::ID => mirror.on_window_items(&packet.decode_body::<WindowItems>()?),
            id if id == SetExperience::ID => mirror.on_set_experience(&packet.decode_body::<SetExperience>()?),
            id if id == UpdateHealth::ID => mirror.on_update_health(&packet.decode_body::<UpdateHealth>()?),
            id if id == SpawnPosition::ID => mirror.on_spawn_position(&packet.decode_body::<SpawnPosition>()?),
            id if id == TimeUpdate::ID => mirror.on_time_update(&packet.decode_body::<TimeUpdate>()?),
            id if id == UnlockRecipes::ID => mirror.on_unlock_recipes(&packet.decode_body::<UnlockRecipes>()?),
            id if id == PlayerPositionAndLookClientbound::ID => {
                mirror.on_player_position_and_look(&packet.decode_body::<PlayerPositionAndLookClientbound>()?);
            }
            id if id == SpawnPlayer::ID => mirror.on_spawn_player(&packet.decode_body::<SpawnPlayer>()?),
            id if id == SpawnObject::ID => mirror.on_spawn_object(&packet.decode_body::<SpawnObject>()?),
            id if id == SpawnMob::ID => mirror.on_spawn_mob(&packet.decode_body::<SpawnMob>()?),
            id if id == SpawnExperienceOrb::ID => mirror.on_spawn_experience_orb(&packet.decode_body::<SpawnExperienceOrb>()?),
            id if id == ChunkData::ID => {
                mirror.dimension = dimension_for_chunks;
                mirror.on_chunk_data(&packet.decode_body::<ChunkData>()?)?;
            }
            _ => {}
        }
    }
    Ok(mirror)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, ChunkSection};
    use crate::entity::{EntityCommon, Position};

    fn sample_mirror() -> WorldMirror {
        let mut mirror = WorldMirror::new();
        mirror.on_join_game(&JoinGame {
            entity_id: 1,
            gamemode: 0,
            dimension: 0,
            difficulty: 2,
            max_players: 20,
            level_type: "default".to_owned(),
            reduced_debug_info: false,
        });
        mirror.players.insert(uuid::Uuid::nil(), crate::mirror::PlayerListEntry {
            uuid: uuid::Uuid::nil(),
            name: "Notch".to_owned(),
            properties: vec![],
            gamemode: 0,
            ping: 10,
            display_name: None,
        });
        mirror.player = crate::mirror::PlayerState { x: 8.5, y: 65.0, z: 8.5, yaw: 0.0, pitch: 0.0 };

        let mut section = ChunkSection::empty(true);
        section.blocks.fill(1);
        let mut chunk = Chunk::empty(0, 0);
        chunk.sections[0] = Some(section);
        mirror.chunks.entry(0).or_default().insert(0, chunk);

        mirror
    }

    #[test]
    fn emits_join_game_before_any_chunk_packet() {
        let mirror = sample_mirror();
        let packets = emit(&mirror, 9_999_999, false).unwrap();

        let join_index = packets.iter().position(|p| p.id == JoinGame::ID).unwrap();
        let chunk_index = packets.iter().position(|p| p.id == ChunkData::ID).unwrap();
        assert!(join_index < chunk_index);
    }

    #[test]
    fn replaying_the_emitted_sequence_reconstructs_the_mirror_up_to_eid() {
        let mirror = sample_mirror();
        let packets = emit(&mirror, 9_999_999, false).unwrap();
        let replayed = replay_into_fresh_mirror(&packets, mirror.dimension).unwrap();

        assert_eq!(replayed.gamemode, mirror.gamemode);
        assert_eq!(replayed.dimension, mirror.dimension);
        assert_eq!(replayed.player, mirror.player);
        assert_eq!(replayed.players.len(), mirror.players.len());
        assert_eq!(
            replayed.chunks[&0][&0].sections[0].as_ref().unwrap().blocks,
            mirror.chunks[&0][&0].sections[0].as_ref().unwrap().blocks
        );
    }

    #[test]
    fn local_player_emits_metadata_only_never_a_spawn_packet() {
        let mirror = sample_mirror();
        let packets = emit(&mirror, 9_999_999, false).unwrap();
        assert!(!packets.iter().any(|p| p.id == SpawnPlayer::ID));
    }

    #[test]
    fn passengers_are_remapped_to_the_client_eid() {
        let mut mirror = sample_mirror();
        let mut boat_common = EntityCommon::default();
        boat_common.passengers.insert(mirror.eid);
        mirror.insert_entity(2, Entity::Object {
            uuid: uuid::Uuid::nil(),
            object_type: 1,
            object_data: 0,
            position: Position::default(),
            velocity: Default::default(),
            pitch: 0,
            yaw: 0,
            common: boat_common,
        });

        let packets = emit(&mirror, 9_999_999, false).unwrap();
        let set_passengers = packets.iter().find(|p| p.id == SetPassengers::ID).unwrap();
        let decoded = set_passengers.decode_body::<SetPassengers>().unwrap();
        assert_eq!(decoded.passenger_ids, vec![VarInt(9_999_999)]);
    }
}
