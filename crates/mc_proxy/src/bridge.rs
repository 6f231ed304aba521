//! The rewriting filter pairing an attached downstream client with its
//! session's upstream stream (spec §4.5). Pure, synchronous functions: the
//! actual pipe lives in [`crate::session`], which already owns the
//! `WorldMirror` these rewrites need to consult or mutate.

use mc_protocol::codec::RawPacket;
use mc_protocol::packets::play_clientbound::*;
use mc_protocol::packets::play_serverbound::*;
use mc_protocol::var_int::VarInt;
use mc_protocol::{Decode, Encode};
use mc_world_mirror::entity::{Entity, Position};
use mc_world_mirror::mirror::WorldMirror;

/// The eid this proxy always presents to a downstream client (spec §6,
/// GLOSSARY).
pub const CLIENT_EID: i32 = 9_999_999;

/// Clientbound packet ids whose body starts with a VarInt entity id (spec
/// §4.5's first rewrite row), in this revision's own packet numbering.
const LEADING_VAR_INT_EID_IDS: &[i32] = &[
    Animation::ID,
    BlockBreakAnimation::ID,
    EntityRelativeMove::ID,
    EntityLookAndRelativeMove::ID,
    EntityLook::ID,
    UseBed::ID,
    RemoveEntityEffect::ID,
    EntityHeadLook::ID,
    Camera::ID,
    EntityVelocity::ID,
    EntityEquipment::ID,
    EntityTeleport::ID,
    EntityProperties::ID,
    EntityEffect::ID,
];

/// Rewrites one clientbound packet for the downstream peer: substitutes
/// `self_eid` for `client_eid` wherever an eid field names the local
/// player, otherwise passes the bytes through untouched.
pub fn rewrite_clientbound(mirror: &WorldMirror, self_eid: i32, packet: &RawPacket) -> anyhow::Result<RawPacket> {
    if LEADING_VAR_INT_EID_IDS.contains(&packet.id) {
        return Ok(RawPacket { id: packet.id, body: rewrite_leading_var_int(&packet.body, self_eid)?.into() });
    }

    match packet.id {
        EntityStatus::ID => Ok(RawPacket { id: packet.id, body: rewrite_leading_i32(&packet.body, self_eid)?.into() }),
        EntityMetadataPacket::ID => rewrite_entity_metadata(mirror, self_eid, packet),
        SetPassengers::ID => rewrite_set_passengers(self_eid, packet),
        _ => Ok(RawPacket { id: packet.id, body: packet.body.clone() }),
    }
}

fn substitute(eid: i32, self_eid: i32) -> i32 {
    if eid == self_eid {
        CLIENT_EID
    } else {
        eid
    }
}

fn rewrite_leading_var_int(body: &[u8], self_eid: i32) -> anyhow::Result<Vec<u8>> {
    let mut r = &body[..];
    let eid = VarInt::decode(&mut r)?.0;
    let rest = r;

    let mut out = Vec::with_capacity(body.len());
    VarInt(substitute(eid, self_eid)).encode(&mut out)?;
    out.extend_from_slice(rest);
    Ok(out)
}

fn rewrite_leading_i32(body: &[u8], self_eid: i32) -> anyhow::Result<Vec<u8>> {
    let mut r = &body[..];
    let eid = i32::decode(&mut r)?;
    let rest = r;

    let mut out = Vec::with_capacity(body.len());
    substitute(eid, self_eid).encode(&mut out)?;
    out.extend_from_slice(rest);
    Ok(out)
}

/// `0x3C EntityMetadata`: only fireworks entities (object type 76) carry an
/// eid at metadata index 7, so every other entity's metadata passes through
/// unexamined (spec §4.5).
fn rewrite_entity_metadata(mirror: &WorldMirror, self_eid: i32, packet: &RawPacket) -> anyhow::Result<RawPacket> {
    let decoded = packet.decode_body::<EntityMetadataPacket>()?;

    let is_fireworks = mirror
        .entities
        .get(&decoded.entity_id.0)
        .and_then(Entity::object_type)
        .is_some_and(|t| t == Entity::FIREWORKS_OBJECT_TYPE);

    if !is_fireworks {
        return Ok(RawPacket { id: packet.id, body: packet.body.clone() });
    }

    let mut metadata = decoded.metadata.clone();
    if let Some(mc_protocol::metadata::MetadataValue::VarInt(value)) = metadata.get(7).cloned() {
        if value == self_eid {
            metadata.set(7, mc_protocol::metadata::MetadataValue::VarInt(CLIENT_EID));
        }
    }

    let rewritten = EntityMetadataPacket { entity_id: decoded.entity_id, metadata };
    let mut body = Vec::new();
    rewritten.encode(&mut body)?;
    Ok(RawPacket { id: packet.id, body: body[..].into() })
}

/// `0x43 SetPassengers`: the vehicle id is untouched, only passenger ids are
/// substituted (spec §4.5).
fn rewrite_set_passengers(self_eid: i32, packet: &RawPacket) -> anyhow::Result<RawPacket> {
    let decoded = packet.decode_body::<SetPassengers>()?;
    let rewritten = SetPassengers {
        entity_id: decoded.entity_id,
        passenger_ids: decoded.passenger_ids.iter().map(|id| VarInt(substitute(id.0, self_eid))).collect(),
    };
    let mut body = Vec::new();
    rewritten.encode(&mut body)?;
    Ok(RawPacket { id: packet.id, body: body[..].into() })
}

/// What the session loop should do with one serverbound packet once the
/// bridge has applied its rewrite rule (spec §4.5's second table).
pub enum ServerboundAction {
    /// `0x00`/`0x0B`: the proxy maintains its own keep-alive and teleport
    /// bookkeeping, so the client's copy is simply discarded.
    Drop,
    /// Forward these exact bytes upstream, unchanged or rewritten.
    Forward(RawPacket),
}

/// Applies the serverbound rewrite table, mutating `mirror` in place for
/// the packets that track client-side state (spec §4.5). Safe to call from
/// the session's own task since it already exclusively owns `mirror`.
pub fn rewrite_serverbound(mirror: &mut WorldMirror, self_eid: i32, packet: RawPacket) -> anyhow::Result<ServerboundAction> {
    match packet.id {
        TeleportConfirm::ID | KeepAliveServerbound::ID => Ok(ServerboundAction::Drop),
        PlayerPosition::ID => {
            let p = packet.decode_body::<PlayerPosition>()?;
            mirror.player.x = p.x;
            mirror.player.y = p.y;
            mirror.player.z = p.z;
            Ok(ServerboundAction::Forward(packet))
        }
        PlayerPositionAndLookServerbound::ID => {
            let p = packet.decode_body::<PlayerPositionAndLookServerbound>()?;
            mirror.player.x = p.x;
            mirror.player.y = p.y;
            mirror.player.z = p.z;
            mirror.player.yaw = p.yaw;
            mirror.player.pitch = p.pitch;
            Ok(ServerboundAction::Forward(packet))
        }
        PlayerLook::ID => {
            let p = packet.decode_body::<PlayerLook>()?;
            mirror.player.yaw = p.yaw;
            mirror.player.pitch = p.pitch;
            Ok(ServerboundAction::Forward(packet))
        }
        VehicleMoveServerbound::ID => {
            let p = packet.decode_body::<VehicleMoveServerbound>()?;
            mirror.player.x = p.x;
            mirror.player.y = p.y;
            mirror.player.z = p.z;
            mirror.player.yaw = p.yaw;
            mirror.player.pitch = p.pitch;
            if let Some(riding_eid) = mirror.riding_eid {
                if let Some(entity) = mirror.entities.get_mut(&riding_eid) {
                    entity.set_position(Position { x: p.x, y: p.y, z: p.z });
                }
            }
            Ok(ServerboundAction::Forward(packet))
        }
        EntityAction::ID => {
            let p = packet.decode_body::<EntityAction>()?;
            let rewritten = EntityAction {
                entity_id: VarInt(if p.entity_id.0 == CLIENT_EID { self_eid } else { p.entity_id.0 }),
                action_id: p.action_id,
                jump_boost: p.jump_boost,
            };
            let mut body = Vec::new();
            rewritten.encode(&mut body)?;
            Ok(ServerboundAction::Forward(RawPacket { id: packet.id, body: body[..].into() }))
        }
        HeldItemChangeServerbound::ID => {
            let p = packet.decode_body::<HeldItemChangeServerbound>()?;
            mirror.held_item = p.slot as i8;
            Ok(ServerboundAction::Forward(packet))
        }
        _ => Ok(ServerboundAction::Forward(packet)),
    }
}

#[cfg(test)]
mod tests {
    use mc_world_mirror::entity::EntityCommon;
    use mc_world_mirror::mirror::WorldMirror;
    use uuid::Uuid;

    use super::*;

    fn raw<P: Encode>(id: i32, packet: &P) -> RawPacket {
        let mut body = Vec::new();
        packet.encode(&mut body).unwrap();
        RawPacket { id, body: body[..].into() }
    }

    #[test]
    fn entity_relative_move_substitutes_self_eid() {
        let mirror = WorldMirror::new();
        let packet = raw(EntityRelativeMove::ID, &EntityRelativeMove {
            entity_id: VarInt(1),
            delta_x: 0,
            delta_y: 0,
            delta_z: 0,
            on_ground: true,
        });

        let rewritten = rewrite_clientbound(&mirror, 1, &packet).unwrap();
        let decoded = rewritten.decode_body::<EntityRelativeMove>().unwrap();
        assert_eq!(decoded.entity_id.0, CLIENT_EID);
    }

    #[test]
    fn use_bed_substitutes_self_eid() {
        let mirror = WorldMirror::new();
        let packet = raw(UseBed::ID, &UseBed { entity_id: VarInt(1), location: mc_protocol::BlockPos { x: 0, y: 0, z: 0 } });

        let rewritten = rewrite_clientbound(&mirror, 1, &packet).unwrap();
        let decoded = rewritten.decode_body::<UseBed>().unwrap();
        assert_eq!(decoded.entity_id.0, CLIENT_EID);
    }

    #[test]
    fn remove_entity_effect_substitutes_self_eid() {
        let mirror = WorldMirror::new();
        let packet = raw(RemoveEntityEffect::ID, &RemoveEntityEffect { entity_id: VarInt(1), effect_id: 5 });

        let rewritten = rewrite_clientbound(&mirror, 1, &packet).unwrap();
        let decoded = rewritten.decode_body::<RemoveEntityEffect>().unwrap();
        assert_eq!(decoded.entity_id.0, CLIENT_EID);
    }

    #[test]
    fn block_break_animation_substitutes_self_eid() {
        let mirror = WorldMirror::new();
        let packet = raw(BlockBreakAnimation::ID, &BlockBreakAnimation {
            entity_id: VarInt(1),
            location: mc_protocol::BlockPos { x: 0, y: 0, z: 0 },
            destroy_stage: 3,
        });

        let rewritten = rewrite_clientbound(&mirror, 1, &packet).unwrap();
        let decoded = rewritten.decode_body::<BlockBreakAnimation>().unwrap();
        assert_eq!(decoded.entity_id.0, CLIENT_EID);
    }

    #[test]
    fn rewrite_is_a_no_op_for_other_entities() {
        let mirror = WorldMirror::new();
        let packet = raw(EntityRelativeMove::ID, &EntityRelativeMove {
            entity_id: VarInt(42),
            delta_x: 1,
            delta_y: 2,
            delta_z: 3,
            on_ground: false,
        });

        let rewritten = rewrite_clientbound(&mirror, 1, &packet).unwrap();
        let decoded = rewritten.decode_body::<EntityRelativeMove>().unwrap();
        assert_eq!(decoded.entity_id.0, 42);
    }

    #[test]
    fn rewrite_is_an_involution_on_the_chosen_id_field() {
        let mirror = WorldMirror::new();
        let original = raw(EntityTeleport::ID, &EntityTeleport {
            entity_id: VarInt(7),
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw: 0,
            pitch: 0,
            on_ground: true,
        });

        let once = rewrite_clientbound(&mirror, 7, &original).unwrap();
        let twice = rewrite_clientbound(&mirror, CLIENT_EID, &once).unwrap();
        assert_eq!(twice.body, original.body);
    }

    #[test]
    fn fireworks_metadata_rewrites_only_index_seven() {
        let mut mirror = WorldMirror::new();
        mirror.insert_entity(1, Entity::Object {
            uuid: Uuid::nil(),
            object_type: Entity::FIREWORKS_OBJECT_TYPE,
            object_data: 0,
            position: Default::default(),
            velocity: Default::default(),
            pitch: 0,
            yaw: 0,
            common: EntityCommon::default(),
        });

        let mut metadata = mc_protocol::metadata::Metadata::default();
        metadata.set(7, mc_protocol::metadata::MetadataValue::VarInt(1));
        let packet = raw(EntityMetadataPacket::ID, &EntityMetadataPacket { entity_id: VarInt(1), metadata });

        let rewritten = rewrite_clientbound(&mirror, 1, &packet).unwrap();
        let decoded = rewritten.decode_body::<EntityMetadataPacket>().unwrap();
        assert_eq!(decoded.metadata.get(7).and_then(|v| v.as_var_int()), Some(CLIENT_EID));
    }

    #[test]
    fn set_passengers_leaves_the_vehicle_id_untouched() {
        let mirror = WorldMirror::new();
        let packet = raw(SetPassengers::ID, &SetPassengers { entity_id: VarInt(5), passenger_ids: vec![VarInt(1)] });

        let rewritten = rewrite_clientbound(&mirror, 1, &packet).unwrap();
        let decoded = rewritten.decode_body::<SetPassengers>().unwrap();
        assert_eq!(decoded.entity_id.0, 5);
        assert_eq!(decoded.passenger_ids[0].0, CLIENT_EID);
    }

    #[test]
    fn teleport_confirm_and_keep_alive_are_dropped() {
        let mut mirror = WorldMirror::new();
        let packet = raw(TeleportConfirm::ID, &TeleportConfirm { teleport_id: VarInt(3) });
        assert!(matches!(rewrite_serverbound(&mut mirror, 1, packet).unwrap(), ServerboundAction::Drop));
    }

    #[test]
    fn player_position_updates_the_mirror_and_forwards() {
        let mut mirror = WorldMirror::new();
        let packet = raw(PlayerPosition::ID, &PlayerPosition { x: 1.0, y: 2.0, z: 3.0, on_ground: true });
        let action = rewrite_serverbound(&mut mirror, 1, packet).unwrap();
        assert!(matches!(action, ServerboundAction::Forward(_)));
        assert_eq!(mirror.player, mc_world_mirror::mirror::PlayerState { x: 1.0, y: 2.0, z: 3.0, yaw: 0.0, pitch: 0.0 });
    }
}
