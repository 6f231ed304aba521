//! Per-packet-id handler table driving `WorldMirror` mutation (spec §4.3).
//! Each upstream `Play` packet is decoded once by the caller (the upstream
//! session loop) and handed to the matching `on_*` method here.

use mc_protocol::metadata::Metadata;
use mc_protocol::packets::play_clientbound::*;
use mc_protocol::var_int::VarInt;
use mc_protocol::{BlockPos, ChatComponent, Decode};
use tracing::warn;

use crate::chunk::{decode_chunk_data, Chunk};
use crate::entity::{Entity, EntityCommon, Position, Velocity};
use crate::mirror::{BossBarState, PlayerListEntry, Team, WorldMirror};

impl WorldMirror {
    pub fn on_spawn_object(&mut self, p: &SpawnObject) {
        self.insert_entity(p.entity_id.0, Entity::Object {
            uuid: p.object_uuid,
            object_type: p.object_type,
            object_data: p.data,
            position: Position { x: p.x, y: p.y, z: p.z },
            velocity: Velocity { x: p.velocity_x, y: p.velocity_y, z: p.velocity_z },
            pitch: p.pitch,
            yaw: p.yaw,
            common: EntityCommon::default(),
        });
    }

    pub fn on_spawn_experience_orb(&mut self, p: &SpawnExperienceOrb) {
        self.insert_entity(p.entity_id.0, Entity::Orb {
            position: Position { x: p.x, y: p.y, z: p.z },
            orb_count: p.count,
            common: EntityCommon::default(),
        });
    }

    pub fn on_spawn_mob(&mut self, p: &SpawnMob) {
        self.insert_entity(p.entity_id.0, Entity::Mob {
            uuid: p.entity_uuid,
            mob_type: p.entity_type.0,
            position: Position { x: p.x, y: p.y, z: p.z },
            velocity: Velocity { x: p.velocity_x, y: p.velocity_y, z: p.velocity_z },
            pitch: p.pitch,
            yaw: p.yaw,
            head_pitch: p.head_pitch,
            metadata: p.metadata.clone(),
            common: EntityCommon::default(),
        });
    }

    pub fn on_spawn_painting(&mut self, p: &SpawnPainting) {
        self.insert_entity(p.entity_id.0, Entity::Painting {
            uuid: p.entity_uuid,
            painting_title: p.title.clone(),
            location: p.location,
            painting_direction: p.direction,
            common: EntityCommon::default(),
        });
    }

    pub fn on_spawn_player(&mut self, p: &SpawnPlayer) {
        self.insert_entity(p.entity_id.0, Entity::Player {
            uuid: p.player_uuid,
            position: Position { x: p.x, y: p.y, z: p.z },
            yaw: p.yaw,
            pitch: p.pitch,
            metadata: p.metadata.clone(),
            common: EntityCommon::default(),
        });
    }

    /// `0x09 UpdateBlockEntity`: replace or append the block entity at the
    /// owning chunk whose position matches.
    pub fn on_update_block_entity(&mut self, p: &UpdateBlockEntity) {
        let Some(chunk) = self.chunk_at_mut(p.location.x >> 4, p.location.z >> 4) else { return };
        if let Some(existing) = find_block_entity_mut(chunk, p.location) {
            *existing = p.nbt_data.clone();
        } else {
            chunk.block_entities.push(p.nbt_data.clone());
        }
    }

    /// `0x0B BlockChange`: purge block entities at the position if the new
    /// block id is air (spec §4.3).
    pub fn on_block_change(&mut self, p: &BlockChange) {
        let chunk_x = p.location.x >> 4;
        let chunk_z = p.location.z >> 4;
        let section_index = (p.location.y >> 4) as usize;
        let local_index = Chunk::local_block_index(p.location.x, p.location.y, p.location.z);

        let new_id = p.block_id.0;
        if let Some(chunk) = self.chunk_at_mut(chunk_x, chunk_z) {
            if section_index < 16 {
                if let Some(section) = chunk.sections[section_index].as_mut() {
                    section.blocks[local_index] = new_id as u16;
                }
            }
            if new_id == 0 {
                chunk.block_entities.retain(|be| !block_entity_matches(be, p.location));
            }
        }
    }

    /// `0x0C BossBar`: action-dispatched create/remove/update-*.
    pub fn on_boss_bar(&mut self, p: &BossBar) {
        let mut r = &p.rest[..];
        match p.action {
            BossBar::ACTION_ADD => {
                let Ok(title) = ChatComponent::decode(&mut r) else { return };
                let Ok(health) = f32::decode(&mut r) else { return };
                let Ok(color) = VarInt::decode(&mut r) else { return };
                let Ok(style) = VarInt::decode(&mut r) else { return };
                let Ok(flags) = u8::decode(&mut r) else { return };
                self.boss_bars.insert(p.uuid, BossBarState { title, health, color: color.0, style: style.0, flags });
            }
            BossBar::ACTION_REMOVE => {
                self.boss_bars.shift_remove(&p.uuid);
            }
            BossBar::ACTION_UPDATE_HEALTH => {
                if let (Some(bar), Ok(health)) = (self.boss_bars.get_mut(&p.uuid), f32::decode(&mut r)) {
                    bar.health = health;
                }
            }
            BossBar::ACTION_UPDATE_TITLE => {
                if let (Some(bar), Ok(title)) = (self.boss_bars.get_mut(&p.uuid), ChatComponent::decode(&mut r)) {
                    bar.title = title;
                }
            }
            BossBar::ACTION_UPDATE_STYLE => {
                if let Some(bar) = self.boss_bars.get_mut(&p.uuid) {
                    if let (Ok(color), Ok(style)) = (VarInt::decode(&mut r), VarInt::decode(&mut r)) {
                        bar.color = color.0;
                        bar.style = style.0;
                    }
                }
            }
            BossBar::ACTION_UPDATE_FLAGS => {
                if let (Some(bar), Ok(flags)) = (self.boss_bars.get_mut(&p.uuid), u8::decode(&mut r)) {
                    bar.flags = flags;
                }
            }
            other => warn!(action = other, "unknown BossBar action"),
        }
    }

    /// `0x0F ChatMessage`.
    pub fn on_chat_message(&mut self, p: &ChatMessage) {
        self.push_chat_message(p.message.clone());
    }

    /// `0x10 MultiBlockChange`: same per-record semantics as `BlockChange`.
    pub fn on_multi_block_change(&mut self, p: &MultiBlockChange) {
        for record in &p.records {
            let local_x = (record.horizontal_position >> 4) as i32;
            let local_z = (record.horizontal_position & 0x0f) as i32;
            let x = (p.chunk_x << 4) | local_x;
            let z = (p.chunk_z << 4) | local_z;
            self.on_block_change(&BlockChange {
                location: BlockPos::new(x, record.y as i32, z),
                block_id: VarInt(record.block_id),
            });
        }
    }

    /// `0x14 WindowItems`: only window 0 (player inventory) is tracked.
    pub fn on_window_items(&mut self, p: &WindowItems) {
        if p.window_id != 0 {
            return;
        }
        self.inventory.clear();
        for (slot, item) in p.slots.iter().enumerate() {
            if !item.is_empty() {
                self.inventory.insert(slot as i16, item.clone());
            }
        }
    }

    /// `0x16 SetSlot`: only window 0 is tracked.
    pub fn on_set_slot(&mut self, p: &SetSlot) {
        if p.window_id != 0 {
            return;
        }
        if p.slot_data.is_empty() {
            self.inventory.remove(&p.slot);
        } else {
            self.inventory.insert(p.slot, p.slot_data.clone());
        }
    }

    /// `0x1C Explosion`: every affected offset becomes an air block.
    pub fn on_explosion(&mut self, p: &Explosion) {
        let cx = p.x.floor() as i32;
        let cy = p.y.floor() as i32;
        let cz = p.z.floor() as i32;
        for offset in &p.affected_blocks {
            let x = cx + offset.dx as i32;
            let y = cy + offset.dy as i32;
            let z = cz + offset.dz as i32;
            self.on_block_change(&BlockChange {
                location: BlockPos::new(x, y, z),
                block_id: VarInt(0),
            });
        }
    }

    /// `0x1D UnloadChunk`: delete the column, and the row map if it empties.
    pub fn on_unload_chunk(&mut self, p: &UnloadChunk) {
        if let Some(row) = self.chunks.get_mut(&p.chunk_x) {
            row.remove(&p.chunk_z);
            if row.is_empty() {
                self.chunks.remove(&p.chunk_x);
            }
        }
    }

    /// `0x1E ChangeGameState`: reason-dispatched (spec §4.3).
    pub fn on_change_game_state(&mut self, p: &ChangeGameState) {
        match p.reason {
            ChangeGameState::REASON_END_RAINING => self.raining = false,
            ChangeGameState::REASON_BEGIN_RAINING => self.raining = true,
            ChangeGameState::REASON_CHANGE_GAMEMODE => self.gamemode = p.value as u8,
            ChangeGameState::REASON_FADE_VALUE => self.fade_value = p.value,
            ChangeGameState::REASON_FADE_TIME => self.fade_time = p.value,
            _ => {}
        }
    }

    /// `0x20 ChunkData`: set-full or merge (spec §4.3).
    pub fn on_chunk_data(&mut self, p: &ChunkData) -> anyhow::Result<()> {
        let existing = self.chunks.get(&p.chunk_x).and_then(|row| row.get(&p.chunk_z)).cloned();
        let chunk = decode_chunk_data(p, self.dimension, existing)?;
        self.chunks.entry(p.chunk_x).or_default().insert(p.chunk_z, chunk);
        Ok(())
    }

    /// `0x23 JoinGame`: seed world scalars and insert the local-player
    /// entity (spec §4.3, §3 invariant "exactly one Entity with eid ==
    /// self.eid").
    pub fn on_join_game(&mut self, p: &JoinGame) {
        self.eid = p.entity_id;
        self.gamemode = p.gamemode & 0x07;
        self.dimension = p.dimension;
        self.difficulty = p.difficulty;
        self.level_type = p.level_type.clone();

        self.insert_entity(self.eid, Entity::Player {
            uuid: uuid::Uuid::nil(),
            position: Position::default(),
            yaw: 0,
            pitch: 0,
            metadata: Metadata::default(),
            common: EntityCommon::default(),
        });
    }

    /// `0x2C PlayerAbilities`.
    pub fn on_player_abilities(&mut self, p: &PlayerAbilitiesClientbound) {
        self.invulnerable = p.flags & PlayerAbilitiesClientbound::FLAG_INVULNERABLE != 0;
        self.flying = p.flags & PlayerAbilitiesClientbound::FLAG_FLYING != 0;
        self.allow_flying = p.flags & PlayerAbilitiesClientbound::FLAG_ALLOW_FLYING != 0;
        self.creative_mode = p.flags & PlayerAbilitiesClientbound::FLAG_CREATIVE_MODE != 0;
        self.flying_speed = p.flying_speed;
        self.fov = p.field_of_view_modifier;
    }

    /// `0x2E PlayerListItem` action=add.
    pub fn on_player_list_item_add(&mut self, p: &PlayerListItemAdd) {
        for entry in &p.entries {
            self.players.insert(entry.uuid, PlayerListEntry {
                uuid: entry.uuid,
                name: entry.name.clone(),
                properties: entry.properties.clone(),
                gamemode: entry.gamemode,
                ping: entry.ping,
                display_name: entry.display_name.clone(),
            });
        }
    }

    pub fn on_player_list_item_update_gamemode(&mut self, p: &PlayerListItemUpdateGamemode) {
        if let Some(entry) = self.players.get_mut(&p.uuid) {
            entry.gamemode = p.gamemode;
        }
    }

    /// `0x2E PlayerListItem` action=update-latency.
    pub fn on_player_list_item_update_ping(&mut self, uuid: uuid::Uuid, ping: i32) {
        if let Some(entry) = self.players.get_mut(&uuid) {
            entry.ping = ping;
        }
    }

    /// `0x2E PlayerListItem` action=update-display-name.
    pub fn on_player_list_item_update_display_name(&mut self, uuid: uuid::Uuid, display_name: Option<ChatComponent>) {
        if let Some(entry) = self.players.get_mut(&uuid) {
            entry.display_name = display_name;
        }
    }

    pub fn on_player_list_item_remove(&mut self, uuid: uuid::Uuid) {
        self.players.shift_remove(&uuid);
    }

    /// `0x2F PlayerPositionAndLook`: relative/absolute flag mask (spec
    /// §4.3). Returns the teleport id to echo back via `TeleportConfirm`.
    pub fn on_player_position_and_look(&mut self, p: &PlayerPositionAndLookClientbound) -> i32 {
        self.player.x = if p.flags & PlayerPositionAndLookClientbound::FLAG_X != 0 { self.player.x + p.x } else { p.x };
        self.player.y = if p.flags & PlayerPositionAndLookClientbound::FLAG_Y != 0 { self.player.y + p.y } else { p.y };
        self.player.z = if p.flags & PlayerPositionAndLookClientbound::FLAG_Z != 0 { self.player.z + p.z } else { p.z };
        self.player.yaw = if p.flags & PlayerPositionAndLookClientbound::FLAG_Y_ROT != 0 { self.player.yaw + p.yaw } else { p.yaw };
        self.player.pitch = if p.flags & PlayerPositionAndLookClientbound::FLAG_X_ROT != 0 { self.player.pitch + p.pitch } else { p.pitch };

        let position = self.local_position();
        if let Some(local) = self.local_player_mut() {
            local.set_position(position);
        }

        p.teleport_id.0
    }

    /// `0x31 UnlockRecipes`: union into the tracked set.
    pub fn on_unlock_recipes(&mut self, p: &UnlockRecipes) {
        self.unlocked_recipes.extend(p.recipe_ids.iter().map(|id| id.0));
        self.unlocked_recipes.extend(p.recipe_ids_to_display.iter().map(|id| id.0));
    }

    /// `0x32 DestroyEntities`.
    pub fn on_destroy_entities(&mut self, p: &DestroyEntities) {
        for id in &p.entity_ids {
            self.remove_entity(id.0);
        }
        self.recompute_riding_eid();
    }

    /// `0x35 Respawn`: clears world state only if the dimension actually
    /// changes (spec §4.3).
    pub fn on_respawn(&mut self, p: &Respawn) {
        let changed = p.dimension != self.dimension;
        self.dimension = p.dimension;
        self.difficulty = p.difficulty;
        self.gamemode = p.gamemode & 0x07;
        self.level_type = p.level_type.clone();
        if changed {
            self.clear_world_state_on_dimension_change();
        }
    }

    pub fn on_entity_relative_move(&mut self, p: &EntityRelativeMove) {
        self.apply_delta(p.entity_id.0, p.delta_x, p.delta_y, p.delta_z);
    }

    pub fn on_entity_look_and_relative_move(&mut self, p: &EntityLookAndRelativeMove) {
        self.apply_delta(p.entity_id.0, p.delta_x, p.delta_y, p.delta_z);
    }

    /// Motion-delta packets encode position as `delta/4096` blocks (vanilla
    /// fixed-point convention); applied directly against the entity's
    /// cached absolute position.
    fn apply_delta(&mut self, eid: i32, dx: i16, dy: i16, dz: i16) {
        if let Some(entity) = self.entities.get_mut(&eid) {
            if let Some(mut position) = entity.position() {
                position.x += dx as f64 / 4096.0;
                position.y += dy as f64 / 4096.0;
                position.z += dz as f64 / 4096.0;
                entity.set_position(position);
            }
        }
    }

    pub fn on_entity_teleport(&mut self, p: &EntityTeleport) {
        if let Some(entity) = self.entities.get_mut(&p.entity_id.0) {
            entity.set_position(Position { x: p.x, y: p.y, z: p.z });
        }
    }

    pub fn on_entity_velocity(&mut self, p: &EntityVelocity) {
        if let Some(Entity::Object { velocity, .. } | Entity::Mob { velocity, .. }) = self.entities.get_mut(&p.entity_id.0) {
            *velocity = Velocity { x: p.velocity_x, y: p.velocity_y, z: p.velocity_z };
        }
    }

    pub fn on_entity_metadata(&mut self, p: &EntityMetadataPacket) {
        if let Some(metadata) = self.entities.get_mut(&p.entity_id.0).and_then(Entity::metadata_mut) {
            *metadata = p.metadata.clone();
        }
    }

    pub fn on_entity_equipment(&mut self, p: &EntityEquipment) {
        let Some(common) = self.entity_common_mut(p.entity_id.0) else { return };
        if p.item.is_empty() {
            common.equipment.remove(&p.slot.0);
        } else {
            common.equipment.insert(p.slot.0, p.item.clone());
        }
    }

    pub fn on_entity_properties(&mut self, p: &EntityProperties) {
        let Some(common) = self.entity_common_mut(p.entity_id.0) else { return };
        for prop in &p.properties {
            common.properties.entry(prop.key.clone()).or_default().value = prop.value;
        }
    }

    /// `0x43 SetPassengers`: updates the passenger graph and recomputes
    /// `ridingEid` (spec §3 invariant).
    pub fn on_set_passengers(&mut self, p: &SetPassengers) {
        if let Some(common) = self.entity_common_mut(p.entity_id.0) {
            common.passengers = p.passenger_ids.iter().map(|id| id.0).collect();
        }
        self.recompute_riding_eid();
    }

    pub fn on_attach_entity(&mut self, p: &AttachEntity) {
        let attached = if p.holding_entity_id == -1 { None } else { Some(p.holding_entity_id) };
        if let Some(common) = self.entity_common_mut(p.attached_entity_id) {
            common.attached_eid = attached;
        }
    }

    pub fn on_camera(&mut self, p: &Camera) {
        self.camera = Some(p.camera_id.0);
    }

    pub fn on_held_item_change(&mut self, p: &HeldItemChangeClientbound) {
        self.held_item = p.slot;
    }

    /// `0x40/0x41`, plus the auto-disconnect health gate (spec §3, §8).
    pub fn on_set_experience(&mut self, p: &SetExperience) {
        self.xp_bar = p.experience_bar;
        self.level = p.level.0;
        self.total_xp = p.total_experience.0;
    }

    pub fn on_update_health(&mut self, p: &UpdateHealth) {
        self.health = p.health;
        self.food = p.food.0;
        self.saturation = p.food_saturation;
        self.health_initialized = true;
    }

    pub fn on_spawn_position(&mut self, p: &SpawnPosition) {
        self.spawn_position = p.location;
    }

    pub fn on_time_update(&mut self, p: &TimeUpdate) {
        self.world_age = p.world_age as u64;
        self.time = p.time_of_day as u64;
    }

    pub fn on_player_list_header_and_footer(&mut self, p: &PlayerListHeaderAndFooter) {
        self.player_list_header = Some(p.header.clone());
        self.apply_player_list_footer(p.footer.clone());
    }

    /// `0x44 Teams`: action-dispatched create/remove/add-players/remove-
    /// players; action 2 (update info) is observed but not applied, since
    /// nothing downstream of the mirror reads anything but membership.
    pub fn on_teams(&mut self, p: &TeamsRaw) {
        let mut r = &p.rest[..];
        match p.action as i32 {
            0 => {
                let Ok(display_name) = String::decode(&mut r) else { return };
                let Ok(prefix) = String::decode(&mut r) else { return };
                let Ok(suffix) = String::decode(&mut r) else { return };
                let Ok(friendly_fire) = i8::decode(&mut r) else { return };
                let Ok(name_tag_visibility) = String::decode(&mut r) else { return };
                let Ok(collision_rule) = String::decode(&mut r) else { return };
                let Ok(color) = i8::decode(&mut r) else { return };
                let Ok(players) = decode_player_name_list(&mut r) else { return };
                self.teams.insert(p.team_name.clone(), Team {
                    display_name,
                    prefix,
                    suffix,
                    friendly_fire,
                    name_tag_visibility,
                    collision_rule,
                    color,
                    players,
                });
            }
            1 => {
                self.teams.remove(&p.team_name);
            }
            3 => {
                if let (Some(team), Ok(added)) = (self.teams.get_mut(&p.team_name), decode_player_name_list(&mut r)) {
                    team.players.extend(added);
                }
            }
            4 => {
                if let (Some(team), Ok(removed)) = (self.teams.get_mut(&p.team_name), decode_player_name_list(&mut r)) {
                    team.players.retain(|name| !removed.contains(name));
                }
            }
            _ => {}
        }
    }
}

fn decode_player_name_list(r: &mut &[u8]) -> anyhow::Result<Vec<String>> {
    let count = VarInt::decode(r)?.0;
    anyhow::ensure!(count >= 0, "negative team player count");
    (0..count).map(|_| String::decode(r)).collect()
}

fn find_block_entity_mut(chunk: &mut Chunk, pos: BlockPos) -> Option<&mut mc_nbt::Compound> {
    chunk.block_entities.iter_mut().find(|be| block_entity_matches(be, pos))
}

fn block_entity_matches(compound: &mc_nbt::Compound, pos: BlockPos) -> bool {
    block_entity_coord(compound, "x") == Some(pos.x)
        && block_entity_coord(compound, "y") == Some(pos.y)
        && block_entity_coord(compound, "z") == Some(pos.z)
}

fn block_entity_coord(compound: &mc_nbt::Compound, key: &str) -> Option<i32> {
    match compound.get(key) {
        Some(mc_nbt::Value::Int(v)) => Some(*v),
        _ => None,
    }
}

impl WorldMirror {
    fn chunk_at_mut(&mut self, chunk_x: i32, chunk_z: i32) -> Option<&mut Chunk> {
        self.chunks.get_mut(&chunk_x)?.get_mut(&chunk_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_game_seeds_scalars_and_local_player() {
        let mut mirror = WorldMirror::new();
        mirror.on_join_game(&JoinGame {
            entity_id: 42,
            gamemode: 0,
            dimension: 0,
            difficulty: 2,
            max_players: 20,
            level_type: "default".to_owned(),
            reduced_debug_info: false,
        });

        assert_eq!(mirror.eid, 42);
        assert!(mirror.local_player().is_some());
    }

    #[test]
    fn block_change_updates_the_owning_section() {
        let mut mirror = WorldMirror::new();
        mirror.chunks.entry(0).or_default().insert(0, Chunk::empty(0, 0));
        mirror.chunks.get_mut(&0).unwrap().get_mut(&0).unwrap().sections[0] =
            Some(crate::chunk::ChunkSection::empty(true));

        mirror.on_block_change(&BlockChange { location: BlockPos::new(1, 2, 1), block_id: VarInt(5) });

        let index = Chunk::local_block_index(1, 2, 1);
        let block = mirror.chunks[&0][&0].sections[0].as_ref().unwrap().blocks[index];
        assert_eq!(block, 5);
    }

    #[test]
    fn respawn_without_dimension_change_keeps_entities() {
        let mut mirror = WorldMirror::new();
        mirror.dimension = 0;
        mirror.eid = 1;
        mirror.insert_entity(1, Entity::Player {
            uuid: uuid::Uuid::nil(),
            position: Position::default(),
            yaw: 0,
            pitch: 0,
            metadata: Metadata::default(),
            common: EntityCommon::default(),
        });
        mirror.insert_entity(2, Entity::Orb { position: Position::default(), orb_count: 1, common: EntityCommon::default() });

        mirror.on_respawn(&Respawn { dimension: 0, difficulty: 2, gamemode: 0, level_type: "default".to_owned() });

        assert!(mirror.entities.contains_key(&2));
    }

    #[test]
    fn respawn_with_dimension_change_clears_non_local_entities() {
        let mut mirror = WorldMirror::new();
        mirror.dimension = 0;
        mirror.eid = 1;
        mirror.insert_entity(1, Entity::Player {
            uuid: uuid::Uuid::nil(),
            position: Position::default(),
            yaw: 0,
            pitch: 0,
            metadata: Metadata::default(),
            common: EntityCommon::default(),
        });
        mirror.insert_entity(2, Entity::Orb { position: Position::default(), orb_count: 1, common: EntityCommon::default() });

        mirror.on_respawn(&Respawn { dimension: -1, difficulty: 2, gamemode: 0, level_type: "default".to_owned() });

        assert!(!mirror.entities.contains_key(&2));
        assert!(mirror.entities.contains_key(&1));
    }

    #[test]
    fn player_list_item_updates_ping_and_display_name_after_the_initial_add() {
        let mut mirror = WorldMirror::new();
        let uuid = uuid::Uuid::nil();
        mirror.on_player_list_item_add(&PlayerListItemAdd {
            entries: vec![PlayerListAddEntry { uuid, name: "Notch".to_owned(), properties: Vec::new(), gamemode: 0, ping: 50, display_name: None }],
        });

        mirror.on_player_list_item_update_ping(uuid, 200);
        mirror.on_player_list_item_update_display_name(uuid, Some(ChatComponent::text("renamed")));

        let entry = mirror.players.get(&uuid).unwrap();
        assert_eq!(entry.ping, 200);
        assert_eq!(entry.display_name, Some(ChatComponent::text("renamed")));
    }
}
