//! Clientbound `Play` packets this revision's world mirror, replay engine,
//! and bridge rewriter care about. IDs are this revision's numbering (spec
//! §4.3-§4.5); packets vanilla sends that nothing here reads (sound
//! effects, scoreboard objectives, advancements, ...) are intentionally not
//! modeled — the bridge forwards their raw bytes untouched by id alone.

use std::io::Write;

use mc_nbt::Compound;
use uuid::Uuid;

use crate::chat::ChatComponent;
use crate::item::ItemStack;
use crate::metadata::Metadata;
use crate::var_int::VarInt;
use crate::{BlockPos, Decode, Encode};

macro_rules! simple_packet {
    ($name:ident { $($field:ident: $ty:ty),* $(,)? }, id = $id:expr) => {
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $(pub $field: $ty),*
        }

        impl $name {
            pub const ID: i32 = $id;
        }

        impl Encode for $name {
            fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
                $(self.$field.encode(&mut w)?;)*
                Ok(())
            }
        }

        impl Decode for $name {
            fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
                Ok(Self { $($field: Decode::decode(r)?),* })
            }
        }
    };
}

simple_packet!(SpawnObject {
    entity_id: VarInt,
    object_uuid: Uuid,
    object_type: i8,
    x: f64,
    y: f64,
    z: f64,
    pitch: i8,
    yaw: i8,
    data: i32,
    velocity_x: i16,
    velocity_y: i16,
    velocity_z: i16,
}, id = 0x00);

simple_packet!(SpawnExperienceOrb {
    entity_id: VarInt,
    x: f64,
    y: f64,
    z: f64,
    count: i16,
}, id = 0x01);

simple_packet!(SpawnMob {
    entity_id: VarInt,
    entity_uuid: Uuid,
    entity_type: VarInt,
    x: f64,
    y: f64,
    z: f64,
    yaw: i8,
    pitch: i8,
    head_pitch: i8,
    velocity_x: i16,
    velocity_y: i16,
    velocity_z: i16,
    metadata: Metadata,
}, id = 0x03);

simple_packet!(SpawnPainting {
    entity_id: VarInt,
    entity_uuid: Uuid,
    title: String,
    location: BlockPos,
    direction: i8,
}, id = 0x04);

simple_packet!(SpawnPlayer {
    entity_id: VarInt,
    player_uuid: Uuid,
    x: f64,
    y: f64,
    z: f64,
    yaw: i8,
    pitch: i8,
    metadata: Metadata,
}, id = 0x05);

simple_packet!(Animation {
    entity_id: VarInt,
    animation: u8,
}, id = 0x06);

simple_packet!(BlockBreakAnimation {
    entity_id: VarInt,
    location: BlockPos,
    destroy_stage: i8,
}, id = 0x08);

simple_packet!(UpdateBlockEntity {
    location: BlockPos,
    action: u8,
    nbt_data: Compound,
}, id = 0x09);

simple_packet!(BlockChange {
    location: BlockPos,
    block_id: VarInt,
}, id = 0x0B);

/// `BossBar`'s body depends on `action`; modeled as the raw action id plus
/// the still-encoded remainder so the world mirror can dispatch on it
/// without every field needing to be named here.
#[derive(Clone, Debug, PartialEq)]
pub struct BossBar {
    pub uuid: Uuid,
    pub action: i32,
    pub rest: Vec<u8>,
}

impl BossBar {
    pub const ID: i32 = 0x0C;

    pub const ACTION_ADD: i32 = 0;
    pub const ACTION_REMOVE: i32 = 1;
    pub const ACTION_UPDATE_HEALTH: i32 = 2;
    pub const ACTION_UPDATE_TITLE: i32 = 3;
    pub const ACTION_UPDATE_STYLE: i32 = 4;
    pub const ACTION_UPDATE_FLAGS: i32 = 5;
}

impl Encode for BossBar {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.uuid.encode(&mut w)?;
        VarInt(self.action).encode(&mut w)?;
        w.write_all(&self.rest)?;
        Ok(())
    }
}

impl Decode for BossBar {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let uuid = Uuid::decode(r)?;
        let action = VarInt::decode(r)?.0;
        let rest = r.to_vec();
        *r = &r[r.len()..];
        Ok(Self { uuid, action, rest })
    }
}

simple_packet!(ChatMessage {
    message: ChatComponent,
    position: i8,
}, id = 0x0F);

/// One record of a `MultiBlockChange` batch: horizontal position packed as
/// `(x << 4) | z` within the chunk, vanilla-style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockChangeRecord {
    pub horizontal_position: u8,
    pub y: u8,
    pub block_id: i32,
}

impl Encode for BlockChangeRecord {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.horizontal_position.encode(&mut w)?;
        self.y.encode(&mut w)?;
        VarInt(self.block_id).encode(w)
    }
}

impl Decode for BlockChangeRecord {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self {
            horizontal_position: u8::decode(r)?,
            y: u8::decode(r)?,
            block_id: VarInt::decode(r)?.0,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MultiBlockChange {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub records: Vec<BlockChangeRecord>,
}

impl MultiBlockChange {
    pub const ID: i32 = 0x10;
}

impl Encode for MultiBlockChange {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.chunk_x.encode(&mut w)?;
        self.chunk_z.encode(&mut w)?;
        VarInt(self.records.len() as i32).encode(&mut w)?;
        for record in &self.records {
            record.encode(&mut w)?;
        }
        Ok(())
    }
}

impl Decode for MultiBlockChange {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let chunk_x = i32::decode(r)?;
        let chunk_z = i32::decode(r)?;
        let count = VarInt::decode(r)?.0;
        anyhow::ensure!(count >= 0, "negative MultiBlockChange record count");
        let records = (0..count).map(|_| BlockChangeRecord::decode(r)).collect::<anyhow::Result<_>>()?;
        Ok(Self { chunk_x, chunk_z, records })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowItems {
    pub window_id: u8,
    pub slots: Vec<ItemStack>,
}

impl WindowItems {
    pub const ID: i32 = 0x14;
}

impl Encode for WindowItems {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.window_id.encode(&mut w)?;
        (self.slots.len() as i16).encode(&mut w)?;
        for slot in &self.slots {
            slot.encode(&mut w)?;
        }
        Ok(())
    }
}

impl Decode for WindowItems {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let window_id = u8::decode(r)?;
        let count = i16::decode(r)?;
        anyhow::ensure!(count >= 0, "negative WindowItems slot count");
        let slots = (0..count).map(|_| ItemStack::decode(r)).collect::<anyhow::Result<_>>()?;
        Ok(Self { window_id, slots })
    }
}

simple_packet!(SetSlot {
    window_id: i8,
    slot: i16,
    slot_data: ItemStack,
}, id = 0x16);

/// A blast radius's affected-block offsets, each a signed byte triple
/// relative to the explosion center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExplosionOffset {
    pub dx: i8,
    pub dy: i8,
    pub dz: i8,
}

impl Encode for ExplosionOffset {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.dx.encode(&mut w)?;
        self.dy.encode(&mut w)?;
        self.dz.encode(w)
    }
}

impl Decode for ExplosionOffset {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self { dx: i8::decode(r)?, dy: i8::decode(r)?, dz: i8::decode(r)? })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Explosion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: f32,
    pub affected_blocks: Vec<ExplosionOffset>,
    pub player_motion_x: f32,
    pub player_motion_y: f32,
    pub player_motion_z: f32,
}

impl Explosion {
    pub const ID: i32 = 0x1C;
}

impl Encode for Explosion {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.x.encode(&mut w)?;
        self.y.encode(&mut w)?;
        self.z.encode(&mut w)?;
        self.radius.encode(&mut w)?;
        (self.affected_blocks.len() as i32).encode(&mut w)?;
        for offset in &self.affected_blocks {
            offset.encode(&mut w)?;
        }
        self.player_motion_x.encode(&mut w)?;
        self.player_motion_y.encode(&mut w)?;
        self.player_motion_z.encode(w)
    }
}

impl Decode for Explosion {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let x = f32::decode(r)?;
        let y = f32::decode(r)?;
        let z = f32::decode(r)?;
        let radius = f32::decode(r)?;
        let count = i32::decode(r)?;
        anyhow::ensure!(count >= 0, "negative Explosion block count");
        let affected_blocks = (0..count).map(|_| ExplosionOffset::decode(r)).collect::<anyhow::Result<_>>()?;
        Ok(Self {
            x,
            y,
            z,
            radius,
            affected_blocks,
            player_motion_x: f32::decode(r)?,
            player_motion_y: f32::decode(r)?,
            player_motion_z: f32::decode(r)?,
        })
    }
}

simple_packet!(UnloadChunk {
    chunk_x: i32,
    chunk_z: i32,
}, id = 0x1D);

simple_packet!(ChangeGameState {
    reason: u8,
    value: f32,
}, id = 0x1E);

impl ChangeGameState {
    pub const REASON_INVALID_BED: u8 = 0;
    pub const REASON_END_RAINING: u8 = 1;
    pub const REASON_BEGIN_RAINING: u8 = 2;
    pub const REASON_CHANGE_GAMEMODE: u8 = 3;
    pub const REASON_EXIT_END: u8 = 4;
    pub const REASON_DEMO_MESSAGE: u8 = 5;
    pub const REASON_ARROW_HIT_PLAYER: u8 = 6;
    pub const REASON_FADE_VALUE: u8 = 7;
    pub const REASON_FADE_TIME: u8 = 8;
    pub const REASON_PLAY_ELDER_GUARDIAN_MOB_APPEARANCE: u8 = 10;
}

simple_packet!(KeepAliveClientbound {
    id: VarInt,
}, id = 0x1F);

/// `ChunkData`'s column payload is a variable-shape byte blob (bitmask-driven
/// section list, biome array, and trailing block entities); the world
/// mirror's chunk codec (not this crate) knows how to parse and re-encode
/// it, since doing so requires mutating long-lived chunk-section buffers
/// rather than producing a one-shot value.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkData {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub full_chunk: bool,
    pub primary_bit_mask: VarInt,
    pub data: Vec<u8>,
    pub block_entities: Vec<Compound>,
}

impl ChunkData {
    pub const ID: i32 = 0x20;
}

impl Encode for ChunkData {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.chunk_x.encode(&mut w)?;
        self.chunk_z.encode(&mut w)?;
        self.full_chunk.encode(&mut w)?;
        self.primary_bit_mask.encode(&mut w)?;
        VarInt(self.data.len() as i32).encode(&mut w)?;
        w.write_all(&self.data)?;
        VarInt(self.block_entities.len() as i32).encode(&mut w)?;
        for block_entity in &self.block_entities {
            block_entity.encode(&mut w)?;
        }
        Ok(())
    }
}

impl Decode for ChunkData {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let chunk_x = i32::decode(r)?;
        let chunk_z = i32::decode(r)?;
        let full_chunk = bool::decode(r)?;
        let primary_bit_mask = VarInt::decode(r)?;
        let data_len = VarInt::decode(r)?.0;
        anyhow::ensure!(data_len >= 0, "negative ChunkData payload length");
        anyhow::ensure!(r.len() >= data_len as usize, "truncated ChunkData payload");
        let (data, rest) = r.split_at(data_len as usize);
        let data = data.to_vec();
        *r = rest;
        let block_entity_count = VarInt::decode(r)?.0;
        anyhow::ensure!(block_entity_count >= 0, "negative ChunkData block entity count");
        let block_entities = (0..block_entity_count).map(|_| Compound::decode(r)).collect::<anyhow::Result<_>>()?;
        Ok(Self { chunk_x, chunk_z, full_chunk, primary_bit_mask, data, block_entities })
    }
}

/// One icon drawn on a map (a player/item-frame/banner marker).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapIcon {
    pub direction_and_type: u8,
    pub x: i8,
    pub z: i8,
}

impl Encode for MapIcon {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.direction_and_type.encode(&mut w)?;
        self.x.encode(&mut w)?;
        self.z.encode(w)
    }
}

impl Decode for MapIcon {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Self {
            direction_and_type: u8::decode(r)?,
            x: i8::decode(r)?,
            z: i8::decode(r)?,
        })
    }
}

/// A full map data packet, always emitted by replay with the whole 128x128
/// canvas as a single update (columns=128, rows=128, starting at 0,0).
#[derive(Clone, Debug, PartialEq)]
pub struct MapDataPacket {
    pub map_id: VarInt,
    pub scale: i8,
    pub tracking_position: bool,
    pub icons: Vec<MapIcon>,
    pub columns: u8,
    pub rows: u8,
    pub x: i8,
    pub z: i8,
    pub data: Vec<u8>,
}

impl MapDataPacket {
    pub const ID: i32 = 0x24;
}

impl Encode for MapDataPacket {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.map_id.encode(&mut w)?;
        self.scale.encode(&mut w)?;
        self.tracking_position.encode(&mut w)?;
        VarInt(self.icons.len() as i32).encode(&mut w)?;
        for icon in &self.icons {
            icon.encode(&mut w)?;
        }
        self.columns.encode(&mut w)?;
        if self.columns > 0 {
            self.rows.encode(&mut w)?;
            self.x.encode(&mut w)?;
            self.z.encode(&mut w)?;
            VarInt(self.data.len() as i32).encode(&mut w)?;
            w.write_all(&self.data)?;
        }
        Ok(())
    }
}

impl Decode for MapDataPacket {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let map_id = VarInt::decode(r)?;
        let scale = i8::decode(r)?;
        let tracking_position = bool::decode(r)?;
        let icon_count = VarInt::decode(r)?.0;
        anyhow::ensure!(icon_count >= 0, "negative map icon count");
        let icons = (0..icon_count).map(|_| MapIcon::decode(r)).collect::<anyhow::Result<_>>()?;
        let columns = u8::decode(r)?;
        let (rows, x, z, data) = if columns > 0 {
            let rows = u8::decode(r)?;
            let x = i8::decode(r)?;
            let z = i8::decode(r)?;
            let len = VarInt::decode(r)?.0;
            anyhow::ensure!(len >= 0, "negative map data length");
            anyhow::ensure!(r.len() >= len as usize, "truncated map data");
            let (data, rest) = r.split_at(len as usize);
            let data = data.to_vec();
            *r = rest;
            (rows, x, z, data)
        } else {
            (0, 0, 0, Vec::new())
        };
        Ok(Self { map_id, scale, tracking_position, icons, columns, rows, x, z, data })
    }
}

simple_packet!(JoinGame {
    entity_id: i32,
    gamemode: u8,
    dimension: i32,
    difficulty: u8,
    max_players: u8,
    level_type: String,
    reduced_debug_info: bool,
}, id = 0x23);

impl JoinGame {
    /// Bit 3 marks "spectator" in the gamemode byte; the proxy always
    /// strips it before re-emitting to a downstream client (spec §6).
    pub const SPECTATOR_BIT: u8 = 0x08;

    pub fn without_spectator_bit(&self) -> Self {
        Self { gamemode: self.gamemode & 0x07, ..self.clone() }
    }
}

simple_packet!(EntityRelativeMove {
    entity_id: VarInt,
    delta_x: i16,
    delta_y: i16,
    delta_z: i16,
    on_ground: bool,
}, id = 0x26);

simple_packet!(EntityLookAndRelativeMove {
    entity_id: VarInt,
    delta_x: i16,
    delta_y: i16,
    delta_z: i16,
    yaw: i8,
    pitch: i8,
    on_ground: bool,
}, id = 0x27);

simple_packet!(EntityLook {
    entity_id: VarInt,
    yaw: i8,
    pitch: i8,
    on_ground: bool,
}, id = 0x28);

simple_packet!(VehicleMoveClientbound {
    x: f64,
    y: f64,
    z: f64,
    yaw: f32,
    pitch: f32,
}, id = 0x29);

simple_packet!(PlayerAbilitiesClientbound {
    flags: u8,
    flying_speed: f32,
    field_of_view_modifier: f32,
}, id = 0x2C);

impl PlayerAbilitiesClientbound {
    pub const FLAG_INVULNERABLE: u8 = 0x01;
    pub const FLAG_FLYING: u8 = 0x02;
    pub const FLAG_ALLOW_FLYING: u8 = 0x04;
    pub const FLAG_CREATIVE_MODE: u8 = 0x08;
}

/// One row of a `PlayerListItem` action=add batch.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerListAddEntry {
    pub uuid: Uuid,
    pub name: String,
    pub properties: Vec<crate::auth::ProfileProperty>,
    pub gamemode: i32,
    pub ping: i32,
    pub display_name: Option<ChatComponent>,
}

/// `PlayerListItem`'s body is action-dependent; the world mirror decodes
/// each action shape directly against the raw packet rather than going
/// through a combined enum, since actions 1-4 only ever touch fields the
/// mirror already has cached per uuid.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerListItemAdd {
    pub entries: Vec<PlayerListAddEntry>,
}

impl PlayerListItemAdd {
    pub const ID: i32 = 0x2E;
    pub const ACTION_ADD: i32 = 0;
    pub const ACTION_UPDATE_GAMEMODE: i32 = 1;
    pub const ACTION_UPDATE_LATENCY: i32 = 2;
    pub const ACTION_UPDATE_DISPLAY_NAME: i32 = 3;
    pub const ACTION_REMOVE_PLAYER: i32 = 4;
}

impl Encode for PlayerListItemAdd {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        VarInt(Self::ACTION_ADD).encode(&mut w)?;
        VarInt(self.entries.len() as i32).encode(&mut w)?;
        for entry in &self.entries {
            entry.uuid.encode(&mut w)?;
            entry.name.encode(&mut w)?;
            VarInt(entry.properties.len() as i32).encode(&mut w)?;
            for prop in &entry.properties {
                prop.name.clone().encode(&mut w)?;
                prop.value.clone().encode(&mut w)?;
                match &prop.signature {
                    Some(sig) => {
                        true.encode(&mut w)?;
                        sig.clone().encode(&mut w)?;
                    }
                    None => false.encode(&mut w)?,
                }
            }
            VarInt(entry.gamemode).encode(&mut w)?;
            VarInt(entry.ping).encode(&mut w)?;
            entry.display_name.encode(&mut w)?;
        }
        Ok(())
    }
}

impl Decode for PlayerListItemAdd {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let action = VarInt::decode(r)?.0;
        anyhow::ensure!(action == Self::ACTION_ADD, "not a PlayerListItem action=add packet");
        let count = VarInt::decode(r)?.0;
        anyhow::ensure!(count >= 0, "negative PlayerListItem entry count");
        let mut entries = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let uuid = Uuid::decode(r)?;
            let name = String::decode(r)?;
            let prop_count = VarInt::decode(r)?.0;
            anyhow::ensure!(prop_count >= 0, "negative property count");
            let mut properties = Vec::with_capacity(prop_count.max(0) as usize);
            for _ in 0..prop_count {
                let name = String::decode(r)?;
                let value = String::decode(r)?;
                let signature = if bool::decode(r)? { Some(String::decode(r)?) } else { None };
                properties.push(crate::auth::ProfileProperty { name, value, signature });
            }
            let gamemode = VarInt::decode(r)?.0;
            let ping = VarInt::decode(r)?.0;
            let display_name = Option::<ChatComponent>::decode(r)?;
            entries.push(PlayerListAddEntry { uuid, name, properties, gamemode, ping, display_name });
        }
        Ok(Self { entries })
    }
}

/// `PlayerListItem` action=update-gamemode, emitted live whenever the
/// mirror's gamemode changes (spec §4.5).
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerListItemUpdateGamemode {
    pub uuid: Uuid,
    pub gamemode: i32,
}

impl PlayerListItemUpdateGamemode {
    pub const ID: i32 = 0x2E;
}

impl Encode for PlayerListItemUpdateGamemode {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        VarInt(PlayerListItemAdd::ACTION_UPDATE_GAMEMODE).encode(&mut w)?;
        VarInt(1).encode(&mut w)?;
        self.uuid.encode(&mut w)?;
        VarInt(self.gamemode).encode(w)
    }
}

simple_packet!(PlayerPositionAndLookClientbound {
    x: f64,
    y: f64,
    z: f64,
    yaw: f32,
    pitch: f32,
    flags: u8,
    teleport_id: VarInt,
}, id = 0x2F);

impl PlayerPositionAndLookClientbound {
    pub const FLAG_X: u8 = 0x01;
    pub const FLAG_Y: u8 = 0x02;
    pub const FLAG_Z: u8 = 0x04;
    pub const FLAG_Y_ROT: u8 = 0x08;
    pub const FLAG_X_ROT: u8 = 0x10;
}

simple_packet!(UseBed {
    entity_id: VarInt,
    location: BlockPos,
}, id = 0x30);

#[derive(Clone, Debug, PartialEq)]
pub struct UnlockRecipes {
    pub action: VarInt,
    pub crafting_book_open: bool,
    pub filtering_craftable: bool,
    pub recipe_ids: Vec<VarInt>,
    pub recipe_ids_to_display: Vec<VarInt>,
}

impl UnlockRecipes {
    pub const ID: i32 = 0x31;
    pub const ACTION_INIT: i32 = 0;
    pub const ACTION_ADD: i32 = 1;
    pub const ACTION_REMOVE: i32 = 2;
}

impl Encode for UnlockRecipes {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.action.encode(&mut w)?;
        self.crafting_book_open.encode(&mut w)?;
        self.filtering_craftable.encode(&mut w)?;
        VarInt(self.recipe_ids.len() as i32).encode(&mut w)?;
        for id in &self.recipe_ids {
            id.encode(&mut w)?;
        }
        if self.action.0 == Self::ACTION_INIT {
            VarInt(self.recipe_ids_to_display.len() as i32).encode(&mut w)?;
            for id in &self.recipe_ids_to_display {
                id.encode(&mut w)?;
            }
        }
        Ok(())
    }
}

impl Decode for UnlockRecipes {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let action = VarInt::decode(r)?;
        let crafting_book_open = bool::decode(r)?;
        let filtering_craftable = bool::decode(r)?;
        let count = VarInt::decode(r)?.0;
        anyhow::ensure!(count >= 0, "negative UnlockRecipes id count");
        let recipe_ids = (0..count).map(|_| VarInt::decode(r)).collect::<anyhow::Result<_>>()?;
        let recipe_ids_to_display = if action.0 == Self::ACTION_INIT {
            let count = VarInt::decode(r)?.0;
            anyhow::ensure!(count >= 0, "negative UnlockRecipes display id count");
            (0..count).map(|_| VarInt::decode(r)).collect::<anyhow::Result<_>>()?
        } else {
            Vec::new()
        };
        Ok(Self { action, crafting_book_open, filtering_craftable, recipe_ids, recipe_ids_to_display })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DestroyEntities {
    pub entity_ids: Vec<VarInt>,
}

impl DestroyEntities {
    pub const ID: i32 = 0x32;
}

impl Encode for DestroyEntities {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        VarInt(self.entity_ids.len() as i32).encode(&mut w)?;
        for id in &self.entity_ids {
            id.encode(&mut w)?;
        }
        Ok(())
    }
}

impl Decode for DestroyEntities {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let count = VarInt::decode(r)?.0;
        anyhow::ensure!(count >= 0, "negative DestroyEntities count");
        let entity_ids = (0..count).map(|_| VarInt::decode(r)).collect::<anyhow::Result<_>>()?;
        Ok(Self { entity_ids })
    }
}

simple_packet!(RemoveEntityEffect {
    entity_id: VarInt,
    effect_id: i8,
}, id = 0x33);

simple_packet!(Respawn {
    dimension: i32,
    difficulty: u8,
    gamemode: u8,
    level_type: String,
}, id = 0x35);

simple_packet!(EntityHeadLook {
    entity_id: VarInt,
    head_yaw: i8,
}, id = 0x36);

simple_packet!(Camera {
    camera_id: VarInt,
}, id = 0x39);

simple_packet!(HeldItemChangeClientbound {
    slot: i8,
}, id = 0x3A);

simple_packet!(EntityMetadataPacket {
    entity_id: VarInt,
    metadata: Metadata,
}, id = 0x3C);

simple_packet!(AttachEntity {
    attached_entity_id: i32,
    holding_entity_id: i32,
}, id = 0x3D);

simple_packet!(EntityVelocity {
    entity_id: VarInt,
    velocity_x: i16,
    velocity_y: i16,
    velocity_z: i16,
}, id = 0x3E);

simple_packet!(EntityEquipment {
    entity_id: VarInt,
    slot: VarInt,
    item: ItemStack,
}, id = 0x3F);

simple_packet!(SetExperience {
    experience_bar: f32,
    level: VarInt,
    total_experience: VarInt,
}, id = 0x40);

simple_packet!(UpdateHealth {
    health: f32,
    food: VarInt,
    food_saturation: f32,
}, id = 0x41);

#[derive(Clone, Debug, PartialEq)]
pub struct SetPassengers {
    pub entity_id: VarInt,
    pub passenger_ids: Vec<VarInt>,
}

impl SetPassengers {
    pub const ID: i32 = 0x43;
}

impl Encode for SetPassengers {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.entity_id.encode(&mut w)?;
        VarInt(self.passenger_ids.len() as i32).encode(&mut w)?;
        for id in &self.passenger_ids {
            id.encode(&mut w)?;
        }
        Ok(())
    }
}

impl Decode for SetPassengers {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let entity_id = VarInt::decode(r)?;
        let count = VarInt::decode(r)?.0;
        anyhow::ensure!(count >= 0, "negative SetPassengers count");
        let passenger_ids = (0..count).map(|_| VarInt::decode(r)).collect::<anyhow::Result<_>>()?;
        Ok(Self { entity_id, passenger_ids })
    }
}

simple_packet!(EntityProperty {
    key: String,
    value: f64,
}, id = 0x4E);

#[derive(Clone, Debug, PartialEq)]
pub struct EntityProperties {
    pub entity_id: VarInt,
    pub properties: Vec<EntityProperty>,
}

impl EntityProperties {
    pub const ID: i32 = 0x4E;
}

impl Encode for EntityProperties {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.entity_id.encode(&mut w)?;
        (self.properties.len() as i32).encode(&mut w)?;
        for prop in &self.properties {
            prop.key.encode(&mut w)?;
            prop.value.encode(&mut w)?;
            0i32.encode(&mut w)?; // modifier-count, always empty here
        }
        Ok(())
    }
}

impl Decode for EntityProperties {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let entity_id = VarInt::decode(r)?;
        let count = i32::decode(r)?;
        anyhow::ensure!(count >= 0, "negative EntityProperties count");
        let mut properties = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let key = String::decode(r)?;
            let value = f64::decode(r)?;
            let modifier_count = i32::decode(r)?;
            anyhow::ensure!(modifier_count >= 0, "negative modifier count");
            for _ in 0..modifier_count {
                let _uuid = u128::decode(r)?;
                let _amount = f64::decode(r)?;
                let _operation = i8::decode(r)?;
            }
            properties.push(EntityProperty { key, value });
        }
        Ok(Self { entity_id, properties })
    }
}

simple_packet!(EntityEffect {
    entity_id: VarInt,
    effect_id: i8,
    amplifier: i8,
    duration: VarInt,
    flags: i8,
}, id = 0x4F);

simple_packet!(SpawnPosition {
    location: BlockPos,
}, id = 0x46);

simple_packet!(TimeUpdate {
    world_age: i64,
    time_of_day: i64,
}, id = 0x47);

simple_packet!(PlayerListHeaderAndFooter {
    header: ChatComponent,
    footer: ChatComponent,
}, id = 0x4A);

simple_packet!(EntityTeleport {
    entity_id: VarInt,
    x: f64,
    y: f64,
    z: f64,
    yaw: i8,
    pitch: i8,
    on_ground: bool,
}, id = 0x4C);

simple_packet!(EntityStatus {
    entity_id: i32,
    entity_status: i8,
}, id = 0x1B);

simple_packet!(PlayDisconnect {
    reason: ChatComponent,
}, id = 0x1A);

/// One `Teams` action=0 (create) packet, minimally shaped for replay: the
/// fields later mutated by in-play team packets aren't modeled since the
/// mirror only ever needs to replay the create-with-members snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct TeamsCreate {
    pub team_name: String,
    pub display_name: String,
    pub prefix: String,
    pub suffix: String,
    pub friendly_fire: i8,
    pub name_tag_visibility: String,
    pub collision_rule: String,
    pub color: i8,
    pub players: Vec<String>,
}

impl TeamsCreate {
    pub const ID: i32 = 0x44;
    pub const ACTION_CREATE: i32 = 0;
}

/// The raw shape used to *decode* an incoming `Teams` packet: only the
/// leading team name and action are typed, since actions 1-4 (remove,
/// info-update, add-players, remove-players) carry per-action bodies the
/// world mirror only needs to peek at the player-name list for, same as
/// `PlayerListItem`'s non-add actions.
#[derive(Clone, Debug, PartialEq)]
pub struct TeamsRaw {
    pub team_name: String,
    pub action: i8,
    pub rest: Vec<u8>,
}

impl TeamsRaw {
    pub const ID: i32 = 0x44;
}

impl Decode for TeamsRaw {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let team_name = String::decode(r)?;
        let action = i8::decode(r)?;
        let rest = r.to_vec();
        *r = &r[r.len()..];
        Ok(Self { team_name, action, rest })
    }
}

impl Encode for TeamsCreate {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.team_name.clone().encode(&mut w)?;
        (Self::ACTION_CREATE as i8).encode(&mut w)?;
        self.display_name.clone().encode(&mut w)?;
        self.prefix.clone().encode(&mut w)?;
        self.suffix.clone().encode(&mut w)?;
        self.friendly_fire.encode(&mut w)?;
        self.name_tag_visibility.clone().encode(&mut w)?;
        self.collision_rule.clone().encode(&mut w)?;
        self.color.encode(&mut w)?;
        VarInt(self.players.len() as i32).encode(&mut w)?;
        for player in &self.players {
            player.clone().encode(&mut w)?;
        }
        Ok(())
    }
}
