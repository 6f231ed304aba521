//! The structured snapshot a session accumulates from its upstream packet
//! stream (spec §3's `WorldMirror`).

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use mc_protocol::chat::ChatComponent;
use mc_protocol::item::{ItemStack, PLAYER_INVENTORY_SLOTS};
use mc_protocol::BlockPos;
use uuid::Uuid;

use crate::chunk::Chunk;
use crate::entity::{Entity, EntityCommon, Position};

/// The local player's last known position and look, updated both by
/// upstream position packets and (via the bridge) by the downstream client's
/// own movement packets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerListEntry {
    pub uuid: Uuid,
    pub name: String,
    pub properties: Vec<mc_protocol::auth::ProfileProperty>,
    pub gamemode: i32,
    pub ping: i32,
    pub display_name: Option<ChatComponent>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Team {
    pub display_name: String,
    pub prefix: String,
    pub suffix: String,
    pub friendly_fire: i8,
    pub name_tag_visibility: String,
    pub collision_rule: String,
    pub color: i8,
    pub players: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BossBarState {
    pub title: ChatComponent,
    pub health: f32,
    pub color: i32,
    pub style: i32,
    pub flags: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapData {
    pub scale: i8,
    pub tracking_position: bool,
    pub icons: Vec<mc_protocol::packets::play_clientbound::MapIcon>,
    /// 128x128, row-major, matching the wire payload's column-then-row order.
    pub data: Vec<u8>,
}

impl Default for MapData {
    fn default() -> Self {
        Self {
            scale: 0,
            tracking_position: true,
            icons: Vec::new(),
            data: vec![0; 128 * 128],
        }
    }
}

/// The waiting-room state latched from tab-list footer text (spec §3,
/// cleared by the "Connecting to the server" chat sentinel).
#[derive(Clone, Debug, PartialEq)]
pub struct Queue {
    pub position: i32,
    pub time: String,
}

/// The accumulated view of one upstream play session. Exclusively owned and
/// mutated by that session's own scheduler (spec §5).
#[derive(Clone, Debug)]
pub struct WorldMirror {
    pub player: PlayerState,
    pub inventory: HashMap<i16, ItemStack>,
    pub players: IndexMap<Uuid, PlayerListEntry>,
    pub teams: HashMap<String, Team>,
    pub boss_bars: IndexMap<Uuid, BossBarState>,
    pub maps: HashMap<i32, MapData>,
    pub unlocked_recipes: HashSet<i32>,
    pub chunks: HashMap<i32, HashMap<i32, Chunk>>,
    pub entities: HashMap<i32, Entity>,

    pub eid: i32,
    pub gamemode: u8,
    pub dimension: i32,
    pub difficulty: u8,
    pub level_type: String,
    pub health: f32,
    pub food: i32,
    pub saturation: f32,
    pub health_initialized: bool,
    pub xp_bar: f32,
    pub level: i32,
    pub total_xp: i32,
    pub player_list_header: Option<ChatComponent>,
    pub player_list_footer: Option<ChatComponent>,
    pub invulnerable: bool,
    pub flying: bool,
    pub allow_flying: bool,
    pub creative_mode: bool,
    pub flying_speed: f32,
    pub fov: f32,
    pub world_age: u64,
    pub time: u64,
    pub spawn_position: BlockPos,
    pub held_item: i8,
    pub raining: bool,
    pub fade_value: f32,
    pub fade_time: f32,
    pub camera: Option<i32>,
    pub riding_eid: Option<i32>,

    pub queue: Option<Queue>,
    pub last_chat_messages: VecDeque<ChatComponent>,
}

/// `lastChatMessages` is trimmed to this size once it exceeds
/// [`WorldMirror::CHAT_CAP`] (spec §3).
impl WorldMirror {
    pub const CHAT_CAP: usize = 100;
    pub const CHAT_TRIM_TO: usize = 90;

    pub fn new() -> Self {
        Self {
            player: PlayerState::default(),
            inventory: HashMap::new(),
            players: IndexMap::new(),
            teams: HashMap::new(),
            boss_bars: IndexMap::new(),
            maps: HashMap::new(),
            unlocked_recipes: HashSet::new(),
            chunks: HashMap::new(),
            entities: HashMap::new(),

            eid: 0,
            gamemode: 0,
            dimension: 0,
            difficulty: 0,
            level_type: String::new(),
            health: 20.0,
            food: 20,
            saturation: 5.0,
            health_initialized: false,
            xp_bar: 0.0,
            level: 0,
            total_xp: 0,
            player_list_header: None,
            player_list_footer: None,
            invulnerable: false,
            flying: false,
            allow_flying: false,
            creative_mode: false,
            flying_speed: 0.05,
            fov: 0.1,
            world_age: 0,
            time: 0,
            spawn_position: BlockPos::new(0, 0, 0),
            held_item: 0,
            raining: false,
            fade_value: 0.0,
            fade_time: 0.0,
            camera: None,
            riding_eid: None,

            queue: None,
            last_chat_messages: VecDeque::new(),
        }
    }

    /// The `Entity` with `eid == self.eid`; present once `JoinGame` has been
    /// processed (spec §3 invariant).
    pub fn local_player(&self) -> Option<&Entity> {
        self.entities.get(&self.eid)
    }

    pub fn local_player_mut(&mut self) -> Option<&mut Entity> {
        self.entities.get_mut(&self.eid)
    }

    pub fn insert_entity(&mut self, eid: i32, entity: Entity) {
        self.entities.insert(eid, entity);
    }

    pub fn remove_entity(&mut self, eid: i32) -> Option<Entity> {
        self.entities.remove(&eid)
    }

    /// Pushes a chat line, enforcing the cap-and-trim invariant and clearing
    /// `queue` on the "Connecting to the server" sentinel (spec §3, §4.3).
    pub fn push_chat_message(&mut self, message: ChatComponent) {
        if message.plain_text().contains("Connecting to the server") {
            self.queue = None;
        }

        self.last_chat_messages.push_back(message);
        if self.last_chat_messages.len() > Self::CHAT_CAP {
            while self.last_chat_messages.len() > Self::CHAT_TRIM_TO {
                self.last_chat_messages.pop_front();
            }
        }
    }

    /// Parses and latches a tab-list footer against the queue regex (spec
    /// §4.3, §9 open question c: take the rest of the line for `time`).
    pub fn apply_player_list_footer(&mut self, footer: ChatComponent) {
        let text = footer.plain_text();
        if let Some(queue) = parse_queue(&text) {
            self.queue = Some(queue);
        }
        self.player_list_footer = Some(footer);
    }

    /// Clears all entities but the local player, all chunks, and all maps —
    /// the dimension-change side effect of `Respawn` (spec §4.3).
    pub fn clear_world_state_on_dimension_change(&mut self) {
        let local = self.entities.remove(&self.eid);
        self.entities.clear();
        if let Some(local) = local {
            self.entities.insert(self.eid, local);
        }
        self.chunks.clear();
        self.maps.clear();
    }

    /// Recomputes `ridingEid` from the passenger graph invariant: non-null
    /// iff some entity's `passengers` contains `self.eid` (spec §3).
    pub fn recompute_riding_eid(&mut self) {
        self.riding_eid = self
            .entities
            .iter()
            .find(|(_, entity)| entity.common().passengers.contains(&self.eid))
            .map(|(&eid, _)| eid);
    }

    pub fn local_position(&self) -> Position {
        Position { x: self.player.x, y: self.player.y, z: self.player.z }
    }

    pub fn entity_common_mut(&mut self, eid: i32) -> Option<&mut EntityCommon> {
        self.entities.get_mut(&eid).map(Entity::common_mut)
    }
}

impl Default for WorldMirror {
    fn default() -> Self {
        Self::new()
    }
}

/// The regex semantics preserved from the source (spec §9 open question c):
/// `queue: (\d+).+time: ([^\n]+)`, taking the remainder of the line as the
/// time field.
pub fn parse_queue(footer_text: &str) -> Option<Queue> {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| regex::Regex::new(r"queue:\s*(\d+).+time:\s*([^\n]+)").unwrap());

    let captures = re.captures(footer_text)?;
    let position = captures.get(1)?.as_str().parse().ok()?;
    let time = captures.get(2)?.as_str().to_owned();
    Some(Queue { position, time })
}

/// Window 0 (the player inventory) has exactly this many slots (spec §4.4
/// step 5); absent slots read back as [`ItemStack::empty`].
pub fn full_inventory_slots(inventory: &HashMap<i16, ItemStack>) -> Vec<ItemStack> {
    (0..PLAYER_INVENTORY_SLOTS as i16)
        .map(|slot| inventory.get(&slot).cloned().unwrap_or_else(ItemStack::empty))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_regex_extracts_position_and_time() {
        let queue = parse_queue("queue: 42, estimated time: 1h 30m").unwrap();
        assert_eq!(queue.position, 42);
        assert_eq!(queue.time, "1h 30m");
    }

    #[test]
    fn chat_sentinel_clears_queue() {
        let mut mirror = WorldMirror::new();
        mirror.queue = Some(Queue { position: 1, time: "now".to_owned() });
        mirror.push_chat_message(ChatComponent::text("Connecting to the server..."));
        assert!(mirror.queue.is_none());
    }

    #[test]
    fn chat_cap_trims_to_ninety_once_it_exceeds_one_hundred() {
        let mut mirror = WorldMirror::new();
        for i in 0..105 {
            mirror.push_chat_message(ChatComponent::text(format!("line {i}")));
        }
        assert_eq!(mirror.last_chat_messages.len(), WorldMirror::CHAT_TRIM_TO);
    }

    #[test]
    fn riding_eid_tracks_the_passenger_invariant() {
        let mut mirror = WorldMirror::new();
        mirror.eid = 1;
        mirror.insert_entity(1, Entity::Player {
            uuid: Uuid::nil(),
            position: Position::default(),
            yaw: 0,
            pitch: 0,
            metadata: mc_protocol::metadata::Metadata::default(),
            common: EntityCommon::default(),
        });

        let mut boat_common = EntityCommon::default();
        boat_common.passengers.insert(1);
        mirror.insert_entity(2, Entity::Object {
            uuid: Uuid::nil(),
            object_type: 1,
            object_data: 0,
            position: Position::default(),
            velocity: Default::default(),
            pitch: 0,
            yaw: 0,
            common: boat_common,
        });

        mirror.recompute_riding_eid();
        assert_eq!(mirror.riding_eid, Some(2));
    }

    #[test]
    fn dimension_change_clears_entities_but_keeps_the_local_player() {
        let mut mirror = WorldMirror::new();
        mirror.eid = 1;
        mirror.insert_entity(1, Entity::Player {
            uuid: Uuid::nil(),
            position: Position::default(),
            yaw: 0,
            pitch: 0,
            metadata: mc_protocol::metadata::Metadata::default(),
            common: EntityCommon::default(),
        });
        mirror.insert_entity(2, Entity::Orb { position: Position::default(), orb_count: 1, common: EntityCommon::default() });
        mirror.chunks.entry(0).or_default().insert(0, Chunk::empty(0, 0));

        mirror.clear_world_state_on_dimension_change();

        assert!(mirror.entities.contains_key(&1));
        assert!(!mirror.entities.contains_key(&2));
        assert!(mirror.chunks.is_empty());
    }
}
