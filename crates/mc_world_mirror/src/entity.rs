//! Entities: tagged by how they were spawned, since each spawn packet
//! carries a different field set (spec §3's "non-applicable fields are
//! absent for the tag").

use std::collections::{HashMap, HashSet};

use mc_protocol::item::ItemStack;
use mc_protocol::metadata::Metadata;
use mc_protocol::BlockPos;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeModifier {
    pub uuid: Uuid,
    pub amount: f64,
    pub operation: i8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityProperty {
    pub value: f64,
    pub modifiers: Vec<AttributeModifier>,
}

/// Fields every entity tag can carry regardless of spawn kind (spec §3:
/// "All may additionally carry `properties`... `equipment`...
/// `passengers`... `attachedEid`").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityCommon {
    pub properties: HashMap<String, EntityProperty>,
    pub equipment: HashMap<i32, ItemStack>,
    pub passengers: HashSet<i32>,
    pub attached_eid: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Object {
        uuid: Uuid,
        object_type: i8,
        object_data: i32,
        position: Position,
        velocity: Velocity,
        pitch: i8,
        yaw: i8,
        common: EntityCommon,
    },
    Orb {
        position: Position,
        orb_count: i16,
        common: EntityCommon,
    },
    Global {
        object_type: i8,
        position: Position,
        common: EntityCommon,
    },
    Mob {
        uuid: Uuid,
        mob_type: i32,
        position: Position,
        velocity: Velocity,
        pitch: i8,
        yaw: i8,
        head_pitch: i8,
        metadata: Metadata,
        common: EntityCommon,
    },
    Painting {
        uuid: Uuid,
        painting_title: String,
        location: BlockPos,
        painting_direction: i8,
        common: EntityCommon,
    },
    Player {
        uuid: Uuid,
        position: Position,
        yaw: i8,
        pitch: i8,
        metadata: Metadata,
        common: EntityCommon,
    },
}

impl Entity {
    pub fn common(&self) -> &EntityCommon {
        match self {
            Entity::Object { common, .. }
            | Entity::Orb { common, .. }
            | Entity::Global { common, .. }
            | Entity::Mob { common, .. }
            | Entity::Painting { common, .. }
            | Entity::Player { common, .. } => common,
        }
    }

    pub fn common_mut(&mut self) -> &mut EntityCommon {
        match self {
            Entity::Object { common, .. }
            | Entity::Orb { common, .. }
            | Entity::Global { common, .. }
            | Entity::Mob { common, .. }
            | Entity::Painting { common, .. }
            | Entity::Player { common, .. } => common,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Entity::Object { position, .. }
            | Entity::Orb { position, .. }
            | Entity::Global { position, .. }
            | Entity::Mob { position, .. }
            | Entity::Player { position, .. } => Some(*position),
            Entity::Painting { .. } => None,
        }
    }

    pub fn set_position(&mut self, new: Position) {
        match self {
            Entity::Object { position, .. }
            | Entity::Orb { position, .. }
            | Entity::Global { position, .. }
            | Entity::Mob { position, .. }
            | Entity::Player { position, .. } => *position = new,
            Entity::Painting { .. } => {}
        }
    }

    pub fn metadata_mut(&mut self) -> Option<&mut Metadata> {
        match self {
            Entity::Mob { metadata, .. } | Entity::Player { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    /// The object-type discriminant the fireworks eid rewrite (spec §4.5)
    /// checks; only object-tagged entities carry one. Fireworks are object
    /// type 76 in this revision's spawn-object table.
    pub fn object_type(&self) -> Option<i8> {
        match self {
            Entity::Object { object_type, .. } => Some(*object_type),
            _ => None,
        }
    }

    pub const FIREWORKS_OBJECT_TYPE: i8 = 76;
}
