//! Serverbound `Play` packets the bridge rewriter inspects or mutates per
//! spec §4.5. Packets it only forwards untouched (crafting, windows,
//! plugin channels, ...) aren't modeled here — they cross the bridge as
//! untyped [`crate::codec::RawPacket`]s.

use std::io::Write;

use crate::var_int::VarInt;
use crate::{Decode, Encode};

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

simple_packet!(TeleportConfirm {
    teleport_id: VarInt,
}, id = 0x00);

simple_packet!(ChatMessageServerbound {
    message: String,
}, id = 0x02);

simple_packet!(KeepAliveServerbound {
    id: VarInt,
}, id = 0x0B);

simple_packet!(PlayerPosition {
    x: f64,
    y: f64,
    z: f64,
    on_ground: bool,
}, id = 0x0D);

simple_packet!(PlayerPositionAndLookServerbound {
    x: f64,
    y: f64,
    z: f64,
    yaw: f32,
    pitch: f32,
    on_ground: bool,
}, id = 0x0E);

simple_packet!(PlayerLook {
    yaw: f32,
    pitch: f32,
    on_ground: bool,
}, id = 0x0F);

simple_packet!(VehicleMoveServerbound {
    x: f64,
    y: f64,
    z: f64,
    yaw: f32,
    pitch: f32,
}, id = 0x10);

simple_packet!(EntityAction {
    entity_id: VarInt,
    action_id: VarInt,
    jump_boost: VarInt,
}, id = 0x15);

impl EntityAction {
    pub const ACTION_START_SNEAKING: i32 = 0;
    pub const ACTION_STOP_SNEAKING: i32 = 1;
    pub const ACTION_LEAVE_BED: i32 = 2;
    pub const ACTION_START_SPRINTING: i32 = 3;
    pub const ACTION_STOP_SPRINTING: i32 = 4;
    pub const ACTION_START_HORSE_JUMP: i32 = 5;
    pub const ACTION_STOP_HORSE_JUMP: i32 = 6;
    pub const ACTION_OPEN_HORSE_INVENTORY: i32 = 7;
    pub const ACTION_START_ELYTRA_FLYING: i32 = 8;
}

simple_packet!(HeldItemChangeServerbound {
    slot: i16,
}, id = 0x1A);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_action_round_trips() {
        let action = EntityAction {
            entity_id: VarInt(9_999_999),
            action_id: VarInt(EntityAction::ACTION_START_SPRINTING),
            jump_boost: VarInt(0),
        };
        let mut buf = Vec::new();
        action.encode(&mut buf).unwrap();
        let mut slice = buf.as_slice();
        assert_eq!(EntityAction::decode(&mut slice).unwrap(), action);
    }

    #[test]
    fn chat_message_round_trips() {
        let msg = ChatMessageServerbound { message: "/connect 1".to_owned() };
        let mut buf = Vec::new();
        msg.encode(&mut buf).unwrap();
        let mut slice = buf.as_slice();
        assert_eq!(ChatMessageServerbound::decode(&mut slice).unwrap(), msg);
    }
}
