use std::io::Write;

use mc_nbt::Compound;

use crate::{Decode, Encode};

/// A single inventory slot.
///
/// This revision encodes absence as `id == -1` rather than a leading
/// presence flag (later revisions use the flag instead) — there is no
/// `Option<ItemStack>` wrapper on the wire, `id == -1` *is* the empty state.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemStack {
    pub id: i16,
    pub count: i8,
    pub damage: i16,
    pub tag: Option<Compound>,
}

impl ItemStack {
    pub const EMPTY_ID: i16 = -1;

    pub fn empty() -> Self {
        Self {
            id: Self::EMPTY_ID,
            count: 0,
            damage: 0,
            tag: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id == Self::EMPTY_ID
    }

    pub fn new(id: i16, count: i8, damage: i16, tag: Option<Compound>) -> Self {
        Self { id, count, damage, tag }
    }
}

impl Default for ItemStack {
    fn default() -> Self {
        Self::empty()
    }
}

impl Encode for ItemStack {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        self.id.encode(&mut w)?;
        if self.is_empty() {
            return Ok(());
        }
        self.count.encode(&mut w)?;
        self.damage.encode(&mut w)?;
        match &self.tag {
            Some(tag) => tag.encode(w),
            None => 0u8.encode(w), // a bare TAG_End byte means "no tag"
        }
    }
}

impl Decode for ItemStack {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let id = i16::decode(r)?;
        if id == Self::EMPTY_ID {
            return Ok(Self::empty());
        }
        let count = i8::decode(r)?;
        let damage = i16::decode(r)?;
        let tag = Compound::decode(r)?;
        let tag = if tag.is_empty() { None } else { Some(tag) };
        Ok(Self { id, count, damage, tag })
    }
}

/// The player inventory's slot count (crafting grid, armor, main inventory,
/// offhand) as emitted by `WindowItems` for window 0.
pub const PLAYER_INVENTORY_SLOTS: usize = 46;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_round_trips_as_two_bytes() {
        let item = ItemStack::empty();
        let mut buf = Vec::new();
        item.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0xff, 0xff]); // i16 -1, big-endian

        let mut slice = buf.as_slice();
        assert_eq!(ItemStack::decode(&mut slice).unwrap(), item);
        assert!(slice.is_empty());
    }

    #[test]
    fn populated_slot_round_trips_with_tag() {
        let mut tag = Compound::new();
        tag.insert("ench".to_owned(), mc_nbt::Value::Int(1));

        let item = ItemStack::new(278, 1, 0, Some(tag));
        let mut buf = Vec::new();
        item.encode(&mut buf).unwrap();

        let mut slice = buf.as_slice();
        let decoded = ItemStack::decode(&mut slice).unwrap();
        assert_eq!(decoded, item);
        assert!(slice.is_empty());
    }

    #[test]
    fn populated_slot_without_tag_round_trips() {
        let item = ItemStack::new(1, 64, 0, None);
        let mut buf = Vec::new();
        item.encode(&mut buf).unwrap();

        let mut slice = buf.as_slice();
        assert_eq!(ItemStack::decode(&mut slice).unwrap(), item);
    }
}
