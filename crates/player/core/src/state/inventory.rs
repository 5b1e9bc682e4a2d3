use super::common::{InventoryIndex, ItemId, Tick};
use crate::config::EngineConfig;

/// One stack of items carried by the character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryItem {
    pub item: ItemId,
    pub amount: u16,
    #[cfg_attr(feature = "serde", serde(default))]
    pub refine: u8,
    /// Inserted cards; `ItemId::NONE` marks an empty socket.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cards: [ItemId; EngineConfig::MAX_CARD_SLOTS],
    /// Rental deadline.
    #[cfg_attr(feature = "serde", serde(default))]
    pub expires_at: Option<Tick>,
}

impl InventoryItem {
    pub fn new(item: ItemId, amount: u16) -> Self {
        Self {
            item,
            amount,
            refine: 0,
            cards: [ItemId::NONE; EngineConfig::MAX_CARD_SLOTS],
            expires_at: None,
        }
    }

    pub fn with_refine(mut self, refine: u8) -> Self {
        self.refine = refine;
        self
    }

    pub fn with_card(mut self, socket: usize, card: ItemId) -> Self {
        if let Some(slot) = self.cards.get_mut(socket) {
            *slot = card;
        }
        self
    }

    pub fn with_expiry(mut self, expires_at: Tick) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn cards(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.cards.iter().copied().filter(|card| !card.is_none())
    }
}

/// Item storage with stable indices: removing an entry leaves a hole that the
/// next insertion reuses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    entries: Vec<Option<InventoryItem>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item` in the first free index. `None` when the inventory is full.
    pub fn add(&mut self, item: InventoryItem) -> Option<InventoryIndex> {
        if let Some(pos) = self.entries.iter().position(Option::is_none) {
            self.entries[pos] = Some(item);
            return Some(InventoryIndex(pos as u16));
        }
        if self.entries.len() >= EngineConfig::MAX_INVENTORY {
            return None;
        }
        self.entries.push(Some(item));
        Some(InventoryIndex((self.entries.len() - 1) as u16))
    }

    pub fn get(&self, index: InventoryIndex) -> Option<&InventoryItem> {
        self.entries.get(usize::from(index.0)).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: InventoryIndex) -> Option<&mut InventoryItem> {
        self.entries
            .get_mut(usize::from(index.0))
            .and_then(Option::as_mut)
    }

    pub fn remove(&mut self, index: InventoryIndex) -> Option<InventoryItem> {
        self.entries.get_mut(usize::from(index.0)).and_then(Option::take)
    }

    /// Removes `amount` units, dropping the entry when it reaches zero.
    /// Returns whether the entry is now gone.
    pub fn consume(&mut self, index: InventoryIndex, amount: u16) -> bool {
        let Some(entry) = self.get_mut(index) else {
            return false;
        };
        entry.amount = entry.amount.saturating_sub(amount);
        if entry.amount == 0 {
            self.remove(index);
            return true;
        }
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = (InventoryIndex, &InventoryItem)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|item| (InventoryIndex(i as u16), item)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_index_is_reused() {
        let mut inv = Inventory::new();
        let a = inv.add(InventoryItem::new(ItemId(1), 1)).unwrap();
        let b = inv.add(InventoryItem::new(ItemId(2), 1)).unwrap();
        inv.remove(a);
        let c = inv.add(InventoryItem::new(ItemId(3), 1)).unwrap();
        assert_eq!(a, c);
        assert_eq!(inv.get(b).map(|i| i.item), Some(ItemId(2)));
        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn consume_drops_empty_stack() {
        let mut inv = Inventory::new();
        let idx = inv.add(InventoryItem::new(ItemId(501), 2)).unwrap();
        assert!(!inv.consume(idx, 1));
        assert!(inv.consume(idx, 1));
        assert!(inv.get(idx).is_none());
    }
}
