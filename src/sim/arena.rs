//! Slot-keyed entity storage

use serde::{Deserialize, Serialize};

/// Fixed-slot arena for game entities.
///
/// An entity keeps its slot index for its whole lifetime. Removal leaves a
/// tombstone that later inserts reuse, so slot indices stay small and
/// iteration order (ascending slot) stays deterministic for a given
/// insert/remove history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an entity, reusing the most recently freed slot if any.
    pub fn insert(&mut self, value: T) -> u32 {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(value);
                slot
            }
            None => {
                self.slots.push(Some(value));
                (self.slots.len() - 1) as u32
            }
        }
    }

    /// Remove and return the entity in `slot`, leaving a tombstone.
    pub fn remove(&mut self, slot: u32) -> Option<T> {
        let value = self.slots.get_mut(slot as usize)?.take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, slot: u32) -> Option<&T> {
        self.slots.get(slot as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: u32) -> Option<&mut T> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }

    /// Iterate live entities in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i as u32, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (i as u32, v)))
    }

    /// Drop every entity for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(u32, &mut T) -> bool) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot {
                if !keep(i as u32, value) {
                    *slot = None;
                    self.free.push(i as u32);
                    self.len -= 1;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_sequential_slots() {
        let mut arena = SlotArena::new();
        assert_eq!(arena.insert("a"), 0);
        assert_eq!(arena.insert("b"), 1);
        assert_eq!(arena.insert("c"), 2);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_remove_leaves_tombstone_and_reuses_slot() {
        let mut arena = SlotArena::new();
        arena.insert(10);
        let slot = arena.insert(20);
        arena.insert(30);

        assert_eq!(arena.remove(slot), Some(20));
        assert_eq!(arena.get(slot), None);
        assert_eq!(arena.len(), 2);

        // Survivors keep their slots
        assert_eq!(arena.get(0), Some(&10));
        assert_eq!(arena.get(2), Some(&30));

        // Next insert fills the hole
        assert_eq!(arena.insert(40), slot);
        assert_eq!(arena.get(slot), Some(&40));
    }

    #[test]
    fn test_remove_twice_returns_none() {
        let mut arena = SlotArena::new();
        let slot = arena.insert(1);
        assert_eq!(arena.remove(slot), Some(1));
        assert_eq!(arena.remove(slot), None);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut arena = SlotArena::new();
        let a = arena.insert(5);
        let b = arena.insert(7);

        *arena.get_mut(a).unwrap() += 1;
        assert_eq!(arena.get(a), Some(&6));
        assert_eq!(arena.get(b), Some(&7));

        arena.remove(b);
        assert!(arena.get_mut(b).is_none());
        assert!(arena.get_mut(99).is_none());
    }

    #[test]
    fn test_iteration_is_slot_ordered() {
        let mut arena = SlotArena::new();
        arena.insert(0);
        let b = arena.insert(1);
        arena.insert(2);
        arena.remove(b);
        arena.insert(3); // reuses slot 1

        let order: Vec<_> = arena.iter().collect();
        assert_eq!(order, vec![(0, &0), (1, &3), (2, &2)]);
    }

    #[test]
    fn test_retain_frees_slots() {
        let mut arena = SlotArena::new();
        for i in 0..6 {
            arena.insert(i);
        }
        arena.retain(|_, v| *v % 2 == 0);
        assert_eq!(arena.len(), 3);

        let kept: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(kept, vec![0, 2, 4]);

        // Freed slots get reused before the arena grows
        let slot = arena.insert(99);
        assert!(slot < 6);
    }

    #[test]
    fn test_serde_round_trip_preserves_slots() {
        let mut arena = SlotArena::new();
        arena.insert(7);
        let b = arena.insert(8);
        arena.insert(9);
        arena.remove(b);

        let json = serde_json::to_string(&arena).unwrap();
        let restored: SlotArena<i32> = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(0), Some(&7));
        assert_eq!(restored.get(1), None);
        assert_eq!(restored.get(2), Some(&9));

        let mut restored = restored;
        assert_eq!(restored.insert(10), b);
    }
}
