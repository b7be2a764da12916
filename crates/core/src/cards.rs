//! Character cards - per-character card collections and unlocks
//!
//! Each character owns up to nine cards, indexed 1 through 9. The set is
//! persisted as a bitmask with card `i` stored in bit `i - 1`. A character
//! unlocks once it holds `unlock_need` cards; the default character is always
//! unlocked.
//!
//! Store keys:
//!
//! - `cards.{id}.mask`: collected cards
//! - `characters.{id}.unlocked`: 1 when unlocked
//! - `characters.active`: index of the character in use

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::rng::SimpleRng;
use crate::store::KeyValueStore;

pub const MIN_CARD: u8 = 1;
pub const MAX_CARD: u8 = 9;

const ACTIVE_KEY: &str = "characters.active";

/// Ordered set of collected card indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardSet {
    cards: BTreeSet<u8>,
}

impl CardSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn valid(index: u8) -> bool {
        (MIN_CARD..=MAX_CARD).contains(&index)
    }

    /// Add a card; false when out of range or already owned
    pub fn insert(&mut self, index: u8) -> bool {
        Self::valid(index) && self.cards.insert(index)
    }

    pub fn remove(&mut self, index: u8) -> bool {
        self.cards.remove(&index)
    }

    pub fn contains(&self, index: u8) -> bool {
        self.cards.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All nine cards collected
    pub fn is_complete(&self) -> bool {
        self.cards.len() == usize::from(MAX_CARD - MIN_CARD + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.cards.iter().copied()
    }

    /// Card indices not yet collected, ascending
    pub fn missing(&self) -> Vec<u8> {
        (MIN_CARD..=MAX_CARD).filter(|&i| !self.contains(i)).collect()
    }

    pub fn to_mask(&self) -> u32 {
        self.cards
            .iter()
            .fold(0u32, |mask, &i| mask | (1 << (i - MIN_CARD)))
    }

    /// Decode a persisted mask; bits above the ninth are ignored
    pub fn from_mask(mask: u32) -> Self {
        let cards = (MIN_CARD..=MAX_CARD)
            .filter(|&i| mask & (1 << (i - MIN_CARD)) != 0)
            .collect();
        Self { cards }
    }

    fn key(character: &str) -> String {
        format!("cards.{}.mask", character)
    }

    pub fn load(store: &dyn KeyValueStore, character: &str) -> Self {
        let mask = store.get_or(&Self::key(character), 0);
        Self::from_mask(u32::try_from(mask).unwrap_or(0))
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, character: &str) {
        store.set(&Self::key(character), i64::from(self.to_mask()));
    }
}

/// One playable character
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterDef {
    pub id: String,
    /// Cards required to unlock, clamped to 1..=9
    #[serde(default = "default_unlock_need")]
    pub unlock_need: u8,
}

fn default_unlock_need() -> u8 {
    MAX_CARD
}

impl CharacterDef {
    pub fn new(id: impl Into<String>, unlock_need: u8) -> Self {
        Self {
            id: id.into(),
            unlock_need,
        }
    }

    fn need(&self) -> usize {
        usize::from(self.unlock_need.clamp(MIN_CARD, MAX_CARD))
    }
}

/// Character list plus the store-backed card and unlock state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRoster {
    characters: Vec<CharacterDef>,
    default_index: usize,
}

impl CharacterRoster {
    /// `default_index` is clamped into the list
    pub fn new(characters: Vec<CharacterDef>, default_index: usize) -> Self {
        let default_index = default_index.min(characters.len().saturating_sub(1));
        Self {
            characters,
            default_index,
        }
    }

    pub fn characters(&self) -> &[CharacterDef] {
        &self.characters
    }

    pub fn get(&self, id: &str) -> Option<&CharacterDef> {
        self.characters.iter().find(|c| c.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.characters.iter().position(|c| c.id == id)
    }

    pub fn default_character(&self) -> Option<&CharacterDef> {
        self.characters.get(self.default_index)
    }

    fn is_default(&self, id: &str) -> bool {
        self.default_character().is_some_and(|c| c.id == id)
    }

    fn unlock_key(id: &str) -> String {
        format!("characters.{}.unlocked", id)
    }

    /// Unlock the default character and make it active when none is chosen
    pub fn ensure_default_unlocked(&self, store: &mut dyn KeyValueStore) {
        let Some(def) = self.default_character() else {
            return;
        };
        store.set(&Self::unlock_key(&def.id), 1);
        if store.get(ACTIVE_KEY).is_none() {
            store.set(ACTIVE_KEY, self.default_index as i64);
        }
    }

    pub fn is_unlocked(&self, store: &dyn KeyValueStore, id: &str) -> bool {
        self.get(id).is_some() && store.get_or(&Self::unlock_key(id), 0) == 1
    }

    pub fn cards(&self, store: &dyn KeyValueStore, id: &str) -> CardSet {
        CardSet::load(store, id)
    }

    /// The character in use; falls back to the default on a stale index
    pub fn active(&self, store: &dyn KeyValueStore) -> Option<&CharacterDef> {
        store
            .get(ACTIVE_KEY)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.characters.get(i))
            .or_else(|| self.default_character())
    }

    /// Switch to an unlocked character
    pub fn set_active(&self, store: &mut dyn KeyValueStore, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !self.is_unlocked(store, id) {
            return false;
        }
        store.set(ACTIVE_KEY, index as i64);
        true
    }

    /// Collect one specific card
    ///
    /// False for an unknown character, an out-of-range index or a card
    /// already owned.
    pub fn add_card(&self, store: &mut dyn KeyValueStore, id: &str, index: u8) -> bool {
        let Some(def) = self.get(id) else {
            return false;
        };
        let mut cards = CardSet::load(store, id);
        if !cards.insert(index) {
            return false;
        }
        cards.save(store, id);
        self.auto_unlock(store, def, &cards);
        true
    }

    /// Collect up to `count` random missing cards; returns how many were added
    pub fn add_random_cards(
        &self,
        store: &mut dyn KeyValueStore,
        id: &str,
        count: usize,
        rng: &mut SimpleRng,
    ) -> usize {
        let Some(def) = self.get(id) else {
            return 0;
        };
        let mut cards = CardSet::load(store, id);
        let mut missing = cards.missing();
        if count == 0 || missing.is_empty() {
            return 0;
        }

        rng.shuffle(&mut missing);
        let added = count.min(missing.len());
        for &index in &missing[..added] {
            cards.insert(index);
        }
        cards.save(store, id);
        log::debug!("character {}: +{} cards ({} held)", id, added, cards.len());
        self.auto_unlock(store, def, &cards);
        added
    }

    fn auto_unlock(&self, store: &mut dyn KeyValueStore, def: &CharacterDef, cards: &CardSet) {
        if self.is_default(&def.id) || cards.len() >= def.need() {
            store.set(&Self::unlock_key(&def.id), 1);
        }
    }

    /// Unlock a locked character that already holds enough cards
    pub fn try_unlock(&self, store: &mut dyn KeyValueStore, id: &str) -> bool {
        let Some(def) = self.get(id) else {
            return false;
        };
        if self.is_unlocked(store, id) || CardSet::load(store, id).len() < def.need() {
            return false;
        }
        store.set(&Self::unlock_key(id), 1);
        log::info!("character {} unlocked", id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn roster() -> CharacterRoster {
        CharacterRoster::new(
            vec![
                CharacterDef::new("fox", 9),
                CharacterDef::new("owl", 3),
                CharacterDef::new("cat", 0),
            ],
            0,
        )
    }

    #[test]
    fn test_bit_layout() {
        let mut set = CardSet::new();
        assert!(set.insert(1));
        assert!(set.insert(9));
        assert!(!set.insert(9));
        assert!(!set.insert(0));
        assert!(!set.insert(10));
        assert_eq!(set.to_mask(), 0b1_0000_0001);
        assert_eq!(set.missing(), vec![2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_from_mask_ignores_high_bits() {
        let set = CardSet::from_mask(0xFFFF_FE05);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_complete() {
        let set = CardSet::from_mask(0x1FF);
        assert!(set.is_complete());
        assert_eq!(set.len(), 9);
        assert!(set.missing().is_empty());
    }

    #[test]
    fn test_store_per_character() {
        let mut store = MemoryStore::new();
        let mut set = CardSet::new();
        set.insert(4);
        set.save(&mut store, "fox");

        assert_eq!(store.get("cards.fox.mask"), Some(8));
        assert_eq!(CardSet::load(&store, "fox"), set);
        assert!(CardSet::load(&store, "owl").is_empty());
    }

    #[test]
    fn test_default_character_starts_unlocked_and_active() {
        let roster = roster();
        let mut store = MemoryStore::new();
        assert!(!roster.is_unlocked(&store, "fox"));

        roster.ensure_default_unlocked(&mut store);
        assert!(roster.is_unlocked(&store, "fox"));
        assert!(!roster.is_unlocked(&store, "owl"));
        assert_eq!(roster.active(&store).map(|c| c.id.as_str()), Some("fox"));
    }

    #[test]
    fn test_cards_unlock_at_the_threshold() {
        let roster = roster();
        let mut store = MemoryStore::new();
        assert!(roster.add_card(&mut store, "owl", 2));
        assert!(roster.add_card(&mut store, "owl", 5));
        assert!(!roster.add_card(&mut store, "owl", 5));
        assert!(!roster.is_unlocked(&store, "owl"));
        assert!(!roster.set_active(&mut store, "owl"));

        assert!(roster.add_card(&mut store, "owl", 9));
        assert!(roster.is_unlocked(&store, "owl"));
        assert_eq!(store.get("cards.owl.mask"), Some(0b1_0001_0010));
        assert!(roster.set_active(&mut store, "owl"));
        assert_eq!(roster.active(&store).map(|c| c.id.as_str()), Some("owl"));
    }

    #[test]
    fn test_zero_need_is_clamped_to_one() {
        let roster = roster();
        let mut store = MemoryStore::new();
        assert!(!roster.try_unlock(&mut store, "cat"));
        assert!(roster.add_card(&mut store, "cat", 1));
        assert!(roster.is_unlocked(&store, "cat"));
        assert!(!roster.try_unlock(&mut store, "cat"));
    }

    #[test]
    fn test_random_cards_fill_missing_slots_only() {
        let roster = roster();
        let mut store = MemoryStore::new();
        let mut rng = SimpleRng::new(3);
        assert!(roster.add_card(&mut store, "fox", 1));

        assert_eq!(roster.add_random_cards(&mut store, "fox", 5, &mut rng), 5);
        let cards = roster.cards(&store, "fox");
        assert_eq!(cards.len(), 6);
        assert!(cards.contains(1));

        assert_eq!(roster.add_random_cards(&mut store, "fox", 10, &mut rng), 3);
        assert!(roster.cards(&store, "fox").is_complete());
        assert_eq!(roster.add_random_cards(&mut store, "fox", 1, &mut rng), 0);
        assert_eq!(roster.add_random_cards(&mut store, "mole", 1, &mut rng), 0);
    }

    #[test]
    fn test_try_unlock_for_cards_held_before_a_rule_change() {
        let roster = roster();
        let mut store = MemoryStore::new();
        CardSet::from_mask(0b111).save(&mut store, "owl");
        assert!(!roster.is_unlocked(&store, "owl"));
        assert!(roster.try_unlock(&mut store, "owl"));
        assert!(roster.is_unlocked(&store, "owl"));
        assert!(!roster.try_unlock(&mut store, "mole"));
    }

    #[test]
    fn test_stale_active_index_falls_back_to_default() {
        let roster = roster();
        let mut store = MemoryStore::new();
        store.set("characters.active", 40);
        assert_eq!(roster.active(&store).map(|c| c.id.as_str()), Some("fox"));
    }
}
