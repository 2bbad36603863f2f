use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CoocError, Result};

/// A distinct vocabulary item. Each string is allocated once; the entry,
/// the lookup index and resolved partner references all share the same
/// allocation.
pub type Item = Arc<str>;

/// How a partner is referenced, mirroring the two text layouts: the
/// item-keyed layout carries the literal string, the id-keyed layout the
/// entry id. Loads resolve every key to the target representation before
/// the table is handed on, so a dump never meets the wrong variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PartnerKey {
    Id(u32),
    Item(Item),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partner {
    pub key: PartnerKey,
    pub count: u64,
    pub weight: f64,
}

/// One main entry: an item, its corpus-wide count and its partner list.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: u32,
    pub item: Item,
    pub count: u64,
    pub partners: Vec<Partner>,
}

/// Per-item co-occurrence table. Entries are append-only and addressed
/// by id; ids start at `start_id` in first-seen order and every index
/// below `start_id` holds an empty header record (id 0 never names an
/// entry). Item-to-id lookup goes through a hash index kept in step with
/// the entry vector.
#[derive(Debug)]
pub struct CoocTable {
    entries: Vec<Entry>,
    index: HashMap<Item, u32>,
    start_id: u32,
}

impl CoocTable {
    pub fn new(start_id: u32) -> Self {
        let mut entries = Vec::with_capacity(start_id as usize);
        for _ in 0..start_id {
            entries.push(Entry {
                id: 0,
                item: Arc::from(""),
                count: 0,
                partners: Vec::new(),
            });
        }
        CoocTable {
            entries,
            index: HashMap::new(),
            start_id,
        }
    }

    pub fn start_id(&self) -> u32 {
        self.start_id
    }

    /// Table size including the header record(s).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create the entry for a new item. Each item is interned exactly
    /// once during construction; seeing it again is a construction bug.
    pub fn intern(&mut self, item: &str, count: u64) -> Result<u32> {
        self.insert_entry(item, count, Vec::new())
    }

    pub(crate) fn insert_entry(&mut self, item: &str, count: u64, partners: Vec<Partner>) -> Result<u32> {
        if self.index.contains_key(item) {
            return Err(CoocError::DuplicateItem(item.to_string()));
        }
        let id = self.entries.len() as u32;
        let item: Item = Arc::from(item);
        self.index.insert(item.clone(), id);
        self.entries.push(Entry {
            id,
            item,
            count,
            partners,
        });
        Ok(id)
    }

    /// Resolve an item to its id, appending a new entry when the item
    /// never appeared as a main entry. The count is only used for that
    /// appended entry; callers pass the joint count of the single edge
    /// that revealed the item, which is not a corpus-wide frequency.
    pub fn get_or_intern(&mut self, item: &Item, count: u64) -> u32 {
        if let Some(&id) = self.index.get(&**item) {
            return id;
        }
        let id = self.entries.len() as u32;
        self.index.insert(item.clone(), id);
        self.entries.push(Entry {
            id,
            item: item.clone(),
            count,
            partners: Vec::new(),
        });
        id
    }

    pub fn id_of(&self, item: &str) -> Option<u32> {
        self.index.get(item).copied()
    }

    pub fn item_of(&self, id: u32) -> Option<&Item> {
        if id < self.start_id {
            return None;
        }
        self.entries.get(id as usize).map(|entry| &entry.item)
    }

    pub fn entry(&self, id: u32) -> Option<&Entry> {
        self.entries.get(id as usize)
    }

    pub fn entry_mut(&mut self, id: u32) -> Option<&mut Entry> {
        self.entries.get_mut(id as usize)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    /// Every entry above the header range must sit at the index equal to
    /// its id. A mismatch is a construction bug, reported and never
    /// repaired.
    pub fn check_consistency(&self) -> Result<()> {
        for (index, entry) in self.entries.iter().enumerate().skip(self.start_id as usize) {
            if entry.id as usize != index {
                return Err(CoocError::IdentityMismatch { index, id: entry.id });
            }
        }
        Ok(())
    }
}
