//! An arena of pool entries with stable indices.
//!
//! Tagged and Segmented policies both need a single mutable "entry" observed
//! from two containers at once (a shared queue and a per-tenant queue) so that
//! invalidating it in one place is visible from the other. Rust's aliasing
//! rules make a literal shared mutable reference awkward; an arena of entries
//! addressed by a stable index, with a `valid` bit flipped on consumption,
//! gets the same behavior without any `Rc<RefCell<_>>` bookkeeping.

use crate::ids::{IPAddress, TenantId};
use crate::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub usize);

#[derive(Debug, Clone)]
pub struct Entry {
    pub ip: IPAddress,
    pub owner: TenantId,
    pub valid: bool,
    pub added: Duration,
}

#[derive(Default)]
pub struct EntryArena {
    entries: Vec<Entry>,
}

impl EntryArena {
    pub fn push(&mut self, entry: Entry) -> EntryId {
        self.entries.push(entry);
        EntryId(self.entries.len() - 1)
    }

    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    pub fn invalidate(&mut self, id: EntryId) {
        self.entries[id.0].valid = false;
    }

    pub fn is_valid(&self, id: EntryId) -> bool {
        self.entries[id.0].valid
    }

    pub fn ip_of(&self, id: EntryId) -> IPAddress {
        self.entries[id.0].ip
    }

    pub fn added_of(&self, id: EntryId) -> Duration {
        self.entries[id.0].added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_is_observed_through_any_held_id() {
        let mut arena = EntryArena::default();
        let id = arena.push(Entry {
            ip: IPAddress(1),
            owner: TenantId(1),
            valid: true,
            added: Duration::ZERO,
        });
        let alias = id;
        assert!(arena.is_valid(alias));
        arena.invalidate(id);
        assert!(!arena.is_valid(alias));
    }
}
