//! Quote id allocation
//!
//! Fresh ids are time-derived and above every id already taken. When the top of the
//! id space is occupied, the smallest free id is used instead.

use chrono::Utc;
use std::collections::HashSet;

use crate::quote::Quote;

pub(crate) struct IdAllocator {
    taken: HashSet<u64>,
    floor: u64,
}

impl IdAllocator {
    pub(crate) fn new(existing: &[Quote]) -> Self {
        let taken: HashSet<u64> = existing.iter().map(|q| q.id).collect();
        let floor = taken.iter().max().map_or(0, |max| max.saturating_add(1));
        Self { taken, floor }
    }

    /// Reserve `id` if nobody holds it yet.
    pub(crate) fn claim(&mut self, id: u64) -> bool {
        if !self.taken.insert(id) {
            return false;
        }
        self.floor = self.floor.max(id.saturating_add(1));
        true
    }

    pub(crate) fn fresh(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let start = now.max(self.floor);

        // Both scans stop within `taken.len() + 1` steps
        let id = (start..=u64::MAX)
            .find(|id| !self.taken.contains(id))
            .or_else(|| (1..start).find(|id| !self.taken.contains(id)))
            .unwrap_or(0);

        self.taken.insert(id);
        self.floor = self.floor.max(id.saturating_add(1));
        id
    }
}
