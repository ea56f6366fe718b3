//! Indexed binary min-heap.
//!
//! Items live in an external arena; the heap stores only their handles and
//! keeps each item's position written back into the arena. That makes
//! membership checks O(1) and lets a decreased key be repaired in place
//! with a single upward sift instead of a rebuild.
//!
//! Layout is the usual implicit tree: parent `(i - 1) / 2`, children
//! `2i + 1` and `2i + 2`, highest priority at index 0.

use std::cmp::Ordering;
use std::fmt::Debug;

/// Heap position of an item that is not queued.
pub const NOT_IN_HEAP: usize = usize::MAX;

/// Storage for items that can be queued in an [`IndexedHeap`].
pub trait HeapArena {
    type Handle: Copy + Eq + Debug;

    /// Position last recorded for `item`, or [`NOT_IN_HEAP`].
    fn heap_index(&self, item: Self::Handle) -> usize;

    fn set_heap_index(&mut self, item: Self::Handle, index: usize);

    /// `Ordering::Less` when `a` has higher priority (must leave the heap
    /// before `b`).
    fn compare(&self, a: Self::Handle, b: Self::Handle) -> Ordering;
}

/// Fixed-capacity binary min-heap over arena handles.
#[derive(Debug, Clone)]
pub struct IndexedHeap<H> {
    slots: Vec<H>,
    capacity: usize,
}

impl<H: Copy + Eq + Debug> IndexedHeap<H> {
    /// Create a heap that can hold at most `capacity` items at once.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every queued handle. Positions stored in the arena go stale,
    /// which `contains` tolerates because it checks the slot's identity.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Queue `item`.
    ///
    /// # Panics
    /// When the heap is already at capacity. Every live item has a unique
    /// arena slot, so overflowing means an item was queued twice.
    pub fn push<A>(&mut self, arena: &mut A, item: H)
    where
        A: HeapArena<Handle = H> + ?Sized,
    {
        assert!(
            self.slots.len() < self.capacity,
            "heap capacity {} exceeded while pushing {:?}",
            self.capacity,
            item
        );
        let index = self.slots.len();
        arena.set_heap_index(item, index);
        self.slots.push(item);
        self.sift_up(arena, index);
    }

    /// Remove and return the highest-priority handle.
    pub fn pop<A>(&mut self, arena: &mut A) -> Option<H>
    where
        A: HeapArena<Handle = H> + ?Sized,
    {
        let last = self.slots.len().checked_sub(1)?;
        self.slots.swap(0, last);
        let top = self.slots.pop()?;
        arena.set_heap_index(top, NOT_IN_HEAP);

        if let Some(&root) = self.slots.first() {
            arena.set_heap_index(root, 0);
            self.sift_down(arena, 0);
        }
        Some(top)
    }

    /// O(1) membership test.
    pub fn contains<A>(&self, arena: &A, item: H) -> bool
    where
        A: HeapArena<Handle = H> + ?Sized,
    {
        let index = arena.heap_index(item);
        index < self.slots.len() && self.slots[index] == item
    }

    /// Restore ordering after `item`'s key was lowered.
    ///
    /// Only an upward sift is performed; callers may never raise a key.
    ///
    /// # Panics
    /// If `item` is not queued, or if after sifting one of its children
    /// outranks it (the key went up).
    pub fn update_key<A>(&mut self, arena: &mut A, item: H)
    where
        A: HeapArena<Handle = H> + ?Sized,
    {
        assert!(
            self.contains(&*arena, item),
            "update_key on {:?}, which is not queued",
            item
        );
        let start = arena.heap_index(item);
        let index = self.sift_up(arena, start);

        for child in [2 * index + 1, 2 * index + 2] {
            if let Some(&other) = self.slots.get(child) {
                assert!(
                    arena.compare(other, item) != Ordering::Less,
                    "update_key raised the key of {:?}; keys may only decrease",
                    item
                );
            }
        }
    }

    fn sift_up<A>(&mut self, arena: &mut A, mut index: usize) -> usize
    where
        A: HeapArena<Handle = H> + ?Sized,
    {
        while index > 0 {
            let parent = (index - 1) / 2;
            if arena.compare(self.slots[index], self.slots[parent]) == Ordering::Less {
                self.swap(arena, index, parent);
                index = parent;
            } else {
                break;
            }
        }
        index
    }

    fn sift_down<A>(&mut self, arena: &mut A, mut index: usize)
    where
        A: HeapArena<Handle = H> + ?Sized,
    {
        let len = self.slots.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                return;
            }
            let right = left + 1;
            let mut best = left;
            if right < len && arena.compare(self.slots[right], self.slots[left]) == Ordering::Less {
                best = right;
            }

            if arena.compare(self.slots[best], self.slots[index]) == Ordering::Less {
                self.swap(arena, index, best);
                index = best;
            } else {
                return;
            }
        }
    }

    fn swap<A>(&mut self, arena: &mut A, a: usize, b: usize)
    where
        A: HeapArena<Handle = H> + ?Sized,
    {
        self.slots.swap(a, b);
        arena.set_heap_index(self.slots[a], a);
        arena.set_heap_index(self.slots[b], b);
    }
}
