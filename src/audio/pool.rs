use std::cell::Cell;

use crate::{audio::handle::BufferHandle, DEFAULT_POOL_CAPACITY};

/// Fixed bank of equally sized sample buffers.
///
/// Slots are handed out first-fit as [`BufferHandle`]s. The pool never grows:
/// running out of slots means the signal graph holds more buffers than it was
/// sized for, and that is a bug, so [`BufferPool::allocate`] panics instead of
/// returning an aliased or empty buffer.
///
/// Reference counts live in `Cell`s. The pool is meant to be used from the
/// audio thread only and does no atomic operations.
pub struct BufferPool {
    samples: Box<[Cell<f32>]>,
    counts: Box<[Cell<u32>]>,
    buffer_size: usize,
    high_water: Cell<usize>,
}

impl BufferPool {
    /// Pool with [`DEFAULT_POOL_CAPACITY`] slots of `buffer_size` samples.
    pub fn new(buffer_size: usize) -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY, buffer_size)
    }

    pub fn with_capacity(capacity: usize, buffer_size: usize) -> Self {
        assert!(capacity > 0, "buffer pool needs at least one slot");

        Self {
            samples: zeroed(capacity * buffer_size),
            counts: (0..capacity).map(|_| Cell::new(0)).collect(),
            buffer_size,
            high_water: Cell::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.counts.len()
    }

    /// Length of every slot, in samples.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Slots currently referenced by at least one handle.
    pub fn in_use(&self) -> usize {
        self.counts.iter().filter(|c| c.get() > 0).count()
    }

    /// Highest slot index ever handed out, plus one, since the last resize.
    /// With first-fit allocation this is the peak number of live slots.
    pub fn high_water_mark(&self) -> usize {
        self.high_water.get()
    }

    /// Hand out the first free slot. Contents are whatever the last user left.
    ///
    /// # Panics
    ///
    /// When every slot is referenced.
    pub fn allocate(&self) -> BufferHandle<'_> {
        for (index, count) in self.counts.iter().enumerate() {
            if count.get() == 0 {
                if index >= self.high_water.get() {
                    self.high_water.set(index + 1);
                }
                let start = index * self.buffer_size;
                let data = &self.samples[start..start + self.buffer_size];
                return BufferHandle::new(data, count);
            }
        }
        self.exhausted()
    }

    /// [`allocate`](Self::allocate), then zero the slot.
    pub fn allocate_clear(&self) -> BufferHandle<'_> {
        let handle = self.allocate();
        handle.clear();
        handle
    }

    /// Reserve `K` independent slots at once.
    pub fn allocate_multi<const K: usize>(&self) -> [BufferHandle<'_>; K] {
        std::array::from_fn(|_| self.allocate())
    }

    pub fn allocate_multi_clear<const K: usize>(&self) -> [BufferHandle<'_>; K] {
        std::array::from_fn(|_| self.allocate_clear())
    }

    /// Rebuild the bank for blocks of `buffer_size` samples.
    ///
    /// Handles borrow the pool, so this can only be called once they are all
    /// gone. Counts left over from leaked handles are reset.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        let leaked = self.in_use();
        if leaked > 0 {
            tracing::warn!(leaked, "resetting buffer pool with leaked handles");
        }

        self.samples = zeroed(self.capacity() * buffer_size);
        for count in self.counts.iter() {
            count.set(0);
        }
        self.buffer_size = buffer_size;
        self.high_water.set(0);

        tracing::info!(buffer_size, capacity = self.capacity(), "buffer pool resized");
    }

    #[cold]
    #[inline(never)]
    fn exhausted(&self) -> ! {
        tracing::error!(
            capacity = self.capacity(),
            "no free audio buffers, the signal graph holds more buffers than the pool has"
        );
        panic!(
            "buffer pool exhausted: all {} slots are in use",
            self.capacity()
        );
    }
}

fn zeroed(len: usize) -> Box<[Cell<f32>]> {
    (0..len).map(|_| Cell::new(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit_reuses_lowest_free_slot() {
        let pool = BufferPool::with_capacity(3, 4);
        let a = pool.allocate();
        let mut b = pool.allocate();
        let c = pool.allocate();

        b.release();
        let d = pool.allocate();

        assert!(!d.shares_slot_with(&a));
        assert!(!d.shares_slot_with(&c));
        // Slot 1 starts one buffer after slot 0
        assert_eq!(d.as_ptr(), a.as_ptr().wrapping_add(4));
    }

    #[test]
    fn test_allocate_clear_zeroes_recycled_slot() {
        let pool = BufferPool::with_capacity(1, 4);
        let dirty = pool.allocate();
        dirty.fill(0.9);
        drop(dirty);

        let clean = pool.allocate_clear();
        assert!(clean.iter().all(|s| s == 0.0));
    }

    #[test]
    fn test_allocate_multi_gives_distinct_slots() {
        let pool = BufferPool::new(4);
        let [a, b, c] = pool.allocate_multi::<3>();

        assert!(!a.shares_slot_with(&b));
        assert!(!b.shares_slot_with(&c));
        assert!(!a.shares_slot_with(&c));
        assert_eq!(pool.in_use(), 3);
    }

    #[test]
    fn test_high_water_mark_tracks_peak() {
        let pool = BufferPool::new(4);
        {
            let _pair = pool.allocate_multi::<2>();
        }
        let _one = pool.allocate();

        assert_eq!(pool.high_water_mark(), 2);
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn test_set_buffer_size_resizes_every_slot() {
        let mut pool = BufferPool::new(64);
        pool.set_buffer_size(128);

        let handle = pool.allocate();
        assert_eq!(handle.len(), 128);
        assert_eq!(pool.buffer_size(), 128);
    }

    #[test]
    fn test_set_buffer_size_resets_leaked_counts() {
        let mut pool = BufferPool::with_capacity(2, 8);
        std::mem::forget(pool.allocate());
        assert_eq!(pool.in_use(), 1);

        pool.set_buffer_size(8);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    #[should_panic(expected = "buffer pool exhausted")]
    fn test_exhaustion_panics() {
        let pool = BufferPool::with_capacity(2, 8);
        let _held = pool.allocate_multi::<2>();
        let _ = pool.allocate();
    }
}
