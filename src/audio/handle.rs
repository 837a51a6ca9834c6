use std::{cell::Cell, fmt};

/*
Buffer Handles
==============

A handle is a view into one slot of the pool plus a pointer to that slot's
reference count. The pool hands a slot out again only once its count is back
at zero, so the count is the whole ownership story:

  construct / clone   count += 1
  drop / release()    count -= 1   (release() also nulls the handle)
  slice()             new handle over a sub-range, same count cell, += 1

  pool slot 3:  [..........................................]   count = 2
                 ^ parent handle (0..256)
                                     ^ slice (128..256)

Moving a handle in Rust already leaves nothing behind to decrement. When a
handle lives in a field and needs to be moved out, `std::mem::take` leaves
the null handle in its place.

Samples are `Cell<f32>`: two handles (a parent and its slice, or an envelope
and the buffer it was redirected from) may point at the same storage, and
both are allowed to write. Everything happens on one thread, so no atomics.
*/

/// Reference-counted view into one slot of a [`BufferPool`](super::BufferPool).
///
/// The lifetime ties the handle to the pool it came from: the pool cannot be
/// resized or dropped while any handle is alive.
pub struct BufferHandle<'p> {
    data: &'p [Cell<f32>],
    count: Option<&'p Cell<u32>>,
}

impl<'p> BufferHandle<'p> {
    pub(crate) fn new(data: &'p [Cell<f32>], count: &'p Cell<u32>) -> Self {
        count.set(count.get() + 1);
        Self {
            data,
            count: Some(count),
        }
    }

    /// A handle that references nothing. Dropping it is a no-op.
    pub const fn null() -> Self {
        Self {
            data: &[],
            count: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.count.is_none()
    }

    /// Live references to the underlying slot, or 0 for a null handle.
    pub fn reference_count(&self) -> u32 {
        self.count.map_or(0, Cell::get)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Give the slot back early so a later stage can reuse it in the same block.
    ///
    /// The handle is null afterwards; releasing it again does nothing.
    pub fn release(&mut self) {
        if let Some(count) = self.count.take() {
            count.set(count.get() - 1);
        }
        self.data = &[];
    }

    /// A handle over `idx..idx + length` of the same slot.
    ///
    /// `None` for `length` means "to the end". The slice keeps the slot alive
    /// on its own, even after the parent is released.
    ///
    /// # Panics
    ///
    /// If the range falls outside this handle.
    pub fn slice(&self, idx: usize, length: impl Into<Option<usize>>) -> Self {
        let Some(count) = self.count else {
            return Self::null();
        };
        let length = length.into().unwrap_or(self.data.len() - idx);
        Self::new(&self.data[idx..idx + length], count)
    }

    /// True when both handles keep the same pool slot alive.
    pub fn shares_slot_with(&self, other: &BufferHandle<'_>) -> bool {
        match (self.count, other.count) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            _ => false,
        }
    }

    /// The samples as cells, for loops that write through shared views.
    pub fn cells(&self) -> &'p [Cell<f32>] {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize) -> f32 {
        self.data[i].get()
    }

    #[inline]
    pub fn set(&self, i: usize, value: f32) {
        self.data[i].set(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + 'p {
        self.data.iter().map(Cell::get)
    }

    pub fn fill(&self, value: f32) {
        for sample in self.data {
            sample.set(value);
        }
    }

    /// Zero the visible range.
    pub fn clear(&self) {
        self.fill(0.0);
    }

    pub fn scale(&self, gain: f32) {
        for sample in self.data {
            sample.set(sample.get() * gain);
        }
    }

    /// Copy `source` into the front of the handle. Extra samples on either
    /// side are left alone.
    pub fn copy_from_slice(&self, source: &[f32]) {
        for (sample, &value) in self.data.iter().zip(source) {
            sample.set(value);
        }
    }

    pub fn copy_to_slice(&self, dest: &mut [f32]) {
        for (out, sample) in dest.iter_mut().zip(self.data) {
            *out = sample.get();
        }
    }

    /// Raw pointer to the first visible sample, for tight DSP loops.
    ///
    /// Valid for `len()` samples while the handle is alive. Other handles may
    /// alias the same memory.
    pub fn as_ptr(&self) -> *mut f32 {
        self.data.as_ptr().cast::<f32>().cast_mut()
    }
}

impl Clone for BufferHandle<'_> {
    fn clone(&self) -> Self {
        match self.count {
            Some(count) => Self::new(self.data, count),
            None => Self::null(),
        }
    }
}

impl Drop for BufferHandle<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl Default for BufferHandle<'_> {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for BufferHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle")
            .field("len", &self.len())
            .field("reference_count", &self.reference_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::audio::BufferPool;

    #[test]
    fn test_clone_and_drop_adjust_count_by_one() {
        let pool = BufferPool::new(16);
        let handle = pool.allocate();
        assert_eq!(handle.reference_count(), 1);

        let copy = handle.clone();
        assert_eq!(handle.reference_count(), 2);

        drop(copy);
        assert_eq!(handle.reference_count(), 1);
    }

    #[test]
    fn test_release_nulls_handle_and_is_idempotent() {
        let pool = BufferPool::new(16);
        let keeper = pool.allocate();
        let mut handle = keeper.clone();
        assert_eq!(keeper.reference_count(), 2);

        handle.release();
        assert!(handle.is_null());
        assert!(handle.is_empty());
        assert_eq!(keeper.reference_count(), 1);

        // A second release and the eventual drop are both no-ops
        handle.release();
        drop(handle);
        assert_eq!(keeper.reference_count(), 1);
    }

    #[test]
    fn test_take_leaves_null_behind() {
        let pool = BufferPool::new(16);
        let mut slot = pool.allocate();
        let moved = std::mem::take(&mut slot);

        assert!(slot.is_null());
        assert_eq!(moved.reference_count(), 1);
    }

    #[test]
    fn test_slice_shares_storage_and_count() {
        let pool = BufferPool::new(8);
        let handle = pool.allocate_clear();
        let tail = handle.slice(4, None);

        assert_eq!(tail.len(), 4);
        assert!(tail.shares_slot_with(&handle));
        assert_eq!(handle.reference_count(), 2);

        tail.set(0, 0.5);
        assert_eq!(handle.get(4), 0.5);

        drop(tail);
        assert_eq!(handle.reference_count(), 1);
    }

    #[test]
    fn test_slice_outlives_released_parent() {
        let pool = BufferPool::with_capacity(1, 8);
        let mut parent = pool.allocate();
        let middle = parent.slice(2, 4);

        parent.release();
        assert_eq!(middle.reference_count(), 1);
        assert_eq!(pool.in_use(), 1);

        drop(middle);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_slicing_null_handle_stays_null() {
        let handle = super::BufferHandle::null();
        let slice = handle.slice(0, None);
        assert!(slice.is_null());
        assert_eq!(slice.reference_count(), 0);
    }

    #[test]
    fn test_clear_only_touches_visible_range() {
        let pool = BufferPool::new(4);
        let handle = pool.allocate();
        handle.fill(1.0);

        handle.slice(2, None).clear();

        assert_eq!(handle.iter().collect::<Vec<_>>(), vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_raw_pointer_writes_are_visible() {
        let pool = BufferPool::new(4);
        let handle = pool.allocate_clear();
        let ptr = handle.as_ptr();

        // SAFETY: the handle is alive and covers four samples
        unsafe { *ptr.add(3) = 0.25 };

        assert_eq!(handle.get(3), 0.25);
    }
}
