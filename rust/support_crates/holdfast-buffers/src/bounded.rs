//! `BoundedBuffer`: an owned block with a write cursor that never reallocates.

use holdfast_common::{Result, result};
use holdfast_common_traits::{
    buffer::{StorageOwner, WriteBuffer},
    memory_owner::{MemoryAllocation, MemoryOwner},
};

use crate::{
    alloc::{self, Block},
    storage::OwnedStorage,
};

/// An [`OwnedStorage`] with a write cursor in `[0, len]`.
///
/// Writes past the end of the block fail with `BufferFull` and leave the buffer
/// untouched; nothing on the write path allocates.
pub struct BoundedBuffer<T> {
    storage: OwnedStorage<T>,
    write_pos: usize,
}

impl<T> BoundedBuffer<T> {
    /// Creates a buffer without an allocation.
    pub const fn new() -> BoundedBuffer<T> {
        BoundedBuffer {
            storage: OwnedStorage::new(),
            write_pos: 0,
        }
    }

    /// Allocates a buffer of `len` default-initialized elements, with the cursor
    /// at the beginning.
    pub fn with_len(len: usize) -> Result<BoundedBuffer<T>>
    where
        T: Default,
    {
        OwnedStorage::with_len(len).map(BoundedBuffer::from_storage)
    }

    /// Creates a buffer holding clones of the first `len` elements of `src`,
    /// with the cursor at the beginning.
    ///
    /// # Panics
    ///
    /// Panics if exactly one of `src.is_none()` and `len == 0` holds.
    #[track_caller]
    pub fn from_raw_copy(src: Option<&[T]>, len: usize) -> Result<BoundedBuffer<T>>
    where
        T: Clone,
    {
        OwnedStorage::from_raw_copy(src, len).map(BoundedBuffer::from_storage)
    }

    /// Takes ownership of the block held in `slot`, leaving `None` behind.
    ///
    /// # Panics
    ///
    /// Same contract as [`OwnedStorage::steal`].
    #[track_caller]
    pub fn steal(slot: &mut Block<T>, len: usize) -> BoundedBuffer<T> {
        BoundedBuffer::from_storage(OwnedStorage::steal(slot, len))
    }

    /// Wraps `storage`, with the cursor at the beginning.
    pub fn from_storage(storage: OwnedStorage<T>) -> BoundedBuffer<T> {
        BoundedBuffer {
            storage,
            write_pos: 0,
        }
    }

    /// Consumes the buffer and returns its storage; the cursor is discarded.
    pub fn into_storage(self) -> OwnedStorage<T> {
        self.storage
    }

    #[inline]
    pub fn storage(&self) -> &OwnedStorage<T> {
        &self.storage
    }

    /// Creates an independent deep copy, cursor included.
    pub fn try_clone(&self) -> Result<BoundedBuffer<T>>
    where
        T: Clone,
    {
        Ok(BoundedBuffer {
            storage: self.storage.try_clone()?,
            write_pos: self.write_pos,
        })
    }

    /// Settles the outcome of a copy of a buffer of `len` elements: a failed
    /// copy becomes the empty buffer.
    pub(crate) fn collapse(len: usize, copy: Result<BoundedBuffer<T>>) -> BoundedBuffer<T> {
        copy.unwrap_or_else(|e| {
            log::debug!("clone of a buffer of {len} elements collapsed to empty: {e}");
            BoundedBuffer::new()
        })
    }

    /// Moves the block and cursor into a new buffer, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> BoundedBuffer<T> {
        std::mem::take(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.storage.size()
    }

    #[inline]
    pub fn get(&self) -> Option<&[T]> {
        self.storage.get()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr()
    }

    #[inline]
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Returns `true` when the cursor is at the end of the block.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.write_pos == self.len()
    }

    /// Returns the written part of the block, `[0, write_position)`.
    #[inline]
    pub fn written(&self) -> &[T] {
        &self.storage.as_slice()[..self.write_pos]
    }

    /// Returns the written part of the block mutably.
    #[inline]
    pub fn written_mut(&mut self) -> &mut [T] {
        let pos = self.write_pos;
        &mut self.storage.as_mut_slice()[..pos]
    }

    /// Releases the block and rewinds the cursor. Idempotent.
    pub fn free(&mut self) {
        self.storage.free();
        self.write_pos = 0;
    }

    /// Detaches the block without releasing it and rewinds the cursor.
    ///
    /// See [`OwnedStorage::reset`].
    #[must_use = "dropping the returned block releases it"]
    pub fn reset(&mut self) -> Block<T> {
        self.write_pos = 0;
        self.storage.reset()
    }

    /// Copies `src` to the cursor as raw bytes and advances the cursor.
    pub fn write_pod_many(&mut self, src: &[T]) -> Result<()>
    where
        T: bytemuck::Pod,
    {
        let end = self.reserve_range(src.len())?;
        let pos = self.write_pos;
        alloc::copy_pod_elements(&mut self.storage.as_mut_slice()[pos..end], src);
        self.write_pos = end;
        Ok(())
    }

    /// Returns the end of the range `[write_pos, write_pos + count)` when it fits
    /// within the block.
    #[inline]
    fn reserve_range(&self, count: usize) -> Result<usize> {
        result::verify_fits(self.write_pos, count, self.len())
    }

    /// Places the cursor without validation.
    ///
    /// The caller guarantees `pos <= len`.
    #[inline]
    pub(crate) fn set_write_position_unchecked(&mut self, pos: usize) {
        debug_assert!(pos <= self.len());
        self.write_pos = pos;
    }
}

impl<T> StorageOwner<T> for BoundedBuffer<T> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    #[inline]
    fn free(&mut self) {
        BoundedBuffer::free(self)
    }

    #[inline]
    fn len(&self) -> usize {
        self.storage.len()
    }
}

impl<T> WriteBuffer<T> for BoundedBuffer<T> {
    #[inline]
    fn write_position(&self) -> usize {
        self.write_pos
    }

    fn write(&mut self, elem: T) -> Result<()> {
        let end = self.reserve_range(1)?;
        self.storage.as_mut_slice()[self.write_pos] = elem;
        self.write_pos = end;
        Ok(())
    }

    fn write_many(&mut self, src: Option<&[T]>, len: usize) -> Result<()>
    where
        T: Clone,
    {
        let src = alloc::resolve_source(src, len)?;
        if src.is_empty() {
            return Ok(());
        }
        let end = self.reserve_range(len)?;
        let pos = self.write_pos;
        alloc::copy_elements(&mut self.storage.as_mut_slice()[pos..end], src);
        self.write_pos = end;
        Ok(())
    }

    fn write_many_moved(&mut self, src: &mut [T]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        let end = self.reserve_range(src.len())?;
        let pos = self.write_pos;
        alloc::move_elements(&mut self.storage.as_mut_slice()[pos..end], src);
        self.write_pos = end;
        Ok(())
    }

    fn set_write_position(&mut self, pos: usize) -> Result<()> {
        result::verify_position(pos, self.len())?;
        self.write_pos = pos;
        Ok(())
    }

    #[inline]
    fn reset_write_position(&mut self) {
        self.write_pos = 0;
    }
}

unsafe impl<T> MemoryOwner for BoundedBuffer<T> {
    fn memory(&self) -> MemoryAllocation {
        let mut memory = self.storage.memory();
        memory.len = self.write_pos * std::mem::size_of::<T>();
        memory
    }
}

impl<T: Clone> Clone for BoundedBuffer<T> {
    /// Deep copy. If the copy cannot be allocated, the result is the empty buffer.
    fn clone(&self) -> BoundedBuffer<T> {
        BoundedBuffer::collapse(self.len(), self.try_clone())
    }
}

impl<T> Default for BoundedBuffer<T> {
    fn default() -> Self {
        BoundedBuffer::new()
    }
}

impl<T> std::ops::Index<usize> for BoundedBuffer<T> {
    type Output = T;

    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &T {
        self.at(index)
    }
}

impl<T> std::ops::IndexMut<usize> for BoundedBuffer<T> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.at_mut(index)
    }
}

impl<T: PartialEq> PartialEq for BoundedBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.write_pos == other.write_pos && self.storage == other.storage
    }
}

impl<T> From<OwnedStorage<T>> for BoundedBuffer<T> {
    fn from(storage: OwnedStorage<T>) -> Self {
        BoundedBuffer::from_storage(storage)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("values", &self.written())
            .field("write_pos", &self.write_pos)
            .field("len", &self.len())
            .finish()
    }
}
