//! `GrowableBuffer`: a write-cursor buffer that reallocates when it runs out of room.
//!
//! Growth is a two-phase operation. A replacement block is allocated and fully
//! populated first: the new elements are written at the cursor position, then
//! the already written elements are moved over. Only then is the replacement
//! swapped in. Anything that fails before the swap (allocation, the growth
//! limit, or a panicking `Clone`) leaves the original buffer exactly as it was.

use holdfast_common::{Result, error::Error};
use holdfast_common_traits::{
    buffer::{StorageOwner, WriteBuffer},
    memory_owner::{MemoryAllocation, MemoryOwner},
};

use crate::{
    alloc::{self, Block},
    bounded::BoundedBuffer,
    policy::GrowthPolicy,
    storage::OwnedStorage,
};

/// A [`BoundedBuffer`] whose writes grow the block instead of failing.
///
/// The length of each replacement block is decided by the buffer's
/// [`GrowthPolicy`].
pub struct GrowableBuffer<T> {
    inner: BoundedBuffer<T>,
    policy: GrowthPolicy,
}

impl<T> GrowableBuffer<T> {
    /// Creates a buffer without an allocation, using the default policy.
    pub const fn new() -> GrowableBuffer<T> {
        GrowableBuffer {
            inner: BoundedBuffer::new(),
            policy: GrowthPolicy::DEFAULT,
        }
    }

    /// Allocates a buffer of `len` default-initialized elements, using the
    /// default policy.
    pub fn with_len(len: usize) -> Result<GrowableBuffer<T>>
    where
        T: Default,
    {
        GrowableBuffer::with_policy(len, GrowthPolicy::DEFAULT)
    }

    /// Allocates a buffer of `len` default-initialized elements, using `policy`.
    pub fn with_policy(len: usize, policy: GrowthPolicy) -> Result<GrowableBuffer<T>>
    where
        T: Default,
    {
        policy.check_len(len)?;
        Ok(GrowableBuffer {
            inner: BoundedBuffer::with_len(len)?,
            policy,
        })
    }

    /// Creates a buffer holding clones of the first `len` elements of `src`,
    /// with the cursor at the beginning.
    ///
    /// # Panics
    ///
    /// Panics if exactly one of `src.is_none()` and `len == 0` holds.
    #[track_caller]
    pub fn from_raw_copy(src: Option<&[T]>, len: usize) -> Result<GrowableBuffer<T>>
    where
        T: Clone,
    {
        BoundedBuffer::from_raw_copy(src, len).map(GrowableBuffer::from_bounded)
    }

    /// Takes ownership of the block held in `slot`, leaving `None` behind.
    #[track_caller]
    pub fn steal(slot: &mut Block<T>, len: usize) -> GrowableBuffer<T> {
        GrowableBuffer::from_bounded(BoundedBuffer::steal(slot, len))
    }

    /// Wraps `inner`, keeping its cursor, with the default policy.
    pub fn from_bounded(inner: BoundedBuffer<T>) -> GrowableBuffer<T> {
        GrowableBuffer {
            inner,
            policy: GrowthPolicy::DEFAULT,
        }
    }

    /// Consumes the buffer and returns the fixed-size buffer underneath.
    pub fn into_bounded(self) -> BoundedBuffer<T> {
        self.inner
    }

    #[inline]
    pub fn storage(&self) -> &OwnedStorage<T> {
        self.inner.storage()
    }

    #[inline]
    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Replaces the growth policy. The current block is kept even if it is
    /// longer than the new policy allows; the limit applies to future growth.
    pub fn set_policy(&mut self, policy: GrowthPolicy) {
        self.policy = policy;
    }

    /// Creates an independent deep copy, cursor and policy included.
    pub fn try_clone(&self) -> Result<GrowableBuffer<T>>
    where
        T: Clone,
    {
        Ok(GrowableBuffer {
            inner: self.inner.try_clone()?,
            policy: self.policy,
        })
    }

    /// Moves the block and cursor into a new buffer, leaving `self` empty.
    /// The policy is carried over to the new buffer and kept by `self`.
    pub fn take(&mut self) -> GrowableBuffer<T> {
        GrowableBuffer {
            inner: self.inner.take(),
            policy: self.policy,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    #[inline]
    pub fn get(&self) -> Option<&[T]> {
        self.inner.get()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.inner.as_mut_slice()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.inner.as_ptr()
    }

    #[inline]
    pub fn write_position(&self) -> usize {
        self.inner.write_position()
    }

    #[inline]
    pub fn written(&self) -> &[T] {
        self.inner.written()
    }

    #[inline]
    pub fn written_mut(&mut self) -> &mut [T] {
        self.inner.written_mut()
    }

    /// Releases the block and rewinds the cursor. Idempotent.
    pub fn free(&mut self) {
        self.inner.free();
    }

    /// Detaches the block without releasing it and rewinds the cursor.
    ///
    /// See [`OwnedStorage::reset`].
    #[must_use = "dropping the returned block releases it"]
    pub fn reset(&mut self) -> Block<T> {
        self.inner.reset()
    }
}

impl<T: Default> GrowableBuffer<T> {
    /// Makes room for at least `additional` elements past the cursor.
    ///
    /// The whole block moves, including elements past the cursor. On failure
    /// the buffer is left untouched.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.inner.remaining() >= additional {
            return Ok(());
        }
        let mut replacement = self.allocate_replacement(additional)?;
        let len = self.len();
        alloc::move_elements(
            &mut replacement.as_mut_slice()[..len],
            self.inner.as_mut_slice(),
        );
        replacement.set_write_position_unchecked(self.write_position());
        self.commit(replacement);
        Ok(())
    }

    /// Shrinks the block down to the written part.
    ///
    /// On failure the buffer is left untouched.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        let pos = self.write_position();
        if pos == self.len() {
            return Ok(());
        }
        let mut replacement = BoundedBuffer::with_len(pos)?;
        self.migrate_into(&mut replacement);
        replacement.set_write_position_unchecked(pos);
        self.commit(replacement);
        Ok(())
    }

    /// Allocates a block large enough to hold `count` more elements past the
    /// cursor, sized by the growth policy.
    fn allocate_replacement(&self, count: usize) -> Result<BoundedBuffer<T>> {
        let len = self.len();
        let end = self
            .write_position()
            .checked_add(count)
            .ok_or_else(|| Error::capacity_limit(usize::MAX, usize::MAX))?;
        debug_assert!(end > len);
        let new_len = self.policy.next_len(len, end - len)?;
        BoundedBuffer::with_len(new_len)
    }

    /// Moves the written elements `[0, write_position)` into the beginning of
    /// `replacement`. Cannot fail.
    fn migrate_into(&mut self, replacement: &mut BoundedBuffer<T>) {
        let pos = self.write_position();
        alloc::move_elements(
            &mut replacement.as_mut_slice()[..pos],
            self.inner.written_mut(),
        );
    }

    /// Swaps in a fully populated replacement, releasing the old block.
    fn commit(&mut self, replacement: BoundedBuffer<T>) {
        log::trace!(
            "buffer block replaced: {} -> {} elements, write position {}",
            self.len(),
            replacement.len(),
            replacement.write_position()
        );
        self.inner = replacement;
    }
}

impl<T> StorageOwner<T> for GrowableBuffer<T> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self.inner.as_mut_slice()
    }

    #[inline]
    fn free(&mut self) {
        self.inner.free()
    }

    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T: Default> WriteBuffer<T> for GrowableBuffer<T> {
    #[inline]
    fn write_position(&self) -> usize {
        self.inner.write_position()
    }

    fn write(&mut self, elem: T) -> Result<()> {
        if !self.inner.is_full() {
            return self.inner.write(elem);
        }
        let pos = self.write_position();
        let mut replacement = self.allocate_replacement(1)?;
        replacement.as_mut_slice()[pos] = elem;
        self.migrate_into(&mut replacement);
        replacement.set_write_position_unchecked(pos + 1);
        self.commit(replacement);
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
        if self.inner.remaining() >= len {
            return self.inner.write_many(Some(src), len);
        }
        let pos = self.write_position();
        let mut replacement = self.allocate_replacement(len)?;
        alloc::copy_elements(&mut replacement.as_mut_slice()[pos..pos + len], src);
        self.migrate_into(&mut replacement);
        replacement.set_write_position_unchecked(pos + len);
        self.commit(replacement);
        Ok(())
    }

    fn write_many_moved(&mut self, src: &mut [T]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        let len = src.len();
        if self.inner.remaining() >= len {
            return self.inner.write_many_moved(src);
        }
        let pos = self.write_position();
        let mut replacement = self.allocate_replacement(len)?;
        alloc::move_elements(&mut replacement.as_mut_slice()[pos..pos + len], src);
        self.migrate_into(&mut replacement);
        replacement.set_write_position_unchecked(pos + len);
        self.commit(replacement);
        Ok(())
    }

    #[inline]
    fn set_write_position(&mut self, pos: usize) -> Result<()> {
        self.inner.set_write_position(pos)
    }

    #[inline]
    fn reset_write_position(&mut self) {
        self.inner.reset_write_position()
    }
}

unsafe impl<T> MemoryOwner for GrowableBuffer<T> {
    fn memory(&self) -> MemoryAllocation {
        self.inner.memory()
    }
}

impl<T: Clone> Clone for GrowableBuffer<T> {
    /// Deep copy. If the copy cannot be allocated, the result is the empty buffer.
    fn clone(&self) -> GrowableBuffer<T> {
        GrowableBuffer {
            inner: self.inner.clone(),
            policy: self.policy,
        }
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        GrowableBuffer::new()
    }
}

impl<T> std::ops::Index<usize> for GrowableBuffer<T> {
    type Output = T;

    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &T {
        self.at(index)
    }
}

impl<T> std::ops::IndexMut<usize> for GrowableBuffer<T> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.at_mut(index)
    }
}

impl<T: PartialEq> PartialEq for GrowableBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> From<BoundedBuffer<T>> for GrowableBuffer<T> {
    fn from(inner: BoundedBuffer<T>) -> Self {
        GrowableBuffer::from_bounded(inner)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for GrowableBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("values", &self.written())
            .field("write_pos", &self.write_position())
            .field("len", &self.len())
            .field("policy", &self.policy)
            .finish()
    }
}
