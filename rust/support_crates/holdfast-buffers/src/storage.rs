//! `OwnedStorage`: the exclusive owner of a single contiguous block of elements.

use std::slice::SliceIndex;

use holdfast_common::Result;
use holdfast_common_traits::{
    buffer::StorageOwner,
    memory_owner::{MemoryAllocation, MemoryOwner},
};

use crate::alloc::{self, Block};

/// Exclusive owner of a contiguous block of `T`.
///
/// The block is absent if and only if the length is zero. Cloning always
/// produces an independent deep copy; [`take`](OwnedStorage::take) transfers
/// the block in O(1) and leaves the source empty. The block is released exactly
/// once, on [`free`](OwnedStorage::free) or when the owner is dropped.
pub struct OwnedStorage<T> {
    data: Block<T>,
}

impl<T> OwnedStorage<T> {
    /// Creates an owner without an allocation.
    pub const fn new() -> OwnedStorage<T> {
        OwnedStorage { data: None }
    }

    /// Allocates `len` default-initialized elements.
    ///
    /// A zero `len` yields the empty owner.
    pub fn with_len(len: usize) -> Result<OwnedStorage<T>>
    where
        T: Default,
    {
        Ok(OwnedStorage {
            data: alloc::allocate(len)?,
        })
    }

    /// Creates an owner holding clones of the first `len` elements of `src`.
    ///
    /// # Panics
    ///
    /// Panics if exactly one of `src.is_none()` and `len == 0` holds, or if `src`
    /// is shorter than `len`.
    #[track_caller]
    pub fn from_raw_copy(src: Option<&[T]>, len: usize) -> Result<OwnedStorage<T>>
    where
        T: Clone,
    {
        Ok(OwnedStorage {
            data: alloc::allocate_from_raw(src, len)?,
        })
    }

    /// Creates an owner holding clones of the `len` elements starting at `ptr`.
    ///
    /// # Safety
    ///
    /// When `ptr` is non-null it must be valid for reads of `len` initialized
    /// elements of `T`.
    ///
    /// # Panics
    ///
    /// Panics if exactly one of `ptr.is_null()` and `len == 0` holds.
    #[track_caller]
    pub unsafe fn from_raw_parts_copy(ptr: *const T, len: usize) -> Result<OwnedStorage<T>>
    where
        T: Clone,
    {
        Ok(OwnedStorage {
            data: unsafe { alloc::allocate_from_raw_parts(ptr, len)? },
        })
    }

    /// Takes ownership of the block held in `slot`, leaving `None` behind.
    ///
    /// # Panics
    ///
    /// Panics if exactly one of `slot.is_none()` and `len == 0` holds, or if the
    /// block does not hold exactly `len` elements.
    #[track_caller]
    pub fn steal(slot: &mut Block<T>, len: usize) -> OwnedStorage<T> {
        alloc::validate_raw_pair(slot.is_none(), len);
        if let Some(block) = slot.as_ref() {
            assert_eq!(block.len(), len, "stolen block length mismatch");
        }
        OwnedStorage { data: slot.take() }
    }

    /// Takes ownership of the elements of `vec`.
    pub fn from_vec(vec: Vec<T>) -> OwnedStorage<T> {
        if vec.is_empty() {
            OwnedStorage::new()
        } else {
            OwnedStorage {
                data: Some(vec.into_boxed_slice()),
            }
        }
    }

    /// Consumes the owner and returns its elements.
    pub fn into_vec(self) -> Vec<T> {
        self.data.map(Vec::from).unwrap_or_default()
    }

    /// Creates an independent deep copy.
    ///
    /// On failure, `self` is untouched and no partial copy is left behind.
    pub fn try_clone(&self) -> Result<OwnedStorage<T>>
    where
        T: Clone,
    {
        OwnedStorage::from_raw_copy(self.data.as_deref(), self.len())
    }

    /// Settles the outcome of a copy of `len` elements: a failed copy becomes
    /// the empty owner.
    pub(crate) fn collapse(len: usize, copy: Result<OwnedStorage<T>>) -> OwnedStorage<T> {
        copy.unwrap_or_else(|e| {
            log::debug!("clone of {len} elements collapsed to empty storage: {e}");
            OwnedStorage::new()
        })
    }

    /// Moves the block out into a new owner, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> OwnedStorage<T> {
        std::mem::take(self)
    }

    /// Returns the block, or `None` if nothing is allocated.
    #[inline]
    pub fn get(&self) -> Option<&[T]> {
        self.data.as_deref()
    }

    /// Returns the block, failing fast when nothing is allocated.
    ///
    /// # Panics
    ///
    /// Panics if the owner is empty.
    #[inline]
    #[track_caller]
    pub fn block(&self) -> &[T] {
        alloc::validate_not_null(self.get())
    }

    /// Returns the block mutably, or `None` if nothing is allocated.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut [T]> {
        self.data.as_deref_mut()
    }

    /// Number of elements in the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, |data| data.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Size of the block in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }

    /// Returns the block as a slice; empty when nothing is allocated.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Returns the block as a mutable slice; empty when nothing is allocated.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    /// Returns a pointer to the first element, or null when nothing is allocated.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data
            .as_deref()
            .map_or(std::ptr::null(), |data| data.as_ptr())
    }

    /// Releases the block. Freeing an empty owner is a no-op.
    #[inline]
    pub fn free(&mut self) {
        self.data = None;
    }

    /// Detaches the block without releasing it and hands it to the caller.
    ///
    /// The owner is left empty. This is the explicit hand-off used when the
    /// block is adopted by another owner, e.g. through [`OwnedStorage::steal`].
    #[must_use = "dropping the returned block releases it"]
    #[inline]
    pub fn reset(&mut self) -> Block<T> {
        self.data.take()
    }
}

impl<T> OwnedStorage<T>
where
    T: bytemuck::Pod,
{
    /// Returns the block as raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Compares the block byte-wise with `other`.
    pub fn bytes_eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && (std::ptr::eq(self.as_ptr(), other.as_ptr())
                || self.as_bytes() == bytemuck::cast_slice::<T, u8>(other))
    }
}

impl<T> StorageOwner<T> for OwnedStorage<T> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        OwnedStorage::as_slice(self)
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        OwnedStorage::as_mut_slice(self)
    }

    #[inline]
    fn free(&mut self) {
        OwnedStorage::free(self)
    }

    #[inline]
    fn len(&self) -> usize {
        OwnedStorage::len(self)
    }
}

unsafe impl<T> MemoryOwner for OwnedStorage<T> {
    fn memory(&self) -> MemoryAllocation {
        let alignment = std::mem::align_of::<T>();
        // Zero-sized elements occupy no memory.
        if self.size() == 0 {
            return MemoryAllocation::empty(alignment);
        }
        MemoryAllocation {
            ptr: self.as_ptr() as *const u8,
            len: self.size(),
            capacity: self.size(),
            alignment,
        }
    }
}

impl<T: Clone> Clone for OwnedStorage<T> {
    /// Deep copy. If the copy cannot be allocated, the result is the empty owner.
    fn clone(&self) -> OwnedStorage<T> {
        OwnedStorage::collapse(self.len(), self.try_clone())
    }
}

impl<T> Default for OwnedStorage<T> {
    fn default() -> Self {
        OwnedStorage::new()
    }
}

impl<T> std::ops::Deref for OwnedStorage<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> std::ops::DerefMut for OwnedStorage<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, I: SliceIndex<[T]>> std::ops::Index<I> for OwnedStorage<T> {
    type Output = I::Output;

    /// Indexes the block like a slice. Element access on an absent allocation
    /// panics; an empty range of an absent allocation is an empty slice.
    #[inline]
    #[track_caller]
    fn index(&self, index: I) -> &I::Output {
        match self.data.as_deref() {
            Some(block) => &block[index],
            None => alloc::validate_not_null(<[T]>::get(&[], index)),
        }
    }
}

impl<T, I: SliceIndex<[T]>> std::ops::IndexMut<I> for OwnedStorage<T> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: I) -> &mut I::Output {
        match self.data.as_deref_mut() {
            Some(block) => &mut block[index],
            None => alloc::validate_not_null_mut(<[T]>::get_mut(&mut [], index)),
        }
    }
}

impl<T: PartialEq> PartialEq for OwnedStorage<T> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl<T: Eq> Eq for OwnedStorage<T> {}

impl<T> From<Vec<T>> for OwnedStorage<T> {
    fn from(vec: Vec<T>) -> Self {
        OwnedStorage::from_vec(vec)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for OwnedStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedStorage")
            .field("values", &self.as_slice())
            .field("len", &self.len())
            .finish()
    }
}
