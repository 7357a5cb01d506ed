//! Capability contracts for owned element storage.
//!
//! [`StorageOwner`] is implemented by anything that exclusively owns a single
//! contiguous block of `T`. [`WriteBuffer`] adds a write cursor bounded by
//! `[0, len]`. Algorithms written against these traits work unchanged over a
//! fixed-size buffer and over an auto-growing one; only the behavior on a
//! write past the current length differs.

use holdfast_common::Result;

/// An exclusive owner of a contiguous block of `T`.
///
/// The allocation is absent if and only if `len() == 0`.
pub trait StorageOwner<T> {
    /// Returns the whole owned block, `[0, len)`.
    fn as_slice(&self) -> &[T];

    /// Returns the whole owned block, `[0, len)`, mutably.
    fn as_mut_slice(&mut self) -> &mut [T];

    /// Releases the allocation and resets the owner to the empty state.
    ///
    /// Calling `free` on an already empty owner is a no-op.
    fn free(&mut self);

    /// Number of elements in the owned block.
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when an allocation is held.
    #[inline]
    fn has_storage(&self) -> bool {
        !self.is_empty()
    }

    /// Size of the owned block in bytes (`len() * size_of::<T>()`).
    #[inline]
    fn size(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }

    /// Returns a pointer to the first element, or null when no allocation is held.
    #[inline]
    fn as_ptr(&self) -> *const T {
        if self.has_storage() {
            self.as_slice().as_ptr()
        } else {
            std::ptr::null()
        }
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if no allocation is held or `index` is out of range.
    #[inline]
    #[track_caller]
    fn at(&self, index: usize) -> &T {
        let len = self.len();
        assert!(len != 0, "access to element {index} of an absent allocation");
        assert!(index < len, "index {index} out of range for length {len}");
        &self.as_slice()[index]
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if no allocation is held or `index` is out of range.
    #[inline]
    #[track_caller]
    fn at_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        assert!(len != 0, "access to element {index} of an absent allocation");
        assert!(index < len, "index {index} out of range for length {len}");
        &mut self.as_mut_slice()[index]
    }

    /// Compares the owned block element-wise with the first `len` elements of `other`.
    ///
    /// An absent `other` matches only an empty owner. Identical pointers compare
    /// equal without inspecting the elements.
    ///
    /// # Panics
    ///
    /// Panics if `other` holds fewer than `len` elements.
    fn compare_raw(&self, other: Option<&[T]>, len: usize) -> bool
    where
        T: PartialEq,
    {
        if len != self.len() {
            return false;
        }
        match other {
            None => len == 0,
            Some(other) => {
                assert!(
                    other.len() >= len,
                    "compared slice holds {} elements, expected at least {len}",
                    other.len()
                );
                let other = &other[..len];
                std::ptr::eq(other.as_ptr(), self.as_ptr()) || other == self.as_slice()
            }
        }
    }

    /// Compares the owned block element-wise with the block of another owner.
    fn compare<O>(&self, other: &O) -> bool
    where
        Self: Sized,
        O: StorageOwner<T> + ?Sized,
        T: PartialEq,
    {
        let other_slice = other.has_storage().then(|| other.as_slice());
        self.compare_raw(other_slice, other.len())
    }
}

/// A [`StorageOwner`] with a write cursor.
///
/// The cursor always stays within `[0, len]` and moves only through the
/// `write*` methods, [`set_write_position`](WriteBuffer::set_write_position)
/// and [`reset_write_position`](WriteBuffer::reset_write_position).
///
/// Each individual `write*` call is all-or-nothing: on failure, neither the
/// cursor nor the contents are modified. Sequences of writes, such as
/// [`write_iter`], carry no such guarantee.
pub trait WriteBuffer<T>: StorageOwner<T> {
    /// Position at which the next write begins.
    fn write_position(&self) -> usize;

    /// Writes a single element at the cursor and advances it by one.
    fn write(&mut self, elem: T) -> Result<()>;

    /// Clones `len` elements from `src` to the cursor and advances it by `len`.
    ///
    /// A zero-length write is a successful no-op. An absent `src` with a nonzero
    /// `len` fails with an invalid argument error.
    fn write_many(&mut self, src: Option<&[T]>, len: usize) -> Result<()>
    where
        T: Clone;

    /// Moves all elements of `src` to the cursor and advances it by `src.len()`.
    ///
    /// On success, `src` receives the values previously held by the target slots.
    /// On failure, `src` is untouched.
    fn write_many_moved(&mut self, src: &mut [T]) -> Result<()>;

    /// Places the cursor at `pos`, which must not exceed `len()`.
    fn set_write_position(&mut self, pos: usize) -> Result<()>;

    /// Places the cursor at the beginning of the buffer.
    fn reset_write_position(&mut self);

    /// Writes the contents of another buffer: its written part `[0, write_position)`
    /// when `up_to_write_position` is set, otherwise its whole block.
    fn write_from<B>(&mut self, other: &B, up_to_write_position: bool) -> Result<()>
    where
        Self: Sized,
        B: WriteBuffer<T> + ?Sized,
        T: Clone,
    {
        let len = if up_to_write_position {
            other.write_position()
        } else {
            other.len()
        };
        let src = (len != 0).then(|| &other.as_slice()[..len]);
        self.write_many(src, len)
    }

    /// Number of elements that fit between the cursor and the end of the block.
    #[inline]
    fn remaining(&self) -> usize {
        self.len() - self.write_position()
    }

    /// Returns the written part of the block, `[0, write_position)`.
    #[inline]
    fn written(&self) -> &[T] {
        &self.as_slice()[..self.write_position()]
    }
}

/// Writes every element yielded by `iter` into `buf`, returning the number of
/// elements written.
///
/// If any write fails, the cursor is restored to where it was before the call
/// and the error is returned. Only the cursor is restored: slots already
/// overwritten by the call keep the new values, and a buffer that grew keeps
/// its larger block.
pub fn write_iter<T, B, I>(buf: &mut B, iter: I) -> Result<usize>
where
    B: WriteBuffer<T> + ?Sized,
    I: IntoIterator<Item = T>,
{
    let start = buf.write_position();
    for elem in iter {
        if let Err(e) = buf.write(elem) {
            buf.set_write_position(start)?;
            return Err(e);
        }
    }
    Ok(buf.write_position() - start)
}
