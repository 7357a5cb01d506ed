//! `MemoryOwner`: A trait for types that exclusively own a single allocation.

/// A trait for types that exclusively own a single contiguous allocation.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - The memory described by `memory()` remains valid until the owner is
///   mutated, moved from, or dropped.
/// - Memory is exclusively owned by the `MemoryOwner` instance; no other live
///   owner refers to the same block.
/// - `ptr` is null if and only if `capacity` is zero.
/// - `len` never exceeds `capacity`.
/// - The reported length, capacity and alignment are accurate.
pub unsafe trait MemoryOwner {
    /// Returns information about the owned memory block.
    fn memory(&self) -> MemoryAllocation;
}

/// Represents a block of allocated memory with its size information.
#[derive(Debug, Clone)]
pub struct MemoryAllocation {
    /// Pointer to the start of the allocated memory, null when nothing is allocated.
    pub ptr: *const u8,
    /// Length of the initialized (written) part of the block in bytes.
    pub len: usize,
    /// Total capacity of the allocated memory in bytes.
    pub capacity: usize,
    /// Formal alignment of the memory block.
    pub alignment: usize,
}

impl MemoryAllocation {
    /// Describes the absence of an allocation.
    pub fn empty(alignment: usize) -> MemoryAllocation {
        MemoryAllocation {
            ptr: std::ptr::null(),
            len: 0,
            capacity: 0,
            alignment,
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}
