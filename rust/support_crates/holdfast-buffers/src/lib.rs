//! Owned element storage with exclusive ownership and explicit growth.
//!
//! Three layers share one representation, a single optional boxed block:
//!
//! - [`OwnedStorage`]: the exclusive owner of the block.
//! - [`BoundedBuffer`]: adds a write cursor; writes never allocate and fail
//!   once the block is full.
//! - [`GrowableBuffer`]: a write-cursor buffer that replaces its block with a
//!   larger one, sized by a [`GrowthPolicy`], when a write does not fit.
//!
//! All allocation goes through [`alloc`]. Every fallible buffer method is
//! all-or-nothing, and failures are reported through
//! [`holdfast_common::Result`]; contract violations (absent allocation,
//! out-of-range index, mismatched raw source) panic.

pub mod alloc;
pub mod bounded;
pub mod growable;
pub mod policy;
pub mod storage;

pub use bounded::BoundedBuffer;
pub use growable::GrowableBuffer;
pub use holdfast_common_traits::buffer::{StorageOwner, WriteBuffer, write_iter};
pub use policy::GrowthPolicy;
pub use storage::OwnedStorage;

#[cfg(test)]
mod tests;
