//! Traits and definitions shared by the holdfast storage crates.
//!
//! # Modules
//!
//! - [`memory_owner`]: raw description of an owned allocation
//! - [`buffer`]: capability contracts for exclusive owners of element storage
//!   ([`buffer::StorageOwner`]) and for write-cursor buffers ([`buffer::WriteBuffer`])

pub mod buffer;
pub mod memory_owner;
