#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod byte_hash;

/// A hash set implementation backed by the flat group table.
///
/// This module provides a `HashSet` that wraps the `HashTable` and provides
/// a standard set interface with configurable hashers.
pub mod hash_set;

pub mod hash_table;

pub use byte_hash::byte_hash;
pub use hash_set::HashSet;
pub use hash_table::HashEq;
pub use hash_table::HashTable;
