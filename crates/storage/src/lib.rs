//! Storage abstraction and implementations for PMO snapshots.
//!
//! The engines never touch storage. Callers load a whole [`pmo_core::Snapshot`],
//! run the engines over it and save it back in one write.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{Storage, StorageError, Result};
pub use json_storage::JsonStorage;
