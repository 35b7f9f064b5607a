//! Filesystem adapter layer.
//!
//! # Responsibility
//! - Wrap directory/file primitives behind one mockable contract.
//! - Translate `std::io::Error` into the typed failures callers branch on.
//!
//! # Invariants
//! - Adapter calls touch real state; there is no dry-run mode.
//! - Rename is a single filesystem rename, never copy + delete.

pub mod adapter;

pub use adapter::{DirEntry, FsAdapter, FsError, FsResult, LocalFs};
