//! Use-case services over the tree model and the filesystem adapter.
//!
//! # Responsibility
//! - Sequence filesystem mutations with model updates.
//! - Track the note bound to the editor buffer.

pub mod document;
pub mod mutation;
pub mod naming;
