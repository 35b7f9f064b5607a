//! In-memory tree model.
//!
//! # Responsibility
//! - Represent the navigable folder/note hierarchy the UI displays.
//!
//! # Invariants
//! - Nodes are identified by absolute path.
//! - The model only reflects what it listed or was told about by the
//!   mutation coordinator; out-of-band disk changes show up on rescan.

pub mod tree;
