//! Flutter-facing bindings for `notebook_core`.

pub mod api;
