//! Purpose: Library crate behind the `sqljson` CLI: stream query rows as JSON.
//! Exports: `core` (resolver, encoder, row writer, sinks, cursors, errors) and `api`.
//! Role: `api` is the supported surface; `core` stays public for tests and tooling.
//! Invariants: Output is produced incrementally; no result set is materialized.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
