//! Turns cached snapshots into painted table rows: filtering, render
//! coalescing, row diffing and interaction-driven suspension.

pub mod coalesce;
pub mod filter;
pub mod interaction;
pub mod render;
pub mod timer;
