//! Cassettes: recorded backend round trips for deterministic replay.

pub mod format;
pub mod recorder;
pub mod replayer;
