//! Port implementations.
//!
//! - `live`: real clock, identifiers, and backend transports
//! - `memory`: an in-process backend
//! - `recording` / `replaying`: cassette-backed dispatchers

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;

pub use memory::MemoryBackend;
pub use recording::RecordingDispatcher;
pub use replaying::ReplayingDispatcher;
