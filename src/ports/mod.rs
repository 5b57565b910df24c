//! Port traits defining external boundaries.
//!
//! Each trait is a seam between the access layer and something it does not
//! control: wall-clock time, identifier allocation, and the backend itself.
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod dispatcher;
pub mod id_gen;

pub use clock::Clock;
pub use dispatcher::{DispatchFuture, Dispatcher};
pub use id_gen::IdGenerator;
