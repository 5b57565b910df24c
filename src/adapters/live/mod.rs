//! Live adapters for real external interactions.

pub mod clock;
#[cfg(unix)]
pub mod daemon;
pub mod id_gen;
pub mod process;

pub use clock::SystemClock;
#[cfg(unix)]
pub use daemon::DaemonDispatcher;
pub use id_gen::UuidIdGenerator;
pub use process::ProcessDispatcher;
