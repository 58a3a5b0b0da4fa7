//! Long-running modes of the `deptrace` binary

pub mod watch;

pub use watch::{WatchSession, WatchState, WatchStatus};
