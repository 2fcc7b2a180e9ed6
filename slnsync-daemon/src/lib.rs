//! Watcher runtime: keeps the solution in sync and reacts to source file
//! creation and deletion inside project roots.

mod error;
pub mod paths;
mod runtime;

pub use error::DaemonError;
pub use runtime::{
    classify, init_tracing, remove_meta_companion, run, start_blocking, watch_roots, WatchAction,
    WatcherRegistry,
};
