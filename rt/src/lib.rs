//! Runtime wrapper to remove dependencies from code. The application crates
//! only see what is reexported here, so swapping the runtime underneath means
//! touching this crate alone.
//!
//! Currently, only the tokio pieces needed by a datagram server and its client
//! are reexported. We may want to extend this functionality as needed.

mod tokio;
mod tracing;

use std::future::Future;

pub use crate::tokio::net;
pub use crate::tokio::{ctrl_c, select, spawn, timeout, CancellationToken, Runtime, Semaphore};
pub use crate::tracing::init_tracing;

/// Initializes tracing, builds a multi-threaded runtime and blocks on `future`.
pub fn run<F: Future>(future: F) -> std::io::Result<F::Output> {
    init_tracing();

    let rt = Runtime::new()?;
    Ok(rt.block_on(future))
}
