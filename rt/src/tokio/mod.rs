//! Tokio.rs reexports to prevent tokio dependencies within external code
pub mod net;

pub use tokio::{
    runtime::Runtime,
    select,
    signal::ctrl_c,
    sync::Semaphore,
    task::spawn,
    time::timeout,
};
pub use tokio_util::sync::CancellationToken;
