//! Tracing initializer
//!

use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Installs the global `fmt` subscriber. `RUST_LOG` overrides the default
/// `info` level. Calling it twice is harmless: the second install is ignored.
pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Directive::from(LevelFilter::INFO))
                .from_env_lossy(),
        )
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::trace!("Global tracing subscriber already installed");
    }
}
