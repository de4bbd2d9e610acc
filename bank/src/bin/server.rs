//! UDP bank server.
//!
//! ```text
//! $ minibank-server --host localhost --port 9999
//! ```
//!
//! Ctrl+C stops the receive loop, lets in-flight requests finish and logs the
//! final balance.

use clap::Parser as _;
use minibank::{BankServer, ServerConfig};
use minibank_rt as rt;

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    rt::run(async move {
        let server = BankServer::start(&config).await?;
        tracing::info!(
            "Server at {}:{} ({})",
            config.endpoint.host,
            config.endpoint.port,
            server.local_addr()?
        );

        let shutdown = server.shutdown_token();
        rt::spawn(async move {
            match rt::ctrl_c().await {
                Ok(()) => shutdown.cancel(),
                Err(error) => tracing::warn!("Cannot listen for Ctrl+C: {error}"),
            }
        });

        server.run().await?;
        anyhow::Ok(())
    })?
}
