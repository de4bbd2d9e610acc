use std::{io, net::SocketAddr, time::Duration};

use clap::{Args, Parser};
use minibank_rt::net;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_MAX_IN_FLIGHT: u32 = 64;

/// Where the server listens, and where the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct Endpoint {
    #[arg(long, env = "MINIBANK_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    #[arg(long, env = "MINIBANK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Endpoint {
    /// First address the host name resolves to.
    pub async fn resolve(&self) -> io::Result<SocketAddr> {
        net::lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{}:{} did not resolve to any address", self.host, self.port),
                )
            })
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "minibank-server", about = "Serve a single balance over UDP")]
pub struct ServerConfig {
    #[command(flatten)]
    pub endpoint: Endpoint,
    /// Datagrams handled at the same time before the receive loop waits.
    #[arg(
        long,
        env = "MINIBANK_MAX_IN_FLIGHT",
        default_value_t = DEFAULT_MAX_IN_FLIGHT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_in_flight: u32,
    #[arg(
        long,
        env = "MINIBANK_OPENING_BALANCE",
        default_value_t = 0,
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    pub opening_balance: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            endpoint: Endpoint::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            opening_balance: 0,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "minibank-client", about = "Send bank commands over UDP")]
pub struct ClientConfig {
    #[command(flatten)]
    pub endpoint: Endpoint,
    /// Give up waiting for a reply after this many milliseconds.
    #[arg(long, env = "MINIBANK_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
