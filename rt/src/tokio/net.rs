//! Datagram networking reexports.

pub use tokio::net::{lookup_host, UdpSocket};
