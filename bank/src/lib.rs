//! # minibank
//!
//! A single shared balance served over UDP. A client puts one command
//! (`DEPOSIT <amount>`, `WITHDRAW <amount>` or `BALANCE`) in a datagram; the
//! server answers with one datagram holding a success flag and either the
//! resulting balance or an error message.
//!
//! - [`codec`] maps requests and responses to versioned JSON datagrams.
//! - [`account::BalanceAccount`] enforces the balance rules.
//! - [`service::Bank`] owns the account inside a task, one call at a time.
//! - [`dispatch::Dispatcher`] turns decoded requests into bank calls and every
//!   failure into a response.
//! - [`server::BankServer`] and [`client::BankClient`] are the two UDP ends.
//!
//! ```ignore
//! use minibank::{BankClient, BankServer, ServerConfig};
//!
//! let server = BankServer::start(&ServerConfig::default()).await?;
//! let addr = server.local_addr()?;
//! rt::spawn(server.run());
//!
//! let client = BankClient::connect(addr, None).await?;
//! let response = client.deposit(100).await?; // (true, 100)
//! ```

pub mod account;
pub mod client;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod messages;
pub mod server;
pub mod service;

pub use account::BalanceAccount;
pub use client::{parse_line, BankClient, ClientCommand};
pub use config::{ClientConfig, Endpoint, ServerConfig};
pub use dispatch::Dispatcher;
pub use error::{ClientError, CodecError, CommandError, ServiceError};
pub use messages::{Command, Outcome, Payload, Request, Response};
pub use server::BankServer;
pub use service::{Bank, BankCall, BankHandle};
