use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use minibank_rt::{self as rt, net::UdpSocket};

use crate::codec::{
    decode_tagged_response, encode_tagged_request, RequestId, MAX_DATAGRAM_SIZE,
};
use crate::error::ClientError;
use crate::messages::{Command, Request, Response};

/// Sends one request per datagram and waits for the single reply. Failures
/// from the bank come back as ordinary responses; nothing is retried.
///
/// Every request carries a fresh id. Replies with any other id are late
/// answers to requests that already timed out, and are skipped.
#[derive(Debug)]
pub struct BankClient {
    socket: UdpSocket,
    timeout: Option<Duration>,
    next_id: AtomicU64,
}

impl BankClient {
    pub async fn connect(
        server: SocketAddr,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let local: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        Ok(BankClient {
            socket,
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn server_addr(&self) -> io::Result<SocketAddr> {
        self.socket.peer_addr()
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let datagram = encode_tagged_request(Some(id), request)?;
        self.socket.send(&datagram).await?;

        match self.timeout {
            Some(limit) => rt::timeout(limit, self.receive(id))
                .await
                .map_err(|_elapsed| ClientError::Timeout(limit))?,
            None => self.receive(id).await,
        }
    }

    async fn receive(&self, id: RequestId) -> Result<Response, ClientError> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE + 1];
        loop {
            let len = self.socket.recv(&mut buf).await?;
            match decode_tagged_response(&buf[..len])? {
                (Some(reply_id), response) if reply_id == id => return Ok(response),
                (reply_id, response) => {
                    tracing::debug!(?reply_id, expected = id, %response, "Skipping stale reply");
                }
            }
        }
    }

    pub async fn deposit(&self, amount: i64) -> Result<Response, ClientError> {
        self.send(&Request::deposit(amount)).await
    }

    pub async fn withdraw(&self, amount: i64) -> Result<Response, ClientError> {
        self.send(&Request::withdraw(amount)).await
    }

    pub async fn balance(&self) -> Result<Response, ClientError> {
        self.send(&Request::balance()).await
    }
}

/// What a line typed at the client prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Send(Request),
    End,
}

/// Reads one input line. The command word is case-insensitive; an empty line
/// or `END` ends the session and is never sent.
pub fn parse_line(line: &str) -> Result<ClientCommand, ClientError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(ClientCommand::End);
    };
    let command = command.to_uppercase();
    if command == "END" {
        return Ok(ClientCommand::End);
    }

    let argument = words.next().map(str::to_string);
    if words.next().is_some() {
        return Err(ClientError::Usage(format!("{command} takes at most one argument")));
    }
    let argument = match command.parse::<Command>() {
        Ok(Command::Balance) => None,
        _ => argument,
    };
    Ok(ClientCommand::Send(Request::new(command, argument)))
}
