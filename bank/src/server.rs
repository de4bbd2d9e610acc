//! UDP front end. Each datagram is decoded, dispatched to the bank and
//! answered to the address it came from, on its own task. A semaphore bounds
//! how many are in flight; once it is exhausted the receive loop waits.

use std::{io, net::SocketAddr, sync::Arc};

use minibank_rt::{self as rt, net::UdpSocket, CancellationToken, Semaphore};
use spawned_concurrency::tasks::GenServer as _;

use crate::account::BalanceAccount;
use crate::codec::{
    decode_tagged_request, encode_tagged_response, request_id, RequestId, MAX_DATAGRAM_SIZE,
};
use crate::config::ServerConfig;
use crate::dispatch::{malformed_request, Dispatcher};
use crate::messages::Response;
use crate::service::Bank;

pub struct BankServer {
    socket: Arc<UdpSocket>,
    dispatcher: Dispatcher,
    permits: Arc<Semaphore>,
    max_in_flight: u32,
    shutdown: CancellationToken,
}

impl BankServer {
    pub async fn bind(
        addr: SocketAddr,
        dispatcher: Dispatcher,
        max_in_flight: u32,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let max_in_flight = max_in_flight.max(1);
        Ok(BankServer {
            socket: Arc::new(socket),
            dispatcher,
            permits: Arc::new(Semaphore::new(max_in_flight as usize)),
            max_in_flight,
            shutdown: CancellationToken::new(),
        })
    }

    /// Resolves the configured endpoint, starts the bank task and binds.
    pub async fn start(config: &ServerConfig) -> io::Result<Self> {
        let addr = config.endpoint.resolve().await?;
        let bank = Bank::start(BalanceAccount::with_balance(config.opening_balance));
        Self::bind(addr, Dispatcher::new(bank), config.max_in_flight).await
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Cancelling the token stops the receive loop; `run` then returns once
    /// the requests already received are answered.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(self) -> io::Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);
        // One spare byte tells an oversized datagram from one that fits exactly.
        // Longer ones are cut to that size and answered as malformed.
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE + 1];

        loop {
            let permit = rt::select! {
                _ = self.shutdown.cancelled() => break,
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => break,
                },
            };
            let (len, peer) = rt::select! {
                _ = self.shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(error) => {
                        tracing::warn!("Failed to receive datagram: {error}");
                        continue;
                    }
                },
            };

            let datagram = buf[..len].to_vec();
            let socket = self.socket.clone();
            let dispatcher = self.dispatcher.clone();
            rt::spawn(async move {
                let _permit = permit;
                let Some((id, response)) = handle_datagram(&dispatcher, &datagram, peer).await
                else {
                    return;
                };
                let Some(reply) = encode_reply(id, &response) else {
                    return;
                };
                if let Err(error) = socket.send_to(&reply, peer).await {
                    tracing::warn!(%peer, "Failed to send reply: {error}");
                }
            });
        }

        tracing::info!("Shutting down, waiting for in-flight requests");
        if let Ok(_all) = self.permits.acquire_many(self.max_in_flight).await {
            tracing::trace!("All in-flight requests answered");
        }
        match Bank::stop(&mut self.dispatcher.bank()).await {
            Ok(outcome) => tracing::info!("Final balance {}", outcome.balance),
            Err(error) => tracing::warn!("Could not read final balance: {error}"),
        }
        Ok(())
    }
}

/// Decodes one datagram and works out the reply, tagged with the request id
/// when one can be read. `None` means the datagram is dropped without an
/// answer.
pub async fn handle_datagram(
    dispatcher: &Dispatcher,
    datagram: &[u8],
    peer: SocketAddr,
) -> Option<(Option<RequestId>, Response)> {
    match decode_tagged_request(datagram) {
        Ok((id, request)) => {
            let response = dispatcher.dispatch(&request).await;
            tracing::debug!(%peer, ?id, %request, %response, "Handled request");
            Some((id, response))
        }
        Err(error) if error.is_answerable() => {
            let id = request_id(datagram);
            let response = malformed_request(&error);
            tracing::debug!(
                %peer,
                ?id,
                size = datagram.len(),
                %response,
                "Rejected malformed request"
            );
            Some((id, response))
        }
        Err(error) => {
            tracing::warn!(%peer, "Dropping datagram: {error}");
            None
        }
    }
}

/// Encodes a reply. A response too large for one datagram (a failure echoing
/// a huge command tag, say) is replaced by a short failure.
fn encode_reply(id: Option<RequestId>, response: &Response) -> Option<Vec<u8>> {
    let encoded = encode_tagged_response(id, response).or_else(|error| {
        tracing::warn!("Reply not encodable, sending short failure: {error}");
        encode_tagged_response(
            id,
            &Response::failure("Error processing command: reply too large"),
        )
    });
    match encoded {
        Ok(bytes) => Some(bytes),
        Err(error) => {
            tracing::warn!("Failed to encode reply: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use spawned_concurrency::tasks::GenServer as _;

    use super::*;
    use crate::codec::encode_tagged_request;
    use crate::messages::{Outcome, Payload, Request};

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Bank::start(BalanceAccount::new()))
    }

    #[tokio::test]
    async fn decodable_datagram_is_dispatched() {
        let dispatcher = dispatcher();
        let datagram = crate::codec::encode_request(&Request::deposit(100)).unwrap();

        let reply = handle_datagram(&dispatcher, &datagram, peer()).await;
        assert_eq!(reply, Some((None, Response::from(Outcome::accepted(100)))));
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let dispatcher = dispatcher();
        let datagram = encode_tagged_request(Some(9), &Request::balance()).unwrap();
        let reply = handle_datagram(&dispatcher, &datagram, peer()).await;
        assert_eq!(reply, Some((Some(9), Response::from(Outcome::accepted(0)))));

        let datagram = br#"{"version":1,"id":10,"command":"DEPOSIT","argument":100}"#;
        let (id, response) = handle_datagram(&dispatcher, datagram, peer()).await.unwrap();
        assert_eq!(id, Some(10));
        assert!(!response.success);
    }

    #[tokio::test]
    async fn malformed_datagram_gets_failure() {
        let dispatcher = dispatcher();
        let datagram = br#"{"version":1,"command":"DEPOSIT","argument":100}"#;

        let (id, response) = handle_datagram(&dispatcher, datagram, peer()).await.unwrap();
        assert_eq!(id, None);
        assert!(!response.success);
        match response.payload {
            Payload::Message(message) => assert!(message.starts_with("Malformed request: ")),
            Payload::Balance(_) => panic!("expected an error message"),
        }
        assert_eq!(Bank::balance(&mut dispatcher.bank()).await, Ok(Outcome::accepted(0)));
    }

    #[tokio::test]
    async fn oversized_datagram_gets_failure() {
        let dispatcher = dispatcher();
        let datagram = format!(
            r#"{{"version":1,"command":"DEPOSIT","argument":"{}"}}"#,
            "1".repeat(2000)
        );

        let reply = handle_datagram(&dispatcher, datagram.as_bytes(), peer()).await;
        let expected = malformed_request(&crate::codec::oversized_datagram());
        assert_eq!(reply, Some((None, expected)));
        assert_eq!(Bank::balance(&mut dispatcher.bank()).await, Ok(Outcome::accepted(0)));
    }

    #[tokio::test]
    async fn unreadable_datagram_is_dropped() {
        let dispatcher = dispatcher();
        assert_eq!(handle_datagram(&dispatcher, b"\x80\x04pickle", peer()).await, None);
    }

    #[test]
    fn huge_reply_is_shortened() {
        let response = Response::failure(format!("Unknown command: {}", "X".repeat(2000)));
        let reply = encode_reply(Some(3), &response).unwrap();
        assert!(reply.len() <= MAX_DATAGRAM_SIZE);
        assert_eq!(
            crate::codec::decode_tagged_response(&reply).unwrap(),
            (
                Some(3),
                Response::failure("Error processing command: reply too large")
            )
        );
    }
}
