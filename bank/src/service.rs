//! Bank generic server. The account is the server state, and every operation
//! is a call through the server mailbox. Calls are handled one at a time, so
//! deposit and withdraw never interleave.

use spawned_concurrency::tasks::{CallResponse, CastResponse, GenServer, GenServerHandle};

use crate::account::BalanceAccount;
use crate::error::ServiceError;
use crate::messages::Outcome;

pub type BankHandle = GenServerHandle<Bank>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankCall {
    Deposit { amount: i64 },
    Withdraw { amount: i64 },
    Balance,
    Stop,
}

#[derive(Debug)]
pub struct Bank;

impl Bank {
    pub async fn call(
        server: &mut BankHandle,
        message: BankCall,
    ) -> Result<Outcome, ServiceError> {
        Ok(server.call(message).await?)
    }

    pub async fn deposit(server: &mut BankHandle, amount: i64) -> Result<Outcome, ServiceError> {
        Self::call(server, BankCall::Deposit { amount }).await
    }

    pub async fn withdraw(server: &mut BankHandle, amount: i64) -> Result<Outcome, ServiceError> {
        Self::call(server, BankCall::Withdraw { amount }).await
    }

    pub async fn balance(server: &mut BankHandle) -> Result<Outcome, ServiceError> {
        Self::call(server, BankCall::Balance).await
    }

    /// Stops the server, returning the final balance.
    pub async fn stop(server: &mut BankHandle) -> Result<Outcome, ServiceError> {
        Self::call(server, BankCall::Stop).await
    }
}

impl GenServer for Bank {
    type CallMsg = BankCall;
    type CastMsg = ();
    type OutMsg = Outcome;
    type State = BalanceAccount;
    type Error = ServiceError;

    fn new() -> Self {
        Bank
    }

    async fn handle_call(
        &mut self,
        message: Self::CallMsg,
        _handle: &BankHandle,
        state: &mut Self::State,
    ) -> CallResponse<Self::OutMsg> {
        match message {
            BankCall::Deposit { amount } => CallResponse::Reply(state.deposit(amount)),
            BankCall::Withdraw { amount } => CallResponse::Reply(state.withdraw(amount)),
            BankCall::Balance => CallResponse::Reply(state.balance()),
            BankCall::Stop => {
                tracing::trace!("Stopping bank");
                CallResponse::Stop(state.balance())
            }
        }
    }

    // Nothing is cast to the bank, every operation wants its outcome back.
    async fn handle_cast(
        &mut self,
        _message: Self::CastMsg,
        _handle: &BankHandle,
        _state: &mut Self::State,
    ) -> CastResponse {
        CastResponse::NoReply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_are_answered_in_order() {
        let mut bank = Bank::start(BalanceAccount::new());

        assert_eq!(Bank::deposit(&mut bank, 100).await, Ok(Outcome::accepted(100)));
        assert_eq!(Bank::withdraw(&mut bank, 50).await, Ok(Outcome::accepted(50)));
        assert_eq!(Bank::withdraw(&mut bank, 1000).await, Ok(Outcome::rejected(50)));
        assert_eq!(Bank::balance(&mut bank).await, Ok(Outcome::accepted(50)));
        assert_eq!(Bank::deposit(&mut bank, -10).await, Ok(Outcome::rejected(50)));
    }

    #[tokio::test]
    async fn stopped_bank_is_unavailable() {
        let mut bank = Bank::start(BalanceAccount::with_balance(7));

        assert_eq!(Bank::stop(&mut bank).await, Ok(Outcome::accepted(7)));
        assert_eq!(Bank::balance(&mut bank).await, Err(ServiceError::Unavailable));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_withdrawals_never_overdraw() {
        let mut bank = Bank::start(BalanceAccount::with_balance(1_000));

        let mut tasks = Vec::new();
        for _ in 0..200 {
            let mut bank = bank.clone();
            tasks.push(tokio::spawn(async move { Bank::withdraw(&mut bank, 7).await }));
        }
        let mut accepted = 0;
        for task in tasks {
            let outcome = task.await.unwrap().unwrap();
            assert!(outcome.balance >= 0);
            if outcome.success {
                accepted += 1;
            }
        }

        // 1000 / 7 = 142 withdrawals fit, leaving 6
        assert_eq!(accepted, 142);
        assert_eq!(Bank::balance(&mut bank).await, Ok(Outcome::accepted(6)));
    }
}
