use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Commands the bank understands. Matching on the wire tag is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Deposit,
    Withdraw,
    Balance,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Deposit => "DEPOSIT",
            Command::Withdraw => "WITHDRAW",
            Command::Balance => "BALANCE",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "DEPOSIT" => Ok(Command::Deposit),
            "WITHDRAW" => Ok(Command::Withdraw),
            "BALANCE" => Ok(Command::Balance),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// A request as it travels on the wire. The command stays a raw tag so an
/// unrecognised one can still be named in the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: String,
    pub argument: Option<String>,
}

impl Request {
    pub fn new(command: impl Into<String>, argument: Option<String>) -> Self {
        Request {
            command: command.into(),
            argument,
        }
    }

    pub fn deposit(amount: i64) -> Self {
        Self::new(Command::Deposit.as_str(), Some(amount.to_string()))
    }

    pub fn withdraw(amount: i64) -> Self {
        Self::new(Command::Withdraw.as_str(), Some(amount.to_string()))
    }

    pub fn balance() -> Self {
        Self::new(Command::Balance.as_str(), None)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(argument) => write!(f, "{} {argument}", self.command),
            None => f.write_str(&self.command),
        }
    }
}

/// Second half of a response: the balance on success (and on business rule
/// failures), an error text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Balance(i64),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub success: bool,
    pub payload: Payload,
}

impl Response {
    pub fn failure(message: impl Into<String>) -> Self {
        Response {
            success: false,
            payload: Payload::Message(message.into()),
        }
    }

    pub fn balance(&self) -> Option<i64> {
        match self.payload {
            Payload::Balance(amount) => Some(amount),
            Payload::Message(_) => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Balance(amount) => write!(f, "({}, {amount})", self.success),
            Payload::Message(message) => write!(f, "({}, {message:?})", self.success),
        }
    }
}

/// The `(success, balance)` pair every bank operation yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub balance: i64,
}

impl Outcome {
    pub fn accepted(balance: i64) -> Self {
        Outcome {
            success: true,
            balance,
        }
    }

    pub fn rejected(balance: i64) -> Self {
        Outcome {
            success: false,
            balance,
        }
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        Response {
            success: outcome.success,
            payload: Payload::Balance(outcome.balance),
        }
    }
}
