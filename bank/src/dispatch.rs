use crate::error::{CodecError, CommandError};
use crate::messages::{Command, Request, Response};
use crate::service::{Bank, BankCall, BankHandle};

/// Turns a request into the bank call it names, converting the argument.
pub fn parse_call(request: &Request) -> Result<BankCall, CommandError> {
    let command: Command = request.command.parse()?;
    let call = match command {
        Command::Deposit => BankCall::Deposit {
            amount: parse_amount(command, request.argument.as_deref())?,
        },
        Command::Withdraw => BankCall::Withdraw {
            amount: parse_amount(command, request.argument.as_deref())?,
        },
        Command::Balance => BankCall::Balance,
    };
    Ok(call)
}

fn parse_amount(command: Command, argument: Option<&str>) -> Result<i64, CommandError> {
    let argument = argument.ok_or(CommandError::MissingArgument(command.as_str()))?;
    argument
        .trim()
        .parse()
        .map_err(|error: std::num::ParseIntError| CommandError::InvalidArgument {
            argument: argument.to_string(),
            reason: error.to_string(),
        })
}

/// Response for a request that could not be turned into a bank call.
pub fn command_failure(error: &CommandError) -> Response {
    match error {
        CommandError::UnknownCommand(_) => Response::failure(error.to_string()),
        _ => Response::failure(format!("Error processing command: {error}")),
    }
}

/// Response for a datagram that was readable but not a valid request.
pub fn malformed_request(error: &CodecError) -> Response {
    Response::failure(format!("Malformed request: {error}"))
}

/// Routes decoded requests to the bank. Every failure comes back as a
/// response, nothing is propagated to the caller.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    bank: BankHandle,
}

impl Dispatcher {
    pub fn new(bank: BankHandle) -> Self {
        Dispatcher { bank }
    }

    pub fn bank(&self) -> BankHandle {
        self.bank.clone()
    }

    pub async fn dispatch(&self, request: &Request) -> Response {
        let call = match parse_call(request) {
            Ok(call) => call,
            Err(error) => return command_failure(&error),
        };
        match Bank::call(&mut self.bank(), call).await {
            Ok(outcome) => outcome.into(),
            Err(error) => Response::failure(format!("Error processing command: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::BalanceAccount;
    use crate::messages::{Outcome, Payload};
    use spawned_concurrency::tasks::GenServer as _;

    fn request(command: &str, argument: Option<&str>) -> Request {
        Request::new(command, argument.map(str::to_string))
    }

    #[test]
    fn parse_known_commands() {
        assert_eq!(
            parse_call(&request("DEPOSIT", Some("100"))),
            Ok(BankCall::Deposit { amount: 100 })
        );
        assert_eq!(
            parse_call(&request("WITHDRAW", Some(" 5 "))),
            Ok(BankCall::Withdraw { amount: 5 })
        );
        assert_eq!(
            parse_call(&request("BALANCE", Some("placeholder"))),
            Ok(BankCall::Balance)
        );
    }

    #[test]
    fn parse_rejects_bad_arguments() {
        assert_eq!(
            parse_call(&request("DEPOSIT", None)),
            Err(CommandError::MissingArgument("DEPOSIT"))
        );
        assert!(matches!(
            parse_call(&request("WITHDRAW", Some("12.5"))),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn failure_messages() {
        let unknown = CommandError::UnknownCommand("FOO".to_string());
        assert_eq!(
            command_failure(&unknown),
            Response::failure("Unknown command: FOO")
        );

        let missing = CommandError::MissingArgument("WITHDRAW");
        assert_eq!(
            command_failure(&missing),
            Response::failure("Error processing command: missing amount argument for WITHDRAW")
        );
    }

    #[tokio::test]
    async fn dispatch_scenario() {
        let dispatcher = Dispatcher::new(Bank::start(BalanceAccount::new()));

        let cases = [
            (request("DEPOSIT", Some("100")), Outcome::accepted(100)),
            (request("WITHDRAW", Some("50")), Outcome::accepted(50)),
            (request("WITHDRAW", Some("1000")), Outcome::rejected(50)),
            (request("BALANCE", None), Outcome::accepted(50)),
            (request("DEPOSIT", Some("-10")), Outcome::rejected(50)),
        ];
        for (request, outcome) in cases {
            assert_eq!(dispatcher.dispatch(&request).await, Response::from(outcome), "{request}");
        }

        assert_eq!(
            dispatcher.dispatch(&request("FOO", Some("5"))).await,
            Response::failure("Unknown command: FOO")
        );

        let response = dispatcher.dispatch(&request("DEPOSIT", Some("abc"))).await;
        assert!(!response.success);
        match response.payload {
            Payload::Message(message) => {
                assert!(message.starts_with("Error processing command: "), "{message}");
                assert!(message.contains("abc"), "{message}");
            }
            Payload::Balance(_) => panic!("expected an error message"),
        }

        assert_eq!(
            dispatcher.dispatch(&request("BALANCE", None)).await,
            Response::from(Outcome::accepted(50))
        );
    }

    #[tokio::test]
    async fn stopped_bank_yields_failure_response() {
        let dispatcher = Dispatcher::new(Bank::start(BalanceAccount::new()));
        Bank::stop(&mut dispatcher.bank()).await.unwrap();

        assert_eq!(
            dispatcher.dispatch(&request("BALANCE", None)).await,
            Response::failure("Error processing command: bank service unavailable")
        );
    }
}
