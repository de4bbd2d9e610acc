//! Interactive UDP bank client.
//!
//! Reads `DEPOSIT <amount>`, `WITHDRAW <amount>`, `BALANCE` or `END` from
//! stdin, sends each command as one datagram and prints the reply.

use std::io::{self, BufRead, Write};

use clap::Parser as _;
use minibank::{parse_line, BankClient, ClientCommand, ClientConfig};
use minibank_rt as rt;

fn main() -> anyhow::Result<()> {
    let config = ClientConfig::parse();
    rt::init_tracing();
    let runtime = rt::Runtime::new()?;

    let client = runtime.block_on(async {
        let server = config.endpoint.resolve().await?;
        tracing::info!("Sending to {server}");
        anyhow::Ok(BankClient::connect(server, config.timeout()).await?)
    })?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!("Command [DEPOSIT, WITHDRAW, BALANCE, END]");
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let request = match parse_line(&line) {
            Ok(ClientCommand::End) => break,
            Ok(ClientCommand::Send(request)) => request,
            Err(error) => {
                println!("  !! {error}");
                continue;
            }
        };

        match runtime.block_on(client.send(&request)) {
            Ok(response) => println!("  -> {response}"),
            Err(error) => println!("  !! {error}"),
        }
    }

    println!("Goodbye!");
    Ok(())
}
