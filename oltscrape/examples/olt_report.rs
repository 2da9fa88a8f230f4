//! Report example: query an OLT and print the result as JSON
//!
//! Connection settings come from the environment:
//!
//! - `OLT_HOST`, `OLT_USERNAME` (required)
//! - `OLT_PASSWORD`, `OLT_PORT`, `OLT_TIMEOUT_SECS`, `OLT_DELAY_FACTOR` (optional)
//!
//! # Usage
//!
//! ```bash
//! # Port occupancy of board 0/2
//! cargo run --example olt_report -- ports 2
//!
//! # Subscriber units on port 0/2/0
//! cargo run --example olt_report -- units 2 0
//!
//! # Unprovisioned units
//! cargo run --example olt_report -- autofind
//! ```

use std::env;

use oltscrape::{OltClient, SessionBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let session = SessionBuilder::from_env()?.build()?;
    let client = OltClient::new(session);

    let report = match args.as_slice() {
        ["ports", board] => {
            let board = client.ports(board).await?;
            for port in board.ports().iter().filter(|p| p.needs_attention()) {
                eprintln!(
                    "port {} is {} ({}% online)",
                    port.path(),
                    port.status(),
                    port.percentage()
                );
            }
            serde_json::to_string_pretty(&board)?
        }
        ["units", board, port] => {
            let units = client.units(board, port).await?;
            let summary = units.summary();
            eprintln!(
                "{} units, {} online, {} with critical rx differential",
                summary.total, summary.online, summary.critical
            );
            serde_json::to_string_pretty(&units)?
        }
        ["autofind"] => {
            let candidates = client.autofind().await?;
            eprintln!("{} unprovisioned units", candidates.len());
            serde_json::to_string_pretty(&candidates)?
        }
        _ => {
            print_help();
            std::process::exit(2);
        }
    };

    println!("{report}");

    client.disconnect().await?;
    Ok(())
}

fn print_help() {
    println!(
        r#"oltscrape olt_report example

USAGE:
    cargo run --example olt_report -- <QUERY>

QUERIES:
    ports <BOARD>           Port occupancy of a board
    units <BOARD> <PORT>    Subscriber units on a port
    autofind                Unprovisioned units

ENVIRONMENT:
    OLT_HOST, OLT_USERNAME, OLT_PASSWORD, OLT_PORT,
    OLT_TIMEOUT_SECS, OLT_DELAY_FACTOR
"#
    );
}
