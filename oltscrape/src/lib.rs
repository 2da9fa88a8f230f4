//! # oltscrape
//!
//! Async scraper for subscriber-line telemetry on Huawei SmartAX GPON OLTs.
//!
//! oltscrape drives the device's modal command line over SSH and turns its
//! human-oriented tables into typed records: per-port occupancy of a
//! board, optical and status readings of the subscriber units (ONTs) on a
//! port, and units waiting in the autofind table.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Explicit modal-context tracking (config / interface), every move
//!   confirmed by the prompt that follows it
//! - Pager and parameter-prompt handling
//! - Parsers that skip malformed lines with a warning instead of failing
//! - A shared client that serializes whole queries on one connection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oltscrape::{SessionBuilder, query_units};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), oltscrape::Error> {
//!     let mut session = SessionBuilder::new("10.120.6.105")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     let units = query_units(&mut session, "2", "0").await?;
//!     for unit in &units {
//!         println!("{} {} {:?}", unit.id(), unit.state(), unit.rx_diff());
//!     }
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod channel;
pub mod dialect;
pub mod error;
pub mod model;
pub mod parse;
pub mod query;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use assemble::{UnitAssembler, UnitDraft};
pub use channel::ExecOptions;
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use model::{
    AutofindCandidate, Board, BoardStats, OpticalLinePort, PonType, PortStatus, SubscriberUnit,
    UnitCollection, UnitSummary,
};
pub use parse::{ParseOutcome, ParseWarning, WarningKind};
pub use query::{OltClient, query_autofind, query_ports, query_units};
pub use session::{CliContext, Response, SessionBuilder, SessionContext};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
