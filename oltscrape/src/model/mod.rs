//! Domain records built from parsed device output.
//!
//! Everything here is query scoped: created fresh for one query, handed to
//! the caller, never cached.

mod autofind;
mod port;
mod unit;

pub use autofind::{AutofindCandidate, PonType};
pub use port::{Board, BoardStats, OpticalLinePort, PortStatus};
pub use unit::{CRITICAL_RX_DIFF, SubscriberUnit, UnitCollection, UnitSummary};
