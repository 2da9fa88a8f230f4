//! Session layer: one device connection and its modal CLI state.
//!
//! The device CLI is modal. Per-port commands only work inside the GPON
//! interface of the owning board, while device-wide commands only work
//! outside any interface. [`SessionContext`] tracks which context the
//! remote cursor is in and confirms every move by reading the prompt that
//! follows it.

mod builder;
mod context;
mod manager;
mod response;

pub use builder::SessionBuilder;
pub use context::CliContext;
pub use manager::SessionContext;
pub use response::Response;
