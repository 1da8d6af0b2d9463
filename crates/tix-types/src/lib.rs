//! Foundation types for the ticket ledger.
//!
//! Every other crate in the workspace depends on `tix-types`.
//!
//! # Key Types
//!
//! - [`Transaction`]: A single ticket issuance record
//! - [`TicketId`]: Short opaque ticket identifier
//! - [`TicketDetails`]: Caller-supplied fields used to stage a ticket
//! - [`TicketStatus`]: Lifecycle state of a ticket (pending, committed, scanned)
//! - [`Block`]: A sealed batch of transactions with hash linkage
//! - [`BlockHash`]: Hex-encoded block digest
//! - [`Timestamp`]: Wall-clock milliseconds since the UNIX epoch

pub mod block;
pub mod error;
pub mod temporal;
pub mod ticket;

pub use block::{Block, BlockHash};
pub use error::TypeError;
pub use temporal::Timestamp;
pub use ticket::{TicketDetails, TicketId, TicketStatus, Transaction};
