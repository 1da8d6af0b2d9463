use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::temporal::Timestamp;

/// Opaque ticket identifier.
///
/// Derived from a truncated digest of the holder, event, and issuance time.
/// Unique per purchase by construction; not hardened against deliberate
/// collision.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wrap an already-derived identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse user input (e.g. a scanned QR payload), trimming whitespace.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TypeError::EmptyTicketId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TicketId({})", self.0)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Fields supplied by a caller when staging a new ticket.
///
/// Only `event_name` and one of `buyer` / `customer_name` are required; the
/// remaining identity fields are carried through untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetails {
    pub event_name: String,
    pub buyer: Option<String>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub uid: Option<String>,
}

impl TicketDetails {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Default::default()
        }
    }

    pub fn with_buyer(mut self, buyer: impl Into<String>) -> Self {
        self.buyer = Some(buyer.into());
        self
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// The identity used for ticket id derivation: `buyer` if present and
    /// non-blank, otherwise `customer_name`.
    pub fn holder(&self) -> Option<&str> {
        non_blank(self.buyer.as_deref()).or_else(|| non_blank(self.customer_name.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A ticket issuance record.
///
/// Everything except `scanned` is fixed once the transaction is staged.
/// `scanned` moves from `false` to `true` at most once, after the
/// transaction has been sealed into a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub ticket_id: TicketId,
    pub event_name: String,
    #[serde(default)]
    pub buyer: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    pub scanned: bool,
    pub timestamp: Timestamp,
}

impl Transaction {
    /// Build an unscanned transaction from staged details.
    pub fn issue(ticket_id: TicketId, details: TicketDetails, timestamp: Timestamp) -> Self {
        Self {
            ticket_id,
            event_name: details.event_name,
            buyer: details.buyer,
            customer_name: details.customer_name,
            phone: details.phone,
            uid: details.uid,
            scanned: false,
            timestamp,
        }
    }

    /// Display name of the ticket holder, if any was recorded.
    pub fn holder(&self) -> Option<&str> {
        non_blank(self.buyer.as_deref()).or_else(|| non_blank(self.customer_name.as_deref()))
    }
}

/// Lifecycle state of a ticket.
///
/// `Pending` → `Committed` → `Scanned`. There are no transitions out of
/// `Scanned`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Staged, not yet sealed into a block.
    Pending,
    /// Sealed into a block and not yet scanned.
    Committed,
    /// Sealed and scanned at the venue.
    Scanned,
}

impl TicketStatus {
    /// Whether the ticket can still be admitted.
    pub fn is_admissible(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Committed => write!(f, "committed"),
            Self::Scanned => write!(f, "scanned"),
        }
    }
}
