//! Hashing primitives for the ticket ledger.
//!
//! Provides canonical (key-sorted) JSON encoding, domain-separated BLAKE3
//! block digests, ticket id derivation, and hash chain verification.
//!
//! All crypto operations wrap established libraries. No custom cryptography.

pub mod canonical;
pub mod chain;
pub mod hasher;

pub use canonical::{canonical_json, to_canonical_bytes};
pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::{derive_ticket_id, BlockHasher, HasherError};
