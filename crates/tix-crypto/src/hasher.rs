use serde_json::Value;
use tix_types::{Block, BlockHash, TicketId, Timestamp};

use crate::canonical::canonical_json;

/// Domain-separated BLAKE3 block hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a block digest can never collide with a ticket id digest
/// over identical bytes.
pub struct BlockHasher {
    domain: &'static str,
}

impl BlockHasher {
    /// Hasher for sealed blocks.
    pub const BLOCK: Self = Self {
        domain: "tix-block-v1",
    };
    /// Hasher for ticket id derivation.
    pub const TICKET: Self = Self {
        domain: "tix-ticket-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Canonical bytes of a block's hashed content.
    ///
    /// The block's own `hash` field is removed, as is the `scanned` flag of
    /// every embedded transaction: scanning is the one mutation permitted
    /// after sealing and must not invalidate the digest.
    pub fn canonical_bytes(block: &Block) -> Result<Vec<u8>, HasherError> {
        let mut value =
            serde_json::to_value(block).map_err(|e| HasherError::Serialization(e.to_string()))?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| HasherError::Serialization("block is not a JSON object".into()))?;
        object.remove("hash");
        if let Some(Value::Array(transactions)) = object.get_mut("transactions") {
            for tx in transactions.iter_mut() {
                if let Some(tx) = tx.as_object_mut() {
                    tx.remove("scanned");
                }
            }
        }
        Ok(canonical_json(&value))
    }

    /// Digest a block's content, ignoring whatever is stored in `hash`.
    pub fn digest(&self, block: &Block) -> Result<BlockHash, HasherError> {
        let bytes = Self::canonical_bytes(block)?;
        Ok(BlockHash::from_bytes(self.hash(&bytes)))
    }

    /// Compute and store the block's digest.
    pub fn seal(&self, mut block: Block) -> Result<Block, HasherError> {
        block.hash = self.digest(&block)?;
        Ok(block)
    }

    /// Whether the stored hash matches a fresh recomputation.
    pub fn verify(&self, block: &Block) -> bool {
        matches!(self.digest(block), Ok(computed) if computed == block.hash)
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Derive a short ticket id from the holder, event, issuance time, and a
/// per-ledger issuance counter.
///
/// The counter keeps ids distinct when the same holder buys several tickets
/// for one event within a single millisecond. `len` is clamped to the
/// 64-character hex digest.
pub fn derive_ticket_id(
    holder: &str,
    event_name: &str,
    issued_at: Timestamp,
    nonce: u64,
    len: usize,
) -> TicketId {
    let mut data = Vec::with_capacity(holder.len() + event_name.len() + 24);
    data.extend_from_slice(holder.as_bytes());
    data.push(0);
    data.extend_from_slice(event_name.as_bytes());
    data.push(0);
    data.extend_from_slice(&issued_at.as_millis().to_le_bytes());
    data.extend_from_slice(&nonce.to_le_bytes());

    let digest = hex::encode(BlockHasher::TICKET.hash(&data));
    let len = len.min(digest.len());
    TicketId::new(&digest[..len])
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tix_types::{TicketDetails, Transaction};

    fn tx(id: &str, event: &str) -> Transaction {
        Transaction::issue(
            TicketId::from(id),
            TicketDetails::new(event).with_buyer("Alice"),
            Timestamp::from_millis(42),
        )
    }

    fn block(transactions: Vec<Transaction>) -> Block {
        Block::unsealed(
            2,
            Timestamp::from_millis(1_000),
            transactions,
            123,
            BlockHash::from_bytes([1; 32]),
        )
    }

    #[test]
    fn digest_is_deterministic() {
        let b = block(vec![tx("a", "Freshers")]);
        let h1 = BlockHasher::BLOCK.digest(&b).unwrap();
        let h2 = BlockHasher::BLOCK.digest(&b).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.as_str().len(), 64);
    }

    #[test]
    fn digest_ignores_stored_hash() {
        let b = block(vec![]);
        let mut other = b.clone();
        other.hash = BlockHash::new("garbage");
        assert_eq!(
            BlockHasher::BLOCK.digest(&b).unwrap(),
            BlockHasher::BLOCK.digest(&other).unwrap()
        );
    }

    #[test]
    fn digest_ignores_scanned_flag() {
        let b = block(vec![tx("a", "Freshers")]);
        let mut scanned = b.clone();
        scanned.transactions[0].scanned = true;
        assert_eq!(
            BlockHasher::BLOCK.digest(&b).unwrap(),
            BlockHasher::BLOCK.digest(&scanned).unwrap()
        );
    }

    #[test]
    fn digest_covers_transaction_fields() {
        let b = block(vec![tx("a", "Freshers")]);
        let mut tampered = b.clone();
        tampered.transactions[0].event_name = "Ravan Dehan".into();
        assert_ne!(
            BlockHasher::BLOCK.digest(&b).unwrap(),
            BlockHasher::BLOCK.digest(&tampered).unwrap()
        );
    }

    #[test]
    fn digest_covers_header_fields() {
        let b = block(vec![]);
        let base = BlockHasher::BLOCK.digest(&b).unwrap();

        let mut proof = b.clone();
        proof.proof = 124;
        let mut prev = b.clone();
        prev.previous_hash = BlockHash::from_bytes([2; 32]);
        let mut index = b.clone();
        index.index = 3;

        for changed in [proof, prev, index] {
            assert_ne!(BlockHasher::BLOCK.digest(&changed).unwrap(), base);
        }
    }

    #[test]
    fn seal_then_verify() {
        let sealed = BlockHasher::BLOCK.seal(block(vec![tx("a", "Freshers")])).unwrap();
        assert!(BlockHasher::BLOCK.verify(&sealed));

        let mut tampered = sealed.clone();
        tampered.transactions[0].buyer = Some("Mallory".into());
        assert!(!BlockHasher::BLOCK.verify(&tampered));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        assert_ne!(BlockHasher::BLOCK.hash(data), BlockHasher::TICKET.hash(data));
        assert_ne!(
            BlockHasher::new("custom-v1").hash(data),
            BlockHasher::BLOCK.hash(data)
        );
    }

    #[test]
    fn canonical_bytes_omit_hash_and_scanned() {
        let sealed = BlockHasher::BLOCK.seal(block(vec![tx("a", "Freshers")])).unwrap();
        let text = String::from_utf8(BlockHasher::canonical_bytes(&sealed).unwrap()).unwrap();
        assert!(!text.contains("\"hash\""));
        assert!(!text.contains("scanned"));
        assert!(text.starts_with("{\"index\":2,"));
    }

    #[test]
    fn ticket_id_has_requested_length() {
        let id = derive_ticket_id("Alice", "Diwali Dance", Timestamp::from_millis(1), 0, 10);
        assert_eq!(id.as_str().len(), 10);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));

        let long = derive_ticket_id("Alice", "Diwali Dance", Timestamp::from_millis(1), 0, 500);
        assert_eq!(long.as_str().len(), 64);
    }

    #[test]
    fn ticket_id_varies_with_every_input() {
        let t = Timestamp::from_millis(1);
        let base = derive_ticket_id("Alice", "Freshers", t, 0, 10);
        assert_eq!(base, derive_ticket_id("Alice", "Freshers", t, 0, 10));
        assert_ne!(base, derive_ticket_id("Bob", "Freshers", t, 0, 10));
        assert_ne!(base, derive_ticket_id("Alice", "Diwali Dance", t, 0, 10));
        assert_ne!(base, derive_ticket_id("Alice", "Freshers", Timestamp::from_millis(2), 0, 10));
        assert_ne!(base, derive_ticket_id("Alice", "Freshers", t, 1, 10));
    }

    proptest! {
        #[test]
        fn digest_is_stable_for_equal_blocks(
            index in 1u64..10_000,
            proof in any::<u64>(),
            millis in any::<u64>(),
            event in "[A-Za-z ]{1,20}",
            buyer in "[A-Za-z]{1,12}",
        ) {
            let make = || {
                let tx = Transaction::issue(
                    TicketId::from("fixed"),
                    TicketDetails::new(event.clone()).with_buyer(buyer.clone()),
                    Timestamp::from_millis(millis),
                );
                Block::unsealed(
                    index,
                    Timestamp::from_millis(millis),
                    vec![tx],
                    proof,
                    BlockHash::new("1"),
                )
            };
            prop_assert_eq!(
                BlockHasher::BLOCK.digest(&make()).unwrap(),
                BlockHasher::BLOCK.digest(&make()).unwrap()
            );
        }
    }
}
