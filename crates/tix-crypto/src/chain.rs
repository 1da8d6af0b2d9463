use tix_types::{Block, BlockHash};

use crate::hasher::{BlockHasher, HasherError};

/// Trait for records that participate in a hash chain.
pub trait ChainLink {
    /// 1-based chain position.
    fn position(&self) -> u64;
    /// The record's stored hash.
    fn link_hash(&self) -> &BlockHash;
    /// The stored hash of the predecessor (sentinel for genesis).
    fn prev_link(&self) -> &BlockHash;
    /// Canonical payload bytes for hash verification.
    fn payload_bytes(&self) -> Result<Vec<u8>, HasherError>;
}

impl ChainLink for Block {
    fn position(&self) -> u64 {
        self.index
    }

    fn link_hash(&self) -> &BlockHash {
        &self.hash
    }

    fn prev_link(&self) -> &BlockHash {
        &self.previous_hash
    }

    fn payload_bytes(&self) -> Result<Vec<u8>, HasherError> {
        BlockHasher::canonical_bytes(self)
    }
}

/// Fail-fast hash chain integrity verifier.
///
/// Verifies that a sequence of links forms a valid chain: positions run
/// 1, 2, 3, ...; the first link points at the sentinel; every later link
/// points at its predecessor's stored hash; and every stored hash matches a
/// fresh digest of the link's payload.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain of links, stopping at the first violation.
    pub fn verify_chain(
        links: &[impl ChainLink],
        sentinel: &BlockHash,
    ) -> Result<(), ChainError> {
        for (i, link) in links.iter().enumerate() {
            let expected_position = (i + 1) as u64;
            if link.position() != expected_position {
                return Err(ChainError::IndexGap {
                    expected: expected_position,
                    found: link.position(),
                });
            }

            if i == 0 {
                if link.prev_link() != sentinel {
                    return Err(ChainError::GenesisLinkMismatch);
                }
            } else if link.prev_link() != links[i - 1].link_hash() {
                return Err(ChainError::BrokenLink {
                    index: expected_position,
                });
            }

            let payload = link.payload_bytes().map_err(|_| ChainError::HashMismatch {
                index: expected_position,
            })?;
            if Self::compute_hash(&payload) != *link.link_hash() {
                return Err(ChainError::HashMismatch {
                    index: expected_position,
                });
            }
        }

        Ok(())
    }

    /// Compute the expected hash for a canonical payload.
    pub fn compute_hash(payload: &[u8]) -> BlockHash {
        BlockHash::from_bytes(BlockHasher::BLOCK.hash(payload))
    }
}

/// Errors from chain verification. Indices are 1-based block positions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis block does not carry the expected sentinel previous hash")]
    GenesisLinkMismatch,

    #[error("broken link at block {index}: previous_hash does not match")]
    BrokenLink { index: u64 },

    #[error("hash mismatch at block {index}: computed hash differs from stored")]
    HashMismatch { index: u64 },

    #[error("index gap: expected block {expected}, found {found}")]
    IndexGap { expected: u64, found: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tix_types::{TicketDetails, TicketId, Timestamp, Transaction};

    /// Test link for chain verification.
    struct TestLink {
        position: u64,
        hash: BlockHash,
        prev: BlockHash,
        payload: Vec<u8>,
    }

    impl ChainLink for TestLink {
        fn position(&self) -> u64 {
            self.position
        }
        fn link_hash(&self) -> &BlockHash {
            &self.hash
        }
        fn prev_link(&self) -> &BlockHash {
            &self.prev
        }
        fn payload_bytes(&self) -> Result<Vec<u8>, HasherError> {
            Ok(self.payload.clone())
        }
    }

    fn sentinel() -> BlockHash {
        BlockHash::new("1")
    }

    fn build_chain(count: usize) -> Vec<TestLink> {
        let mut chain = Vec::new();
        let mut prev = sentinel();

        for i in 0..count {
            let payload = format!("block-{i}").into_bytes();
            let hash = HashChainVerifier::compute_hash(&payload);
            chain.push(TestLink {
                position: (i + 1) as u64,
                hash: hash.clone(),
                prev,
                payload,
            });
            prev = hash;
        }

        chain
    }

    #[test]
    fn empty_chain_is_valid() {
        let chain: Vec<TestLink> = vec![];
        assert!(HashChainVerifier::verify_chain(&chain, &sentinel()).is_ok());
    }

    #[test]
    fn multi_link_chain() {
        let chain = build_chain(10);
        assert!(HashChainVerifier::verify_chain(&chain, &sentinel()).is_ok());
    }

    #[test]
    fn wrong_sentinel_fails() {
        let chain = build_chain(2);
        let err = HashChainVerifier::verify_chain(&chain, &BlockHash::new("0")).unwrap_err();
        assert_eq!(err, ChainError::GenesisLinkMismatch);
    }

    #[test]
    fn broken_link_detected() {
        let mut chain = build_chain(3);
        chain[2].prev = BlockHash::from_bytes([99; 32]);
        let err = HashChainVerifier::verify_chain(&chain, &sentinel()).unwrap_err();
        assert_eq!(err, ChainError::BrokenLink { index: 3 });
    }

    #[test]
    fn tampered_payload_detected() {
        let mut chain = build_chain(3);
        chain[1].payload = b"tampered".to_vec();
        let err = HashChainVerifier::verify_chain(&chain, &sentinel()).unwrap_err();
        assert_eq!(err, ChainError::HashMismatch { index: 2 });
    }

    #[test]
    fn index_gap_detected() {
        let mut chain = build_chain(3);
        chain[2].position = 5;
        let err = HashChainVerifier::verify_chain(&chain, &sentinel()).unwrap_err();
        assert_eq!(
            err,
            ChainError::IndexGap {
                expected: 3,
                found: 5
            }
        );
    }

    #[test]
    fn sealed_blocks_form_valid_chain() {
        let genesis = BlockHasher::BLOCK
            .seal(Block::unsealed(1, Timestamp::zero(), vec![], 100, sentinel()))
            .unwrap();
        let tx = Transaction::issue(
            TicketId::from("abc"),
            TicketDetails::new("Freshers").with_buyer("Alice"),
            Timestamp::from_millis(3),
        );
        let second = BlockHasher::BLOCK
            .seal(Block::unsealed(
                2,
                Timestamp::from_millis(4),
                vec![tx],
                123,
                genesis.hash.clone(),
            ))
            .unwrap();

        let mut chain = vec![genesis, second];
        assert!(HashChainVerifier::verify_chain(&chain, &sentinel()).is_ok());

        chain[1].transactions[0].scanned = true;
        assert!(HashChainVerifier::verify_chain(&chain, &sentinel()).is_ok());

        chain[1].transactions[0].event_name = "Diwali Dance".into();
        assert_eq!(
            HashChainVerifier::verify_chain(&chain, &sentinel()).unwrap_err(),
            ChainError::HashMismatch { index: 2 }
        );
    }
}
