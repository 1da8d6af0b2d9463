use serde::Serialize;
use tix_crypto::BlockHasher;
use tix_types::{Block, BlockHash};

/// Result of chain validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub block_count: u64,
    pub links_valid: bool,
    pub hashes_valid: bool,
    pub indices_sequential: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Position (1-based) of the offending block in the chain.
    pub index: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Genesis does not carry the sentinel previous hash.
    GenesisLink,
    /// `previous_hash` differs from the predecessor's stored hash.
    BrokenLink,
    /// Stored hash differs from a fresh digest of the block.
    HashMismatch,
    /// Stored index differs from the block's position.
    IndexGap,
}

/// Full-scan chain validator.
///
/// Unlike [`tix_crypto::HashChainVerifier`], which stops at the first
/// problem, this walks the whole chain and records every violation.
pub struct ChainValidator;

impl ChainValidator {
    pub fn validate(blocks: &[Block], sentinel: &BlockHash) -> ValidationReport {
        let mut violations = Vec::new();
        let mut links_valid = true;
        let mut hashes_valid = true;
        let mut indices_sequential = true;

        for (position, block) in blocks.iter().enumerate() {
            let expected_index = (position + 1) as u64;
            if block.index != expected_index {
                indices_sequential = false;
                violations.push(Violation {
                    index: expected_index,
                    kind: ViolationKind::IndexGap,
                    description: format!("expected index {expected_index}, found {}", block.index),
                });
            }

            if position == 0 {
                if &block.previous_hash != sentinel {
                    links_valid = false;
                    violations.push(Violation {
                        index: expected_index,
                        kind: ViolationKind::GenesisLink,
                        description: format!(
                            "genesis previous_hash {:?} is not the sentinel {:?}",
                            block.previous_hash.as_str(),
                            sentinel.as_str()
                        ),
                    });
                }
            } else if block.previous_hash != blocks[position - 1].hash {
                links_valid = false;
                violations.push(Violation {
                    index: expected_index,
                    kind: ViolationKind::BrokenLink,
                    description: "previous hash link mismatch".into(),
                });
            }

            match BlockHasher::BLOCK.digest(block) {
                Ok(computed) if computed == block.hash => {}
                Ok(_) => {
                    hashes_valid = false;
                    violations.push(Violation {
                        index: expected_index,
                        kind: ViolationKind::HashMismatch,
                        description: "block hash does not match computed".into(),
                    });
                }
                Err(e) => {
                    hashes_valid = false;
                    violations.push(Violation {
                        index: expected_index,
                        kind: ViolationKind::HashMismatch,
                        description: format!("block could not be digested: {e}"),
                    });
                }
            }
        }

        ValidationReport {
            block_count: blocks.len() as u64,
            links_valid,
            hashes_valid,
            indices_sequential,
            violations,
        }
    }
}
