use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod chain;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod mine;
pub mod peers;

pub use chain::{valid_chain, validate_chain, Ledger};
pub use consensus::{select_longest_chain, PeerChain};
pub use error::LedgerError;
pub use peers::PeerRegistry;

pub type Hash = [u8; constants::HASH_SIZE];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    fn canonical_value(&self) -> Value {
        json!({
            "amount": self.amount,
            "recipient": self.recipient,
            "sender": self.sender,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp: unix_now(),
            transactions,
            proof,
            previous_hash: previous_hash.into(),
        }
    }

    /// Compact JSON with every object's keys in sorted order, so equal blocks
    /// always produce the same bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let txs: Vec<Value> = self
            .transactions
            .iter()
            .map(Transaction::canonical_value)
            .collect();
        let value = json!({
            "index": self.index,
            "previous_hash": self.previous_hash,
            "proof": self.proof,
            "timestamp": self.timestamp,
            "transactions": txs,
        });
        value.to_string().into_bytes()
    }

    pub fn digest(&self) -> Hash {
        Sha256::digest(self.canonical_bytes()).into()
    }

    /// Lowercase hex SHA-256 of the canonical serialization.
    pub fn hash(&self) -> String {
        hex::encode(self.digest())
    }
}

pub fn hash(block: &Block) -> String {
    block.hash()
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub mod pow {
    use super::Hash;
    use crate::constants::POW_DIFFICULTY;
    use sha2::{Digest, Sha256};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    const CANCEL_CHECK_INTERVAL: u64 = 1024;

    /// Shared flag that stops a running [`proof_of_work_until`] search.
    #[derive(Clone, Debug, Default)]
    pub struct CancelToken(Arc<AtomicBool>);

    impl CancelToken {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cancel(&self) {
            self.0.store(true, Ordering::Relaxed);
        }

        pub fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::Relaxed)
        }
    }

    pub fn puzzle_digest(last_proof: u64, proof: u64) -> Hash {
        Sha256::digest(format!("{last_proof}{proof}").as_bytes()).into()
    }

    /// True when sha256("{last_proof}{proof}") starts with `POW_DIFFICULTY` zero hex digits.
    pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
        count_leading_zero_nibbles(&puzzle_digest(last_proof, proof)) >= POW_DIFFICULTY
    }

    /// Linear search from zero; returns the smallest valid proof.
    pub fn proof_of_work(last_proof: u64) -> u64 {
        let mut proof = 0u64;
        while !valid_proof(last_proof, proof) {
            proof += 1;
        }
        proof
    }

    /// Same search as [`proof_of_work`], giving up with `None` once `cancel` fires.
    pub fn proof_of_work_until(last_proof: u64, cancel: &CancelToken) -> Option<u64> {
        let mut proof = 0u64;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return None;
            }
            if valid_proof(last_proof, proof) {
                return Some(proof);
            }
            proof += 1;
        }
    }

    pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if *b >> 4 == 0 {
                    total += 1;
                }
                break;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward_block() -> Block {
        Block {
            index: 2,
            timestamp: 1_600_000_000,
            transactions: vec![Transaction::new("0", "node-a", 1)],
            proof: 35293,
            previous_hash: "1".to_string(),
        }
    }

    #[test]
    fn leading_zero_nibbles_examples() {
        let mut h = [0u8; 32];
        assert_eq!(pow::count_leading_zero_nibbles(&h), 64);
        h[0] = 0x0F;
        assert_eq!(pow::count_leading_zero_nibbles(&h), 1);
        h = [0u8; 32];
        h[1] = 0x80;
        assert_eq!(pow::count_leading_zero_nibbles(&h), 2);
        h[1] = 0x01;
        assert_eq!(pow::count_leading_zero_nibbles(&h), 3);
        h[0] = 0x10;
        assert_eq!(pow::count_leading_zero_nibbles(&h), 0);
    }

    #[test]
    fn canonical_bytes_sort_keys() {
        let json = String::from_utf8(reward_block().canonical_bytes()).unwrap();
        assert_eq!(
            json,
            r#"{"index":2,"previous_hash":"1","proof":35293,"timestamp":1600000000,"transactions":[{"amount":1,"recipient":"node-a","sender":"0"}]}"#
        );
    }

    #[test]
    fn block_hash_example() {
        let block = reward_block();
        let expected = "a0b5214851faf455eadba1c0ca8646ba26d4f5181be67fe3c4c43601dfffe62e";
        assert_eq!(block.hash(), expected);
        assert_eq!(hash(&block), expected);
        assert_eq!(block.hash().len(), constants::HASH_HEX_SIZE);
    }

    #[test]
    fn genesis_shaped_block_hash_example() {
        let block = Block {
            index: 1,
            timestamp: 1_600_000_000,
            transactions: vec![],
            proof: 100,
            previous_hash: "1".to_string(),
        };
        assert_eq!(
            block.hash(),
            "507c50e63ff9bca555e9da4bb438d4d6fd0e2940189bd257e94bb5cedd9c272a"
        );
    }

    #[test]
    fn hash_ignores_field_order_of_input() {
        let a: Block = serde_json::from_str(
            r#"{"index":2,"timestamp":1600000000,"transactions":[{"sender":"0","recipient":"node-a","amount":1}],"proof":35293,"previous_hash":"1"}"#,
        )
        .unwrap();
        let b: Block = serde_json::from_str(
            r#"{"previous_hash":"1","proof":35293,"transactions":[{"amount":1,"recipient":"node-a","sender":"0"}],"timestamp":1600000000,"index":2}"#,
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn hash_changes_with_any_field() {
        let base = reward_block();
        let mut other = base.clone();
        other.transactions[0].amount = 2;
        assert_ne!(base.hash(), other.hash());
        let mut other = base.clone();
        other.proof += 1;
        assert_ne!(base.hash(), other.hash());
        let mut other = base.clone();
        other.timestamp += 1;
        assert_ne!(base.hash(), other.hash());
    }

    #[test]
    fn valid_proof_examples() {
        assert!(pow::valid_proof(100, 35293));
        assert!(!pow::valid_proof(100, 35292));
        assert!(pow::valid_proof(0, 69732));
    }

    #[test]
    fn proof_of_work_finds_smallest_solution() {
        let proof = pow::proof_of_work(100);
        assert_eq!(proof, 35293);
        assert!(pow::valid_proof(100, proof));
        assert!((0..proof).all(|p| !pow::valid_proof(100, p)));
    }

    #[test]
    fn proof_of_work_until_matches_unbounded_search() {
        let token = pow::CancelToken::new();
        assert_eq!(pow::proof_of_work_until(35293, &token), Some(35089));
    }

    #[test]
    fn cancelled_search_returns_none() {
        let token = pow::CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(pow::proof_of_work_until(100, &token), None);
    }

    #[test]
    fn block_serialization_example() {
        let block = reward_block();
        let json = serde_json::to_string(&block).unwrap();
        let deserialized: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block, deserialized);
        assert_eq!(block.hash(), deserialized.hash());
    }
}
