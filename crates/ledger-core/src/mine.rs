use crate::constants::{MINING_REWARD, MINING_REWARD_SENDER};
use crate::{Block, Ledger, LedgerError};
use tracing::info;

/// Credit `miner` with the block reward and seal the pending queue under `proof`.
///
/// `previous_hash` must be the hash of the tail the proof was searched against.
pub fn seal_block(
    ledger: &mut Ledger,
    miner: &str,
    proof: u64,
    previous_hash: String,
) -> Result<Block, LedgerError> {
    ledger.new_transaction(MINING_REWARD_SENDER, miner, MINING_REWARD)?;
    let block = ledger.new_block(proof, Some(previous_hash))?;
    info!(
        index = block.index,
        proof = block.proof,
        txs = block.transactions.len(),
        "sealed block"
    );
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pow, valid_chain, Transaction};

    #[test]
    fn seal_block_appends_reward_last() {
        let mut ledger = Ledger::new();
        for i in 0..3 {
            ledger.new_transaction("alice", "bob", i).unwrap();
        }
        let tail = ledger.tail().unwrap();
        let (proof, previous_hash) = (pow::proof_of_work(tail.proof), tail.hash());
        let block = seal_block(&mut ledger, "miner-1", proof, previous_hash).unwrap();

        assert_eq!(block.transactions.len(), 4);
        assert_eq!(
            block.transactions.last(),
            Some(&Transaction::new(MINING_REWARD_SENDER, "miner-1", MINING_REWARD))
        );
        assert!(ledger.pending().is_empty());
        assert!(valid_chain(ledger.chain()));
    }
}
