use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::{pow, Block, LedgerError, Transaction};
use tracing::debug;

/// One node's chain plus the transactions waiting for the next block.
///
/// Invariants:
/// - The chain always starts with the genesis block.
/// - Indices are contiguous starting from 1.
/// - A transaction leaves `pending` only by being sealed into a block.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            chain: vec![genesis_block()],
            pending: Vec::new(),
        }
    }

    /// Seal every pending transaction into a new block and append it.
    ///
    /// `proof` is taken as given; checking it is the miner's job.
    pub fn new_block(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<Block, LedgerError> {
        let previous_hash = match previous_hash {
            Some(h) => h,
            None => self.tail()?.hash(),
        };
        let index = self.chain.len() as u64 + 1;
        let txs = std::mem::take(&mut self.pending);
        let block = Block::new(index, txs, proof, previous_hash);
        self.chain.push(block.clone());
        Ok(block)
    }

    /// Queue a transaction and return the index of the block expected to hold it.
    pub fn new_transaction(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        if sender.trim().is_empty() {
            return Err(LedgerError::MalformedRequest("missing sender".into()));
        }
        if recipient.trim().is_empty() {
            return Err(LedgerError::MalformedRequest("missing recipient".into()));
        }
        let next_index = self.tail()?.index + 1;
        self.pending.push(Transaction::new(sender, recipient, amount));
        Ok(next_index)
    }

    pub fn tail(&self) -> Result<&Block, LedgerError> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Swap in a chain received from a peer. Pending transactions stay queued.
    pub fn replace_chain(&mut self, chain: Vec<Block>) -> Result<(), LedgerError> {
        validate_chain(&chain)?;
        self.chain = chain;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn without_genesis() -> Self {
        Self {
            chain: Vec::new(),
            pending: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn chain_mut(&mut self) -> &mut Vec<Block> {
        &mut self.chain
    }
}

pub fn genesis_block() -> Block {
    Block::new(1, vec![], GENESIS_PROOF, GENESIS_PREVIOUS_HASH)
}

fn is_genesis(block: &Block) -> bool {
    block.index == 1
        && block.previous_hash == GENESIS_PREVIOUS_HASH
        && block.proof == GENESIS_PROOF
}

/// Walk `chain` and report the first block that breaks linkage or the puzzle.
pub fn validate_chain(chain: &[Block]) -> Result<(), LedgerError> {
    let Some(first) = chain.first() else {
        return Err(LedgerError::InvalidChain {
            index: 0,
            reason: "chain is empty".into(),
        });
    };
    if !is_genesis(first) {
        return Err(LedgerError::InvalidChain {
            index: first.index,
            reason: "first block is not a genesis block".into(),
        });
    }

    for pair in chain.windows(2) {
        let (prev, block) = (&pair[0], &pair[1]);
        let invalid = |reason: &str| LedgerError::InvalidChain {
            index: block.index,
            reason: reason.to_string(),
        };
        if block.index != prev.index + 1 {
            return Err(invalid("index does not follow previous block"));
        }
        if block.previous_hash != prev.hash() {
            return Err(invalid("previous_hash does not match previous block"));
        }
        if !pow::valid_proof(prev.proof, block.proof) {
            return Err(invalid("proof does not solve the puzzle"));
        }
    }
    Ok(())
}

pub fn valid_chain(chain: &[Block]) -> bool {
    match validate_chain(chain) {
        Ok(()) => true,
        Err(e) => {
            debug!("chain rejected: {e}");
            false
        }
    }
}
