use crate::{config::NodeConfig, error::NodeError, peer_client::PeerClient};
use ledger_core::{
    mine::seal_block,
    pow::{self, CancelToken},
    select_longest_chain, Block, Ledger, LedgerError, PeerChain, PeerRegistry,
};
use std::sync::Arc;
use tokio::{
    sync::{Mutex, RwLock},
    task::{JoinHandle, JoinSet},
    time::Instant,
};
use tracing::{debug, info, warn};

/// The node's ledger and peer set.
///
/// All chain and queue mutation goes through the single `ledger` lock. The
/// proof search and peer fetches run with no lock held.
pub struct Node<C> {
    ledger: Mutex<Ledger>,
    peers: RwLock<PeerRegistry>,
    client: Arc<C>,
    config: NodeConfig,
}

impl<C: PeerClient> Node<C> {
    pub fn new(config: NodeConfig, client: C) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new()),
            peers: RwLock::new(PeerRegistry::new()),
            client: Arc::new(client),
            config,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    /// Mine one block, giving up after the configured timeout if there is one.
    pub async fn mine(&self) -> Result<Block, NodeError> {
        self.mine_with_cancel(CancelToken::new()).await
    }

    /// Mine one block. Cancelling `cancel` abandons the proof search.
    ///
    /// If the tail changes while the search runs, the search starts over
    /// against the new tail. The configured timeout covers all attempts.
    pub async fn mine_with_cancel(&self, cancel: CancelToken) -> Result<Block, NodeError> {
        let deadline = self.config.mine_timeout.map(|timeout| Instant::now() + timeout);
        // Stops the blocking search if this future is dropped mid-flight.
        let mut guard = SearchGuard {
            cancel: cancel.clone(),
            timer: deadline.map(|at| {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::time::sleep_until(at).await;
                    cancel.cancel();
                })
            }),
            armed: true,
        };

        loop {
            if deadline.is_some_and(|at| Instant::now() >= at) {
                return Err(LedgerError::MiningCancelled.into());
            }
            let (last_proof, last_hash) = {
                let ledger = self.ledger.lock().await;
                let tail = ledger.tail()?;
                (tail.proof, tail.hash())
            };

            let search = cancel.clone();
            let found =
                tokio::task::spawn_blocking(move || pow::proof_of_work_until(last_proof, &search))
                    .await?;
            let proof = found.ok_or(LedgerError::MiningCancelled)?;

            let mut ledger = self.ledger.lock().await;
            if ledger.tail()?.hash() != last_hash {
                debug!(last_proof, "tail moved during proof search, restarting");
                continue;
            }
            guard.disarm();
            return Ok(seal_block(&mut ledger, &self.config.node_id, proof, last_hash)?);
        }
    }

    /// Queue a transaction; returns the index of the block expected to hold it.
    pub async fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: u64,
    ) -> Result<u64, NodeError> {
        let index = self
            .ledger
            .lock()
            .await
            .new_transaction(sender, recipient, amount)?;
        debug!(sender, recipient, amount, index, "queued transaction");
        Ok(index)
    }

    pub async fn get_chain(&self) -> PeerChain {
        PeerChain::new(self.ledger.lock().await.chain().to_vec())
    }

    pub async fn pending(&self) -> usize {
        self.ledger.lock().await.pending().len()
    }

    pub async fn register_peer(&self, address: &str) -> Result<bool, NodeError> {
        Ok(self.peers.write().await.register(address)?)
    }

    /// Register every address, or none if any of them is invalid.
    pub async fn register_peers(&self, addresses: &[String]) -> Result<usize, NodeError> {
        Ok(self.peers.write().await.register_all(addresses)?)
    }

    pub async fn peers(&self) -> Vec<String> {
        self.peers.read().await.peers().map(str::to_owned).collect()
    }

    /// Adopt the longest valid peer chain that beats the local one.
    ///
    /// Peers are fetched concurrently. A peer that fails to answer contributes
    /// nothing; resolution itself only fails on a local invariant breach.
    pub async fn resolve(&self) -> Result<(bool, Vec<Block>), NodeError> {
        let peers = self.peers().await;
        let local_len = self.ledger.lock().await.len() as u64;

        let mut tasks = JoinSet::new();
        for peer in peers {
            let client = Arc::clone(&self.client);
            tasks.spawn(async move {
                let fetched = client.fetch_chain(&peer).await;
                (peer, fetched)
            });
        }

        let mut candidates = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((peer, Ok(chain))) => candidates.push((peer, chain)),
                Ok((peer, Err(e))) => warn!(%peer, "skipping peer: {e}"),
                Err(e) => warn!("peer fetch task failed: {e}"),
            }
        }
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let best = select_longest_chain(local_len, candidates);

        let mut ledger = self.ledger.lock().await;
        let replaced = match best {
            Some((peer, chain)) if chain.len() > ledger.len() => {
                let length = chain.len();
                ledger.replace_chain(chain)?;
                info!(%peer, length, "replaced local chain");
                true
            }
            Some((peer, chain)) => {
                info!(
                    %peer,
                    length = chain.len(),
                    local = ledger.len(),
                    "local chain grew during resolution, keeping it"
                );
                false
            }
            None => false,
        };
        Ok((replaced, ledger.chain().to_vec()))
    }
}

struct SearchGuard {
    cancel: CancelToken,
    timer: Option<JoinHandle<()>>,
    armed: bool,
}

impl SearchGuard {
    fn disarm(&mut self) {
        self.armed = false;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SearchGuard {
    fn drop(&mut self) {
        if self.armed {
            self.cancel.cancel();
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
