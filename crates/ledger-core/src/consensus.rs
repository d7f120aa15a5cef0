use crate::{validate_chain, Block};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Body of a node's chain endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerChain {
    pub chain: Vec<Block>,
    pub length: u64,
}

impl PeerChain {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len() as u64;
        Self { chain, length }
    }
}

/// Pick the longest valid chain strictly longer than `local_len`.
///
/// The result depends only on lengths, not on the order peers are scanned in,
/// except among candidates of the same winning length where the first one seen
/// is kept. Equal-length candidates never beat the local chain.
pub fn select_longest_chain<I>(local_len: u64, candidates: I) -> Option<(String, Vec<Block>)>
where
    I: IntoIterator<Item = (String, PeerChain)>,
{
    let mut max_length = local_len;
    let mut best = None;

    for (peer, candidate) in candidates {
        if candidate.length <= max_length {
            debug!(%peer, length = candidate.length, max_length, "peer chain not longer");
            continue;
        }
        if candidate.length != candidate.chain.len() as u64 {
            debug!(
                %peer,
                reported = candidate.length,
                actual = candidate.chain.len(),
                "peer chain length mismatch"
            );
            continue;
        }
        if let Err(e) = validate_chain(&candidate.chain) {
            info!(%peer, "discarding peer chain: {e}");
            continue;
        }
        max_length = candidate.length;
        best = Some((peer, candidate.chain));
    }
    best
}
