use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("chain has no genesis block")]
    EmptyChain,

    #[error("invalid chain at block {index}: {reason}")]
    InvalidChain { index: u64, reason: String },

    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("invalid peer address: {0}")]
    InvalidPeerAddress(String),

    #[error("proof search cancelled")]
    MiningCancelled,
}
