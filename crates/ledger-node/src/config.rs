use crate::constants::{DEFAULT_LISTEN, DEFAULT_PEER_TIMEOUT_SECS, NODE_ID_BYTES};
use clap::Parser;
use ledger_core::LedgerError;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node with longest-chain consensus")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Identity credited with mining rewards (random when omitted)
    #[arg(long)]
    pub node_id: Option<String>,

    /// Peer to register at startup; may be repeated
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Abandon a proof search after this many seconds
    #[arg(long)]
    pub mine_timeout_secs: Option<u64>,

    /// Timeout for fetching a peer's chain
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT_SECS)]
    pub peer_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Recipient of the mining reward.
    pub node_id: String,
    /// `None` keeps the proof search unbounded.
    pub mine_timeout: Option<Duration>,
    pub peer_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: random_node_id(),
            mine_timeout: None,
            peer_timeout: Duration::from_secs(DEFAULT_PEER_TIMEOUT_SECS),
        }
    }
}

impl TryFrom<&Args> for NodeConfig {
    type Error = LedgerError;

    /// A blank `--node-id` is rejected.
    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let node_id = match &args.node_id {
            Some(id) if id.trim().is_empty() => {
                return Err(LedgerError::MalformedRequest(
                    "node id must not be blank".into(),
                ))
            }
            Some(id) => id.clone(),
            None => random_node_id(),
        };
        Ok(Self {
            node_id,
            mine_timeout: args.mine_timeout_secs.map(Duration::from_secs),
            peer_timeout: Duration::from_secs(args.peer_timeout_secs),
        })
    }
}

pub fn random_node_id() -> String {
    hex::encode(rand::random::<[u8; NODE_ID_BYTES]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_defaults() {
        let args = Args::parse_from(["ledger-node"]);
        assert_eq!(args.listen, DEFAULT_LISTEN);
        assert!(args.peers.is_empty());
        let config = NodeConfig::try_from(&args).unwrap();
        assert_eq!(config.node_id.len(), NODE_ID_BYTES * 2);
        assert_eq!(config.mine_timeout, None);
        assert_eq!(config.peer_timeout, Duration::from_secs(DEFAULT_PEER_TIMEOUT_SECS));
    }

    #[test]
    fn args_overrides() {
        let args = Args::parse_from([
            "ledger-node",
            "--listen",
            "0.0.0.0:5001",
            "--node-id",
            "miner-7",
            "--peer",
            "127.0.0.1:5002",
            "--peer",
            "http://127.0.0.1:5003",
            "--mine-timeout-secs",
            "30",
            "--peer-timeout-secs",
            "2",
        ]);
        assert_eq!(args.peers.len(), 2);
        let config = NodeConfig::try_from(&args).unwrap();
        assert_eq!(config.node_id, "miner-7");
        assert_eq!(config.mine_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.peer_timeout, Duration::from_secs(2));
    }

    #[test]
    fn blank_node_id_is_rejected() {
        for blank in ["", "   "] {
            let args = Args::parse_from(["ledger-node", "--node-id", blank]);
            assert!(matches!(
                NodeConfig::try_from(&args),
                Err(LedgerError::MalformedRequest(_))
            ));
        }
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(random_node_id(), random_node_id());
    }
}
