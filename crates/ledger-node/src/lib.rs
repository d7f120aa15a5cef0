//! A ledger node: local chain, proof-of-work mining and longest-chain
//! reconciliation with peers over HTTP.
pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod node;
pub mod peer_client;

pub use config::{Args, NodeConfig};
pub use error::NodeError;
pub use node::Node;
pub use peer_client::{HttpPeerClient, PeerClient};
