use crate::constants::CHAIN_PATH;
use async_trait::async_trait;
use ledger_core::{LedgerError, PeerChain};
use std::time::Duration;

/// Reads a peer's full chain.
#[async_trait]
pub trait PeerClient: Send + Sync + 'static {
    async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, LedgerError>;
}

#[derive(Clone, Debug)]
pub struct HttpPeerClient {
    http: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    /// GET `http://{peer}/chain`. Transport failures, error statuses and
    /// undecodable bodies all count as the peer being unreachable.
    async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, LedgerError> {
        let unreachable = |e: reqwest::Error| LedgerError::PeerUnreachable {
            peer: peer.to_string(),
            reason: e.to_string(),
        };
        let resp = self
            .http
            .get(format!("http://{peer}{CHAIN_PATH}"))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unreachable)?;
        resp.json::<PeerChain>().await.map_err(unreachable)
    }
}
