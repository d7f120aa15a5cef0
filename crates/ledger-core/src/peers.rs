use crate::LedgerError;
use std::collections::BTreeSet;
use tracing::info;
use url::Url;

/// Known peers as canonical `host[:port]` strings.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Returns `false` when it was already known.
    pub fn register(&mut self, address: &str) -> Result<bool, LedgerError> {
        let peer = canonical_peer(address)?;
        let added = self.peers.insert(peer.clone());
        if added {
            info!(%peer, "registered peer");
        }
        Ok(added)
    }

    /// Add every address or none of them. All addresses are canonicalised
    /// before the set is touched; returns how many were new.
    pub fn register_all<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<usize, LedgerError> {
        let canonical = addresses
            .iter()
            .map(|a| canonical_peer(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut added = 0;
        for peer in canonical {
            if self.peers.insert(peer.clone()) {
                info!(%peer, "registered peer");
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn peers(&self) -> impl Iterator<Item = &str> {
        self.peers.iter().map(String::as_str)
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.peers.contains(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Reduce an address to its network location, dropping scheme, credentials and path.
/// Bare `host:port` input is read as an `http://` URL.
pub fn canonical_peer(address: &str) -> Result<String, LedgerError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(LedgerError::InvalidPeerAddress("empty address".into()));
    }
    let parsed = if address.contains("://") {
        Url::parse(address)
    } else {
        Url::parse(&format!("http://{address}"))
    };
    let url = parsed.map_err(|e| LedgerError::InvalidPeerAddress(format!("{address}: {e}")))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LedgerError::InvalidPeerAddress(format!("{address}: no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
