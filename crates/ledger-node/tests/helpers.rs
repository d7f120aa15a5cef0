use axum::{http::StatusCode, routing::get, Router};
use ledger_node::{api, HttpPeerClient, Node, NodeConfig};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

pub struct TestNode {
    pub addr: String,
    pub node: Arc<Node<HttpPeerClient>>,
}

impl TestNode {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn test_config(node_id: &str) -> NodeConfig {
    NodeConfig {
        node_id: node_id.to_string(),
        mine_timeout: None,
        peer_timeout: Duration::from_secs(2),
    }
}

async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

/// Serve a fresh node on an ephemeral port.
pub async fn spawn_node(node_id: &str) -> anyhow::Result<TestNode> {
    let config = test_config(node_id);
    let client = HttpPeerClient::new(config.peer_timeout)?;
    let node = Arc::new(Node::new(config, client));
    let addr = serve(api::router(node.clone())).await?;
    Ok(TestNode { addr, node })
}

/// A peer whose chain endpoint always answers 500.
pub async fn spawn_failing_peer() -> anyhow::Result<String> {
    let app = Router::new().route("/chain", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    serve(app).await
}

/// A peer whose chain endpoint answers 200 with something that is not a chain.
pub async fn spawn_garbage_peer() -> anyhow::Result<String> {
    let app = Router::new().route("/chain", get(|| async { "definitely not json" }));
    serve(app).await
}

/// An address nothing is listening on.
pub async fn dead_address() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    drop(listener);
    Ok(addr)
}
