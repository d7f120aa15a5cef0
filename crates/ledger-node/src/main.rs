use clap::Parser;
use ledger_node::{api, Args, HttpPeerClient, Node, NodeConfig};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = NodeConfig::try_from(&args)?;
    let client = HttpPeerClient::new(config.peer_timeout)?;
    let node = Arc::new(Node::new(config, client));

    for peer in &args.peers {
        if let Err(e) = node.register_peer(peer).await {
            warn!(%peer, "ignoring startup peer: {e}");
        }
    }

    let app = api::router(node.clone());

    let addr: SocketAddr = args.listen.parse()?;
    info!(node_id = node.node_id(), "ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
