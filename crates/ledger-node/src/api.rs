use crate::{constants::CHAIN_PATH, error::NodeError, node::Node, peer_client::PeerClient};
use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::{LedgerError, PeerChain, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/// Fields are optional so a missing one is reported as a malformed request
/// instead of a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct TxIn {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterIn {
    pub nodes: Option<Vec<String>>,
}

/// `Json` whose rejections come back as a [`NodeError`] JSON body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(NodeError))]
pub struct AppJson<T>(pub T);

pub fn router<C: PeerClient>(node: Arc<Node<C>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mine", get(mine::<C>))
        .route("/transactions/new", post(new_transaction::<C>))
        .route(CHAIN_PATH, get(full_chain::<C>))
        .route("/nodes/register", post(register_nodes::<C>))
        .route("/nodes/resolve", get(consensus::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".into(),
    })
}

async fn mine<C: PeerClient>(
    State(node): State<Arc<Node<C>>>,
) -> Result<Json<MineResponse>, NodeError> {
    let block = node.mine().await?;
    Ok(Json(MineResponse {
        message: "New Block Created".into(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction<C: PeerClient>(
    State(node): State<Arc<Node<C>>>,
    AppJson(tx): AppJson<TxIn>,
) -> Result<(StatusCode, Json<Value>), NodeError> {
    let (Some(sender), Some(recipient), Some(amount)) = (tx.sender, tx.recipient, tx.amount)
    else {
        return Err(LedgerError::MalformedRequest("Missing values".into()).into());
    };
    let index = node.submit_transaction(&sender, &recipient, amount).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("Transaction will be added to block {index}") })),
    ))
}

async fn full_chain<C: PeerClient>(State(node): State<Arc<Node<C>>>) -> Json<PeerChain> {
    Json(node.get_chain().await)
}

async fn register_nodes<C: PeerClient>(
    State(node): State<Arc<Node<C>>>,
    AppJson(body): AppJson<RegisterIn>,
) -> Result<(StatusCode, Json<Value>), NodeError> {
    let Some(nodes) = body.nodes else {
        return Err(
            LedgerError::MalformedRequest("Please supply a valid list of nodes".into()).into(),
        );
    };
    node.register_peers(&nodes).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "New nodes have been added",
            "total_nodes": node.peers().await,
        })),
    ))
}

async fn consensus<C: PeerClient>(
    State(node): State<Arc<Node<C>>>,
) -> Result<Json<Value>, NodeError> {
    let (replaced, chain) = node.resolve().await?;
    let body = if replaced {
        json!({ "message": "Our chain was replaced", "new_chain": chain })
    } else {
        json!({ "message": "Our chain is authoritative", "chain": chain })
    };
    Ok(Json(body))
}
