use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("malformed request: {0}")]
    Body(#[from] JsonRejection),

    #[error("proof search task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl NodeError {
    pub fn status(&self) -> StatusCode {
        match self {
            NodeError::Ledger(LedgerError::MalformedRequest(_))
            | NodeError::Ledger(LedgerError::InvalidPeerAddress(_))
            | NodeError::Body(_) => StatusCode::BAD_REQUEST,
            NodeError::Ledger(LedgerError::MiningCancelled) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
