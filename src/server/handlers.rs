use super::protocol::{
    CreateRequest, MembersRequest, MembersResponse, SubmitResponse, TxnResponse, TxnState,
    UpdateRequest,
};
use super::runtime::NodeHandle;
use crate::error::KvError;
use crate::node::NodeStatus;
use crate::replication::types::TxnId;
use crate::ring::Address;
use crate::storage::OpKind;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    routing::{get, post, put},
};

pub fn router(handle: NodeHandle) -> Router {
    Router::new()
        .route("/kv", post(handle_create))
        .route(
            "/kv/:key",
            get(handle_read).put(handle_update).delete(handle_delete),
        )
        .route("/txn/:id", get(handle_get_txn))
        .route("/status", get(handle_status))
        .route("/members", put(handle_set_members))
        .layer(Extension(handle))
}

pub async fn handle_create(
    Extension(node): Extension<NodeHandle>,
    Json(req): Json<CreateRequest>,
) -> (StatusCode, Json<SubmitResponse>) {
    submit(&node, OpKind::Create, req.key, Some(req.value)).await
}

pub async fn handle_read(
    Extension(node): Extension<NodeHandle>,
    Path(key): Path<String>,
) -> (StatusCode, Json<SubmitResponse>) {
    submit(&node, OpKind::Read, key, None).await
}

pub async fn handle_update(
    Extension(node): Extension<NodeHandle>,
    Path(key): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> (StatusCode, Json<SubmitResponse>) {
    submit(&node, OpKind::Update, key, Some(req.value)).await
}

pub async fn handle_delete(
    Extension(node): Extension<NodeHandle>,
    Path(key): Path<String>,
) -> (StatusCode, Json<SubmitResponse>) {
    submit(&node, OpKind::Delete, key, None).await
}

async fn submit(
    node: &NodeHandle,
    op: OpKind,
    key: String,
    value: Option<String>,
) -> (StatusCode, Json<SubmitResponse>) {
    match node.submit(op, key.clone(), value).await {
        Ok(txn) => {
            tracing::info!("Accepted {} {} as txn {}", op, key, txn);
            (StatusCode::ACCEPTED, Json(SubmitResponse::accepted(txn)))
        }
        Err(e) => {
            tracing::warn!("Rejected {} {}: {}", op, key, e);
            (status_for(&e), Json(SubmitResponse::rejected(&e)))
        }
    }
}

fn status_for(error: &KvError) -> StatusCode {
    match error {
        KvError::UnderReplicated { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn handle_get_txn(
    Extension(node): Extension<NodeHandle>,
    Path(id): Path<u64>,
) -> (StatusCode, Json<Option<TxnResponse>>) {
    match node.transaction(TxnId(id)).await {
        Ok(response) if response.state == TxnState::Unknown => {
            (StatusCode::NOT_FOUND, Json(Some(response)))
        }
        Ok(response) => (StatusCode::OK, Json(Some(response))),
        Err(e) => {
            tracing::error!("Failed to look up txn {}: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(None))
        }
    }
}

pub async fn handle_status(
    Extension(node): Extension<NodeHandle>,
) -> (StatusCode, Json<Option<NodeStatus>>) {
    match node.status().await {
        Ok(status) => (StatusCode::OK, Json(Some(status))),
        Err(e) => {
            tracing::error!("Failed to read node status: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(None))
        }
    }
}

pub async fn handle_set_members(
    Extension(node): Extension<NodeHandle>,
    Json(req): Json<MembersRequest>,
) -> (StatusCode, Json<MembersResponse>) {
    let members = req.members.into_iter().map(Address::new).collect();
    let count = node.set_members(members);
    (StatusCode::OK, Json(MembersResponse { members: count }))
}
