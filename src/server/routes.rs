use crate::edge::{EdgePatch, EdgeSpec};
use crate::node::{NodePatch, NodeSpec, NodeType};
use crate::query::{Direction, SubgraphFilter};
use crate::server::AppState;
use crate::{Error, MAX_TRAVERSAL_DEPTH, RelationshipType};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: Error) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: err.kind(),
            message: err.to_string(),
        }),
    )
}

#[derive(Deserialize)]
pub struct SubgraphParams {
    pub data_source: Option<String>,
    /// Comma-separated node type names
    pub node_types: Option<String>,
    /// Comma-separated relationship names
    pub relationships: Option<String>,
    pub limit: Option<usize>,
    pub include_metadata: Option<bool>,
}

#[derive(Deserialize)]
pub struct PathParams {
    pub from: String,
    pub to: String,
    pub max_depth: Option<usize>,
    pub direction: Option<String>,
}

#[derive(Deserialize)]
pub struct DepthParams {
    pub max_depth: Option<usize>,
}

#[derive(Deserialize)]
pub struct StatsParams {
    pub data_source: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub include_tombstoned: Option<bool>,
}

fn parse_csv<T: FromStr<Err = Error>>(csv: &str) -> Result<Vec<T>, ApiError> {
    csv.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<T>().map_err(error_response))
        .collect()
}

pub async fn create_node(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<NodeSpec>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let node = state.engine.create_node(spec).map_err(error_response)?;
    Ok(Json(serde_json::to_value(&node).map_err(|e| error_response(e.into()))?))
}

pub async fn bulk_create_nodes(
    State(state): State<Arc<AppState>>,
    Json(specs): Json<Vec<NodeSpec>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state
        .engine
        .bulk_create_nodes(specs)
        .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&report).map_err(|e| error_response(e.into()))?))
}

pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let node = if params.include_tombstoned.unwrap_or(false) {
        state.engine.get_node_any(&id)
    } else {
        state.engine.get_node(&id)
    }
    .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&node).map_err(|e| error_response(e.into()))?))
}

pub async fn update_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<NodePatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let node = state
        .engine
        .update_node(&id, patch)
        .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&node).map_err(|e| error_response(e.into()))?))
}

pub async fn delete_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_node(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_edge(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<EdgeSpec>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let edge = state.engine.create_edge(spec).map_err(error_response)?;
    Ok(Json(serde_json::to_value(&edge).map_err(|e| error_response(e.into()))?))
}

pub async fn get_edge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let edge = if params.include_tombstoned.unwrap_or(false) {
        state.engine.get_edge_any(&id)
    } else {
        state.engine.get_edge(&id)
    }
    .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&edge).map_err(|e| error_response(e.into()))?))
}

pub async fn update_edge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<EdgePatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let edge = state
        .engine
        .update_edge(&id, patch)
        .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&edge).map_err(|e| error_response(e.into()))?))
}

pub async fn delete_edge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_edge(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_subgraph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SubgraphParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let node_types = params
        .node_types
        .as_deref()
        .map(parse_csv::<NodeType>)
        .transpose()?;
    let relationships = params
        .relationships
        .as_deref()
        .map(parse_csv::<RelationshipType>)
        .transpose()?;

    let filter = SubgraphFilter {
        data_source: params.data_source,
        node_types,
        relationships,
        limit: params.limit,
        include_metadata: params.include_metadata.unwrap_or(false),
    };

    let result = state.engine.get_subgraph(&filter).map_err(error_response)?;
    Ok(Json(serde_json::to_value(&result).map_err(|e| error_response(e.into()))?))
}

pub async fn find_paths(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PathParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let direction = params
        .direction
        .as_deref()
        .map(Direction::from_str)
        .transpose()
        .map_err(error_response)?
        .unwrap_or(Direction::Both);
    let max_depth = params.max_depth.unwrap_or(MAX_TRAVERSAL_DEPTH);

    let search = state
        .engine
        .find_paths(&params.from, &params.to, max_depth, direction)
        .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&search).map_err(|e| error_response(e.into()))?))
}

pub async fn analyze_impact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DepthParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let max_depth = params.max_depth.unwrap_or(MAX_TRAVERSAL_DEPTH);
    let report = state
        .engine
        .analyze_impact(&id, max_depth)
        .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&report).map_err(|e| error_response(e.into()))?))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state
        .engine
        .get_statistics(params.data_source.as_deref())
        .map_err(error_response)?;
    Ok(Json(serde_json::to_value(&stats).map_err(|e| error_response(e.into()))?))
}
