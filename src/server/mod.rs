//! HTTP server - thin JSON transport over the lineage engine
//!
//! Carries no business logic: handlers decode parameters, call the engine
//! and map its error kinds onto HTTP status codes.

use crate::engine::LineageEngine;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod routes;

/// Server state
pub struct AppState {
    pub engine: LineageEngine,
}

pub async fn start_server(port: u16, engine: LineageEngine) -> anyhow::Result<()> {
    let state = Arc::new(AppState { engine });

    let app = Router::new()
        .route("/stats", get(routes::get_stats))
        .route("/subgraph", get(routes::get_subgraph))
        .route("/paths", get(routes::find_paths))
        .route("/impact/{id}", get(routes::analyze_impact))
        .route("/nodes", post(routes::create_node))
        .route("/nodes/bulk", post(routes::bulk_create_nodes))
        .route(
            "/nodes/{id}",
            get(routes::get_node)
                .patch(routes::update_node)
                .delete(routes::delete_node),
        )
        .route("/edges", post(routes::create_edge))
        .route(
            "/edges/{id}",
            get(routes::get_edge)
                .patch(routes::update_edge)
                .delete(routes::delete_edge),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting lineage server on {}", addr);
    println!("🌍 Lineage server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
