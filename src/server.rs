//! Stats trigger server
//!
//! `GET /data/stats.json` rebuilds the report and returns the fresh file.
//! Every other path is a static file under the public directory, so the
//! dashboard and its data come from one origin.

use crate::config::StatsConfig;
use crate::report_core::pipeline::run_pipeline;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub const STATS_ROUTE: &str = "/data/stats.json";

pub struct ServerState {
    pub config: StatsConfig,
}

#[derive(Debug)]
pub enum ServerError {
    Bind(String),
    Serve(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(e) => write!(f, "bind error: {}", e),
            ServerError::Serve(e) => write!(f, "serve error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

pub fn build_router(state: Arc<ServerState>) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route(STATS_ROUTE, get(refresh_stats))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rebuild the report on the blocking pool, then serve what was written
async fn refresh_stats(State(state): State<Arc<ServerState>>) -> Response {
    let config = state.config.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, String> {
        let outcome = run_pipeline(&config).map_err(|e| e.to_string())?;
        std::fs::read(&outcome.output_path).map_err(|e| e.to_string())
    })
    .await;

    match result {
        Ok(Ok(bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            Body::from(bytes),
        )
            .into_response(),
        Ok(Err(e)) => {
            log::error!("❌ Stats refresh failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build stats").into_response()
        }
        Err(e) => {
            log::error!("❌ Stats refresh task panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build stats").into_response()
        }
    }
}

/// Bind and serve until Ctrl-C
pub async fn start_server(config: StatsConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {}: {}", config.bind_addr, e)))?;

    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(e.to_string()))?;
    log::info!("🌐 Stats server listening on http://{}", addr);
    log::info!("   Static files: {}", config.public_dir.display());

    let router = build_router(Arc::new(ServerState { config }));

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("🛑 Shutdown signal received");
        })
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn state_for(dir: &std::path::Path) -> Arc<ServerState> {
        Arc::new(ServerState {
            config: StatsConfig {
                db_path: dir.join("missing.db"),
                game_data_dir: None,
                output_path: dir.join("public").join("data").join("stats.json"),
                public_dir: dir.join("public"),
                bind_addr: "127.0.0.1:0".to_string(),
            },
        })
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_500() {
        let dir = tempdir().unwrap();
        let router = build_router(state_for(dir.path()));

        let response = router
            .oneshot(Request::get(STATS_ROUTE).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Failed to build stats");
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let dir = tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("index.html"), "<h1>Ruins</h1>").unwrap();
        let router = build_router(state_for(dir.path()));

        let response = router
            .clone()
            .oneshot(Request::get("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Ruins</h1>");

        let response = router
            .oneshot(Request::get("/nope.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
