use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use tokenprobe_core::{Credentials, OutputSummary, SessionFactory, SiteTargets};
use tokenprobe_pipeline::run_check;

pub struct AppState {
    pub sessions: Arc<dyn SessionFactory>,
    pub site: SiteTargets,
}

pub fn router(route: &str, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(route, get(handle_login))
        .with_state(state)
}

pub async fn start(listen: &str, route: &str, state: Arc<AppState>) -> Result<()> {
    let app = router(route, state);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("listening on http://{}{}", listener.local_addr()?, route);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// First non-empty value for `key`; blank values count as absent.
fn first_param(params: &[(String, String)], key: &str) -> Option<String> {
    params
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.clone())
}

/// `GET ?username=..&password=..`: run one check with a fresh session.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let (Some(username), Some(password)) = (
        first_param(&params, "username"),
        first_param(&params, "password"),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "username & password required" })),
        )
            .into_response();
    };

    let credentials = Credentials::new(username, password);

    let summary = match state.sessions.open() {
        Ok(session) => run_check(session.as_ref(), &state.site, &credentials).await,
        Err(e) => {
            error!(error = %e, "could not open session");
            OutputSummary::empty(&credentials)
        }
    };

    (StatusCode::OK, Json(summary)).into_response()
}
