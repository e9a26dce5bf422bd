//! Listed-company registry status and manual refresh

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Registry cache state
#[derive(Debug, Serialize)]
pub struct RegistryStatus {
    pub enabled: bool,
    pub cached: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of a forced refetch
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: String,
    pub listed_roots: usize,
    pub expires_at: Option<DateTime<Utc>>,
}

/// GET /api/registry
pub async fn registry_status(State(state): State<AppState>) -> Json<RegistryStatus> {
    let expires_at = state.registry.expires_at().await;
    Json(RegistryStatus {
        enabled: state.registry_enabled,
        cached: expires_at.is_some(),
        expires_at,
    })
}

/// POST /api/registry/refresh
///
/// Refetches the registry now. A failed refresh keeps the previous set.
pub async fn refresh_registry(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    if !state.registry_enabled {
        return Err(ApiError::BadRequest(
            "Registry lookups are disabled in server configuration".to_string(),
        ));
    }

    info!("Manual registry refresh requested");
    let set = state.registry.refresh(Utc::now()).await?;

    Ok(Json(RefreshResponse {
        status: "ok".to_string(),
        listed_roots: set.len(),
        expires_at: state.registry.expires_at().await,
    }))
}
