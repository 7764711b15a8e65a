//! Provider data endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::error::ApiError;
use super::state::AppState;
use crate::domain::{FetchRequest, NormalizedPayload, Provider};

/// Routes under `/api`. `/api/weather` and `/api/geolocation` resolve
/// through the provider name; anything else is 404.
pub fn create_provider_router() -> Router<AppState> {
    Router::new().route("/{provider}", get(fetch_provider))
}

/// GET /api/{provider}?<parameters>
pub async fn fetch_provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<NormalizedPayload>, ApiError> {
    let provider: Provider = provider.parse()?;

    let request = FetchRequest::with_parameters(provider, params);
    let payload = state.fetcher.fetch(&request).await?;

    Ok(Json(payload))
}
