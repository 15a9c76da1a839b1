//! Profile API handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use composer_core::EncodingProfile;

use super::handlers::{error_response, ApiError};
use crate::state::AppState;

/// Response for listing profiles
#[derive(Debug, Serialize)]
pub struct ListProfilesResponse {
    pub profiles: Vec<EncodingProfile>,
    pub total: usize,
}

/// List the registered encoding profiles
pub async fn list_profiles(State(state): State<Arc<AppState>>) -> Json<ListProfilesResponse> {
    let mut profiles: Vec<EncodingProfile> = state
        .composer()
        .list_profiles()
        .iter()
        .map(|profile| profile.as_ref().clone())
        .collect();
    profiles.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    let total = profiles.len();
    Json(ListProfilesResponse { profiles, total })
}

/// Get a profile by identifier
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EncodingProfile>, ApiError> {
    state
        .composer()
        .get_profile(&id)
        .map(|profile| Json(profile.as_ref().clone()))
        .map_err(error_response)
}
