use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::AppError;
use crate::models::resume::non_blank;
use crate::models::user::{ProfileUpdate, UserProfile};
use crate::resumes::handlers::OwnerQuery;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<UserProfile>, AppError> {
    state
        .profiles
        .fetch(params.user_id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /api/v1/profile
/// Updates the name and/or profile picture. Absent fields are left alone.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    if update.is_empty() {
        return Err(AppError::Validation(
            "Provide a name or a profile picture".to_string(),
        ));
    }
    if update.name.is_some() && non_blank(update.name.as_deref()).is_none() {
        return Err(AppError::Validation("Name must not be empty".to_string()));
    }
    if update.profile_picture.is_some() && non_blank(update.profile_picture.as_deref()).is_none() {
        return Err(AppError::Validation(
            "Profile picture must not be empty".to_string(),
        ));
    }

    let update = ProfileUpdate {
        name: update.name.map(|n| n.trim().to_string()),
        profile_picture: update.profile_picture.map(|p| p.trim().to_string()),
    };
    state
        .profiles
        .update(params.user_id, &update)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}
