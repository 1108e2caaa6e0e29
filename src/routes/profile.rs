use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::dto::admin_dto::UpdateProfilePayload;
use crate::error::Result;
use crate::policy::Actor;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.get(&actor, actor.id).await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.profile_service.update(&actor, actor.id, payload).await?;
    Ok(Json(profile))
}
