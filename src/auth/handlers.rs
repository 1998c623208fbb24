use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::services::users::{self, AccessToken, LoginRequest};
use crate::state::AppState;

/// POST /login — exchange username/password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AccessToken>> {
    let token = users::login(state.store.users.as_ref(), &state.tokens, req).await?;
    Ok(Json(token))
}
