use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::db::models::PublicUser;
use crate::error::AppResult;
use crate::services::users::{self, RegisterUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUser>,
) -> AppResult<Json<PublicUser>> {
    let user = users::register(
        state.store.users.as_ref(),
        state.config.auth.bcrypt_cost,
        req,
    )
    .await?;
    Ok(Json(user))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<PublicUser>> {
    let user = users::get_user(state.store.users.as_ref(), id).await?;
    Ok(Json(user))
}
