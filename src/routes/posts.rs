use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{PostPublic, PostUpdate};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::pagination::Page;
use crate::services::posts::{self, CreatePost, ListPosts};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RateParams {
    pub rating: i64,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post).get(list_posts))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/{id}/rate", post(rate_post))
}

// --- Handlers ---

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePost>,
) -> AppResult<Json<PostPublic>> {
    let post = posts::create(&state.store, &user, req).await?;
    Ok(Json(post))
}

async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<ListPosts>,
) -> AppResult<Json<Page<PostPublic>>> {
    if let Some(user) = &user {
        tracing::debug!("Listing posts for user {}", user.id);
    }
    let page = posts::list(&state.store, &query).await?;
    Ok(Json(page))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<PostPublic>> {
    let post = posts::get(&state.store, id).await?;
    Ok(Json(post))
}

async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(changes): Json<PostUpdate>,
) -> AppResult<Json<PostPublic>> {
    let post = posts::update(&state.store, id, &changes, &user).await?;
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    posts::delete(&state.store, id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rate_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Query(params): Query<RateParams>,
) -> AppResult<Json<PostPublic>> {
    let post = posts::rate(&state.store, id, params.rating, &user).await?;
    Ok(Json(post))
}
