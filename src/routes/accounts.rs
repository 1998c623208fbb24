use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::Account;
use crate::error::AppResult;
use crate::services::accounts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/test/", get(list_accounts))
}

async fn list_accounts(State(state): State<AppState>) -> AppResult<Json<Vec<Account>>> {
    let hierarchy = accounts::list_accounts_with_hierarchy(state.store.accounts.as_ref()).await?;
    Ok(Json(hierarchy))
}
