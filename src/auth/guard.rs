use crate::auth::tokens::TokenService;
use crate::db::models::User;
use crate::error::{AppError, AppResult, INVALID_TOKEN};
use crate::store::UserRepository;

/// Resolve a bearer token to the user it was issued for.
///
/// A bad signature, an expired token and a token whose user has since been
/// deleted all produce the same `Unauthenticated` error, so callers cannot
/// tell whether an account exists.
pub async fn current_user(
    users: &dyn UserRepository,
    tokens: &TokenService,
    token: &str,
) -> AppResult<User> {
    let user_id = tokens.validate(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::Unauthenticated(INVALID_TOKEN)
    })?;

    users.get(user_id).await?.ok_or_else(|| {
        tracing::debug!("Bearer token refers to missing user {}", user_id);
        AppError::Unauthenticated(INVALID_TOKEN)
    })
}
