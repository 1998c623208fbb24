use crate::db::models::Account;
use crate::error::AppResult;
use crate::store::AccountRepository;

pub async fn list_accounts_with_hierarchy(
    accounts: &dyn AccountRepository,
) -> AppResult<Vec<Account>> {
    Ok(accounts.list_with_hierarchy().await?)
}
