use std::collections::HashMap;

use async_trait::async_trait;

use super::RepositoryError;
use crate::db::models::{Account, Company, Site};
use crate::state::DbPool;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// All accounts with their companies, and each company's sites.
    async fn list_with_hierarchy(&self) -> Result<Vec<Account>, RepositoryError>;
}

pub struct SqliteAccountRepository {
    pool: DbPool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn list_with_hierarchy(&self) -> Result<Vec<Account>, RepositoryError> {
        let conn = self.pool.get()?;

        // Three queries regardless of how many rows: accounts, companies,
        // then every site/company link. Stitched together in memory.
        let mut stmt = conn.prepare("SELECT id, name FROM accounts ORDER BY id")?;
        let mut accounts: Vec<Account> = stmt
            .query_map([], |row| {
                Ok(Account {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    companies: Vec::new(),
                })
            })?
            .collect::<Result<_, _>>()?;

        let mut stmt = conn.prepare("SELECT id, name, account_id FROM companies ORDER BY id")?;
        let companies: Vec<Company> = stmt
            .query_map([], |row| {
                Ok(Company {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    account_id: row.get(2)?,
                    sites: Vec::new(),
                })
            })?
            .collect::<Result<_, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT l.company_id, s.id, s.name
             FROM sites_companies_links l
             JOIN sites s ON s.id = l.site_id
             ORDER BY s.id",
        )?;
        let links: Vec<(i64, Site)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    Site {
                        id: row.get(1)?,
                        name: row.get(2)?,
                    },
                ))
            })?
            .collect::<Result<_, _>>()?;

        let mut sites_by_company: HashMap<i64, Vec<Site>> = HashMap::new();
        for (company_id, site) in links {
            sites_by_company.entry(company_id).or_default().push(site);
        }

        let mut companies_by_account: HashMap<i64, Vec<Company>> = HashMap::new();
        for mut company in companies {
            company.sites = sites_by_company.remove(&company.id).unwrap_or_default();
            companies_by_account
                .entry(company.account_id)
                .or_default()
                .push(company);
        }

        for account in &mut accounts {
            account.companies = companies_by_account.remove(&account.id).unwrap_or_default();
        }

        Ok(accounts)
    }
}
