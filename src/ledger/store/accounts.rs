use sqlx::PgExecutor;

use crate::ledger::error::LedgerError;
use crate::ledger::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, ListAccountsParams, UpdateAccountParams,
};

/// Account rows
pub struct AccountStore;

impl AccountStore {
    pub async fn create<'e, E>(executor: E, arg: &CreateAccountParams) -> Result<Account, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        let account = sqlx::query_as::<_, Account>(
            r#"INSERT INTO accounts (owner, balance, currency)
               VALUES ($1, $2, $3)
               RETURNING id, owner, balance, currency, created_at"#,
        )
        .bind(&arg.owner)
        .bind(arg.balance)
        .bind(&arg.currency)
        .fetch_one(executor)
        .await?;

        Ok(account)
    }

    pub async fn get<'e, E>(executor: E, id: i64) -> Result<Account, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Account>(
            r#"SELECT id, owner, balance, currency, created_at
               FROM accounts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("account {}", id)))
    }

    /// Read and lock the row until the enclosing transaction ends.
    /// `NO KEY UPDATE` does not block concurrent inserts referencing the
    /// account.
    pub async fn get_for_update<'e, E>(executor: E, id: i64) -> Result<Account, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Account>(
            r#"SELECT id, owner, balance, currency, created_at
               FROM accounts WHERE id = $1
               FOR NO KEY UPDATE"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("account {}", id)))
    }

    /// Accounts ordered by id
    pub async fn list<'e, E>(executor: E, arg: ListAccountsParams) -> Result<Vec<Account>, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        let accounts = sqlx::query_as::<_, Account>(
            r#"SELECT id, owner, balance, currency, created_at
               FROM accounts
               ORDER BY id
               LIMIT $1 OFFSET $2"#,
        )
        .bind(arg.limit)
        .bind(arg.offset)
        .fetch_all(executor)
        .await?;

        Ok(accounts)
    }

    /// Overwrite the balance. Administrative path; transfers use
    /// [`AccountStore::add_balance`].
    pub async fn update<'e, E>(executor: E, arg: UpdateAccountParams) -> Result<Account, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Account>(
            r#"UPDATE accounts SET balance = $2
               WHERE id = $1
               RETURNING id, owner, balance, currency, created_at"#,
        )
        .bind(arg.id)
        .bind(arg.balance)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("account {}", arg.id)))
    }

    /// Single-statement read-modify-write: the row lock taken by the UPDATE
    /// serializes concurrent increments, so none is lost.
    pub async fn add_balance<'e, E>(
        executor: E,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Account>(
            r#"UPDATE accounts SET balance = balance + $2
               WHERE id = $1
               RETURNING id, owner, balance, currency, created_at"#,
        )
        .bind(arg.id)
        .bind(arg.amount)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("account {}", arg.id)))
    }

    /// Fails with `ConstraintViolation` while entries or transfers still
    /// reference the account.
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), LedgerError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| match LedgerError::from(e) {
                LedgerError::NotFound(msg) => LedgerError::ConstraintViolation(msg),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(format!("account {}", id)));
        }
        Ok(())
    }
}
