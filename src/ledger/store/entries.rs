use sqlx::PgExecutor;

use crate::ledger::error::LedgerError;
use crate::ledger::models::{CreateEntryParams, Entry, ListEntriesParams};

/// Append-only entry rows
pub struct EntryStore;

impl EntryStore {
    pub async fn create<'e, E>(executor: E, arg: CreateEntryParams) -> Result<Entry, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        let entry = sqlx::query_as::<_, Entry>(
            r#"INSERT INTO entries (account_id, amount)
               VALUES ($1, $2)
               RETURNING id, account_id, amount, created_at"#,
        )
        .bind(arg.account_id)
        .bind(arg.amount)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    pub async fn get<'e, E>(executor: E, id: i64) -> Result<Entry, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Entry>(
            r#"SELECT id, account_id, amount, created_at
               FROM entries WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("entry {}", id)))
    }

    /// Entries of one account, oldest first
    pub async fn list<'e, E>(executor: E, arg: ListEntriesParams) -> Result<Vec<Entry>, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        let entries = sqlx::query_as::<_, Entry>(
            r#"SELECT id, account_id, amount, created_at
               FROM entries
               WHERE account_id = $1
               ORDER BY id
               LIMIT $2 OFFSET $3"#,
        )
        .bind(arg.account_id)
        .bind(arg.limit)
        .bind(arg.offset)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }
}
