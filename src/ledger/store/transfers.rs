use sqlx::PgExecutor;

use crate::ledger::error::LedgerError;
use crate::ledger::models::{CreateTransferParams, ListTransfersParams, Transfer};

/// Append-only transfer rows
pub struct TransferStore;

impl TransferStore {
    pub async fn create<'e, E>(executor: E, arg: CreateTransferParams) -> Result<Transfer, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"INSERT INTO transfers (from_account_id, to_account_id, amount)
               VALUES ($1, $2, $3)
               RETURNING id, from_account_id, to_account_id, amount, created_at"#,
        )
        .bind(arg.from_account_id)
        .bind(arg.to_account_id)
        .bind(arg.amount)
        .fetch_one(executor)
        .await?;

        Ok(transfer)
    }

    pub async fn get<'e, E>(executor: E, id: i64) -> Result<Transfer, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Transfer>(
            r#"SELECT id, from_account_id, to_account_id, amount, created_at
               FROM transfers WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("transfer {}", id)))
    }

    pub async fn list<'e, E>(
        executor: E,
        arg: ListTransfersParams,
    ) -> Result<Vec<Transfer>, LedgerError>
    where
        E: PgExecutor<'e>,
    {
        let transfers = sqlx::query_as::<_, Transfer>(
            r#"SELECT id, from_account_id, to_account_id, amount, created_at
               FROM transfers
               WHERE from_account_id = $1 OR to_account_id = $2
               ORDER BY id
               LIMIT $3 OFFSET $4"#,
        )
        .bind(arg.from_account_id)
        .bind(arg.to_account_id)
        .bind(arg.limit)
        .bind(arg.offset)
        .fetch_all(executor)
        .await?;

        Ok(transfers)
    }
}
