//! PostgreSQL credit repository
//!
//! Balance changes use conditional statements inside a transaction so the
//! database row is the single authority for concurrent writers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};

use crate::domain::credit::{Account, CreditRepository, Transaction, TransactionId, TransactionKind};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresCreditRepository {
    pool: PgPool,
}

impl PostgresCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<sqlx::Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))
    }
}

async fn insert_transaction(
    tx: &mut sqlx::Transaction<'static, Postgres>,
    txn: &Transaction,
) -> Result<u64, DomainError> {
    let result = sqlx::query(
        r#"
        INSERT INTO credit_transactions
            (id, subject_id, amount, kind, description, external_session_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (external_session_id) DO NOTHING
        "#,
    )
    .bind(txn.id().as_str())
    .bind(&txn.subject_id)
    .bind(txn.amount)
    .bind(txn.kind.as_str())
    .bind(&txn.description)
    .bind(txn.external_session_id.as_deref())
    .bind(txn.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| DomainError::storage(format!("Failed to insert credit transaction: {}", e)))?;

    Ok(result.rows_affected())
}

async fn commit(tx: sqlx::Transaction<'static, Postgres>) -> Result<(), DomainError> {
    tx.commit()
        .await
        .map_err(|e| DomainError::storage(format!("Failed to commit transaction: {}", e)))
}

#[async_trait]
impl CreditRepository for PostgresCreditRepository {
    async fn get_account(&self, subject_id: &str) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT subject_id, balance, created_at, updated_at
            FROM accounts
            WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        Ok(row.as_ref().map(row_to_account))
    }

    async fn open_account(&self, opening: Transaction) -> Result<Account, DomainError> {
        let mut tx = self.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO accounts (subject_id, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (subject_id) DO NOTHING
            "#,
        )
        .bind(&opening.subject_id)
        .bind(opening.amount)
        .bind(opening.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create account: {}", e)))?
        .rows_affected();

        if inserted == 1 {
            insert_transaction(&mut tx, &opening).await?;
        }

        commit(tx).await?;

        self.get_account(&opening.subject_id).await?.ok_or_else(|| {
            DomainError::storage(format!("Account '{}' missing after insert", opening.subject_id))
        })
    }

    async fn restore_depleted(&self, top_up: Transaction) -> Result<Option<Account>, DomainError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $2, updated_at = $3
            WHERE subject_id = $1 AND balance = 0
            RETURNING subject_id, balance, created_at, updated_at
            "#,
        )
        .bind(&top_up.subject_id)
        .bind(top_up.amount)
        .bind(top_up.created_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to restore account: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        insert_transaction(&mut tx, &top_up).await?;
        commit(tx).await?;

        Ok(Some(row_to_account(&row)))
    }

    async fn debit(&self, debit: Transaction) -> Result<Account, DomainError> {
        let requested = -debit.amount;
        let mut tx = self.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance - $2, updated_at = $3
            WHERE subject_id = $1 AND balance >= $2
            RETURNING subject_id, balance, created_at, updated_at
            "#,
        )
        .bind(&debit.subject_id)
        .bind(requested)
        .bind(debit.created_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to debit account: {}", e)))?;

        let Some(row) = row else {
            drop(tx);

            return match self.get_account(&debit.subject_id).await? {
                Some(account) => Err(DomainError::insufficient_balance(account.balance, requested)),
                None => Err(DomainError::not_found(format!(
                    "Account '{}' not found",
                    debit.subject_id
                ))),
            };
        };

        insert_transaction(&mut tx, &debit).await?;
        commit(tx).await?;

        Ok(row_to_account(&row))
    }

    async fn credit(&self, credit: Transaction) -> Result<Account, DomainError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO accounts (subject_id, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (subject_id)
            DO UPDATE SET balance = accounts.balance + EXCLUDED.balance,
                          updated_at = EXCLUDED.updated_at
            RETURNING subject_id, balance, created_at, updated_at
            "#,
        )
        .bind(&credit.subject_id)
        .bind(credit.amount)
        .bind(credit.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to credit account: {}", e)))?;

        insert_transaction(&mut tx, &credit).await?;
        commit(tx).await?;

        Ok(row_to_account(&row))
    }

    async fn apply_purchase(&self, purchase: Transaction) -> Result<Option<Account>, DomainError> {
        if purchase.external_session_id.is_none() {
            return Err(DomainError::validation(
                "Purchase requires an external session id",
            ));
        }

        let mut tx = self.begin().await?;

        // The unique session id is the idempotency key; losing the race inserts nothing.
        if insert_transaction(&mut tx, &purchase).await? == 0 {
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO accounts (subject_id, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (subject_id)
            DO UPDATE SET balance = EXCLUDED.balance, updated_at = EXCLUDED.updated_at
            RETURNING subject_id, balance, created_at, updated_at
            "#,
        )
        .bind(&purchase.subject_id)
        .bind(purchase.amount)
        .bind(purchase.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to apply purchase: {}", e)))?;

        commit(tx).await?;

        Ok(Some(row_to_account(&row)))
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Transaction>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, subject_id, amount, kind, description, external_session_id, created_at
            FROM credit_transactions
            WHERE external_session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find transaction: {}", e)))?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn list_transactions(&self, subject_id: &str) -> Result<Vec<Transaction>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, subject_id, amount, kind, description, external_session_id, created_at
            FROM credit_transactions
            WHERE subject_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list transactions: {}", e)))?;

        rows.iter().map(row_to_transaction).collect()
    }
}

fn row_to_account(row: &PgRow) -> Account {
    Account {
        subject_id: row.get("subject_id"),
        balance: row.get("balance"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_transaction(row: &PgRow) -> Result<Transaction, DomainError> {
    let id: String = row.get("id");
    let kind: String = row.get("kind");
    let created_at: DateTime<Utc> = row.get("created_at");

    let kind: TransactionKind = kind
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid transaction kind in database: {}", e)))?;

    Ok(Transaction::restore(
        TransactionId::new(id),
        row.get("subject_id"),
        row.get("amount"),
        kind,
        row.get("description"),
        row.get("external_session_id"),
        created_at,
    ))
}
