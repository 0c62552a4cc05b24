//! Credit ledger repository trait
//!
//! Every mutating operation writes the balance change and its transaction
//! record as one atomic unit. Implementations must never leave a balance
//! below zero.

use async_trait::async_trait;
use std::fmt::Debug;

use super::{Account, Transaction};
use crate::domain::DomainError;

#[async_trait]
pub trait CreditRepository: Send + Sync + Debug {
    /// Get an account by subject id
    async fn get_account(&self, subject_id: &str) -> Result<Option<Account>, DomainError>;

    /// Create the account with `opening.amount` as its balance and record the
    /// opening transaction. If the account already exists nothing is written
    /// and the stored account is returned.
    async fn open_account(&self, opening: Transaction) -> Result<Account, DomainError>;

    /// Set the balance to `top_up.amount` only while it is exactly zero.
    /// Returns `None` when the guard did not match.
    async fn restore_depleted(&self, top_up: Transaction) -> Result<Option<Account>, DomainError>;

    /// Apply a negative-amount transaction if the balance covers it, otherwise
    /// fail with `InsufficientBalance` and leave the account untouched.
    async fn debit(&self, debit: Transaction) -> Result<Account, DomainError>;

    /// Add a positive-amount transaction to the balance, creating the account if needed.
    async fn credit(&self, credit: Transaction) -> Result<Account, DomainError>;

    /// Record a purchase keyed by its external session id and set the balance
    /// to `purchase.amount`. Returns `None` without writing anything if a
    /// transaction with the same session id already exists.
    async fn apply_purchase(&self, purchase: Transaction) -> Result<Option<Account>, DomainError>;

    /// Find the transaction recorded for an external payment session
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Transaction>, DomainError>;

    /// List transactions for a subject, newest first
    async fn list_transactions(&self, subject_id: &str) -> Result<Vec<Transaction>, DomainError>;
}
