//! In-memory credit repository
//!
//! Accounts and transactions sit behind one mutex, so each operation's
//! balance check, balance write and transaction append happen together.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::credit::{Account, CreditRepository, Transaction};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<String, Account>,
    transactions: Vec<Transaction>,
}

impl LedgerState {
    fn has_session(&self, session_id: &str) -> bool {
        self.transactions
            .iter()
            .any(|t| t.external_session_id.as_deref() == Some(session_id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCreditRepository {
    state: Mutex<LedgerState>,
}

impl InMemoryCreditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CreditRepository for InMemoryCreditRepository {
    async fn get_account(&self, subject_id: &str) -> Result<Option<Account>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(subject_id).cloned())
    }

    async fn open_account(&self, opening: Transaction) -> Result<Account, DomainError> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.accounts.get(&opening.subject_id) {
            return Ok(existing.clone());
        }

        let account = Account::new(&opening.subject_id, opening.amount, opening.created_at);
        state
            .accounts
            .insert(opening.subject_id.clone(), account.clone());
        state.transactions.push(opening);

        Ok(account)
    }

    async fn restore_depleted(&self, top_up: Transaction) -> Result<Option<Account>, DomainError> {
        let mut state = self.state.lock().await;

        let account = match state.accounts.get_mut(&top_up.subject_id) {
            Some(account) if account.is_depleted() => account,
            _ => return Ok(None),
        };

        account.balance = top_up.amount;
        account.updated_at = top_up.created_at;
        let updated = account.clone();
        state.transactions.push(top_up);

        Ok(Some(updated))
    }

    async fn debit(&self, debit: Transaction) -> Result<Account, DomainError> {
        let mut state = self.state.lock().await;
        let requested = -debit.amount;

        let account = state.accounts.get_mut(&debit.subject_id).ok_or_else(|| {
            DomainError::not_found(format!("Account '{}' not found", debit.subject_id))
        })?;

        if !account.can_afford(requested) {
            return Err(DomainError::insufficient_balance(account.balance, requested));
        }

        account.balance -= requested;
        account.updated_at = debit.created_at;
        let updated = account.clone();
        state.transactions.push(debit);

        Ok(updated)
    }

    async fn credit(&self, credit: Transaction) -> Result<Account, DomainError> {
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .entry(credit.subject_id.clone())
            .or_insert_with(|| Account::new(&credit.subject_id, 0, credit.created_at));

        account.balance += credit.amount;
        account.updated_at = credit.created_at;
        let updated = account.clone();
        state.transactions.push(credit);

        Ok(updated)
    }

    async fn apply_purchase(&self, purchase: Transaction) -> Result<Option<Account>, DomainError> {
        let session_id = purchase
            .external_session_id
            .clone()
            .ok_or_else(|| DomainError::validation("Purchase requires an external session id"))?;

        let mut state = self.state.lock().await;

        if state.has_session(&session_id) {
            return Ok(None);
        }

        let account = state
            .accounts
            .entry(purchase.subject_id.clone())
            .or_insert_with(|| Account::new(&purchase.subject_id, 0, purchase.created_at));

        account.balance = purchase.amount;
        account.updated_at = purchase.created_at;
        let updated = account.clone();
        state.transactions.push(purchase);

        Ok(Some(updated))
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Transaction>, DomainError> {
        let state = self.state.lock().await;

        Ok(state
            .transactions
            .iter()
            .find(|t| t.external_session_id.as_deref() == Some(session_id))
            .cloned())
    }

    async fn list_transactions(&self, subject_id: &str) -> Result<Vec<Transaction>, DomainError> {
        let state = self.state.lock().await;

        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.subject_id == subject_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_open_account_is_idempotent() {
        let repo = InMemoryCreditRepository::new();
        let now = Utc::now();

        let first = repo
            .open_account(Transaction::signup_bonus("u1", 25, "Welcome bonus credits", now))
            .await
            .unwrap();
        let second = repo
            .open_account(Transaction::signup_bonus("u1", 25, "Welcome bonus credits", now))
            .await
            .unwrap();

        assert_eq!(first.balance, 25);
        assert_eq!(second.balance, 25);
        assert_eq!(repo.list_transactions("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_debit_rejects_overdraft() {
        let repo = InMemoryCreditRepository::new();
        let now = Utc::now();
        repo.open_account(Transaction::signup_bonus("u1", 3, "Welcome bonus credits", now))
            .await
            .unwrap();

        let result = repo
            .debit(Transaction::usage("u1", 5, "Credit deduction", now))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientBalance {
                balance: 3,
                requested: 5
            })
        ));
        assert_eq!(repo.get_account("u1").await.unwrap().unwrap().balance, 3);
        assert_eq!(repo.list_transactions("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_purchase_once_per_session() {
        let repo = InMemoryCreditRepository::new();
        let now = Utc::now();

        let first = repo
            .apply_purchase(Transaction::purchase("u1", 100, "Stripe Checkout purchase", "cs_1", now))
            .await
            .unwrap();
        let second = repo
            .apply_purchase(Transaction::purchase("u1", 100, "Stripe Checkout purchase", "cs_1", now))
            .await
            .unwrap();

        assert_eq!(first.unwrap().balance, 100);
        assert!(second.is_none());
        assert!(repo.find_by_session("cs_1").await.unwrap().is_some());
        assert_eq!(repo.list_transactions("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_restore_only_when_depleted() {
        let repo = InMemoryCreditRepository::new();
        let now = Utc::now();
        repo.open_account(Transaction::signup_bonus("u1", 2, "Welcome bonus credits", now))
            .await
            .unwrap();

        let skipped = repo
            .restore_depleted(Transaction::signup_bonus("u1", 25, "Retroactive free plan", now))
            .await
            .unwrap();
        assert!(skipped.is_none());

        repo.debit(Transaction::usage("u1", 2, "Credit deduction", now))
            .await
            .unwrap();
        let restored = repo
            .restore_depleted(Transaction::signup_bonus("u1", 25, "Retroactive free plan", now))
            .await
            .unwrap();
        assert_eq!(restored.unwrap().balance, 25);
    }
}
