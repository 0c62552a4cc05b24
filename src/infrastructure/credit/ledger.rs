//! Credit ledger service

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::credit::{Account, CreditRepository, Transaction, TransactionKind};
use crate::domain::{Clock, DomainError};

pub const DEFAULT_SIGNUP_BONUS: i64 = 25;

const WELCOME_DESCRIPTION: &str = "Welcome bonus credits";
const RETROACTIVE_DESCRIPTION: &str = "Retroactive free plan";
const DEDUCTION_DESCRIPTION: &str = "Credit deduction";

/// Result of an idempotent purchase grant
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    Applied(Account),
    /// A transaction for the same external session already exists
    AlreadyApplied,
}

impl PurchaseOutcome {
    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

#[derive(Debug)]
pub struct CreditLedger {
    repository: Arc<dyn CreditRepository>,
    clock: Arc<dyn Clock>,
    signup_bonus: i64,
}

impl CreditLedger {
    pub fn new(repository: Arc<dyn CreditRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            signup_bonus: DEFAULT_SIGNUP_BONUS,
        }
    }

    pub fn with_signup_bonus(mut self, bonus: i64) -> Self {
        self.signup_bonus = bonus;
        self
    }

    /// Current balance, opening the account with the signup bonus on first
    /// read and topping a zero balance back up to the bonus.
    pub async fn get_balance(&self, subject_id: &str) -> Result<i64, DomainError> {
        validate_subject(subject_id)?;

        let account = match self.repository.get_account(subject_id).await? {
            None => self.open(subject_id).await?,
            Some(account) if account.is_depleted() => {
                let top_up = Transaction::signup_bonus(
                    subject_id,
                    self.signup_bonus,
                    RETROACTIVE_DESCRIPTION,
                    self.clock.now(),
                );

                match self.repository.restore_depleted(top_up).await? {
                    Some(restored) => {
                        info!(subject_id = %subject_id, balance = restored.balance, "Restored depleted account");
                        restored
                    }
                    None => self
                        .repository
                        .get_account(subject_id)
                        .await?
                        .unwrap_or(account),
                }
            }
            Some(account) => account,
        };

        Ok(account.balance)
    }

    /// Deduct `amount` credits, returning the new balance
    pub async fn deduct(&self, subject_id: &str, amount: i64) -> Result<i64, DomainError> {
        validate_subject(subject_id)?;

        if amount <= 0 {
            return Err(DomainError::validation("Amount must be a positive integer"));
        }

        if self.repository.get_account(subject_id).await?.is_none() {
            self.open(subject_id).await?;
        }

        let debit = Transaction::usage(subject_id, amount, DEDUCTION_DESCRIPTION, self.clock.now());
        let account = self.repository.debit(debit).await?;

        debug!(subject_id = %subject_id, amount, balance = account.balance, "Deducted credits");

        Ok(account.balance)
    }

    /// Add credits unconditionally, optionally tagged with an external session
    pub async fn grant(
        &self,
        subject_id: &str,
        amount: i64,
        kind: TransactionKind,
        description: &str,
        external_session_id: Option<&str>,
    ) -> Result<Account, DomainError> {
        validate_subject(subject_id)?;

        if amount <= 0 {
            return Err(DomainError::validation("Amount must be a positive integer"));
        }

        let mut credit = Transaction::new(subject_id, amount, kind, description, self.clock.now());
        if let Some(session_id) = external_session_id {
            credit = credit.with_external_session_id(session_id);
        }

        self.repository.credit(credit).await
    }

    /// Record a purchase once per external session and set the balance to `credits`
    pub async fn apply_purchase(
        &self,
        subject_id: &str,
        credits: i64,
        description: &str,
        session_id: &str,
    ) -> Result<PurchaseOutcome, DomainError> {
        validate_subject(subject_id)?;

        if session_id.is_empty() {
            return Err(DomainError::validation("Missing payment session id"));
        }

        let purchase =
            Transaction::purchase(subject_id, credits, description, session_id, self.clock.now());

        match self.repository.apply_purchase(purchase).await? {
            Some(account) => Ok(PurchaseOutcome::Applied(account)),
            None => Ok(PurchaseOutcome::AlreadyApplied),
        }
    }

    pub async fn find_by_session(&self, session_id: &str) -> Result<Option<Transaction>, DomainError> {
        self.repository.find_by_session(session_id).await
    }

    pub async fn transactions(&self, subject_id: &str) -> Result<Vec<Transaction>, DomainError> {
        self.repository.list_transactions(subject_id).await
    }

    async fn open(&self, subject_id: &str) -> Result<Account, DomainError> {
        let opening = Transaction::signup_bonus(
            subject_id,
            self.signup_bonus,
            WELCOME_DESCRIPTION,
            self.clock.now(),
        );

        let account = self.repository.open_account(opening).await?;
        info!(subject_id = %subject_id, balance = account.balance, "Opened credit account");

        Ok(account)
    }
}

fn validate_subject(subject_id: &str) -> Result<(), DomainError> {
    if subject_id.trim().is_empty() {
        return Err(DomainError::validation("Missing user id"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::mock::ManualClock;
    use crate::infrastructure::credit::InMemoryCreditRepository;

    fn ledger() -> (CreditLedger, Arc<InMemoryCreditRepository>) {
        let repo = Arc::new(InMemoryCreditRepository::new());
        let ledger = CreditLedger::new(repo.clone(), Arc::new(ManualClock::fixed()));
        (ledger, repo)
    }

    #[tokio::test]
    async fn test_first_read_opens_account_with_bonus() {
        let (ledger, repo) = ledger();

        assert_eq!(ledger.get_balance("user_1").await.unwrap(), 25);
        assert_eq!(ledger.get_balance("user_1").await.unwrap(), 25);

        let txns = repo.list_transactions("user_1").await.unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].kind, TransactionKind::SignupBonus);
        assert_eq!(txns[0].description, "Welcome bonus credits");
    }

    #[tokio::test]
    async fn test_zero_balance_is_restored() {
        let (ledger, repo) = ledger();
        ledger.get_balance("user_1").await.unwrap();
        assert_eq!(ledger.deduct("user_1", 25).await.unwrap(), 0);

        assert_eq!(ledger.get_balance("user_1").await.unwrap(), 25);
        assert_eq!(ledger.get_balance("user_1").await.unwrap(), 25);

        let txns = repo.list_transactions("user_1").await.unwrap();
        let retro: Vec<_> = txns
            .iter()
            .filter(|t| t.description == "Retroactive free plan")
            .collect();
        assert_eq!(retro.len(), 1);
        assert_eq!(retro[0].amount, 25);
        assert_eq!(retro[0].kind, TransactionKind::SignupBonus);
    }

    #[tokio::test]
    async fn test_deduct_records_negative_usage() {
        let (ledger, repo) = ledger();

        assert_eq!(ledger.deduct("user_1", 5).await.unwrap(), 20);

        let txns = repo.list_transactions("user_1").await.unwrap();
        assert_eq!(txns[0].kind, TransactionKind::Usage);
        assert_eq!(txns[0].amount, -5);
        assert_eq!(txns[0].description, "Credit deduction");
    }

    #[tokio::test]
    async fn test_deduct_insufficient_leaves_balance() {
        let (ledger, _) = ledger();
        ledger.get_balance("user_1").await.unwrap();

        let err = ledger.deduct("user_1", 26).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientBalance {
                balance: 25,
                requested: 26
            }
        ));
        assert_eq!(ledger.get_balance("user_1").await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_deduct_rejects_non_positive_amount() {
        let (ledger, _) = ledger();

        assert!(matches!(
            ledger.deduct("user_1", 0).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            ledger.deduct("user_1", -3).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_deductions_never_overdraw() {
        let (ledger, _) = ledger();
        let ledger = Arc::new(ledger);
        ledger.get_balance("user_1").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.deduct("user_1", 2).await }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 12);
        assert_eq!(ledger.get_balance("user_1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_grant_adds_to_balance() {
        let (ledger, _) = ledger();
        ledger.get_balance("user_1").await.unwrap();

        let account = ledger
            .grant("user_1", 10, TransactionKind::Purchase, "Manual grant", Some("cs_manual"))
            .await
            .unwrap();

        assert_eq!(account.balance, 35);

        let txn = ledger.find_by_session("cs_manual").await.unwrap().unwrap();
        assert_eq!(txn.amount, 10);
    }

    #[tokio::test]
    async fn test_apply_purchase_sets_balance_once() {
        let (ledger, _) = ledger();
        ledger.get_balance("user_1").await.unwrap();

        let first = ledger
            .apply_purchase("user_1", 100, "Stripe Checkout purchase", "cs_1")
            .await
            .unwrap();
        let second = ledger
            .apply_purchase("user_1", 100, "Stripe Checkout purchase (manual verify)", "cs_1")
            .await
            .unwrap();

        assert!(first.was_applied());
        assert_eq!(second, PurchaseOutcome::AlreadyApplied);
        // Purchases overwrite the balance instead of adding to it
        assert_eq!(ledger.get_balance("user_1").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_missing_subject_is_rejected() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.get_balance("  ").await,
            Err(DomainError::Validation { .. })
        ));
    }
}
