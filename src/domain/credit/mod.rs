//! Credit ledger domain

mod account;
mod repository;
mod transaction;

pub use account::Account;
pub use repository::CreditRepository;
pub use transaction::{Transaction, TransactionId, TransactionKind};
