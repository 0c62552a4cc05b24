//! Credit ledger infrastructure implementations

mod in_memory;
mod ledger;
mod postgres;

pub use in_memory::InMemoryCreditRepository;
pub use ledger::{CreditLedger, DEFAULT_SIGNUP_BONUS, PurchaseOutcome};
pub use postgres::PostgresCreditRepository;
