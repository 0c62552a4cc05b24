//! Usage tracking domain

mod event;
mod repository;

pub use event::{UsageAggregate, UsageEvent, UsageEventId};
pub use repository::{UsageQuery, UsageRepository};
