//! Project catalog implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryProjectRepository;
pub use postgres::PostgresProjectRepository;
