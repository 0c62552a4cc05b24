//! PostgreSQL connection pooling and schema migrations

mod migrations;
mod postgres;

pub use migrations::{Migration, PostgresMigrator, promptforge_migrations, run_migrations};
pub use postgres::{PostgresConfig, connect_pool};
