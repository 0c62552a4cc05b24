use async_trait::async_trait;
use std::fmt::Debug;

use super::Project;
use crate::domain::DomainError;

/// Read-only project catalog
#[async_trait]
pub trait ProjectRepository: Send + Sync + Debug {
    async fn get(&self, id: &str) -> Result<Option<Project>, DomainError>;

    /// All projects, newest first
    async fn list(&self) -> Result<Vec<Project>, DomainError>;
}
