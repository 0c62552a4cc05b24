use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::project::{Difficulty, Project, ProjectRepository};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROJECT_COLUMNS: &str = "id, title, slug, description, problem_statement, difficulty, \
     tech_stack, features, category, system_design_overview, created_at, updated_at";

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn get(&self, id: &str) -> Result<Option<Project>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get project: {}", e)))?;

        row.as_ref().map(row_to_project).transpose()
    }

    async fn list(&self) -> Result<Vec<Project>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list projects: {}", e)))?;

        rows.iter().map(row_to_project).collect()
    }
}

fn row_to_project(row: &PgRow) -> Result<Project, DomainError> {
    let difficulty: String = row.get("difficulty");

    Ok(Project {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        problem_statement: row.get("problem_statement"),
        difficulty: difficulty.parse::<Difficulty>()?,
        tech_stack: row.get("tech_stack"),
        features: row.get("features"),
        category: row.get("category"),
        system_design_overview: row.get("system_design_overview"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
