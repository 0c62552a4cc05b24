//! Project catalog entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(DomainError::validation(format!(
                "Unknown difficulty '{}'",
                other
            ))),
        }
    }
}

/// A catalog project that prompts are generated for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub problem_statement: String,
    pub difficulty: Difficulty,
    pub tech_stack: Vec<String>,
    pub features: Vec<String>,
    pub category: String,
    pub system_design_overview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: impl Into<String>) -> Self {
        let now = Utc::now();
        let title = title.into();

        Self {
            id: id.into(),
            slug: slugify(&title),
            title,
            description: String::new(),
            problem_statement: String::new(),
            difficulty: Difficulty::default(),
            tech_stack: Vec::new(),
            features: Vec::new(),
            category: category.into(),
            system_design_overview: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_tech_stack(mut self, tech_stack: Vec<String>) -> Self {
        self.tech_stack = tech_stack;
        self
    }
}

/// Project details supplied inline by clients for projects missing from the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub problem_statement: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub system_design_overview: Option<String>,
}

impl ProjectData {
    /// Tech stack joined with ", ", else the description, else "unspecified"
    pub fn category_descriptor(&self) -> String {
        if !self.tech_stack.is_empty() {
            let joined = self.tech_stack.join(", ");

            if !joined.is_empty() {
                return joined;
            }
        }

        match self.description.as_deref() {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => "unspecified".to_string(),
        }
    }
}

/// Title and category the generation instruction is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubject {
    pub title: String,
    pub category: String,
}

impl From<&Project> for ResolvedSubject {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            category: project.category.clone(),
        }
    }
}

impl From<&ProjectData> for ResolvedSubject {
    fn from(data: &ProjectData) -> Self {
        Self {
            title: data.title.clone(),
            category: data.category_descriptor(),
        }
    }
}

fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
