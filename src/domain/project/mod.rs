//! Project catalog domain

mod entity;
mod repository;

pub use entity::{Difficulty, Project, ProjectData, ResolvedSubject};
pub use repository::ProjectRepository;
