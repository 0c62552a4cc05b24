//! Prompt generation pipeline

mod instruction;
mod orchestrator;

pub use instruction::{SYSTEM_PROMPT, build_instruction, estimate_tokens};
pub use orchestrator::{GenerateOutcome, GenerateRequest, GenerationService, GenerationSettings};
