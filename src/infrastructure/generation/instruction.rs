/// System role sent with every generation
pub const SYSTEM_PROMPT: &str = "You are an expert software architect and prompt engineer. \
Generate structured, professional outputs.";

/// User instruction for one prompt type and subject
pub fn build_instruction(prompt_type: &str, title: &str, category: &str) -> String {
    format!(
        "Generate a detailed {prompt_type} prompt for the following project.\n\n\
         Project Title:\n{title}\n\n\
         Category / Tech Stack:\n{category}\n\n\
         Requirements:\n\
         - Professional\n\
         - Structured\n\
         - Production-ready\n\
         - Detailed explanation"
    )
}

/// Rough token count: one token per four characters, rounded up
pub fn estimate_tokens(content: &str) -> u32 {
    let chars = content.chars().count() as u32;
    chars.div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_layout() {
        let instruction = build_instruction("architecture", "URL Shortener", "Rust, Redis");

        assert!(instruction.starts_with(
            "Generate a detailed architecture prompt for the following project.\n\n"
        ));
        assert!(instruction.contains("Project Title:\nURL Shortener\n\n"));
        assert!(instruction.contains("Category / Tech Stack:\nRust, Redis\n\n"));
        assert!(instruction.ends_with("- Production-ready\n- Detailed explanation"));
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("héllo"), 2);
    }
}
