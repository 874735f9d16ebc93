//! Shared safety-classification instruction

/// Instruction sent to every panel member ahead of the request text
pub const SAFETY_INSTRUCTION: &str = "You are a content safety classifier.

Analyze the user's prompt and determine if it's requesting harmful, illegal, or unsafe content.

IMPORTANT: Start your response with EXACTLY one of these:
VERDICT: SAFE
VERDICT: UNSAFE

Then explain your reasoning in 2-3 sentences.

Example safe response:
VERDICT: SAFE
This prompt asks for educational information about photosynthesis, which is harmless scientific content.

Example unsafe response:
VERDICT: UNSAFE
This prompt requests instructions for creating dangerous weapons, which could cause harm.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{SAFE_MARKER, UNSAFE_MARKER};

    #[test]
    fn test_instruction_names_both_markers() {
        assert!(SAFETY_INSTRUCTION.contains(SAFE_MARKER));
        assert!(SAFETY_INSTRUCTION.contains(UNSAFE_MARKER));
    }
}
