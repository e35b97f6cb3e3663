//! Question tokenization
//!
//! Lowercases, splits on whitespace and strips every non-alphanumeric
//! character from each piece. Pieces that end up empty are kept so that
//! positions line up with the words of the original question.

/// Tokenize a question into lowercase alphanumeric tokens
pub fn tokenize(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(|piece| piece.chars().filter(|c| c.is_alphanumeric()).collect())
        .collect()
}
