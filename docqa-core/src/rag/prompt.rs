//! Prompt assembly for grounded question answering.
//!
//! Retrieved chunks are numbered and placed ahead of the question:
//!
//! ```text
//! Use the following pieces of context to answer the question at the end. ...
//!
//! [1] <best matching chunk>
//! [2] <second best chunk>
//!
//! Question: <question>
//! Helpful Answer:
//! ```

use super::types::Chunk;

const INSTRUCTION: &str = "Use the following pieces of context to answer the question at \
the end. If you don't know the answer from the context, just say that you don't know, \
don't try to make up an answer.";

/// Builds the generator prompt from retrieved chunks and the literal question.
///
/// Only the given chunks' text is used as context; their order is preserved.
pub fn assemble(chunks: &[Chunk], question: &str) -> String {
    let mut prompt = String::from(INSTRUCTION);
    prompt.push_str("\n\n");

    for (i, chunk) in chunks.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n\n", i + 1, chunk.text.trim()));
    }

    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt.push_str("\nHelpful Answer:");
    prompt
}
