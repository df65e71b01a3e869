/*!
 * Prompt construction for catalog translation.
 *
 * This module provides:
 * - The default system and user instructions
 * - `PromptSet`, the prompt texts of one session
 * - `BatchPromptBuilder`, which turns a batch into a backend request
 */

pub mod templates;

// Re-export main types
pub use templates::{
    ASSISTANT_ACKNOWLEDGEMENT, BatchPromptBuilder, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT,
    PreparedRequest, PromptSet,
};
