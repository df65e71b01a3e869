/*!
 * Catalog translation through a chat backend.
 *
 * - `core`: the translation session, retry policy and checkpoints
 * - `batch`: pending-entry extraction and batch partitioning
 * - `glossary`: user glossaries
 * - `markers`: the tagged payload format and its decoder
 * - `prompts`: prompt texts and request construction
 */

// Re-export main types for easier usage
pub use self::batch::{BatchItem, DEFAULT_BATCH_CHAR_LIMIT, split_into_batches};
pub use self::core::{
    Checkpoint, FileCheckpoint, RetryPolicy, SessionOptions, TranslationReport, TranslationSession,
};
pub use self::glossary::Glossary;
pub use self::markers::{ResponseDecoder, TagDecoder};
pub use self::prompts::PromptSet;

// Submodules
pub mod batch;
pub mod core;
pub mod glossary;
pub mod markers;
pub mod prompts;
