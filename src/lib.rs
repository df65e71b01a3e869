/*!
 * # gpt-po
 *
 * A Rust library for maintaining gettext PO/POT catalogs with an
 * OpenAI-compatible chat backend.
 *
 * ## Features
 *
 * - Translate the untranslated entries of a catalog in size-bounded batches,
 *   saving the catalog after every batch
 * - Bias translations with per-language glossaries and a product context
 * - Sync a catalog against an updated template, keeping existing translations
 * - Remove entries by status (fuzzy, obsolete, translated...) or reference
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `catalog`: catalog model, PO codec, entry filter and template sync
 * - `translation`: translation session, batching, prompts, glossaries and
 *   the tagged payload format
 * - `providers`: backend clients:
 *   - `providers::openai`: OpenAI API client
 *   - `providers::mock`: scripted provider for tests
 * - `app_config`: run settings and configuration file lookup
 * - `app_controller`: command implementations used by the binary
 * - `file_utils`: file system operations
 * - `language_utils`: language code utilities
 * - `errors`: custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod catalog;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use catalog::{Catalog, CompileOptions, Entry, RemoveOptions};
pub use errors::{AppError, CatalogError, ProviderError, TranslationError};
pub use language_utils::{language_display_name, normalize_language_code};
pub use translation::{TranslationReport, TranslationSession};
