/*!
 * Catalog translation session.
 *
 * A `TranslationSession` owns everything one run needs: the provider, the
 * prompts, the glossary source, and the response decoder. Nothing is kept in
 * globals, so tests build a session around a mock provider and a counting
 * checkpoint.
 *
 * Batches run strictly one after another. The catalog is persisted after
 * every successful batch, so the file on disk always holds a prefix of
 * completed work.
 */

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{Catalog, CompileOptions, write_catalog};
use crate::errors::{CatalogError, ProviderError, TranslationError};
use crate::language_utils::{language_display_name, normalize_language_code};
use crate::providers::Provider;

use super::batch::{BatchItem, DEFAULT_BATCH_CHAR_LIMIT, scan_pending, split_into_batches};
use super::glossary::Glossary;
use super::markers::{ResponseDecoder, TagDecoder};
use super::prompts::{BatchPromptBuilder, PromptSet};

/// Identity written to the `Last-Translator` header
pub fn tool_identity() -> String {
    format!("gpt-po v{}", env!("CARGO_PKG_VERSION"))
}

/// How a rate-limited batch is replayed
///
/// The default waits a fixed 20 seconds and never gives up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first replay, in milliseconds
    pub delay_ms: u64,
    /// Give up on the batch after this many rate-limited attempts
    pub max_attempts: Option<u32>,
    /// Multiplier applied to the delay after each replay
    pub backoff_factor: f64,
    /// Upper bound for the delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 20_000,
            max_attempts: None,
            backoff_factor: 1.0,
            max_delay_ms: 300_000,
        }
    }
}

impl RetryPolicy {
    /// Fixed delay, unbounded retries
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay_ms: delay.as_millis() as u64,
            ..Default::default()
        }
    }

    /// Bounded attempts with exponential backoff
    pub fn exponential(delay: Duration, factor: f64, max_attempts: u32) -> Self {
        Self {
            delay_ms: delay.as_millis() as u64,
            max_attempts: Some(max_attempts),
            backoff_factor: factor,
            ..Default::default()
        }
    }

    /// Delay before replay number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(retry.saturating_sub(1) as i32);
        let millis = (self.delay_ms as f64 * factor).min(self.max_delay_ms.max(self.delay_ms) as f64);
        Duration::from_millis(millis as u64)
    }

    /// Whether another attempt is allowed after `attempts` rate-limited ones
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

/// Destination of the incremental saves
pub trait Checkpoint {
    fn persist(&mut self, catalog: &Catalog) -> Result<(), CatalogError>;
}

/// Serialize the catalog to a file after every batch
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
    options: CompileOptions,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>, options: CompileOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpoint for FileCheckpoint {
    fn persist(&mut self, catalog: &Catalog) -> Result<(), CatalogError> {
        debug!("Checkpoint {:?}", self.path);
        write_catalog(catalog, &self.path, &self.options)
    }
}

/// Settings of one session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model: String,
    /// Code of the catalog's source language
    pub source_language: String,
    /// Log every msgid/msgstr pair at info level
    pub verbose: bool,
    pub batch_char_limit: usize,
    pub retry: RetryPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            source_language: "en".to_string(),
            verbose: false,
            batch_char_limit: DEFAULT_BATCH_CHAR_LIMIT,
            retry: RetryPolicy::default(),
        }
    }
}

/// What a translation run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Entries that were untranslated when the run started
    pub pending: usize,
    /// Translations that had surrounding whitespace removed
    pub trimmed: usize,
    pub batches: usize,
    pub completed_batches: usize,
    pub abandoned_batches: usize,
    pub translated: usize,
    /// Submitted entries the response did not address
    pub missing_tags: usize,
    /// Replays caused by rate limiting
    pub rate_limit_retries: usize,
}

impl TranslationReport {
    pub fn summary(&self) -> String {
        format!(
            "{} of {} entries translated in {} batches ({} abandoned, {} missing tags, {} rate-limit retries)",
            self.translated,
            self.pending,
            self.batches,
            self.abandoned_batches,
            self.missing_tags,
            self.rate_limit_retries
        )
    }
}

/// Where the session finds its glossary
#[derive(Debug, Clone)]
enum GlossarySource {
    /// A fixed glossary for every language
    Fixed(Glossary),
    /// `dictionary.json` / `dictionary-<lang>.json` in a directory
    Directory(PathBuf),
}

/// One translation run against one backend
#[derive(Debug)]
pub struct TranslationSession<P: Provider> {
    provider: P,
    prompts: PromptSet,
    glossary: GlossarySource,
    decoder: Box<dyn ResponseDecoder>,
    options: SessionOptions,
}

impl<P: Provider> TranslationSession<P> {
    pub fn new(provider: P, options: SessionOptions) -> Self {
        Self {
            provider,
            prompts: PromptSet::default(),
            glossary: GlossarySource::Fixed(Glossary::new()),
            decoder: Box::new(TagDecoder),
            options,
        }
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Use the same glossary for every target language
    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = GlossarySource::Fixed(glossary);
        self
    }

    /// Load glossaries from a configuration directory per target language
    pub fn with_glossary_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.glossary = GlossarySource::Directory(dir.into());
        self
    }

    /// Replace the wire format of payloads and answers
    pub fn with_decoder(mut self, decoder: Box<dyn ResponseDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    fn glossary_for(&self, target: &str) -> Result<Glossary, TranslationError> {
        match &self.glossary {
            GlossarySource::Fixed(glossary) => Ok(glossary.clone()),
            GlossarySource::Directory(dir) => Glossary::load_for_language(dir, target)
                .map_err(|e| TranslationError::Config(format!("{:#}", e))),
        }
    }

    /// Translate every untranslated entry of `catalog`
    ///
    /// `target_language` falls back to the catalog's `Language` header.
    /// `progress` receives (completed batches, total batches) after each batch.
    pub async fn translate_catalog<C, F>(
        &self,
        catalog: &mut Catalog,
        target_language: Option<&str>,
        checkpoint: &mut C,
        progress: F,
    ) -> Result<TranslationReport, TranslationError>
    where
        C: Checkpoint,
        F: Fn(usize, usize),
    {
        let target = target_language
            .map(str::to_string)
            .filter(|lang| !lang.trim().is_empty())
            .or_else(|| catalog.language().map(str::to_string))
            .map(|lang| normalize_language_code(&lang))
            .ok_or_else(|| {
                TranslationError::Config(
                    "No target language: pass --lang or set the catalog's Language header".to_string(),
                )
            })?;
        let glossary = self.glossary_for(&target)?;

        let scan = scan_pending(catalog);
        let mut report = TranslationReport {
            pending: scan.pending.len(),
            trimmed: scan.trimmed,
            ..Default::default()
        };

        if scan.trimmed > 0 {
            debug!("Trimmed whitespace around {} translations", scan.trimmed);
            checkpoint.persist(catalog)?;
        }

        if scan.pending.is_empty() {
            info!("Nothing to translate");
            return Ok(report);
        }

        catalog.set_header("Last-Translator", tool_identity());

        let batches = split_into_batches(scan.pending, self.options.batch_char_limit);
        report.batches = batches.len();
        progress(0, batches.len());

        let source_name = language_display_name(&self.options.source_language);
        let target_name = language_display_name(&target);

        for (batch_number, batch) in batches.iter().enumerate() {
            match self
                .translate_batch(catalog, batch, &glossary, &source_name, &target_name, &mut report)
                .await
            {
                Ok(()) => {
                    report.completed_batches += 1;
                    checkpoint.persist(catalog)?;
                }
                Err(e) => {
                    report.abandoned_batches += 1;
                    if e.is_connection_abort() {
                        error!(
                            "Batch {} abandoned: {}. If the backend is unreachable from your network, configure a proxy (HTTPS_PROXY) or --host",
                            batch_number + 1,
                            e
                        );
                    } else {
                        error!("Batch {} abandoned: {}", batch_number + 1, e);
                    }
                }
            }
            progress(batch_number + 1, batches.len());
        }

        Ok(report)
    }

    /// Send one batch until it succeeds, fails, or runs out of rate-limit retries
    async fn translate_batch(
        &self,
        catalog: &mut Catalog,
        batch: &[BatchItem],
        glossary: &Glossary,
        source_name: &str,
        target_name: &str,
        report: &mut TranslationReport,
    ) -> Result<(), ProviderError> {
        let payload: Vec<&str> = batch.iter().map(|item| item.msgid.as_str()).collect();
        let notes: Vec<&str> = batch
            .iter()
            .filter_map(|item| catalog.get(&item.context, &item.msgid))
            .map(|entry| entry.comments.extracted.as_str())
            .filter(|note| !note.is_empty())
            .collect();

        let prepared = BatchPromptBuilder::new(&self.prompts, self.decoder.as_ref(), source_name, target_name)
            .with_glossary(glossary.matching_terms(payload.iter().copied()))
            .with_notes(notes)
            .build(&self.options.model, &payload);

        let mut attempts = 0u32;
        let response = loop {
            match self.provider.complete(prepared.request.clone()).await {
                Ok(response) => break response,
                Err(e) if e.is_rate_limit() => {
                    attempts += 1;
                    if !self.options.retry.allows_retry(attempts) {
                        return Err(e);
                    }
                    let delay = self.options.retry.delay_for(attempts);
                    warn!("{}; retrying the batch in {:.1}s", e, delay.as_secs_f64());
                    report.rate_limit_retries += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        let text = P::extract_text(&response);
        for (item, index) in batch.iter().zip(&prepared.indices) {
            let Some(translation) = self.decoder.decode(&text, *index) else {
                let missing = TranslationError::MissingTranslationTag {
                    index: *index,
                    msgid: item.msgid.clone(),
                };
                warn!("{}", missing);
                report.missing_tags += 1;
                continue;
            };

            if let Some(entry) = catalog.get_mut(&item.context, &item.msgid) {
                if self.options.verbose {
                    info!("{}\n{}", entry.msgid, translation);
                }
                entry.set_translation(translation);
                report.translated += 1;
            }
        }

        Ok(())
    }
}
