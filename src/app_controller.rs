use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::{Config, ConfigLocator};
use crate::catalog::{self, EntryFilter, RemoveOptions, SyncSummary};
use crate::file_utils::FileManager;
use crate::providers::Provider;
use crate::providers::openai::OpenAI;
use crate::translation::{FileCheckpoint, SessionOptions, TranslationReport, TranslationSession};

// @module: Application controller for catalog commands

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Where prompts and glossaries live
    locator: ConfigLocator,
}

impl Controller {
    // @method: Create a controller rooted at the working directory
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            locator: ConfigLocator::from_env()?,
        })
    }

    // @method: Create a controller with an explicit config locator
    pub fn with_locator(config: Config, locator: ConfigLocator) -> Self {
        Self { config, locator }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn openai(&self) -> Result<OpenAI> {
        self.config.validate()?;
        let backend = &self.config.backend;
        Ok(OpenAI::new(
            backend.api_key.clone(),
            backend.host.as_deref(),
            Duration::from_millis(backend.timeout_ms),
        )?)
    }

    fn build_session<P: Provider>(&self, provider: P, context_file: Option<&Path>) -> Result<TranslationSession<P>> {
        let config_dir = self.locator.resolve_dir()?;
        let mut prompts = self.locator.load_prompts(&config_dir)?;
        if let Some(path) = context_file {
            let context = FileManager::read_to_string(path).context("Failed to read the context file")?;
            prompts = prompts.with_context(context);
        }

        let options = SessionOptions {
            model: self.config.backend.model.clone(),
            source_language: self.config.source_language.clone(),
            verbose: self.config.verbose,
            retry: self.config.retry.clone(),
            ..Default::default()
        };

        Ok(TranslationSession::new(provider, options)
            .with_prompts(prompts)
            .with_glossary_dir(config_dir))
    }

    /// Translate one catalog with the OpenAI backend
    pub async fn translate_file(
        &self,
        po_file: &Path,
        output: Option<&Path>,
        context_file: Option<&Path>,
    ) -> Result<TranslationReport> {
        let provider = self.openai()?;
        self.translate_file_with(provider, po_file, output, context_file).await
    }

    /// Translate one catalog with the given provider
    ///
    /// Progress is checkpointed to `output`, or to `po_file` itself.
    pub async fn translate_file_with<P: Provider>(
        &self,
        provider: P,
        po_file: &Path,
        output: Option<&Path>,
        context_file: Option<&Path>,
    ) -> Result<TranslationReport> {
        let start_time = Instant::now();
        let session = self.build_session(provider, context_file)?;
        self.run_session(&session, po_file, output).await.map(|report| {
            info!("{} in {:.1}s", report.summary(), start_time.elapsed().as_secs_f64());
            report
        })
    }

    async fn run_session<P: Provider>(
        &self,
        session: &TranslationSession<P>,
        po_file: &Path,
        output: Option<&Path>,
    ) -> Result<TranslationReport> {
        if !FileManager::file_exists(po_file) {
            return Err(anyhow!("Catalog does not exist: {:?}", po_file));
        }
        let mut catalog = catalog::read_catalog(po_file).with_context(|| format!("Failed to read {:?}", po_file))?;
        let mut checkpoint = FileCheckpoint::new(output.unwrap_or(po_file), self.config.compile.clone());

        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let report = session
            .translate_catalog(
                &mut catalog,
                self.config.target_language.as_deref(),
                &mut checkpoint,
                |done, total| {
                    progress_bar.set_length(total as u64);
                    progress_bar.set_position(done as u64);
                },
            )
            .await?;

        progress_bar.finish_and_clear();
        Ok(report)
    }

    /// Translate every `.po` file directly inside `dir` with the OpenAI backend
    pub async fn translate_dir(&self, dir: &Path, context_file: Option<&Path>) -> Result<Vec<(PathBuf, TranslationReport)>> {
        let provider = self.openai()?;
        self.translate_dir_with(provider, dir, context_file).await
    }

    /// Translate every `.po` file directly inside `dir`
    ///
    /// A failing catalog is logged and skipped.
    pub async fn translate_dir_with<P: Provider>(
        &self,
        provider: P,
        dir: &Path,
        context_file: Option<&Path>,
    ) -> Result<Vec<(PathBuf, TranslationReport)>> {
        if !FileManager::dir_exists(dir) {
            return Err(anyhow!("Directory does not exist: {:?}", dir));
        }
        let files = FileManager::find_po_files(dir)?;
        if files.is_empty() {
            warn!("No .po files found in {:?}", dir);
            return Ok(Vec::new());
        }

        let session = self.build_session(provider, context_file)?;
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            info!("Translating {:?}", file);
            match self.run_session(&session, &file, None).await {
                Ok(report) => {
                    info!("{}", report.summary());
                    reports.push((file, report));
                }
                Err(e) => error!("Failed to translate {:?}: {:#}", file, e),
            }
        }
        Ok(reports)
    }

    /// Update `po_file` from the `pot_file` template
    pub fn sync(&self, po_file: &Path, pot_file: &Path, output: Option<&Path>) -> Result<SyncSummary> {
        let summary = catalog::sync(po_file, pot_file, output, &self.config.compile)
            .with_context(|| format!("Failed to sync {:?} with {:?}", po_file, pot_file))?;
        Ok(summary)
    }

    /// Remove the entries of `po_file` matching any enabled option
    ///
    /// Returns the number of removed entries.
    pub fn remove(&self, po_file: &Path, options: &RemoveOptions, output: Option<&Path>) -> Result<usize> {
        if options.is_empty() {
            warn!("No removal option given, the catalog is written back unchanged");
        }
        let filter = EntryFilter::new(options)?;
        let mut catalog = catalog::read_catalog(po_file).with_context(|| format!("Failed to read {:?}", po_file))?;
        let removed = filter.apply(&mut catalog);

        let target = output.unwrap_or(po_file);
        catalog::write_catalog(&catalog, target, &self.config.compile)?;
        info!("Removed {} entries, wrote {:?}", removed, target);
        Ok(removed)
    }

    /// Path of the glossary file for `lang`, creating the default glossary if needed
    pub fn userdict_path(&self, lang: Option<&str>) -> Result<PathBuf> {
        self.locator.glossary_file(lang)
    }

    /// Open the glossary for `lang`, or its directory when `explore` is set
    pub fn userdict(&self, lang: Option<&str>, explore: bool) -> Result<PathBuf> {
        let path = self.userdict_path(lang)?;
        let target = if explore {
            path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
        } else {
            if !FileManager::file_exists(&path) {
                FileManager::write_to_file(&path, crate::app_config::DEFAULT_GLOSSARY)?;
            }
            path.clone()
        };
        info!("Opening {:?}", target);
        FileManager::open_with_default_app(&target)?;
        Ok(path)
    }
}
