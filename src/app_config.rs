//! Application configuration module
//! This module holds the run settings assembled from the command line and
//! environment, and locates the on-disk prompt and glossary files.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::CompileOptions;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::translation::RetryPolicy;
use crate::translation::glossary::{DEFAULT_GLOSSARY_FILE, glossary_path};
use crate::translation::prompts::{DEFAULT_SYSTEM_PROMPT, PromptSet};

/// Name of the per-project configuration folder
pub const CONFIG_DIR_NAME: &str = ".gpt-po";

/// Name of the global configuration folder under the platform config dir
pub const GLOBAL_DIR_NAME: &str = "gpt-po";

pub const SYSTEM_PROMPT_FILE: &str = "systemprompt.txt";
pub const USER_PROMPT_FILE: &str = "userprompt.txt";

/// Content written to a freshly bootstrapped `dictionary.json`
pub const DEFAULT_GLOSSARY: &str = "{}\n";

/// Backend connection settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackendConfig {
    // @field: API key, required
    #[serde(default)]
    pub api_key: String,

    // @field: Host override, `/v1` is appended
    #[serde(default)]
    pub host: Option<String>,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// Represents the settings of one run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Source language code
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code; the catalog's `Language` header is used when absent
    #[serde(default)]
    pub target_language: Option<String>,

    /// How catalogs are written back
    #[serde(default)]
    pub compile: CompileOptions,

    /// Replay policy for rate-limited batches
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Echo every translated pair
    #[serde(default)]
    pub verbose: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_source_language() -> String {
    "en".to_string()
}

impl Config {
    /// Validate the configuration for required values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.backend.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "An API key is required: pass --key or set OPENAI_API_KEY".to_string(),
            ));
        }
        if self.backend.model.trim().is_empty() {
            return Err(AppError::Config("Model name cannot be empty".to_string()));
        }
        if self.compile.fold_length == Some(0) {
            return Err(AppError::Config("Fold length must be a positive number".to_string()));
        }
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendConfig::default(),
            source_language: default_source_language(),
            target_language: None,
            compile: CompileOptions::default(),
            retry: RetryPolicy::default(),
            verbose: false,
            log_level: LogLevel::default(),
        }
    }
}

/// Locates the prompt and glossary files
///
/// Directories are tried in order: `./.gpt-po`, `<project root>/.gpt-po`
/// (the closest ancestor holding `.git`), then the global directory. The
/// first one that exists wins; when none does, the global directory is used
/// and gets populated with defaults.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    cwd: PathBuf,
    global_dir: PathBuf,
}

impl ConfigLocator {
    /// Locator rooted at the process working directory
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        let global_dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join(GLOBAL_DIR_NAME))
            .unwrap_or_else(|| cwd.join(CONFIG_DIR_NAME));
        Ok(Self::new(cwd, global_dir))
    }

    pub fn new(cwd: impl Into<PathBuf>, global_dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            global_dir: global_dir.into(),
        }
    }

    /// Candidate directories in resolution order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.cwd.join(CONFIG_DIR_NAME)];
        if let Some(root) = FileManager::find_project_root(&self.cwd) {
            let project_dir = root.join(CONFIG_DIR_NAME);
            if !candidates.contains(&project_dir) {
                candidates.push(project_dir);
            }
        }
        candidates.push(self.global_dir.clone());
        candidates
    }

    /// The global directory, used when no candidate exists
    pub fn fallback_dir(&self) -> &Path {
        &self.global_dir
    }

    /// First existing candidate directory
    pub fn existing_dir(&self) -> Option<PathBuf> {
        self.candidates().into_iter().find(|dir| dir.is_dir())
    }

    /// The configuration directory, creating and populating the fallback
    /// directory when no candidate exists
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        match self.existing_dir() {
            Some(dir) => {
                debug!("Using configuration directory {:?}", dir);
                Ok(dir)
            }
            None => {
                self.bootstrap(&self.global_dir)?;
                Ok(self.global_dir.clone())
            }
        }
    }

    /// Write the default system prompt and glossary into `dir` if missing
    pub fn bootstrap(&self, dir: &Path) -> Result<()> {
        FileManager::ensure_dir(dir)?;
        if FileManager::write_if_missing(dir.join(SYSTEM_PROMPT_FILE), DEFAULT_SYSTEM_PROMPT)? {
            info!("Created {:?}", dir.join(SYSTEM_PROMPT_FILE));
        }
        if FileManager::write_if_missing(dir.join(DEFAULT_GLOSSARY_FILE), DEFAULT_GLOSSARY)? {
            info!("Created {:?}", dir.join(DEFAULT_GLOSSARY_FILE));
        }
        Ok(())
    }

    /// Load the prompts from `dir`, falling back to the built-in ones
    pub fn load_prompts(&self, dir: &Path) -> Result<PromptSet> {
        let system_path = dir.join(SYSTEM_PROMPT_FILE);
        let system = if FileManager::file_exists(&system_path) {
            FileManager::read_to_string(&system_path)?
        } else {
            DEFAULT_SYSTEM_PROMPT.to_string()
        };
        let system = if system.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            system
        };

        let mut prompts = PromptSet::new(system);
        let user_path = dir.join(USER_PROMPT_FILE);
        if FileManager::file_exists(&user_path) {
            prompts = prompts.with_user_prompt(FileManager::read_to_string(&user_path)?);
        }
        Ok(prompts)
    }

    /// Path of the glossary for `lang` (or the default one) in the resolved directory
    ///
    /// The default glossary is bootstrapped when it does not exist yet.
    pub fn glossary_file(&self, lang: Option<&str>) -> Result<PathBuf> {
        let dir = self.resolve_dir()?;
        let default = dir.join(DEFAULT_GLOSSARY_FILE);
        FileManager::write_if_missing(&default, DEFAULT_GLOSSARY)?;
        Ok(glossary_path(&dir, lang))
    }
}
