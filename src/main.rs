// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use gpt_po::app_config::{BackendConfig, Config, LogLevel};
use gpt_po::app_controller::Controller;
use gpt_po::catalog::{CompileOptions, RemoveOptions};
use gpt_po::errors::AppError;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Options that affect how catalogs are written back
#[derive(Args, Debug, Clone)]
struct CompileArgs {
    /// Fold msgid/msgstr lines longer than this; `false` or `0` disables folding
    #[arg(long = "po-fold-len", value_name = "N|false", default_value = "120", global = true)]
    fold_length: String,

    /// Sort entries by msgid when writing
    #[arg(long = "po-sort", global = true)]
    sort: bool,

    /// Escape special characters when writing
    #[arg(long = "po-esc-chars", action = ArgAction::Set, default_value_t = true, global = true)]
    escape: bool,
}

impl CompileArgs {
    fn to_options(&self) -> Result<CompileOptions, AppError> {
        let value = self.fold_length.trim();
        let fold_length = match value {
            "false" | "0" => None,
            _ => Some(value.parse::<usize>().map_err(|_| {
                AppError::Config(format!("Invalid --po-fold-len value: {:?}", self.fold_length))
            })?),
        };
        Ok(CompileOptions {
            fold_length,
            sort_entries: self.sort,
            escape_special_characters: self.escape,
        })
    }
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// OpenAI API key
    #[arg(short = 'k', long = "key", env = "OPENAI_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// OpenAI-compatible API host; `/v1` is appended
    #[arg(long, env = "OPENAI_API_HOST")]
    host: Option<String>,

    /// Model name
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Source language code
    #[arg(long, default_value = "en")]
    source: String,

    /// Target language code; defaults to the catalog's Language header
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Catalog to translate
    #[arg(long, conflicts_with = "dir")]
    po: Option<PathBuf>,

    /// Translate every .po file directly inside this directory
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Write the result here instead of overwriting the catalog
    #[arg(short = 'o', long, conflicts_with = "dir")]
    output: Option<PathBuf>,

    /// Print every translated string
    #[arg(long)]
    verbose: bool,

    /// Text file describing the product, added to the instructions
    #[arg(long)]
    context: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 20_000)]
    timeout: u64,
}

#[derive(Args, Debug, Clone)]
struct SyncArgs {
    /// Catalog to update
    #[arg(long)]
    po: PathBuf,

    /// Template to update from
    #[arg(long)]
    pot: PathBuf,

    /// Write the result here instead of overwriting the catalog
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct RemoveArgs {
    /// Catalog to filter
    #[arg(long)]
    po: PathBuf,

    /// Remove fuzzy entries
    #[arg(long)]
    fuzzy: bool,

    /// Remove obsolete entries
    #[arg(long)]
    obsolete: bool,

    /// Remove untranslated entries
    #[arg(long)]
    untranslated: bool,

    /// Remove translated entries
    #[arg(long)]
    translated: bool,

    /// Remove translated entries that are not fuzzy
    #[arg(long)]
    translated_not_fuzzy: bool,

    /// Remove translated entries that are fuzzy
    #[arg(long)]
    fuzzy_translated: bool,

    /// Remove entries whose reference contains this text, or matches `/pattern/flags`
    #[arg(long, value_name = "TEXT|/PATTERN/FLAGS")]
    reference_contains: Option<String>,

    /// Write the result here instead of overwriting the catalog
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl From<&RemoveArgs> for RemoveOptions {
    fn from(args: &RemoveArgs) -> Self {
        Self {
            fuzzy: args.fuzzy,
            obsolete: args.obsolete,
            untranslated: args.untranslated,
            translated: args.translated,
            translated_not_fuzzy: args.translated_not_fuzzy,
            fuzzy_translated: args.fuzzy_translated,
            reference_contains: args.reference_contains.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
struct UserdictArgs {
    /// Language of the glossary; the default glossary when omitted
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Open the folder holding the glossaries instead of the file
    #[arg(long)]
    explore: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate untranslated entries (default command)
    Translate(TranslateArgs),

    /// Update a catalog from its template, keeping existing translations
    Sync(SyncArgs),

    /// Remove entries by status or reference
    Remove(RemoveArgs),

    /// Open the user glossary in the default editor
    Userdict(UserdictArgs),
}

/// gpt-po - translate gettext catalogs with an OpenAI-compatible backend
#[derive(Parser, Debug)]
#[command(name = "gpt-po")]
#[command(version)]
#[command(about = "Translate, sync and filter gettext PO catalogs")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "gpt-po translates the untranslated entries of gettext catalogs with an OpenAI-compatible chat backend.

EXAMPLES:
    gpt-po --po fr.po --lang fr                 # Translate a catalog into French
    gpt-po --dir locales/ --lang de             # Translate every .po file in a folder
    gpt-po sync --po fr.po --pot messages.pot   # Update a catalog from its template
    gpt-po remove --po fr.po --fuzzy --obsolete # Drop fuzzy and obsolete entries
    gpt-po userdict --lang fr                   # Edit the French glossary

CONFIGURATION:
    systemprompt.txt, userprompt.txt and dictionary[-<lang>].json are read from
    ./.gpt-po, then <project root>/.gpt-po, then the global config folder.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,

    #[command(flatten)]
    compile: CompileArgs,

    /// Set logging level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: CliLogLevel,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CommandLineOptions::parse();

    let level: LevelFilter = LogLevel::from(cli.log_level).into();
    if let Err(e) = CustomLogger::init(level) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    let config = Config {
        compile: cli.compile.to_options()?,
        log_level: cli.log_level.into(),
        ..Default::default()
    };

    match cli.command {
        Some(Commands::Translate(args)) => run_translate(config, args).await,
        None => run_translate(config, cli.translate).await,
        Some(Commands::Sync(args)) => {
            let controller = Controller::with_config(config)?;
            let summary = controller.sync(&args.po, &args.pot, args.output.as_deref())?;
            info!(
                "Sync done: {} translations kept, {} untranslated, {} dropped",
                summary.adopted, summary.untranslated, summary.dropped
            );
            Ok(())
        }
        Some(Commands::Remove(args)) => {
            let controller = Controller::with_config(config)?;
            controller.remove(&args.po, &RemoveOptions::from(&args), args.output.as_deref())?;
            Ok(())
        }
        Some(Commands::Userdict(args)) => {
            let controller = Controller::with_config(config)?;
            controller.userdict(args.lang.as_deref(), args.explore)?;
            Ok(())
        }
    }
}

async fn run_translate(mut config: Config, args: TranslateArgs) -> Result<()> {
    config.backend = BackendConfig {
        api_key: args.key.unwrap_or_default(),
        host: args.host.filter(|host| !host.trim().is_empty()),
        model: args.model,
        timeout_ms: args.timeout,
    };
    config.source_language = args.source;
    config.target_language = args.lang;
    config.verbose = args.verbose;
    config.validate()?;

    let controller = Controller::with_config(config)?;
    let context = args.context.as_deref();

    if let Some(po) = args.po {
        let report = controller.translate_file(&po, args.output.as_deref(), context).await?;
        info!("Done: {}", report.summary());
    } else if let Some(dir) = args.dir {
        let reports = controller.translate_dir(&dir, context).await?;
        info!("Done: {} catalogs translated", reports.len());
    } else {
        return Err(AppError::Config("Either --po or --dir is required".to_string()).into());
    }

    Ok(())
}
