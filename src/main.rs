// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use bilinguo::app_config::{self, Config, TranslationProvider};
use bilinguo::app_controller::Controller;
use bilinguo::database::{EntryFilter, SortKey};
use bilinguo::errors::AppError;
use bilinguo::file_utils::DEFAULT_EXPORT_FILENAME;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "mymemory")]
    MyMemory,
    #[value(name = "libretranslate", alias = "libre")]
    LibreTranslate,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::MyMemory => TranslationProvider::MyMemory,
            CliTranslationProvider::LibreTranslate => TranslationProvider::LibreTranslate,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Sort order for `list`
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSortKey {
    Word,
    Created,
    Exported,
}

impl From<CliSortKey> for SortKey {
    fn from(key: CliSortKey) -> Self {
        match key {
            CliSortKey::Word => SortKey::Word,
            CliSortKey::Created => SortKey::CreatedAt,
            CliSortKey::Exported => SortKey::Exported,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import words from a JSON word list, a text file, or a directory of them
    Import {
        /// File or directory to import
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Add a word by hand
    Add {
        /// The word
        word: String,
        /// Optional translation
        translation: Option<String>,
    },

    /// List stored words
    List {
        /// Only words that were already exported
        #[arg(long, conflicts_with = "pending")]
        exported: bool,
        /// Only words not exported yet
        #[arg(long)]
        pending: bool,
        /// Substring to search for in words and translations
        #[arg(long)]
        search: Option<String>,
        /// Sort order
        #[arg(long, value_enum, default_value = "word")]
        sort: CliSortKey,
        /// Maximum number of rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Translate one stored word and save the result
    Translate {
        /// The word
        word: String,
    },

    /// Translate every untranslated word (Ctrl-C stops issuing new lookups)
    TranslateAll {
        /// Maximum number of words to translate
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Set a translation by hand (an empty translation clears it)
    Set {
        /// The word
        word: String,
        /// The translation
        translation: String,
    },

    /// Export translated, not yet exported words as flashcards
    Export {
        /// Maximum number of cards (defaults to export.default_limit)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Output CSV file (must not exist yet)
        #[arg(short, long, default_value = DEFAULT_EXPORT_FILENAME)]
        output: PathBuf,
    },

    /// Delete words
    Delete {
        /// Words to delete
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Show store statistics
    Stats,

    /// Generate shell completions for bilinguo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Bilinguo - bilingual vocabulary builder
///
/// Collects words from word lists and free text, translates them through an
/// online dictionary service and exports them as flashcards, exactly once.
#[derive(Parser, Debug)]
#[command(name = "bilinguo")]
#[command(version)]
#[command(about = "Bilingual vocabulary builder with flashcard export")]
#[command(long_about = "Bilinguo keeps a vocabulary store, fills in translations and exports flashcards.

EXAMPLES:
    bilinguo import words.json                 # Import word/translation pairs
    bilinguo import notes/                     # Import every file in a directory
    bilinguo add serendipity                   # Add a word by hand
    bilinguo translate-all                     # Translate everything pending
    bilinguo -t de translate-all               # Translate into German
    bilinguo export -n 20 -o cards.csv         # Export up to 20 new flashcards
    bilinguo completions bash > bilinguo.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    mymemory       - MyMemory public API (default)
    libretranslate - LibreTranslate, hosted or self-hosted")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Translation provider to use
    #[arg(short, long, global = true, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long = "config", global = true, default_value = "conf.json")]
    config_path: PathBuf,

    /// Vocabulary database path
    #[arg(long, global = true, env = "BILINGUO_DB")]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Marker and ANSI color for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
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
            let (marker, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                marker,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Everything is let through; the effective level is applied once the config is loaded
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Err(e) = run(cli).await {
        report_failure(&e);
        std::process::exit(1);
    }
}

// @reports: Top-level failure, loudly when the store could not be written
fn report_failure(e: &anyhow::Error) {
    let persistence = e
        .downcast_ref::<AppError>()
        .is_some_and(AppError::is_persistence_failure);

    if persistence {
        error!("════════════════════════════════════════════════");
        error!("The vocabulary database could not be updated.");
        error!("No changes from this command were saved.");
        error!("{:#}", e);
        error!("════════════════════════════════════════════════");
    } else {
        error!("{:#}", e);
    }
}

// @loads: Configuration with CLI overrides applied
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(source_lang) = &cli.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &cli.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(database) = &cli.database {
        config.database_path = database.to_string_lossy().to_string();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "bilinguo", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.into());
    debug!(
        "Using {} at {} ({} → {})",
        config.translation.provider.display_name(),
        config.translation.get_endpoint(),
        config.source_language,
        config.target_language
    );

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Import { path } => {
            let summary = controller.import_path(&path).await?;
            info!("Import finished: {}", summary);
        }
        Commands::Add { word, translation } => {
            let outcome = controller.add_word(&word, translation.as_deref()).await?;
            if outcome.created {
                info!("Added '{}'", outcome.entry.word);
            } else if outcome.translation_filled {
                info!("'{}' already stored, translation filled in", outcome.entry.word);
            } else {
                info!("'{}' already stored", outcome.entry.word);
            }
        }
        Commands::List {
            exported,
            pending,
            search,
            sort,
            limit,
        } => {
            let mut filter = EntryFilter::default();
            if exported {
                filter = filter.exported(true);
            } else if pending {
                filter = filter.exported(false);
            }
            if let Some(needle) = search {
                filter = filter.search(needle);
            }

            let entries = controller.list(filter, sort.into(), limit).await?;
            let mut stdout = std::io::stdout().lock();
            for entry in &entries {
                writeln!(
                    stdout,
                    "{}\t{}\t{}",
                    entry.word,
                    entry.translation.as_deref().unwrap_or("-"),
                    if entry.exported { "exported" } else { "" }
                )?;
            }
            info!("{} entries", entries.len());
        }
        Commands::Translate { word } => {
            let translation = controller.translate_word(&word).await?;
            println!("{}", translation);
        }
        Commands::TranslateAll { limit } => {
            let cancel = CancellationToken::new();
            let signal_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing lookups already in flight...");
                    signal_token.cancel();
                }
            });

            let summary = controller.translate_pending(limit, &cancel, true).await?;
            if cancel.is_cancelled() {
                warn!("Translation cancelled: {}", summary);
            }
        }
        Commands::Set { word, translation } => {
            controller.set_translation(&word, &translation).await?;
            info!("Saved translation for '{}'", word);
        }
        Commands::Export { limit, output } => {
            let artifact = controller.export(limit, &output).await?;
            if artifact.is_empty() {
                info!("Nothing new to export");
            }
        }
        Commands::Delete { words } => {
            let removed = controller.delete(&words).await?;
            info!("Deleted {} of {} words", removed, words.len());
        }
        Commands::Stats => {
            let stats = controller.stats().await?;
            let (db_path, db_size) = controller.database_info();
            println!("{}", stats);
            println!("Database: {} ({} KiB)", db_path.display(), db_size / 1024);
        }
        // Handled before the configuration is loaded
        Commands::Completions { .. } => {}
    }

    Ok(())
}
