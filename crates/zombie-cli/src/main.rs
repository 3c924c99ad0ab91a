use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use zombie_core::config_file::{self, ConfigFile};
use zombie_core::{Paper, RetractionDatabase};
use zombie_reporting::{ExportFormat, export_report};

mod output;

use output::ColorMode;

/// Zombie citation checker - find references to retracted papers in a manuscript
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a manuscript's references against the retraction database
    Check {
        /// Manuscript to check (.pdf, .docx, .rtf, .txt, .tex, .md)
        file_path: PathBuf,

        /// Retraction database CSV (default: $RETRACTION_DB or config file)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Output format: text, json, csv, markdown
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Check every DOI found anywhere in the document instead of parsing
        /// the reference list
        #[arg(long)]
        doi_scan: bool,
    },

    /// Look up a DOI or title in the retraction database
    Lookup {
        /// Retraction database CSV
        #[arg(long)]
        db: Option<PathBuf>,

        /// DOI in any common spelling (bare, doi:, https://doi.org/...)
        #[arg(long, required_unless_present = "title", conflicts_with = "title")]
        doi: Option<String>,

        /// Exact title (case and punctuation are ignored)
        #[arg(long)]
        title: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show retraction database size and load diagnostics
    DbInfo {
        /// Retraction database CSV
        #[arg(long)]
        db: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the references extracted from a manuscript without checking them
    Extract {
        /// Manuscript to read
        file_path: PathBuf,

        /// List every DOI in the document instead of parsing the reference list
        #[arg(long)]
        doi_scan: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "zombie_core=debug,zombie_ingest=debug,zombie_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = config_file::load_config();

    match cli.command {
        Command::Check {
            file_path,
            db,
            format,
            output,
            no_color,
            doi_scan,
        } => check(&config, &file_path, db, format, output, no_color, doi_scan),
        Command::Lookup {
            db,
            doi,
            title,
            no_color,
        } => lookup(&config, db, doi, title, no_color),
        Command::DbInfo { db, no_color } => {
            let db = open_database(&config, db)?;
            let color = color_mode(&config, no_color);
            output::print_db_info(&mut std::io::stdout().lock(), &db, color)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Extract {
            file_path,
            doi_scan,
            no_color,
        } => {
            let paper = load_paper(&file_path, doi_scan)?;
            let color = color_mode(&config, no_color);
            output::print_references(&mut std::io::stdout().lock(), &paper, color)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(
    config: &ConfigFile,
    file_path: &Path,
    db: Option<PathBuf>,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
    no_color: bool,
    doi_scan: bool,
) -> anyhow::Result<ExitCode> {
    // Resolve format: CLI flag > output file extension > config > text
    let format = match format {
        Some(f) => f,
        None => {
            let from_ext = output
                .as_deref()
                .and_then(Path::extension)
                .and_then(|e| e.to_str())
                .and_then(ExportFormat::from_extension);
            match (from_ext, config.output_format()) {
                (Some(f), _) => f,
                (None, Some(name)) => name
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("invalid [output] format in config: {e}"))?,
                (None, None) => ExportFormat::Text,
            }
        }
    };

    let db = open_database(config, db)?;
    let paper = load_paper(file_path, doi_scan)?;
    let report = paper.report(&db);
    let summary = report.summary();
    tracing::info!(
        references = summary.total,
        zombies = summary.zombies(),
        ambiguous = summary.ambiguous,
        "check complete"
    );

    let source = paper
        .source()
        .map(str::to_string)
        .unwrap_or_else(|| file_path.display().to_string());

    match (&output, format) {
        (None, ExportFormat::Text) => {
            let color = color_mode(config, no_color);
            output::print_report(&mut std::io::stdout().lock(), &report, &source, color)?;
        }
        (None, format) => {
            export_report(&report, Some(source.as_str()), format, std::io::stdout().lock())?;
        }
        (Some(path), format) => {
            zombie_reporting::export_to_path(&report, Some(source.as_str()), format, path)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
    }

    Ok(if report.has_zombies() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn lookup(
    config: &ConfigFile,
    db: Option<PathBuf>,
    doi: Option<String>,
    title: Option<String>,
    no_color: bool,
) -> anyhow::Result<ExitCode> {
    let db = open_database(config, db)?;
    let color = color_mode(config, no_color);

    let (query, records) = match (&doi, &title) {
        (Some(doi), _) => (doi, db.records_for_doi(doi)),
        (None, Some(title)) => (title, db.lookup_by_title(title)),
        (None, None) => bail!("pass --doi or --title"),
    };

    let mut out = std::io::stdout().lock();
    if records.is_empty() {
        writeln!(out, "No retraction record for \"{}\"", query)?;
        return Ok(ExitCode::SUCCESS);
    }
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        output::print_record(&mut out, record, color)?;
    }
    if title.is_some() && records.len() > 1 {
        writeln!(out)?;
        writeln!(
            out,
            "{} records share this title; compare DOIs before citing either.",
            records.len()
        )?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Resolve the database path: CLI flag > `RETRACTION_DB` > config file.
fn database_path(config: &ConfigFile, cli_path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli_path
        .or_else(|| std::env::var_os("RETRACTION_DB").map(PathBuf::from))
        .or_else(|| config.database_path().map(PathBuf::from))
    {
        return Ok(path);
    }
    let hint = config_file::config_path()
        .map(|p| format!(" or {}", p.display()))
        .unwrap_or_default();
    bail!(
        "no retraction database configured: pass --db, set RETRACTION_DB, or add `[database] path` to .zombie.toml{}",
        hint
    )
}

fn open_database(
    config: &ConfigFile,
    cli_path: Option<PathBuf>,
) -> anyhow::Result<RetractionDatabase> {
    let path = database_path(config, cli_path)?;
    if !path.exists() {
        bail!("Retraction database not found at {}", path.display());
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Loading {}", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = RetractionDatabase::open_with_columns(&path, &config.column_map());
    spinner.finish_and_clear();

    let db = result.with_context(|| format!("failed to load {}", path.display()))?;
    if db.stats().skipped_rows > 0 {
        tracing::warn!(
            skipped = db.stats().skipped_rows,
            "rows without a DOI or title were skipped"
        );
    }
    Ok(db)
}

fn load_paper(file_path: &Path, doi_scan: bool) -> anyhow::Result<Paper> {
    if !file_path.exists() {
        bail!("File not found: {}", file_path.display());
    }

    let paper = if doi_scan {
        let text = zombie_ingest::extract_text(file_path)
            .with_context(|| format!("failed to read {}", file_path.display()))?;
        Paper::from_dois_in_text(&text)
            .with_context(|| format!("no DOIs found in {}", file_path.display()))?
            .with_source(file_path.display().to_string())
    } else {
        zombie_ingest::load_paper(file_path)?
    };
    tracing::debug!(references = paper.len(), doi_scan, "manuscript loaded");
    Ok(paper)
}

/// Color only for an interactive stdout, unless disabled by flag, `NO_COLOR`
/// or `[output] color = false`.
fn color_mode(config: &ConfigFile, no_color: bool) -> ColorMode {
    let env_disabled = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    ColorMode(
        !no_color
            && !env_disabled
            && config.color().unwrap_or(true)
            && std::io::stdout().is_terminal(),
    )
}
