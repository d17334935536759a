//! examkit CLI - exam-result spreadsheet conversion tool

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use examkit_io_fs::{
    EnumConvertFileConflictStrategy, SpecConvertOptions, convert_file, convert_folder,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "examkit")]
#[command(
    author,
    version,
    about = "Rank, highlight and rewrite exam-result spreadsheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every .xls/.xlsx file directly inside a directory
    Folder {
        /// Input directory
        dir_in: PathBuf,

        /// Output directory (default: <DIR_IN>/output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scores strictly below this value are highlighted
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Number of files converted in parallel
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Do not write a header row
        #[arg(long)]
        no_headers: bool,

        /// Prefix prepended to each output file name
        #[arg(long)]
        prefix: Option<String>,

        /// What to do when an output file already exists
        #[arg(long, value_enum, default_value = "overwrite")]
        on_conflict: ArgConflict,

        /// Report what would be converted without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Convert a single workbook
    File {
        /// Input workbook (.xls or .xlsx)
        file_in: PathBuf,

        /// Output workbook (.xls or .xlsx)
        file_out: PathBuf,

        /// Scores strictly below this value are highlighted
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Do not write a header row
        #[arg(long)]
        no_headers: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ArgConflict {
    Overwrite,
    Skip,
    Error,
}

impl From<ArgConflict> for EnumConvertFileConflictStrategy {
    fn from(value: ArgConflict) -> Self {
        match value {
            ArgConflict::Overwrite => Self::Overwrite,
            ArgConflict::Skip => Self::Skip,
            ArgConflict::Error => Self::Error,
        }
    }
}

fn main() -> Result<ExitCode> {
    // RUST_LOG overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Folder {
            dir_in,
            output,
            threshold,
            workers,
            no_headers,
            prefix,
            on_conflict,
            dry_run,
        } => {
            let mut options = derive_options(threshold, no_headers);
            options.num_workers_max = Some(workers);
            options.rule_conflict_file = on_conflict.into();
            options.if_dry_run = dry_run;
            if let Some(prefix) = prefix {
                options.prefix_file_out = prefix;
            }
            let dir_out = output.unwrap_or_else(|| dir_in.join("output"));
            tracing::debug!(
                dir_in = %dir_in.display(),
                dir_out = %dir_out.display(),
                "folder conversion requested"
            );
            run_folder(&dir_in, &dir_out, options)
        }
        Commands::File {
            file_in,
            file_out,
            threshold,
            no_headers,
        } => run_file(&file_in, &file_out, derive_options(threshold, no_headers)),
    }
}

fn derive_options(threshold: Option<f64>, no_headers: bool) -> SpecConvertOptions {
    let mut options = SpecConvertOptions::default();
    if let Some(thr) = threshold {
        options.write_options.highlight.thr_below = thr;
    }
    if no_headers {
        options.headers = None;
    }
    options
}

fn run_folder(dir_in: &Path, dir_out: &Path, options: SpecConvertOptions) -> Result<ExitCode> {
    let report = convert_folder(dir_in, dir_out, options)
        .with_context(|| format!("Failed to convert folder '{}'", dir_in.display()))?;

    for err in &report.errors {
        eprintln!("error: {}: {}", err.path.display(), err.exception);
    }
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    println!("{report}");

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_file(file_in: &Path, file_out: &Path, options: SpecConvertOptions) -> Result<ExitCode> {
    let sheet_report = convert_file(file_in, file_out, options.headers.as_deref(), &options)
        .with_context(|| {
            format!(
                "Failed to convert '{}' to '{}'",
                file_in.display(),
                file_out.display()
            )
        })?;

    for warning in &sheet_report.warnings {
        eprintln!("warning: {warning}");
    }
    println!(
        "[CONVERT] {} rows={} highlighted={}",
        sheet_report.path.display(),
        sheet_report.n_rows_data,
        sheet_report.n_rows_highlighted
    );
    Ok(ExitCode::SUCCESS)
}
