//! Input directory discovery and batch conversion orchestration.

use std::fs;
use std::path::{Path, PathBuf};

use examkit_io_sheet::util::validate_policy_autofit;
use examkit_io_sheet::{SheetIoError, SpecSheetReport, read_records, write_records};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::report::{ReportConvert, ReportConvertBuilder};
use crate::spec::{ConvertFolderError, SpecConvertOptions};
use crate::util::{
    TypeConvertPatternSeq, calculate_worker_limit, derive_output_path, should_skip_file_conflict,
};

#[derive(Debug, Clone)]
struct SpecConvertTaskFile {
    path_file_in: PathBuf,
    path_file_out: PathBuf,
}

type TypeConvertResult = (SpecConvertTaskFile, Result<SpecSheetReport, SheetIoError>);

/// Convert every spreadsheet directly inside `dir_in` into `dir_out`.
///
/// The run proceeds in three stages:
/// 1. option validation and non-recursive discovery of matching files;
/// 2. output path planning with conflict and dry-run handling;
/// 3. conversion (serial, or on a rayon pool when `num_workers_max > 1`).
///
/// Per-file failures never stop the run; they are collected in the
/// returned [`ReportConvert`]. [`ConvertFolderError`] is reserved for
/// setup failures.
pub fn convert_folder<P, Q>(
    dir_in: P,
    dir_out: Q,
    options: SpecConvertOptions,
) -> Result<ReportConvert, ConvertFolderError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_in = dir_in.as_ref().to_path_buf();
    let path_dir_out = dir_out.as_ref().to_path_buf();

    validate_convert_options(&options)?;
    if !path_dir_in.is_dir() {
        return Err(ConvertFolderError::SourceNotDirectory(path_dir_in));
    }
    let patterns =
        TypeConvertPatternSeq::from_raw(&options.patterns_include_files, options.rule_pattern)?;
    let n_workers_max = calculate_worker_limit(options.num_workers_max);

    let mut builder_cv_report = ReportConvertBuilder::default();
    let l_files = discover_spreadsheet_files(&path_dir_in, &patterns, &mut builder_cv_report)?;

    let mut l_tasks = Vec::with_capacity(l_files.len());
    for path_file_in in l_files {
        let Some(name_file) = path_file_in.file_name().map(|n| n.to_string_lossy().to_string())
        else {
            continue;
        };
        let path_file_out = derive_output_path(&path_dir_out, &name_file, &options.prefix_file_out);
        if should_skip_file_conflict(
            &path_file_out,
            options.rule_conflict_file,
            &mut builder_cv_report,
        ) {
            debug!(path = %path_file_out.display(), "output conflict, file skipped");
            continue;
        }
        if options.if_dry_run {
            info!(
                input = %path_file_in.display(),
                output = %path_file_out.display(),
                "dry run, conversion planned"
            );
            builder_cv_report.add_skipped();
            continue;
        }
        l_tasks.push(SpecConvertTaskFile {
            path_file_in,
            path_file_out,
        });
    }

    let l_results = run_convert_tasks(l_tasks, &options, n_workers_max, &mut builder_cv_report);
    apply_convert_results(l_results, &mut builder_cv_report);

    let report = builder_cv_report.build();
    info!("{}", report);
    Ok(report)
}

/// Convert one workbook: extract records from `path_file_in`, write them to
/// `path_file_out`.
///
/// The parent directory of `path_file_out` is created first.
pub fn convert_file<P, Q>(
    path_file_in: P,
    path_file_out: Q,
    headers: Option<&[String]>,
    options: &SpecConvertOptions,
) -> Result<SpecSheetReport, SheetIoError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_in = path_file_in.as_ref();
    let path_file_out = path_file_out.as_ref();

    let l_records = read_records(path_file_in, &options.read_options)?;
    if let Some(path_parent) = path_file_out.parent()
        && !path_parent.as_os_str().is_empty()
    {
        fs::create_dir_all(path_parent).map_err(|e| SheetIoError::io(path_parent, e))?;
    }
    write_records(path_file_out, &l_records, headers, &options.write_options)
}

/// List regular files directly inside `path_dir_in` whose name matches,
/// sorted by file name.
pub(crate) fn discover_spreadsheet_files(
    path_dir_in: &Path,
    patterns: &TypeConvertPatternSeq,
    builder_cv_report: &mut ReportConvertBuilder,
) -> Result<Vec<PathBuf>, ConvertFolderError> {
    let iter_entries = fs::read_dir(path_dir_in).map_err(|e| ConvertFolderError::ReadDirFailed {
        path: path_dir_in.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut l_files: Vec<(String, PathBuf)> = Vec::new();
    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                builder_cv_report.add_warning(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_dir_in.display()
                ));
                continue;
            }
        };
        let path_entry = entry.path();
        if !path_entry.is_file() {
            continue;
        }
        builder_cv_report.add_scanned();

        let c_name = entry.file_name().to_string_lossy().to_string();
        if !patterns.is_match(&c_name) {
            continue;
        }
        builder_cv_report.add_matched();
        l_files.push((c_name, path_entry));
    }

    l_files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(l_files.into_iter().map(|(_, path)| path).collect())
}

fn validate_convert_options(options: &SpecConvertOptions) -> Result<(), ConvertFolderError> {
    if options.num_workers_max == Some(0) {
        return Err(ConvertFolderError::InvalidOptions(
            "Arg `num_workers_max` must be >= 1 or None.".to_string(),
        ));
    }
    if options.write_options.n_cols == 0 {
        return Err(ConvertFolderError::InvalidOptions(
            "Arg `write_options.n_cols` must be >= 1.".to_string(),
        ));
    }
    validate_policy_autofit(&options.write_options.policy_autofit)
        .map_err(|e| ConvertFolderError::InvalidOptions(e.to_string()))
}

fn run_convert_task(task: SpecConvertTaskFile, options: &SpecConvertOptions) -> TypeConvertResult {
    let res_convert = convert_file(
        &task.path_file_in,
        &task.path_file_out,
        options.headers.as_deref(),
        options,
    );
    (task, res_convert)
}

fn run_convert_tasks(
    l_tasks: Vec<SpecConvertTaskFile>,
    options: &SpecConvertOptions,
    n_workers_max: usize,
    builder_cv_report: &mut ReportConvertBuilder,
) -> Vec<TypeConvertResult> {
    if l_tasks.is_empty() {
        return Vec::new();
    }
    if n_workers_max <= 1 {
        return l_tasks
            .into_iter()
            .map(|task| run_convert_task(task, options))
            .collect();
    }

    let thread_pool = ThreadPoolBuilder::new().num_threads(n_workers_max).build();
    let Ok(thread_pool) = thread_pool else {
        builder_cv_report.add_warning(format!(
            "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial conversion."
        ));
        return l_tasks
            .into_iter()
            .map(|task| run_convert_task(task, options))
            .collect();
    };

    thread_pool.install(|| {
        l_tasks
            .into_par_iter()
            .map(|task| run_convert_task(task, options))
            .collect::<Vec<_>>()
    })
}

fn apply_convert_results(
    l_results: Vec<TypeConvertResult>,
    builder_cv_report: &mut ReportConvertBuilder,
) {
    for (task, res_convert) in l_results {
        match res_convert {
            Ok(sheet_report) => {
                info!(
                    input = %task.path_file_in.display(),
                    output = %task.path_file_out.display(),
                    n_rows = sheet_report.n_rows_data,
                    n_highlighted = sheet_report.n_rows_highlighted,
                    "converted"
                );
                builder_cv_report.add_converted(&sheet_report);
            }
            Err(e) => {
                warn!(input = %task.path_file_in.display(), error = %e, "conversion failed");
                builder_cv_report.add_error(task.path_file_in, e.to_string());
            }
        }
    }
}
