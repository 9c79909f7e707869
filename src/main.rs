use std::path::{Path, PathBuf};
use std::process::ExitCode;

use duct_takeoff::config::job::JobFile;
use duct_takeoff::config::merged::MergedConfig;
use duct_takeoff::config::{self};
use duct_takeoff::pipeline::job_runner::JobConfig;
use duct_takeoff::pipeline::orchestrator::run_all_jobs;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: duct_takeoff <jobs.yaml>...");
        eprintln!("  Measure supply/extract duct lengths in PDF drawings according to job files.");
        eprintln!("  Set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("duct_takeoff {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_tracing();

    let mut job_configs: Vec<JobConfig> = Vec::new();
    let mut workers = 0;

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };
        workers = workers.max(settings.parallel_workers);

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file = match JobFile::from_yaml(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = MergedConfig::new(&settings, job);
            if let Err(e) = merged.validate() {
                eprintln!("ERROR: {}: {e}", job.input);
                return ExitCode::FAILURE;
            }

            job_configs.push(JobConfig {
                input_path: resolve_path(&job_dir, &job.input),
                output_path: resolve_path(&job_dir, &job.output),
                crops_dir: job.crops_dir.as_deref().map(|d| resolve_path(&job_dir, d)),
                options: merged.measure_options(),
                crop_zoom: merged.crop_zoom,
                crop_limit: merged.crop_limit,
            });
        }
    }

    let results = run_all_jobs(&job_configs, workers);

    let mut has_error = false;
    for (config, result) in job_configs.iter().zip(&results) {
        match result {
            Ok(job_result) => {
                eprintln!(
                    "OK: {} -> {} ({} drawings measured)",
                    job_result.input_path.display(),
                    job_result.output_path.display(),
                    job_result.measurement.primitive_count()
                );
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    config.input_path.display(),
                    config.output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
