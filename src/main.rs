mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use lm_av::{FfmpegTranscoder, FfprobeProber, ToolRegistry, Transcoder};
use lm_core::{Config, Error, Job, JobAction};
use lossymirror::mirror::Mirror;
use lossymirror::scanner::ScanReport;
use serde::Serialize;

fn main() {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "lossymirror=debug,lm_av=debug,lm_core=debug".to_string()
        } else {
            "lossymirror=info,lm_av=info,lm_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            tracing::error!("{err:#}");
            exit_code(&err)
        }
    };
    std::process::exit(code);
}

/// Exit status for a failed run. Anything that is not an [`Error`] is internal.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>()
        .map_or(Error::Internal(String::new()).exit_code(), Error::exit_code)
}

fn build_runtime() -> lm_core::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// Run the command line. `Ok(false)` means at least one job failed.
fn run(cli: Cli) -> Result<bool> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(jobs) = cli.jobs {
        config.mirror.workers = usize::from(jobs);
    }
    if let Some(policy) = cli.on_scan_error {
        config.mirror.on_scan_error = policy;
    }

    let registry = ToolRegistry::discover(&config.tools);

    if cli.check_tools {
        check_tools(&registry);
        return Ok(true);
    }

    let (Some(input), Some(output)) = (cli.input, cli.output) else {
        return Err(Error::Config("--input and --output are required".into()).into());
    };
    let mirror = Mirror::new(input, output, config)?;
    tracing::info!(
        source = %mirror.source_root().display(),
        dest = %mirror.dest_root().display(),
        workers = mirror.config().mirror.workers,
        "Mirroring library"
    );

    let ffprobe = registry.get_or_bare("ffprobe", &mirror.config().tools);
    let report = mirror.scan(Arc::new(FfprobeProber::new(ffprobe.path)))?;
    tracing::info!(
        jobs = report.jobs.len(),
        skipped = report.skipped.len(),
        walk_errors = report.walk_errors.len(),
        "Scan complete"
    );

    if cli.dry_run {
        print_jobs(&report, cli.json)?;
        return Ok(true);
    }

    if report.jobs.is_empty() {
        tracing::info!("Nothing to mirror");
        return Ok(true);
    }

    let needs_ffmpeg = report
        .jobs
        .iter()
        .any(|job| job.action() == JobAction::Convert);
    let ffmpeg = if needs_ffmpeg {
        registry.require("ffmpeg")?.clone()
    } else {
        registry.get_or_bare("ffmpeg", &mirror.config().tools)
    };
    let transcoder: Arc<dyn Transcoder> =
        Arc::new(FfmpegTranscoder::new(ffmpeg, mirror.config().encoder.clone()));

    let dirs = mirror.prepare(&report.jobs)?;
    tracing::debug!(directories = dirs, "Prepared destination tree");

    let rt = build_runtime()?;
    let summary = rt.block_on(mirror.dispatch(report.jobs, transcoder));

    for failure in &summary.failures {
        tracing::warn!(
            source = %failure.job.source().display(),
            error = %failure.error,
            "Not mirrored"
        );
    }
    if summary.is_success() {
        tracing::info!(converted = summary.succeeded, "Mirror complete");
    } else {
        tracing::error!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "Mirror finished with failures"
        );
    }

    Ok(summary.is_success())
}

#[derive(Serialize)]
struct DryRun<'a> {
    jobs: &'a [Job],
    skipped: Vec<String>,
    walk_errors: Vec<String>,
}

fn print_jobs(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        let dry_run = DryRun {
            jobs: &report.jobs,
            skipped: report.skipped.iter().map(ToString::to_string).collect(),
            walk_errors: report.walk_errors.iter().map(ToString::to_string).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&dry_run)?);
        return Ok(());
    }

    for job in &report.jobs {
        println!("{job}");
    }
    println!("\n{} job(s)", report.jobs.len());
    Ok(())
}

fn check_tools(registry: &ToolRegistry) {
    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in registry.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. ffmpeg is needed to convert, ffprobe to inspect .m4a files.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_follows_error_class() {
        let io = anyhow::Error::from(Error::from(std::io::Error::other("no threads")));
        assert_eq!(exit_code(&io), 5);

        let config = anyhow::Error::from(Error::Config("bad".into()));
        assert_eq!(exit_code(&config), 2);

        let foreign = anyhow::anyhow!("unexpected");
        assert_eq!(exit_code(&foreign), 70);
    }

    #[test]
    fn runtime_builds() {
        let rt = build_runtime().unwrap();
        assert_eq!(rt.block_on(async { 1 + 1 }), 2);
    }
}
