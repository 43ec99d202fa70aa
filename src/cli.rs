use clap::Parser;
use lm_core::ScanErrorPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lossymirror")]
#[command(
    author,
    version,
    about = "Mirror a lossless music library into a lossy copy"
)]
pub struct Cli {
    /// Source library root
    #[arg(short, long, required_unless_present = "check_tools")]
    pub input: Option<PathBuf>,

    /// Destination library root
    #[arg(short, long, required_unless_present = "check_tools")]
    pub output: Option<PathBuf>,

    /// Number of parallel workers (overrides mirror.workers)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// What to do when a file cannot be classified: abort, skip or collect
    #[arg(long, value_name = "POLICY")]
    pub on_scan_error: Option<ScanErrorPolicy>,

    /// Print the job list without creating directories or transcoding
    #[arg(long)]
    pub dry_run: bool,

    /// Print the dry-run job list as JSON
    #[arg(long, requires = "dry_run")]
    pub json: bool,

    /// Check that ffmpeg and ffprobe are available, then exit
    #[arg(long)]
    pub check_tools: bool,
}
