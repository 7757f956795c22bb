//! Chartify Writer - declarative chart definitions rendered to image files
//!
//! Reads YAML/JSON chart definitions (line, bar, pie, donut) and writes
//! PNG, JPEG, WebP, SVG, PDF or EPS files through plotters.

mod charts;
mod config;
mod document;
mod writer;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use config::{load_file, LoadedChart};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use writer::ChartWriter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render declarative chart definitions to image files", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every chart of the given definition files
    Render(RenderArgs),
    /// Check chart definitions without rendering anything
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// YAML/JSON chart definition files
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    configs: Vec<PathBuf>,

    /// Create missing output directories
    #[arg(long, action = ArgAction::SetTrue)]
    create_dirs: bool,

    /// Worker threads for rendering (defaults to one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Open each written file with the system default application
    #[arg(long, action = ArgAction::SetTrue)]
    open: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// YAML/JSON chart definition files
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    configs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Render(args) => handle_render(args),
        Command::Validate(args) => handle_validate(args),
    }
}

/// Load every definition file. Unreadable files and bad chart entries are
/// logged and counted; everything else is returned.
fn load_all(configs: &[PathBuf]) -> (Vec<LoadedChart>, usize) {
    let mut charts = Vec::new();
    let mut failed = 0usize;
    for path in configs {
        let entries = match load_file(path) {
            Ok(entries) => entries,
            Err(err) => {
                error!("{}", err);
                failed += 1;
                continue;
            }
        };
        for entry in entries {
            match entry {
                Ok(chart) => charts.push(chart),
                Err(err) => {
                    error!("{}", err);
                    failed += 1;
                }
            }
        }
    }
    (charts, failed)
}

fn handle_render(args: RenderArgs) -> Result<()> {
    let (charts, mut failed) = load_all(&args.configs);
    let total = charts.len() + failed;
    let writer = ChartWriter::new().create_dirs(args.create_dirs);

    let results = match args.jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("building render thread pool")?
            .install(|| writer.write_all(&charts)),
        None => writer.write_all(&charts),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (chart, result) in charts.iter().zip(results) {
        match result {
            Ok(report) => {
                serde_json::to_writer(&mut out, &report)?;
                writeln!(out)?;
                if args.open {
                    if let Err(err) = open::that(&report.path) {
                        warn!("Could not open {}: {}", report.path.display(), err);
                    }
                }
            }
            Err(err) => {
                error!("{}: {}", chart, err);
                failed += 1;
            }
        }
    }

    info!("Rendered {} of {} chart(s)", total - failed, total);
    if failed > 0 {
        return Err(anyhow!("{} of {} chart(s) failed", failed, total));
    }
    Ok(())
}

fn handle_validate(args: ValidateArgs) -> Result<()> {
    let (charts, mut failed) = load_all(&args.configs);
    let total = charts.len() + failed;

    for chart in &charts {
        match chart.options.validate() {
            Ok(()) => println!("ok {} -> {}", chart, chart.options.output_path().display()),
            Err(err) => {
                error!("{}: {}", chart, err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} chart(s) invalid", failed, total));
    }
    Ok(())
}
