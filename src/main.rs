//! rewalk - A resumable depth-first directory walker.
//!
//! Usage:
//!   rewalk walk [PATH]            Walk a tree, printing every entry
//!   rewalk resume <CHECKPOINT>    Continue an interrupted walk
//!   rewalk inspect <CHECKPOINT>   Show what a checkpoint still has to do
//!   rewalk --help                 Show help

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rewalk_core::{Checkpoint, HandlerError, ProgressEntry, ResourceId, WalkConfig, WalkStats};
use rewalk_walk::{CancellationToken, FileWalker, WalkError, WalkHandler};

#[derive(Parser)]
#[command(
    name = "rewalk",
    version,
    about = "A resumable depth-first directory walker",
    long_about = "rewalk walks a directory tree depth-first and can stop at any point.\n\n\
                  With --checkpoint, an interrupted walk saves its progress so that \
                  `rewalk resume` continues exactly where it left off."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a directory tree
    Walk {
        /// Root of the walk
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only visit the root's immediate children
        #[arg(long)]
        non_recursive: bool,

        /// Visit siblings in name order
        #[arg(short, long)]
        sorted: bool,

        /// Save progress here if the walk stops early
        #[arg(short, long)]
        checkpoint: Option<PathBuf>,

        /// Stop after handling this many entries
        #[arg(short, long)]
        limit: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Resume a walk from a checkpoint file
    Resume {
        /// Checkpoint written by an earlier walk
        checkpoint: PathBuf,

        /// Stop after handling this many entries
        #[arg(short, long)]
        limit: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the contents of a checkpoint file
    Inspect {
        /// Checkpoint file
        checkpoint: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Command::Walk {
            path,
            non_recursive,
            sorted,
            checkpoint,
            limit,
            format,
        } => {
            let config = WalkConfig::builder()
                .root(path)
                .recursive(!non_recursive)
                .sort_entries(sorted)
                .build()?;
            let handler = PrintHandler::new(format, limit);
            let token = handler.token.clone();
            let walker = FileWalker::new(config, handler).with_cancellation(token);
            run_walk(walker, checkpoint.as_deref())?;
        }
        Command::Resume {
            checkpoint,
            limit,
            format,
        } => {
            let saved = Checkpoint::load(&checkpoint)
                .wrap_err_with(|| format!("Cannot resume from {}", checkpoint.display()))?;
            if saved.is_finished() {
                eprintln!("Walk of {} already finished", saved.root);
                return Ok(());
            }
            let handler = PrintHandler::new(format, limit);
            let token = handler.token.clone();
            let walker = FileWalker::from_checkpoint(saved, handler)?.with_cancellation(token);
            run_walk(walker, Some(&checkpoint))?;
        }
        Command::Inspect { checkpoint, format } => {
            let saved = Checkpoint::load(&checkpoint)
                .wrap_err_with(|| format!("Cannot read {}", checkpoint.display()))?;
            print_checkpoint(&saved, format)?;
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("rewalk=debug,rewalk_walk=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

/// Prints each handled entry and stops the walk after `limit` entries.
struct PrintHandler {
    format: OutputFormat,
    limit: Option<u64>,
    handled: u64,
    next_id: u64,
    token: CancellationToken,
}

impl PrintHandler {
    fn new(format: OutputFormat, limit: Option<u64>) -> Self {
        Self {
            format,
            limit,
            handled: 0,
            next_id: 0,
            token: CancellationToken::new(),
        }
    }

    fn emit(&mut self, kind: &str, path: &Path, depth: usize) -> Result<ResourceId, HandlerError> {
        self.next_id += 1;
        match self.format {
            OutputFormat::Text => {
                let marker = match kind {
                    "directory" => "D",
                    "restricted" => "R",
                    _ => "F",
                };
                println!("{marker} {}", path.display());
            }
            OutputFormat::Json => {
                let line = json!({
                    "kind": kind,
                    "path": path.to_string_lossy(),
                    "depth": depth,
                    "id": self.next_id,
                });
                println!("{line}");
            }
        }

        self.handled += 1;
        if self.limit.is_some_and(|limit| self.handled >= limit) {
            self.token.cancel();
        }
        Ok(ResourceId::new(self.next_id, path.to_string_lossy()))
    }
}

impl WalkHandler for PrintHandler {
    fn handle_directory(
        &mut self,
        path: &Path,
        depth: usize,
        _parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        self.emit("directory", path, depth)
    }

    fn handle_file(
        &mut self,
        path: &Path,
        depth: usize,
        _parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        self.emit("file", path, depth)
    }

    fn handle_restricted_directory(
        &mut self,
        path: &Path,
        depth: usize,
        _parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        self.emit("restricted", path, depth)
    }
}

/// Run a walk, saving or clearing the checkpoint depending on how it ends.
fn run_walk(mut walker: FileWalker<PrintHandler>, checkpoint: Option<&Path>) -> Result<()> {
    let format = walker.handler().format;
    match walker.walk() {
        Ok(stats) => {
            if let Some(path) = checkpoint {
                if path.exists() {
                    fs::remove_file(path)
                        .wrap_err_with(|| format!("Failed to remove {}", path.display()))?;
                    debug!(path = %path.display(), "removed checkpoint of finished walk");
                }
            }
            print_summary(&stats, format)
        }
        Err(err) if err.is_resumable() => {
            match checkpoint {
                Some(path) => {
                    walker.checkpoint().save(path)?;
                    eprintln!(
                        "Progress saved to {} ({} open directories)",
                        path.display(),
                        walker.progress().len()
                    );
                }
                None => eprintln!("No --checkpoint given; progress was not saved"),
            }
            if matches!(err, WalkError::Interrupted) {
                eprintln!("Walk paused after {} entries", walker.handler().handled);
                Ok(())
            } else {
                Err(err.into())
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn print_summary(stats: &WalkStats, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            eprintln!();
            eprintln!("{}", "─".repeat(60));
            eprintln!(
                " {} directories, {} files, {} restricted",
                stats.directories, stats.files, stats.restricted
            );
            if stats.resumed {
                eprintln!(
                    " Resumed: {} entries skipped, {} divergences",
                    stats.skipped, stats.divergences
                );
            }
            eprintln!(" Walked in {:.2}s", stats.duration.as_secs_f64());
            eprintln!("{}", "─".repeat(60));

            if stats.has_warnings() {
                eprintln!();
                eprintln!("{} warning(s) during walk", stats.warnings.len());
                for warning in &stats.warnings {
                    eprintln!("   {}: {}", warning.path.display(), warning.message);
                }
            }
        }
        OutputFormat::Json => {
            eprintln!("{}", serde_json::to_string_pretty(stats)?);
        }
    }
    Ok(())
}

fn print_checkpoint(checkpoint: &Checkpoint, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", "─".repeat(70));
            println!(" Checkpoint for {}", checkpoint.root);
            println!(
                " Saved {} (recursive: {}, sorted: {})",
                checkpoint.saved_at.format("%Y-%m-%d %H:%M:%S UTC"),
                checkpoint.recursive,
                checkpoint.sort_entries
            );
            println!("{}", "─".repeat(70));

            if checkpoint.is_finished() {
                println!(" Walk finished; nothing left to do.");
                return Ok(());
            }

            for (depth, entry) in checkpoint.progress.iter().enumerate() {
                let indent = "  ".repeat(depth);
                println!(
                    " {indent}{} [id {}] {} pending",
                    entry.locator(),
                    entry.id(),
                    entry.pending_len()
                );
            }
            if let Some(top) = checkpoint.progress.peek() {
                println!();
                println!(" Next up:");
                for child in top.pending() {
                    println!("   {child}");
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", checkpoint.to_json()?);
        }
    }
    Ok(())
}
