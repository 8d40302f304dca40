//! Command line interface for jobline
//!
//! - `run`: execute a job descriptor
//! - `check`: parse and validate a descriptor
//! - `plan`: show what `run` would do, without side effects
//! - `init`: write the built-in cargo CI descriptor
//! - `completions`: generate shell completions

pub mod check;
pub mod completions;
pub mod init;
pub mod plan;
pub mod run;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, CommandFactory, Parser, Subcommand, ValueEnum};
use jobline::infrastructure::{Config, RuntimeKind, init_logging};
use jobline::job::{Descriptor, Job, templates};
use std::path::{Path, PathBuf};

/// Descriptor read when no file is given
pub const DEFAULT_DESCRIPTOR: &str = ".jobline.yml";

/// CLI arguments for jobline
#[derive(Parser, Debug)]
#[command(name = "jobline")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Runner configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a job
    Run {
        #[command(flatten)]
        source: JobSource,
        /// Container runtime
        #[arg(short, long, value_enum)]
        runtime: Option<RuntimeArg>,
        /// Trace every script command
        #[arg(long)]
        trace: bool,
        /// Do not mirror step output
        #[arg(short, long)]
        quiet: bool,
        /// Write a JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Validate a job descriptor
    Check {
        #[command(flatten)]
        source: JobSource,
    },

    /// Show the container commands a run would issue
    Plan {
        #[command(flatten)]
        source: JobSource,
        /// Container runtime
        #[arg(short, long, value_enum)]
        runtime: Option<RuntimeArg>,
    },

    /// Write the built-in cargo CI descriptor
    Init {
        /// Output file
        #[arg(short, long, default_value = DEFAULT_DESCRIPTOR)]
        output: PathBuf,
        /// Image to run the job in
        #[arg(long)]
        image: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Where the job comes from
#[derive(ClapArgs, Debug, Clone)]
pub struct JobSource {
    /// Job descriptor (defaults to .jobline.yml)
    #[arg(conflicts_with = "builtin")]
    pub file: Option<PathBuf>,

    /// Use the built-in cargo CI job instead of a file
    #[arg(long)]
    pub builtin: bool,
}

impl JobSource {
    /// Loads and validates the job
    pub fn load(&self) -> Result<Job> {
        if self.builtin {
            return Ok(templates::cargo_ci());
        }
        let path = self
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DESCRIPTOR));
        Descriptor::load(&path)
            .with_context(|| format!("Failed to load job descriptor: {}", path.display()))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RuntimeArg {
    Docker,
    Podman,
    Host,
}

impl From<RuntimeArg> for RuntimeKind {
    fn from(value: RuntimeArg) -> Self {
        match value {
            RuntimeArg::Docker => RuntimeKind::Docker,
            RuntimeArg::Podman => RuntimeKind::Podman,
            RuntimeArg::Host => RuntimeKind::Host,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Parse and execute CLI arguments.
///
/// Returns `Ok(false)` when a job ran and failed.
pub fn run() -> Result<bool> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    init_logging(&config.log_level);

    match args.command {
        Command::Run {
            source,
            runtime,
            trace,
            quiet,
            report,
        } => {
            if let Some(runtime) = runtime {
                config.runtime = runtime.into();
            }
            config.trace |= trace;
            if quiet {
                config.echo_output = false;
            }
            let job = source.load()?;
            run::run_job(&job, &config, report.as_deref())
        }
        Command::Check { source } => {
            let job = source.load()?;
            check::print_summary(&job);
            Ok(true)
        }
        Command::Plan { source, runtime } => {
            if let Some(runtime) = runtime {
                config.runtime = runtime.into();
            }
            let job = source.load()?;
            println!("{}", plan::plan_job(&job, &config)?);
            Ok(true)
        }
        Command::Init {
            output,
            image,
            force,
        } => {
            init::write_descriptor(&output, image.as_deref(), force)?;
            println!("Wrote {}", output.display());
            Ok(true)
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
                ShellArg::Elvish => Shell::Elvish,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
            Ok(true)
        }
    }
}
