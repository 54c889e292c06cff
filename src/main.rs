use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pbmkit::cli;
use pbmkit::pipeline::MakeTask;

#[derive(Parser)]
#[command(name = "pbmkit", version)]
#[command(about = "Build and verify programming-judge problem bundles", long_about = None)]
struct Cli {
    /// Log debug details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the golden solution, generate expected outputs and verify the other solutions
    Make {
        /// Problem directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Path to config file (defaults to ./pbmkit.toml or ~/.config/pbmkit/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Phases to run: exe, cor, verify or all (comma separated)
        #[arg(short, long, value_delimiter = ',', default_value = "all")]
        tasks: Vec<MakeTask>,

        /// Number of testcases run in parallel
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-process timeout in seconds (0 disables it)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify solutions against the existing expected outputs
    Verify {
        /// Programs to verify (defaults to every solution but the golden one)
        programs: Vec<String>,

        /// Problem directory
        #[arg(short, long, default_value = ".")]
        directory: String,

        /// Statement language whose directory is used (defaults to the original)
        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        config: Option<String>,

        #[arg(short, long)]
        jobs: Option<usize>,

        #[arg(long)]
        timeout: Option<u64>,

        #[arg(long)]
        json: bool,
    },

    /// List the supported compilers and whether their toolchains are installed
    Compilers {
        /// Only list compilers whose toolchain is installed
        #[arg(long)]
        available: bool,

        #[arg(long)]
        config: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show how a problem bundle is loaded
    Inspect {
        #[arg(default_value = ".")]
        path: String,

        #[arg(long)]
        config: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Check a problem directory for structural problems
    Lint {
        #[arg(default_value = ".")]
        path: String,
    },

    /// List (and with --force remove) generated files
    Clean {
        #[arg(default_value = ".")]
        path: String,

        /// Also remove the expected outputs (.cor files)
        #[arg(short, long)]
        all: bool,

        /// Remove the files instead of only listing them
        #[arg(short, long)]
        force: bool,

        #[arg(long)]
        config: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Make {
            path,
            config,
            tasks,
            jobs,
            timeout,
            json,
        } => {
            cli::make::run(path, config, tasks, jobs, timeout, json)?;
        }
        Commands::Verify {
            programs,
            directory,
            language,
            config,
            jobs,
            timeout,
            json,
        } => {
            cli::verify::run(directory, programs, language, config, jobs, timeout, json)?;
        }
        Commands::Compilers {
            available,
            config,
            json,
        } => {
            cli::compilers::run(config, available, json)?;
        }
        Commands::Inspect { path, config, json } => {
            cli::inspect::run(path, config, json)?;
        }
        Commands::Lint { path } => {
            cli::lint::run(&path)?;
        }
        Commands::Clean {
            path,
            all,
            force,
            config,
        } => {
            cli::clean::run(path, config, all, force)?;
        }
    }

    Ok(())
}
