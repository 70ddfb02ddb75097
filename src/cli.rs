//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{find_config, load_config};
use crate::pipeline::{self, Graph, TaskContext, TaskKind};
use crate::reporter;
use crate::serve::ReloadHub;

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Sitekit - build static-site assets from a source tree
#[derive(Parser)]
#[command(name = "sitekit")]
#[command(about = "Sitekit - static-site asset pipeline")]
#[command(version)]
pub struct Cli {
    /// Path to sitekit.toml (default: walk up from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean, build everything, then watch and serve with live reload
    Dev,
    /// Clean and produce a minified, optimized production build
    Build,
    /// Render page templates
    Templates,
    /// Compile the stylesheet bundle
    Styles {
        /// Minify and skip the source map
        #[arg(long)]
        prod: bool,
    },
    /// Bundle script entry points
    Scripts,
    /// Copy (or, with --prod, optimize) images
    Images {
        /// Recompress images through the optimizer cache
        #[arg(long)]
        prod: bool,
    },
    /// Assemble the icon sprite
    Icons,
    /// Copy fonts
    Fonts,
    /// Remove the output directory
    Clean,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config);
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let root = project_root(config_path.as_deref());
    if cli.verbose {
        match &config_path {
            Some(path) => reporter::info(&format!("Using config: {}", path.display())),
            None => reporter::info("No sitekit.toml found, using defaults"),
        }
    }

    let ctx = TaskContext::new(config, root).with_verbose(cli.verbose);

    match cli.command {
        Commands::Dev => {
            // The dev flow owns the live-reload hub; every task gets a
            // handle through the context.
            let ctx = ctx.with_reload(ReloadHub::new());
            run_flow(&pipeline::default_flow(), &ctx)
        }
        Commands::Build => run_flow(&pipeline::build_flow(), &ctx),
        Commands::Templates => run_single(TaskKind::Templates, &ctx),
        Commands::Styles { prod: true } => run_single(TaskKind::StylesProd, &ctx),
        Commands::Styles { prod: false } => run_single(TaskKind::StylesDev, &ctx),
        Commands::Scripts => run_single(TaskKind::Scripts, &ctx),
        Commands::Images { prod: true } => run_single(TaskKind::ImagesProd, &ctx),
        Commands::Images { prod: false } => run_single(TaskKind::ImagesDev, &ctx),
        Commands::Icons => run_single(TaskKind::Icons, &ctx),
        Commands::Fonts => run_single(TaskKind::Fonts, &ctx),
        Commands::Clean => run_single(TaskKind::Clean, &ctx),
    }
}

/// The directory all configured paths resolve against: the config file's
/// directory, or the current directory without one.
fn project_root(config_path: Option<&Path>) -> PathBuf {
    config_path
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
}

/// Walk a flow graph; the exit code reflects whether any task failed.
fn run_flow(graph: &Graph, ctx: &TaskContext) -> ExitCode {
    match pipeline::run(graph, ctx) {
        Ok(report) => {
            reporter::flow_summary(&report);
            if report.success() {
                ExitCode::from(EXIT_SUCCESS)
            } else {
                ExitCode::from(EXIT_ERROR)
            }
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run one task ad hoc.
fn run_single(kind: TaskKind, ctx: &TaskContext) -> ExitCode {
    run_flow(&Graph::Task(kind), ctx)
}
