use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lanestate_emit::{AnalysisEmitter, Emitter, EmitterConfig, OutputFormat, VerbosityLevel};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lanestate")]
#[command(about = "Alloca provenance and memory-state analysis for work-item kernels")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every function of a module, or one with --function.
    Analyze {
        input: PathBuf,

        #[arg(short, long)]
        function: Option<String>,

        /// Also analyze each natural loop as its own region.
        #[arg(long)]
        loops: bool,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_color: bool,

        /// JSON emitter configuration; flags override it.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum)]
        detail: Option<Detail>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Check that a file parses into a module.
    Validate {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Print a module in canonical form.
    Print { input: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Detail {
    Quiet,
    Normal,
    Verbose,
    Debug,
}

impl From<Detail> for VerbosityLevel {
    fn from(detail: Detail) -> Self {
        match detail {
            Detail::Quiet => VerbosityLevel::Quiet,
            Detail::Normal => VerbosityLevel::Normal,
            Detail::Verbose => VerbosityLevel::Verbose,
            Detail::Debug => VerbosityLevel::Debug,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Analyze { verbose, .. } | Commands::Validate { verbose, .. } => *verbose,
        Commands::Print { .. } => false,
    };
    init_tracing(verbose);

    match cli.command {
        Commands::Analyze {
            input,
            function,
            loops,
            json,
            no_color,
            config,
            detail,
            output,
            verbose: _,
        } => {
            let mut config = match config {
                Some(path) => EmitterConfig::from_file(path)?,
                None => EmitterConfig::default(),
            };
            config.include_loops |= loops;
            if json {
                config.format = OutputFormat::Json;
            }
            if no_color || output.is_some() {
                config.use_colors = false;
            }
            if let Some(detail) = detail {
                config.verbosity = detail.into();
            }
            cmd_analyze(&input, function, config, output)
        }
        Commands::Validate { input, verbose } => cmd_validate(&input, verbose),
        Commands::Print { input } => cmd_print(&input),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_module(input: &Path) -> Result<lanestate_core::Module> {
    lanestate_parser::parse_module_file(input)
        .with_context(|| format!("failed to load {}", input.display()))
}

fn cmd_analyze(
    input: &Path,
    function: Option<String>,
    config: EmitterConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    if !config.use_colors {
        colored::control::set_override(false);
    }

    let module = load_module(input)?;
    info!(
        module = %module.name,
        functions = module.functions.len(),
        "loaded module"
    );

    let mut emitter = AnalysisEmitter::new(config);
    if let Some(name) = function {
        emitter = emitter.with_function(name);
    }
    let text = emitter.emit_to_string(&module)?;

    match output {
        Some(path) => {
            fs::write(&path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!(path = %path.display(), bytes = text.len(), "wrote analysis");
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn cmd_validate(input: &Path, verbose: bool) -> Result<()> {
    if verbose {
        println!("{}", "Validating kernel IR".bright_cyan().bold());
        println!("Input: {}", input.display());
    }

    match lanestate_parser::parse_module_file(input) {
        Ok(module) => {
            println!("{}", "VALID".bright_green().bold());
            if verbose {
                println!(
                    "  {} function(s), {} declaration(s), {} kernel(s)",
                    module.functions.len(),
                    module.declarations.len(),
                    module.kernels().count()
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", "INVALID".bright_red().bold());
            println!("{}", e);
            Err(anyhow::anyhow!("validation failed"))
        }
    }
}

fn cmd_print(input: &Path) -> Result<()> {
    let module = load_module(input)?;
    print!("{}", lanestate_core::format::format_module(&module));
    Ok(())
}
