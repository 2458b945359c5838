use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;

use classlint::analysis::detectors::builtin_registry;
use classlint::filter::PatternSetMatcher;
use classlint::report::{
    CountingStage, FilterStage, PipelineBuilder, ReportFormat, SuppressionStage, ThresholdStage,
};
use classlint::{
    collect_suppressions, AnalysisEngine, Config, ConfigChooser, ExitStatus, ModelFinder,
    ProjectModel, RunCounters,
};

/// classlint - defect-pattern analysis for compiled class models
#[derive(Parser, Debug)]
#[command(name = "classlint")]
#[command(author, version, long_about = None)]
struct Cli {
    /// Path to a class-model file or a directory of model files
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drop defects ranked less severe than this (1 = most severe, 20 = report all)
    #[arg(long, value_name = "RANK")]
    rank: Option<u8>,

    /// Long report - include every annotation for each defect
    #[arg(long)]
    long: bool,

    /// Report only defects matching these pattern expressions
    #[arg(short, long)]
    include: Vec<String>,

    /// Drop defects matching these pattern expressions
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Detector ids to enable (a non-empty list runs only those)
    #[arg(long, value_name = "ID")]
    enable: Vec<String>,

    /// Detector ids to disable
    #[arg(long, value_name = "ID")]
    disable: Vec<String>,

    /// Encode the run outcome in the process exit code
    /// (bit 0 = defects found, bit 1 = missing dependency, bit 2 = error)
    #[arg(long)]
    set_exit_code: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completions
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("classlint v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    // Run analysis once
    let status = run_analysis(&config, &cli)?;

    if cli.set_exit_code && !status.is_clean() {
        std::process::exit(status.code());
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        let root = if cli.path.is_dir() {
            cli.path.clone()
        } else {
            cli.path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
        };
        Config::from_default_locations(&root)?
    };

    // Override with CLI arguments
    if let Some(rank) = cli.rank {
        config.rank_threshold = rank;
    }
    if cli.long {
        config.long_report = true;
    }
    if !cli.include.is_empty() {
        config.include.extend(cli.include.clone());
    }
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if !cli.enable.is_empty() {
        config.enable.extend(cli.enable.clone());
    }
    if !cli.disable.is_empty() {
        config.disable.extend(cli.disable.clone());
    }
    if cli.output.is_some() {
        config.output = cli.output.clone();
    }

    Ok(config)
}

fn run_analysis(config: &Config, cli: &Cli) -> Result<ExitStatus> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Instant;

    let start_time = Instant::now();

    // Step 1: Discover model files
    info!("Discovering model files...");
    let finder = ModelFinder::new();
    let files = finder.find_files(&cli.path)?;

    info!("Found {} model files", files.len());

    if files.is_empty() {
        println!("{}", "No class-model files found.".yellow());
        return Ok(ExitStatus::from_counts(0, 0, 0));
    }

    // Step 2: Load and merge the class models
    let progress = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .into_diagnostic()?,
        );
        pb.set_message(format!("Loading {} model files...", files.len()));
        pb
    };
    let model = ProjectModel::load_all(&files).into_diagnostic()?;
    progress.finish_and_clear();

    info!(
        "Loaded {} classes from {} files",
        model.classes.len(),
        files.len()
    );

    // Step 3: Assemble registry, chooser, and report pipeline
    let registry = builtin_registry();
    let mut chooser = ConfigChooser::new(&config.enable, &config.disable);
    let suppressions = collect_suppressions(&model).into_diagnostic()?;
    let counters = Arc::new(RunCounters::default());

    let writer: Box<dyn Write + Send> = match &config.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).into_diagnostic()?,
        )),
        None => Box::new(std::io::stdout()),
    };

    let mut builder = PipelineBuilder::new();
    if !config.include.is_empty() {
        let matcher = PatternSetMatcher::parse_all(&config.include).into_diagnostic()?;
        builder = builder.stage(FilterStage::include(matcher));
    }
    if !config.exclude.is_empty() {
        let matcher = PatternSetMatcher::parse_all(&config.exclude).into_diagnostic()?;
        builder = builder.stage(FilterStage::exclude(matcher));
    }
    let format = match cli.format {
        OutputFormat::Text => ReportFormat::Text,
        OutputFormat::Json => ReportFormat::Json,
    };
    let mut pipeline = builder
        .stage(SuppressionStage::new(suppressions))
        .stage(CountingStage::new(counters.clone()))
        .stage(
            ThresholdStage::new(writer, counters.clone())
                .with_rank_threshold(config.rank_threshold)
                .with_long_report(config.long_report)
                .with_format(format),
        )
        .build();

    // Step 4: Run the engine
    let engine = AnalysisEngine::new(&registry, &model);
    let status = engine
        .run(&mut chooser, &mut pipeline, &counters)
        .into_diagnostic()?;

    let elapsed = start_time.elapsed();
    if !cli.quiet {
        println!();
        if status.is_clean() {
            println!("{}", "✓ No defects found.".green());
        } else {
            println!("{}", format!("Run finished: {}", status.label()).yellow());
        }
        println!(
            "{}",
            format!(
                "{} defects, {} errors, {} missing dependencies ({:.2}s)",
                counters.delivered(),
                counters.errors(),
                counters.missing(),
                elapsed.as_secs_f64()
            )
            .dimmed()
        );
    }

    Ok(status)
}
