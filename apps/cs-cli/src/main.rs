use clap::{Parser, Subcommand, ValueEnum};
use cs_app::{
    AppResult, ExportFormat, RunOutcome, RunProgressEvent, RunStage, export, registry, run_service,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cs-cli")]
#[command(about = "cosim CLI - fixed-step co-simulation of connected systems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a run configuration
    Validate {
        /// Path to the run configuration (YAML or JSON)
        config_path: PathBuf,
    },
    /// Print the evaluation order and delayed connections
    Order {
        /// Path to the run configuration (YAML or JSON)
        config_path: PathBuf,
    },
    /// List model types available to run configurations
    Models,
    /// Run a simulation
    Run {
        /// Path to the run configuration (YAML or JSON)
        config_path: PathBuf,
        /// Write logged results to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format; guessed from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Order { config_path } => cmd_order(&config_path),
        Commands::Models => {
            cmd_models();
            Ok(())
        }
        Commands::Run {
            config_path,
            output,
            format,
        } => cmd_run(&config_path, output.as_deref(), format),
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = cs_project::load(config_path)?;
    cs_project::validate_config(&config)?;
    println!(
        "✓ Configuration is valid ({} systems, {} connections)",
        config.systems.len(),
        config.connections.len()
    );
    Ok(())
}

fn cmd_order(config_path: &Path) -> AppResult<()> {
    let config = cs_project::load(config_path)?;
    let report = run_service::evaluation_order(&config)?;

    println!("Evaluation order:");
    for (i, name) in report.systems.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }
    if report.delayed.is_empty() {
        println!("No delayed connections");
    } else {
        println!("Delayed connections (previous-step values):");
        for conn in &report.delayed {
            println!("  {}", conn);
        }
    }
    Ok(())
}

fn cmd_models() {
    println!("Model types:");
    for model in registry::MODEL_TYPES {
        println!("  {}", model.name());
    }
}

fn cmd_run(config_path: &Path, output: Option<&Path>, format: Option<FormatArg>) -> AppResult<()> {
    let config = cs_project::load(config_path)?;
    println!("Running simulation: {}", config.name);
    println!(
        "  step = {:.3e} s, stop = {:.3} s",
        config.step_size, config.stop_time
    );

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let on_event: &mut dyn FnMut(RunProgressEvent) = &mut |event| {
        let fraction = event
            .sim
            .as_ref()
            .map(|p| p.fraction_complete())
            .unwrap_or(-1.0);
        let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
            || last_emit.elapsed().as_millis() >= 100;
        if emit_now {
            render_cli_progress(&event);
            if fraction >= 0.0 {
                last_fraction = fraction;
            }
            last_emit = Instant::now();
        }
    };
    let outcome = run_service::run_config_with_progress(&config, Some(on_event))?;
    clear_progress_line();

    println!("✓ Simulation completed: {}", outcome.name);
    print_summary(&outcome);

    if let Some(path) = output {
        let format = format
            .map(ExportFormat::from)
            .unwrap_or_else(|| ExportFormat::from_path(path));
        debug!(path = %path.display(), ?format, "exporting results");
        export::write(path, &outcome.results, format)?;
        println!("  Results written to {}", path.display());
    }

    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    let results = &outcome.results;
    println!("  Ticks: {}", outcome.ticks);
    println!("  Logged rows: {}", results.len());
    println!("  Wall time: {:.3} s", outcome.wall_time_s);
    for column in results.columns() {
        let value = results
            .last(column)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        match results.unit(column) {
            Some(unit) => println!("  {} = {} {}", column, value, unit),
            None => println!("  {} = {}", column, value),
        }
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (event.stage, &event.sim) {
        (RunStage::Running, Some(p)) => {
            let width = 28usize;
            let fraction = p.fraction_complete();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            print!(
                "\r[{}{}] {:>6.2}%  t={:.3}/{:.3}s  tick={}/{}  elapsed={:.1}s",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled)),
                fraction * 100.0,
                p.time,
                p.stop_time,
                p.tick,
                p.total_ticks,
                event.elapsed_wall_s
            );
        }
        (stage, _) => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            print!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                stage_label(stage),
                event.elapsed_wall_s
            );
        }
    }
    let _ = io::stdout().flush();
}

fn stage_label(stage: RunStage) -> &'static str {
    match stage {
        RunStage::Building => "Building",
        RunStage::Initializing => "Initializing",
        RunStage::Running => "Running",
        RunStage::Completed => "Completed",
    }
}
