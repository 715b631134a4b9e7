//! Sensor Query CLI
//!
//! Windowed sensor-log queries merged into survey tables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sensor_query_merge::{
    config::{AlignConfig, Config, MergeConfig},
    pipeline::{run_align, run_merge},
    report::RunLog,
    source::{locate, DeviceId, Modality, Tolerance},
    timestamp::parse_epoch_millis,
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sensor-query")]
#[command(version = VERSION)]
#[command(about = "Windowed sensor-log queries merged into survey tables", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append windowed sensor aggregates to a survey table
    Merge {
        /// Directory holding the Afdx and Leda log directories
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Survey table to augment
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output path for the augmented table
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Column holding participant labels
        #[arg(long)]
        id_column: Option<String>,

        /// Screen timestamp columns (comma separated)
        #[arg(long, value_delimiter = ',')]
        windows: Vec<String>,

        /// Sensor variables (comma separated)
        #[arg(long, value_delimiter = ',')]
        variables: Vec<String>,

        /// Aggregate functions: mean, std, min, max, median, sum (comma separated)
        #[arg(long, value_delimiter = ',')]
        functions: Vec<String>,

        /// Window length after each screen timestamp, in seconds
        #[arg(long)]
        window_secs: Option<f64>,

        /// Write run statistics as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Align device logs around stimulus events on a 5 Hz grid
    Align {
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Event table: device number, stimulus timestamp
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Sensor modality (afdx or leda)
        #[arg(long)]
        modality: Option<Modality>,

        /// Sensor variable to align
        #[arg(long)]
        variable: Option<String>,

        /// Aggregate across devices
        #[arg(long)]
        function: Option<String>,

        /// Seconds kept on each side of the stimulus
        #[arg(long)]
        span_secs: Option<f64>,

        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show which sensor file a query would use
    Locate {
        #[arg(long, default_value = ".")]
        data_root: PathBuf,

        /// Sensor modality (afdx or leda)
        #[arg(long)]
        modality: Modality,

        /// Device number or participant label
        #[arg(long)]
        device: String,

        /// Target timestamp (epoch ms or ISO-8601 UTC)
        #[arg(long)]
        timestamp: String,

        /// Tolerance policy
        #[arg(long, value_enum, default_value = "merge")]
        policy: Policy,
    },

    /// Show configuration
    Config {
        /// Write the shown configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Within 30 minutes either side
    Merge,
    /// Starting at most 10 minutes after
    Resample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.config.as_deref() {
        // `config --init` may create a file that does not exist yet
        Some(path) if !path.exists() && matches!(cli.command, Commands::Config { init: true }) => {
            Config::default()
        }
        path => Config::load(path).context("Failed to load configuration")?,
    };

    match cli.command {
        Commands::Merge {
            data_root,
            input,
            output,
            id_column,
            windows,
            variables,
            functions,
            window_secs,
            report,
        } => {
            let mut merge = config.merge;
            override_opt(&mut merge.data_root, data_root);
            override_opt(&mut merge.input_table, input);
            override_opt(&mut merge.output_path, output);
            override_opt(&mut merge.id_column, id_column);
            override_vec(&mut merge.window_columns, windows);
            override_vec(&mut merge.variables, variables);
            override_vec(&mut merge.functions, functions);
            override_opt(&mut merge.window_secs, window_secs);
            cmd_merge(&merge, report.as_deref())
        }
        Commands::Align {
            data_root,
            input,
            output,
            modality,
            variable,
            function,
            span_secs,
            report,
        } => {
            let mut align = config.align;
            override_opt(&mut align.data_root, data_root);
            override_opt(&mut align.input_table, input);
            override_opt(&mut align.output_path, output);
            override_opt(&mut align.modality, modality);
            override_opt(&mut align.variable, variable);
            override_opt(&mut align.function, function);
            override_opt(&mut align.span_secs, span_secs);
            cmd_align(&align, report.as_deref())
        }
        Commands::Locate {
            data_root,
            modality,
            device,
            timestamp,
            policy,
        } => cmd_locate(&data_root, modality, &device, &timestamp, policy),
        Commands::Config { init } => cmd_config(&config, cli.config.as_deref(), init),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn override_opt<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn override_vec(field: &mut Vec<String>, values: Vec<String>) {
    if !values.is_empty() {
        *field = values;
    }
}

fn cmd_merge(config: &MergeConfig, report: Option<&Path>) -> Result<()> {
    println!("Sensor Query v{VERSION}");
    println!("  Input: {}", config.input_table.display());
    println!("  Windows: {}", config.window_columns.join(", "));
    println!("  Variables: {}", config.variables.join(", "));
    println!("  Functions: {}", config.functions.join(", "));
    println!("  Window length: {}s", config.window_secs);
    println!();

    let log = RunLog::new();
    let table = run_merge(config, &log).context("Merge failed")?;

    println!(
        "Wrote {} rows to {}",
        table.rows.len(),
        config.output_path.display()
    );
    finish(&log, report)
}

fn cmd_align(config: &AlignConfig, report: Option<&Path>) -> Result<()> {
    println!("Sensor Query v{VERSION}");
    println!("  Events: {}", config.input_table.display());
    println!("  Modality: {}", config.modality);
    println!("  Variable: {}", config.variable);
    println!("  Span: ±{}s", config.span_secs);
    println!();

    let log = RunLog::new();
    let aligned = run_align(config, &log).context("Align failed")?;

    println!(
        "Aligned {} devices over {} offsets into {}",
        aligned.devices.len(),
        aligned.offsets.len(),
        config.output_path.display()
    );
    finish(&log, report)
}

fn finish(log: &RunLog, report: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", log.summary());

    if let Some(path) = report {
        log.save(path)
            .with_context(|| format!("Could not write report to {}", path.display()))?;
        println!("Saved run report to {}", path.display());
    }
    Ok(())
}

fn cmd_locate(
    data_root: &Path,
    modality: Modality,
    device: &str,
    timestamp: &str,
    policy: Policy,
) -> Result<()> {
    let device = DeviceId::from_label(device)?;
    let target_ms = parse_epoch_millis(timestamp)?;
    let tolerance = match policy {
        Policy::Merge => Tolerance::MERGE,
        Policy::Resample => Tolerance::RESAMPLE,
    };

    match locate(data_root, modality, &device, target_ms, tolerance)? {
        Some(file) => {
            println!("{}", file.path.display());
            println!(
                "  device {} started {} ({:+.1} s from target)",
                file.device,
                file.start_ms,
                (file.start_ms - target_ms) as f64 / 1000.0
            );
        }
        None => {
            println!("No {modality} file for device {device} matches {target_ms}");
        }
    }
    Ok(())
}

fn cmd_config(config: &Config, path: Option<&Path>, init: bool) -> Result<()> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(Config::config_path);

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {}", config_path.display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);

    if init {
        config.save(&config_path)?;
        println!();
        println!("Saved configuration to {}", config_path.display());
    }
    Ok(())
}
