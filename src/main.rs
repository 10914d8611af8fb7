use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{load_pipeline, load_settings, OutputFormat, Settings};
use core_types::{has_column, to_text, Datasets};
use engine::Pipeline;
use polars::prelude::{DataFrame, DataType};
use ranking::top_funds;
use std::path::{Path, PathBuf};
use storage::{load_partitioned_dataset, read_table, write_table, StorageError};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the fund ranking pipeline.
fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; FUNDRANK_* may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.settings.as_deref()).context("Failed to load settings")?;
    if let Some(format) = cli.format {
        settings.output_format = format;
    }
    init_tracing(&settings)?;

    match cli.command {
        Commands::Features(args) => handle_features(args, &settings),
        Commands::Score(args) => handle_score(args, &settings),
        Commands::Rank(args) => handle_rank(args, &settings),
        Commands::Run(args) => handle_run(args, &settings),
        Commands::Top(args) => handle_top(args),
    }
}

fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .with_context(|| format!("Invalid log filter '{}'", settings.log_filter))?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Builds fund features from CVM disclosures, scores them and ranks funds
/// per investor profile.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults to an optional `fundrank.toml`.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Output format used for default output paths.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate partitioned datasets into a feature table.
    Features(DatasetArgs),
    /// Append score columns to a feature table.
    Score(TableArgs),
    /// Append weighted profile scores and ranks to a scored table.
    Rank(TableArgs),
    /// Run features, scores and ranks in one go.
    Run(DatasetArgs),
    /// Print the best-ranked funds of each profile in a ranked table.
    Top(TopArgs),
}

#[derive(Parser)]
struct DatasetArgs {
    /// Root of the partitioned datasets. Defaults to `data_dir`.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Pipeline YAML. Defaults to `pipeline_path`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output table (.parquet or .csv).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct TableArgs {
    /// Input table (.parquet or .csv).
    #[arg(long)]
    input: PathBuf,

    /// Pipeline YAML. Defaults to `pipeline_path`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output table (.parquet or .csv).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct TopArgs {
    /// A ranked table (.parquet or .csv).
    #[arg(long)]
    input: PathBuf,

    /// Profiles to show. Defaults to every `rank_*` column.
    #[arg(long)]
    profile: Vec<String>,

    /// Number of funds per profile.
    #[arg(short = 'n', long, default_value_t = 5)]
    limit: usize,

    /// Only consider rows holding the greatest value of this column, when
    /// the table has it.
    #[arg(long, default_value = "competencia")]
    latest_in: String,

    /// Consider every period instead of the latest one.
    #[arg(long)]
    all_periods: bool,

    /// Columns to print besides the profile's score and rank.
    /// Defaults to every text column.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_features(args: DatasetArgs, settings: &Settings) -> anyhow::Result<()> {
    let pipeline = open_pipeline(args.config.as_deref(), settings)?;
    let datasets = load_inputs(&pipeline, args.input_dir.as_deref().unwrap_or(&settings.data_dir))?;

    let features = pipeline.features(&datasets)?;
    save(&features, args.output, settings, "features")
}

fn handle_score(args: TableArgs, settings: &Settings) -> anyhow::Result<()> {
    let config_path = args.config.as_deref().unwrap_or(&settings.pipeline_path);
    let config = load_pipeline(config_path)
        .with_context(|| format!("Failed to load pipeline {}", config_path.display()))?;
    let table = read_table(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let scored = scoring::compute_scores_from_yaml(&table, &config)?;
    save(&scored, args.output, settings, "scored")
}

fn handle_rank(args: TableArgs, settings: &Settings) -> anyhow::Result<()> {
    let config_path = args.config.as_deref().unwrap_or(&settings.pipeline_path);
    let config = load_pipeline(config_path)
        .with_context(|| format!("Failed to load pipeline {}", config_path.display()))?;
    let table = read_table(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let ranked = ranking::compute_profile_scores_from_yaml(&table, &config)?;
    save(&ranked, args.output, settings, "ranked")
}

fn handle_run(args: DatasetArgs, settings: &Settings) -> anyhow::Result<()> {
    let pipeline = open_pipeline(args.config.as_deref(), settings)?;
    let datasets = load_inputs(&pipeline, args.input_dir.as_deref().unwrap_or(&settings.data_dir))?;

    let output = pipeline.run(&datasets)?;
    save(&output.ranked, args.output, settings, "ranked")
}

fn handle_top(args: TopArgs) -> anyhow::Result<()> {
    let table = read_table(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let profiles: Vec<String> = if args.profile.is_empty() {
        table
            .get_column_names()
            .into_iter()
            .filter_map(|name| name.strip_prefix("rank_"))
            .map(str::to_string)
            .collect()
    } else {
        args.profile
    };
    if profiles.is_empty() {
        anyhow::bail!("{} has no rank_* columns", args.input.display());
    }

    let base: Vec<String> = if args.columns.is_empty() {
        table
            .get_columns()
            .iter()
            .filter(|series| series.dtype() == &DataType::String)
            .map(|series| series.name().to_string())
            .collect()
    } else {
        args.columns
    };
    let latest_in = (!args.all_periods && has_column(&table, &args.latest_in))
        .then_some(args.latest_in.as_str());

    for profile in &profiles {
        let top = top_funds(&table, profile, args.limit, latest_in)?;
        let mut shown = base.clone();
        shown.push(format!("score_{profile}"));
        shown.push(format!("rank_{profile}"));

        println!("\n=== TOP {} - {} ===", args.limit, profile.to_uppercase());
        println!("{}", render(&top, &shown)?);
    }
    Ok(())
}

fn render(table: &DataFrame, columns: &[String]) -> anyhow::Result<comfy_table::Table> {
    let selected = columns
        .iter()
        .map(|name| Ok(to_text(table.column(name)?)?))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut out = comfy_table::Table::new();
    out.set_header(columns.to_vec());
    for row in 0..table.height() {
        out.add_row(
            selected
                .iter()
                .map(|column| column.get(row).unwrap_or_default().to_string())
                .collect::<Vec<_>>(),
        );
    }
    Ok(out)
}

fn open_pipeline(config: Option<&Path>, settings: &Settings) -> anyhow::Result<Pipeline> {
    let path = config.unwrap_or(&settings.pipeline_path);
    Pipeline::from_path(path).with_context(|| format!("Invalid pipeline {}", path.display()))
}

/// Loads every dataset the pipeline reads. A dataset without a directory is
/// skipped, like any dataset absent from the input.
fn load_inputs(pipeline: &Pipeline, input_dir: &Path) -> anyhow::Result<Datasets> {
    let mut datasets = Datasets::new();
    for name in pipeline.dataset_names() {
        match load_partitioned_dataset(input_dir, name) {
            Ok(table) => {
                datasets.insert(name.to_string(), table);
            }
            Err(StorageError::DatasetNotFound(path)) => {
                tracing::warn!(dataset = %name, path = %path.display(), "Dataset directory not found; skipping");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to load dataset '{name}'"));
            }
        }
    }
    Ok(datasets)
}

fn save(table: &DataFrame, output: Option<PathBuf>, settings: &Settings, stem: &str) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(|| settings.output_path(stem));
    write_table(table, &path).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} rows x {} columns to {}", table.height(), table.width(), path.display());
    Ok(())
}
