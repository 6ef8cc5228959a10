//! beneficios - PBF/BPC disbursement browser
//!
//! A CLI that browses Brazilian social-benefit payroll datasets by state and
//! municipality, and shows a home summary from the Portal da Transparência.
//!
//! Exit codes:
//!   0 - Success (including the normal "no records found" outcomes)
//!   1 - Runtime error (missing catalog, remote API failure, config error)

mod analysis;
mod catalog;
mod cli;
mod config;
mod dataset;
mod models;
mod report;
mod transparency;

use anyhow::{Context, Result};
use catalog::{CatalogError, CatalogSource};
use cli::{Args, OutputFormat};
use config::Config;
use dataset::DatasetLoader;
use models::{BenefitProgram, Dataset, Municipality};
use report::CurrencyFormat;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use transparency::{FetchError, TransparencyClient, MONTH_WINDOW};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("beneficios v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .beneficios.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".beneficios.toml");

    if path.exists() {
        eprintln!("⚠️  .beneficios.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .beneficios.toml")?;

    println!("✅ Created .beneficios.toml with default settings.");
    println!("   Edit it to point at your dataset directory and catalog file.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the selected workflow. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.home {
        return run_home(&args, &config).await;
    }

    let catalog = catalog_source(&config);
    debug!("Catalog source: {:?}", catalog);

    match (&args.state, &args.municipality, &args.code) {
        (Some(state), None, None) => list_municipalities(&args, &catalog, state),
        (Some(state), municipality, code) => {
            browse(&args, &config, &catalog, state, municipality.as_deref(), code.as_deref())
        }
        (None, _, Some(code)) => {
            // Code addressing needs no catalog lookup at all.
            summarize_dataset(&args, load_dataset_by_code(&config, code)?, code)
        }
        (None, _, None) => list_states(&args, &catalog),
    }
}

/// Pick the catalog variant: JSON index when configured, directory tree otherwise.
fn catalog_source(config: &Config) -> CatalogSource {
    match &config.catalog.municipalities_file {
        Some(file) => CatalogSource::Json(PathBuf::from(file)),
        None => CatalogSource::Directory(PathBuf::from(&config.catalog.data_dir)),
    }
}

fn list_states(args: &Args, catalog: &CatalogSource) -> Result<i32> {
    let states = match catalog.list_states() {
        Ok(states) => states,
        Err(CatalogError::Unavailable(path)) => {
            println!("📂 No catalog found at {}.", path.display());
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    if states.is_empty() {
        println!("No states found in the catalog.");
        return Ok(0);
    }

    match args.format {
        OutputFormat::Text => println!("{}", report::generator::render_states(&states)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "states": states }))?
        ),
    }
    Ok(0)
}

fn list_municipalities(args: &Args, catalog: &CatalogSource, state: &str) -> Result<i32> {
    let municipalities = match catalog.list_municipalities(state) {
        Ok(municipalities) => municipalities,
        Err(CatalogError::Unavailable(path)) => {
            println!("📂 No data found for state {} ({}).", state, path.display());
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    if municipalities.is_empty() {
        println!("No municipalities found for state {}.", state);
        return Ok(0);
    }

    match args.format {
        OutputFormat::Text => println!(
            "{}",
            report::generator::render_municipalities(state, &municipalities)
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "state": state,
                "municipalities": municipalities,
            }))?
        ),
    }
    Ok(0)
}

/// Resolve a municipality, load its dataset, and print the summary.
fn browse(
    args: &Args,
    config: &Config,
    catalog: &CatalogSource,
    state: &str,
    municipality: Option<&str>,
    code: Option<&str>,
) -> Result<i32> {
    // Direct code addressing skips name resolution entirely.
    if let Some(code) = code {
        return summarize_dataset(args, load_dataset_by_code(config, code)?, code);
    }

    let name = municipality.expect("validated: municipality or code present");

    let municipalities = match catalog.list_municipalities(state) {
        Ok(municipalities) => municipalities,
        Err(CatalogError::Unavailable(path)) => {
            println!("📂 No data found for state {} ({}).", state, path.display());
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    let resolved = match catalog::resolve_code(name, &municipalities) {
        Some(municipality) => municipality,
        None => {
            println!("Municipality not found: {} ({})", name, state);
            return Ok(1);
        }
    };

    let dataset = load_dataset(config, state, resolved)?;
    summarize_dataset(args, dataset, &resolved.name)
}

/// Load through whichever addressing scheme the resolved entry supports.
fn load_dataset(
    config: &Config,
    state: &str,
    municipality: &Municipality,
) -> Result<Option<Dataset>> {
    let loader = DatasetLoader::new(PathBuf::from(&config.catalog.data_dir));
    let dataset = match &municipality.ibge_code {
        Some(code) => loader.load_by_code(code)?,
        None => loader.load_by_name(state, &municipality.name)?,
    };
    Ok(dataset)
}

fn load_dataset_by_code(config: &Config, code: &str) -> Result<Option<Dataset>> {
    let loader = DatasetLoader::new(PathBuf::from(&config.catalog.data_dir));
    Ok(loader.load_by_code(code)?)
}

/// Aggregate and print one loaded dataset, or the "no records" message.
fn summarize_dataset(args: &Args, dataset: Option<Dataset>, label: &str) -> Result<i32> {
    let dataset = match dataset {
        Some(dataset) => dataset,
        None => {
            // Absent file is a normal outcome, not a failure.
            println!("No beneficiaries found for {}.", label);
            return Ok(0);
        }
    };

    let summary = analysis::summarize(&dataset);
    info!(
        "Summarized {} records from schema {}",
        summary.total_count, dataset.schema
    );

    match args.format {
        OutputFormat::Text => {
            let currency = CurrencyFormat::default();
            println!(
                "{}",
                report::generator::render_summary(&dataset, &summary, &currency)
            );
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "municipality": dataset.municipality,
                "schema": dataset.schema,
                "summary": summary,
            }))?
        ),
    }
    Ok(0)
}

/// Home summary: PBF and BPC metrics for one municipality from the API.
async fn run_home(args: &Args, config: &Config) -> Result<i32> {
    let code = args
        .code
        .clone()
        .unwrap_or_else(|| config.api.default_ibge_code.clone());

    let client = match TransparencyClient::new(
        &config.api.base_url,
        config.api_key(),
        Duration::from_secs(config.api.timeout_seconds),
    ) {
        Ok(client) => client,
        Err(FetchError::MissingApiKey) => {
            println!("⚠️  External summary unavailable: no API key configured (set API_KEY).");
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let currency = CurrencyFormat::default();
    let mut failed = false;

    for program in [
        BenefitProgram::FamilyAllowance,
        BenefitProgram::ContinuousPayment,
    ] {
        let result = match program {
            BenefitProgram::FamilyAllowance => client.fetch_family_benefit(&code).await,
            BenefitProgram::ContinuousPayment => client.fetch_continuous_benefit(&code).await,
        };

        match result {
            Ok(Some(record)) => match args.format {
                OutputFormat::Text => println!(
                    "{}\n",
                    report::generator::render_external(program, &record, &currency)
                ),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "program": program,
                        "summary": record,
                    }))?
                ),
            },
            Ok(None) => println!(
                "No {} data found for municipality {} in the last {} months.\n",
                program, code, MONTH_WINDOW
            ),
            Err(e) => {
                // Surface the raw failure and keep going with the other program.
                warn!("{} query failed: {}", program, e);
                eprintln!("❌ {} summary failed: {:#}", program, anyhow::Error::from(e));
                failed = true;
            }
        }
    }

    Ok(if failed { 1 } else { 0 })
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .beneficios.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
