use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use address_to_utm::apis::{GoogleGeocoder, RequestBuilder};
use address_to_utm::config::Config;
use address_to_utm::output::OutputWriter;
use address_to_utm::rate_limiter::{Pacer, ThreadSleeper};
use address_to_utm::storage::{RecordStore, ShortRowPolicy};
use address_to_utm::{logging, metrics, GeoError, Pipeline, PipelineSummary};

#[derive(Parser)]
#[command(name = "address_to_utm")]
#[command(about = "Geocode a ';'-delimited address list and append UTM coordinates")]
#[command(version)]
struct Cli {
    /// Google Maps Geocoding API key
    api_key: String,

    /// Input file: ADDRESS;COUNTRY[;UTM_ZONE][;other columns...]
    input_file: PathBuf,

    /// Output file: input columns plus UTM_EAST;UTM_NORTH;UTM_ZONE
    output_file: PathBuf,

    /// TOML configuration file (defaults to ./address_to_utm.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-request transport timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pad rows that have fewer fields than the header instead of failing
    #[arg(long)]
    pad_short_rows: bool,

    /// Directory for JSON log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(secs) = cli.timeout_secs {
        config.geocoder.timeout_seconds = secs;
    }
    if cli.pad_short_rows {
        config.input.short_rows = ShortRowPolicy::Pad;
    }
    if cli.log_dir.is_some() {
        config.logging.directory = cli.log_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> anyhow::Result<PipelineSummary> {
    // Read everything first so input errors surface before any request
    let store = RecordStore::open(&cli.input_file, config.input.short_rows)?;
    info!(
        "Loaded {} records from {}",
        store.len(),
        cli.input_file.display()
    );

    let file = File::create(&cli.output_file)
        .with_context(|| format!("creating {}", cli.output_file.display()))?;
    let mut output = OutputWriter::new(BufWriter::new(file), store.header())?;

    let request_builder = RequestBuilder::new(&config.geocoder.endpoint, &cli.api_key);
    let geocoder = GoogleGeocoder::new(&config.geocoder)?;
    let pacer = Pacer::from_config(&config.pacing, ThreadSleeper);

    let mut pipeline = Pipeline::new(request_builder, geocoder, pacer);
    let summary = pipeline.run(&store, &mut output)?;
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init_logging(config.logging.directory.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(addr) = config.metrics.listen_addr {
        metrics::init_metrics(addr);
    }

    match run(&cli, &config) {
        Ok(summary) => {
            println!(
                "{} of {} records written to {} ({} skipped)",
                summary.rows_written,
                summary.total_records,
                cli.output_file.display(),
                summary.skipped
            );
            if let Some(ordinal) = summary.halted_at {
                println!("Query limit reached at record {ordinal}; remaining records were not processed");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<GeoError>() {
                Some(geo) if geo.is_input_error() => error!("Invalid input: {}", geo),
                _ => error!("Run failed: {:#}", e),
            }
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
