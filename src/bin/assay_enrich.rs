use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use assay_enrich::app::{App, RunOptions};
use assay_enrich::checkpoint::CsvCheckpoint;
use assay_enrich::config::{ConfigLoader, ConfigOverrides};
use assay_enrich::error::EnrichError;
use assay_enrich::output::{ConsoleOutput, JsonOutput, OutputMode};
use assay_enrich::pubchem::PubChemHttpClient;

#[derive(Parser)]
#[command(name = "assay-enrich")]
#[command(about = "Enrich a SMILES table with PubChem bioassay metadata, resumably")]
#[command(version, author)]
struct Cli {
    /// Master CSV table to enrich
    input: Option<Utf8PathBuf>,

    /// JSON config file; CLI flags override its values
    #[arg(long)]
    config: Option<String>,

    /// Checkpoint CSV rewritten after each flush
    #[arg(long)]
    checkpoint: Option<Utf8PathBuf>,

    /// Deduplicated enriched-subset CSV
    #[arg(long)]
    enriched: Option<Utf8PathBuf>,

    /// Merged output CSV
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    /// Column holding the SMILES descriptors
    #[arg(long)]
    smiles_column: Option<String>,

    /// Rows with an empty value in this column form the working set
    #[arg(long)]
    label_column: Option<String>,

    /// Flush the checkpoint after every Nth processed descriptor
    #[arg(long)]
    flush_every: Option<usize>,

    /// Report the working set and pending count without any request
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(enrich) = report.downcast_ref::<EnrichError>() {
            return ExitCode::from(map_exit_code(enrich));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &EnrichError) -> u8 {
    match error {
        EnrichError::MissingInput(_)
        | EnrichError::MissingColumn(_)
        | EnrichError::ConfigRead(_)
        | EnrichError::ConfigParse(_) => 2,
        EnrichError::PubchemHttp(_)
        | EnrichError::PubchemStatus { .. }
        | EnrichError::PubchemParse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };

    let overrides = ConfigOverrides {
        input: cli.input,
        checkpoint: cli.checkpoint,
        enriched: cli.enriched,
        output: cli.output,
        smiles_column: cli.smiles_column,
        label_column: cli.label_column,
        flush_every: cli.flush_every,
    };
    let config = ConfigLoader::resolve(cli.config.as_deref(), overrides).into_diagnostic()?;

    let client = PubChemHttpClient::new().into_diagnostic()?;
    let checkpoint = CsvCheckpoint::new(config.checkpoint.clone());
    let app = App::new(client, checkpoint);
    let options = RunOptions {
        dry_run: cli.dry_run,
    };

    match output_mode {
        OutputMode::Json => {
            let result = app.run(&config, options, &JsonOutput).into_diagnostic()?;
            JsonOutput::print_run(&result).into_diagnostic()?;
        }
        OutputMode::Console => {
            let result = app.run(&config, options, &ConsoleOutput).into_diagnostic()?;
            ConsoleOutput::print_run(&result);
        }
    }
    Ok(())
}
