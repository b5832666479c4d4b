//! Developer CLI: inspect a TOML schema, or export a JSON document through it.

use clap::{Parser, Subcommand};
use docmodel::{Catalog, load_schema, obs, prelude::*};
use serde_json::{Value as JsonValue, json};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use thiserror::Error as ThisError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docmodel", version)]
#[command(about = "Inspect docmodel schemas and export documents through them")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the schema/document event counters to stderr when done
    #[arg(long, global = true)]
    events: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print every model with its keys, validation requests and index requests
    Inspect {
        /// TOML schema file
        schema: PathBuf,
    },
    /// Build a document from JSON and print its flattened mapping
    Export {
        /// TOML schema file
        schema: PathBuf,
        /// Model to build the document as
        model: String,
        /// JSON object holding the document's attributes
        document: PathBuf,
    },
}

///
/// CliError
///

#[derive(Debug, ThisError)]
enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Model(#[from] docmodel::Error),

    #[error("cannot render output: {0}")]
    Render(serde_json::Error),
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = run(cli.command);

    if cli.events
        && let Ok(report) = serde_json::to_string_pretty(&obs::event_report())
    {
        eprintln!("{report}");
    }

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

// RUST_LOG controls verbosity; warnings only by default
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(command: Command) -> Result<String, CliError> {
    let output = match command {
        Command::Inspect { schema } => {
            let catalog = read_catalog(&schema)?;
            inspect(&catalog)
        }
        Command::Export {
            schema,
            model,
            document,
        } => {
            let catalog = read_catalog(&schema)?;
            let model = catalog.require(&model)?;
            let json = read_json(&document)?;
            let doc = Document::from_json(model, json)?;

            serde_json::to_value(&doc).map_err(CliError::Render)?
        }
    };

    serde_json::to_string_pretty(&output).map_err(CliError::Render)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_catalog(path: &Path) -> Result<Catalog, CliError> {
    let catalog = load_schema(&read_file(path)?)?;
    debug!(path = %path.display(), models = catalog.len(), "loaded schema");

    Ok(catalog)
}

fn read_json(path: &Path) -> Result<JsonValue, CliError> {
    serde_json::from_str(&read_file(path)?).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn inspect(catalog: &Catalog) -> JsonValue {
    JsonValue::Array(catalog.iter().map(describe_model).collect())
}

fn describe_model(model: &Model) -> JsonValue {
    let keys: Vec<_> = model
        .keys()
        .iter()
        .map(|key| {
            json!({
                "name": key.name(),
                "type": key.ty().to_string(),
                "options": key.options(),
            })
        })
        .collect();

    let associations: Vec<_> = model
        .associations()
        .iter()
        .map(|assoc| {
            json!({
                "name": assoc.name(),
                "cardinality": assoc.cardinality(),
                "target": assoc.target().name(),
            })
        })
        .collect();

    json!({
        "name": model.name(),
        "kind": model.kind(),
        "parent": model.parent_model().map(|parent| parent.name().to_string()),
        "keys": keys,
        "associations": associations,
        "validations": model.validation_requests(),
        "indexes": model.index_requests(),
    })
}

///
/// TESTS
///
