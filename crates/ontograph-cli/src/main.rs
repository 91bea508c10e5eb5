//! Ontograph CLI
//!
//! - `run`: execute a request document against the configured store
//! - `describe`: print the registry's definition of a type as JSON
//!
//! The ontology comes from the store itself unless `--ontology` names a
//! JSON ontology file.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use ontograph_engine::{Engine, EngineConfig, Executor, Operation};
use ontograph_schema::{InMemoryOntology, SparqlGateway, TypeRegistry};
use ontograph_sparql::{HttpStoreClient, StoreClient};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

mod describe;

#[derive(Parser)]
#[command(name = "ontograph")]
#[command(
    author,
    version,
    about = "Ontograph: an ontology-driven query and mutation API over a triple store"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Sources {
    /// Engine config (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ontology file (JSON) used instead of the store's own class metadata
    #[arg(long)]
    ontology: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a request document and print the response document.
    Run {
        #[command(flatten)]
        sources: Sources,

        /// Request document: `{"kind": "query"|"mutation", "selections": [...]}`
        request: PathBuf,
    },

    /// Print the registry's definition of a type (`Query`, `Mutation`, a
    /// class, a datatype wrapper or a `<property>Union`).
    Describe {
        #[command(flatten)]
        sources: Sources,

        type_name: String,

        /// For classes, also print every reachable argument shape
        #[arg(long)]
        shapes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { sources, request } => cmd_run(&sources, &request),
        Commands::Describe {
            sources,
            type_name,
            shapes,
        } => cmd_describe(&sources, &type_name, shapes),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_run(sources: &Sources, request: &Path) -> Result<()> {
    let text = fs::read_to_string(request)
        .with_context(|| format!("failed to read request {}", request.display()))?;
    let operation = Operation::from_json(&text)
        .with_context(|| format!("invalid request document {}", request.display()))?;

    let engine = build_engine(sources)?;
    let response = Executor::new(&engine).run(&operation);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.get("errors").is_some() {
        return Err(anyhow!("request {} failed", request.display()));
    }
    eprintln!("{} {:?} executed", "ok".green().bold(), operation.kind);
    Ok(())
}

fn cmd_describe(sources: &Sources, type_name: &str, shapes: bool) -> Result<()> {
    let engine = build_engine(sources)?;
    let definition = describe::describe(engine.registry(), type_name, shapes)?;
    println!("{}", serde_json::to_string_pretty(&definition)?);
    Ok(())
}

// ============================================================================
// Setup
// ============================================================================

fn load_config(sources: &Sources) -> Result<EngineConfig> {
    match &sources.config {
        Some(path) => Ok(EngineConfig::from_json_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn build_engine(sources: &Sources) -> Result<Engine> {
    let config = load_config(sources)?;
    let store: Arc<dyn StoreClient> = Arc::new(HttpStoreClient::new(
        config.store.query_endpoint.clone(),
        config.store.update_endpoint.clone(),
        config.namespaces.clone(),
        config.store.timeout_secs,
    )?);

    let registry = match &sources.ontology {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read ontology {}", path.display()))?;
            let ontology = InMemoryOntology::from_json(&text)
                .with_context(|| format!("invalid ontology {}", path.display()))?;
            tracing::info!(
                classes = ontology.classes.len(),
                properties = ontology.properties.len(),
                "loaded ontology file"
            );
            TypeRegistry::new(ontology)
        }
        None => TypeRegistry::new(SparqlGateway::new(
            store.clone(),
            config.namespaces.clone(),
            config.pending_address.clone(),
        )),
    };

    Ok(Engine::new(
        Arc::new(registry.with_max_depth(config.max_depth)),
        store,
    ))
}
