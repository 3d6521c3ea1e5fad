//! `belgraph` — BEL semantic engine command-line interface.
//!
//! Provides three subcommands:
//!
//! - **`process`** — read a nanopub file and materialize node/edge documents
//!   into a JSON Lines staging file.
//! - **`validate`** — parse and semantically validate BEL statements from a
//!   file or stdin, one per line.
//! - **`functions`** — print the signature help for one function, or list
//!   every function of a BEL version.
//!
//! Configuration comes from `BELGRAPH_*` environment variables; see
//! `belgraph_pipeline::config::PipelineConfig`. Without `BELGRAPH_API` the
//! pipeline runs offline and namespace terms pass through unresolved.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use belgraph::engine::AssertionParser;
use belgraph::spec::SpecCatalog;
use belgraph::validate::validate_statement;
use clap::{Parser, Subcommand};

use belgraph_pipeline::{
    JsonlSink, PipelineConfig, Processor, ReferenceParser, RetryPolicy, TermApiClient,
};

/// belgraph — BEL nanopub processing CLI
///
/// Turn BEL nanopubs into canonical, content-addressed graph documents.
#[derive(Parser)]
#[command(name = "belgraph", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a nanopub file into node/edge documents.
    ///
    /// Reads `.json` (array) or `.jsonl` (one document per line) nanopub
    /// files and writes `{"collection": …, "document": …}` lines ready for a
    /// bulk loader.
    Process {
        /// Path to the nanopub file.
        input: PathBuf,

        /// Path of the JSON Lines output file.
        #[arg(short, long, default_value = "edges.jsonl")]
        output: PathBuf,

        /// Computed-edge rules to apply (repeatable). Absent applies all
        /// rules; `skip` disables inference.
        #[arg(long = "rule", value_name = "NAME")]
        rules: Vec<String>,

        /// Species to orthologize into, e.g. TAX:10090.
        #[arg(long, value_name = "TAXON")]
        orthologize: Option<String>,
    },

    /// Parse and validate BEL statements, one per line.
    ///
    /// Reads from FILE, or stdin when FILE is `-`. Exits 0 if every
    /// statement is valid, 1 otherwise.
    Validate {
        /// Path to a statement file, or `-` for stdin.
        file: PathBuf,

        /// BEL version to validate against.
        #[arg(long, env = "BELGRAPH_BEL_VERSION", default_value = "2.0.0")]
        bel_version: String,
    },

    /// Show function signature help.
    ///
    /// With NAME, prints each signature's argument summary and per-argument
    /// help; without, lists every function of the version.
    Functions {
        /// Function name, long or short form (e.g. `p` or `proteinAbundance`).
        name: Option<String>,

        /// BEL version to describe.
        #[arg(long, env = "BELGRAPH_BEL_VERSION", default_value = "2.0.0")]
        bel_version: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "belgraph=info,belgraph_pipeline=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let exit = match cli.command {
        Command::Process {
            input,
            output,
            rules,
            orthologize,
        } => process_command(input, output, rules, orthologize).await,
        Command::Validate { file, bel_version } => validate_command(file, &bel_version),
        Command::Functions { name, bel_version } => functions_command(name, &bel_version),
    };
    process::exit(exit);
}

async fn process_command(
    input: PathBuf,
    output: PathBuf,
    rules: Vec<String>,
    orthologize: Option<String>,
) -> i32 {
    let config = PipelineConfig::from_env();

    let source = match belgraph_pipeline::read_nanopubs(&input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let sink = match JsonlSink::create(&output).await {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            eprintln!("error: could not create {}: {e}", output.display());
            return 1;
        }
    };

    let client = config.api_base.as_ref().map(|base| {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build HTTP client for the term store");
        Arc::new(TermApiClient::new(
            http,
            base,
            RetryPolicy {
                attempts: config.retry_attempts,
                ..Default::default()
            },
            config.concurrency * 4,
        ))
    });
    if client.is_none() {
        tracing::info!("no BELGRAPH_API configured; running offline (terms pass through)");
    }

    let processor = Processor {
        catalog: Arc::new(SpecCatalog::builtin()),
        parser: ReferenceParser::new(),
        client,
        sink: Arc::clone(&sink) as Arc<dyn belgraph_pipeline::GraphSink>,
        options: belgraph::engine::EdgeOptions {
            namespace_targets: config.namespace_targets.clone(),
            rule_filter: rules,
            orthologize_target: orthologize,
        },
        concurrency: config.concurrency,
    };

    let summary = processor.run(source).await;
    if let Err(e) = sink.flush().await {
        eprintln!("error: flushing {} failed: {e}", output.display());
        return 1;
    }

    println!(
        "{} nanopubs ({} failed), {} edges, {} documents -> {}",
        summary.nanopubs,
        summary.failed,
        summary.edges,
        summary.documents,
        output.display()
    );
    i32::from(summary.failed > 0)
}

fn validate_command(file: PathBuf, bel_version: &str) -> i32 {
    let catalog = SpecCatalog::builtin();
    let spec = match catalog.get(bel_version) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let contents = match read_input(&file) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", file.display());
            return 1;
        }
    };

    let mut failures = 0usize;
    let mut checked = 0usize;
    for (line_no, line) in contents.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        checked += 1;
        let result = ReferenceParser
            .parse(text, spec)
            .map_err(|e| e.to_string())
            .and_then(|statement| {
                validate_statement(&statement, spec).map_err(|e| e.to_string())
            });
        if let Err(message) = result {
            failures += 1;
            eprintln!("line {}: {message}", line_no + 1);
        }
    }

    println!("{} statements checked, {} invalid", checked, failures);
    i32::from(failures > 0)
}

fn functions_command(name: Option<String>, bel_version: &str) -> i32 {
    let catalog = SpecCatalog::builtin();
    let spec = match catalog.get(bel_version) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    match name {
        Some(name) => {
            let help = spec.function_help(&name);
            if help.is_empty() {
                eprintln!("error: unknown function {name:?}");
                return 1;
            }
            for entry in help {
                println!("{}", entry.summary);
                println!("  {}", entry.description);
                for line in entry.argument_help {
                    println!("  - {line}");
                }
            }
            0
        }
        None => {
            println!("primary functions:");
            for long in spec.primary_functions() {
                let short = spec.functions().to_short(long).unwrap_or(long);
                println!("  {long} ({short})");
            }
            println!("modifier functions:");
            for long in spec.modifier_functions() {
                let short = spec.functions().to_short(long).unwrap_or(long);
                println!("  {long} ({short})");
            }
            0
        }
    }
}

fn read_input(path: &PathBuf) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
    }
}
