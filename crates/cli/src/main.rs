use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::boundary::{self, ErrorResponse, SearchParams, SearchResponse};
use medsearch_core::config::{self, AppConfig};
use medsearch_core::pipeline::{self, SearchService};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status for rejected input.
const EXIT_INVALID: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Seed { file, json } => run_seed(cfg, file, json).await,
        Commands::Search {
            query,
            classifier,
            category,
            top_k,
            json,
        } => {
            let params = SearchParams {
                query,
                classifier_type: classifier,
                category,
                top_k,
            };
            run_search(cfg, params, json).await
        }
        Commands::Classifiers { json } => run_classifiers(cfg, json).await,
        Commands::Categories { classifier, json } => {
            run_categories(cfg, classifier.as_deref(), json).await
        }
    }
}

#[derive(Parser)]
#[command(name = "medsearch")]
#[command(about = "Semantic search over medical classification codes", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a corpus into the database and embed it
    Seed {
        /// JSON corpus file; defaults to the built-in ICD-10 sample
        #[arg(long)]
        file: Option<PathBuf>,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Rank codes by semantic similarity to a query
    Search {
        /// Free-text query
        query: Option<String>,
        /// Restrict to one classifier type, e.g. ICD-10
        #[arg(long)]
        classifier: Option<String>,
        /// Exact category filter; "All" means no filter
        #[arg(long)]
        category: Option<String>,
        /// Number of results (defaults to search.default_top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List classifier types in the corpus
    Classifiers {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List categories, optionally within one classifier type
    Categories {
        #[arg(long)]
        classifier: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_seed(mut cfg: AppConfig, file: Option<PathBuf>, json: bool) -> Result<()> {
    let pool = storage::connect(&cfg.database.path).await?;
    storage::migrate(&pool).await?;
    let corpus = file.or_else(|| cfg.seed.corpus.as_ref().map(PathBuf::from));
    let seeded = pipeline::seed_from(&pool, corpus.as_deref()).await?;
    pool.close().await;

    cfg.seed.seed_on_startup = false;
    let (_, prepared) = SearchService::start(cfg).await?;
    if json {
        let summary = serde_json::json!({
            "status": "ok",
            "seeded": seeded,
            "embedded": prepared.embedded,
            "entries": prepared.entries,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "seed: inserted {}, updated {}, unchanged {}, skipped {}; embedded {}, corpus {} entries",
            seeded.inserted,
            seeded.updated,
            seeded.unchanged,
            seeded.skipped,
            prepared.embedded,
            prepared.entries
        );
    }
    Ok(())
}

async fn run_search(cfg: AppConfig, params: SearchParams, json: bool) -> Result<()> {
    let request = match boundary::build_request(params, &cfg.search) {
        Ok(request) => request,
        Err(err) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&err))?);
            } else {
                eprintln!("error: {err}");
            }
            std::process::exit(EXIT_INVALID);
        }
    };
    info!(
        query = request.query(),
        classifier = ?request.classifier_type(),
        category = ?request.category(),
        "processing search request"
    );

    let (service, _) = SearchService::start(cfg).await?;
    let outcome = service.pipeline().search(&request).await;
    let response = SearchResponse::from(outcome);
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", boundary::render_results(&response.results));
        if let Some(err) = &response.error {
            eprintln!("warning: {err}");
        }
    }
    Ok(())
}

async fn run_classifiers(cfg: AppConfig, json: bool) -> Result<()> {
    let (service, _) = SearchService::start(cfg).await?;
    let classifiers = service.pipeline().list_classifier_types()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&classifiers)?);
    } else {
        for c in classifiers {
            println!("{c}");
        }
    }
    Ok(())
}

async fn run_categories(cfg: AppConfig, classifier: Option<&str>, json: bool) -> Result<()> {
    let (service, _) = SearchService::start(cfg).await?;
    let categories = service.pipeline().list_categories(classifier)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
    } else {
        for c in categories {
            println!("{c}");
        }
    }
    Ok(())
}
