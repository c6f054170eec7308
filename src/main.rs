use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex as TokioMutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tfsarag::agent::TfsaAgent;
use tfsarag::api::{self, AppState};
use tfsarag::ask::{AskOutcome, AskPipeline};
use tfsarag::config::Config;
use tfsarag::db::Db;
use tfsarag::embedder::Embedder;
use tfsarag::embedder::gemini::GeminiEmbedder;
use tfsarag::index::VectorStore;
use tfsarag::ingest::Ingestor;
use tfsarag::llm::gemini::GeminiGenerator;
use tfsarag::retriever::Retriever;

#[derive(Parser)]
#[command(name = "tfsarag", version, about = "TFSA guidance RAG service")]
struct Cli {
    /// Path to the JSON config file (defaults to ./config.json)
    #[arg(long, default_value = "")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the vector index from the knowledge directory
    Ingest,
    /// Answer a single question from the command line
    Ask { question: String },
    /// Serve the HTTP API
    Serve,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Ingest => ingest(&config),
        Command::Ask { question } => ask(&config, &question),
        Command::Serve => serve(config),
    }
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder = GeminiEmbedder::new(
        Config::gemini_api_key()?,
        config.model.embedding_model.clone(),
        config.model.dimensions,
    )?;
    Ok(Arc::new(embedder))
}

fn ingest(config: &Config) -> Result<()> {
    let embedder = build_embedder(config)?;

    let count = Ingestor::new(embedder.as_ref()).run(
        Path::new(&config.knowledge_dir),
        Path::new(&config.index_path),
        Path::new(&config.metadata_path),
    )?;

    info!("Ingestion complete: {count} chunks indexed");
    Ok(())
}

fn build_pipeline(config: &Config) -> Result<(Arc<AskPipeline>, Arc<Retriever>)> {
    let store = VectorStore::load(&config.index_path, &config.metadata_path)
        .context("failed to load vector store (run `tfsarag ingest` first)")?;
    let store = Arc::new(store);

    let embedder = build_embedder(config)?;
    let retriever = Arc::new(Retriever::new(embedder, store));
    let agent = TfsaAgent::new(retriever.clone(), config.search_top_k);
    let generator = Arc::new(GeminiGenerator::new(
        Config::gemini_api_key()?,
        config.model.generation_model.clone(),
    )?);

    let pipeline = AskPipeline::new(retriever.clone(), agent, generator, config.search_top_k);
    Ok((Arc::new(pipeline), retriever))
}

fn ask(config: &Config, question: &str) -> Result<()> {
    let (pipeline, _) = build_pipeline(config)?;

    match pipeline.answer(question, None)? {
        AskOutcome::Answered(text) | AskOutcome::ToolMessage(text) => println!("{text}"),
        AskOutcome::NoSections => println!("{}", tfsarag::ask::NO_SECTIONS_MESSAGE),
    }

    Ok(())
}

fn serve(config: Config) -> Result<()> {
    let (pipeline, retriever) = build_pipeline(&config)?;
    let db = Db::open(&config.db_path).context("failed to open chat database")?;

    let state = AppState {
        db: Arc::new(TokioMutex::new(db)),
        pipeline,
        retriever,
        config: Arc::new(config),
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&state.config.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", state.config.bind_addr))?;
        info!("Serving on http://{}", state.config.bind_addr);

        axum::serve(listener, api::router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install shutdown handler: {e}");
    }
}
