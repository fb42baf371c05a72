//! Wiring: providers, database, corpus preparation and the search service.

use crate::config::AppConfig;
use crate::embeddings::{self, Embedder};
use crate::search::QueryPipeline;
use crate::seed::{self, SeedSummary};
use crate::store::{self, EntrySource, EntryStore};
use anyhow::Context;
use providers::hashed::HashedBagModel;
use providers::local::LocalProvider;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use storage::{connect, migrate};
use tracing::{info, warn};

pub fn build_registry(config: &AppConfig) -> anyhow::Result<ProviderRegistry> {
    let dims = config.embeddings.dimensions;
    let hashed = HashedBagModel::new(dims).context("hashed embedding model")?;
    let mut reg = ProviderRegistry::new()
        .with_embedding("hashed", Arc::new(LocalProvider::new(hashed)))
        .with_embedding("noop", Arc::new(NoopProvider::new(dims)));

    if let (Some(key), Some(base)) = (
        std::env::var_os("OPENAI_API_KEY"),
        std::env::var_os("OPENAI_BASE_URL"),
    ) {
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url: base.to_string_lossy().into_owned(),
            embedding_model: config.embeddings.model.clone(),
            dimensions: Some(dims),
        });
        reg = reg.with_embedding("openai", Arc::new(provider));
    }

    Ok(reg.set_preferred_embedding(&config.embeddings.provider))
}

pub fn build_embedder(config: &AppConfig, registry: &ProviderRegistry) -> anyhow::Result<Embedder> {
    let provider = registry.embedding(None).with_context(|| {
        format!(
            "embedding provider '{}' (available: {})",
            config.embeddings.provider,
            registry.names().join(", ")
        )
    })?;
    Ok(Embedder::new(provider, config.embeddings.dimensions))
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct PrepareSummary {
    pub seeded: Option<SeedSummary>,
    pub embedded: usize,
    pub entries: usize,
}

/// Seeds from `corpus` when given, otherwise from the built-in sample.
pub async fn seed_from(pool: &SqlitePool, corpus: Option<&Path>) -> anyhow::Result<SeedSummary> {
    let entries = match corpus {
        Some(path) => seed::load_corpus_file(path)?,
        None => seed::sample_corpus(),
    };
    Ok(seed::seed_corpus(pool, &entries).await?)
}

/// Database, entry store and query pipeline for one process.
pub struct SearchService {
    config: AppConfig,
    pool: SqlitePool,
    store: Arc<EntryStore>,
    pipeline: QueryPipeline,
}

impl SearchService {
    /// Connects, migrates, seeds an empty database if configured to,
    /// embeds pending codes and loads the first snapshot.
    pub async fn start(config: AppConfig) -> anyhow::Result<(Self, PrepareSummary)> {
        let pool = connect(&config.database.path).await.context("db connect")?;
        migrate(&pool).await.context("db migrate")?;

        let registry = build_registry(&config)?;
        let embedder = build_embedder(&config, &registry)?;
        let store = Arc::new(EntryStore::new());
        let source: Arc<dyn EntrySource> = store.clone();
        let pipeline = QueryPipeline::new(embedder, source);

        let service = Self {
            config,
            pool,
            store,
            pipeline,
        };
        let mut summary = PrepareSummary::default();
        if service.config.seed.seed_on_startup && storage::count_codes(&service.pool).await? == 0 {
            info!("database empty, seeding corpus");
            let corpus = service.config.seed.corpus.as_deref().map(Path::new);
            summary.seeded = Some(seed_from(&service.pool, corpus).await?);
        }
        let (embedded, entries) = service.reload().await?;
        summary.embedded = embedded;
        summary.entries = entries;
        Ok((service, summary))
    }

    /// Embeds anything pending, then swaps in a fresh snapshot.
    /// Returns (codes embedded, entries loaded).
    pub async fn reload(&self) -> anyhow::Result<(usize, usize)> {
        let embedder = self.pipeline.embedder();
        let embedded =
            embeddings::run_embedder(&self.pool, embedder, self.config.embeddings.batch_size)
                .await
                .context("embed pending codes")?;
        let snapshot = store::load_snapshot(&self.pool, embedder.dimensions(), embedder.model_id())
            .await
            .context("load corpus snapshot")?;
        let entries = snapshot.len();
        if entries == 0 {
            warn!("corpus is empty, every search will return no results");
        }
        self.store.replace(snapshot);
        Ok((embedded, entries))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }
}
