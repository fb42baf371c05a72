use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub embeddings: EmbeddingConfig,
    pub search: SearchConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/medsearch.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `hashed`, `noop` or `openai`.
    pub provider: String,
    /// Remote model name; ignored by the local providers.
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hashed".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 256,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: usize,
    /// Category value the UI sends to mean "no filter".
    pub all_categories_label: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            all_categories_label: "All".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// JSON corpus to seed from instead of the built-in sample.
    pub corpus: Option<String>,
    /// Seed automatically when the database holds no codes.
    pub seed_on_startup: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            corpus: None,
            seed_on_startup: true,
        }
    }
}

/// Layers defaults, the TOML file and `MEDSEARCH__*` environment variables.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("MEDSEARCH")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
