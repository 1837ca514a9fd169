use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which sentiment engine annotates the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerEngine {
    /// Averaged word polarity with subjectivity, thresholds at ±0.1.
    Lexicon,
    /// Normalized compound valence with share breakdown, thresholds at ±0.05.
    Compound,
}

/// Which embedding backend powers semantic search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedProvider {
    Tei,
    OpenAi,
    /// Semantic search stays available but always returns no results.
    None,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub data_path: PathBuf,
    pub initial_load_count: usize,
    pub reload_batch_size: usize,
    pub scorer: ScorerEngine,
    pub scorer_concurrency: usize,
    pub embed_provider: EmbedProvider,
    pub tei_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub embed_timeout_secs: u64,
    pub embed_concurrency: usize,
    pub embedding_cache_path: PathBuf,
    pub build_embeddings_on_start: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("data_path", &self.data_path)
            .field("initial_load_count", &self.initial_load_count)
            .field("reload_batch_size", &self.reload_batch_size)
            .field("scorer", &self.scorer)
            .field("scorer_concurrency", &self.scorer_concurrency)
            .field("embed_provider", &self.embed_provider)
            .field("tei_url", &self.tei_url)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("embed_timeout_secs", &self.embed_timeout_secs)
            .field("embed_concurrency", &self.embed_concurrency)
            .field("embedding_cache_path", &self.embedding_cache_path)
            .field("build_embeddings_on_start", &self.build_embeddings_on_start)
            .finish()
    }
}
