use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the whole question-answering service.
///
/// Every section has defaults, so a `config.yaml` only needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which backend serves embeddings and completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    /// Any OpenAI-compatible `/v1` API.
    OpenAi,
}

/// Configuration for the generation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    /// Name of the environment variable holding the API key, if the provider needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Configuration for RAG processing: embedding, chunking and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub embedding_model: String,
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
    /// Number of chunks handed to the generator as context
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Number of chunks sent per embedding request during ingestion
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

/// Timeouts and retry policy for calls to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub socket_path: String,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant that answers questions about a document. \
     Answer only from the provided context."
        .to_string()
}

fn default_top_k() -> usize {
    3
}

fn default_embed_batch_size() -> usize {
    32
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            model: "llama3.2".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.0,
            api_key_env: None,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: "nomic-embed-text".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: default_top_k(),
            embed_batch_size: default_embed_batch_size(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/docqa.sock".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            system_prompt: default_system_prompt(),
            rag: RagConfig::default(),
            network: NetworkConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from("config.yaml")
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path) {
            Err(ConfigError::FileRead(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let rag = &self.rag;
        if rag.chunk_size == 0 {
            return Err(ConfigError::Invalid("rag.chunk_size must be greater than 0".into()));
        }
        if rag.chunk_overlap >= rag.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "rag.chunk_overlap ({}) must be less than rag.chunk_size ({})",
                rag.chunk_overlap, rag.chunk_size
            )));
        }
        if rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be greater than 0".into()));
        }
        if rag.embed_batch_size == 0 {
            return Err(ConfigError::Invalid("rag.embed_batch_size must be greater than 0".into()));
        }
        if self.network.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "network.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.network.initial_backoff_ms > self.network.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "network.initial_backoff_ms must not exceed network.max_backoff_ms".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rag_config_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.embedding_model, "nomic-embed-text");
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn test_network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.rag.chunk_overlap = config.rag.chunk_size;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = Config::default();
        config.rag.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-3.5-turbo
  base_url: https://api.openai.com/v1
  temperature: 0.0
  api_key_env: OPENAI_API_KEY
rag:
  embedding_model: text-embedding-3-small
  chunk_size: 500
  chunk_overlap: 50
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.provider, ProviderKind::OpenAi);
        assert_eq!(config.llm.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.network.max_retries, 3);
        assert_eq!(config.server.socket_path, "/tmp/docqa.sock");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "rag:\n  embedding_model: e\n  chunk_size: 10\n  chunk_overlap: 10\n",
        )
        .unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            Config::load_or_default_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default_from(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.rag.chunk_size, 1000);
    }

    #[test]
    fn test_unparseable_file_is_not_replaced_by_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "rag: [not, a, mapping]\n").unwrap();
        assert!(matches!(
            Config::load_or_default_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
