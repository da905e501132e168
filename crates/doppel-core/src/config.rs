use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_mode")]
    pub mode: String,
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_mode() -> String {
    "persistent".into()
}
fn default_db_path() -> String {
    "data/doppel.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            mode: default_db_mode(),
            path: default_db_path(),
        }
    }
}

/// OpenAI-compatible completion endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Ask the endpoint for a JSON object response on structured calls.
    #[serde(default = "default_json_mode")]
    pub json_mode: bool,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_chat_model() -> String {
    "gpt-4o".into()
}
fn default_analysis_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_chat_max_tokens() -> u32 {
    1000
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_json_mode() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            chat_model: default_chat_model(),
            analysis_model: default_analysis_model(),
            temperature: default_temperature(),
            chat_max_tokens: default_chat_max_tokens(),
            timeout_secs: default_timeout_secs(),
            json_mode: default_json_mode(),
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    #[serde(default = "default_max_chars_per_sample")]
    pub max_chars_per_sample: usize,
    #[serde(default = "default_analysis_max_tokens")]
    pub extraction_max_tokens: u32,
    #[serde(default = "default_analysis_max_tokens")]
    pub synthesis_max_tokens: u32,
}

fn default_max_samples() -> usize {
    50
}
fn default_max_chars_per_sample() -> usize {
    3000
}
fn default_analysis_max_tokens() -> u32 {
    2000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            max_chars_per_sample: default_max_chars_per_sample(),
            extraction_max_tokens: default_analysis_max_tokens(),
            synthesis_max_tokens: default_analysis_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
    /// Rerank retrieved chunks for diversity before prompting.
    #[serde(default = "default_diversify")]
    pub diversify: bool,
    /// Weight of relevance against redundancy when diversifying (1.0 = relevance only).
    #[serde(default = "default_diversity_lambda")]
    pub diversity_lambda: f32,
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
    /// Only retrieve chunks ingested from this source type (e.g. `blog`).
    #[serde(default)]
    pub source_type: Option<String>,
}

fn default_retrieval_k() -> usize {
    7
}
fn default_diversify() -> bool {
    true
}
fn default_diversity_lambda() -> f32 {
    0.5
}
fn default_max_history_messages() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            retrieval_k: default_retrieval_k(),
            diversify: default_diversify(),
            diversity_lambda: default_diversity_lambda(),
            max_history_messages: default_max_history_messages(),
            source_type: None,
        }
    }
}

/// Who the twin impersonates.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

fn default_persona_name() -> String {
    "Griffin".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            full_name: None,
        }
    }
}

impl PersonaConfig {
    pub fn display_full_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_chunk_chars() -> usize {
    4000
}
fn default_extensions() -> Vec<String> {
    vec!["txt".into(), "md".into()]
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            extensions: default_extensions(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}
