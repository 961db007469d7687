//! Configuration for the PDF retrieval pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.pdfrag/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `PDFRAG_` and use double
//! underscores to separate nested levels:
//! - `PDFRAG_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`
//! - `PDFRAG_EMBEDDING__PROVIDER=fastembed` sets `embedding.provider`
//! - `PDFRAG_DOCUMENTS_DIR=/srv/pdfs` sets `documents_dir`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::documents::{ChunkingConfig, RetrievalConfig};

/// Directory holding the settings file, relative to the workspace root.
pub const CONFIG_DIR: &str = ".pdfrag";
pub const SETTINGS_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "PDFRAG_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory the PDFs are read from
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// Directory holding the vector store
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Workspace root directory (where .pdfrag is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Embedding backend selection.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Gemini,
    Openai,
    Fastembed,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Model name; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API base URL; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Requested output dimensionality, if the model supports truncation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,

    /// Inputs per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Model cache for the local provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `indexing = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}
fn default_store_path() -> PathBuf {
    PathBuf::from(".pdfrag/store")
}
fn default_batch_size() -> usize {
    100
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> usize {
    3
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            documents_dir: default_documents_dir(),
            store_path: default_store_path(),
            workspace_root: None,
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: None,
            base_url: None,
            api_key_env: None,
            dimensions: None,
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            cache_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl EmbeddingConfig {
    pub fn effective_model(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider {
            EmbeddingProvider::Gemini => "models/gemini-embedding-001",
            EmbeddingProvider::Openai => "text-embedding-3-small",
            EmbeddingProvider::Fastembed => "AllMiniLML6V2",
        }
        .to_string()
    }

    pub fn effective_base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.clone();
        }
        match self.provider {
            EmbeddingProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            EmbeddingProvider::Openai | EmbeddingProvider::Fastembed => "https://api.openai.com/v1",
        }
        .to_string()
    }

    pub fn effective_api_key_env(&self) -> String {
        if let Some(var) = &self.api_key_env {
            return var.clone();
        }
        match self.provider {
            EmbeddingProvider::Gemini => "GOOGLE_API_KEY",
            EmbeddingProvider::Openai | EmbeddingProvider::Fastembed => "OPENAI_API_KEY",
        }
        .to_string()
    }

    /// Model cache for the local provider, `<cache>/pdfrag/models` by default.
    pub fn effective_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("pdfrag").join("models")))
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .pdfrag directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    ///
    /// The workspace root defaults to the directory containing `.pdfrag`, or
    /// the file's own directory when it lives elsewhere.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        Self::figment(path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::root_for_config_file(path);
                }
                settings
            })
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels,
            // single underscore (_) remains as is within field names
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
    }

    fn root_for_config_file(path: &Path) -> Option<PathBuf> {
        let parent = path.parent()?;
        let parent = if parent.as_os_str().is_empty() {
            std::env::current_dir().ok()?
        } else {
            parent.to_path_buf()
        };
        if parent.file_name().is_some_and(|name| name == CONFIG_DIR) {
            parent.parent().map(Path::to_path_buf)
        } else {
            Some(parent)
        }
    }

    /// Find the workspace settings file by looking for a .pdfrag directory
    /// from the current directory up to the filesystem root.
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Get the workspace root directory (where .pdfrag is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.workspace_root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }

    pub fn resolved_documents_dir(&self) -> PathBuf {
        self.resolve_path(&self.documents_dir)
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        self.resolve_path(&self.store_path)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Create a default settings file under `dir/.pdfrag` and the documents
    /// directory next to it.
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dir = dir.as_ref();
        let config_path = dir.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        // workspace_root stays unset so the workspace can be moved
        let settings = Settings::default();
        settings.save(&config_path)?;
        std::fs::create_dir_all(dir.join(&settings.documents_dir))?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.documents_dir, PathBuf::from("documents"));
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.overlap, 200);
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Gemini);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_provider_defaults() {
        let gemini = EmbeddingConfig::default();
        assert_eq!(gemini.effective_model(), "models/gemini-embedding-001");
        assert_eq!(gemini.effective_api_key_env(), "GOOGLE_API_KEY");
        assert!(gemini.effective_base_url().contains("generativelanguage"));

        let local = EmbeddingConfig {
            provider: EmbeddingProvider::Fastembed,
            ..EmbeddingConfig::default()
        };
        assert_eq!(local.effective_model(), "AllMiniLML6V2");

        let custom = EmbeddingConfig {
            provider: EmbeddingProvider::Openai,
            model: Some("nomic-embed-text".to_string()),
            api_key_env: Some("LOCAL_KEY".to_string()),
            ..EmbeddingConfig::default()
        };
        assert_eq!(custom.effective_model(), "nomic-embed-text");
        assert_eq!(custom.effective_api_key_env(), "LOCAL_KEY");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join(SETTINGS_FILE);

        let toml_content = r#"
version = 2
documents_dir = "pdfs"

[chunking]
chunk_size = 500

[embedding]
provider = "fastembed"
model = "BGESmallENV15"

[logging]
default = "info"

[logging.modules]
indexing = "debug"
"#;
        std::fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.overlap, 200);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Fastembed);
        assert_eq!(settings.embedding.effective_model(), "BGESmallENV15");
        assert_eq!(settings.logging.default, "info");
        assert_eq!(
            settings.logging.modules.get("indexing"),
            Some(&"debug".to_string())
        );

        // Relative paths resolve against the directory holding .pdfrag
        assert_eq!(settings.workspace_root.as_deref(), Some(temp_dir.path()));
        assert_eq!(settings.resolved_documents_dir(), temp_dir.path().join("pdfs"));
        assert_eq!(
            settings.resolved_store_path(),
            temp_dir.path().join(".pdfrag/store")
        );
    }

    #[test]
    fn test_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        std::fs::write(&config_path, "[retrieval]\ntop_k = 4\n").unwrap();

        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("PDFRAG_RETRIEVAL__TOP_K", "7") };
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe { std::env::remove_var("PDFRAG_RETRIEVAL__TOP_K") };

        assert_eq!(settings.retrieval.top_k, 7);
        assert_eq!(settings.workspace_root.as_deref(), Some(temp_dir.path()));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.chunking, ChunkingConfig::default());
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Gemini);
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let settings = Settings {
            workspace_root: Some(PathBuf::from("/workspace")),
            store_path: PathBuf::from("/var/lib/pdfrag"),
            ..Settings::default()
        };
        assert_eq!(settings.resolved_store_path(), PathBuf::from("/var/lib/pdfrag"));
        assert_eq!(
            settings.resolved_documents_dir(),
            PathBuf::from("/workspace/documents")
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.retrieval.top_k = 5;
        settings.embedding.dimensions = Some(768);
        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.embedding.dimensions, Some(768));
        assert_eq!(loaded.chunking, settings.chunking);
    }

    #[test]
    fn test_init_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.exists());
        assert!(temp_dir.path().join("documents").is_dir());

        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }
}
