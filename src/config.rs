//! Configuration management for histdoc.
//!
//! Settings are read from a TOML, YAML or JSON file (chosen by extension).
//! Every section has defaults, so an empty file or no file at all yields a
//! working configuration that points at `./config/reference` and `./pdfs`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default settings file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "histdoc.toml";

/// Default user agent for PDF downloads.
pub const USER_AGENT: &str = "histdoc/0.3 (historical archive ingestion)";

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the reference datasets.
    pub reference_dir: PathBuf,
    /// Local PDF cache (and scan directory in local-only mode).
    pub pdf_dir: PathBuf,
    /// Optional manifest of source records.
    pub manifest: PathBuf,
    pub pdf: PdfSettings,
    pub extraction: ExtractionParams,
    pub pipeline: PipelineSettings,
    pub store: StoreSettings,
    /// Path the settings were loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("config/reference"),
            pdf_dir: PathBuf::from("pdfs"),
            manifest: PathBuf::from("scraped_items.json"),
            pdf: PdfSettings::default(),
            extraction: ExtractionParams::default(),
            pipeline: PipelineSettings::default(),
            store: StoreSettings::default(),
            source_path: None,
        }
    }
}

/// Limits for PDF validation and text extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// Files larger than this are rejected by validation.
    pub max_file_size: u64,
    /// Below this many trimmed characters the fallback strategy is tried.
    pub min_primary_chars: usize,
    /// Below this many characters after cleaning, extraction fails.
    pub min_text_chars: usize,
    /// Ceiling for the whole extraction step of one document.
    pub extraction_timeout_secs: u64,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            min_primary_chars: 100,
            min_text_chars: 50,
            extraction_timeout_secs: 300,
        }
    }
}

impl PdfSettings {
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

/// Tunables for the entity extraction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionParams {
    /// Date mentions of the same year within one bucket of this many
    /// characters are the same mention.
    pub date_bucket_size: usize,
    /// Minimum similarity (0-100, exclusive) for a fuzzy dictionary or
    /// gazetteer match.
    pub fuzzy_threshold: f64,
    /// Average of first/last name confidence must exceed this.
    pub name_min_confidence: f64,
    /// Themes scoring at or below this are dropped.
    pub theme_min_score: f64,
    /// Context window (characters on each side) for dates, names and places.
    pub context_window: usize,
    /// Context window for theme samples.
    pub theme_context_window: usize,
    /// Number of sample contexts kept per theme.
    pub theme_max_contexts: usize,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            date_bucket_size: 50,
            fuzzy_threshold: 80.0,
            name_min_confidence: 0.6,
            theme_min_score: 0.1,
            context_window: 100,
            theme_context_window: 50,
            theme_max_contexts: 3,
        }
    }
}

/// Batch orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub max_workers: usize,
    /// Documents with less extracted text than this are skipped.
    pub min_document_chars: usize,
    pub download_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_workers: 4,
            min_document_chars: 100,
            download_timeout_secs: 60,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl PipelineSettings {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Which store backend receives enriched documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Elasticsearch,
    Json,
    Memory,
}

/// External store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    /// Base URL of the search cluster.
    pub url: String,
    /// Index name.
    pub index: String,
    /// Output directory for the JSON store.
    pub dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::Elasticsearch,
            url: "http://localhost:9200".to_string(),
            index: "historical_documents".to_string(),
            dir: PathBuf::from("index"),
            timeout_secs: 30,
        }
    }
}

impl StoreSettings {
    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("HISTDOC_STORE_URL") {
            if !url.trim().is_empty() {
                self.url = url;
            }
        }
        if let Ok(index) = std::env::var("HISTDOC_STORE_INDEX") {
            if !index.trim().is_empty() {
                self.index = index;
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Load settings from a specific file path.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut settings: Settings = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        settings.source_path = Some(path.to_path_buf());
        settings.resolve_paths();
        Ok(settings)
    }

    /// Load settings from an explicit path, or `./histdoc.toml` when present,
    /// or fall back to defaults.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let mut settings = match explicit {
            Some(path) => Self::load_from_path(path).await?,
            None => {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                if candidate.exists() {
                    Self::load_from_path(&candidate).await?
                } else {
                    Self::default()
                }
            }
        };
        settings.store = settings.store.with_env_overrides();
        Ok(settings)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    fn resolve_paths(&mut self) {
        let Some(base) = self.base_dir() else {
            return;
        };
        self.reference_dir = resolve_path(&self.reference_dir, &base);
        self.pdf_dir = resolve_path(&self.pdf_dir, &base);
        self.manifest = resolve_path(&self.manifest, &base);
        self.store.dir = resolve_path(&self.store.dir, &base);
    }
}

/// Resolve a path that may be relative to the config file.
/// - Absolute paths are returned as-is
/// - Paths starting with ~ are expanded
/// - Relative paths are joined onto `base_dir`
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::tilde(raw.as_ref());
    let expanded = Path::new(expanded.as_ref());

    if expanded.is_absolute() {
        expanded.to_path_buf()
    } else {
        base_dir.join(expanded)
    }
}
