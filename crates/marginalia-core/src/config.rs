//! Engine configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde_json::{json, Value as JsonValue};
use tracing::warn;

use crate::defaults;
use crate::models::BatchKind;

/// Per-kind overwrite flags and kind-specific capability options.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    overwrite: HashMap<BatchKind, bool>,
    /// Rows requested by the sample fetch.
    pub sample_rows: u32,
    /// Distinct values requested per categorical column.
    pub categorical_max_values: u32,
    /// Model used by AI analysis.
    pub ai_model: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            overwrite: HashMap::new(),
            sample_rows: defaults::SAMPLE_ROWS,
            categorical_max_values: defaults::CATEGORICAL_MAX_VALUES,
            ai_model: defaults::AI_MODEL.to_string(),
        }
    }
}

impl BatchSettings {
    /// Override the overwrite flag for one kind.
    pub fn with_overwrite(mut self, kind: BatchKind, overwrite: bool) -> Self {
        self.overwrite.insert(kind, overwrite);
        self
    }

    pub fn with_sample_rows(mut self, rows: u32) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn with_ai_model(mut self, model: impl Into<String>) -> Self {
        self.ai_model = model.into();
        self
    }

    /// Overwrite flag requested for `kind`.
    pub fn overwrite_for(&self, kind: BatchKind) -> bool {
        self.overwrite
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_overwrite())
    }

    /// Kind-specific options sent with every capability call.
    pub fn options_for(&self, kind: BatchKind) -> JsonValue {
        match kind {
            BatchKind::SampleFetch => json!({ "rows": self.sample_rows }),
            BatchKind::CategoricalFetch => json!({ "max_values": self.categorical_max_values }),
            BatchKind::AiAnalysis => json!({ "model": self.ai_model }),
            BatchKind::DetailFetch | BatchKind::OverviewGeneration => json!({}),
        }
    }
}

/// Configuration for the annotation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Root directory holding `{domain}/{entity}/annotation.json`.
    pub data_dir: PathBuf,
    /// Quiet window before autosave fires.
    pub autosave_debounce_ms: u64,
    /// How long "Saved" stays visible.
    pub saved_indicator_ms: u64,
    /// Finished jobs retained by the job store.
    pub job_history_limit: usize,
    /// Capability service base URL.
    pub capability_url: String,
    /// Transport timeout per capability call.
    pub capability_timeout_secs: u64,
    pub batch: BatchSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            autosave_debounce_ms: defaults::AUTOSAVE_DEBOUNCE_MS,
            saved_indicator_ms: defaults::SAVED_INDICATOR_MS,
            job_history_limit: defaults::JOB_HISTORY_LIMIT,
            capability_url: defaults::CAPABILITY_URL.to_string(),
            capability_timeout_secs: defaults::CAPABILITY_TIMEOUT_SECS,
            batch: BatchSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MARGINALIA_DATA_DIR` | `./catalog` | Annotation record root |
    /// | `MARGINALIA_AUTOSAVE_MS` | `2000` | Autosave quiet window |
    /// | `MARGINALIA_SAVED_INDICATOR_MS` | `3000` | "Saved" display time |
    /// | `MARGINALIA_JOB_HISTORY` | `50` | Finished jobs kept in memory |
    /// | `MARGINALIA_CAPABILITY_URL` | `http://127.0.0.1:8765` | Capability service |
    /// | `MARGINALIA_CAPABILITY_TIMEOUT_SECS` | `600` | Per-call transport timeout |
    /// | `MARGINALIA_AI_MODEL` | `gpt-4o-mini` | Model for AI analysis |
    pub fn from_env() -> Self {
        let base = Self::default();

        let data_dir = std::env::var("MARGINALIA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(base.data_dir);

        let capability_url = std::env::var("MARGINALIA_CAPABILITY_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(base.capability_url);

        let mut batch = base.batch;
        if let Ok(model) = std::env::var("MARGINALIA_AI_MODEL") {
            batch.ai_model = model;
        }

        Self {
            data_dir,
            autosave_debounce_ms: env_parse("MARGINALIA_AUTOSAVE_MS", base.autosave_debounce_ms),
            saved_indicator_ms: env_parse("MARGINALIA_SAVED_INDICATOR_MS", base.saved_indicator_ms),
            job_history_limit: env_parse("MARGINALIA_JOB_HISTORY", base.job_history_limit).max(1),
            capability_url,
            capability_timeout_secs: env_parse(
                "MARGINALIA_CAPABILITY_TIMEOUT_SECS",
                base.capability_timeout_secs,
            ),
            batch,
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_autosave_debounce(mut self, ms: u64) -> Self {
        self.autosave_debounce_ms = ms;
        self
    }

    pub fn with_job_history_limit(mut self, limit: usize) -> Self {
        self.job_history_limit = limit.max(1);
        self
    }

    pub fn with_capability_url(mut self, url: impl Into<String>) -> Self {
        self.capability_url = url.into();
        self
    }

    pub fn with_batch_settings(mut self, batch: BatchSettings) -> Self {
        self.batch = batch;
        self
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = name, value = %raw, "Ignoring unparsable configuration value");
                default
            }
        },
        Err(_) => default,
    }
}
