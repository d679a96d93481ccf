//! Oracle configuration loaded from `.env` plus an optional `user_config.toml`.
//!
//! Toggles cover the enhancement bridge, speech credentials, narration pacing,
//! and the compatibility jitter mode. Change behavior without code edits.

use crate::numerology::Jitter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

/// Runtime configuration loaded from environment.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | ORACLE_ENHANCE_ENABLED | true | Call the chat-completion bridge for copy variation. |
/// | ORACLE_ENHANCE_TIMEOUT_SECS | 8 | Enhancement request timeout (single-digit seconds). |
/// | ORACLE_SPEECH_TIMEOUT_SECS | 8 | Speech synthesis request timeout. |
/// | ORACLE_PACING_MS | 900 | Pause between sequential Oracle messages. |
/// | ORACLE_JITTER | reroll | `reroll` \| `seeded:<n>` \| `flat`: compatibility jitter mode. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_true")]
    pub enhance_enabled: bool,
    #[serde(default = "default_enhance_timeout")]
    pub enhance_timeout_secs: u64,
    #[serde(default = "default_enhance_timeout")]
    pub speech_timeout_secs: u64,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Jitter mode string as configured; parsed via [`OracleConfig::jitter`].
    #[serde(default = "default_jitter")]
    pub jitter_mode: String,
}

fn default_enhance_timeout() -> u64 {
    8
}

fn default_pacing_ms() -> u64 {
    900
}

fn default_jitter() -> String {
    "reroll".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enhance_enabled: true,
            enhance_timeout_secs: default_enhance_timeout(),
            speech_timeout_secs: default_enhance_timeout(),
            pacing_ms: default_pacing_ms(),
            jitter_mode: default_jitter(),
        }
    }
}

impl OracleConfig {
    /// Load from environment. Unset or invalid values fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            enhance_enabled: env_bool("ORACLE_ENHANCE_ENABLED", true),
            enhance_timeout_secs: env_u64("ORACLE_ENHANCE_TIMEOUT_SECS", 8).min(9),
            speech_timeout_secs: env_u64("ORACLE_SPEECH_TIMEOUT_SECS", 8).min(9),
            pacing_ms: env_u64("ORACLE_PACING_MS", 900),
            jitter_mode: env_opt_string("ORACLE_JITTER").unwrap_or_else(default_jitter),
        }
    }

    /// Compatibility jitter source. Unrecognized text keeps the re-rolling default.
    pub fn jitter(&self) -> Jitter {
        Jitter::from_str(&self.jitter_mode).unwrap_or(Jitter::Reroll)
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => v.trim().eq_ignore_ascii_case("true") || (v.trim().is_empty() && default),
        Err(_) => default,
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// User-specific configuration stored in `user_config.toml`, so self-hosters
/// can provide their own LLM key without touching the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Personal chat-completion API key (OpenRouter or compatible).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Preferred chat-completion model.
    #[serde(default)]
    pub llm_model: Option<String>,
    /// Preferred chat-completion API base URL.
    #[serde(default)]
    pub llm_api_url: Option<String>,
}

impl UserConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from("user_config.toml")
    }

    /// Load from the default path; missing file yields defaults.
    pub fn load() -> Self {
        Self::load_from_path(&Self::default_path())
    }

    pub fn load_from_path(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// API key, file first, then `ORACLE_LLM_API_KEY`, then `OPENROUTER_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ORACLE_LLM_API_KEY").ok())
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn resolved_model(&self) -> Option<String> {
        self.llm_model
            .clone()
            .or_else(|| std::env::var("ORACLE_LLM_MODEL").ok())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn resolved_api_url(&self) -> Option<String> {
        self.llm_api_url
            .clone()
            .or_else(|| std::env::var("ORACLE_LLM_API_URL").ok())
            .filter(|s| !s.trim().is_empty())
    }
}
