//! TTS backends: the Oracle's spoken voice.
//!
//! One fixed voice with fixed style parameters; the mystical register depends
//! on the voice never changing mid-session. `ElevenLabsTts` is the production
//! backend; `PlaceholderTts` returns empty audio so the caption timing
//! fallback carries the experience when no credential is configured.

use crate::error::{SpeechError, SpeechResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io/v1";
const DEFAULT_VOICE_ID: &str = "XB0fDUnXU5powFXDhCwa";
const DEFAULT_MODEL_ID: &str = "eleven_turbo_v2_5";
const DEFAULT_TIMEOUT_SECS: u64 = 8;

fn build_client(timeout: Duration) -> SpeechResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SpeechError::Tts(e.to_string()))
}

/// Fixed voice-style parameters for the Oracle register.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.55,
            similarity_boost: 0.75,
            style: 0.35,
            use_speaker_boost: true,
        }
    }
}

/// Backend that turns text into audio bytes (MP3). Implement for other
/// providers or a local engine.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize text to audio bytes. Empty output means "no audio" and
    /// callers should use the estimated-duration fallback.
    async fn synthesize(&self, text: &str) -> SpeechResult<Vec<u8>>;
}

/// Placeholder TTS: no audio, so caption timing falls back to estimation.
#[derive(Debug, Default)]
pub struct PlaceholderTts;

#[async_trait]
impl TtsBackend for PlaceholderTts {
    async fn synthesize(&self, _text: &str) -> SpeechResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Production TTS backend: ElevenLabs streaming-capable API, fixed voice.
/// Uses `ELEVENLABS_API_KEY` (or `TTS_API_KEY`); voice and model are fixed
/// per deployment via `ORACLE_VOICE_ID` / `ORACLE_TTS_MODEL_ID`.
#[derive(Debug, Clone)]
pub struct ElevenLabsTts {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Provider API key.
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
    timeout: Duration,
    client: reqwest::Client,
}

impl ElevenLabsTts {
    /// Build from environment: `ELEVENLABS_API_KEY` or `TTS_API_KEY`,
    /// optional `ORACLE_VOICE_ID`, `ORACLE_TTS_MODEL_ID`, `TTS_API_URL`.
    pub fn from_env() -> SpeechResult<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .or_else(|_| std::env::var("TTS_API_KEY"))
            .map_err(|_| {
                SpeechError::Config("TTS requires ELEVENLABS_API_KEY or TTS_API_KEY".to_string())
            })?;
        let base_url =
            std::env::var("TTS_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let voice_id =
            std::env::var("ORACLE_VOICE_ID").unwrap_or_else(|_| DEFAULT_VOICE_ID.to_string());
        let model_id =
            std::env::var("ORACLE_TTS_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string());
        Self::new(base_url, api_key, voice_id, model_id)
    }

    /// Create with explicit config (tests, non-env wiring).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> SpeechResult<Self> {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
            voice_settings: VoiceSettings::default(),
            timeout,
            client: build_client(timeout)?,
        })
    }

    /// Override the voice-style parameters.
    pub fn with_voice_settings(mut self, settings: VoiceSettings) -> Self {
        self.voice_settings = settings;
        self
    }

    /// Replace the request timeout (`ORACLE_SPEECH_TIMEOUT_SECS`).
    pub fn with_timeout(mut self, secs: u64) -> SpeechResult<Self> {
        self.timeout = Duration::from_secs(secs);
        self.client = build_client(self.timeout)?;
        Ok(self)
    }
}

#[async_trait]
impl TtsBackend for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> SpeechResult<Vec<u8>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!(
            "{}/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            self.voice_id
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": self.voice_settings,
        });
        let res = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(SpeechError::Upstream { status, body });
        }
        let bytes = res.bytes().await?;
        debug!(target: "oracle::speech", chars = text.len(), bytes = bytes.len(), "synthesized");
        Ok(bytes.to_vec())
    }
}

/// Credentials grant for client-directed streaming TTS over WebSocket,
/// issued per session so the API key is never baked into client bundles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsAuthGrant {
    pub ws_url: String,
    pub api_key: String,
    pub voice_settings: VoiceSettings,
    pub voice_id: String,
    pub model_id: String,
}

impl WsAuthGrant {
    /// Build a grant from the configured backend.
    pub fn for_backend(tts: &ElevenLabsTts) -> Self {
        let ws_url = format!(
            "wss://api.elevenlabs.io/v1/text-to-speech/{}/stream-input?model_id={}",
            tts.voice_id, tts.model_id
        );
        info!(target: "oracle::speech", voice = %tts.voice_id, "issued ws auth grant");
        Self {
            ws_url,
            api_key: tts.api_key.clone(),
            voice_settings: tts.voice_settings,
            voice_id: tts.voice_id.clone(),
            model_id: tts.model_id.clone(),
        }
    }
}

/// The configured backend if credentials exist, else the placeholder.
pub fn create_best_tts() -> Box<dyn TtsBackend> {
    match ElevenLabsTts::from_env() {
        Ok(t) => Box::new(t),
        Err(_) => Box::new(PlaceholderTts),
    }
}
