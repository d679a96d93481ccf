//! # Oracle Voice
//!
//! Speech gateway for The Oracle: a thin TTS proxy with a fixed voice and an
//! estimated-duration fallback so caption timing survives without audio.
//!
//! No audio is captured or played server-side; synthesis happens upstream and
//! playback in the client. When credentials are missing the placeholder
//! backend returns empty audio and callers time captions with
//! [`timing::estimate_speaking_duration`].

pub mod error;
pub mod timing;
pub mod tts;

pub use error::{SpeechError, SpeechResult};
pub use timing::estimate_speaking_duration;
pub use tts::{create_best_tts, ElevenLabsTts, PlaceholderTts, TtsBackend, VoiceSettings, WsAuthGrant};
