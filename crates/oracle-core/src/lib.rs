//! # Oracle Core
//!
//! Domain library for The Oracle, a scripted numerology conversation funnel.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Conversation Orchestrator                   │
//! │   (state, event) -> (state', effects)   +  NarrationQueue    │
//! │      ┌───────────┐  ┌────────────┐  ┌────────────────┐      │
//! │      │ Phase     │  │ Numerology │  │ Date Parser    │      │
//! │      │ Registry  │  │ Engine     │  │                │      │
//! │      └───────────┘  └────────────┘  └────────────────┘      │
//! │             ↓                ↓                               │
//! │      ┌────────────────┐  ┌──────────────────────────┐       │
//! │      │ Redirect       │→ │ Enhancement Gateway      │       │
//! │      │ Generator      │  │ (fallback: base copy)    │       │
//! │      └────────────────┘  └──────────────────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state is in-memory per session; nothing is persisted. Every upstream
//! failure resolves to deterministic in-character copy.

pub mod config;
pub mod dateparse;
pub mod enhance;
pub mod error;
pub mod numerology;
pub mod orchestrator;
pub mod phase;
pub mod profile;
pub mod redirect;
pub mod script;

pub use config::{OracleConfig, UserConfig};
pub use dateparse::{format_long, parse_date_string, parse_date_string_at, DateErrorCode, DateParseError, ParsedDate};
pub use enhance::{
    EnhanceClient, EnhanceContext, EnhanceMode, EnhanceRequest, SuggestionsDetail, ValidationDetail,
};
pub use error::{OracleError, OracleResult};
pub use numerology::{
    calculate_birthday_number, calculate_compatibility, calculate_compatibility_with,
    calculate_expression, calculate_life_path, calculate_personality, calculate_soul_urge,
    reduce_to_single_digit, CompatibilityAreas, CompatibilityLevel, CompatibilityResult, Jitter,
};
pub use orchestrator::{
    advance_to_rest, start, transition, Effect, NarrationQueue, OracleEvent, SessionState,
};
pub use phase::{ConversationPhase, InputType, PhaseConfig, ValidationType, PHASE_ORDER};
pub use profile::{
    validate_email, validate_name, ExpectedInput, Message, MessageKind, PersonProfile,
    ValidationCode, ValidationError,
};
pub use redirect::{fallback_messages, generate_redirect, RedirectRequest};
pub use script::{base_messages, suggestions, ScriptContext};
