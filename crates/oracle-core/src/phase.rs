//! Phase Registry: the scripted funnel's 23 phases and their UI contracts.
//!
//! Every phase maps to exactly one [`PhaseConfig`] through an exhaustive
//! `match`, so totality is checked at compile time rather than by a dictionary
//! with optional fallthrough. The linear [`PHASE_ORDER`] is advisory; the
//! orchestrator's branching transitions decide the actual path.

use serde::{Deserialize, Serialize};

/// A named step in the scripted conversation. Exactly one is active per
/// session; the session state is in-memory only and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    Opening,
    CosmicAttunement,
    CollectingDob,
    CalculatingLifePath,
    FirstReveal,
    LifePathMeaning,
    OracleQuestion1,
    CollectingName,
    TransformingName,
    DeeperReveal,
    BirthdayReveal,
    OracleQuestion2,
    RelationshipHook,
    CollectingOtherDob,
    CalculatingCompatibility,
    CompatibilityTease,
    OracleQuestion3,
    CollectingEmail,
    FinalHook,
    Paywall,
    PersonalPaywall,
    ProcessingPayment,
    PaidReading,
}

/// Input widget the renderer should show for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Email,
    Date,
    Name,
    None,
}

/// Validation category the orchestrator applies to submissions in a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    Date,
    Email,
    Name,
    Freeform,
    None,
}

/// Immutable per-phase UI and validation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseConfig {
    pub show_input: bool,
    pub show_suggestions: bool,
    pub input_type: InputType,
    pub placeholder: &'static str,
    pub validation: ValidationType,
    pub oracle_speaking: bool,
    pub expects_response: bool,
}

const fn narration() -> PhaseConfig {
    PhaseConfig {
        show_input: false,
        show_suggestions: false,
        input_type: InputType::None,
        placeholder: "",
        validation: ValidationType::None,
        oracle_speaking: true,
        expects_response: false,
    }
}

const fn collecting(input_type: InputType, validation: ValidationType, placeholder: &'static str) -> PhaseConfig {
    PhaseConfig {
        show_input: true,
        show_suggestions: false,
        input_type,
        placeholder,
        validation,
        oracle_speaking: false,
        expects_response: true,
    }
}

const fn question() -> PhaseConfig {
    PhaseConfig {
        show_input: true,
        show_suggestions: true,
        input_type: InputType::Text,
        placeholder: "Speak your truth...",
        validation: ValidationType::Freeform,
        oracle_speaking: false,
        expects_response: true,
    }
}

/// The fixed linear ordering of phases. `next()` walks this array; the
/// orchestrator overrides it where the funnel branches.
pub const PHASE_ORDER: [ConversationPhase; 23] = [
    ConversationPhase::Opening,
    ConversationPhase::CosmicAttunement,
    ConversationPhase::CollectingDob,
    ConversationPhase::CalculatingLifePath,
    ConversationPhase::FirstReveal,
    ConversationPhase::LifePathMeaning,
    ConversationPhase::OracleQuestion1,
    ConversationPhase::CollectingName,
    ConversationPhase::TransformingName,
    ConversationPhase::DeeperReveal,
    ConversationPhase::BirthdayReveal,
    ConversationPhase::OracleQuestion2,
    ConversationPhase::RelationshipHook,
    ConversationPhase::CollectingOtherDob,
    ConversationPhase::CalculatingCompatibility,
    ConversationPhase::CompatibilityTease,
    ConversationPhase::OracleQuestion3,
    ConversationPhase::CollectingEmail,
    ConversationPhase::FinalHook,
    ConversationPhase::Paywall,
    ConversationPhase::PersonalPaywall,
    ConversationPhase::ProcessingPayment,
    ConversationPhase::PaidReading,
];

impl ConversationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::CosmicAttunement => "cosmic_attunement",
            Self::CollectingDob => "collecting_dob",
            Self::CalculatingLifePath => "calculating_life_path",
            Self::FirstReveal => "first_reveal",
            Self::LifePathMeaning => "life_path_meaning",
            Self::OracleQuestion1 => "oracle_question_1",
            Self::CollectingName => "collecting_name",
            Self::TransformingName => "transforming_name",
            Self::DeeperReveal => "deeper_reveal",
            Self::BirthdayReveal => "birthday_reveal",
            Self::OracleQuestion2 => "oracle_question_2",
            Self::RelationshipHook => "relationship_hook",
            Self::CollectingOtherDob => "collecting_other_dob",
            Self::CalculatingCompatibility => "calculating_compatibility",
            Self::CompatibilityTease => "compatibility_tease",
            Self::OracleQuestion3 => "oracle_question_3",
            Self::CollectingEmail => "collecting_email",
            Self::FinalHook => "final_hook",
            Self::Paywall => "paywall",
            Self::PersonalPaywall => "personal_paywall",
            Self::ProcessingPayment => "processing_payment",
            Self::PaidReading => "paid_reading",
        }
    }

    /// The per-phase UI/validation contract. Total by construction.
    pub fn config(&self) -> PhaseConfig {
        match self {
            Self::Opening | Self::CosmicAttunement => narration(),
            Self::CollectingDob => collecting(
                InputType::Date,
                ValidationType::Date,
                "Month, day, year of your birth...",
            ),
            Self::CalculatingLifePath => narration(),
            Self::FirstReveal | Self::LifePathMeaning => narration(),
            Self::OracleQuestion1 => question(),
            Self::CollectingName => collecting(
                InputType::Name,
                ValidationType::Name,
                "The full name you were given...",
            ),
            Self::TransformingName | Self::DeeperReveal | Self::BirthdayReveal => narration(),
            Self::OracleQuestion2 => question(),
            Self::RelationshipHook => collecting(
                InputType::Name,
                ValidationType::Name,
                "Their first name is enough...",
            ),
            Self::CollectingOtherDob => collecting(
                InputType::Date,
                ValidationType::Date,
                "The day they came into this world...",
            ),
            Self::CalculatingCompatibility | Self::CompatibilityTease => narration(),
            Self::OracleQuestion3 => question(),
            Self::CollectingEmail => collecting(
                InputType::Email,
                ValidationType::Email,
                "Where shall the reading find you?",
            ),
            Self::FinalHook => narration(),
            Self::Paywall | Self::PersonalPaywall => PhaseConfig {
                show_input: false,
                show_suggestions: false,
                input_type: InputType::None,
                placeholder: "",
                validation: ValidationType::None,
                oracle_speaking: false,
                expects_response: true,
            },
            Self::ProcessingPayment => narration(),
            Self::PaidReading => PhaseConfig {
                show_input: true,
                show_suggestions: false,
                input_type: InputType::Text,
                placeholder: "Ask the Oracle...",
                validation: ValidationType::Freeform,
                oracle_speaking: false,
                expects_response: false,
            },
        }
    }

    pub fn should_show_input(&self) -> bool {
        self.config().show_input
    }

    pub fn should_show_suggestions(&self) -> bool {
        self.config().show_suggestions
    }

    pub fn validation_type(&self) -> ValidationType {
        self.config().validation
    }

    pub fn is_oracle_speaking(&self) -> bool {
        self.config().oracle_speaking
    }

    /// Next phase in the linear order, `None` at the end. Advisory only:
    /// the orchestrator's branching logic decides real transitions.
    pub fn next(&self) -> Option<ConversationPhase> {
        let idx = PHASE_ORDER.iter().position(|p| p == self)?;
        PHASE_ORDER.get(idx + 1).copied()
    }
}
