//! Profile, message, and input-validation types shared across the funnel.
//!
//! A [`PersonProfile`] is write-once: the orchestrator sets each field at the
//! transition that collects it and derived numbers are computed exactly once.
//! Messages form an append-only transcript.

use crate::dateparse::DateErrorCode;
use crate::numerology;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Birth data plus cached derived numbers for one party. Used for both the
/// visitor and the other person in a compatibility reading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProfile {
    pub dob: Option<NaiveDate>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub life_path: Option<u32>,
    pub expression: Option<u32>,
    pub soul_urge: Option<u32>,
    pub personality: Option<u32>,
    pub birthday_number: Option<u32>,
}

impl PersonProfile {
    /// Set the birth date and derive Life Path + Birthday Number. No-op if a
    /// date was already recorded (dob is immutable after first entry).
    pub fn set_dob(&mut self, dob: NaiveDate) {
        if self.dob.is_some() {
            return;
        }
        self.dob = Some(dob);
        self.life_path = Some(numerology::calculate_life_path(dob));
        self.birthday_number = Some(numerology::calculate_birthday_number(dob));
    }

    /// Set the full name and derive Expression, Soul Urge, and Personality.
    pub fn set_full_name(&mut self, name: &str) {
        if self.full_name.is_some() {
            return;
        }
        self.full_name = Some(name.trim().to_string());
        self.expression = Some(numerology::calculate_expression(name));
        self.soul_urge = Some(numerology::calculate_soul_urge(name));
        self.personality = Some(numerology::calculate_personality(name));
    }

    /// First name, for addressing the visitor in copy.
    pub fn first_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
    }
}

/// Transcript entry kinds, matching the renderer's message widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Oracle,
    User,
    System,
    NumberReveal,
    Calculation,
    LetterTransform,
}

/// One transcript entry. Created by the orchestrator, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn oracle(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Oracle, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// The input category a phase expected when validation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedInput {
    Date,
    Name,
    Email,
    Freeform,
}

impl ExpectedInput {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Name => "name",
            Self::Email => "email",
            Self::Freeform => "freeform",
        }
    }
}

/// Why an input was rejected. Date-specific codes are carried through from
/// the parser; the generic codes cover name, email, and free-text checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    Date(DateErrorCode),
    EmptyInput,
    InvalidFormat,
    TooShort,
    InvalidCharacters,
    OffTopic,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date(code) => code.as_str(),
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::TooShort => "TOO_SHORT",
            Self::InvalidCharacters => "INVALID_CHARACTERS",
            Self::OffTopic => "OFF_TOPIC",
        }
    }
}

/// A rejected input: code, the offending text, and what was expected.
/// Transient: produced and consumed within one input-handling turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub code: ValidationCode,
    pub original_input: String,
    pub expected: ExpectedInput,
}

impl ValidationError {
    pub fn new(code: ValidationCode, input: &str, expected: ExpectedInput) -> Self {
        Self {
            code,
            original_input: input.to_string(),
            expected,
        }
    }
}

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("email pattern"));

/// Names need at least two letters and may carry spaces, hyphens, apostrophes,
/// and periods (initials).
pub fn validate_name(input: &str) -> Result<(), ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            ValidationCode::EmptyInput,
            input,
            ExpectedInput::Name,
        ));
    }
    let letters = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    if letters < 2 {
        return Err(ValidationError::new(
            ValidationCode::TooShort,
            input,
            ExpectedInput::Name,
        ));
    }
    let ok = trimmed
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'));
    if !ok {
        return Err(ValidationError::new(
            ValidationCode::InvalidCharacters,
            input,
            ExpectedInput::Name,
        ));
    }
    Ok(())
}

/// Conservative email shape check; anything stricter belongs to delivery.
pub fn validate_email(input: &str) -> Result<(), ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            ValidationCode::EmptyInput,
            input,
            ExpectedInput::Email,
        ));
    }
    if !EMAIL_PATTERN.is_match(trimmed) {
        return Err(ValidationError::new(
            ValidationCode::InvalidFormat,
            input,
            ExpectedInput::Email,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dob_is_write_once() {
        let mut p = PersonProfile::default();
        let first = NaiveDate::from_ymd_opt(1990, 3, 15).unwrap();
        p.set_dob(first);
        assert_eq!(p.life_path, Some(1));
        p.set_dob(NaiveDate::from_ymd_opt(1984, 11, 29).unwrap());
        assert_eq!(p.dob, Some(first));
        assert_eq!(p.life_path, Some(1));
    }

    #[test]
    fn name_sets_all_three_derived_numbers() {
        let mut p = PersonProfile::default();
        p.set_full_name("Barack Obama");
        assert_eq!(p.expression, Some(5));
        assert_eq!(p.soul_urge, Some(1));
        assert_eq!(p.personality, Some(22));
        assert_eq!(p.first_name(), Some("Barack"));
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("Ada Lovelace").is_ok());
        assert!(validate_name("Mary-Jane O'Brien").is_ok());
        assert_eq!(validate_name("").unwrap_err().code, ValidationCode::EmptyInput);
        assert_eq!(validate_name("x").unwrap_err().code, ValidationCode::TooShort);
        assert_eq!(
            validate_name("r2d2@!").unwrap_err().code,
            ValidationCode::InvalidCharacters
        );
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("seeker@example.com").is_ok());
        assert_eq!(
            validate_email("not an email").unwrap_err().code,
            ValidationCode::InvalidFormat
        );
        assert_eq!(validate_email("  ").unwrap_err().code, ValidationCode::EmptyInput);
    }
}
