//! Validation / Redirect Generator: mystical-voice copy for rejected input.
//!
//! The fallback set is chosen by `(error code, expected input)` from a static
//! table; the Enhancement Gateway may rewrite it, and every gateway failure
//! path resolves back to the fallback set. A raw technical error string never
//! reaches the visitor.

use crate::dateparse::DateErrorCode;
use crate::enhance::{EnhanceClient, EnhanceContext, EnhanceMode, EnhanceRequest, ValidationDetail};
use crate::phase::ConversationPhase;
use crate::profile::{ExpectedInput, ValidationCode, ValidationError};
use tracing::debug;

/// Everything the generator needs to produce redirect copy.
#[derive(Debug, Clone)]
pub struct RedirectRequest {
    pub phase: ConversationPhase,
    pub error: ValidationError,
    pub user_name: Option<String>,
    pub life_path: Option<u32>,
}

/// Fallback copy for a `(code, expected)` pair. Returns `None` for pairs the
/// table does not cover; callers then use the generic two-line fallback.
fn table_entry(code: ValidationCode, expected: ExpectedInput) -> Option<Vec<String>> {
    use ExpectedInput as E;
    use ValidationCode as C;
    let lines: &[&str] = match (code, expected) {
        (C::Date(DateErrorCode::EmptyInput), E::Date) | (C::EmptyInput, E::Date) => &[
            "The stars cannot read silence.",
            "Offer me the day of your birth, as you would speak it: March 15, 1990.",
        ],
        (C::Date(DateErrorCode::InvalidFormat), E::Date) => &[
            "Those marks do not form a date I can read.",
            "Try the shape of it plainly: March 15, 1990 — or 3/15/1990.",
        ],
        (C::Date(DateErrorCode::InvalidMonth), E::Date) => &[
            "There are twelve months beneath these stars, no more.",
            "Name one of them, with its day and year.",
        ],
        (C::Date(DateErrorCode::InvalidDay), E::Date) => &[
            "No month carries so many days.",
            "Look once more at the day you were given.",
        ],
        (C::Date(DateErrorCode::InvalidYear), E::Date) => &[
            "That year lies beyond my sight.",
            "I read lives begun after 1900, and none not yet lived.",
        ],
        (C::Date(DateErrorCode::ImpossibleDate), E::Date) => &[
            "That day never dawned in that month.",
            "The calendar itself refuses it. Speak your true birth date.",
        ],
        (C::Date(DateErrorCode::FutureDate), E::Date) => &[
            "You offer me a day that has not yet come.",
            "I read what the past has written, not the unborn future.",
        ],
        (C::EmptyInput, E::Name) => &[
            "A name unspoken carries no numbers.",
            "Give me the name you were called at birth.",
        ],
        (C::TooShort, E::Name) => &[
            "So few letters hold so little of you.",
            "Offer the full name written on your first day.",
        ],
        (C::InvalidCharacters, E::Name) => &[
            "I read letters, not sigils.",
            "Your name, as it was given — letters alone.",
        ],
        (C::EmptyInput, E::Email) => &[
            "The reading must travel somewhere.",
            "Leave me the address where it may find you.",
        ],
        (C::InvalidFormat, E::Email) => &[
            "That address would be lost between worlds.",
            "Give it whole, as in: seeker@example.com.",
        ],
        (C::OffTopic, E::Freeform) => &[
            "I hear you, and the numbers hear you too.",
            "But first, answer what the stars have asked.",
        ],
        _ => return None,
    };
    Some(lines.iter().map(|s| s.to_string()).collect())
}

/// Generic two-line fallback for pairs outside the table.
fn generic_fallback() -> Vec<String> {
    vec![
        "The currents blurred your words before they reached me.".to_string(),
        "Let us try once more, plainly.".to_string(),
    ]
}

/// The deterministic fallback copy for a redirect, table-first.
pub fn fallback_messages(request: &RedirectRequest) -> Vec<String> {
    table_entry(request.error.code, request.error.expected).unwrap_or_else(generic_fallback)
}

/// Produce the redirect copy to display, enhancement-first.
///
/// With no client configured, or on any gateway failure, the fallback set is
/// returned unchanged. The phase does not advance either way; that is the
/// orchestrator's contract, not this function's concern.
pub async fn generate_redirect(
    client: Option<&EnhanceClient>,
    request: &RedirectRequest,
) -> Vec<String> {
    let base = fallback_messages(request);
    let Some(client) = client else {
        return base;
    };
    debug!(
        target: "oracle::redirect",
        code = request.error.code.as_str(),
        phase = request.phase.as_str(),
        "generating redirect copy"
    );
    let enhance_request = EnhanceRequest {
        mode: EnhanceMode::Validation,
        context: EnhanceContext {
            life_path: request.life_path,
            user_name: request.user_name.clone(),
            ..Default::default()
        },
        phase: request.phase.as_str().to_string(),
        base_messages: base.clone(),
        user_input: Some(request.error.original_input.clone()),
        validation: Some(ValidationDetail {
            error_code: request.error.code.as_str().to_string(),
            original_input: request.error.original_input.clone(),
            expected_input: request.error.expected.as_str().to_string(),
        }),
        suggestions: None,
    };
    let messages = client.enhance(&enhance_request).await;
    if messages.is_empty() {
        base
    } else {
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect(code: ValidationCode, expected: ExpectedInput) -> RedirectRequest {
        RedirectRequest {
            phase: ConversationPhase::CollectingDob,
            error: ValidationError::new(code, "whatever", expected),
            user_name: None,
            life_path: None,
        }
    }

    #[test]
    fn table_covers_all_date_codes() {
        for code in [
            DateErrorCode::EmptyInput,
            DateErrorCode::InvalidFormat,
            DateErrorCode::InvalidMonth,
            DateErrorCode::InvalidDay,
            DateErrorCode::InvalidYear,
            DateErrorCode::ImpossibleDate,
            DateErrorCode::FutureDate,
        ] {
            let msgs = fallback_messages(&redirect(ValidationCode::Date(code), ExpectedInput::Date));
            assert!(msgs.len() >= 2, "no table entry for {code:?}");
        }
    }

    #[test]
    fn uncovered_pair_gets_generic_two_liner() {
        let msgs = fallback_messages(&redirect(ValidationCode::OffTopic, ExpectedInput::Email));
        assert_eq!(msgs, generic_fallback());
        assert_eq!(msgs.len(), 2);
    }

    #[tokio::test]
    async fn no_client_returns_fallback_verbatim() {
        let req = redirect(
            ValidationCode::Date(DateErrorCode::ImpossibleDate),
            ExpectedInput::Date,
        );
        let msgs = generate_redirect(None, &req).await;
        assert_eq!(msgs, fallback_messages(&req));
    }

    #[tokio::test]
    async fn dead_client_returns_fallback_verbatim() {
        let client = EnhanceClient::new("key", "model", "http://127.0.0.1:1");
        let req = redirect(
            ValidationCode::Date(DateErrorCode::FutureDate),
            ExpectedInput::Date,
        );
        let msgs = generate_redirect(Some(&client), &req).await;
        assert_eq!(msgs, fallback_messages(&req));
    }

    #[test]
    fn copy_never_contains_technical_language() {
        for expected in [ExpectedInput::Date, ExpectedInput::Name, ExpectedInput::Email] {
            for code in [
                ValidationCode::EmptyInput,
                ValidationCode::InvalidFormat,
                ValidationCode::TooShort,
                ValidationCode::InvalidCharacters,
            ] {
                for line in fallback_messages(&redirect(code, expected)) {
                    let lower = line.to_lowercase();
                    assert!(!lower.contains("error"));
                    assert!(!lower.contains("invalid"));
                }
            }
        }
    }
}
