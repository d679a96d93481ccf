//! Conversation Orchestrator: the funnel's state machine.
//!
//! Modeled as a pure transition function `(state, event) -> (state', effects)`
//! so the whole funnel is unit-testable without a UI or network. The session
//! driver (gateway side) owns applying effects: recording messages, resolving
//! redirects through the Enhancement Gateway, pacing narration, and speech.
//!
//! Parse failures never raise. They become a `Redirect` effect and the phase
//! does not advance; a visitor may loop in a collection phase indefinitely.

pub mod narration;

use crate::dateparse::{self};
use crate::numerology::{self, CompatibilityResult, Jitter};
use crate::phase::ConversationPhase;
use crate::profile::{
    validate_email, validate_name, ExpectedInput, Message, MessageKind, PersonProfile,
    ValidationCode, ValidationError,
};
use crate::redirect::RedirectRequest;
use crate::script::{self, ScriptContext};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub use narration::NarrationQueue;

/// Simulated purchase settlement delay. No real payment gateway; not retried,
/// not reversible.
const PURCHASE_SETTLE: Duration = Duration::from_millis(2200);

/// Full per-session state. In-memory only, one per browser session, never
/// persisted. The transition function takes it by reference and returns the
/// successor state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: ConversationPhase,
    pub user: PersonProfile,
    pub other_name: Option<String>,
    pub other: Option<PersonProfile>,
    pub compatibility: Option<CompatibilityResult>,
    /// Pause between sequential Oracle messages, ms.
    pub pacing_ms: u64,
    /// Compatibility jitter mode (seeded vs. re-rolled), fixed at creation.
    #[serde(skip, default)]
    pub jitter: Jitter,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(900, Jitter::Reroll)
    }
}

impl SessionState {
    pub fn new(pacing_ms: u64, jitter: Jitter) -> Self {
        Self {
            phase: ConversationPhase::Opening,
            user: PersonProfile::default(),
            other_name: None,
            other: None,
            compatibility: None,
            pacing_ms,
            jitter,
        }
    }

    fn script_context(&self) -> ScriptContext {
        ScriptContext {
            user: self.user.clone(),
            other_name: self.other_name.clone(),
            other: self.other.clone(),
            compatibility: self.compatibility.clone(),
        }
    }

    fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// What can happen to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum OracleEvent {
    /// The visitor submitted text.
    UserInput(String),
    /// A timer or completed narration requests the next system phase.
    Advance,
    /// The visitor clicked through the (simulated) purchase.
    Purchase,
}

/// Side effects the driver executes in order, one at a time.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append this message to the transcript and deliver it.
    Emit(Message),
    /// Wait before the next effect (narration pacing, settlement delay).
    Pause(Duration),
    /// Resolve redirect copy (enhancement-first) and deliver it as Oracle
    /// messages. The phase has not advanced.
    Redirect(RedirectRequest),
}

/// The pure transition function. Never fails; invalid input degrades to a
/// redirect effect with the phase unchanged.
pub fn transition(state: &SessionState, event: OracleEvent) -> (SessionState, Vec<Effect>) {
    match event {
        OracleEvent::UserInput(text) => on_user_input(state, text),
        OracleEvent::Advance => on_advance(state),
        OracleEvent::Purchase => on_purchase(state),
    }
}

/// Enter `target`: set the phase and script its base messages, interleaved
/// with pacing pauses. Message kinds follow the phase's widget.
fn enter(state: &mut SessionState, target: ConversationPhase, effects: &mut Vec<Effect>) {
    debug!(target: "oracle::orchestrator", from = state.phase.as_str(), to = target.as_str(), "phase transition");
    state.phase = target;
    let kind = message_kind_for(target);
    let ctx = state.script_context();
    for content in script::base_messages(target, &ctx) {
        effects.push(Effect::Emit(Message::new(kind, content)));
        effects.push(Effect::Pause(state.pacing()));
    }
}

fn message_kind_for(phase: ConversationPhase) -> MessageKind {
    match phase {
        ConversationPhase::CalculatingLifePath | ConversationPhase::CalculatingCompatibility => {
            MessageKind::Calculation
        }
        ConversationPhase::TransformingName => MessageKind::LetterTransform,
        ConversationPhase::FirstReveal
        | ConversationPhase::DeeperReveal
        | ConversationPhase::BirthdayReveal => MessageKind::NumberReveal,
        _ => MessageKind::Oracle,
    }
}

fn redirect_effect(state: &SessionState, error: ValidationError) -> Effect {
    Effect::Redirect(RedirectRequest {
        phase: state.phase,
        error,
        user_name: state.user.first_name().map(String::from),
        life_path: state.user.life_path,
    })
}

fn on_user_input(state: &SessionState, text: String) -> (SessionState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = vec![Effect::Emit(Message::user(text.clone()))];

    match state.phase {
        ConversationPhase::CollectingDob => match dateparse::parse_date_string(&text) {
            Ok(parsed) => {
                next.user.set_dob(parsed.date);
                enter(&mut next, ConversationPhase::CalculatingLifePath, &mut effects);
            }
            Err(e) => {
                let error = ValidationError::new(
                    ValidationCode::Date(e.code),
                    &text,
                    ExpectedInput::Date,
                );
                effects.push(redirect_effect(state, error));
            }
        },

        ConversationPhase::CollectingName => match validate_name(&text) {
            Ok(()) => {
                next.user.set_full_name(&text);
                enter(&mut next, ConversationPhase::TransformingName, &mut effects);
            }
            Err(error) => effects.push(redirect_effect(state, error)),
        },

        ConversationPhase::RelationshipHook => match validate_name(&text) {
            Ok(()) => {
                next.other_name = Some(text.trim().to_string());
                enter(&mut next, ConversationPhase::CollectingOtherDob, &mut effects);
            }
            Err(error) => effects.push(redirect_effect(state, error)),
        },

        ConversationPhase::CollectingOtherDob => match dateparse::parse_date_string(&text) {
            Ok(parsed) => {
                let mut other = PersonProfile {
                    full_name: next.other_name.clone(),
                    ..Default::default()
                };
                other.set_dob(parsed.date);
                let (Some(lp1), Some(lp2)) = (next.user.life_path, other.life_path) else {
                    // Unreachable through the phase graph; treat as fatal contract breach.
                    error!(target: "oracle::orchestrator", "compatibility requested before life paths were derived");
                    return (next, effects);
                };
                next.compatibility =
                    Some(numerology::calculate_compatibility_with(lp1, lp2, state.jitter));
                next.other = Some(other);
                enter(&mut next, ConversationPhase::CalculatingCompatibility, &mut effects);
            }
            Err(e) => {
                let error = ValidationError::new(
                    ValidationCode::Date(e.code),
                    &text,
                    ExpectedInput::Date,
                );
                effects.push(redirect_effect(state, error));
            }
        },

        ConversationPhase::CollectingEmail => match validate_email(&text) {
            Ok(()) => {
                next.user.email = Some(text.trim().to_string());
                enter(&mut next, ConversationPhase::FinalHook, &mut effects);
            }
            Err(error) => effects.push(redirect_effect(state, error)),
        },

        ConversationPhase::OracleQuestion1
        | ConversationPhase::OracleQuestion2
        | ConversationPhase::OracleQuestion3 => {
            if text.trim().is_empty() {
                let error =
                    ValidationError::new(ValidationCode::EmptyInput, &text, ExpectedInput::Freeform);
                effects.push(redirect_effect(state, error));
            } else {
                effects.push(Effect::Emit(Message::oracle(
                    "The numbers heard you. Hold that close.",
                )));
                effects.push(Effect::Pause(state.pacing()));
                if let Some(target) = state.phase.next() {
                    enter(&mut next, target, &mut effects);
                }
            }
        }

        ConversationPhase::PaidReading => {
            // Absorbing state: acknowledge and stay.
            effects.push(Effect::Emit(Message::oracle(
                "The full chart is open before you. Ask, and I will read.",
            )));
        }

        _ => {
            // Any other phase treats text as off-topic: acknowledge and
            // redirect to the expected input, no state change.
            let error =
                ValidationError::new(ValidationCode::OffTopic, &text, ExpectedInput::Freeform);
            effects.push(redirect_effect(state, error));
        }
    }

    (next, effects)
}

fn on_advance(state: &SessionState) -> (SessionState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    let config = state.phase.config();
    if config.show_input || config.expects_response {
        // Input-driven phases ignore timer advances.
        return (next, effects);
    }

    let target = match state.phase {
        // The funnel branches after the final hook: a second party means the
        // compatibility paywall, otherwise the personal one.
        ConversationPhase::FinalHook => {
            if state.other.is_some() {
                ConversationPhase::Paywall
            } else {
                ConversationPhase::PersonalPaywall
            }
        }
        phase => match phase.next() {
            Some(p) => p,
            None => return (next, effects),
        },
    };

    enter(&mut next, target, &mut effects);
    (next, effects)
}

fn on_purchase(state: &SessionState) -> (SessionState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();
    match state.phase {
        ConversationPhase::Paywall | ConversationPhase::PersonalPaywall => {
            effects.push(Effect::Pause(PURCHASE_SETTLE));
            enter(&mut next, ConversationPhase::ProcessingPayment, &mut effects);
        }
        _ => {}
    }
    (next, effects)
}

/// Open a fresh session: emit the opening narration and settle at the first
/// phase that waits on the visitor (collecting the birth date).
pub fn start(pacing_ms: u64, jitter: Jitter) -> (SessionState, Vec<Effect>) {
    let state = SessionState::new(pacing_ms, jitter);
    let mut effects = Vec::new();
    let kind = message_kind_for(state.phase);
    let ctx = state.script_context();
    for content in script::base_messages(state.phase, &ctx) {
        effects.push(Effect::Emit(Message::new(kind, content)));
        effects.push(Effect::Pause(state.pacing()));
    }
    let (settled, rest) = advance_to_rest(state);
    effects.extend(rest);
    (settled, effects)
}

/// Drive timer advances until the funnel reaches a phase that waits on the
/// visitor. Returns the settled state and all accumulated effects.
pub fn advance_to_rest(state: SessionState) -> (SessionState, Vec<Effect>) {
    let mut state = state;
    let mut all = Vec::new();
    loop {
        let config = state.phase.config();
        if config.show_input || config.expects_response {
            return (state, all);
        }
        let (next, effects) = transition(&state, OracleEvent::Advance);
        if effects.is_empty() && next.phase == state.phase {
            return (next, all);
        }
        all.extend(effects);
        state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect;

    fn at(phase: ConversationPhase) -> SessionState {
        let mut s = SessionState::new(0, Jitter::Flat);
        s.phase = phase;
        s
    }

    fn emitted(effects: &[Effect]) -> Vec<&Message> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn user_messages(effects: &[Effect]) -> usize {
        emitted(effects)
            .iter()
            .filter(|m| m.kind == MessageKind::User)
            .count()
    }

    #[test]
    fn invalid_date_stays_and_redirects() {
        let state = at(ConversationPhase::CollectingDob);
        let (next, effects) =
            transition(&state, OracleEvent::UserInput("not a date".into()));
        assert_eq!(next.phase, ConversationPhase::CollectingDob);
        assert!(next.user.dob.is_none());
        assert_eq!(user_messages(&effects), 1);
        let redirects: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Redirect(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(redirects.len(), 1);
        assert!(redirect::fallback_messages(redirects[0]).len() >= 1);
    }

    #[test]
    fn valid_date_advances_and_derives() {
        let state = at(ConversationPhase::CollectingDob);
        let (next, effects) =
            transition(&state, OracleEvent::UserInput("March 15, 1990".into()));
        assert_eq!(next.phase, ConversationPhase::CalculatingLifePath);
        assert_eq!(next.user.life_path, Some(1));
        assert_eq!(next.user.birthday_number, Some(6));
        assert_eq!(user_messages(&effects), 1);
        assert!(!emitted(&effects).is_empty());
    }

    #[test]
    fn impossible_date_is_rejected() {
        let state = at(ConversationPhase::CollectingDob);
        let (next, _) = transition(&state, OracleEvent::UserInput("2/30/1990".into()));
        assert_eq!(next.phase, ConversationPhase::CollectingDob);
    }

    #[test]
    fn name_derives_three_numbers_and_advances() {
        let state = at(ConversationPhase::CollectingName);
        let (next, _) = transition(&state, OracleEvent::UserInput("Barack Obama".into()));
        assert_eq!(next.phase, ConversationPhase::TransformingName);
        assert_eq!(next.user.expression, Some(5));
        assert_eq!(next.user.soul_urge, Some(1));
        assert_eq!(next.user.personality, Some(22));
    }

    #[test]
    fn relationship_hook_records_other_name() {
        let state = at(ConversationPhase::RelationshipHook);
        let (next, _) = transition(&state, OracleEvent::UserInput("Jordan".into()));
        assert_eq!(next.phase, ConversationPhase::CollectingOtherDob);
        assert_eq!(next.other_name.as_deref(), Some("Jordan"));
        assert!(next.other.is_none());
    }

    #[test]
    fn other_dob_computes_compatibility_once() {
        let mut state = at(ConversationPhase::CollectingOtherDob);
        state.user.set_dob(chrono::NaiveDate::from_ymd_opt(1990, 3, 15).unwrap());
        state.other_name = Some("Jordan".into());
        let (next, _) = transition(&state, OracleEvent::UserInput("7/4/1992".into()));
        assert_eq!(next.phase, ConversationPhase::CalculatingCompatibility);
        let other = next.other.as_ref().unwrap();
        assert!(other.life_path.is_some());
        assert!(next.compatibility.is_some());
    }

    #[test]
    fn email_branches_to_compatibility_paywall_when_other_present() {
        let mut state = at(ConversationPhase::CollectingEmail);
        state.other = Some(PersonProfile::default());
        let (next, _) = transition(&state, OracleEvent::UserInput("a@b.com".into()));
        assert_eq!(next.phase, ConversationPhase::FinalHook);
        let (settled, _) = advance_to_rest(next);
        assert_eq!(settled.phase, ConversationPhase::Paywall);
    }

    #[test]
    fn email_branches_to_personal_paywall_otherwise() {
        let state = at(ConversationPhase::CollectingEmail);
        let (next, _) = transition(&state, OracleEvent::UserInput("a@b.com".into()));
        let (settled, _) = advance_to_rest(next);
        assert_eq!(settled.phase, ConversationPhase::PersonalPaywall);
    }

    #[test]
    fn bad_email_redirects() {
        let state = at(ConversationPhase::CollectingEmail);
        let (next, effects) = transition(&state, OracleEvent::UserInput("nope".into()));
        assert_eq!(next.phase, ConversationPhase::CollectingEmail);
        assert!(effects.iter().any(|e| matches!(e, Effect::Redirect(_))));
    }

    #[test]
    fn opening_settles_at_collecting_dob() {
        let (settled, effects) = advance_to_rest(SessionState::new(0, Jitter::Flat));
        assert_eq!(settled.phase, ConversationPhase::CollectingDob);
        assert!(!emitted(&effects).is_empty());
    }

    #[test]
    fn purchase_flows_to_paid_reading() {
        let state = at(ConversationPhase::Paywall);
        let (next, effects) = transition(&state, OracleEvent::Purchase);
        assert_eq!(next.phase, ConversationPhase::ProcessingPayment);
        assert!(effects.iter().any(|e| matches!(e, Effect::Pause(_))));
        let (settled, _) = advance_to_rest(next);
        assert_eq!(settled.phase, ConversationPhase::PaidReading);
    }

    #[test]
    fn purchase_outside_paywall_is_ignored() {
        let state = at(ConversationPhase::CollectingDob);
        let (next, effects) = transition(&state, OracleEvent::Purchase);
        assert_eq!(next.phase, ConversationPhase::CollectingDob);
        assert!(effects.is_empty());
    }

    #[test]
    fn paid_reading_absorbs_input() {
        let state = at(ConversationPhase::PaidReading);
        let (next, effects) = transition(&state, OracleEvent::UserInput("tell me more".into()));
        assert_eq!(next.phase, ConversationPhase::PaidReading);
        assert_eq!(emitted(&effects).len(), 2); // user echo + oracle ack
    }

    #[test]
    fn off_topic_text_in_narration_phase_redirects_in_place() {
        let state = at(ConversationPhase::FirstReveal);
        let (next, effects) = transition(&state, OracleEvent::UserInput("hi".into()));
        assert_eq!(next.phase, ConversationPhase::FirstReveal);
        assert!(effects.iter().any(|e| matches!(e, Effect::Redirect(_))));
    }

    #[test]
    fn advance_is_ignored_while_waiting_for_input() {
        let state = at(ConversationPhase::CollectingDob);
        let (next, effects) = transition(&state, OracleEvent::Advance);
        assert_eq!(next.phase, ConversationPhase::CollectingDob);
        assert!(effects.is_empty());
    }

    #[test]
    fn oracle_questions_advance_on_any_answer() {
        let state = at(ConversationPhase::OracleQuestion1);
        let (next, _) = transition(&state, OracleEvent::UserInput("my purpose".into()));
        assert_eq!(next.phase, ConversationPhase::CollectingName);
        let state = at(ConversationPhase::OracleQuestion1);
        let (next, effects) = transition(&state, OracleEvent::UserInput("   ".into()));
        assert_eq!(next.phase, ConversationPhase::OracleQuestion1);
        assert!(effects.iter().any(|e| matches!(e, Effect::Redirect(_))));
    }

    #[test]
    fn reveal_messages_use_reveal_kinds() {
        let mut state = at(ConversationPhase::CollectingDob);
        state.pacing_ms = 0;
        let (next, _) = transition(&state, OracleEvent::UserInput("3/15/1990".into()));
        let (_, effects) = advance_to_rest(next);
        let kinds: Vec<_> = emitted(&effects).iter().map(|m| m.kind).collect();
        assert!(kinds.contains(&MessageKind::Calculation));
        assert!(kinds.contains(&MessageKind::NumberReveal));
    }
}
