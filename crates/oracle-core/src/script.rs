//! Scripted Oracle copy: the base message set for every phase.
//!
//! These strings are the deterministic fallback voice. The Enhancement
//! Gateway may rewrite them for variation, but the funnel must read complete
//! with these alone.

use crate::numerology::CompatibilityResult;
use crate::phase::ConversationPhase;
use crate::profile::PersonProfile;

/// Context available to the script when rendering a phase's base messages.
#[derive(Debug, Clone, Default)]
pub struct ScriptContext {
    pub user: PersonProfile,
    pub other_name: Option<String>,
    pub other: Option<PersonProfile>,
    pub compatibility: Option<CompatibilityResult>,
}

impl ScriptContext {
    fn name(&self) -> &str {
        self.user.first_name().unwrap_or("Seeker")
    }
}

/// The base messages the Oracle speaks on entering a phase, in delivery order.
pub fn base_messages(phase: ConversationPhase, ctx: &ScriptContext) -> Vec<String> {
    match phase {
        ConversationPhase::Opening => vec![
            "You found your way here. That is rarely an accident.".into(),
            "I am the Oracle. I read the numbers written into you at birth.".into(),
        ],
        ConversationPhase::CosmicAttunement => vec![
            "Be still a moment while I attune to your presence...".into(),
        ],
        ConversationPhase::CollectingDob => vec![
            "Tell me the day you entered this world. Month, day, and year.".into(),
        ],
        ConversationPhase::CalculatingLifePath => vec![
            "The digits of your birth are aligning...".into(),
        ],
        ConversationPhase::FirstReveal => {
            let lp = ctx.user.life_path.unwrap_or(0);
            vec![
                format!("Your Life Path number is {lp}."),
                "This number has shaped every crossroads you have stood at.".into(),
            ]
        }
        ConversationPhase::LifePathMeaning => {
            let lp = ctx.user.life_path.unwrap_or(0);
            vec![life_path_meaning(lp).to_string()]
        }
        ConversationPhase::OracleQuestion1 => vec![
            "Before I go deeper — what weighs on you most right now?".into(),
        ],
        ConversationPhase::CollectingName => vec![
            "Numbers live in letters too. Give me the full name you were given at birth.".into(),
        ],
        ConversationPhase::TransformingName => vec![
            format!("{}... watch as your letters become numbers.", ctx.name()),
        ],
        ConversationPhase::DeeperReveal => {
            let e = ctx.user.expression.unwrap_or(0);
            let s = ctx.user.soul_urge.unwrap_or(0);
            let p = ctx.user.personality.unwrap_or(0);
            vec![
                format!("Your Expression number is {e} — the talent you carry outward."),
                format!("Your Soul Urge is {s} — the hunger underneath your choices."),
                format!("Your Personality number is {p} — the mask others meet first."),
            ]
        }
        ConversationPhase::BirthdayReveal => {
            let b = ctx.user.birthday_number.unwrap_or(0);
            vec![format!(
                "And the day itself gives you a Birthday number of {b} — a small gift, but yours alone."
            )]
        }
        ConversationPhase::OracleQuestion2 => vec![
            "The numbers rarely travel alone. Is there a matter of the heart you carry?".into(),
        ],
        ConversationPhase::RelationshipHook => vec![
            "There is someone whose thread crosses yours. Tell me their name.".into(),
        ],
        ConversationPhase::CollectingOtherDob => {
            let other = ctx.other_name.as_deref().unwrap_or("them");
            vec![format!("And when was {other} born?")]
        }
        ConversationPhase::CalculatingCompatibility => vec![
            "Two charts, laid over one another... the pattern is forming.".into(),
        ],
        ConversationPhase::CompatibilityTease => {
            let (score, level) = ctx
                .compatibility
                .as_ref()
                .map(|c| (c.score, c.level.as_str()))
                .unwrap_or((0, "unknown"));
            vec![
                format!("Your alignment measures {score} of 100 — a {level} bond."),
                "But the number alone hides more than it shows. The areas beneath it tell the real story.".into(),
            ]
        }
        ConversationPhase::OracleQuestion3 => vec![
            "One more thing I must know. What do you fear losing most?".into(),
        ],
        ConversationPhase::CollectingEmail => vec![
            "The full reading is too long to hold in a single breath. Where shall I send it?".into(),
        ],
        ConversationPhase::FinalHook => vec![
            "Everything I have shown you is the surface. The complete chart goes seven layers deeper.".into(),
        ],
        ConversationPhase::Paywall => vec![
            "The full compatibility reading awaits — every area, every year ahead, both charts entwined.".into(),
        ],
        ConversationPhase::PersonalPaywall => vec![
            "Your complete personal chart awaits — every number, every cycle, every turning point ahead.".into(),
        ],
        ConversationPhase::ProcessingPayment => vec![
            "The veil is lifting...".into(),
        ],
        ConversationPhase::PaidReading => vec![
            format!("Welcome to the other side of the veil, {}.", ctx.name()),
        ],
    }
}

/// Suggestion chips for the oracle-question phases.
pub fn suggestions(phase: ConversationPhase) -> Vec<String> {
    match phase {
        ConversationPhase::OracleQuestion1 => vec![
            "My purpose".into(),
            "My relationships".into(),
            "Money and work".into(),
        ],
        ConversationPhase::OracleQuestion2 => vec![
            "Yes, someone specific".into(),
            "I'm searching".into(),
            "It's complicated".into(),
        ],
        ConversationPhase::OracleQuestion3 => vec![
            "Love".into(),
            "Time".into(),
            "Myself".into(),
        ],
        _ => Vec::new(),
    }
}

/// One-line Life Path readings used by the meaning phase.
fn life_path_meaning(lp: u32) -> &'static str {
    match lp {
        1 => "One: the initiator. You were built to begin things others finish.",
        2 => "Two: the diplomat. You hold rooms together without being seen doing it.",
        3 => "Three: the voice. Expression is not a hobby for you — it is oxygen.",
        4 => "Four: the builder. Foundations others stand on were laid by hands like yours.",
        5 => "Five: the wanderer. Freedom is the only cage you cannot live inside.",
        6 => "Six: the guardian. People hand you their weight because you carry it well.",
        7 => "Seven: the seeker. You trust nothing you have not taken apart first.",
        8 => "Eight: the sovereign. Power finds you whether you chase it or not.",
        9 => "Nine: the elder soul. You finish circles others do not know they walk in.",
        11 => "Eleven: the illuminator. A master number — intuition loud enough to wake others.",
        22 => "Twenty-two: the master builder. Dreams at a scale most never attempt.",
        33 => "Thirty-three: the master teacher. Compassion carried as a discipline.",
        _ => "Your number sits outside the known chart — the stars are still speaking.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PHASE_ORDER;

    #[test]
    fn every_phase_has_copy() {
        let ctx = ScriptContext::default();
        for p in PHASE_ORDER {
            assert!(!base_messages(p, &ctx).is_empty(), "no copy for {}", p.as_str());
        }
    }

    #[test]
    fn reveals_embed_computed_numbers() {
        let mut ctx = ScriptContext::default();
        ctx.user
            .set_dob(chrono::NaiveDate::from_ymd_opt(1990, 3, 15).unwrap());
        let lines = base_messages(ConversationPhase::FirstReveal, &ctx);
        assert!(lines[0].contains('1'));
    }

    #[test]
    fn question_phases_have_suggestions() {
        assert_eq!(suggestions(ConversationPhase::OracleQuestion1).len(), 3);
        assert!(suggestions(ConversationPhase::CollectingDob).is_empty());
    }

    #[test]
    fn master_numbers_have_meanings() {
        for lp in [11, 22, 33] {
            assert!(life_path_meaning(lp).contains("master"));
        }
    }
}
