//! Session service: in-memory session store and the narration driver.
//!
//! Each session owns a [`SessionState`], an append-only transcript, and a
//! [`NarrationQueue`]. Applying an event schedules the transition's effects
//! and drains them in order: messages are recorded, redirects are resolved
//! through the Enhancement Gateway, and pauses become client-side timing
//! hints (the gateway never sleeps inside a request). Dropping a session
//! cancels its queue mid-sequence.

use dashmap::DashMap;
use oracle_core::{
    generate_redirect, start, transition, Effect, EnhanceClient, Message, NarrationQueue,
    OracleConfig, OracleEvent, PhaseConfig, SessionState,
};
use oracle_voice::estimate_speaking_duration;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// One delivered message plus its timing hints, ms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredMessage {
    #[serde(flatten)]
    pub message: Message,
    /// Estimated speaking time for caption/typing animation.
    pub speak_ms: u64,
    /// Wait before this message is shown (settlement and other lead-in delays).
    pub delay_before_ms: u64,
    /// Pause before the next message begins.
    pub pause_after_ms: u64,
}

/// Result of applying one event: the new phase's UI contract plus the
/// messages produced, in delivery order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub phase: String,
    pub ui: PhaseConfig,
    pub suggestions: Vec<String>,
    pub messages: Vec<DeliveredMessage>,
}

struct SessionEntry {
    state: SessionState,
    transcript: Vec<Message>,
    queue: NarrationQueue,
}

/// In-memory session store. Nothing survives process exit, matching the
/// per-browser-session model.
pub struct SessionService {
    config: OracleConfig,
    enhance: Option<EnhanceClient>,
    sessions: DashMap<Uuid, Arc<Mutex<SessionEntry>>>,
}

impl SessionService {
    pub fn new(config: OracleConfig, enhance: Option<EnhanceClient>) -> Self {
        Self {
            config,
            enhance,
            sessions: DashMap::new(),
        }
    }

    fn enhance_client(&self) -> Option<&EnhanceClient> {
        if self.config.enhance_enabled {
            self.enhance.as_ref()
        } else {
            None
        }
    }

    /// Open a new session and play the opening narration.
    pub async fn create(&self) -> (Uuid, TurnOutcome) {
        let (state, effects) = start(self.config.pacing_ms, self.config.jitter());
        let mut entry = SessionEntry {
            state,
            transcript: Vec::new(),
            queue: NarrationQueue::new(),
        };
        entry.queue.schedule(effects);
        let outcome = self.drain(&mut entry).await;

        let id = Uuid::new_v4();
        info!(target: "oracle::session", session = %id, "session opened");
        self.sessions.insert(id, Arc::new(Mutex::new(entry)));
        (id, outcome)
    }

    /// Apply one event to a session. `None` when the session is unknown.
    pub async fn apply(&self, id: Uuid, event: OracleEvent) -> Option<TurnOutcome> {
        let entry = self.sessions.get(&id)?.clone();
        let mut entry = entry.lock().await;
        let (next, effects) = transition(&entry.state, event);
        entry.state = next;
        entry.queue.schedule(effects);

        // Settle through any system phases the event unlocked.
        let (settled, more) = oracle_core::advance_to_rest(entry.state.clone());
        entry.state = settled;
        entry.queue.schedule(more);

        Some(self.drain(&mut entry).await)
    }

    /// Transcript plus current UI contract, for reconnecting clients.
    pub async fn snapshot(&self, id: Uuid) -> Option<TurnOutcome> {
        let entry = self.sessions.get(&id)?.clone();
        let entry = entry.lock().await;
        Some(TurnOutcome {
            phase: entry.state.phase.as_str().to_string(),
            ui: entry.state.phase.config(),
            suggestions: oracle_core::suggestions(entry.state.phase),
            messages: entry
                .transcript
                .iter()
                .cloned()
                .map(|m| timed(m, 0, 0))
                .collect(),
        })
    }

    /// Drop a session, cancelling any narration still queued.
    pub async fn close(&self, id: Uuid) -> bool {
        let Some((_, entry)) = self.sessions.remove(&id) else {
            return false;
        };
        entry.lock().await.queue.cancel();
        debug!(target: "oracle::session", session = %id, "session closed");
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Consume queued effects in order. Redirects resolve through the
    /// enhancement client (fallback copy on any failure) and are delivered
    /// as Oracle messages against the unchanged phase. A pause that arrives
    /// before any message in the batch (the purchase settlement delay) is
    /// carried forward as the next message's lead-in delay.
    async fn drain(&self, entry: &mut SessionEntry) -> TurnOutcome {
        let mut messages: Vec<DeliveredMessage> = Vec::new();
        let mut pending_delay: u64 = 0;
        while let Some(effect) = entry.queue.pop() {
            match effect {
                Effect::Emit(message) => {
                    entry.transcript.push(message.clone());
                    messages.push(timed(message, std::mem::take(&mut pending_delay), 0));
                }
                Effect::Pause(d) => {
                    let ms = d.as_millis() as u64;
                    match messages.last_mut() {
                        Some(last) => last.pause_after_ms += ms,
                        None => pending_delay += ms,
                    }
                }
                Effect::Redirect(request) => {
                    for content in generate_redirect(self.enhance_client(), &request).await {
                        let message = Message::oracle(content);
                        entry.transcript.push(message.clone());
                        messages.push(timed(
                            message,
                            std::mem::take(&mut pending_delay),
                            self.config.pacing_ms,
                        ));
                    }
                }
            }
        }
        TurnOutcome {
            phase: entry.state.phase.as_str().to_string(),
            ui: entry.state.phase.config(),
            suggestions: oracle_core::suggestions(entry.state.phase),
            messages,
        }
    }
}

fn timed(message: Message, delay_before_ms: u64, pause_after_ms: u64) -> DeliveredMessage {
    let speak_ms = estimate_speaking_duration(&message.content).as_millis() as u64;
    DeliveredMessage {
        message,
        speak_ms,
        delay_before_ms,
        pause_after_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_core::{ConversationPhase, MessageKind};

    fn service() -> SessionService {
        let mut config = OracleConfig::default();
        config.jitter_mode = "flat".into();
        config.pacing_ms = 0;
        SessionService::new(config, None)
    }

    #[tokio::test]
    async fn create_opens_at_collecting_dob() {
        let svc = service();
        let (_, outcome) = svc.create().await;
        assert_eq!(outcome.phase, "collecting_dob");
        assert!(outcome.ui.show_input);
        assert!(!outcome.messages.is_empty());
    }

    #[tokio::test]
    async fn invalid_date_keeps_phase_and_emits_redirect() {
        let svc = service();
        let (id, _) = svc.create().await;
        let outcome = svc
            .apply(id, OracleEvent::UserInput("gibberish".into()))
            .await
            .unwrap();
        assert_eq!(outcome.phase, "collecting_dob");
        let user_count = outcome
            .messages
            .iter()
            .filter(|m| m.message.kind == MessageKind::User)
            .count();
        assert_eq!(user_count, 1);
        // user echo + at least one redirect line
        assert!(outcome.messages.len() >= 2);
    }

    #[tokio::test]
    async fn full_funnel_reaches_paid_reading() {
        let svc = service();
        let (id, _) = svc.create().await;
        let say = |text: &str| OracleEvent::UserInput(text.to_string());

        let o = svc.apply(id, say("March 15, 1990")).await.unwrap();
        assert_eq!(o.phase, ConversationPhase::OracleQuestion1.as_str());
        let o = svc.apply(id, say("my purpose")).await.unwrap();
        assert_eq!(o.phase, "collecting_name");
        let o = svc.apply(id, say("Ada Lovelace")).await.unwrap();
        assert_eq!(o.phase, "oracle_question_2");
        let o = svc.apply(id, say("yes, someone")).await.unwrap();
        assert_eq!(o.phase, "relationship_hook");
        let o = svc.apply(id, say("Jordan")).await.unwrap();
        assert_eq!(o.phase, "collecting_other_dob");
        let o = svc.apply(id, say("7/4/1992")).await.unwrap();
        assert_eq!(o.phase, "oracle_question_3");
        let o = svc.apply(id, say("time")).await.unwrap();
        assert_eq!(o.phase, "collecting_email");
        let o = svc.apply(id, say("ada@example.com")).await.unwrap();
        assert_eq!(o.phase, "paywall");
        let o = svc.apply(id, OracleEvent::Purchase).await.unwrap();
        assert_eq!(o.phase, "paid_reading");

        let snap = svc.snapshot(id).await.unwrap();
        assert!(snap.messages.len() > 10);
    }

    #[tokio::test]
    async fn purchase_settlement_delay_reaches_the_client() {
        let svc = service();
        let (id, _) = svc.create().await;
        let say = |text: &str| OracleEvent::UserInput(text.to_string());

        svc.apply(id, say("March 15, 1990")).await.unwrap();
        svc.apply(id, say("my purpose")).await.unwrap();
        svc.apply(id, say("Ada Lovelace")).await.unwrap();
        svc.apply(id, say("yes, someone")).await.unwrap();
        svc.apply(id, say("Jordan")).await.unwrap();
        svc.apply(id, say("7/4/1992")).await.unwrap();
        svc.apply(id, say("time")).await.unwrap();
        let o = svc.apply(id, say("ada@example.com")).await.unwrap();
        assert_eq!(o.phase, "paywall");

        let o = svc.apply(id, OracleEvent::Purchase).await.unwrap();
        assert_eq!(o.phase, "paid_reading");
        let max_delay = o
            .messages
            .iter()
            .map(|m| m.delay_before_ms)
            .max()
            .unwrap_or(0);
        assert!(max_delay >= 2200, "settlement delay lost: {max_delay}ms");
    }

    #[tokio::test]
    async fn close_cancels_and_forgets() {
        let svc = service();
        let (id, _) = svc.create().await;
        assert!(svc.close(id).await);
        assert!(svc.apply(id, OracleEvent::Advance).await.is_none());
        assert_eq!(svc.len(), 0);
    }
}
