//! Narration queue: scheduled delivery steps consumed one at a time.
//!
//! The original funnel paced its narration with chained timeouts. Here the
//! schedule is explicit data: a queue of effects the session driver pops and
//! executes sequentially, so delivery stays serialized and can be cancelled
//! cleanly when the visitor leaves mid-sequence.

use super::Effect;
use std::collections::VecDeque;

/// FIFO of pending narration effects for one session.
#[derive(Debug, Default)]
pub struct NarrationQueue {
    steps: VecDeque<Effect>,
    cancelled: bool,
}

impl NarrationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of effects produced by a transition.
    pub fn schedule(&mut self, effects: Vec<Effect>) {
        if self.cancelled {
            return;
        }
        self.steps.extend(effects);
    }

    /// Next step to execute, or `None` when the queue is drained or cancelled.
    pub fn pop(&mut self) -> Option<Effect> {
        if self.cancelled {
            return None;
        }
        self.steps.pop_front()
    }

    /// Drop all pending steps and refuse further scheduling. Used when the
    /// session ends mid-sequence.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.steps.clear();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Message;
    use std::time::Duration;

    #[test]
    fn consumes_in_order() {
        let mut q = NarrationQueue::new();
        q.schedule(vec![
            Effect::Emit(Message::oracle("first")),
            Effect::Pause(Duration::from_millis(10)),
            Effect::Emit(Message::oracle("second")),
        ]);
        assert_eq!(q.len(), 3);
        match q.pop() {
            Some(Effect::Emit(m)) => assert_eq!(m.content, "first"),
            other => panic!("unexpected step: {other:?}"),
        }
        assert!(matches!(q.pop(), Some(Effect::Pause(_))));
        assert!(matches!(q.pop(), Some(Effect::Emit(_))));
        assert!(q.pop().is_none());
    }

    #[test]
    fn cancel_drops_pending_and_blocks_new_steps() {
        let mut q = NarrationQueue::new();
        q.schedule(vec![Effect::Emit(Message::oracle("pending"))]);
        q.cancel();
        assert!(q.pop().is_none());
        q.schedule(vec![Effect::Emit(Message::oracle("late"))]);
        assert!(q.is_empty());
        assert!(q.is_cancelled());
    }
}
