pub mod session;

pub use session::{DeliveredMessage, SessionService, TurnOutcome};
