//! Announcement policy
//!
//! Decides whether an event is worth interrupting the operator for, and
//! what to say when it is.

use crate::event::{message_of, Event};
use rand::Rng;

/// The message the agent sends for routine idle waits; never announced
pub const IDLE_SENTINEL: &str = "Claude is waiting for your input";

/// Chance of addressing the operator by name
pub const NAME_PROBABILITY: f64 = 0.3;

const BASE_MESSAGE: &str = "Your agent needs your input";

/// Should this event be spoken?
///
/// Requires the caller's explicit opt-in and a message that is not exactly
/// the idle sentinel (case-sensitive, no normalization).
pub fn should_announce(event: &Event, enabled: bool) -> bool {
    enabled && message_of(event) != IDLE_SENTINEL
}

/// Build the sentence to speak
///
/// With a configured operator name, it is prepended with probability
/// [`NAME_PROBABILITY`]. Blank names count as unset.
pub fn build_message<R: Rng>(operator: Option<&str>, rng: &mut R) -> String {
    let draw: f64 = rng.random();
    match operator.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) if draw < NAME_PROBABILITY => format!("{}, your agent needs your input", name),
        _ => BASE_MESSAGE.to_string(),
    }
}
