// THEORY:
// The `PatternMatcher` is the only piece of control logic in the recognizer.
// Every frame it looks back over the last six presence flags and reports each
// registered signature that equals them exactly.
//
// Key architectural principles:
// 1.  **Stateless**: The matcher owns nothing but its registry. All temporal
//     memory lives in the `PresenceWindow`, so calling it twice on the same
//     window gives the same answer, and independent streams can share nothing.
// 2.  **Guarded Lookback**: A window shorter than a signature produces no
//     events. No padding and no partial matches.
// 3.  **Exhaustive**: Every signature is checked on every step. Two patterns
//     with identical flags both fire.
// 4.  **Absence Is Normal**: Long runs of `Absent` are just another input.

use crate::core_modules::presence::PresenceWindow;
use crate::core_modules::signature::{SIGNATURE_LEN, SignatureRegistry};

/// A signature that matched the trailing window at a given step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEvent {
    pub name: String,
    pub step: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    registry: SignatureRegistry,
}

impl PatternMatcher {
    pub fn new(registry: SignatureRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SignatureRegistry {
        &self.registry
    }

    /// Compares the trailing six flags against every registered signature.
    pub fn find_matches(&self, window: &PresenceWindow, step: u64) -> Vec<MatchEvent> {
        let Some(tail) = window.trailing(SIGNATURE_LEN) else {
            return Vec::new();
        };
        let tail: Vec<_> = tail.collect();

        self.registry
            .iter()
            .filter(|signature| signature.flags()[..] == tail[..])
            .map(|signature| MatchEvent {
                name: signature.name().to_string(),
                step,
            })
            .collect()
    }
}
