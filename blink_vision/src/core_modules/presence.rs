// THEORY:
// The `presence` module holds the two smallest pieces of the recognizer: the
// binary `PresenceFlag` produced once per frame, and the `PresenceWindow`, a
// bounded FIFO of the most recent flags.
//
// Key architectural principles:
// 1.  **Owned, Not Global**: A window is an ordinary value owned by exactly one
//     stepping loop. Independent streams get independent windows.
// 2.  **Match Before Evict**: The window may briefly hold `capacity` entries.
//     Eviction of the oldest entry happens only after the current step has been
//     matched, so the newest flags are always visible to the matcher.
// 3.  **No Failure Modes**: Both flags are valid input and a short window is a
//     normal state. Nothing here returns an error after construction.

use crate::core_modules::pattern_matcher::{MatchEvent, PatternMatcher};
use crate::core_modules::signature::SIGNATURE_LEN;
use crate::error::ConfigError;
use std::collections::VecDeque;
use std::fmt;

pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

/// Whether the tracked blob was found in a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceFlag {
    Present,
    Absent,
}

impl PresenceFlag {
    pub fn is_present(self) -> bool {
        self == Self::Present
    }

    /// Accepts `P`/`A` (either case) and `1`/`0`.
    pub fn from_char(c: char) -> Result<Self, ConfigError> {
        match c {
            'P' | 'p' | '1' => Ok(Self::Present),
            'A' | 'a' | '0' => Ok(Self::Absent),
            other => Err(ConfigError::InvalidFlag(other)),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Present => 'P',
            Self::Absent => 'A',
        }
    }
}

/// Parses a compact flag string such as `"PAAPAA"`. Whitespace is ignored.
pub fn parse_flags(text: &str) -> Result<Vec<PresenceFlag>, ConfigError> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(PresenceFlag::from_char)
        .collect()
}

/// A bounded, ordered history of presence flags. Oldest at the front.
#[derive(Debug, Clone)]
pub struct PresenceWindow {
    flags: VecDeque<PresenceFlag>,
    capacity: usize,
}

impl Default for PresenceWindow {
    fn default() -> Self {
        Self {
            flags: VecDeque::with_capacity(DEFAULT_WINDOW_CAPACITY),
            capacity: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

impl PresenceWindow {
    /// Creates an empty window. The capacity must leave room for a full signature.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity < SIGNATURE_LEN {
            return Err(ConfigError::WindowTooSmall {
                requested: capacity,
                minimum: SIGNATURE_LEN,
            });
        }
        Ok(Self {
            flags: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends a flag at the back. A window already holding `capacity` flags
    /// drops its oldest one first, so the length never exceeds the capacity.
    /// Within a step, `observe` evicts after matching, which keeps this from firing.
    pub fn push(&mut self, flag: PresenceFlag) {
        if self.flags.len() >= self.capacity {
            self.flags.pop_front();
        }
        self.flags.push_back(flag);
    }

    /// Drops the oldest flag once the window has reached its capacity.
    /// Returns the evicted flag, if any.
    pub fn evict_overflow(&mut self) -> Option<PresenceFlag> {
        if self.flags.len() >= self.capacity {
            self.flags.pop_front()
        } else {
            None
        }
    }

    /// One full step: append, match against the trailing entries, then evict.
    pub fn observe(&mut self, flag: PresenceFlag, matcher: &PatternMatcher, step: u64) -> Vec<MatchEvent> {
        self.push(flag);
        let matches = matcher.find_matches(self, step);
        self.evict_overflow();
        matches
    }

    /// The last `n` flags in chronological order, or `None` if fewer exist.
    pub fn trailing(&self, n: usize) -> Option<impl Iterator<Item = PresenceFlag> + '_> {
        let len = self.flags.len();
        if len < n {
            return None;
        }
        Some(self.flags.range(len - n..).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = PresenceFlag> + '_ {
        self.flags.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

}

impl fmt::Display for PresenceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in &self.flags {
            write!(f, "{}", flag.as_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PresenceFlag::{Absent as A, Present as P};
    use super::*;

    fn window_of(capacity: usize, flags: &[PresenceFlag]) -> PresenceWindow {
        let mut window = PresenceWindow::with_capacity(capacity).unwrap();
        for &flag in flags {
            window.push(flag);
        }
        window
    }

    #[test]
    fn rejects_capacity_below_signature_length() {
        let err = PresenceWindow::with_capacity(5).unwrap_err();
        assert!(matches!(err, ConfigError::WindowTooSmall { requested: 5, minimum: 6 }));
        assert!(PresenceWindow::with_capacity(6).is_ok());
    }

    #[test]
    fn default_capacity_is_twenty() {
        assert_eq!(PresenceWindow::default().capacity(), 20);
    }

    #[test]
    fn push_appends_at_the_back() {
        let window = window_of(8, &[P, A, A]);
        assert_eq!(window.to_string(), "PAA");
    }

    #[test]
    fn trailing_requires_enough_entries() {
        let window = window_of(8, &[P, A, P]);
        assert!(window.trailing(4).is_none());
        let tail: Vec<_> = window.trailing(2).unwrap().collect();
        assert_eq!(tail, vec![A, P]);
    }

    #[test]
    fn eviction_waits_for_capacity() {
        let mut window = window_of(6, &[P, A, A, P, A]);
        assert_eq!(window.evict_overflow(), None);
        window.push(A);
        assert_eq!(window.evict_overflow(), Some(P));
        assert_eq!(window.to_string(), "AAPAA");
    }

    #[test]
    fn observe_matches_before_evicting() {
        // With capacity 6 the full signature is only present between push and evict.
        let matcher = PatternMatcher::default();
        let mut window = window_of(6, &[P, A, A, P, A]);
        let events = window.observe(A, &matcher, 6);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "ALELUYA");
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn observe_drops_oldest_entries_first() {
        let matcher = PatternMatcher::default();
        let mut window = PresenceWindow::with_capacity(6).unwrap();
        let input = [P, P, A, A, P, A, P, P, A, A];
        for (i, &flag) in input.iter().enumerate() {
            window.observe(flag, &matcher, i as u64 + 1);
            assert!(window.len() <= window.capacity());
        }
        // Post-step length settles at capacity - 1 and holds the newest flags.
        assert_eq!(window.to_string(), "APPAA");
    }

    #[test]
    fn bare_pushes_stay_within_capacity() {
        let mut window = PresenceWindow::default();
        for _ in 0..24 {
            window.push(A);
        }
        window.push(P);
        assert_eq!(window.len(), window.capacity());
        assert_eq!(window.iter().last(), Some(P));
        assert_eq!(window.iter().filter(|f| *f == A).count(), 19);
    }

    #[test]
    fn bare_pushes_drop_the_oldest_flag() {
        let mut window = window_of(6, &[P, P, A, A, P, A]);
        window.push(A);
        assert_eq!(window.to_string(), "PAAPAA");
    }

    #[test]
    fn parses_compact_flag_strings() {
        assert_eq!(parse_flags("P A a 1 0").unwrap(), vec![P, A, A, P, A]);
        assert!(matches!(parse_flags("PX"), Err(ConfigError::InvalidFlag('X'))));
    }
}
