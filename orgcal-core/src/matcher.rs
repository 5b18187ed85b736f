//! Pairing source events with fetched destination events.
//!
//! Destination events live in a fixed, start-descending arena. Matching marks
//! an entry as used instead of removing it, so indices stay stable and each
//! entry is handed out at most once.

use chrono_tz::Tz;

use crate::destination::DestinationEvent;

pub struct DestinationPool {
    events: Vec<DestinationEvent>,
    live: Vec<bool>,
}

impl DestinationPool {
    /// Build a pool sorted by start, latest first. Ties keep fetch order.
    ///
    /// Date-only starts are placed at midnight in `zone`; events whose start
    /// can't be placed sort last.
    pub fn new(mut events: Vec<DestinationEvent>, zone: Tz) -> Self {
        events.sort_by_cached_key(|e| std::cmp::Reverse(e.start.instant(zone)));
        let live = vec![true; events.len()];
        DestinationPool { events, live }
    }

    /// Take the first live event matching by nonce, or by summary if the
    /// source has no nonce. A source with a nonce never matches by summary.
    pub fn claim(&mut self, nonce: Option<&str>, summary: &str) -> Option<DestinationEvent> {
        let index = match nonce {
            Some(nonce) => self.position(|e| e.nonce() == Some(nonce)),
            None => self.position(|e| e.summary == summary),
        }?;

        self.live[index] = false;
        Some(self.events[index].clone())
    }

    fn position(&self, predicate: impl Fn(&DestinationEvent) -> bool) -> Option<usize> {
        self.events
            .iter()
            .zip(&self.live)
            .position(|(event, live)| *live && predicate(event))
    }

    /// Events not claimed so far, in pool order.
    pub fn remaining(&self) -> impl Iterator<Item = &DestinationEvent> {
        self.events
            .iter()
            .zip(&self.live)
            .filter(|(_, live)| **live)
            .map(|(event, _)| event)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
