//! Frame-driven timers.
//!
//! Time only advances when the render loop calls [`TimerSupport::tick`];
//! due actions are handed back to the caller and executed on the same loop.

use std::hash::Hash;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct Throttled<A> {
    due: f64,
    seq: u64,
    action: A,
}

/// Throttling support keyed by `K`, carrying actions of type `A`.
#[derive(Debug, Clone)]
pub struct TimerSupport<K, A> {
    now: f64,
    next_seq: u64,
    throttled: FxHashMap<K, Throttled<A>>,
}

impl<K: Eq + Hash + Clone, A> TimerSupport<K, A> {
    /// Create timer support starting at the given time (ms).
    pub fn new(now: f64) -> Self {
        Self {
            now,
            next_seq: 0,
            throttled: FxHashMap::default(),
        }
    }

    /// The time of the last tick.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Schedule `action` to run once the window for `key` closes.
    ///
    /// The first call for a key opens a window of `window` ms. Calls within an
    /// open window replace the pending action; only the last one runs.
    pub fn throttle_last(&mut self, window: f64, key: K, action: A) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        match self.throttled.get_mut(&key) {
            Some(pending) => {
                pending.action = action;
                pending.seq = seq;
            }
            None => {
                self.throttled.insert(
                    key,
                    Throttled {
                        due: self.now + window,
                        seq,
                        action,
                    },
                );
            }
        }
    }

    /// Drop the pending action for a key.
    pub fn cancel(&mut self, key: &K) -> Option<A> {
        self.throttled.remove(key).map(|pending| pending.action)
    }

    /// Number of pending actions.
    pub fn pending(&self) -> usize {
        self.throttled.len()
    }

    /// Advance the clock and return every action whose window has closed,
    /// ordered by due time.
    pub fn tick(&mut self, now: f64) -> Vec<A> {
        if now > self.now {
            self.now = now;
        }
        let now = self.now;
        let mut due: Vec<Throttled<A>> = Vec::new();
        let keys_due: Vec<K> = self
            .throttled
            .iter()
            .filter(|(_, pending)| pending.due <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in keys_due {
            if let Some(pending) = self.throttled.remove(&key) {
                due.push(pending);
            }
        }
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|pending| pending.action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_last_action_in_window_runs() {
        let mut timer = TimerSupport::<&str, u32>::new(0.0);
        for value in 0..10 {
            timer.throttle_last(250.0, "range", value);
        }
        assert!(timer.tick(100.0).is_empty());
        assert_eq!(timer.tick(250.0), vec![9]);
        assert!(timer.tick(1_000.0).is_empty());
    }

    #[test]
    fn window_does_not_slide() {
        let mut timer = TimerSupport::<&str, u32>::new(0.0);
        timer.throttle_last(250.0, "range", 1);
        timer.tick(200.0);
        timer.throttle_last(250.0, "range", 2);
        assert_eq!(timer.tick(260.0), vec![2]);
    }

    #[test]
    fn keys_are_independent() {
        let mut timer = TimerSupport::<u8, &str>::new(0.0);
        timer.throttle_last(100.0, 1, "a");
        timer.throttle_last(50.0, 2, "b");
        assert_eq!(timer.tick(100.0), vec!["b", "a"]);
    }

    #[test]
    fn cancel_removes_pending() {
        let mut timer = TimerSupport::<u8, &str>::new(0.0);
        timer.throttle_last(100.0, 1, "a");
        assert_eq!(timer.cancel(&1), Some("a"));
        assert!(timer.tick(200.0).is_empty());
    }
}
