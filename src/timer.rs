//! Virtual monotonic timer facility
//!
//! All waiting in the crate is expressed as timer-scheduled continuations.
//! [`Timers`] keeps a virtual clock in milliseconds and a queue of one-shot
//! and fixed-period timers, each carrying a payload that tells the driver
//! which continuation to run. Owners keep the returned [`TimerHandle`] and
//! cancel it on teardown; nothing fires after cancellation.
//!
//! The driver loop looks like:
//!
//! ```
//! use reward_reveal::timer::Timers;
//!
//! let mut timers: Timers<&str> = Timers::new();
//! let blink = timers.set_interval(100, "blink");
//! timers.set_timeout(250, "done");
//!
//! let mut fired = Vec::new();
//! while let Some(due) = timers.pop_due(300) {
//!     fired.push((due.at, due.payload));
//!     if due.payload == "done" {
//!         timers.cancel(blink);
//!     }
//! }
//! timers.advance_to(300);
//!
//! assert_eq!(fired, vec![(100, "blink"), (200, "blink"), (250, "done")]);
//! assert!(timers.is_empty());
//! ```

use std::collections::{BTreeMap, HashMap};

/// Virtual time in milliseconds.
pub type Millis = u64;

/// Handle to a scheduled timer. Cancel it through the [`Timers`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    /// Queue key currently holding this timer
    key: (Millis, u64),
    /// Repeat period for intervals, `None` for one-shot timeouts
    period: Option<Millis>,
    payload: T,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Due<T> {
    pub handle: TimerHandle,
    /// Deadline the timer fired at; the clock has been advanced to it
    pub at: Millis,
    pub payload: T,
    /// Whether the timer is still scheduled (intervals re-arm themselves)
    pub repeating: bool,
}

/// Timer queue over a virtual clock.
///
/// Timers fire in deadline order; timers sharing a deadline fire in the order
/// they were (re)armed.
#[derive(Debug, Clone)]
pub struct Timers<T> {
    now: Millis,
    next_id: u64,
    next_seq: u64,
    entries: HashMap<u64, Entry<T>>,
    queue: BTreeMap<(Millis, u64), u64>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timers<T> {
    /// Create an empty timer queue with the clock at zero.
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            next_seq: 0,
            entries: HashMap::new(),
            queue: BTreeMap::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Number of outstanding timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule `payload` to fire once after `delay` milliseconds.
    pub fn set_timeout(&mut self, delay: Millis, payload: T) -> TimerHandle {
        self.arm(delay, None, payload)
    }

    /// Schedule `payload` to fire every `period` milliseconds until canceled.
    ///
    /// A zero period is clamped to 1 ms so the queue always makes progress.
    pub fn set_interval(&mut self, period: Millis, payload: T) -> TimerHandle {
        let period = period.max(1);
        self.arm(period, Some(period), payload)
    }

    /// Cancel a timer. Returns `false` if it already fired or was canceled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.remove(&handle.0) {
            Some(entry) => {
                self.queue.remove(&entry.key);
                true
            }
            None => false,
        }
    }

    /// Whether `handle` is still scheduled.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle.0)
    }

    /// Deadline of the earliest outstanding timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.queue.keys().next().map(|&(at, _)| at)
    }

    /// Move the clock forward without firing anything.
    ///
    /// The clock never runs backwards; earlier targets are ignored.
    pub fn advance_to(&mut self, at: Millis) {
        self.now = self.now.max(at);
    }

    fn arm(&mut self, delay: Millis, period: Option<Millis>, payload: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let key = self.enqueue(self.now.saturating_add(delay), id);
        self.entries.insert(id, Entry { key, period, payload });
        TimerHandle(id)
    }

    fn enqueue(&mut self, at: Millis, id: u64) -> (Millis, u64) {
        let key = (at, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(key, id);
        key
    }
}

impl<T: Clone> Timers<T> {
    /// Pop the earliest timer due at or before `until`.
    ///
    /// Advances the clock to the timer's deadline. One-shot timers are
    /// removed; intervals are re-armed one period later.
    pub fn pop_due(&mut self, until: Millis) -> Option<Due<T>> {
        let (&key, &id) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        self.queue.remove(&key);
        self.now = self.now.max(key.0);

        let period = self.entries.get(&id)?.period;
        let (payload, repeating) = match period {
            Some(period) => {
                let next = self.enqueue(key.0.saturating_add(period), id);
                let entry = self.entries.get_mut(&id)?;
                entry.key = next;
                (entry.payload.clone(), true)
            }
            None => (self.entries.remove(&id)?.payload, false),
        };

        Some(Due { handle: TimerHandle(id), at: key.0, payload, repeating })
    }
}
