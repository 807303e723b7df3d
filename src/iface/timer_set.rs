use core::fmt;
use managed::ManagedSlice;

use crate::time::{Duration, Instant};

/// One-shot timers, as provided by an event loop.
///
/// A scheduled timer fires exactly once unless it is cancelled first. The
/// owner of the timers reports a firing by passing the handle back to
/// whoever scheduled it.
pub trait Timers {
    /// Arm a timer that fires `delay` from now.
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle;

    /// Disarm a timer. Cancelling a timer that already fired or was
    /// cancelled does nothing.
    fn cancel(&mut self, handle: TimerHandle);
}

/// A handle, identifying one scheduled timer.
///
/// Handles are never reused, so a stale handle can not be mistaken for a
/// newer timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct TimerHandle(usize);

impl TimerHandle {
    pub const fn new(id: usize) -> TimerHandle {
        TimerHandle(id)
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque struct with space for storing one timer.
///
/// This is public so you can use it to allocate space for storing
/// timers when creating a TimerSet.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimerStorage {
    inner: Option<Item>,
}

impl TimerStorage {
    pub const EMPTY: Self = Self { inner: None };
}

#[derive(Debug, Clone, Copy)]
struct Item {
    handle: TimerHandle,
    expires_at: Instant,
}

/// A table of one-shot timers driven by an external clock.
///
/// The event loop advances the clock with [poll](#method.poll), which hands
/// out expired timers one at a time, earliest first.
#[derive(Debug)]
pub struct TimerSet<'a> {
    timers: ManagedSlice<'a, TimerStorage>,
    now: Instant,
    next_id: usize,
}

impl<'a> TimerSet<'a> {
    /// Create a timer set using the provided storage, with the clock at `now`.
    pub fn new<TimersT>(timers: TimersT, now: Instant) -> TimerSet<'a>
    where
        TimersT: Into<ManagedSlice<'a, TimerStorage>>,
    {
        let timers = timers.into();
        TimerSet {
            timers,
            now,
            next_id: 0,
        }
    }

    /// Return the current time of the set's clock.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Return the number of armed timers.
    pub fn len(&self) -> usize {
        self.items().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `handle` is armed.
    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.expires_at(handle).is_some()
    }

    /// Return when `handle` fires, if it is armed.
    pub fn expires_at(&self, handle: TimerHandle) -> Option<Instant> {
        self.items()
            .find(|item| item.handle == handle)
            .map(|item| item.expires_at)
    }

    /// Return the earliest deadline among armed timers.
    pub fn poll_at(&self) -> Option<Instant> {
        self.items().map(|item| item.expires_at).min()
    }

    /// Advance the clock to `now` and disarm and return the earliest timer
    /// that has expired, if any.
    ///
    /// The clock never moves backwards.
    pub fn poll(&mut self, now: Instant) -> Option<TimerHandle> {
        if now > self.now {
            self.now = now;
        }
        let now = self.now;

        let slot = self
            .timers
            .iter_mut()
            .filter(|slot| matches!(slot.inner, Some(item) if item.expires_at <= now))
            .min_by_key(|slot| slot.inner.map(|item| (item.expires_at, item.handle)))?;
        let item = slot.inner.take()?;
        net_trace!("timer {}: fired at {}", item.handle, now);
        Some(item.handle)
    }

    fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.timers.iter().filter_map(|x| x.inner.as_ref())
    }
}

impl<'a> Timers for TimerSet<'a> {
    /// # Panics
    /// This function panics if the storage is fixed-size (not a `Vec`) and is full.
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        fn put(slot: &mut TimerStorage, handle: TimerHandle, expires_at: Instant) -> TimerHandle {
            net_trace!("timer {}: armed for {}", handle, expires_at);
            *slot = TimerStorage {
                inner: Some(Item { handle, expires_at }),
            };
            handle
        }

        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let expires_at = self.now + delay;

        for slot in self.timers.iter_mut() {
            if slot.inner.is_none() {
                return put(slot, handle, expires_at);
            }
        }

        match self.timers {
            ManagedSlice::Borrowed(_) => panic!("adding a timer to a full TimerSet"),
            #[cfg(feature = "alloc")]
            ManagedSlice::Owned(ref mut timers) => {
                timers.push(TimerStorage::EMPTY);
                let index = timers.len() - 1;
                put(&mut timers[index], handle, expires_at)
            }
        }
    }

    fn cancel(&mut self, handle: TimerHandle) {
        for slot in self.timers.iter_mut() {
            if matches!(slot.inner, Some(item) if item.handle == handle) {
                net_trace!("timer {}: cancelled", handle);
                slot.inner = None;
                return;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fire_in_deadline_order() {
        let mut timers = TimerSet::new(vec![], Instant::ZERO);
        let late = timers.schedule_once(Duration::from_secs(5));
        let early = timers.schedule_once(Duration::from_secs(1));
        assert_eq!(timers.len(), 2);
        assert_eq!(timers.poll_at(), Some(Instant::from_secs(1)));

        assert_eq!(timers.poll(Instant::from_millis(999)), None);
        assert_eq!(timers.poll(Instant::from_secs(10)), Some(early));
        assert_eq!(timers.poll(Instant::from_secs(10)), Some(late));
        assert_eq!(timers.poll(Instant::from_secs(10)), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerSet::new(vec![], Instant::ZERO);
        let handle = timers.schedule_once(Duration::from_secs(1));
        assert!(timers.is_armed(handle));
        timers.cancel(handle);
        assert!(!timers.is_armed(handle));
        assert_eq!(timers.poll(Instant::from_secs(2)), None);

        // Cancelling twice is harmless.
        timers.cancel(handle);
    }

    #[test]
    fn test_handles_not_reused() {
        let mut timers = TimerSet::new(vec![], Instant::ZERO);
        let first = timers.schedule_once(Duration::from_secs(1));
        timers.cancel(first);
        let second = timers.schedule_once(Duration::from_secs(1));
        assert_ne!(first, second);
        assert_eq!(format!("{second}"), "#1");

        // Cancelling the stale handle leaves the new timer armed.
        timers.cancel(first);
        assert!(timers.is_armed(second));
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut timers = TimerSet::new(vec![], Instant::from_secs(10));
        assert_eq!(timers.poll(Instant::from_secs(5)), None);
        assert_eq!(timers.now(), Instant::from_secs(10));
        let handle = timers.schedule_once(Duration::from_secs(1));
        assert_eq!(timers.expires_at(handle), Some(Instant::from_secs(11)));
    }

    #[test]
    fn test_borrowed_storage() {
        let mut storage = [TimerStorage::EMPTY; 1];
        let mut timers = TimerSet::new(&mut storage[..], Instant::ZERO);
        let handle = timers.schedule_once(Duration::from_secs(1));
        assert_eq!(timers.poll(Instant::from_secs(1)), Some(handle));
        // The slot is free again.
        let _ = timers.schedule_once(Duration::from_secs(1));
    }

    #[test]
    #[should_panic(expected = "adding a timer to a full TimerSet")]
    fn test_borrowed_storage_full() {
        let mut storage = [TimerStorage::EMPTY; 1];
        let mut timers = TimerSet::new(&mut storage[..], Instant::ZERO);
        let _ = timers.schedule_once(Duration::from_secs(1));
        let _ = timers.schedule_once(Duration::from_secs(1));
    }
}
