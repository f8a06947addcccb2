use std::cell::RefCell;
use std::thread;
use std::time::Duration;

use tracing::debug;

/// Bounded fixed-interval polling.
///
/// - `max_attempts`: Total probes, including the first.
/// - `interval`: Wait between two probes. No wait follows the last probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    /// Standalone `:stop` and the stop step of `:hardreset`.
    pub const STOP: PollPolicy = PollPolicy {
        max_attempts: 30,
        interval: Duration::from_secs(5),
    };

    /// The stop step of `:restart`.
    pub const RESTART: PollPolicy = PollPolicy {
        max_attempts: 30,
        interval: Duration::from_secs(1),
    };

    /// Longest local wait this policy can produce.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Blocking wait between probes. Swapped for a recorder in tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Records requested waits without sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.waits.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

/// How a poll loop ended without a probe error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult<T> {
    /// The predicate held after `attempts` probes.
    Ready { value: T, attempts: u32 },
    /// Every attempt was used; `elapsed` is the time spent waiting.
    Exhausted { attempts: u32, elapsed: Duration },
}

/// Probe until `done` accepts the value or the policy runs out.
///
/// A probe error ends the loop immediately; nothing is retried.
pub fn poll_until<T, E, F, P>(
    policy: &PollPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut probe: F,
    done: P,
) -> Result<PollResult<T>, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&T) -> bool,
{
    let mut elapsed = Duration::ZERO;

    for attempt in 1..=policy.max_attempts {
        let value = probe()?;
        if done(&value) {
            return Ok(PollResult::Ready {
                value,
                attempts: attempt,
            });
        }
        if attempt < policy.max_attempts {
            debug!(
                attempt,
                max_attempts = policy.max_attempts,
                interval_ms = policy.interval.as_millis() as u64,
                "{} not ready, waiting",
                label,
            );
            sleeper.sleep(policy.interval);
            elapsed += policy.interval;
        }
    }

    Ok(PollResult::Exhausted {
        attempts: policy.max_attempts,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const FAST: PollPolicy = PollPolicy {
        max_attempts: 3,
        interval: Duration::from_millis(10),
    };

    #[test]
    fn test_poll_ready_first_try() {
        let sleeper = RecordingSleeper::new();
        let result: Result<_, ()> = poll_until(&FAST, &sleeper, "test", || Ok(42), |v| *v == 42);
        assert_eq!(
            result.unwrap(),
            PollResult::Ready {
                value: 42,
                attempts: 1
            }
        );
        assert!(sleeper.waits().is_empty());
    }

    #[test]
    fn test_poll_stops_probing_once_ready() {
        let count = Cell::new(0);
        let sleeper = RecordingSleeper::new();
        let result: Result<_, ()> = poll_until(
            &PollPolicy::RESTART,
            &sleeper,
            "test",
            || {
                count.set(count.get() + 1);
                Ok(count.get())
            },
            |v| *v == 2,
        );
        assert_eq!(
            result.unwrap(),
            PollResult::Ready {
                value: 2,
                attempts: 2
            }
        );
        assert_eq!(count.get(), 2);
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_poll_exhausts_all_attempts() {
        let count = Cell::new(0);
        let sleeper = RecordingSleeper::new();
        let result: Result<PollResult<u32>, ()> = poll_until(
            &FAST,
            &sleeper,
            "test",
            || {
                count.set(count.get() + 1);
                Ok(0)
            },
            |_| false,
        );
        assert_eq!(
            result.unwrap(),
            PollResult::Exhausted {
                attempts: 3,
                elapsed: Duration::from_millis(20)
            }
        );
        assert_eq!(count.get(), 3);
        assert_eq!(sleeper.total(), FAST.max_wait());
    }

    #[test]
    fn test_poll_probe_error_aborts() {
        let count = Cell::new(0);
        let sleeper = RecordingSleeper::new();
        let result: Result<PollResult<u32>, &str> = poll_until(
            &FAST,
            &sleeper,
            "test",
            || {
                count.set(count.get() + 1);
                Err("boom")
            },
            |_| true,
        );
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_policies_keep_distinct_intervals() {
        assert_eq!(PollPolicy::STOP.max_attempts, 30);
        assert_eq!(PollPolicy::RESTART.max_attempts, 30);
        assert_eq!(PollPolicy::STOP.interval, Duration::from_secs(5));
        assert_eq!(PollPolicy::RESTART.interval, Duration::from_secs(1));
        assert_eq!(PollPolicy::STOP.max_wait(), Duration::from_secs(145));
    }
}
