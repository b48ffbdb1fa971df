//! Deadline clock: monotonic microsecond timestamps and deadline arithmetic.
//!
//! Deadlines are absolute microsecond timestamps measured from an
//! arbitrary process-local epoch (the instant this module is first
//! touched). A deadline of *infinity* is encoded as [`INFINITE`], a
//! sentinel larger than any real timestamp this process will ever
//! observe.

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// An absolute timestamp in microseconds since the process-local epoch.
pub type Micros = u64;

/// Sentinel representing "never expires".
pub const INFINITE: Micros = u64::MAX;

/// Current time in microseconds since the process-local epoch.
pub fn now() -> Micros {
    EPOCH.elapsed().as_micros() as Micros
}

/// Compute an absolute deadline `timeout` from now, or [`INFINITE`] if
/// `timeout` is `None`.
pub fn deadline_after(timeout: Option<Duration>) -> Micros {
    match timeout {
        None => INFINITE,
        Some(timeout) => now().saturating_add(timeout.as_micros() as Micros),
    }
}

/// A deadline is live (not expired) iff it is strictly greater than `now`.
/// A deadline exactly equal to `now` is already expired.
pub fn is_live(deadline: Micros, now: Micros) -> bool {
    deadline > now
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_is_always_live() {
        assert!(is_live(INFINITE, now()));
        assert!(is_live(INFINITE, Micros::MAX - 1));
    }

    #[test]
    fn equal_deadline_is_expired() {
        let t = now();
        assert!(!is_live(t, t));
    }

    #[test]
    fn past_deadline_is_expired() {
        let t = now();
        assert!(!is_live(t, t + 1));
    }

    #[test]
    fn future_deadline_is_live() {
        let t = now();
        assert!(is_live(t + 1000, t));
    }
}
