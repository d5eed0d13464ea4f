//! Single-shot deadline timer for connect attempts.
//!
//! Every connect attempt is raced against a [`DeadlineTimer`]:
//! - armed with the configured connect timeout when the attempt starts,
//! - canceled as soon as the attempt succeeds or fails on its own,
//! - when it fires first, the worker drops the pending connect future, which
//!   closes the half-open socket and counts the attempt as failed.
//!
//! The timer wraps one pinned `tokio::time::Sleep` that is reset rather than
//! reallocated.  A disarmed timer is parked far in the future and its
//! [`DeadlineTimer::expired`] future never resolves, so it can sit in a
//! `tokio::select!` branch unconditionally.
//!
//! Must be created inside a tokio runtime.

use std::future;
use std::pin::Pin;
use std::time::Duration;

use rand::Rng;
use tokio::time::{Instant, Sleep};

/// Where a disarmed timer is parked.
const FAR_FUTURE: Duration = Duration::from_secs(365 * 24 * 3600);

/// Jitter ceiling applied to reconnect delays, as a fraction (1/N) of the delay.
const JITTER_DIVISOR: u32 = 10;

pub struct DeadlineTimer {
    sleep: Pin<Box<Sleep>>,
    armed: bool,
}

impl Default for DeadlineTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineTimer {
    /// A disarmed timer.
    pub fn new() -> Self {
        Self {
            sleep: Box::pin(tokio::time::sleep(FAR_FUTURE)),
            armed: false,
        }
    }

    /// Arm (or re-arm) the timer to fire `after` from now.
    ///
    /// Anything longer than a year is clamped to a year, so huge timeouts
    /// cannot overflow `Instant`.
    pub fn arm(&mut self, after: Duration) {
        self.sleep.as_mut().reset(deadline_in(after.min(FAR_FUTURE)));
        self.armed = true;
    }

    /// Disarm the timer; a pending [`DeadlineTimer::expired`] will never fire.
    pub fn cancel(&mut self) {
        self.armed = false;
        self.sleep.as_mut().reset(deadline_in(FAR_FUTURE));
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Resolves once the armed deadline passes, then disarms the timer.
    ///
    /// Cancel-safe: dropping the future leaves the deadline untouched.
    pub async fn expired(&mut self) {
        if !self.armed {
            future::pending::<()>().await;
        }
        (&mut self.sleep).await;
        self.armed = false;
    }
}

fn deadline_in(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Add up to 10 % random jitter to a reconnect delay.
///
/// A zero delay stays zero so immediate retries remain immediate.
pub fn jittered(delay: Duration) -> Duration {
    let ceiling = (delay / JITTER_DIVISOR).as_millis() as u64;
    if ceiling == 0 {
        return delay;
    }
    delay.saturating_add(Duration::from_millis(rand::rng().random_range(0..=ceiling)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn armed_timer_fires_after_deadline() {
        let mut timer = DeadlineTimer::new();
        timer.arm(Duration::from_secs(1));
        assert!(timer.is_armed());

        let start = Instant::now();
        timer.expired().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn canceled_timer_never_fires() {
        let mut timer = DeadlineTimer::new();
        timer.arm(Duration::from_millis(10));
        timer.cancel();

        let fired = tokio::time::timeout(Duration::from_secs(5), timer.expired()).await;
        assert!(fired.is_err(), "canceled timer must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_moves_the_deadline() {
        let mut timer = DeadlineTimer::new();
        timer.arm(Duration::from_millis(10));
        timer.arm(Duration::from_secs(3));

        let early = tokio::time::timeout(Duration::from_secs(1), timer.expired()).await;
        assert!(early.is_err());
        assert!(timer.is_armed());
        timer.expired().await;
    }

    #[tokio::test(start_paused = true)]
    async fn huge_deadline_is_clamped_instead_of_overflowing() {
        let mut timer = DeadlineTimer::new();
        timer.arm(Duration::MAX);
        assert!(timer.is_armed());

        let fired = tokio::time::timeout(Duration::from_secs(3600), timer.expired()).await;
        assert!(fired.is_err());
        timer.cancel();
    }

    #[test]
    fn jitter_saturates_on_huge_delays() {
        assert_eq!(jittered(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        assert_eq!(jittered(Duration::ZERO), Duration::ZERO);
        for _ in 0..100 {
            let d = jittered(Duration::from_secs(1));
            assert!(d >= Duration::from_secs(1));
            assert!(d <= Duration::from_millis(1100));
        }
    }
}
