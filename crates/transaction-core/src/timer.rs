//! RFC 3261 §17 transaction timers. `TimerSettings` holds the T1–T4
//! constants and derives every named wait (A–K, the 1xx retransmit
//! interval) from them; `TimerFactory` is the injectable sleep so tests
//! can run an entire transaction lifetime without real wall-clock delay.

use std::time::Duration;

use async_trait::async_trait;

/// The tunable timer base values (spec §4.5). Defaults are RFC 3261's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub t1: Duration,
    pub t2: Duration,
    pub t4: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            t1: Duration::from_millis(500),
            t2: Duration::from_secs(4),
            t4: Duration::from_secs(5),
        }
    }
}

impl TimerSettings {
    /// Timer A: INVITE client retransmit interval, starts at T1, doubles
    /// each firing, capped at T2.
    pub fn timer_a_initial(&self) -> Duration {
        self.t1
    }

    pub fn timer_a_next(&self, previous: Duration) -> Duration {
        std::cmp::min(previous * 2, self.t2)
    }

    /// Timer B: INVITE client transaction timeout, 64*T1.
    pub fn timer_b(&self) -> Duration {
        self.t1 * 64
    }

    /// Timer D: wait time in `Completed` (client INVITE) before moving to
    /// `Terminated`, at least 32s over unreliable transports, 0 otherwise.
    pub fn timer_d(&self, reliable: bool) -> Duration {
        if reliable { Duration::ZERO } else { Duration::from_secs(32) }
    }

    /// Timer E: non-INVITE client retransmit interval, starts at T1,
    /// doubles each firing up to T2, then stays at T2.
    pub fn timer_e_initial(&self) -> Duration {
        self.t1
    }

    pub fn timer_e_next(&self, previous: Duration) -> Duration {
        std::cmp::min(previous * 2, self.t2)
    }

    /// Timer F: non-INVITE client transaction timeout, 64*T1.
    pub fn timer_f(&self) -> Duration {
        self.t1 * 64
    }

    /// Timer G: INVITE server retransmit interval, starts at T1, doubles
    /// up to T2.
    pub fn timer_g_initial(&self) -> Duration {
        self.t1
    }

    pub fn timer_g_next(&self, previous: Duration) -> Duration {
        std::cmp::min(previous * 2, self.t2)
    }

    /// Timer H: wait time for the ACK in `Completed` (server INVITE), 64*T1.
    pub fn timer_h(&self) -> Duration {
        self.t1 * 64
    }

    /// Timer I: wait time in `Confirmed` (server INVITE) before
    /// `Terminated`, T4 over unreliable transports, 0 otherwise.
    pub fn timer_i(&self, reliable: bool) -> Duration {
        if reliable { Duration::ZERO } else { self.t4 }
    }

    /// Timer J: wait time in `Completed` (server non-INVITE) before
    /// `Terminated`, 64*T1 over unreliable transports, 0 otherwise.
    pub fn timer_j(&self, reliable: bool) -> Duration {
        if reliable { Duration::ZERO } else { self.t1 * 64 }
    }

    /// Timer K: wait time in `Completed` (client non-INVITE) before
    /// `Terminated`, T4 over unreliable transports, 0 otherwise.
    pub fn timer_k(&self, reliable: bool) -> Duration {
        if reliable { Duration::ZERO } else { self.t4 }
    }

    /// The provisional (1xx) retransmit interval a server INVITE
    /// transaction uses to keep NATs/proxies from timing out while the
    /// TU is still deciding (not a lettered RFC timer, but conventional
    /// practice mirrored from the teacher's dialog layer).
    pub fn provisional_retransmit_interval(&self) -> Duration {
        Duration::from_secs(60)
    }
}

/// An injectable sleep so FSM tests can drive a transaction through its
/// full timer sequence under a paused virtual clock instead of waiting
/// on real time.
#[async_trait]
pub trait TimerFactory: std::fmt::Debug + Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// The production [`TimerFactory`], backed by `tokio::time::sleep`. Tests
/// use the same impl under `tokio::time::pause()` so virtual time can be
/// fast-forwarded with `tokio::time::advance`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimerFactory;

#[async_trait]
impl TimerFactory for TokioTimerFactory {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
