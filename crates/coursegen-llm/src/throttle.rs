//! Outbound call throttling
//!
//! [`RequestThrottler`] is the single serialization point for remote model calls.
//! It enforces a minimum spacing between granted calls and keeps a per-window call
//! counter. The async mutex is held across the spacing sleep, so concurrent callers
//! are granted slots one at a time in lock order.

use coursegen_config::ThrottleConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Timing policy for a [`RequestThrottler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSettings {
    /// Minimum time between two granted calls
    pub min_interval: Duration,
    /// Length of the call-counting window
    pub window: Duration,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(4),
            window: Duration::from_secs(60),
        }
    }
}

impl From<&ThrottleConfig> for ThrottleSettings {
    fn from(config: &ThrottleConfig) -> Self {
        Self {
            min_interval: config.min_interval(),
            window: config.window(),
        }
    }
}

#[derive(Debug)]
struct ThrottleState {
    last_call: Option<Instant>,
    window_start: Instant,
    calls_in_window: u32,
}

/// Grant returned by [`RequestThrottler::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSlot {
    pub granted_at: Instant,
    /// Calls recorded in the current window, this one included
    pub calls_in_window: u32,
}

#[derive(Debug)]
pub struct RequestThrottler {
    state: Mutex<ThrottleState>,
    settings: ThrottleSettings,
}

impl RequestThrottler {
    #[must_use]
    pub fn new(settings: ThrottleSettings) -> Self {
        Self {
            state: Mutex::new(ThrottleState {
                last_call: None,
                window_start: Instant::now(),
                calls_in_window: 0,
            }),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> ThrottleSettings {
        self.settings
    }

    /// Wait until a call may be issued, then record it.
    ///
    /// Never fails; it only delays.
    pub async fn acquire(&self) -> CallSlot {
        let mut state = self.state.lock().await;
        if let Some(wait) = self.remaining_spacing(&state) {
            debug!(wait_ms = wait.as_millis() as u64, "Throttling outbound call");
            tokio::time::sleep(wait).await;
        }
        self.record(&mut state)
    }

    /// Like [`acquire`](Self::acquire), but gives up if `cancel` fires while waiting.
    ///
    /// A cancelled wait records nothing and returns `None`.
    pub async fn acquire_or_cancel(&self, cancel: &CancellationToken) -> Option<CallSlot> {
        let mut state = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            guard = self.state.lock() => guard,
        };

        if let Some(wait) = self.remaining_spacing(&state) {
            debug!(wait_ms = wait.as_millis() as u64, "Throttling outbound call");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                () = tokio::time::sleep(wait) => {}
            }
        }

        Some(self.record(&mut state))
    }

    /// Calls recorded in the current window.
    pub async fn calls_in_window(&self) -> u32 {
        self.state.lock().await.calls_in_window
    }

    fn remaining_spacing(&self, state: &ThrottleState) -> Option<Duration> {
        let last = state.last_call?;
        let elapsed = Instant::now().saturating_duration_since(last);
        (elapsed < self.settings.min_interval).then(|| self.settings.min_interval - elapsed)
    }

    fn record(&self, state: &mut ThrottleState) -> CallSlot {
        let now = Instant::now();

        // The window restarts from the first call after it lapses rather than on a
        // fixed grid, so the counter is an approximation and not a hard cap.
        if now.saturating_duration_since(state.window_start) > self.settings.window {
            state.window_start = now;
            state.calls_in_window = 0;
        }

        state.calls_in_window += 1;
        state.last_call = Some(now);

        CallSlot {
            granted_at: now,
            calls_in_window: state.calls_in_window,
        }
    }
}

impl Default for RequestThrottler {
    fn default() -> Self {
        Self::new(ThrottleSettings::default())
    }
}
