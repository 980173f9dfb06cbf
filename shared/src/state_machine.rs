//! USB Function Convergence State Machine
//!
//! After the active USB function list is rewritten, the platform takes a
//! moment to apply it. The poller samples the reported state until the
//! target function's presence matches the request, or the retry budget runs
//! out.

use std::time::Duration;

use crate::usb;

/// Where a convergence poll currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Still waiting for the platform to report the requested state
    Polling,
    /// Observed state matches the request
    Converged,
    /// Retry budget exhausted
    GivenUp,
}

/// What the caller should do after feeding a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Report success
    Converged,
    /// Wait this long, then sample again
    Retry(Duration),
    /// Report failure
    GivenUp,
}

/// Bounded-retry convergence tracker for one request
///
/// The retry count lives here, so each request carries its own budget.
#[derive(Debug, Clone)]
pub struct UsbConvergence {
    want_present: bool,
    retries: u32,
    max_retries: u32,
    interval: Duration,
    state: PollState,
}

impl UsbConvergence {
    /// Track a request that wants the function present (`true`) or absent
    pub fn new(want_present: bool) -> Self {
        Self::with_budget(
            want_present,
            usb::FUNCTION_RETRY_TIMES,
            Duration::from_millis(usb::FUNCTION_RETRY_INTERVAL_MS),
        )
    }

    pub fn with_budget(want_present: bool, max_retries: u32, interval: Duration) -> Self {
        Self {
            want_present,
            retries: 0,
            max_retries,
            interval,
            state: PollState::Polling,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn want_present(&self) -> bool {
        self.want_present
    }

    /// Feed one sample of the platform's active function list
    pub fn observe(&mut self, active_functions: &str, function: &str) -> PollStep {
        let present = active_functions
            .split(crate::netd::USB_CONFIG_DELIMITER)
            .any(|f| f == function);
        self.observe_presence(present)
    }

    /// Feed one sample already reduced to "is the function present"
    pub fn observe_presence(&mut self, present: bool) -> PollStep {
        match self.state {
            PollState::Converged => return PollStep::Converged,
            PollState::GivenUp => return PollStep::GivenUp,
            PollState::Polling => {}
        }

        if present == self.want_present {
            self.state = PollState::Converged;
            self.retries = 0;
            return PollStep::Converged;
        }

        if self.retries < self.max_retries {
            self.retries += 1;
            return PollStep::Retry(self.interval);
        }

        self.state = PollState::GivenUp;
        self.retries = 0;
        PollStep::GivenUp
    }
}
