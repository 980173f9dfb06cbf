//! USB network function switching
//!
//! Rewrites the active USB function list and, when asked to, polls the
//! reported state until the network function shows up (or disappears).

use std::time::Duration;

use netd_shared::state_machine::{PollStep, UsbConvergence};
use netd_shared::usb;
use tracing::debug;

use super::NetworkEngine;

/// Function list to activate for a request
///
/// Enabling selects the network function alone, keeping the debug bridge
/// if the baseline has it. Disabling reverts to the baseline.
pub fn target_functions(baseline: &str, enable: bool) -> String {
    let baseline: Vec<&str> = baseline
        .split(netd_shared::netd::USB_CONFIG_DELIMITER)
        .filter(|f| !f.is_empty())
        .collect();

    let functions = if enable {
        let mut functions = vec![usb::FUNCTION_RNDIS];
        if baseline.contains(&usb::FUNCTION_ADB) {
            functions.push(usb::FUNCTION_ADB);
        }
        functions
    } else {
        baseline
    };

    functions.join(",")
}

/// A pending confirmation of a USB function switch
#[derive(Debug, Clone)]
pub struct UsbStatePoller {
    id: i32,
    enable: bool,
    convergence: UsbConvergence,
    ack: bool,
}

impl UsbStatePoller {
    pub fn new(id: i32, enable: bool) -> Self {
        Self {
            id,
            enable,
            convergence: UsbConvergence::new(enable),
            ack: false,
        }
    }

    /// Post the request acknowledgement after the poll outcome
    pub fn with_ack(mut self) -> Self {
        self.ack = true;
        self
    }

    pub fn needs_ack(&self) -> bool {
        self.ack
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn enable(&self) -> bool {
        self.enable
    }

    /// Delay before the first sample and between retries
    pub fn interval(&self) -> Duration {
        self.convergence.interval()
    }

    pub fn observe(&mut self, active_functions: &str) -> PollStep {
        self.convergence.observe(active_functions, usb::FUNCTION_RNDIS)
    }
}

/// Poll until the switch converges or the retry budget runs out
///
/// The engine is borrowed for the whole poll, so no other reply or request
/// is handled until this returns.
pub async fn converge(engine: &mut NetworkEngine, mut poller: UsbStatePoller) -> bool {
    debug!(
        "[USB] Waiting for rndis to be {} (id={})",
        if poller.enable() { "present" } else { "absent" },
        poller.id()
    );
    tokio::time::sleep(poller.interval()).await;

    loop {
        match engine.sample_usb_state(&mut poller) {
            PollStep::Converged => return true,
            PollStep::GivenUp => return false,
            PollStep::Retry(delay) => tokio::time::sleep(delay).await,
        }
    }
}
