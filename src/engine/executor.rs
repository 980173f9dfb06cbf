//! Network engine - runs requests as command chains against the daemon

use bytes::Bytes;
use netd_shared::state_machine::PollStep;
use netd_shared::{DaemonEvent, Dialect, NetworkCommand, NetworkResult, ResponseDecoder};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::catalog::{ErrorHandler, Operation, OperationError, Step, StepAction, TETHERING_ROLLBACK_CHAIN};
use super::chain::CommandChain;
use super::params::NetworkParams;
use super::queue::DispatchQueue;
use super::usb::{self, UsbStatePoller};
use crate::properties::{self, InterfaceProperties, PropertyStore};

/// Everything the engine hands to the outside world, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    /// A framed command for the daemon socket
    Command(Bytes),
    /// A result for the control channel
    Result(NetworkResult),
}

/// Owns the dispatch queue, the reply decoder and the property store
///
/// The engine is synchronous and meant to be driven by a single task: it
/// never blocks, and every input is processed to completion before the
/// next one is looked at.
pub struct NetworkEngine {
    dialect: Dialect,
    queue: DispatchQueue,
    decoder: ResponseDecoder,
    store: Box<dyn PropertyStore>,
    output: mpsc::UnboundedSender<EngineOutput>,
}

impl NetworkEngine {
    pub fn new(
        dialect: Dialect,
        store: Box<dyn PropertyStore>,
        output: mpsc::UnboundedSender<EngineOutput>,
    ) -> Self {
        Self {
            dialect,
            queue: DispatchQueue::new(),
            decoder: ResponseDecoder::new(dialect),
            store,
            output,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn store(&self) -> &dyn PropertyStore {
        self.store.as_ref()
    }

    /// Whether a command is waiting for its terminal reply
    pub fn is_outstanding(&self) -> bool {
        self.queue.is_outstanding()
    }

    /// Commands queued behind the outstanding one
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Run one request
    ///
    /// Returns a poller when the request asked for a USB switch to be
    /// confirmed; the caller drives it with [`usb::converge`].
    pub fn execute(&mut self, command: NetworkCommand) -> Result<Option<UsbStatePoller>, OperationError> {
        let operation = match command.cmd.parse::<Operation>() {
            Ok(op) => op,
            Err(err) => {
                if matches!(err, OperationError::Unsupported(_)) && command.is_async == Some(false) {
                    self.post(NetworkResult {
                        id: command.id,
                        ret: false,
                        ..Default::default()
                    });
                }
                return Err(err);
            }
        };

        let mut params = NetworkParams::from(command);
        let id = params.id;
        let is_async = params.is_async;
        debug!("[ENGINE] Executing {} (id={})", operation, id);

        let mut poller = None;
        match operation {
            Operation::SetDns => self.set_dns(&params),
            Operation::EnableUsbRndis => {
                poller = self
                    .enable_usb_rndis(id, params.enable, params.report)
                    .map(|p| if is_async { p } else { p.with_ack() });
            }
            _ => {
                match operation {
                    Operation::SetWifiTethering | Operation::SetUsbTethering => {
                        params.resolve_upstream_dns(self.store.as_ref());
                        info!(
                            "[ENGINE] {} tethering on {} <-> {}",
                            if params.enable { "Starting" } else { "Stopping" },
                            params.internal_ifname,
                            params.external_ifname
                        );
                    }
                    Operation::SetDhcpServer if params.enabled => params.derive_dhcp_fields(),
                    _ => {}
                }

                if let Some((steps, on_error)) = operation.chain(&params) {
                    self.run_chain(params, steps, Some(on_error));
                }
            }
        }

        // A confirmed USB switch acknowledges once its outcome is posted
        if !is_async && poller.is_none() {
            self.post(NetworkResult::ack(id));
        }

        Ok(poller)
    }

    /// Feed one reply line from the daemon
    pub fn on_daemon_line(&mut self, line: &str) {
        match self.decoder.decode(line) {
            DaemonEvent::Malformed => {
                debug!("[ENGINE] Ignoring malformed line: {:?}", line);
                self.drain();
            }
            DaemonEvent::Broadcast { code, topic, reason } => {
                match topic {
                    Some(topic) => {
                        debug!("[ENGINE] Broadcast {} on {}: {}", code, topic.as_str(), reason);
                        self.post(NetworkResult::broadcast(topic.as_str(), reason));
                    }
                    None => debug!("[ENGINE] Dropping broadcast {}: {}", code, reason),
                }
                self.drain();
            }
            DaemonEvent::Proceeding { code } => {
                if !self.queue.is_outstanding() {
                    warn!("[ENGINE] Dropping reply with no outstanding command: {:?}", line);
                    self.decoder.reset();
                    return;
                }
                debug!("[ENGINE] Proceeding {} ({} parts)", code, self.decoder.pending_parts());
            }
            DaemonEvent::Completed { code, reason, is_error } => {
                let Some(in_flight) = self.queue.complete() else {
                    warn!("[ENGINE] Dropping reply with no outstanding command: {} {}", code, reason);
                    return;
                };
                debug!("[ENGINE] '{}' -> {} {:?}", in_flight.command, code, reason);

                let result = NetworkResult::response(code.0, reason);
                self.next(in_flight.chain, is_error, result);
                self.drain();
            }
        }
    }

    /// Drop a partially received reply after the daemon connection is lost
    pub fn on_daemon_disconnected(&mut self) {
        if self.decoder.pending_parts() > 0 {
            debug!("[ENGINE] Discarding {} reply lines", self.decoder.pending_parts());
        }
        self.decoder.reset();
    }

    fn run_chain(&mut self, params: NetworkParams, steps: &'static [Step], on_error: Option<ErrorHandler>) {
        let chain = CommandChain::new(params, steps, on_error);
        self.next(chain, false, NetworkResult::default());
    }

    /// Resume a chain after a reply (or at its start)
    fn next(&mut self, mut chain: CommandChain, error: bool, mut result: NetworkResult) {
        if error {
            self.fail_chain(chain, result);
            return;
        }

        loop {
            let Some(step) = chain.advance() else {
                debug!("[ENGINE] Chain finished (id={})", chain.params().id);
                return;
            };

            match step.execute(chain.params_mut(), &result, self.dialect) {
                StepAction::Send(command) => {
                    debug!(
                        "[ENGINE] Step {} of {} (id={})",
                        chain.position(),
                        chain.params().cmd,
                        chain.params().id
                    );
                    self.queue.enqueue(command, chain);
                    self.drain();
                    return;
                }
                StepAction::PassThrough => {
                    result = NetworkResult::response(0, "");
                }
                StepAction::Complete(completion) => {
                    let result = completion.result(chain.params(), &result);
                    self.post(result);
                    return;
                }
            }
        }
    }

    fn fail_chain(&mut self, chain: CommandChain, mut result: NetworkResult) {
        let Some(handler) = chain.error_handler() else {
            warn!(
                "[ENGINE] Rollback step failed (id={}): {} {}",
                chain.params().id,
                result.result_code,
                result.result_reason
            );
            return;
        };

        let mut params = chain.into_params();
        warn!(
            "[ENGINE] {} failed (id={}): {} {}",
            params.cmd, params.id, result.result_code, result.result_reason
        );

        result.error = true;
        result.id = params.id;
        if handler == ErrorHandler::Dhcp {
            result.success = false;
        }
        self.post(result);

        if matches!(handler, ErrorHandler::WifiTethering | ErrorHandler::UsbTethering) {
            info!("[ENGINE] Rolling back tethering (id={})", params.id);
            let id = params.id;
            params.enable = false;
            self.run_chain(params, TETHERING_ROLLBACK_CHAIN, None);

            if handler == ErrorHandler::UsbTethering {
                self.enable_usb_rndis(id, false, false);
            }
        }
    }

    fn drain(&mut self) {
        if let Some(frame) = self.queue.drain(self.dialect) {
            if let Some(command) = self.queue.current() {
                debug!("[ENGINE] Sending '{}'", command);
            }
            self.emit(EngineOutput::Command(frame));
        }
    }

    fn post(&self, result: NetworkResult) {
        self.emit(EngineOutput::Result(result));
    }

    fn emit(&self, output: EngineOutput) {
        if self.output.send(output).is_err() {
            warn!("[ENGINE] Output channel closed");
        }
    }

    /// Publish the DNS servers for an interface
    pub fn set_dns(&mut self, params: &NetworkParams) {
        let iface = InterfaceProperties::read(self.store.as_ref(), &params.ifname);

        let dns1 = if params.dns1_str.is_empty() { &iface.dns1 } else { &params.dns1_str };
        let dns2 = if params.dns2_str.is_empty() { &iface.dns2 } else { &params.dns2_str };
        self.store.set(properties::NET_DNS1, dns1);
        self.store.set(properties::NET_DNS2, dns2);

        let change = self
            .store
            .get(properties::NET_DNS_CHANGE)
            .trim()
            .parse::<i64>()
            .unwrap_or(0)
            + 1;
        self.store.set(properties::NET_DNS_CHANGE, &change.to_string());
        info!("[ENGINE] DNS set for {}: {} {}", params.ifname, dns1, dns2);
    }

    /// Switch the USB network function on or off
    ///
    /// With `report` set, returns the poller that confirms the switch.
    pub fn enable_usb_rndis(&mut self, id: i32, enable: bool, report: bool) -> Option<UsbStatePoller> {
        let baseline = self.store.get(properties::PERSIST_SYS_USB_CONFIG);
        let target = usb::target_functions(&baseline, enable);
        let current = self.store.get(properties::SYS_USB_CONFIG);

        if current != target {
            info!("[USB] Switching functions '{}' -> '{}'", current, target);
            self.store.set(properties::SYS_USB_CONFIG, &target);
        }

        report.then(|| UsbStatePoller::new(id, enable))
    }

    /// Take one sample of the USB state, posting the outcome once settled
    pub fn sample_usb_state(&mut self, poller: &mut UsbStatePoller) -> PollStep {
        let state = self.store.get(properties::SYS_USB_STATE);
        let step = poller.observe(&state);

        match step {
            PollStep::Converged => {
                info!("[USB] Function switch confirmed (id={})", poller.id());
                self.post(NetworkResult {
                    id: poller.id(),
                    enable: poller.enable(),
                    result: true,
                    ..Default::default()
                });
            }
            PollStep::GivenUp => {
                warn!("[USB] Function switch not confirmed, state '{}' (id={})", state, poller.id());
                self.post(NetworkResult {
                    id: poller.id(),
                    result: false,
                    ..Default::default()
                });
            }
            PollStep::Retry(_) => debug!("[USB] State '{}', retrying", state),
        }

        if !matches!(step, PollStep::Retry(_)) && poller.needs_ack() {
            self.post(NetworkResult::ack(poller.id()));
        }

        step
    }
}
