//! Dispatch queue
//!
//! FIFO of commands waiting for the daemon. At most one command is
//! outstanding at any time, whichever chain queued it.

use std::collections::VecDeque;

use bytes::Bytes;
use netd_shared::{frame_command, Dialect};

use super::chain::CommandChain;
use super::command::DaemonCommand;

/// A command waiting to be sent, with the chain that resumes on its reply
#[derive(Debug)]
struct QueuedCommand {
    command: DaemonCommand,
    chain: CommandChain,
}

/// The command awaiting its terminal reply
#[derive(Debug)]
pub struct InFlight {
    pub command: DaemonCommand,
    pub chain: CommandChain,
}

#[derive(Debug, Default)]
pub struct DispatchQueue {
    pending: VecDeque<QueuedCommand>,
    in_flight: Option<InFlight>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, command: DaemonCommand, chain: CommandChain) {
        self.pending.push_back(QueuedCommand { command, chain });
    }

    /// Pop the next command and frame it for the wire
    ///
    /// Returns `None` while a command is outstanding or nothing is queued.
    pub fn drain(&mut self, dialect: Dialect) -> Option<Bytes> {
        if self.in_flight.is_some() {
            return None;
        }
        let next = self.pending.pop_front()?;
        let frame = frame_command(dialect, next.command.as_str());
        self.in_flight = Some(InFlight {
            command: next.command,
            chain: next.chain,
        });
        Some(frame)
    }

    /// Release the outstanding command after its terminal reply
    pub fn complete(&mut self) -> Option<InFlight> {
        self.in_flight.take()
    }

    pub fn is_outstanding(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The command currently awaiting a reply
    pub fn current(&self) -> Option<&DaemonCommand> {
        self.in_flight.as_ref().map(|f| &f.command)
    }

    /// Number of commands waiting behind the outstanding one
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::params::NetworkParams;

    fn chain(id: i32) -> CommandChain {
        let params = NetworkParams {
            id,
            ..Default::default()
        };
        CommandChain::new(params, &[], None)
    }

    #[test]
    fn test_single_outstanding_command() {
        let mut queue = DispatchQueue::new();
        queue.enqueue(DaemonCommand::new("tether status"), chain(1));
        queue.enqueue(DaemonCommand::new("ipfwd enable"), chain(2));

        let frame = queue.drain(Dialect::Sequenced).expect("first command");
        assert_eq!(&frame[..], b"0 tether status\0");
        assert!(queue.is_outstanding());
        assert_eq!(queue.drain(Dialect::Sequenced), None);
        assert_eq!(queue.len(), 1);

        let done = queue.complete().expect("in flight");
        assert_eq!(done.chain.params().id, 1);
        assert!(!queue.is_outstanding());

        let frame = queue.drain(Dialect::Legacy).expect("second command");
        assert_eq!(&frame[..], b"ipfwd enable\0");
        assert_eq!(queue.current().map(DaemonCommand::as_str), Some("ipfwd enable"));
    }

    #[test]
    fn test_drain_empty_queue() {
        let mut queue = DispatchQueue::new();
        assert_eq!(queue.drain(Dialect::Legacy), None);
        assert!(queue.complete().is_none());
        assert!(queue.is_empty());
    }
}
