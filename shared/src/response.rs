//! Daemon response decoding
//!
//! Every reply line starts with a three-digit code bucketed by hundreds:
//!
//! | code | meaning                                        |
//! |------|------------------------------------------------|
//! | 1xx  | proceeding, more lines follow for this command |
//! | 2xx  | success (terminal)                             |
//! | 4xx  | action did not take place (terminal)           |
//! | 5xx  | syntax or parameter error (terminal)           |
//! | 6xx  | unsolicited broadcast, not tied to any command |
//!
//! Proceeding lines for one command are collected and delivered together
//! with the terminal line, joined by a NUL byte.

use crate::dialect::Dialect;
use crate::netd;

/// A daemon response code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResponseCode(pub u32);

/// Bucket a response code falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Proceeding,
    Success,
    Failure,
    Error,
    Broadcast,
    /// Any other bucket; terminal and treated as an error
    Unknown,
}

impl ResponseCode {
    /// The code rounded down to its hundred
    pub fn bucket(self) -> u32 {
        (self.0 / 100) * 100
    }

    pub fn class(self) -> ResponseClass {
        match self.bucket() {
            netd::COMMAND_PROCEEDING => ResponseClass::Proceeding,
            netd::COMMAND_OKAY => ResponseClass::Success,
            netd::COMMAND_FAIL => ResponseClass::Failure,
            netd::COMMAND_ERROR => ResponseClass::Error,
            netd::COMMAND_UNSOLICITED => ResponseClass::Broadcast,
            _ => ResponseClass::Unknown,
        }
    }

    /// Whether this line ends the outstanding command
    pub fn is_terminal(self) -> bool {
        self.class() != ResponseClass::Proceeding
    }

    pub fn is_error(self) -> bool {
        !matches!(self.class(), ResponseClass::Proceeding | ResponseClass::Success)
    }

    pub fn is_broadcast(self) -> bool {
        self.class() == ResponseClass::Broadcast
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Topics for the broadcasts the bridge forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastTopic {
    InterfaceChange,
    BandwidthControl,
}

impl BroadcastTopic {
    /// Map a broadcast code to its topic; other codes are not forwarded
    pub fn from_code(code: ResponseCode) -> Option<Self> {
        match code.0 {
            netd::BROADCAST_INTERFACE_CHANGE => Some(BroadcastTopic::InterfaceChange),
            netd::BROADCAST_BANDWIDTH_CONTROLLER => Some(BroadcastTopic::BandwidthControl),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BroadcastTopic::InterfaceChange => "netd-interface-change",
            BroadcastTopic::BandwidthControl => "netd-bandwidth-control",
        }
    }
}

/// A classified reply line
#[derive(Debug, Clone, PartialEq)]
pub enum DaemonEvent {
    /// No parsable code; the line is ignored
    Malformed,
    /// Unsolicited message. `topic` is `None` for codes nobody listens to.
    Broadcast {
        code: ResponseCode,
        topic: Option<BroadcastTopic>,
        reason: String,
    },
    /// Intermediate line of a multi-line reply
    Proceeding { code: ResponseCode },
    /// Terminal line of the outstanding command
    Completed {
        code: ResponseCode,
        reason: String,
        is_error: bool,
    },
}

/// Split off the first whitespace-delimited token
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

/// Parse one line into its code and reason text
///
/// Under the sequenced dialect the token following the code is the
/// sequence number and is skipped, except on broadcasts which never carry one.
pub fn parse_line(line: &str, dialect: Dialect) -> Option<(ResponseCode, &str)> {
    let (token, rest) = split_token(line);
    let code = ResponseCode(token.parse().ok()?);

    if !code.is_broadcast() && dialect.has_sequence() {
        let (_sequence, reason) = split_token(rest);
        return Some((code, reason));
    }
    Some((code, rest))
}

/// Stateful decoder that aggregates multi-line replies
#[derive(Debug, Default)]
pub struct ResponseDecoder {
    dialect: Dialect,
    reasons: Vec<String>,
}

impl ResponseDecoder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            reasons: Vec::new(),
        }
    }

    /// Number of proceeding lines collected for the current command
    pub fn pending_parts(&self) -> usize {
        self.reasons.len()
    }

    /// Forget any proceeding lines collected so far
    pub fn reset(&mut self) {
        self.reasons.clear();
    }

    /// Classify one line, updating the aggregation state
    pub fn decode(&mut self, line: &str) -> DaemonEvent {
        let Some((code, reason)) = parse_line(line, self.dialect) else {
            return DaemonEvent::Malformed;
        };

        if code.is_broadcast() {
            return DaemonEvent::Broadcast {
                code,
                topic: BroadcastTopic::from_code(code),
                reason: reason.to_string(),
            };
        }

        self.reasons.push(reason.to_string());
        if !code.is_terminal() {
            return DaemonEvent::Proceeding { code };
        }

        let mut joined = String::new();
        for (i, part) in self.reasons.drain(..).enumerate() {
            if i > 0 {
                joined.push(netd::INTERFACE_DELIMITER);
            }
            joined.push_str(&part);
        }

        DaemonEvent::Completed {
            code,
            reason: joined,
            is_error: code.is_error(),
        }
    }
}
