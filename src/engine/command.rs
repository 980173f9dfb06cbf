//! Daemon command builder
//!
//! Each step assembles its command from explicit argument slots instead of
//! formatting into a shared buffer. Arguments are appended verbatim, so an
//! empty value still occupies its slot.

use std::fmt;

/// One daemon command line, without framing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonCommand {
    text: String,
}

impl DaemonCommand {
    /// Start a command with its verb, e.g. `"tether interface add"`
    pub fn new(verb: &str) -> Self {
        Self { text: verb.to_string() }
    }

    /// Append a plain argument
    pub fn arg(mut self, value: impl AsRef<str>) -> Self {
        self.text.push(' ');
        self.text.push_str(value.as_ref());
        self
    }

    /// Append an argument wrapped in double quotes
    pub fn quoted(mut self, value: impl AsRef<str>) -> Self {
        self.text.push_str(" \"");
        self.text.push_str(value.as_ref());
        self.text.push('"');
        self
    }

    /// Append an argument wrapped in square brackets
    pub fn bracketed(mut self, value: impl AsRef<str>) -> Self {
        self.text.push_str(" [");
        self.text.push_str(value.as_ref());
        self.text.push(']');
        self
    }

    /// Append two arguments, or nothing unless both are non-empty
    ///
    /// The daemon splits on whitespace, so trailing blanks would turn into
    /// extra empty arguments.
    pub fn optional_pair(self, first: &str, second: &str) -> Self {
        if first.is_empty() || second.is_empty() {
            return self;
        }
        self.arg(first).arg(second)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for DaemonCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<DaemonCommand> for String {
    fn from(cmd: DaemonCommand) -> Self {
        cmd.text
    }
}
