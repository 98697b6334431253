use std::collections::VecDeque;
use std::fmt;

/// Maximum number of entries kept in the operator console.
pub const CONSOLE_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Error,
    Warning,
}

impl Severity {
    /// Parses an explicit level as sent by the backend.
    pub fn from_level(level: &str) -> Option<Self> {
        match level.trim().to_ascii_lowercase().as_str() {
            "info" | "debug" => Some(Severity::Info),
            "success" | "ok" => Some(Severity::Success),
            "error" | "fail" | "failed" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Wall-clock source used to stamp console entries.
///
/// Clocks never take part in state equality.
#[derive(Clone, Copy)]
pub struct Clock(fn() -> String);

impl Clock {
    pub fn new(now: fn() -> String) -> Self {
        Self(now)
    }

    pub fn now(&self) -> String {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self(local_time)
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}

impl PartialEq for Clock {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

fn local_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    /// Monotonic per-buffer sequence number; survives eviction so renderers
    /// can tell which entries they have already shown.
    pub seq: u64,
    pub timestamp: String,
    pub severity: Severity,
    pub message: String,
}

/// Bounded FIFO of classified console entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleBuffer {
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
    next_seq: u64,
    clock: Clock,
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(Clock::default())
    }
}

impl ConsoleBuffer {
    pub fn new(clock: Clock) -> Self {
        Self::with_capacity(CONSOLE_CAPACITY, clock)
    }

    pub fn with_capacity(capacity: usize, clock: Clock) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(CONSOLE_CAPACITY)),
            capacity: capacity.max(1),
            next_seq: 1,
            clock,
        }
    }

    /// Stamps and appends an entry, evicting the oldest once over capacity.
    pub fn append(&mut self, severity: Severity, message: impl Into<String>) {
        let entry = ConsoleEntry {
            seq: self.next_seq,
            timestamp: self.clock.now(),
            severity,
            message: message.into(),
        };
        self.next_seq += 1;
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Empties the buffer. Sequence numbers keep increasing.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    /// Owned copy of the entries in insertion order.
    pub fn snapshot(&self) -> Vec<ConsoleEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> String {
        "00:00:00".to_string()
    }

    #[test]
    fn evicts_oldest_first() {
        let mut buffer = ConsoleBuffer::with_capacity(3, Clock::new(fixed));
        for i in 0..5 {
            buffer.append(Severity::Info, format!("line {i}"));
        }
        let messages: Vec<_> = buffer.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["line 2", "line 3", "line 4"]);
        assert_eq!(buffer.snapshot()[0].seq, 3);
    }

    #[test]
    fn clear_keeps_sequence_running() {
        let mut buffer = ConsoleBuffer::new(Clock::new(fixed));
        buffer.append(Severity::Error, "a");
        buffer.clear();
        assert!(buffer.is_empty());
        buffer.append(Severity::Info, "b");
        assert_eq!(buffer.snapshot()[0].seq, 2);
        assert_eq!(buffer.snapshot()[0].timestamp, "00:00:00");
    }

    #[test]
    fn explicit_levels_parse() {
        assert_eq!(Severity::from_level("WARN"), Some(Severity::Warning));
        assert_eq!(Severity::from_level(" ok "), Some(Severity::Success));
        assert_eq!(Severity::from_level("loud"), None);
    }
}
