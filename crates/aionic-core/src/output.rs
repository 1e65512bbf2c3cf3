//! Simulated terminal output and the ZChain ledger.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Line shown before any command has run.
pub const AWAITING_LINE: &str = "[SYSTEM_LOG]: Awaiting command...";

/// Separator written before commit and completion lines.
pub const BLANK_LINE: &str = " ";

/// Line written when playback finishes.
pub const COMPLETION_LINE: &str = "> Execution complete. Ready for next command.";

/// Format the commit log line for a block.
pub fn commit_line(block: u64) -> String {
    format!("ZCHAIN_LOG: Data committed to block #{}.", block)
}

/// Bounded FIFO of terminal lines; the oldest line is dropped when full.
/// Only built through [`OutputBuffer::new`], so the capacity bound always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl OutputBuffer {
    /// Create a buffer holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Replace the contents with a single line.
    pub fn reset(&mut self, line: impl Into<String>) {
        self.lines.clear();
        self.lines.push_back(line.into());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// In-memory block counter. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    block: u64,
}

impl Ledger {
    /// Start the ledger at an existing block height.
    pub fn at(block: u64) -> Self {
        Self { block }
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    /// Commit one block and return the new height.
    pub fn commit(&mut self) -> u64 {
        self.block += 1;
        self.block
    }
}
