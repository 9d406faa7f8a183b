//! Rotation triggers

use chrono::{DateTime, Utc};

/// Why a rotation is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// The pending record would bring the file to its size limit
    Size,
    /// The scheduled rollover instant has passed
    Time,
}

/// What a policy sees for each write attempt
#[derive(Debug, Clone, Copy)]
pub struct RotationCheck {
    /// Bytes already in the current file
    pub current_size: u64,
    /// Rendered length of the pending record, newline included
    pub pending_len: u64,
    /// Time of the write attempt
    pub now: DateTime<Utc>,
    /// Next scheduled rollover
    pub next_rollover: DateTime<Utc>,
}

/// Decides whether the current file must be rotated before a write
pub trait RotationPolicy: Send + Sync + 'static {
    /// `Some(trigger)` when rotation must happen first
    fn should_rotate(&self, check: &RotationCheck) -> Option<RotationTrigger>;
}

/// Rotate when the file would reach `max_size` bytes OR the rollover instant
/// has passed. A `max_size` of 0 disables the size trigger.
///
/// An empty file never triggers the size rule, so a single record larger
/// than the limit is written on its own instead of producing an empty archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeOrTimePolicy {
    max_size: u64,
}

impl SizeOrTimePolicy {
    /// Create a policy with the given size limit in bytes
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    /// Configured size limit
    pub fn max_size(&self) -> u64 {
        self.max_size
    }
}

impl RotationPolicy for SizeOrTimePolicy {
    fn should_rotate(&self, check: &RotationCheck) -> Option<RotationTrigger> {
        if self.max_size > 0
            && check.current_size > 0
            && check.current_size.saturating_add(check.pending_len) >= self.max_size
        {
            return Some(RotationTrigger::Size);
        }
        if check.now >= check.next_rollover {
            return Some(RotationTrigger::Time);
        }
        None
    }
}
