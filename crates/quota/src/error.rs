//! Error types for quota operations

use std::fmt;
use std::time::Duration;

use crate::ledger::PoolKind;

/// Errors from quota operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{pool} quota exhausted ({remaining}/{ceiling} remaining), resets in {reset_in}")]
    Exhausted {
        pool: PoolKind,
        ceiling: u32,
        remaining: i64,
        reset_in: TimeRemaining,
        /// Unix timestamp (seconds) of the next reset
        reset_at: u64,
    },

    #[error("request cost {cost} exceeds {pool} ceiling of {ceiling}")]
    CostExceedsCeiling {
        pool: PoolKind,
        cost: u32,
        ceiling: u32,
    },
}

/// Result alias for quota operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Time until a pool resets, rendered for humans ("1 min 30 sec", "2 hours").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRemaining(pub Duration);

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        if secs == 0 {
            return write!(f, "now");
        }
        let plural = |n: u64| if n == 1 { "" } else { "s" };
        if secs < 60 {
            write!(f, "{secs} second{}", plural(secs))
        } else if secs < 3600 {
            let (minutes, rest) = (secs / 60, secs % 60);
            if rest > 0 {
                write!(f, "{minutes} min {rest} sec")
            } else {
                write!(f, "{minutes} minute{}", plural(minutes))
            }
        } else {
            let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
            if minutes > 0 {
                write!(f, "{hours} hr {minutes} min")
            } else {
                write!(f, "{hours} hour{}", plural(hours))
            }
        }
    }
}
