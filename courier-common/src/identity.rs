//! Sources of message identifiers, MIME boundaries and timestamps.
//!
//! Composition needs fresh identifiers and the current time. Both are drawn
//! from an [`IdSource`] so that tests can pin them down and compare output
//! byte for byte.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, Local};
use uuid::Uuid;

pub trait IdSource: Send + Sync {
    /// A globally unique identifier. Every call must return a new value.
    fn unique_id(&self) -> Uuid;

    /// The timestamp used for the `Date` header.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Random v4 UUIDs and the local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIds;

impl IdSource for SystemIds {
    fn unique_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Counter backed identifiers with a frozen clock.
///
/// The first identifier is `00000000-0000-0000-0000-000000000001`, the next
/// one ends in `2`, and so on.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
    now: DateTime<FixedOffset>,
}

impl SequentialIds {
    #[must_use]
    pub const fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            next: AtomicU64::new(1),
            now,
        }
    }
}

impl IdSource for SequentialIds {
    fn unique_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::Relaxed)))
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}
