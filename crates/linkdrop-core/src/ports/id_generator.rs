//! IdGenerator port: mints item identifiers at enqueue time.

use ulid::Ulid;

use crate::domain::ItemId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn next_item_id(&self) -> ItemId;
}

/// ULID-based generator.
///
/// The timestamp half comes from the injected clock, so tests can pin it and
/// still get unique ids from the random half.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn next_item_id(&self) -> ItemId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        ItemId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn generates_unique_ids() {
        let ids = UlidGenerator::new(SystemClock);
        let a = ids.next_item_id();
        let b = ids.next_item_id();
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_clock_pins_the_timestamp_half() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let ids = UlidGenerator::new(FixedClock::new(at));

        let a = ids.next_item_id();
        let b = ids.next_item_id();

        assert_ne!(a, b);
        assert_eq!(a.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
        assert_eq!(b.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
    }
}
