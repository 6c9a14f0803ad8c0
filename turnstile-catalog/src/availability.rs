use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::location::Location;

/// Share of capacity at which a day is reported as Limited.
const LIMITED_FILL_RATIO: f64 = 0.95;

/// Capacity record for one (location, date) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityDay {
    pub location_id: Uuid,
    pub date: NaiveDate,
    pub total_capacity: i32,
    pub reserved_count: i32,
    pub is_blackout: bool,
    pub special_price: Option<Decimal>,
}

impl AvailabilityDay {
    pub fn from_template(location_id: Uuid, date: NaiveDate, default_capacity: i32) -> Self {
        Self {
            location_id,
            date,
            total_capacity: default_capacity,
            reserved_count: 0,
            is_blackout: false,
            special_price: None,
        }
    }

    pub fn remaining(&self) -> i32 {
        self.total_capacity - self.reserved_count
    }

    /// Derived status; a policy function, never stored.
    pub fn status(&self) -> DayStatus {
        if self.is_blackout || self.reserved_count >= self.total_capacity {
            return DayStatus::SoldOut;
        }
        let fill = self.reserved_count as f64 / self.total_capacity as f64;
        if fill >= LIMITED_FILL_RATIO {
            DayStatus::Limited
        } else {
            DayStatus::Available
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Available,
    Limited,
    SoldOut,
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Unknown location: {0}")]
    UnknownLocation(Uuid),

    #[error("Insufficient capacity: requested {requested}, available {available}")]
    CapacityExceeded { requested: i32, available: i32 },

    #[error("Date {0} is blacked out")]
    BlackoutDate(NaiveDate),

    #[error("Capacity {requested} is below the {reserved} seats already reserved")]
    CapacityBelowReserved { requested: i32, reserved: i32 },
}

/// In-memory capacity ledger, keyed by (location, date).
///
/// Days are created lazily from the location's capacity template the first
/// time a mutation touches them; reads materialize a view without writing.
/// Callers that share a ledger across tasks must serialize access (the
/// store layer wraps it in a mutex), which is what makes `try_reserve`
/// atomic per key.
pub struct AvailabilityLedger {
    locations: HashMap<Uuid, Location>,
    days: HashMap<(Uuid, NaiveDate), AvailabilityDay>,
}

impl AvailabilityLedger {
    pub fn new() -> Self {
        Self {
            locations: HashMap::new(),
            days: HashMap::new(),
        }
    }

    pub fn register_location(&mut self, location: Location) {
        self.locations.insert(location.id, location);
    }

    pub fn location(&self, location_id: &Uuid) -> Option<&Location> {
        self.locations.get(location_id)
    }

    /// Read-only view over an inclusive date range, one entry per date.
    pub fn get_range(
        &self,
        location_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, AvailabilityError> {
        let location = self
            .locations
            .get(&location_id)
            .ok_or(AvailabilityError::UnknownLocation(location_id))?;

        let mut out = Vec::new();
        let mut date = from;
        while date <= to {
            let day = self
                .days
                .get(&(location_id, date))
                .cloned()
                .unwrap_or_else(|| {
                    AvailabilityDay::from_template(location_id, date, location.default_capacity)
                });
            out.push(day);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(out)
    }

    /// Atomically reserve `count` seats; returns the new reserved count.
    pub fn try_reserve(
        &mut self,
        location_id: Uuid,
        date: NaiveDate,
        count: i32,
    ) -> Result<i32, AvailabilityError> {
        let day = self.day_mut(location_id, date)?;
        if day.is_blackout {
            return Err(AvailabilityError::BlackoutDate(date));
        }
        if day.reserved_count + count > day.total_capacity {
            return Err(AvailabilityError::CapacityExceeded {
                requested: count,
                available: day.remaining(),
            });
        }
        day.reserved_count += count;
        Ok(day.reserved_count)
    }

    /// Idempotent decrement, floor-clamped at zero. Never fails.
    pub fn release(&mut self, location_id: Uuid, date: NaiveDate, count: i32) {
        if let Some(day) = self.days.get_mut(&(location_id, date)) {
            day.reserved_count = (day.reserved_count - count).max(0);
        }
    }

    /// Admin override of capacity, blackout flag or special price.
    ///
    /// Rejects a capacity below the current reserved count rather than
    /// clamping it.
    pub fn set_override(
        &mut self,
        location_id: Uuid,
        date: NaiveDate,
        capacity: Option<i32>,
        is_blackout: Option<bool>,
        special_price: Option<Decimal>,
    ) -> Result<AvailabilityDay, AvailabilityError> {
        let day = self.day_mut(location_id, date)?;
        if let Some(new_capacity) = capacity {
            if new_capacity < day.reserved_count {
                return Err(AvailabilityError::CapacityBelowReserved {
                    requested: new_capacity,
                    reserved: day.reserved_count,
                });
            }
            day.total_capacity = new_capacity;
        }
        if let Some(blackout) = is_blackout {
            day.is_blackout = blackout;
        }
        if let Some(price) = special_price {
            day.special_price = Some(price);
        }
        Ok(day.clone())
    }

    pub fn day(&self, location_id: Uuid, date: NaiveDate) -> Option<&AvailabilityDay> {
        self.days.get(&(location_id, date))
    }

    fn day_mut(
        &mut self,
        location_id: Uuid,
        date: NaiveDate,
    ) -> Result<&mut AvailabilityDay, AvailabilityError> {
        let default_capacity = self
            .locations
            .get(&location_id)
            .ok_or(AvailabilityError::UnknownLocation(location_id))?
            .default_capacity;
        Ok(self
            .days
            .entry((location_id, date))
            .or_insert_with(|| AvailabilityDay::from_template(location_id, date, default_capacity)))
    }
}

impl Default for AvailabilityLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> (AvailabilityLedger, Uuid) {
        let mut ledger = AvailabilityLedger::new();
        let location = Location::new("Riverfront Museum", 100);
        let id = location.id;
        ledger.register_location(location);
        (ledger, id)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 12).unwrap()
    }

    #[test]
    fn reserve_and_release_lifecycle() {
        let (mut ledger, loc) = ledger();

        assert_eq!(ledger.try_reserve(loc, date(), 10).unwrap(), 10);
        assert_eq!(ledger.try_reserve(loc, date(), 5).unwrap(), 15);

        ledger.release(loc, date(), 5);
        assert_eq!(ledger.day(loc, date()).unwrap().reserved_count, 10);

        // release is clamped at zero and never fails
        ledger.release(loc, date(), 999);
        assert_eq!(ledger.day(loc, date()).unwrap().reserved_count, 0);
    }

    #[test]
    fn cannot_overcommit_capacity() {
        let (mut ledger, loc) = ledger();

        ledger.try_reserve(loc, date(), 95).unwrap();
        let err = ledger.try_reserve(loc, date(), 6).unwrap_err();
        assert!(matches!(
            err,
            AvailabilityError::CapacityExceeded { requested: 6, available: 5 }
        ));
        // the failed attempt left the count untouched
        assert_eq!(ledger.day(loc, date()).unwrap().reserved_count, 95);
    }

    #[test]
    fn blackout_refuses_any_reservation() {
        let (mut ledger, loc) = ledger();

        ledger.set_override(loc, date(), None, Some(true), None).unwrap();
        let err = ledger.try_reserve(loc, date(), 1).unwrap_err();
        assert!(matches!(err, AvailabilityError::BlackoutDate(_)));
        assert_eq!(ledger.day(loc, date()).unwrap().status(), DayStatus::SoldOut);
    }

    #[test]
    fn status_thresholds() {
        let (mut ledger, loc) = ledger();

        ledger.try_reserve(loc, date(), 94).unwrap();
        assert_eq!(ledger.day(loc, date()).unwrap().status(), DayStatus::Available);

        ledger.try_reserve(loc, date(), 1).unwrap();
        assert_eq!(ledger.day(loc, date()).unwrap().status(), DayStatus::Limited);

        ledger.try_reserve(loc, date(), 5).unwrap();
        assert_eq!(ledger.day(loc, date()).unwrap().status(), DayStatus::SoldOut);
    }

    #[test]
    fn override_below_reserved_is_rejected() {
        let (mut ledger, loc) = ledger();

        ledger.try_reserve(loc, date(), 40).unwrap();
        let err = ledger
            .set_override(loc, date(), Some(30), None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            AvailabilityError::CapacityBelowReserved { requested: 30, reserved: 40 }
        ));

        // raising capacity and setting a special price both stick
        let day = ledger
            .set_override(loc, date(), Some(150), None, Some(dec!(250)))
            .unwrap();
        assert_eq!(day.total_capacity, 150);
        assert_eq!(day.special_price, Some(dec!(250)));
    }

    #[test]
    fn range_view_is_lazy_and_ordered() {
        let (mut ledger, loc) = ledger();
        let from = date();
        let to = from + chrono::Duration::days(4);

        ledger.try_reserve(loc, from, 3).unwrap();
        let days = ledger.get_range(loc, from, to).unwrap();

        assert_eq!(days.len(), 5);
        assert_eq!(days[0].reserved_count, 3);
        assert!(days[1..].iter().all(|d| d.reserved_count == 0));
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
        // reads must not materialize rows
        assert!(ledger.day(loc, to).is_none());
    }
}
