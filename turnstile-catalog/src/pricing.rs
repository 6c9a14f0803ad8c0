//! Date-scoped ticket price resolution.
//!
//! Resolution order for a (ticket type, visit date) pair:
//! day-level special price (admin override, general admission only),
//! then the first active seasonal rate covering the date,
//! then the catalog base price.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::ticket::{TicketCatalog, TicketType};

/// A date-ranged override of base ticket prices (peak season, festivals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalRate {
    pub id: Uuid,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub prices: HashMap<TicketType, Decimal>,
    pub is_active: bool,
}

impl SeasonalRate {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.is_active && self.starts_on <= date && date <= self.ends_on
    }
}

/// Read-only price lookup combining catalog base prices and seasonal rates.
#[derive(Debug, Clone, Default)]
pub struct RateCard {
    catalog: TicketCatalog,
    seasons: Vec<SeasonalRate>,
}

impl RateCard {
    pub fn new(catalog: TicketCatalog, mut seasons: Vec<SeasonalRate>) -> Self {
        // Earlier start dates first; the first covering rate wins.
        seasons.sort_by_key(|s| s.starts_on);
        Self { catalog, seasons }
    }

    /// Resolve the unit price for a ticket type on a given date.
    ///
    /// `day_special` is the availability day's admin price override; it
    /// applies to general admission only.
    pub fn unit_price(
        &self,
        ticket: TicketType,
        date: NaiveDate,
        day_special: Option<Decimal>,
    ) -> Option<Decimal> {
        if ticket == TicketType::General {
            if let Some(special) = day_special {
                return Some(special);
            }
        }
        for season in &self.seasons {
            if season.covers(date) {
                if let Some(price) = season.prices.get(&ticket) {
                    return Some(*price);
                }
            }
        }
        self.catalog.base_price(ticket)
    }

    /// The catalog base price, ignoring date overrides.
    pub fn base_price(&self, ticket: TicketType) -> Option<Decimal> {
        self.catalog.base_price(ticket)
    }

    pub fn set_base_price(&mut self, ticket: TicketType, price: Decimal) {
        self.catalog.set_price(ticket, price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn card() -> RateCard {
        let mut prices = HashMap::new();
        prices.insert(TicketType::General, dec!(400));
        prices.insert(TicketType::Child, dec!(280));
        prices.insert(TicketType::Senior, dec!(320));
        let season = SeasonalRate {
            id: Uuid::new_v4(),
            name: "Winter peak".to_string(),
            starts_on: NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2027, 1, 5).unwrap(),
            prices: HashMap::from([(TicketType::General, dec!(500))]),
            is_active: true,
        };
        RateCard::new(TicketCatalog::new(prices), vec![season])
    }

    #[test]
    fn base_price_outside_season() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(card().unit_price(TicketType::General, date, None), Some(dec!(400)));
    }

    #[test]
    fn seasonal_rate_overrides_base() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let card = card();
        assert_eq!(card.unit_price(TicketType::General, date, None), Some(dec!(500)));
        // season has no child price; base applies
        assert_eq!(card.unit_price(TicketType::Child, date, None), Some(dec!(280)));
    }

    #[test]
    fn day_special_outranks_season() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let card = card();
        assert_eq!(
            card.unit_price(TicketType::General, date, Some(dec!(250))),
            Some(dec!(250))
        );
        // special price never touches other ticket types
        assert_eq!(
            card.unit_price(TicketType::Child, date, Some(dec!(250))),
            Some(dec!(280))
        );
    }
}
