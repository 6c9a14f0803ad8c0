use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Admission ticket categories sold at every location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    General,
    Child,
    Senior,
}

impl TicketType {
    pub const ALL: [TicketType; 3] = [TicketType::General, TicketType::Child, TicketType::Senior];
}

/// Admin-mutable mapping of ticket type to base unit price.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TicketCatalog {
    prices: HashMap<TicketType, Decimal>,
}

impl TicketCatalog {
    pub fn new(prices: HashMap<TicketType, Decimal>) -> Self {
        Self { prices }
    }

    pub fn base_price(&self, ticket: TicketType) -> Option<Decimal> {
        self.prices.get(&ticket).copied()
    }

    pub fn set_price(&mut self, ticket: TicketType, price: Decimal) {
        self.prices.insert(ticket, price);
    }
}

/// A per-person extra (audio guide, locker, meal voucher).
///
/// Add-ons are flat-priced and never touched by group or promo discounts;
/// their quantity is capped at the booking's headcount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Addon {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub is_active: bool,
    pub display_order: i32,
}

impl Addon {
    pub fn new(name: impl Into<String>, price: Decimal, display_order: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            is_active: true,
            display_order,
        }
    }
}
