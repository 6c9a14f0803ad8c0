use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use turnstile_catalog::TicketType;
use uuid::Uuid;

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Value is a percentage, 0-100.
    Percentage,
    /// Value is a fixed currency amount.
    Fixed,
}

/// A rule-gated discounted ticket (birthday promotion).
///
/// Consulted read-only during pricing; usage counters move only when a
/// booking is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthdayOffer {
    pub id: Uuid,
    pub name: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    /// Ticket type whose price the discount is applied to.
    pub reference_ticket: TicketType,
    /// Visit may fall this many days before the birthday anniversary...
    pub days_before: i64,
    /// ...or this many days after it.
    pub days_after: i64,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// Maximum offer tickets in a single booking.
    pub per_booking_cap: u32,
    /// Lifetime usage cap; `None` means unlimited.
    pub total_usage_cap: Option<u32>,
    pub used_count: u32,
    /// Optional validity period; `None` means always available.
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub is_active: bool,
}

impl BirthdayOffer {
    /// Whether the offer can be sold for a visit on `date` at all
    /// (activity and validity period; customer eligibility is separate).
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(from) = self.valid_from {
            if date < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if date > until {
                return false;
            }
        }
        true
    }

    /// Discounted unit price given the resolved price of the reference ticket.
    pub fn discounted_unit_price(&self, unit_price: Decimal) -> Decimal {
        match self.discount_kind {
            DiscountKind::Percentage => {
                unit_price * (Decimal::ONE_HUNDRED - self.discount_value) / Decimal::ONE_HUNDRED
            }
            DiscountKind::Fixed => (unit_price - self.discount_value).max(Decimal::ZERO),
        }
    }
}

/// Admin-authored promotional code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: Uuid,
    /// Stored normalized (trimmed, uppercased); lookups are case-insensitive.
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    pub min_order_amount: Decimal,
    /// Cap on the computed discount; only meaningful for percentage codes.
    pub max_discount: Option<Decimal>,
    /// Lifetime usage cap; `None` means unlimited.
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl PromoCode {
    pub fn normalize(code: &str) -> String {
        code.trim().to_uppercase()
    }

    pub fn is_within_validity(&self, at: DateTime<Utc>) -> bool {
        if let Some(from) = self.valid_from {
            if at < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if at > until {
                return false;
            }
        }
        true
    }

    pub fn usage_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.used_count >= limit)
    }
}
