//! The pricing calculator.
//!
//! A pure function from a quote request plus read-only rule lookups to an
//! itemized price breakdown. No side effects, no I/O; identical inputs
//! always produce an identical breakdown, which is what makes quote calls
//! cheap and safe to race.
//!
//! Stacking order is a contract:
//! ticket lines -> offer-ticket lines -> add-on lines -> subtotal ->
//! group discount (add-ons excluded from the base) -> promo discount ->
//! clamp at zero -> round once.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use turnstile_catalog::{Addon, RateCard, TicketType};
use turnstile_core::money::{percent_of, round_currency};
use uuid::Uuid;

use crate::models::{BirthdayOffer, PromoCode};
use crate::rules;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("No price configured for ticket type {0:?}")]
    MissingTicketPrice(TicketType),

    #[error("Unknown or inactive add-on: {0}")]
    UnknownAddon(Uuid),

    #[error("Add-on quantity {quantity} exceeds booking headcount {headcount}")]
    AddonQuantityExceedsHeadcount {
        addon_id: Uuid,
        quantity: u32,
        headcount: u32,
    },

    #[error("Unknown offer: {0}")]
    UnknownOffer(Uuid),

    #[error("Offer {0} is not available for this date")]
    OfferUnavailable(Uuid),

    #[error("Promo code not found")]
    PromoNotFound,

    #[error("Promo code outside its validity window")]
    PromoExpired,

    #[error("Order subtotal below the promo minimum of {0}")]
    PromoMinimumNotMet(Decimal),

    #[error("Promo code usage limit reached")]
    PromoUsageExceeded,
}

/// What the customer asked to buy.
///
/// Maps use `BTreeMap` so a request (and therefore its breakdown) has a
/// stable iteration order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuoteRequest {
    pub visit_date: NaiveDate,
    pub tickets: BTreeMap<TicketType, u32>,
    /// Offer id -> quantity.
    pub offer_tickets: BTreeMap<Uuid, u32>,
    /// Add-on id -> quantity.
    pub addons: BTreeMap<Uuid, u32>,
    pub promo_code: Option<String>,
}

impl QuoteRequest {
    /// Regular plus offer tickets; add-ons never count.
    pub fn headcount(&self) -> u32 {
        self.tickets.values().sum::<u32>() + self.offer_tickets.values().sum::<u32>()
    }
}

/// Read-only rule lookups the calculator consults.
pub struct PricingInputs<'a> {
    pub rate_card: &'a RateCard,
    /// Day-level admin price override, if the availability day carries one.
    pub day_special: Option<Decimal>,
    pub addons: &'a [Addon],
    pub offers: &'a [BirthdayOffer],
    pub promos: &'a [PromoCode],
    pub policy: &'a GroupDiscountPolicy,
    /// Clock for promo validity; passed in to keep the function pure.
    pub now: DateTime<Utc>,
}

/// Headcount-threshold percentage discount tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDiscountPolicy {
    pub small_group_size: u32,
    pub small_group_percent: Decimal,
    pub large_group_size: u32,
    pub large_group_percent: Decimal,
}

impl Default for GroupDiscountPolicy {
    fn default() -> Self {
        Self {
            small_group_size: 15,
            small_group_percent: Decimal::from(5),
            large_group_size: 30,
            large_group_percent: Decimal::from(10),
        }
    }
}

impl GroupDiscountPolicy {
    /// Highest tier met by the headcount.
    pub fn percent_for(&self, headcount: u32) -> Decimal {
        if headcount >= self.large_group_size {
            self.large_group_percent
        } else if headcount >= self.small_group_size {
            self.small_group_percent
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketLine {
    pub ticket: TicketType,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferLine {
    pub offer_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub full_unit_price: Decimal,
    pub discounted_unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddonLine {
    pub addon_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Itemized breakdown; captured immutably on the booking at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub visit_date: NaiveDate,
    pub ticket_lines: Vec<TicketLine>,
    pub offer_lines: Vec<OfferLine>,
    pub addon_lines: Vec<AddonLine>,
    pub headcount: u32,
    pub subtotal: Decimal,
    pub group_discount_percent: Decimal,
    pub group_discount: Decimal,
    pub promo_code: Option<String>,
    pub promo_discount: Decimal,
    pub total_discount: Decimal,
    pub final_total: Decimal,
}

/// Compute the full price breakdown for a request.
pub fn price_quote(
    request: &QuoteRequest,
    inputs: &PricingInputs<'_>,
) -> Result<PriceQuote, PricingError> {
    let headcount = request.headcount();

    // 1-2. Resolve unit prices and ticket line totals.
    let mut ticket_lines = Vec::new();
    for (&ticket, &quantity) in &request.tickets {
        if quantity == 0 {
            continue;
        }
        let unit_price = inputs
            .rate_card
            .unit_price(ticket, request.visit_date, inputs.day_special)
            .ok_or(PricingError::MissingTicketPrice(ticket))?;
        ticket_lines.push(TicketLine {
            ticket,
            quantity,
            unit_price,
            line_total: unit_price * Decimal::from(quantity),
        });
    }

    // 3. Offer-ticket lines: discount against the resolved price of the
    // offer's reference ticket type.
    let mut offer_lines = Vec::new();
    for (&offer_id, &quantity) in &request.offer_tickets {
        if quantity == 0 {
            continue;
        }
        let offer = inputs
            .offers
            .iter()
            .find(|o| o.id == offer_id)
            .ok_or(PricingError::UnknownOffer(offer_id))?;
        if !offer.is_available_on(request.visit_date) {
            return Err(PricingError::OfferUnavailable(offer_id));
        }
        let full_unit_price = inputs
            .rate_card
            .unit_price(offer.reference_ticket, request.visit_date, inputs.day_special)
            .ok_or(PricingError::MissingTicketPrice(offer.reference_ticket))?;
        let discounted_unit_price = offer.discounted_unit_price(full_unit_price);
        offer_lines.push(OfferLine {
            offer_id,
            name: offer.name.clone(),
            quantity,
            full_unit_price,
            discounted_unit_price,
            line_total: discounted_unit_price * Decimal::from(quantity),
        });
    }

    // 4. Add-on lines; flat prices, never discounted. Quantities are
    // capped at the headcount, so an invalid basket is rejected here and
    // not just at booking creation.
    let mut addon_lines = Vec::new();
    for (&addon_id, &quantity) in &request.addons {
        if quantity == 0 {
            continue;
        }
        if quantity > headcount {
            return Err(PricingError::AddonQuantityExceedsHeadcount {
                addon_id,
                quantity,
                headcount,
            });
        }
        let addon = inputs
            .addons
            .iter()
            .find(|a| a.id == addon_id && a.is_active)
            .ok_or(PricingError::UnknownAddon(addon_id))?;
        addon_lines.push(AddonLine {
            addon_id,
            name: addon.name.clone(),
            quantity,
            unit_price: addon.price,
            line_total: addon.price * Decimal::from(quantity),
        });
    }

    // 5. Subtotal over all lines.
    let ticket_portion: Decimal = ticket_lines.iter().map(|l| l.line_total).sum::<Decimal>()
        + offer_lines.iter().map(|l| l.line_total).sum::<Decimal>();
    let addon_portion: Decimal = addon_lines.iter().map(|l| l.line_total).sum();
    let subtotal = ticket_portion + addon_portion;

    // 6. Group discount on the ticket portion only.
    let group_discount_percent = inputs.policy.percent_for(headcount);
    let group_discount = percent_of(ticket_portion, group_discount_percent);

    // 7. Promo code, validated against the full subtotal, applied to what
    // remains after the group discount.
    let mut promo_discount = Decimal::ZERO;
    if let Some(code) = &request.promo_code {
        let promo = rules::lookup_promo(inputs.promos, code)?;
        rules::validate_promo(promo, subtotal, inputs.now)?;
        promo_discount = rules::promo_discount(promo, subtotal - group_discount);
    }

    // 8. Clamp, then round exactly once.
    let total_discount = group_discount + promo_discount;
    let final_total = round_currency((subtotal - total_discount).max(Decimal::ZERO));

    Ok(PriceQuote {
        visit_date: request.visit_date,
        ticket_lines,
        offer_lines,
        addon_lines,
        headcount,
        subtotal,
        group_discount_percent,
        group_discount,
        promo_code: request.promo_code.as_ref().map(|c| PromoCode::normalize(c)),
        promo_discount,
        total_discount,
        final_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscountKind;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use turnstile_catalog::TicketCatalog;

    fn rate_card() -> RateCard {
        let mut prices = HashMap::new();
        prices.insert(TicketType::General, dec!(400));
        prices.insert(TicketType::Child, dec!(280));
        prices.insert(TicketType::Senior, dec!(320));
        RateCard::new(TicketCatalog::new(prices), vec![])
    }

    fn visit() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 12).unwrap()
    }

    fn inputs<'a>(
        rate_card: &'a RateCard,
        addons: &'a [Addon],
        offers: &'a [BirthdayOffer],
        promos: &'a [PromoCode],
        policy: &'a GroupDiscountPolicy,
    ) -> PricingInputs<'a> {
        PricingInputs {
            rate_card,
            day_special: None,
            addons,
            offers,
            promos,
            policy,
            now: DateTime::parse_from_rfc3339("2026-09-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn promo(code: &str, kind: DiscountKind, value: Decimal) -> PromoCode {
        PromoCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            discount_kind: kind,
            discount_value: value,
            min_order_amount: dec!(0),
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
        }
    }

    #[test]
    fn group_discount_worked_example() {
        // 10 general @ 400 + 5 child @ 280 = 5400; 15 heads -> 5% = 270
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 10), (TicketType::Child, 5)]),
            ..Default::default()
        };
        let quote = price_quote(&request, &inputs(&card, &[], &[], &[], &policy)).unwrap();

        assert_eq!(quote.subtotal, dec!(5400));
        assert_eq!(quote.headcount, 15);
        assert_eq!(quote.group_discount_percent, dec!(5));
        assert_eq!(quote.group_discount, dec!(270));
        assert_eq!(quote.final_total, dec!(5130.00));
    }

    #[test]
    fn large_group_tier_wins() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 30)]),
            ..Default::default()
        };
        let quote = price_quote(&request, &inputs(&card, &[], &[], &[], &policy)).unwrap();
        assert_eq!(quote.group_discount_percent, dec!(10));
        assert_eq!(quote.group_discount, dec!(1200));
    }

    #[test]
    fn addons_excluded_from_group_discount_base() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let audio_guide = Addon::new("Audio guide", dec!(50), 1);
        let addons = vec![audio_guide.clone()];
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 15)]),
            addons: BTreeMap::from([(audio_guide.id, 10)]),
            ..Default::default()
        };
        let quote = price_quote(&request, &inputs(&card, &addons, &[], &[], &policy)).unwrap();

        // subtotal includes add-ons, the discount base does not
        assert_eq!(quote.subtotal, dec!(6500));
        assert_eq!(quote.group_discount, dec!(300)); // 5% of 6000
        assert_eq!(quote.final_total, dec!(6200.00));
    }

    #[test]
    fn addon_quantity_capped_at_headcount() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let audio_guide = Addon::new("Audio guide", dec!(50), 1);
        let addons = vec![audio_guide.clone()];
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 1)]),
            addons: BTreeMap::from([(audio_guide.id, 10)]),
            ..Default::default()
        };
        let err = price_quote(&request, &inputs(&card, &addons, &[], &[], &policy)).unwrap_err();
        assert_eq!(
            err,
            PricingError::AddonQuantityExceedsHeadcount {
                addon_id: audio_guide.id,
                quantity: 10,
                headcount: 1,
            }
        );
    }

    #[test]
    fn offer_ticket_discounts_reference_price() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let offer = BirthdayOffer {
            id: Uuid::new_v4(),
            name: "Birthday 50%".to_string(),
            discount_kind: DiscountKind::Percentage,
            discount_value: dec!(50),
            reference_ticket: TicketType::General,
            days_before: 7,
            days_after: 7,
            min_age: None,
            max_age: None,
            per_booking_cap: 2,
            total_usage_cap: None,
            used_count: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
        };
        let offers = vec![offer.clone()];
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 1)]),
            offer_tickets: BTreeMap::from([(offer.id, 1)]),
            ..Default::default()
        };
        let quote = price_quote(&request, &inputs(&card, &[], &offers, &[], &policy)).unwrap();

        assert_eq!(quote.offer_lines[0].full_unit_price, dec!(400));
        assert_eq!(quote.offer_lines[0].discounted_unit_price, dec!(200));
        assert_eq!(quote.headcount, 2);
        assert_eq!(quote.final_total, dec!(600.00));
    }

    #[test]
    fn promo_applies_after_group_discount() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let promos = vec![promo("SAVE10", DiscountKind::Percentage, dec!(10))];
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 15)]),
            promo_code: Some("save10".to_string()),
            ..Default::default()
        };
        let quote = price_quote(&request, &inputs(&card, &[], &[], &promos, &policy)).unwrap();

        // 6000 - 5% = 5700; promo is 10% of 5700, not of 6000
        assert_eq!(quote.group_discount, dec!(300));
        assert_eq!(quote.promo_discount, dec!(570));
        assert_eq!(quote.final_total, dec!(5130.00));
    }

    #[test]
    fn promo_minimum_not_met_leaves_total_unchanged() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let mut gated = promo("BIG1000", DiscountKind::Fixed, dec!(200));
        gated.min_order_amount = dec!(1000);
        let promos = vec![gated];

        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::Child, 1)]),
            promo_code: Some("BIG1000".to_string()),
            ..Default::default()
        };
        let err = price_quote(&request, &inputs(&card, &[], &[], &promos, &policy)).unwrap_err();
        assert_eq!(err, PricingError::PromoMinimumNotMet(dec!(1000)));

        // without the code the quote is untouched
        let bare = QuoteRequest {
            promo_code: None,
            ..request
        };
        let quote = price_quote(&bare, &inputs(&card, &[], &[], &promos, &policy)).unwrap();
        assert_eq!(quote.final_total, dec!(280.00));
    }

    #[test]
    fn final_total_clamped_at_zero() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let promos = vec![promo("MEGA", DiscountKind::Fixed, dec!(99999))];
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 1)]),
            promo_code: Some("MEGA".to_string()),
            ..Default::default()
        };
        let quote = price_quote(&request, &inputs(&card, &[], &[], &promos, &policy)).unwrap();
        // fixed discount is capped at the payable amount
        assert_eq!(quote.promo_discount, dec!(400));
        assert_eq!(quote.final_total, dec!(0.00));
    }

    #[test]
    fn pricing_is_idempotent() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let promos = vec![promo("SAVE10", DiscountKind::Percentage, dec!(10))];
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 7), (TicketType::Senior, 2)]),
            promo_code: Some("SAVE10".to_string()),
            ..Default::default()
        };
        let input = inputs(&card, &[], &[], &promos, &policy);
        let first = price_quote(&request, &input).unwrap();
        let second = price_quote(&request, &input).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn expired_promo_rejected() {
        let card = rate_card();
        let policy = GroupDiscountPolicy::default();
        let mut old = promo("OLD", DiscountKind::Percentage, dec!(10));
        old.valid_until = Some(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        let promos = vec![old];
        let request = QuoteRequest {
            visit_date: visit(),
            tickets: BTreeMap::from([(TicketType::General, 1)]),
            promo_code: Some("OLD".to_string()),
            ..Default::default()
        };
        let err = price_quote(&request, &inputs(&card, &[], &[], &promos, &policy)).unwrap_err();
        assert_eq!(err, PricingError::PromoExpired);
    }
}
