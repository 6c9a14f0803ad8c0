//! Eligibility rules for promo codes and birthday offers.
//!
//! Promo validation here is advisory at quote time; the lifecycle manager
//! re-checks usage against the authoritative store at confirmation.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use turnstile_core::money::percent_of;

use crate::models::{BirthdayOffer, DiscountKind, PromoCode};
use crate::quote::PricingError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OfferError {
    #[error("Offer is not active or outside its validity period")]
    Unavailable,

    #[error("Visitor age {age} is outside the offer's {min}..={max} range")]
    AgeOutOfRange { age: i32, min: i32, max: i32 },

    #[error("Visit date is {days_off} days outside the birthday window")]
    OutsideBirthdayWindow { days_off: i64 },

    #[error("At most {cap} offer tickets per booking")]
    PerBookingCapExceeded { cap: u32 },

    #[error("Offer usage cap exhausted")]
    UsageCapExhausted,
}

/// Case-insensitive promo lookup. Inactive codes are reported as missing.
pub fn lookup_promo<'a>(
    promos: &'a [PromoCode],
    code: &str,
) -> Result<&'a PromoCode, PricingError> {
    let normalized = PromoCode::normalize(code);
    promos
        .iter()
        .find(|p| p.code == normalized && p.is_active)
        .ok_or(PricingError::PromoNotFound)
}

/// Validate a promo code against the order subtotal at a point in time.
pub fn validate_promo(
    promo: &PromoCode,
    subtotal: Decimal,
    at: DateTime<Utc>,
) -> Result<(), PricingError> {
    if !promo.is_within_validity(at) {
        return Err(PricingError::PromoExpired);
    }
    if subtotal < promo.min_order_amount {
        return Err(PricingError::PromoMinimumNotMet(promo.min_order_amount));
    }
    if promo.usage_exhausted() {
        return Err(PricingError::PromoUsageExceeded);
    }
    Ok(())
}

/// Discount a validated promo grants on the remaining payable amount.
pub fn promo_discount(promo: &PromoCode, payable: Decimal) -> Decimal {
    match promo.discount_kind {
        DiscountKind::Percentage => {
            let discount = percent_of(payable, promo.discount_value);
            match promo.max_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
        // A fixed discount never exceeds what is left to pay.
        DiscountKind::Fixed => promo.discount_value.min(payable),
    }
}

/// Validate a customer's birthday-offer eligibility for a visit.
///
/// Checked by the lifecycle manager at booking time; the calculator only
/// needs the discount rate.
pub fn check_offer_eligibility(
    offer: &BirthdayOffer,
    birthday: NaiveDate,
    visit_date: NaiveDate,
    quantity: u32,
) -> Result<(), OfferError> {
    if !offer.is_available_on(visit_date) {
        return Err(OfferError::Unavailable);
    }
    if quantity > offer.per_booking_cap {
        return Err(OfferError::PerBookingCapExceeded {
            cap: offer.per_booking_cap,
        });
    }
    if let Some(cap) = offer.total_usage_cap {
        if offer.used_count + quantity > cap {
            return Err(OfferError::UsageCapExhausted);
        }
    }

    let age = age_on(birthday, visit_date);
    let min = offer.min_age.unwrap_or(0);
    let max = offer.max_age.unwrap_or(i32::MAX);
    if age < min || age > max {
        return Err(OfferError::AgeOutOfRange { age, min, max });
    }

    let days_off = days_from_birthday_window(birthday, visit_date, offer.days_before, offer.days_after);
    if days_off != 0 {
        return Err(OfferError::OutsideBirthdayWindow { days_off });
    }
    Ok(())
}

fn age_on(birthday: NaiveDate, at: NaiveDate) -> i32 {
    let mut age = at.year() - birthday.year();
    if (at.month(), at.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age
}

/// Zero when the visit falls within [anniversary - before, anniversary + after]
/// for the nearest birthday anniversary; otherwise the signed distance to the
/// window edge.
fn days_from_birthday_window(
    birthday: NaiveDate,
    visit: NaiveDate,
    before: i64,
    after: i64,
) -> i64 {
    let mut best: Option<i64> = None;
    for year in [visit.year() - 1, visit.year(), visit.year() + 1] {
        // Feb 29 birthdays fall back to Mar 1 in common years.
        let Some(anniversary) = NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        else {
            continue;
        };
        let delta = (visit - anniversary).num_days();
        let off = if delta < -before {
            delta + before
        } else if delta > after {
            delta - after
        } else {
            0
        };
        best = Some(match best {
            Some(b) if b.abs() <= off.abs() => b,
            _ => off,
        });
        if best == Some(0) {
            break;
        }
    }
    best.unwrap_or(i64::MAX)
}
