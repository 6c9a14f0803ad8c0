pub mod models;
pub mod quote;
pub mod rules;

pub use models::{BirthdayOffer, DiscountKind, PromoCode};
pub use quote::{GroupDiscountPolicy, PriceQuote, PricingError, PricingInputs, QuoteRequest};
pub use rules::OfferError;
