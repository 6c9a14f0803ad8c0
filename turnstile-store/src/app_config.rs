use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use turnstile_booking::BookingPolicy;
use turnstile_offer::GroupDiscountPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
    pub sweep: SweepConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    /// How often the expiry sweep runs.
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub min_tickets_per_booking: u32,
    pub max_tickets_per_booking: u32,
    /// Payment hold lifetime for `pending_payment` bookings.
    pub hold_minutes: i64,
    pub reference_prefix: String,
    pub small_group_size: u32,
    /// Whole-number percentage, e.g. 5 for 5%.
    pub small_group_percent: u32,
    pub large_group_size: u32,
    pub large_group_percent: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "INR".to_string()
}

impl BusinessRules {
    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            min_tickets: self.min_tickets_per_booking,
            max_tickets: self.max_tickets_per_booking,
            hold_minutes: self.hold_minutes,
            reference_prefix: self.reference_prefix.clone(),
            group_discount: GroupDiscountPolicy {
                small_group_size: self.small_group_size,
                small_group_percent: Decimal::from(self.small_group_percent),
                large_group_size: self.large_group_size,
                large_group_percent: Decimal::from(self.large_group_percent),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment file; optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TURNSTILE_SERVER__PORT=9000` sets server.port
            .add_source(config::Environment::with_prefix("TURNSTILE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
