pub mod availability;
pub mod location;
pub mod pricing;
pub mod ticket;

pub use availability::{AvailabilityDay, AvailabilityError, AvailabilityLedger, DayStatus};
pub use location::Location;
pub use pricing::{RateCard, SeasonalRate};
pub use ticket::{Addon, TicketCatalog, TicketType};
