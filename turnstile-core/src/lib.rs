pub mod money;
pub mod notify;
pub mod payment;
