use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical venue that sells dated admission slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    /// Capacity template used when an availability day is first touched.
    pub default_capacity: i32,
    pub is_active: bool,
    // Display-only contact fields, never consulted by the engine.
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl Location {
    pub fn new(name: impl Into<String>, default_capacity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            default_capacity,
            is_active: true,
            address: None,
            phone: None,
        }
    }
}
