use chrono::{DateTime, Utc};
use coach_core::{text_enum, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_SEATS: u32 = 60;

text_enum! {
    pub enum BusType {
        Ac => "AC",
        NonAc => "Non-AC",
        Sleeper => "Sleeper",
        SemiSleeper => "Semi-Sleeper",
        Volvo => "Volvo",
        Luxury => "Luxury",
    }
}

text_enum! {
    pub enum Amenity {
        WiFi => "WiFi",
        ChargingPoint => "Charging Point",
        WaterBottle => "Water Bottle",
        Blanket => "Blanket",
        Tv => "TV",
        ReadingLight => "Reading Light",
        EmergencyExit => "Emergency Exit",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bus {
    pub id: Uuid,
    pub name: String,
    pub bus_number: String,
    pub bus_type: BusType,
    pub total_seats: u32,
    pub amenities: Vec<Amenity>,
    pub operator: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin payload for adding or replacing a bus.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusInput {
    pub name: String,
    pub bus_number: String,
    pub bus_type: BusType,
    pub total_seats: u32,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    pub operator: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl BusInput {
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Validation("Please provide bus name".to_string()));
        }
        if self.bus_number.trim().is_empty() {
            return Err(EngineError::Validation("Please provide bus number".to_string()));
        }
        if self.operator.trim().is_empty() {
            return Err(EngineError::Validation("Please provide operator name".to_string()));
        }
        if self.total_seats == 0 || self.total_seats > MAX_SEATS {
            return Err(EngineError::Validation(format!(
                "Total seats must be between 1 and {}",
                MAX_SEATS
            )));
        }
        Ok(())
    }

    /// Builds a new bus record. Bus numbers are stored trimmed and upper-cased.
    pub fn into_bus(self, now: DateTime<Utc>) -> EngineResult<Bus> {
        self.validate()?;
        Ok(Bus {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            bus_number: self.bus_number.trim().to_uppercase(),
            bus_type: self.bus_type,
            total_seats: self.total_seats,
            amenities: dedup(self.amenities),
            operator: self.operator.trim().to_string(),
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies this payload over an existing bus, keeping its id and creation time.
    pub fn apply_to(self, existing: &Bus, now: DateTime<Utc>) -> EngineResult<Bus> {
        let mut bus = self.into_bus(now)?;
        bus.id = existing.id;
        bus.created_at = existing.created_at;
        Ok(bus)
    }
}

fn dedup(amenities: Vec<Amenity>) -> Vec<Amenity> {
    let mut out: Vec<Amenity> = Vec::with_capacity(amenities.len());
    for a in amenities {
        if !out.contains(&a) {
            out.push(a);
        }
    }
    out
}
