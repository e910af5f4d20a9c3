use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use coach_core::calendar::{is_weekday_name, parse_clock_time, weekday_name};
use coach_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named pick-up or drop-off stop with its scheduled time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPoint {
    pub location: String,
    #[serde(default)]
    pub time: String,
}

impl StopPoint {
    pub fn validate(&self) -> EngineResult<()> {
        if self.location.trim().is_empty() {
            return Err(EngineError::Validation("Stop location cannot be empty".to_string()));
        }
        if !self.time.is_empty() && parse_clock_time(&self.time).is_none() {
            return Err(EngineError::Validation(format!(
                "Invalid stop time '{}', expected HH:MM",
                self.time
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub source: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub distance: u32,
    /// Fare per seat, in minor currency units.
    pub price: i64,
    pub days: Vec<String>,
    pub boarding_points: Vec<StopPoint>,
    pub dropping_points: Vec<StopPoint>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    /// A route with no day list runs every day.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.days.is_empty() || self.days.iter().any(|d| d == weekday_name(date))
    }

    pub fn departure(&self) -> Option<NaiveTime> {
        parse_clock_time(&self.departure_time)
    }

    /// Case-insensitive substring match on both ends of the route.
    pub fn matches(&self, source: &str, destination: &str) -> bool {
        contains_ignore_case(&self.source, source)
            && contains_ignore_case(&self.destination, destination)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

/// Admin payload for adding or replacing a route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInput {
    pub bus_id: Uuid,
    pub source: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub distance: u32,
    pub price: i64,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub boarding_points: Vec<StopPoint>,
    #[serde(default)]
    pub dropping_points: Vec<StopPoint>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl RouteInput {
    pub fn validate(&self) -> EngineResult<()> {
        if self.source.trim().is_empty() {
            return Err(EngineError::Validation("Please provide source location".to_string()));
        }
        if self.destination.trim().is_empty() {
            return Err(EngineError::Validation("Please provide destination location".to_string()));
        }
        for (label, value) in [("departure", &self.departure_time), ("arrival", &self.arrival_time)] {
            if parse_clock_time(value).is_none() {
                return Err(EngineError::Validation(format!(
                    "Please provide valid {} time in HH:MM format",
                    label
                )));
            }
        }
        if self.duration.trim().is_empty() {
            return Err(EngineError::Validation("Please provide journey duration".to_string()));
        }
        if self.distance < 1 {
            return Err(EngineError::Validation("Distance must be at least 1 km".to_string()));
        }
        if self.price < 0 {
            return Err(EngineError::Validation("Price cannot be negative".to_string()));
        }
        if let Some(bad) = self.days.iter().find(|d| !is_weekday_name(d)) {
            return Err(EngineError::Validation(format!("Unknown day of week: {}", bad)));
        }
        for stop in self.boarding_points.iter().chain(&self.dropping_points) {
            stop.validate()?;
        }
        Ok(())
    }

    pub fn into_route(self, now: DateTime<Utc>) -> EngineResult<Route> {
        self.validate()?;
        Ok(Route {
            id: Uuid::new_v4(),
            bus_id: self.bus_id,
            source: self.source.trim().to_string(),
            destination: self.destination.trim().to_string(),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            duration: self.duration,
            distance: self.distance,
            price: self.price,
            days: self.days,
            boarding_points: self.boarding_points,
            dropping_points: self.dropping_points,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_to(self, existing: &Route, now: DateTime<Utc>) -> EngineResult<Route> {
        let mut route = self.into_route(now)?;
        route.id = existing.id;
        route.created_at = existing.created_at;
        Ok(route)
    }
}
