use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{EngineError, EngineResult};

/// Route search by free-text source/destination on one travel date.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub source: String,
    pub destination: String,
    pub date: NaiveDate, // Just date, time of day is irrelevant to availability
}

impl SearchQuery {
    pub fn validate(&self) -> EngineResult<()> {
        if self.source.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(EngineError::Validation(
                "Please provide source, destination, and date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Seat map lookup for one bus on one route and date.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapQuery {
    pub route_id: Uuid,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_deserialization() {
        let json = r#"
            {
                "source": "Pune",
                "destination": "Goa",
                "date": "2025-06-01"
            }
        "#;
        let query: SearchQuery = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(query.source, "Pune");
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_blank_source_is_rejected() {
        let query = SearchQuery {
            source: "  ".into(),
            destination: "Goa".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        };
        assert!(matches!(query.validate(), Err(EngineError::Validation(_))));
    }
}
