use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};

/// The closed interval `[00:00:00.000, 23:59:59.999]` of one calendar date.
///
/// Bookings are scoped to a whole day: two bookings conflict only when they
/// fall inside the same window for the same bus and route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayWindow {
    date: NaiveDate,
}

impl DayWindow {
    pub fn for_date(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start() + Duration::days(1) - Duration::milliseconds(1)
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start() && at <= self.end()
    }

    /// The first instant of the day, read as UTC.
    pub fn opens_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start())
    }
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn is_weekday_name(name: &str) -> bool {
    matches!(
        name,
        "Monday" | "Tuesday" | "Wednesday" | "Thursday" | "Friday" | "Saturday" | "Sunday"
    )
}

/// Parses a 24-hour `H:MM` / `HH:MM` clock time (00:00 to 23:59).
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// The journey date at the scheduled departure time, read as UTC.
pub fn journey_instant(date: NaiveDate, departure: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(departure))
}
