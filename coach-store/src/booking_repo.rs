use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use coach_catalog::StopPoint;
use coach_core::calendar::DayWindow;
use coach_core::payment::{PaymentMethod, PaymentStatus};
use coach_core::{StoreError, StoreResult};
use coach_order::{Booking, BookingFilter, BookingStatus, BookingStore, SeatAssignment};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{backend, corrupt, is_seat_violation, store_err};

/// Postgres-backed bookings. Seats are mirrored into `booking_seats`, whose
/// partial unique index refuses a second confirmed holder for a seat.
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Which of `seats` are confirmed on the trip right now, in the given order.
    async fn held_seats(&self, booking: &Booking) -> StoreResult<Vec<String>> {
        let requested: Vec<String> = booking.seat_numbers().map(str::to_string).collect();
        let held: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT seat_number FROM booking_seats
            WHERE active AND bus_id = $1 AND route_id = $2 AND journey_date = $3
              AND seat_number = ANY($4)
            "#,
        )
        .bind(booking.bus_id)
        .bind(booking.route_id)
        .bind(booking.journey_date)
        .bind(&requested)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(requested.into_iter().filter(|s| held.contains(s)).collect())
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    bus_id: Uuid,
    route_id: Uuid,
    journey_date: NaiveDate,
    departs_at: DateTime<Utc>,
    seats: Json<Vec<SeatAssignment>>,
    boarding_point: Option<Json<StopPoint>>,
    dropping_point: Option<Json<StopPoint>>,
    total_amount: i64,
    payment_status: String,
    payment_method: Option<String>,
    transaction_id: Option<String>,
    booking_status: String,
    cancellation_reason: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    refund_amount: i64,
    booking_code: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .as_deref()
            .map(str::parse::<PaymentMethod>)
            .transpose()
            .map_err(|e| corrupt("payment method", e))?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            bus_id: row.bus_id,
            route_id: row.route_id,
            journey_date: row.journey_date,
            departs_at: row.departs_at,
            seats: row.seats.0,
            boarding_point: row.boarding_point.map(|p| p.0),
            dropping_point: row.dropping_point.map(|p| p.0),
            total_amount: row.total_amount,
            payment_status: row
                .payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| corrupt("payment status", e))?,
            payment_method,
            transaction_id: row.transaction_id,
            booking_status: row
                .booking_status
                .parse::<BookingStatus>()
                .map_err(|e| corrupt("booking status", e))?,
            cancellation_reason: row.cancellation_reason,
            cancelled_at: row.cancelled_at,
            refund_amount: row.refund_amount,
            booking_id: row.booking_code,
            created_at: row.created_at,
        })
    }
}

fn collect(rows: Vec<BookingRow>) -> StoreResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

const COLUMNS: &str = "id, user_id, bus_id, route_id, journey_date, departs_at, seats, boarding_point, \
     dropping_point, total_amount, payment_status, payment_method, transaction_id, booking_status, \
     cancellation_reason, cancelled_at, refund_amount, booking_code, created_at";

#[async_trait]
impl BookingStore for PgBookingRepository {
    async fn confirmed_for_trip(
        &self,
        bus_id: Uuid,
        route_id: Uuid,
        window: DayWindow,
    ) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings \
             WHERE bus_id = $1 AND route_id = $2 AND journey_date = $3 AND booking_status = 'confirmed'",
            COLUMNS
        ))
        .bind(bus_id)
        .bind(route_id)
        .bind(window.date())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }

    async fn create(&self, booking: &Booking) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, bus_id, route_id, journey_date, departs_at, seats,
                                  boarding_point, dropping_point, total_amount, payment_status,
                                  payment_method, transaction_id, booking_status, refund_amount,
                                  booking_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.bus_id)
        .bind(booking.route_id)
        .bind(booking.journey_date)
        .bind(booking.departs_at)
        .bind(Json(&booking.seats))
        .bind(booking.boarding_point.as_ref().map(Json))
        .bind(booking.dropping_point.as_ref().map(Json))
        .bind(booking.total_amount)
        .bind(booking.payment_status.as_str())
        .bind(booking.payment_method.map(|m| m.as_str()))
        .bind(&booking.transaction_id)
        .bind(booking.booking_status.as_str())
        .bind(booking.refund_amount)
        .bind(&booking.booking_id)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_err(e, "Booking code already exists"))?;

        let mut seat_conflict = false;
        for seat in booking.seat_numbers() {
            let inserted = sqlx::query(
                r#"
                INSERT INTO booking_seats (booking_id, bus_id, route_id, journey_date, seat_number, active)
                VALUES ($1, $2, $3, $4, $5, TRUE)
                "#,
            )
            .bind(booking.id)
            .bind(booking.bus_id)
            .bind(booking.route_id)
            .bind(booking.journey_date)
            .bind(seat)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(err) if is_seat_violation(&err) => {
                    seat_conflict = true;
                    break;
                }
                Err(err) => return Err(backend(err)),
            }
        }

        if seat_conflict {
            tx.rollback().await.map_err(backend)?;
            let taken = self.held_seats(booking).await?;
            tracing::warn!(booking_id = %booking.booking_id, seats = ?taken, "Seat index rejected booking");
            return Err(StoreError::SeatsTaken(taken));
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(Booking::try_from).transpose()
    }

    async fn update(&self, booking: &Booking) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = $2, payment_method = $3, transaction_id = $4, booking_status = $5,
                cancellation_reason = $6, cancelled_at = $7, refund_amount = $8
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(booking.payment_status.as_str())
        .bind(booking.payment_method.map(|m| m.as_str()))
        .bind(&booking.transaction_id)
        .bind(booking.booking_status.as_str())
        .bind(&booking.cancellation_reason)
        .bind(booking.cancelled_at)
        .bind(booking.refund_amount)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query("UPDATE booking_seats SET active = $2 WHERE booking_id = $1")
            .bind(booking.id)
            .bind(booking.is_confirmed())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings \
             WHERE ($1::text IS NULL OR booking_status = $1) \
               AND ($2::date IS NULL OR journey_date = $2) \
               AND ($3::uuid IS NULL OR bus_id = $3) \
             ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.date)
        .bind(filter.bus_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }

    async fn has_upcoming_for_bus(&self, bus_id: Uuid, from: NaiveDate) -> StoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookings \
             WHERE bus_id = $1 AND journey_date >= $2 AND booking_status = 'confirmed')",
        )
        .bind(bus_id)
        .bind(from)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }

    async fn has_upcoming_for_route(&self, route_id: Uuid, from: NaiveDate) -> StoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookings \
             WHERE route_id = $1 AND journey_date >= $2 AND booking_status = 'confirmed')",
        )
        .bind(route_id)
        .bind(from)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }

    async fn upcoming_for_bus(&self, bus_id: Uuid, from: NaiveDate) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings \
             WHERE bus_id = $1 AND journey_date >= $2 AND booking_status = 'confirmed'",
            COLUMNS
        ))
        .bind(bus_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }
}
