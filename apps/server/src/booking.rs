//! Booking persistence: busy-interval reads, the atomic commit and the
//! status state machine.
//!
//! The commit path re-checks overlap against current store state inside a
//! single guarded INSERT, so two racing requests for overlapping intervals
//! can never both succeed — SQLite executes the statement atomically and
//! the guard re-encodes the same half-open predicate as `schedule::overlaps`.

use rand::Rng;
use sqlx::SqlitePool;

use crate::catalog::ServiceCatalog;
use crate::error::ApiError;
use crate::models::{Booking, BookingConfirmation, CreateBookingRequest};
use crate::schedule::{minutes_to_hhmm, overlaps, BusinessHours, BusyInterval};

/// Attempts at inserting with a fresh ticket before giving up. Collisions
/// on a 24-bit random code are rare; the UNIQUE constraint catches them.
const TICKET_ATTEMPTS: u32 = 3;

/// Busy `[start, end)` intervals for a date, from active bookings only.
/// Cancelled and done rows never block a slot.
pub async fn busy_intervals(db: &SqlitePool, date: &str) -> Result<Vec<BusyInterval>, sqlx::Error> {
    sqlx::query_as::<_, BusyInterval>(
        "SELECT start_min, end_min FROM bookings
         WHERE date = ? AND status = 'active'
         ORDER BY start_min ASC",
    )
    .bind(date)
    .fetch_all(db)
    .await
}

/// Random human-shareable confirmation code, e.g. `BS-4E9A1F`.
fn generate_ticket() -> String {
    let n: u32 = rand::rng().random_range(0..0x0100_0000);
    format!("BS-{:06X}", n)
}

/// Validate a booking request and atomically reserve the slot.
///
/// Validation order: field shape, service existence, business hours, then
/// the store-side overlap re-check. The slot list the client saw may be
/// stale by now; the conditional insert is what actually decides.
pub async fn create_booking(
    db: &SqlitePool,
    hours: &BusinessHours,
    catalog: &ServiceCatalog,
    req: &CreateBookingRequest,
) -> Result<BookingConfirmation, ApiError> {
    let name = req.name.trim();
    if name.len() < 2 {
        return Err(ApiError::validation("Nome inválido"));
    }

    let phone = req.phone.trim();
    if phone.chars().filter(|c| c.is_ascii_digit()).count() < 10 {
        return Err(ApiError::validation("Telefone inválido"));
    }

    if chrono::NaiveDate::parse_from_str(&req.date, "%Y-%m-%d").is_err() {
        return Err(ApiError::validation("Data inválida (YYYY-MM-DD)"));
    }

    let service = catalog
        .get(&req.service_key)
        .ok_or_else(|| ApiError::validation("Serviço inválido"))?;

    let start_min = req.start_min;
    let end_min = start_min + service.duration_min;
    if !hours.within_hours(start_min, service.duration_min) {
        return Err(ApiError::OutsideHours);
    }

    // The break is configuration, not a row, so the insert guard cannot
    // see it. Checking here is race-free: the break never changes.
    if let Some(brk) = &hours.break_interval {
        if overlaps(start_min, end_min, brk) {
            return Err(ApiError::SlotConflict);
        }
    }

    for attempt in 1..=TICKET_ATTEMPTS {
        let ticket = generate_ticket();
        match try_insert(db, &ticket, name, phone, service_row(service), req, start_min, end_min)
            .await
        {
            Ok(Some(booking)) => {
                tracing::info!(
                    "booking {} created: {} {} {}-{}",
                    booking.ticket,
                    booking.date,
                    booking.service_key,
                    booking.start_min,
                    booking.end_min
                );
                return Ok(confirmation(booking));
            }
            Ok(None) => return Err(ApiError::SlotConflict),
            Err(e) if is_ticket_collision(&e) && attempt < TICKET_ATTEMPTS => {
                tracing::warn!("ticket collision on {}, retrying", ticket);
            }
            Err(e) => return Err(ApiError::Store(e)),
        }
    }

    // Only reached if every attempt collided; the final attempt returns
    // its own error above.
    Err(ApiError::Store(sqlx::Error::Protocol(
        "ticket generation exhausted".into(),
    )))
}

struct ServiceRow {
    key: &'static str,
    label: &'static str,
    duration_min: i64,
    price_cents: i64,
}

fn service_row(svc: &crate::catalog::Service) -> ServiceRow {
    ServiceRow {
        key: svc.key,
        label: svc.label,
        duration_min: svc.duration_min,
        price_cents: svc.price_cents,
    }
}

/// One atomic overlap-check-then-insert. `Ok(None)` means the guard found
/// an overlapping active booking and nothing was written.
#[allow(clippy::too_many_arguments)]
async fn try_insert(
    db: &SqlitePool,
    ticket: &str,
    name: &str,
    phone: &str,
    svc: ServiceRow,
    req: &CreateBookingRequest,
    start_min: i64,
    end_min: i64,
) -> Result<Option<Booking>, sqlx::Error> {
    // Guard condition mirrors schedule::overlaps (half-open intervals).
    let result = sqlx::query(
        "INSERT INTO bookings
            (ticket, name, phone, service_key, service_label,
             duration_min, price_cents, date, start_min, end_min)
         SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
         WHERE NOT EXISTS (
             SELECT 1 FROM bookings
             WHERE date = ? AND status = 'active'
               AND ? < end_min AND ? > start_min
         )",
    )
    .bind(ticket)
    .bind(name)
    .bind(phone)
    .bind(svc.key)
    .bind(svc.label)
    .bind(svc.duration_min)
    .bind(svc.price_cents)
    .bind(&req.date)
    .bind(start_min)
    .bind(end_min)
    .bind(&req.date)
    .bind(start_min)
    .bind(end_min)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(db)
        .await?;

    Ok(Some(booking))
}

fn is_ticket_collision(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.message().contains("bookings.ticket"))
}

fn confirmation(b: Booking) -> BookingConfirmation {
    BookingConfirmation {
        id: b.id,
        ticket: b.ticket,
        name: b.name,
        phone: b.phone,
        start: minutes_to_hhmm(b.start_min),
        end: minutes_to_hhmm(b.end_min),
        date: b.date,
        service_label: b.service_label,
        duration_min: b.duration_min,
        price_cents: b.price_cents,
        created_at: b.created_at,
    }
}

// ── Status state machine ──

/// Terminal statuses an admin may set. `active` is only ever the initial
/// state; there is no way back into it.
pub const SETTABLE_STATUSES: &[&str] = &["cancelled", "done"];

/// Transition a booking out of `active`. Cancelling only shrinks the
/// active set for its date, so no overlap re-validation is needed.
pub async fn set_status(db: &SqlitePool, id: i64, status: &str) -> Result<(), ApiError> {
    if !SETTABLE_STATUSES.contains(&status) {
        return Err(ApiError::validation("status inválido"));
    }

    let result = sqlx::query("UPDATE bookings SET status = ? WHERE id = ? AND status = 'active'")
        .bind(status)
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Reserva ativa não encontrada".into()));
    }

    tracing::info!("booking {} set to {}", id, status);
    Ok(())
}

// ── Tests ──
