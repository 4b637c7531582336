use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use std::sync::Arc;

use crate::{
    auth, booking,
    error::ApiError,
    models::*,
    schedule::minutes_to_hhmm,
    AppState,
};

// ── Session ──

/// POST /api/admin/login — password in, session cookie out.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.sessions.password_matches(&body.password) {
        tracing::warn!("admin login rejected");
        return Err(ApiError::Unauthorized);
    }

    let token = state.sessions.issue();
    Ok((
        AppendHeaders([(header::SET_COOKIE, auth::session_cookie(&token))]),
        Json(ApiResponse::success("logged_in")),
    ))
}

/// POST /api/admin/logout — clear the session cookie.
pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, auth::clear_session_cookie())]),
        Json(ApiResponse::success("logged_out")),
    )
}

// ── Bookings ──

/// GET /api/admin/bookings?date=YYYY-MM-DD — a day's bookings, every
/// status, ordered by start.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminBookingsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingRow>>>, ApiError> {
    if chrono::NaiveDate::parse_from_str(&query.date, "%Y-%m-%d").is_err() {
        return Err(ApiError::validation("Data inválida (YYYY-MM-DD)"));
    }

    let bookings = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE date = ? ORDER BY start_min ASC",
    )
    .bind(&query.date)
    .fetch_all(&state.db)
    .await?;

    let rows = bookings
        .into_iter()
        .map(|b| BookingRow {
            start: minutes_to_hhmm(b.start_min),
            end: minutes_to_hhmm(b.end_min),
            booking: b,
        })
        .collect();

    Ok(Json(ApiResponse::success(rows)))
}

/// PATCH /api/admin/bookings/:id — move an active booking to a terminal
/// status (cancelled or done).
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBookingStatusRequest>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    booking::set_status(&state.db, id, &body.status).await?;
    Ok(Json(ApiResponse::success("updated")))
}

// ── Finance ──

fn validate_range(query: &FinanceRangeQuery) -> Result<(), ApiError> {
    let ok = chrono::NaiveDate::parse_from_str(&query.start, "%Y-%m-%d").is_ok()
        && chrono::NaiveDate::parse_from_str(&query.end, "%Y-%m-%d").is_ok();
    if ok {
        Ok(())
    } else {
        Err(ApiError::validation("start/end inválidos (YYYY-MM-DD)"))
    }
}

/// GET /api/admin/finance?start&end — ledger entries in a date range.
pub async fn list_finance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FinanceRangeQuery>,
) -> Result<Json<ApiResponse<Vec<FinanceEntry>>>, ApiError> {
    validate_range(&query)?;

    let entries = sqlx::query_as::<_, FinanceEntry>(
        "SELECT * FROM finance
         WHERE date >= ? AND date <= ?
         ORDER BY date DESC, id DESC",
    )
    .bind(&query.start)
    .bind(&query.end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/admin/finance/summary?start&end — totals for the range.
pub async fn finance_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FinanceRangeQuery>,
) -> Result<Json<ApiResponse<FinanceSummary>>, ApiError> {
    validate_range(&query)?;
    let summary = finance_totals(&state.db, &query.start, &query.end).await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn finance_totals(
    db: &sqlx::SqlitePool,
    start: &str,
    end: &str,
) -> Result<FinanceSummary, sqlx::Error> {
    let (total_in, total_out): (i64, i64) = sqlx::query_as(
        "SELECT
             COALESCE(SUM(CASE WHEN kind = 'in' THEN amount_cents ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN kind = 'out' THEN amount_cents ELSE 0 END), 0)
         FROM finance
         WHERE date >= ? AND date <= ?",
    )
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await?;

    Ok(FinanceSummary {
        total_in_cents: total_in,
        total_out_cents: total_out,
        net_cents: total_in - total_out,
    })
}

/// POST /api/admin/finance — record a cash-flow entry.
pub async fn add_finance(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddFinanceRequest>,
) -> Result<Json<ApiResponse<FinanceEntry>>, ApiError> {
    if body.kind != "in" && body.kind != "out" {
        return Err(ApiError::validation("kind inválido"));
    }
    if body.amount_cents <= 0 {
        return Err(ApiError::validation("valor inválido"));
    }
    if chrono::NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").is_err() {
        return Err(ApiError::validation("Data inválida (YYYY-MM-DD)"));
    }

    let id = sqlx::query(
        "INSERT INTO finance (kind, amount_cents, description, date) VALUES (?, ?, ?, ?)",
    )
    .bind(&body.kind)
    .bind(body.amount_cents)
    .bind(body.description.as_deref().map(str::trim))
    .bind(&body.date)
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    let entry = sqlx::query_as::<_, FinanceEntry>("SELECT * FROM finance WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(ApiResponse::success(entry)))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn add_entry(pool: &sqlx::SqlitePool, kind: &str, cents: i64, date: &str) {
        sqlx::query("INSERT INTO finance (kind, amount_cents, date) VALUES (?, ?, ?)")
            .bind(kind)
            .bind(cents)
            .bind(date)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_finance_totals_arithmetic() {
        let pool = test_pool().await;
        add_entry(&pool, "in", 4000, "2026-09-01").await;
        add_entry(&pool, "in", 3500, "2026-09-02").await;
        add_entry(&pool, "out", 1200, "2026-09-02").await;

        let summary = finance_totals(&pool, "2026-09-01", "2026-09-30").await.unwrap();
        assert_eq!(summary.total_in_cents, 7500);
        assert_eq!(summary.total_out_cents, 1200);
        assert_eq!(summary.net_cents, 6300);
    }

    #[tokio::test]
    async fn test_finance_totals_respects_range() {
        let pool = test_pool().await;
        add_entry(&pool, "in", 4000, "2026-08-31").await;
        add_entry(&pool, "in", 3500, "2026-09-01").await;

        let summary = finance_totals(&pool, "2026-09-01", "2026-09-30").await.unwrap();
        assert_eq!(summary.total_in_cents, 3500);
    }

    #[tokio::test]
    async fn test_finance_totals_empty_range_is_zero() {
        let pool = test_pool().await;
        let summary = finance_totals(&pool, "2026-09-01", "2026-09-30").await.unwrap();
        assert_eq!(summary.total_in_cents, 0);
        assert_eq!(summary.total_out_cents, 0);
        assert_eq!(summary.net_cents, 0);
    }

    #[test]
    fn test_validate_range() {
        let ok = FinanceRangeQuery {
            start: "2026-09-01".into(),
            end: "2026-09-30".into(),
        };
        assert!(validate_range(&ok).is_ok());

        let bad = FinanceRangeQuery {
            start: "soon".into(),
            end: "2026-09-30".into(),
        };
        assert!(validate_range(&bad).is_err());
    }
}
