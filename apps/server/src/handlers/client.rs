use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::{
    booking,
    error::ApiError,
    models::*,
    schedule::{self, Slot},
    AppState,
};

// ── Endpoints ──

/// GET /api/services — the catalog plus opening hours for display.
pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ServicesResponse>> {
    let services = state
        .catalog
        .all()
        .iter()
        .map(|s| ServiceInfo {
            key: s.key,
            label: format!(
                "{} ({} min) • R$ {}",
                s.label,
                s.duration_min,
                s.price_cents / 100
            ),
            duration_min: s.duration_min,
            price_cents: s.price_cents,
        })
        .collect();

    Json(ApiResponse::success(ServicesResponse {
        open: schedule::minutes_to_hhmm(state.hours.open_min),
        close: schedule::minutes_to_hhmm(state.hours.close_min),
        services,
    }))
}

/// GET /api/slots?date=YYYY-MM-DD&service=key — bookable start times.
///
/// Read-only snapshot; the commit re-checks, so a slot shown here may
/// still be lost to a faster customer.
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<ApiResponse<Vec<Slot>>>, ApiError> {
    if chrono::NaiveDate::parse_from_str(&query.date, "%Y-%m-%d").is_err() {
        return Err(ApiError::validation("Data inválida (YYYY-MM-DD)"));
    }
    let service = state
        .catalog
        .get(&query.service)
        .ok_or_else(|| ApiError::validation("Serviço inválido"))?;

    let busy = booking::busy_intervals(&state.db, &query.date).await?;
    let slots = schedule::available_slots(&state.hours, service.duration_min, &busy);

    Ok(Json(ApiResponse::success(slots)))
}

/// POST /api/bookings — validate and atomically reserve a slot.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingConfirmation>>, ApiError> {
    let confirmation =
        booking::create_booking(&state.db, &state.hours, &state.catalog, &body).await?;
    Ok(Json(ApiResponse::success(confirmation)))
}
