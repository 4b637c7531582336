use serde::{Deserialize, Serialize};

// ── Database models ──

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub ticket: String,
    pub name: String,
    pub phone: String,
    pub service_key: String,
    pub service_label: String,
    pub duration_min: i64,
    pub price_cents: i64,
    pub date: String,
    pub start_min: i64,
    pub end_min: i64,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FinanceEntry {
    pub id: i64,
    pub kind: String,
    pub amount_cents: i64,
    pub description: Option<String>,
    pub date: String,
    pub created_at: String,
}

// ── API request/response types ──

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: String,
    pub service: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub name: String,
    pub phone: String,
    pub date: String,
    pub service_key: String,
    pub start_min: i64,
}

/// Confirmation payload echoed to the customer after a successful commit.
#[derive(Debug, Serialize)]
pub struct BookingConfirmation {
    pub id: i64,
    pub ticket: String,
    pub name: String,
    pub phone: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub service_label: String,
    pub duration_min: i64,
    pub price_cents: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub key: &'static str,
    pub label: String,
    pub duration_min: i64,
    pub price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub open: String,
    pub close: String,
    pub services: Vec<ServiceInfo>,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminBookingsQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

/// Admin list row: a booking plus display-friendly times.
#[derive(Debug, Serialize)]
pub struct BookingRow {
    #[serde(flatten)]
    pub booking: Booking,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct FinanceRangeQuery {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct AddFinanceRequest {
    pub kind: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct FinanceSummary {
    pub total_in_cents: i64,
    pub total_out_cents: i64,
    pub net_cents: i64,
}

// ── Response envelope ──

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let v = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(v["ok"], true);
        assert_eq!(v["data"], serde_json::json!([1, 2]));
        assert!(v["error"].is_null());
    }

    #[test]
    fn test_error_envelope_shape() {
        let v = serde_json::to_value(ApiResponse::<()>::error("boom")).unwrap();
        assert_eq!(v["ok"], false);
        assert!(v["data"].is_null());
        assert_eq!(v["error"], "boom");
    }

    #[test]
    fn test_booking_row_flattens_booking_fields() {
        let booking = Booking {
            id: 7,
            ticket: "BS-4E9A1F".into(),
            name: "João".into(),
            phone: "11987654321".into(),
            service_key: "corte".into(),
            service_label: "Corte".into(),
            duration_min: 40,
            price_cents: 3500,
            date: "2026-09-01".into(),
            start_min: 600,
            end_min: 640,
            status: "active".into(),
            created_at: "2026-08-26 12:00:00".into(),
        };
        let row = BookingRow {
            start: "10:00".into(),
            end: "10:40".into(),
            booking,
        };
        let v = serde_json::to_value(row).unwrap();
        // Flattened: booking fields sit at the top level next to start/end.
        assert_eq!(v["ticket"], "BS-4E9A1F");
        assert_eq!(v["start_min"], 600);
        assert_eq!(v["start"], "10:00");
        assert_eq!(v["end"], "10:40");
    }
}
