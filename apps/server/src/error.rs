use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ApiResponse;

/// Typed failure modes surfaced to the HTTP layer.
///
/// `SlotConflict` is deliberately its own variant: it is expected under
/// normal concurrent load and the client reacts by refreshing the slot
/// list, not by reporting a bug.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input. Rejected before touching the store.
    #[error("{0}")]
    Validation(String),

    /// Requested interval falls outside business hours.
    #[error("Fora do horário de funcionamento")]
    OutsideHours,

    /// Another active booking occupies the requested interval.
    #[error("Horário acabou de ser ocupado. Escolha outro.")]
    SlotConflict,

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    /// The store could not be reached or the query failed. Fatal to the
    /// request, not to the process.
    #[error("db_error")]
    Store(#[from] sqlx::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::OutsideHours => StatusCode::BAD_REQUEST,
            Self::SlotConflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Store(e) = &self {
            tracing::error!("store error: {}", e);
        }
        let body = ApiResponse::<()>::error(self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_409() {
        assert_eq!(ApiError::SlotConflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            ApiError::validation("Nome inválido").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::OutsideHours.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_maps_to_500_with_generic_body() {
        let err = ApiError::Store(sqlx::Error::PoolClosed);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "db_error");
    }
}
