use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod allocations;
mod expenses;
mod server;

pub mod types {
    pub mod expense {
        pub use api_types::expense::{
            DistributionType, ExpenseCategory, ExpenseListResponse, ExpenseNew, ExpenseStatus,
            ExpenseUpdate, ExpenseView, ExpenseWriteResponse, ScopeView,
        };
    }

    pub mod allocation {
        pub use api_types::allocation::{AllocationListResponse, AllocationView};
    }

    pub mod audit {
        pub use api_types::audit::{AuditFindingView, AuditReport};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ConcurrentModification(_) => StatusCode::CONFLICT,
        EngineError::AllocationMismatch { .. } | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::EmptyScope(_)
        | EngineError::PeriodClosed(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidScope(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::AllocationMismatch {
            expected_minor,
            actual_minor,
        } => {
            tracing::error!(expected_minor, actual_minor, "allocation sum mismatch");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ConcurrentModification("x".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::EmptyScope("x".to_string()),
            EngineError::PeriodClosed("2026-07".to_string()),
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InvalidScope("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn engine_mismatch_maps_to_500_without_detail() {
        let res = ServerError::from(EngineError::AllocationMismatch {
            expected_minor: 100,
            actual_minor: 99,
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
