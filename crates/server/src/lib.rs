use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod contributions;
mod expenses;
mod memberships;
mod pool;
mod server;
mod settlements;
mod trips;
mod user;

pub mod types {
    pub mod trip {
        pub use api_types::trip::{TripJoin, TripNew, TripStatus, TripStatusUpdate, TripView, TripsResponse};
    }

    pub mod member {
        pub use api_types::member::{MemberAdd, MemberRole, MemberView, MembersResponse};
    }

    pub mod contribution {
        pub use api_types::contribution::{
            ContributionNew, ContributionUpdate, ContributionView, ContributionsResponse,
        };
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseNew, ExpenseUpdate, ExpenseView, ExpensesResponse, SplitKind,
        };
    }

    pub mod settlement {
        pub use api_types::settlement::{SettlementNew, SettlementView, SettlementsResponse};
    }

    pub mod pool {
        pub use api_types::pool::{MemberBalanceView, PoolReport, SuggestedSettlementView};
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
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::InvalidAmount(_) | EngineError::InvalidSplit(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::InvalidId(_)
        | EngineError::Export(_)
        | EngineError::Serialization(_)
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Serialization(ser_err) => {
            tracing::error!("serialization error: {ser_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
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
    fn engine_forbidden_maps_to_403() {
        let res =
            ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = ServerError::from(EngineError::InvalidSplit("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_internal_errors_map_to_500() {
        let res = ServerError::from(EngineError::Export("disk full".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
