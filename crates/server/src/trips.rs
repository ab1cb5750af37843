//! Trip API endpoints.

use api_types::trip::{TripJoin, TripNew, TripStatus, TripStatusUpdate, TripView, TripsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn trip_view(trip: engine::Trip) -> TripView {
    TripView {
        id: trip.id,
        name: trip.name,
        destination: trip.destination,
        join_code: trip.join_code,
        owner_uid: trip.owner_uid,
        status: match trip.status {
            engine::TripStatus::Planning => TripStatus::Planning,
            engine::TripStatus::Active => TripStatus::Active,
            engine::TripStatus::Completed => TripStatus::Completed,
        },
        start_date: trip.start_date,
        end_date: trip.end_date,
    }
}

pub async fn trip_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TripNew>,
) -> Result<(StatusCode, Json<TripView>), ServerError> {
    if payload.name.trim().is_empty() {
        return Err(ServerError::Generic("name required".to_string()));
    }

    let trip = state
        .engine
        .new_trip(
            payload.name.trim(),
            payload.destination.trim(),
            &user.uid,
            &user.name,
            &user.email,
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(trip_view(trip))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<TripsResponse>, ServerError> {
    let trips = state
        .engine
        .trips_for_member(&user.uid)
        .await?
        .into_iter()
        .map(trip_view)
        .collect();

    Ok(Json(TripsResponse { trips }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<Json<TripView>, ServerError> {
    let trip = state.engine.trip(&trip_id, &user.uid).await?;
    Ok(Json(trip_view(trip)))
}

pub async fn join(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TripJoin>,
) -> Result<Json<TripView>, ServerError> {
    let code = payload.join_code.trim().to_uppercase();
    if code.is_empty() {
        return Err(ServerError::Generic("join_code required".to_string()));
    }

    let trip = state
        .engine
        .join_trip(&code, &user.uid, &user.name, &user.email, Utc::now())
        .await?;

    Ok(Json(trip_view(trip)))
}

pub async fn set_status(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
    Json(payload): Json<TripStatusUpdate>,
) -> Result<StatusCode, ServerError> {
    let status = match payload.status {
        TripStatus::Planning => engine::TripStatus::Planning,
        TripStatus::Active => engine::TripStatus::Active,
        TripStatus::Completed => engine::TripStatus::Completed,
    };

    state
        .engine
        .set_trip_status(&trip_id, &user.uid, status)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
