//! Settlement API endpoints.
//!
//! Settlements are append only: the API offers create and list, nothing else.

use api_types::settlement::{SettlementNew, SettlementView, SettlementsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn settlement_view(settlement: engine::Settlement) -> SettlementView {
    SettlementView {
        id: settlement.id,
        from_uid: settlement.from_uid,
        from_name: settlement.from_name,
        to_uid: settlement.to_uid,
        to_name: settlement.to_name,
        amount_cents: settlement.amount_cents,
        note: settlement.note,
        created_at: settlement.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<Json<SettlementsResponse>, ServerError> {
    let settlements = state
        .engine
        .list_settlements(&trip_id, &user.uid)
        .await?
        .into_iter()
        .map(settlement_view)
        .collect();

    Ok(Json(SettlementsResponse { settlements }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<SettlementView>), ServerError> {
    let settlement = state
        .engine
        .add_settlement(
            &trip_id,
            &user.uid,
            &payload.to_uid,
            payload.amount_cents,
            payload.note.as_deref().unwrap_or_default(),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(settlement_view(settlement))))
}
