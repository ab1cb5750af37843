//! Contribution API endpoints.

use api_types::contribution::{
    ContributionNew, ContributionUpdate, ContributionView, ContributionsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn contribution_view(contribution: engine::Contribution) -> ContributionView {
    ContributionView {
        id: contribution.id,
        uid: contribution.uid,
        name: contribution.name,
        amount_cents: contribution.amount_cents,
        note: contribution.note,
        created_at: contribution.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<Json<ContributionsResponse>, ServerError> {
    let contributions = state
        .engine
        .list_contributions(&trip_id, &user.uid)
        .await?
        .into_iter()
        .map(contribution_view)
        .collect();

    Ok(Json(ContributionsResponse { contributions }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
    Json(payload): Json<ContributionNew>,
) -> Result<(StatusCode, Json<ContributionView>), ServerError> {
    let contribution = state
        .engine
        .add_contribution(
            &trip_id,
            &user.uid,
            payload.amount_cents,
            payload.note.as_deref().unwrap_or_default(),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(contribution_view(contribution))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((trip_id, id)): Path<(String, Uuid)>,
    Json(payload): Json<ContributionUpdate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .update_contribution(
            &trip_id,
            id,
            &user.uid,
            payload.amount_cents,
            payload.note.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((trip_id, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_contribution(&trip_id, id, &user.uid)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
