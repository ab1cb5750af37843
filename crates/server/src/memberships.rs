//! Roster management endpoints.

use api_types::member::{MemberAdd, MemberRole, MemberView, MembersResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn member_view(member: engine::TripMember) -> MemberView {
    MemberView {
        uid: member.uid,
        name: member.name,
        email: member.email,
        role: match member.role {
            engine::MemberRole::Organizer => MemberRole::Organizer,
            engine::MemberRole::Member => MemberRole::Member,
        },
        joined_at: member.joined_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state
        .engine
        .list_members(&trip_id, &user.uid)
        .await?
        .into_iter()
        .map(member_view)
        .collect();

    Ok(Json(MembersResponse { members }))
}

pub async fn add(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
    Json(payload): Json<MemberAdd>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    if payload.uid.trim().is_empty() {
        return Err(ServerError::Generic("uid required".to_string()));
    }

    let member = state
        .engine
        .add_member(
            &trip_id,
            &user.uid,
            payload.uid.trim(),
            payload.name.trim(),
            payload.email.trim(),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(member_view(member))))
}
