//! Expense API endpoints.

use api_types::expense::{ExpenseNew, ExpenseUpdate, ExpenseView, ExpensesResponse, SplitKind};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::{ExpenseDraft, SplitType};

fn split_kind(split_type: SplitType) -> SplitKind {
    match split_type {
        SplitType::Equal => SplitKind::Equal,
        SplitType::Exact => SplitKind::Exact,
        SplitType::Percent => SplitKind::Percent,
    }
}

fn split_type(kind: SplitKind) -> SplitType {
    match kind {
        SplitKind::Equal => SplitType::Equal,
        SplitKind::Exact => SplitType::Exact,
        SplitKind::Percent => SplitType::Percent,
    }
}

pub(crate) fn expense_view(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        title: expense.title,
        amount_cents: expense.amount_cents,
        paid_by_uid: expense.paid_by_uid,
        paid_by_name: expense.paid_by_name,
        split_between_uids: expense.split_between_uids,
        split_type: split_kind(expense.split_type),
        split_exact_cents: expense.split_exact_cents,
        split_percent_bps: expense.split_percent_bps,
        created_at: expense.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<Json<ExpensesResponse>, ServerError> {
    let expenses = state
        .engine
        .list_expenses(&trip_id, &user.uid)
        .await?
        .into_iter()
        .map(expense_view)
        .collect();

    Ok(Json(ExpensesResponse { expenses }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    if payload.title.trim().is_empty() {
        return Err(ServerError::Generic("title required".to_string()));
    }

    let draft = ExpenseDraft {
        title: payload.title.trim().to_string(),
        amount_cents: payload.amount_cents,
        paid_by_uid: payload.paid_by_uid,
        split_between_uids: payload.split_between_uids,
        split_type: split_type(payload.split_type),
        split_exact_cents: payload.split_exact_cents,
        split_percent_bps: payload.split_percent_bps,
    };
    let expense = state
        .engine
        .add_expense(&trip_id, &user.uid, draft, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((trip_id, id)): Path<(String, Uuid)>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<StatusCode, ServerError> {
    if payload.title.trim().is_empty() {
        return Err(ServerError::Generic("title required".to_string()));
    }

    state
        .engine
        .update_expense(
            &trip_id,
            id,
            &user.uid,
            payload.title.trim(),
            payload.amount_cents,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((trip_id, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(&trip_id, id, &user.uid).await?;

    Ok(StatusCode::NO_CONTENT)
}
