//! Pool report endpoints: derived balances, suggestions and exports.

use api_types::pool::{MemberBalanceView, PoolReport, SuggestedSettlementView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{ServerError, server::ServerState, settlements, user};

fn report_view(report: engine::PoolReport) -> PoolReport {
    PoolReport {
        total_contributed_cents: report.total_contributed_cents,
        total_spent_cents: report.total_spent_cents,
        balance_cents: report.balance_cents(),
        balances: report
            .balances
            .into_iter()
            .map(|b| MemberBalanceView {
                uid: b.uid,
                name: b.name,
                contributed_cents: b.contributed_cents,
                owes_cents: b.owes_cents,
                net_cents: b.net_cents,
            })
            .collect(),
        suggested_settlements: report
            .suggested_settlements
            .into_iter()
            .map(|s| SuggestedSettlementView {
                from_uid: s.from_uid,
                from_name: s.from_name,
                to_uid: s.to_uid,
                to_name: s.to_name,
                amount_cents: s.amount_cents,
            })
            .collect(),
        settlement_history: report
            .settlement_history
            .into_iter()
            .map(settlements::settlement_view)
            .collect(),
    }
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<Json<PoolReport>, ServerError> {
    let report = state.engine.pool_report(&trip_id, &user.uid).await?;
    Ok(Json(report_view(report)))
}

pub async fn export_csv(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let report = state.engine.pool_report(&trip_id, &user.uid).await?;
    let csv = engine::pool_report_csv(&report)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"pool_report.csv\"",
            ),
        ],
        csv,
    ))
}

pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let report = state.engine.pool_report(&trip_id, &user.uid).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        engine::pool_report_text(&report),
    ))
}
