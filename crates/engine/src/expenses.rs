//! Pool expenses and their split rules.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// How an expense is divided between its participants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitType {
    #[default]
    Equal,
    Exact,
    Percent,
}

impl SplitType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Exact => "exact",
            Self::Percent => "percent",
        }
    }

    /// Parses a stored or user-supplied split type.
    ///
    /// Case-insensitive; unrecognized values fall back to `Equal`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "exact" => Self::Exact,
            "percent" => Self::Percent,
            _ => Self::Equal,
        }
    }
}

/// An expense paid out of the pool.
///
/// `split_between_uids` keeps the caller's order: the equal split hands the
/// remainder cents to the first participants in that order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub trip_id: String,
    pub title: String,
    pub amount_cents: i64,
    pub paid_by_uid: String,
    pub paid_by_name: String,
    pub split_between_uids: Vec<String>,
    pub split_type: SplitType,
    /// Participant uid to exact cents owed (`SplitType::Exact` only).
    pub split_exact_cents: HashMap<String, i64>,
    /// Participant uid to basis points, 10000 = 100% (`SplitType::Percent` only).
    pub split_percent_bps: HashMap<String, i64>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Creates a validated expense.
    ///
    /// Entry-time validation lives here, not in the ledger: the aggregator is
    /// total and silently accepts whatever was persisted, so inconsistent
    /// splits must be rejected before they reach storage.
    pub fn new(
        trip_id: String,
        title: String,
        amount_cents: i64,
        paid_by_uid: String,
        paid_by_name: String,
        split_between_uids: Vec<String>,
        split_type: SplitType,
        split_exact_cents: HashMap<String, i64>,
        split_percent_bps: HashMap<String, i64>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_cents <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_cents must be > 0".to_string(),
            ));
        }

        let participants = normalized_participants(&split_between_uids);
        if participants.is_empty() {
            return Err(EngineError::InvalidSplit(
                "expense needs at least one participant".to_string(),
            ));
        }

        match split_type {
            SplitType::Equal => {}
            SplitType::Exact => {
                let declared: i64 = participants
                    .iter()
                    .map(|uid| split_exact_cents.get(uid.as_str()).copied().unwrap_or(0))
                    .sum();
                if declared != amount_cents {
                    return Err(EngineError::InvalidSplit(format!(
                        "exact split sums to {declared}, expense is {amount_cents}"
                    )));
                }
            }
            SplitType::Percent => {
                let declared: i64 = participants
                    .iter()
                    .map(|uid| split_percent_bps.get(uid.as_str()).copied().unwrap_or(0))
                    .sum();
                if declared != 10_000 {
                    return Err(EngineError::InvalidSplit(format!(
                        "percent split sums to {declared} bps, expected 10000"
                    )));
                }
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            trip_id,
            title,
            amount_cents,
            paid_by_uid,
            paid_by_name,
            split_between_uids,
            split_type,
            split_exact_cents,
            split_percent_bps,
            created_at,
        })
    }
}

/// Distinct, non-blank participant uids in their original order.
pub fn normalized_participants(uids: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for uid in uids {
        let trimmed = uid.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !seen.iter().any(|s: &String| s == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trip_id: String,
    pub title: String,
    pub amount_cents: i64,
    pub paid_by_uid: String,
    pub paid_by_name: String,
    /// JSON array of participant uids.
    pub split_between_uids: String,
    pub split_type: String,
    /// JSON object, uid to cents.
    pub split_exact_cents: String,
    /// JSON object, uid to basis points.
    pub split_percent_bps: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trips::Entity",
        from = "Column::TripId",
        to = "super::trips::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Trips,
}

impl Related<super::trips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trips.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Expense> for ActiveModel {
    type Error = EngineError;

    fn try_from(value: &Expense) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(value.id.to_string()),
            trip_id: ActiveValue::Set(value.trip_id.clone()),
            title: ActiveValue::Set(value.title.clone()),
            amount_cents: ActiveValue::Set(value.amount_cents),
            paid_by_uid: ActiveValue::Set(value.paid_by_uid.clone()),
            paid_by_name: ActiveValue::Set(value.paid_by_name.clone()),
            split_between_uids: ActiveValue::Set(serde_json::to_string(&value.split_between_uids)?),
            split_type: ActiveValue::Set(value.split_type.as_str().to_string()),
            split_exact_cents: ActiveValue::Set(serde_json::to_string(&value.split_exact_cents)?),
            split_percent_bps: ActiveValue::Set(serde_json::to_string(&value.split_percent_bps)?),
            created_at: ActiveValue::Set(value.created_at),
        })
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|_| EngineError::InvalidId("invalid expense id".to_string()))?;
        Ok(Self {
            id,
            split_between_uids: serde_json::from_str(&model.split_between_uids)?,
            split_type: SplitType::parse(&model.split_type),
            split_exact_cents: serde_json::from_str(&model.split_exact_cents)?,
            split_percent_bps: serde_json::from_str(&model.split_percent_bps)?,
            trip_id: model.trip_id,
            title: model.title,
            amount_cents: model.amount_cents,
            paid_by_uid: model.paid_by_uid,
            paid_by_name: model.paid_by_name,
            created_at: model.created_at,
        })
    }
}
