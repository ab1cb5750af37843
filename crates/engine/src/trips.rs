//! The module contains the `Trip` struct and its entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TripStatus {
    #[default]
    Planning,
    Active,
    Completed,
}

impl TripStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for TripStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::InvalidId(format!(
                "invalid trip status: {other}"
            ))),
        }
    }
}

/// A trip.
///
/// A trip owns the member roster and every ledger record (contributions,
/// expenses, settlements). Members join either through the organizer or via
/// the trip's join code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trip {
    /// Stable identifier, a UUID generated once and persisted, so the trip
    /// can be renamed without breaking references.
    pub id: String,
    pub name: String,
    pub destination: String,
    /// Short shareable code used by members to join the trip.
    pub join_code: String,
    pub owner_uid: String,
    pub status: TripStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn new(name: String, destination: String, owner_uid: &str) -> Self {
        let id = Uuid::new_v4();
        Self {
            id: id.to_string(),
            name,
            destination,
            join_code: join_code_from(id),
            owner_uid: owner_uid.to_string(),
            status: TripStatus::Planning,
            start_date: None,
            end_date: None,
        }
    }
}

/// Derives a 6-character join code from the trip id.
///
/// Uppercase hex of the first three id bytes: not guessable enough for
/// security (joining still only grants member access) but short enough to
/// read out loud.
fn join_code_from(id: Uuid) -> String {
    let bytes = id.as_bytes();
    format!("{:02X}{:02X}{:02X}", bytes[0], bytes[1], bytes[2])
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "trips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub destination: String,
    pub join_code: String,
    pub owner_uid: String,
    pub status: String,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::members::Entity")]
    Members,
    #[sea_orm(has_many = "super::contributions::Entity")]
    Contributions,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(has_many = "super::settlements::Entity")]
    Settlements,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::contributions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settlements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Trip> for ActiveModel {
    fn from(value: &Trip) -> Self {
        Self {
            id: ActiveValue::Set(value.id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            destination: ActiveValue::Set(value.destination.clone()),
            join_code: ActiveValue::Set(value.join_code.clone()),
            owner_uid: ActiveValue::Set(value.owner_uid.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
        }
    }
}

impl TryFrom<Model> for Trip {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            status: TripStatus::try_from(model.status.as_str())?,
            id: model.id,
            name: model.name,
            destination: model.destination,
            join_code: model.join_code,
            owner_uid: model.owner_uid,
            start_date: model.start_date,
            end_date: model.end_date,
        })
    }
}
