//! Trip roster entities.
//!
//! The roster is trip-scoped: a member row exists per `(trip_id, uid)` pair.
//! The ledger treats the roster as a read-only input list deduplicated by
//! `uid`; only roster members count toward a trip balance.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemberRole {
    Organizer,
    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organizer => "organizer",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "organizer" => Ok(Self::Organizer),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidId(format!(
                "invalid member role: {other}"
            ))),
        }
    }
}

/// A trip member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripMember {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl TripMember {
    pub fn new(uid: &str, name: &str, email: &str, role: MemberRole, joined_at: DateTime<Utc>) -> Self {
        Self {
            uid: uid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            joined_at,
        }
    }

    pub fn is_organizer(&self) -> bool {
        self.role == MemberRole::Organizer
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "trip_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub trip_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub joined_at: DateTimeUtc,
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

impl Model {
    pub(crate) fn into_member(self) -> Result<TripMember, EngineError> {
        Ok(TripMember {
            role: MemberRole::try_from(self.role.as_str())?,
            uid: self.uid,
            name: self.name,
            email: self.email,
            joined_at: self.joined_at,
        })
    }
}

pub(crate) fn active_model(trip_id: &str, member: &TripMember) -> ActiveModel {
    ActiveModel {
        trip_id: ActiveValue::Set(trip_id.to_string()),
        uid: ActiveValue::Set(member.uid.clone()),
        name: ActiveValue::Set(member.name.clone()),
        email: ActiveValue::Set(member.email.clone()),
        role: ActiveValue::Set(member.role.as_str().to_string()),
        joined_at: ActiveValue::Set(member.joined_at),
    }
}
