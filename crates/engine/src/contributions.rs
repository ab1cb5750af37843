//! Pool contributions: money a member adds to the shared fund.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// A contribution to the pool.
///
/// Immutable once created except for amount/note edits by its owner or a
/// trip organizer (enforced by the [`Engine`], not here).
///
/// [`Engine`]: crate::Engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub id: Uuid,
    pub trip_id: String,
    pub uid: String,
    pub name: String,
    pub amount_cents: i64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(
        trip_id: String,
        uid: String,
        name: String,
        amount_cents: i64,
        note: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_cents < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_cents must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            trip_id,
            uid,
            name,
            amount_cents,
            note,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trip_id: String,
    pub uid: String,
    pub name: String,
    pub amount_cents: i64,
    pub note: String,
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

impl From<&Contribution> for ActiveModel {
    fn from(value: &Contribution) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            trip_id: ActiveValue::Set(value.trip_id.clone()),
            uid: ActiveValue::Set(value.uid.clone()),
            name: ActiveValue::Set(value.name.clone()),
            amount_cents: ActiveValue::Set(value.amount_cents),
            note: ActiveValue::Set(value.note.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Contribution {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|_| EngineError::InvalidId("invalid contribution id".to_string()))?;
        Ok(Self {
            id,
            trip_id: model.trip_id,
            uid: model.uid,
            name: model.name,
            amount_cents: model.amount_cents,
            note: model.note,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn rejects_negative_amount() {
        let res = Contribution::new(
            "trip".to_string(),
            "alice".to_string(),
            "Alice".to_string(),
            -1,
            String::new(),
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        assert!(matches!(res, Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn zero_amount_is_allowed() {
        assert!(
            Contribution::new(
                "trip".to_string(),
                "alice".to_string(),
                "Alice".to_string(),
                0,
                String::new(),
                Utc.timestamp_opt(0, 0).unwrap(),
            )
            .is_ok()
        );
    }
}
