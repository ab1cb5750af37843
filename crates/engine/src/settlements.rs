//! Recorded settlements: peer-to-peer payments made outside the pool.
//!
//! Settlements are append-only facts. They are never edited or deleted; a
//! wrong settlement is corrected by recording another one the other way.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// A recorded payment between two members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub id: Uuid,
    pub trip_id: String,
    pub from_uid: String,
    pub from_name: String,
    pub to_uid: String,
    pub to_name: String,
    pub amount_cents: i64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(
        trip_id: String,
        from_uid: String,
        from_name: String,
        to_uid: String,
        to_name: String,
        amount_cents: i64,
        note: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_cents <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_cents must be > 0".to_string(),
            ));
        }
        if from_uid == to_uid {
            return Err(EngineError::InvalidAmount(
                "from_uid and to_uid must differ".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            trip_id,
            from_uid,
            from_name,
            to_uid,
            to_name,
            amount_cents,
            note,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trip_id: String,
    pub from_uid: String,
    pub from_name: String,
    pub to_uid: String,
    pub to_name: String,
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

impl From<&Settlement> for ActiveModel {
    fn from(value: &Settlement) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            trip_id: ActiveValue::Set(value.trip_id.clone()),
            from_uid: ActiveValue::Set(value.from_uid.clone()),
            from_name: ActiveValue::Set(value.from_name.clone()),
            to_uid: ActiveValue::Set(value.to_uid.clone()),
            to_name: ActiveValue::Set(value.to_name.clone()),
            amount_cents: ActiveValue::Set(value.amount_cents),
            note: ActiveValue::Set(value.note.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Settlement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|_| EngineError::InvalidId("invalid settlement id".to_string()))?;
        Ok(Self {
            id,
            trip_id: model.trip_id,
            from_uid: model.from_uid,
            from_name: model.from_name,
            to_uid: model.to_uid,
            to_name: model.to_name,
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
    fn rejects_non_positive_amount_and_self_payment() {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        assert!(matches!(
            Settlement::new(
                "t".into(),
                "a".into(),
                "A".into(),
                "b".into(),
                "B".into(),
                0,
                String::new(),
                at,
            ),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            Settlement::new(
                "t".into(),
                "a".into(),
                "A".into(),
                "a".into(),
                "A".into(),
                100,
                String::new(),
                at,
            ),
            Err(EngineError::InvalidAmount(_))
        ));
    }
}
