use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

pub use contributions::Contribution;
pub use error::EngineError;
pub use expenses::{Expense, SplitType};
pub use export::{pool_report_csv, pool_report_text};
pub use ledger::{LedgerSummary, MemberBalance, compute_balances};
pub use members::{MemberRole, TripMember};
pub use money::MoneyCents;
pub use settle::{SuggestedSettlement, suggest_settlements};
pub use settlements::Settlement;
pub use trips::{Trip, TripStatus};

mod contributions;
mod error;
mod expenses;
mod export;
mod ledger;
mod members;
mod money;
mod settle;
mod settlements;
mod trips;

type ResultEngine<T> = Result<T, EngineError>;

/// One consistent snapshot of everything the ledger needs for a trip.
///
/// The aggregator and suggester must be run against a single snapshot, never
/// against independently refreshed collections, so balances are never built
/// from mismatched data generations.
#[derive(Clone, Debug)]
pub struct TripSnapshot {
    pub trip: Trip,
    pub members: Vec<TripMember>,
    pub contributions: Vec<Contribution>,
    pub expenses: Vec<Expense>,
    pub settlements: Vec<Settlement>,
}

/// The full derived output for a trip: balances, totals, suggestions and the
/// recorded settlement history.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolReport {
    pub balances: Vec<MemberBalance>,
    pub total_contributed_cents: i64,
    pub total_spent_cents: i64,
    pub suggested_settlements: Vec<SuggestedSettlement>,
    pub settlement_history: Vec<Settlement>,
}

impl PoolReport {
    /// Pool surplus (positive) or deficit (negative) against what was spent.
    pub fn balance_cents(&self) -> i64 {
        self.total_contributed_cents - self.total_spent_cents
    }
}

/// Derives the pool report from one snapshot. Pure composition of
/// [`compute_balances`] and [`suggest_settlements`].
pub fn build_pool_report(snapshot: &TripSnapshot) -> PoolReport {
    let summary = compute_balances(
        &snapshot.members,
        &snapshot.contributions,
        &snapshot.expenses,
        &snapshot.settlements,
    );
    let suggested_settlements = suggest_settlements(&summary.balances);

    PoolReport {
        balances: summary.balances,
        total_contributed_cents: summary.total_contributed_cents,
        total_spent_cents: summary.total_spent_cents,
        suggested_settlements,
        settlement_history: snapshot.settlements.clone(),
    }
}

/// Parameters for creating an expense.
#[derive(Clone, Debug, Default)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount_cents: i64,
    pub paid_by_uid: String,
    pub split_between_uids: Vec<String>,
    pub split_type: SplitType,
    pub split_exact_cents: HashMap<String, i64>,
    pub split_percent_bps: HashMap<String, i64>,
}

/// The repository facade over trip storage.
///
/// All reads and writes go through here; the derived outputs (balances,
/// suggestions) are computed from [`TripSnapshot`]s and never stored.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Loads the roster row for `uid`, doubling as the authorization check:
    /// non-members get the same `KeyNotFound` as a missing trip.
    async fn member(&self, trip_id: &str, uid: &str) -> ResultEngine<TripMember> {
        let row = members::Entity::find_by_id((trip_id.to_string(), uid.to_string()))
            .one(&self.database)
            .await?;
        match row {
            Some(model) => model.into_member(),
            None => Err(EngineError::KeyNotFound("trip not exists".to_string())),
        }
    }

    async fn organizer(&self, trip_id: &str, uid: &str) -> ResultEngine<TripMember> {
        let member = self.member(trip_id, uid).await?;
        if !member.is_organizer() {
            return Err(EngineError::Forbidden("organizer required".to_string()));
        }
        Ok(member)
    }

    async fn trip_model(&self, trip_id: &str) -> ResultEngine<trips::Model> {
        trips::Entity::find_by_id(trip_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("trip not exists".to_string()))
    }

    /// Creates a trip with `owner` as its organizer.
    pub async fn new_trip(
        &self,
        name: &str,
        destination: &str,
        owner_uid: &str,
        owner_name: &str,
        owner_email: &str,
        at: DateTime<Utc>,
    ) -> ResultEngine<Trip> {
        let trip = Trip::new(name.to_string(), destination.to_string(), owner_uid);
        let organizer = TripMember::new(owner_uid, owner_name, owner_email, MemberRole::Organizer, at);

        let db_tx = self.database.begin().await?;
        trips::ActiveModel::from(&trip).insert(&db_tx).await?;
        members::active_model(&trip.id, &organizer).insert(&db_tx).await?;
        db_tx.commit().await?;

        Ok(trip)
    }

    /// Returns a trip the caller is a member of.
    pub async fn trip(&self, trip_id: &str, uid: &str) -> ResultEngine<Trip> {
        self.member(trip_id, uid).await?;
        Trip::try_from(self.trip_model(trip_id).await?)
    }

    /// Lists every trip the caller belongs to, newest joined first.
    pub async fn trips_for_member(&self, uid: &str) -> ResultEngine<Vec<Trip>> {
        let memberships = members::Entity::find()
            .filter(members::Column::Uid.eq(uid))
            .order_by_desc(members::Column::JoinedAt)
            .all(&self.database)
            .await?;

        let mut trips = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let model = self.trip_model(&membership.trip_id).await?;
            trips.push(Trip::try_from(model)?);
        }
        Ok(trips)
    }

    /// Joins a trip by its shareable code. Joining twice is a no-op.
    pub async fn join_trip(
        &self,
        join_code: &str,
        uid: &str,
        name: &str,
        email: &str,
        at: DateTime<Utc>,
    ) -> ResultEngine<Trip> {
        let model = trips::Entity::find()
            .filter(trips::Column::JoinCode.eq(join_code))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("trip not exists".to_string()))?;

        let already_member = members::Entity::find_by_id((model.id.clone(), uid.to_string()))
            .one(&self.database)
            .await?
            .is_some();
        if !already_member {
            let member = TripMember::new(uid, name, email, MemberRole::Member, at);
            members::active_model(&model.id, &member)
                .insert(&self.database)
                .await?;
        }

        Trip::try_from(model)
    }

    /// Adds a member directly (organizer only). Duplicate uids are rejected.
    pub async fn add_member(
        &self,
        trip_id: &str,
        acting_uid: &str,
        uid: &str,
        name: &str,
        email: &str,
        at: DateTime<Utc>,
    ) -> ResultEngine<TripMember> {
        self.organizer(trip_id, acting_uid).await?;

        if members::Entity::find_by_id((trip_id.to_string(), uid.to_string()))
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(EngineError::ExistingKey(uid.to_string()));
        }

        let member = TripMember::new(uid, name, email, MemberRole::Member, at);
        members::active_model(trip_id, &member)
            .insert(&self.database)
            .await?;
        Ok(member)
    }

    pub async fn list_members(&self, trip_id: &str, uid: &str) -> ResultEngine<Vec<TripMember>> {
        self.member(trip_id, uid).await?;

        let rows = members::Entity::find()
            .filter(members::Column::TripId.eq(trip_id))
            .order_by_asc(members::Column::JoinedAt)
            .all(&self.database)
            .await?;
        rows.into_iter().map(|m| m.into_member()).collect()
    }

    /// Updates the trip status (organizer only).
    pub async fn set_trip_status(
        &self,
        trip_id: &str,
        acting_uid: &str,
        status: TripStatus,
    ) -> ResultEngine<()> {
        self.organizer(trip_id, acting_uid).await?;
        self.trip_model(trip_id).await?;

        let model = trips::ActiveModel {
            id: ActiveValue::Set(trip_id.to_string()),
            status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        model.update(&self.database).await?;
        Ok(())
    }

    /// Records a contribution by the acting member.
    pub async fn add_contribution(
        &self,
        trip_id: &str,
        uid: &str,
        amount_cents: i64,
        note: &str,
        at: DateTime<Utc>,
    ) -> ResultEngine<Contribution> {
        let member = self.member(trip_id, uid).await?;

        let contribution = Contribution::new(
            trip_id.to_string(),
            uid.to_string(),
            member.name,
            amount_cents,
            note.to_string(),
            at,
        )?;
        contributions::ActiveModel::from(&contribution)
            .insert(&self.database)
            .await?;
        Ok(contribution)
    }

    /// Amount/note edit, allowed to the contribution owner or an organizer.
    pub async fn update_contribution(
        &self,
        trip_id: &str,
        contribution_id: Uuid,
        acting_uid: &str,
        amount_cents: i64,
        note: &str,
    ) -> ResultEngine<()> {
        let acting = self.member(trip_id, acting_uid).await?;

        let model = contributions::Entity::find_by_id(contribution_id.to_string())
            .one(&self.database)
            .await?
            .filter(|m| m.trip_id == trip_id)
            .ok_or_else(|| EngineError::KeyNotFound("contribution not exists".to_string()))?;

        if model.uid != acting_uid && !acting.is_organizer() {
            return Err(EngineError::Forbidden(
                "only the owner or an organizer can edit a contribution".to_string(),
            ));
        }
        if amount_cents < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_cents must be >= 0".to_string(),
            ));
        }

        let update = contributions::ActiveModel {
            id: ActiveValue::Set(model.id),
            amount_cents: ActiveValue::Set(amount_cents),
            note: ActiveValue::Set(note.to_string()),
            ..Default::default()
        };
        update.update(&self.database).await?;
        Ok(())
    }

    pub async fn delete_contribution(
        &self,
        trip_id: &str,
        contribution_id: Uuid,
        acting_uid: &str,
    ) -> ResultEngine<()> {
        let acting = self.member(trip_id, acting_uid).await?;

        let model = contributions::Entity::find_by_id(contribution_id.to_string())
            .one(&self.database)
            .await?
            .filter(|m| m.trip_id == trip_id)
            .ok_or_else(|| EngineError::KeyNotFound("contribution not exists".to_string()))?;

        if model.uid != acting_uid && !acting.is_organizer() {
            return Err(EngineError::Forbidden(
                "only the owner or an organizer can delete a contribution".to_string(),
            ));
        }

        contributions::Entity::delete_by_id(model.id)
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn list_contributions(
        &self,
        trip_id: &str,
        uid: &str,
    ) -> ResultEngine<Vec<Contribution>> {
        self.member(trip_id, uid).await?;

        let rows = contributions::Entity::find()
            .filter(contributions::Column::TripId.eq(trip_id))
            .order_by_desc(contributions::Column::CreatedAt)
            .all(&self.database)
            .await?;
        rows.into_iter().map(Contribution::try_from).collect()
    }

    /// Records an expense. Split allocations are validated here, at entry
    /// time; the ledger never cross-checks them again.
    pub async fn add_expense(
        &self,
        trip_id: &str,
        acting_uid: &str,
        draft: ExpenseDraft,
        at: DateTime<Utc>,
    ) -> ResultEngine<Expense> {
        self.member(trip_id, acting_uid).await?;
        let payer = self.member(trip_id, &draft.paid_by_uid).await.map_err(|_| {
            EngineError::KeyNotFound("payer is not a trip member".to_string())
        })?;

        let expense = Expense::new(
            trip_id.to_string(),
            draft.title,
            draft.amount_cents,
            draft.paid_by_uid,
            payer.name,
            draft.split_between_uids,
            draft.split_type,
            draft.split_exact_cents,
            draft.split_percent_bps,
            at,
        )?;
        expenses::ActiveModel::try_from(&expense)?
            .insert(&self.database)
            .await?;
        Ok(expense)
    }

    /// Title/amount edit, allowed to the payer or an organizer.
    ///
    /// Exact/percent allocations are deliberately left untouched: the caller
    /// accepted at entry time that later amount edits can desync them, and
    /// the ledger then under- or over-allocates accordingly.
    pub async fn update_expense(
        &self,
        trip_id: &str,
        expense_id: Uuid,
        acting_uid: &str,
        title: &str,
        amount_cents: i64,
    ) -> ResultEngine<()> {
        let acting = self.member(trip_id, acting_uid).await?;

        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(&self.database)
            .await?
            .filter(|m| m.trip_id == trip_id)
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

        if model.paid_by_uid != acting_uid && !acting.is_organizer() {
            return Err(EngineError::Forbidden(
                "only the payer or an organizer can edit an expense".to_string(),
            ));
        }
        if amount_cents <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_cents must be > 0".to_string(),
            ));
        }

        let update = expenses::ActiveModel {
            id: ActiveValue::Set(model.id),
            title: ActiveValue::Set(title.to_string()),
            amount_cents: ActiveValue::Set(amount_cents),
            ..Default::default()
        };
        update.update(&self.database).await?;
        Ok(())
    }

    pub async fn delete_expense(
        &self,
        trip_id: &str,
        expense_id: Uuid,
        acting_uid: &str,
    ) -> ResultEngine<()> {
        let acting = self.member(trip_id, acting_uid).await?;

        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(&self.database)
            .await?
            .filter(|m| m.trip_id == trip_id)
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

        if model.paid_by_uid != acting_uid && !acting.is_organizer() {
            return Err(EngineError::Forbidden(
                "only the payer or an organizer can delete an expense".to_string(),
            ));
        }

        expenses::Entity::delete_by_id(model.id)
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn list_expenses(&self, trip_id: &str, uid: &str) -> ResultEngine<Vec<Expense>> {
        self.member(trip_id, uid).await?;

        let rows = expenses::Entity::find()
            .filter(expenses::Column::TripId.eq(trip_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.database)
            .await?;
        rows.into_iter().map(Expense::try_from).collect()
    }

    /// Records a settlement paid by the acting member. Append-only: there is
    /// no update or delete for settlements.
    pub async fn add_settlement(
        &self,
        trip_id: &str,
        acting_uid: &str,
        to_uid: &str,
        amount_cents: i64,
        note: &str,
        at: DateTime<Utc>,
    ) -> ResultEngine<Settlement> {
        let from = self.member(trip_id, acting_uid).await?;
        let to = self.member(trip_id, to_uid).await.map_err(|_| {
            EngineError::KeyNotFound("receiver is not a trip member".to_string())
        })?;

        let settlement = Settlement::new(
            trip_id.to_string(),
            acting_uid.to_string(),
            from.name,
            to_uid.to_string(),
            to.name,
            amount_cents,
            note.to_string(),
            at,
        )?;
        settlements::ActiveModel::from(&settlement)
            .insert(&self.database)
            .await?;
        Ok(settlement)
    }

    pub async fn list_settlements(
        &self,
        trip_id: &str,
        uid: &str,
    ) -> ResultEngine<Vec<Settlement>> {
        self.member(trip_id, uid).await?;

        let rows = settlements::Entity::find()
            .filter(settlements::Column::TripId.eq(trip_id))
            .order_by_desc(settlements::Column::CreatedAt)
            .all(&self.database)
            .await?;
        rows.into_iter().map(Settlement::try_from).collect()
    }

    /// Loads all four collections for a trip in one call.
    ///
    /// The reads run inside a single database transaction, so the ledger
    /// pair never sees collections from different data generations even
    /// when other requests write concurrently.
    pub async fn trip_snapshot(&self, trip_id: &str, uid: &str) -> ResultEngine<TripSnapshot> {
        let db_tx = self.database.begin().await?;

        let membership = members::Entity::find_by_id((trip_id.to_string(), uid.to_string()))
            .one(&db_tx)
            .await?;
        if membership.is_none() {
            return Err(EngineError::KeyNotFound("trip not exists".to_string()));
        }

        let trip = trips::Entity::find_by_id(trip_id.to_string())
            .one(&db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("trip not exists".to_string()))?;
        let trip = Trip::try_from(trip)?;

        let members = members::Entity::find()
            .filter(members::Column::TripId.eq(trip_id))
            .order_by_asc(members::Column::JoinedAt)
            .all(&db_tx)
            .await?
            .into_iter()
            .map(|m| m.into_member())
            .collect::<ResultEngine<Vec<_>>>()?;

        let contributions = contributions::Entity::find()
            .filter(contributions::Column::TripId.eq(trip_id))
            .order_by_desc(contributions::Column::CreatedAt)
            .all(&db_tx)
            .await?
            .into_iter()
            .map(Contribution::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let expenses = expenses::Entity::find()
            .filter(expenses::Column::TripId.eq(trip_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&db_tx)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let settlements = settlements::Entity::find()
            .filter(settlements::Column::TripId.eq(trip_id))
            .order_by_desc(settlements::Column::CreatedAt)
            .all(&db_tx)
            .await?
            .into_iter()
            .map(Settlement::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        db_tx.commit().await?;

        Ok(TripSnapshot {
            trip,
            members,
            contributions,
            expenses,
            settlements,
        })
    }

    /// Snapshot + aggregator + suggester in one step.
    pub async fn pool_report(&self, trip_id: &str, uid: &str) -> ResultEngine<PoolReport> {
        let snapshot = self.trip_snapshot(trip_id, uid).await?;
        Ok(build_pool_report(&snapshot))
    }
}

/// The builder for `Engine`.
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`.
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
