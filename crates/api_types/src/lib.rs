use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub mod trip {
    use super::*;

    /// Lifecycle of a trip.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TripStatus {
        #[default]
        Planning,
        Active,
        Completed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripNew {
        pub name: String,
        pub destination: String,
    }

    /// Request body for joining a trip by its shareable code.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripJoin {
        pub join_code: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripStatusUpdate {
        pub status: TripStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripView {
        pub id: String,
        pub name: String,
        pub destination: String,
        pub join_code: String,
        pub owner_uid: String,
        pub status: TripStatus,
        pub start_date: Option<DateTime<Utc>>,
        pub end_date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripsResponse {
        pub trips: Vec<TripView>,
    }
}

pub mod member {
    use super::*;

    /// Role of a member inside a trip.
    ///
    /// - `organizer`: can manage the roster, the trip status and anyone's
    ///   records.
    /// - `member`: can add records and edit or delete their own.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MemberRole {
        Organizer,
        #[default]
        Member,
    }

    /// Request body for enrolling a member directly (organizer only).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        pub uid: String,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub uid: String,
        pub name: String,
        pub email: String,
        pub role: MemberRole,
        pub joined_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod contribution {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionNew {
        /// Must be >= 0.
        pub amount_cents: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionUpdate {
        pub amount_cents: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionView {
        pub id: Uuid,
        pub uid: String,
        pub name: String,
        pub amount_cents: i64,
        pub note: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionsResponse {
        pub contributions: Vec<ContributionView>,
    }
}

pub mod expense {
    use super::*;

    /// How an expense is apportioned across its participants.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SplitKind {
        #[default]
        Equal,
        Exact,
        Percent,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub title: String,
        /// Must be > 0.
        pub amount_cents: i64,
        pub paid_by_uid: String,
        pub split_between_uids: Vec<String>,
        #[serde(default)]
        pub split_type: SplitKind,
        /// Per-uid amounts; must sum to `amount_cents` for exact splits.
        #[serde(default)]
        pub split_exact_cents: HashMap<String, i64>,
        /// Per-uid basis points; must sum to 10000 for percent splits.
        #[serde(default)]
        pub split_percent_bps: HashMap<String, i64>,
    }

    /// Title/amount edit. Split metadata is immutable after creation.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub title: String,
        pub amount_cents: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub title: String,
        pub amount_cents: i64,
        pub paid_by_uid: String,
        pub paid_by_name: String,
        pub split_between_uids: Vec<String>,
        pub split_type: SplitKind,
        pub split_exact_cents: HashMap<String, i64>,
        pub split_percent_bps: HashMap<String, i64>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensesResponse {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod settlement {
    use super::*;

    /// Request body for recording a payment from the caller to `to_uid`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub to_uid: String,
        /// Must be > 0.
        pub amount_cents: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub id: Uuid,
        pub from_uid: String,
        pub from_name: String,
        pub to_uid: String,
        pub to_name: String,
        pub amount_cents: i64,
        pub note: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementsResponse {
        pub settlements: Vec<SettlementView>,
    }
}

pub mod pool {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberBalanceView {
        pub uid: String,
        pub name: String,
        pub contributed_cents: i64,
        pub owes_cents: i64,
        pub net_cents: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SuggestedSettlementView {
        pub from_uid: String,
        pub from_name: String,
        pub to_uid: String,
        pub to_name: String,
        pub amount_cents: i64,
    }

    /// The full derived state of a trip's pool.
    ///
    /// Balances are sorted ascending by `net_cents` (largest debtor first);
    /// the settlement history is newest first.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PoolReport {
        pub total_contributed_cents: i64,
        pub total_spent_cents: i64,
        pub balance_cents: i64,
        pub balances: Vec<MemberBalanceView>,
        pub suggested_settlements: Vec<SuggestedSettlementView>,
        pub settlement_history: Vec<super::settlement::SettlementView>,
    }
}
