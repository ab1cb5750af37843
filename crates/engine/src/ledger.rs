//! The ledger aggregator.
//!
//! Folds the raw contribution, expense and settlement records plus the member
//! roster into one balance per member. This is a pure function over a single
//! snapshot: no I/O, no validation, no failure path. Callers are responsible
//! for rejecting malformed records before they are persisted (see
//! [`Expense::new`]); the aggregator accepts whatever storage hands it and is
//! bit-exact deterministic for identical inputs.
//!
//! [`Expense::new`]: crate::expenses::Expense::new

use std::collections::HashMap;

use crate::contributions::Contribution;
use crate::expenses::{Expense, SplitType, normalized_participants};
use crate::members::TripMember;
use crate::settlements::Settlement;

/// A member's derived position against the pool.
///
/// Never persisted; recomputed from the four upstream collections on every
/// change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberBalance {
    pub uid: String,
    pub name: String,
    /// Sum of this member's contributions.
    pub contributed_cents: i64,
    /// Sum of this member's allocated expense shares.
    pub owes_cents: i64,
    /// `contributed - owes`, adjusted by recorded settlements.
    pub net_cents: i64,
}

/// Output of [`compute_balances`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    /// One balance per roster member, sorted ascending by `net_cents`
    /// (most-owing first).
    pub balances: Vec<MemberBalance>,
    pub total_contributed_cents: i64,
    pub total_spent_cents: i64,
}

/// Computes per-member balances for one trip snapshot.
///
/// Rules:
/// - only roster members get a balance row; contributions, expense shares and
///   settlements referencing non-roster uids are ignored
/// - every roster member appears in the output, even with zero activity
/// - a settlement raises the payer's net and lowers the receiver's (the payer
///   effectively contributed to close their deficit, the receiver already got
///   cash outside the pool)
/// - the sum of nets is **not** forced to zero: it reflects pool surplus or
///   deficit against what was actually contributed vs spent
pub fn compute_balances(
    members: &[TripMember],
    contributions: &[Contribution],
    expenses: &[Expense],
    settlements: &[Settlement],
) -> LedgerSummary {
    let total_contributed_cents: i64 = contributions.iter().map(|c| c.amount_cents).sum();
    let total_spent_cents: i64 = expenses.iter().map(|e| e.amount_cents).sum();

    // Roster deduplicated by uid, first occurrence wins for order and name.
    let mut roster: Vec<&str> = Vec::with_capacity(members.len());
    let mut name_by_uid: HashMap<&str, &str> = HashMap::with_capacity(members.len());
    for member in members {
        if !name_by_uid.contains_key(member.uid.as_str()) {
            roster.push(&member.uid);
            name_by_uid.insert(&member.uid, &member.name);
        }
    }

    // Zero-initialized accumulators keyed by every roster uid, so members
    // with no activity still show up.
    let mut contributed: HashMap<&str, i64> = roster.iter().map(|uid| (*uid, 0)).collect();
    let mut owes: HashMap<&str, i64> = roster.iter().map(|uid| (*uid, 0)).collect();

    for contribution in contributions {
        if let Some(total) = contributed.get_mut(contribution.uid.as_str()) {
            *total += contribution.amount_cents;
        }
    }

    for expense in expenses {
        for (uid, share) in expense_shares(expense) {
            if let Some(total) = owes.get_mut(uid.as_str()) {
                *total += share;
            }
        }
    }

    let mut net: HashMap<&str, i64> = roster
        .iter()
        .map(|uid| (*uid, contributed[uid] - owes[uid]))
        .collect();

    for settlement in settlements {
        // Both ends must be on the roster, otherwise the record is noise.
        if !net.contains_key(settlement.from_uid.as_str())
            || !net.contains_key(settlement.to_uid.as_str())
        {
            continue;
        }
        if let Some(from) = net.get_mut(settlement.from_uid.as_str()) {
            *from += settlement.amount_cents;
        }
        if let Some(to) = net.get_mut(settlement.to_uid.as_str()) {
            *to -= settlement.amount_cents;
        }
    }

    let mut balances: Vec<MemberBalance> = roster
        .iter()
        .map(|uid| MemberBalance {
            uid: (*uid).to_string(),
            name: name_by_uid.get(uid).copied().unwrap_or(uid).to_string(),
            contributed_cents: contributed[uid],
            owes_cents: owes[uid],
            net_cents: net[uid],
        })
        .collect();

    // Stable sort keeps roster order among equal nets.
    balances.sort_by_key(|b| b.net_cents);

    LedgerSummary {
        balances,
        total_contributed_cents,
        total_spent_cents,
    }
}

/// Allocates one expense across its participants, in participant-list order.
///
/// `exact` shares are taken verbatim when positive; `percent` shares are
/// `floor(amount * bps / 10000)` with **no** remainder redistribution, so a
/// percent split can total a few cents less than the expense when the bps
/// don't divide evenly. Only the equal split hands out remainder cents (one
/// each to the first `amount % n` participants).
fn expense_shares(expense: &Expense) -> Vec<(String, i64)> {
    let participants = normalized_participants(&expense.split_between_uids);
    if participants.is_empty() {
        return Vec::new();
    }

    match expense.split_type {
        SplitType::Exact => participants
            .into_iter()
            .filter_map(|uid| {
                let cents = expense.split_exact_cents.get(&uid).copied().unwrap_or(0);
                (cents > 0).then_some((uid, cents))
            })
            .collect(),
        SplitType::Percent => participants
            .into_iter()
            .map(|uid| {
                let bps = expense.split_percent_bps.get(&uid).copied().unwrap_or(0);
                let share = expense.amount_cents * bps / 10_000;
                (uid, share)
            })
            .collect(),
        SplitType::Equal => {
            let n = participants.len() as i64;
            let base = expense.amount_cents / n;
            let remainder = (expense.amount_cents % n) as usize;
            participants
                .into_iter()
                .enumerate()
                .map(|(idx, uid)| {
                    let extra = if idx < remainder { 1 } else { 0 };
                    (uid, base + extra)
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::members::MemberRole;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn member(uid: &str, name: &str) -> TripMember {
        TripMember::new(uid, name, "", MemberRole::Member, epoch())
    }

    fn contribution(uid: &str, amount_cents: i64) -> Contribution {
        Contribution::new(
            "trip".to_string(),
            uid.to_string(),
            uid.to_uppercase(),
            amount_cents,
            String::new(),
            epoch(),
        )
        .unwrap()
    }

    fn equal_expense(amount_cents: i64, participants: &[&str]) -> Expense {
        Expense::new(
            "trip".to_string(),
            "Dinner".to_string(),
            amount_cents,
            participants[0].to_string(),
            participants[0].to_uppercase(),
            participants.iter().map(|s| s.to_string()).collect(),
            SplitType::Equal,
            HashMap::new(),
            HashMap::new(),
            epoch(),
        )
        .unwrap()
    }

    fn percent_expense(amount_cents: i64, bps: &[(&str, i64)]) -> Expense {
        Expense::new(
            "trip".to_string(),
            "Hotel".to_string(),
            amount_cents,
            bps[0].0.to_string(),
            bps[0].0.to_uppercase(),
            bps.iter().map(|(uid, _)| uid.to_string()).collect(),
            SplitType::Percent,
            HashMap::new(),
            bps.iter().map(|(uid, b)| (uid.to_string(), *b)).collect(),
            epoch(),
        )
        .unwrap()
    }

    fn owed(summary: &LedgerSummary, uid: &str) -> i64 {
        summary
            .balances
            .iter()
            .find(|b| b.uid == uid)
            .map(|b| b.owes_cents)
            .unwrap()
    }

    #[test]
    fn empty_inputs_yield_empty_output_and_zero_totals() {
        let summary = compute_balances(&[], &[], &[], &[]);
        assert!(summary.balances.is_empty());
        assert_eq!(summary.total_contributed_cents, 0);
        assert_eq!(summary.total_spent_cents, 0);
    }

    #[test]
    fn contributed_sum_matches_total() {
        let members = vec![member("a", "Alice"), member("b", "Bob")];
        let contributions = vec![contribution("a", 500), contribution("a", 250), contribution("b", 100)];

        let summary = compute_balances(&members, &contributions, &[], &[]);

        assert_eq!(summary.total_contributed_cents, 850);
        let contributed_sum: i64 = summary.balances.iter().map(|b| b.contributed_cents).sum();
        assert_eq!(contributed_sum, summary.total_contributed_cents);
    }

    #[test]
    fn equal_split_hands_remainder_to_first_participants_in_order() {
        let members = vec![member("a", "Alice"), member("b", "Bob"), member("c", "Cara")];
        let expenses = vec![equal_expense(100, &["a", "b", "c"])];

        let summary = compute_balances(&members, &[], &expenses, &[]);

        assert_eq!(owed(&summary, "a"), 34);
        assert_eq!(owed(&summary, "b"), 33);
        assert_eq!(owed(&summary, "c"), 33);

        let owes_sum: i64 = summary.balances.iter().map(|b| b.owes_cents).sum();
        assert_eq!(owes_sum, summary.total_spent_cents);
    }

    #[test]
    fn percent_split_even_bps() {
        let members = vec![member("a", "Alice"), member("b", "Bob")];
        let expenses = vec![percent_expense(100, &[("a", 5000), ("b", 5000)])];

        let summary = compute_balances(&members, &[], &expenses, &[]);

        assert_eq!(owed(&summary, "a"), 50);
        assert_eq!(owed(&summary, "b"), 50);
    }

    #[test]
    fn percent_split_floors_without_remainder_fixup() {
        // Documented asymmetry with the equal path: floor division only, so
        // the allocated total may undershoot the expense amount.
        let members = vec![member("a", "Alice"), member("b", "Bob"), member("c", "Cara")];
        let expenses = vec![percent_expense(999, &[("a", 3333), ("b", 3333), ("c", 3334)])];

        let summary = compute_balances(&members, &[], &expenses, &[]);

        assert_eq!(owed(&summary, "a"), 333);
        assert_eq!(owed(&summary, "b"), 333);
        assert_eq!(owed(&summary, "c"), 333);
        assert_eq!(summary.total_spent_cents, 999);

        let owes_sum: i64 = summary.balances.iter().map(|b| b.owes_cents).sum();
        assert!(owes_sum <= summary.total_spent_cents);
    }

    #[test]
    fn exact_split_takes_declared_cents_and_treats_missing_as_zero() {
        let members = vec![member("a", "Alice"), member("b", "Bob"), member("c", "Cara")];
        let expense = Expense::new(
            "trip".to_string(),
            "Tickets".to_string(),
            1000,
            "a".to_string(),
            "Alice".to_string(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            SplitType::Exact,
            HashMap::from([("a".to_string(), 700), ("b".to_string(), 300)]),
            HashMap::new(),
            epoch(),
        )
        .unwrap();

        let summary = compute_balances(&members, &[], &[expense], &[]);

        assert_eq!(owed(&summary, "a"), 700);
        assert_eq!(owed(&summary, "b"), 300);
        assert_eq!(owed(&summary, "c"), 0);
    }

    #[test]
    fn settlements_adjust_nets_only_between_roster_members() {
        let members = vec![member("a", "Alice"), member("b", "Bob")];
        let contributions = vec![contribution("b", 1000)];
        let expenses = vec![equal_expense(1000, &["a", "b"])];
        let settlements = vec![
            Settlement::new(
                "trip".to_string(),
                "a".to_string(),
                "Alice".to_string(),
                "b".to_string(),
                "Bob".to_string(),
                500,
                String::new(),
                epoch(),
            )
            .unwrap(),
            // Non-roster payer: ignored entirely.
            Settlement::new(
                "trip".to_string(),
                "ghost".to_string(),
                "Ghost".to_string(),
                "b".to_string(),
                "Bob".to_string(),
                9999,
                String::new(),
                epoch(),
            )
            .unwrap(),
        ];

        let summary = compute_balances(&members, &contributions, &expenses, &settlements);

        let a = summary.balances.iter().find(|b| b.uid == "a").unwrap();
        let b = summary.balances.iter().find(|b| b.uid == "b").unwrap();
        // a: 0 - 500 + 500 = 0; b: 1000 - 500 - 500 = 0.
        assert_eq!(a.net_cents, 0);
        assert_eq!(b.net_cents, 0);
    }

    #[test]
    fn non_roster_contributors_and_participants_are_ignored() {
        let members = vec![member("a", "Alice")];
        let contributions = vec![contribution("stranger", 5000)];
        let expenses = vec![equal_expense(300, &["a", "stranger", "other"])];

        let summary = compute_balances(&members, &contributions, &expenses, &[]);

        assert_eq!(summary.balances.len(), 1);
        let a = &summary.balances[0];
        assert_eq!(a.contributed_cents, 0);
        // Position-based equal split still counts the strangers: a owes its
        // own third only.
        assert_eq!(a.owes_cents, 100);
        // Totals stay raw sums regardless of roster membership.
        assert_eq!(summary.total_contributed_cents, 5000);
        assert_eq!(summary.total_spent_cents, 300);
    }

    #[test]
    fn output_sorted_ascending_by_net() {
        let members = vec![member("a", "Alice"), member("b", "Bob"), member("c", "Cara")];
        let contributions = vec![contribution("c", 4000)];
        let expenses = vec![equal_expense(4000, &["a", "b", "c", "c"])];

        let summary = compute_balances(&members, &contributions, &expenses, &[]);

        let nets: Vec<i64> = summary.balances.iter().map(|b| b.net_cents).collect();
        let mut sorted = nets.clone();
        sorted.sort_unstable();
        assert_eq!(nets, sorted);
        assert_eq!(summary.balances.first().unwrap().net_cents, nets[0]);
    }

    #[test]
    fn duplicate_roster_rows_collapse_to_one_balance_first_name_wins() {
        let members = vec![member("a", "Alice"), member("a", "Alicia"), member("b", "Bob")];
        let summary = compute_balances(&members, &[], &[], &[]);
        assert_eq!(summary.balances.len(), 2);
        let a = summary.balances.iter().find(|b| b.uid == "a").unwrap();
        assert_eq!(a.name, "Alice");
    }

    #[test]
    fn identical_inputs_produce_bit_identical_output() {
        let members = vec![member("a", "Alice"), member("b", "Bob"), member("c", "Cara")];
        let contributions = vec![contribution("a", 700), contribution("b", 450)];
        let expenses = vec![
            equal_expense(999, &["a", "b", "c"]),
            percent_expense(500, &[("a", 2500), ("b", 2500), ("c", 5000)]),
        ];
        let settlements = vec![
            Settlement::new(
                "trip".to_string(),
                "c".to_string(),
                "Cara".to_string(),
                "a".to_string(),
                "Alice".to_string(),
                120,
                String::new(),
                epoch(),
            )
            .unwrap(),
        ];

        let first = compute_balances(&members, &contributions, &expenses, &settlements);
        let second = compute_balances(&members, &contributions, &expenses, &settlements);
        assert_eq!(first, second);
    }
}
