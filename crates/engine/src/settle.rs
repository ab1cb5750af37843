//! The settlement suggester.
//!
//! Consumes the per-member nets from [`ledger::compute_balances`] and greedily
//! matches debtors to creditors, producing an ordered list of proposed
//! payments. Pure and total, like the aggregator.
//!
//! [`ledger::compute_balances`]: crate::ledger::compute_balances

use crate::ledger::MemberBalance;

/// A proposed (not yet recorded) payment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestedSettlement {
    pub from_uid: String,
    pub from_name: String,
    pub to_uid: String,
    pub to_name: String,
    pub amount_cents: i64,
}

/// Greedy debtor/creditor matching over balances sorted ascending by net.
///
/// Both partitions keep their incoming relative order; no re-sort happens
/// here. Each step pays `min(debtor remaining, creditor remaining)` and
/// advances whichever side hit zero (both on a tie). The loop stops when
/// either side is exhausted: the two partition sums are not guaranteed equal
/// (the pool itself can run a surplus or deficit), and any residual stays
/// unsettled on purpose. This settles person-to-person imbalances, not the
/// pool-level shortfall.
///
/// Emits at most `debtors + creditors - 1` settlements. Zero-net members
/// produce nothing; an empty input yields an empty list.
pub fn suggest_settlements(balances: &[MemberBalance]) -> Vec<SuggestedSettlement> {
    let mut debtors: Vec<(&MemberBalance, i64)> = balances
        .iter()
        .filter(|b| b.net_cents < 0)
        .map(|b| (b, b.net_cents.abs()))
        .collect();
    let mut creditors: Vec<(&MemberBalance, i64)> = balances
        .iter()
        .filter(|b| b.net_cents > 0)
        .map(|b| (b, b.net_cents))
        .collect();

    let mut suggestions = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < debtors.len() && j < creditors.len() {
        let (debtor, owed) = debtors[i];
        let (creditor, due) = creditors[j];

        let pay = owed.min(due);
        suggestions.push(SuggestedSettlement {
            from_uid: debtor.uid.clone(),
            from_name: debtor.name.clone(),
            to_uid: creditor.uid.clone(),
            to_name: creditor.name.clone(),
            amount_cents: pay,
        });

        debtors[i].1 = owed - pay;
        creditors[j].1 = due - pay;

        if debtors[i].1 == 0 {
            i += 1;
        }
        if creditors[j].1 == 0 {
            j += 1;
        }
    }

    let residual_debt: i64 = debtors.iter().map(|(_, rest)| rest).sum();
    let residual_credit: i64 = creditors.iter().map(|(_, rest)| rest).sum();
    if residual_debt != 0 || residual_credit != 0 {
        tracing::debug!(
            residual_debt_cents = residual_debt,
            residual_credit_cents = residual_credit,
            "pool imbalance left unsettled by suggester"
        );
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(uid: &str, net_cents: i64) -> MemberBalance {
        MemberBalance {
            uid: uid.to_string(),
            name: uid.to_uppercase(),
            contributed_cents: 0,
            owes_cents: 0,
            net_cents,
        }
    }

    #[test]
    fn empty_balances_yield_no_suggestions() {
        assert!(suggest_settlements(&[]).is_empty());
    }

    #[test]
    fn zero_net_members_are_implicitly_settled() {
        let balances = vec![balance("a", 0), balance("b", 0)];
        assert!(suggest_settlements(&balances).is_empty());
    }

    #[test]
    fn two_debtors_drain_into_one_creditor() {
        // Sorted ascending by net, as the aggregator emits them.
        let balances = vec![balance("a", -30), balance("b", -10), balance("c", 40)];

        let suggestions = suggest_settlements(&balances);

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].from_uid, "a");
        assert_eq!(suggestions[0].to_uid, "c");
        assert_eq!(suggestions[0].amount_cents, 30);
        assert_eq!(suggestions[1].from_uid, "b");
        assert_eq!(suggestions[1].to_uid, "c");
        assert_eq!(suggestions[1].amount_cents, 10);
    }

    #[test]
    fn partial_amounts_advance_only_the_drained_side() {
        let balances = vec![balance("a", -50), balance("b", 30), balance("c", 10)];

        let suggestions = suggest_settlements(&balances);

        assert_eq!(suggestions.len(), 2);
        // First match drains b, leaving a with 20 still owed.
        assert_eq!(suggestions[0].from_uid, "a");
        assert_eq!(suggestions[0].to_uid, "b");
        assert_eq!(suggestions[0].amount_cents, 30);
        // Second match drains c; a keeps a residual 10 (pool deficit).
        assert_eq!(suggestions[1].from_uid, "a");
        assert_eq!(suggestions[1].to_uid, "c");
        assert_eq!(suggestions[1].amount_cents, 10);
    }

    #[test]
    fn tie_advances_both_pointers_in_one_step() {
        let balances = vec![balance("a", -25), balance("b", -25), balance("c", 25), balance("d", 25)];

        let suggestions = suggest_settlements(&balances);

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].from_uid, "a");
        assert_eq!(suggestions[0].to_uid, "c");
        assert_eq!(suggestions[1].from_uid, "b");
        assert_eq!(suggestions[1].to_uid, "d");
    }

    #[test]
    fn surplus_creditor_is_left_with_a_residual() {
        let balances = vec![balance("a", -10), balance("b", 100)];

        let suggestions = suggest_settlements(&balances);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].amount_cents, 10);
    }

    #[test]
    fn names_carry_through_from_balances() {
        let balances = vec![balance("a", -5), balance("b", 5)];

        let suggestions = suggest_settlements(&balances);

        assert_eq!(suggestions[0].from_name, "A");
        assert_eq!(suggestions[0].to_name, "B");
    }
}
