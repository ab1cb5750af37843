//! Pool report exports.
//!
//! Two renderings of a [`PoolReport`]: a sectioned CSV for spreadsheets and a
//! short plain-text summary for sharing. Field names and row shapes are a
//! presentation concern; the ledger contract only guarantees the underlying
//! numbers.

use std::fmt::Write as _;

use crate::money::MoneyCents;
use crate::{EngineError, PoolReport, ResultEngine};

fn export_err(err: impl ToString) -> EngineError {
    EngineError::Export(err.to_string())
}

/// Renders a report as sectioned CSV.
///
/// Sections: SUMMARY (field/value rows), BALANCES, SUGGESTED,
/// SETTLEMENT_HISTORY, separated by blank records. Amounts stay raw integer
/// cents so the file round-trips without precision loss.
pub fn pool_report_csv(report: &PoolReport) -> ResultEngine<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer
        .write_record(["SECTION", "FIELD", "VALUE"])
        .map_err(export_err)?;
    writer
        .write_record([
            "SUMMARY",
            "TotalContributedCents",
            &report.total_contributed_cents.to_string(),
        ])
        .map_err(export_err)?;
    writer
        .write_record([
            "SUMMARY",
            "TotalSpentCents",
            &report.total_spent_cents.to_string(),
        ])
        .map_err(export_err)?;
    writer
        .write_record(["SUMMARY", "BalanceCents", &report.balance_cents().to_string()])
        .map_err(export_err)?;
    writer.write_record([""]).map_err(export_err)?;

    writer
        .write_record(["BALANCES", "Name", "NetCents", "ContributedCents", "OwesCents"])
        .map_err(export_err)?;
    for balance in &report.balances {
        writer
            .write_record([
                "BALANCES",
                &balance.name,
                &balance.net_cents.to_string(),
                &balance.contributed_cents.to_string(),
                &balance.owes_cents.to_string(),
            ])
            .map_err(export_err)?;
    }
    writer.write_record([""]).map_err(export_err)?;

    writer
        .write_record(["SUGGESTED", "From", "To", "AmountCents"])
        .map_err(export_err)?;
    for suggestion in &report.suggested_settlements {
        writer
            .write_record([
                "SUGGESTED",
                &suggestion.from_name,
                &suggestion.to_name,
                &suggestion.amount_cents.to_string(),
            ])
            .map_err(export_err)?;
    }
    writer.write_record([""]).map_err(export_err)?;

    writer
        .write_record(["SETTLEMENT_HISTORY", "From", "To", "AmountCents", "Note", "CreatedAt"])
        .map_err(export_err)?;
    for settlement in &report.settlement_history {
        writer
            .write_record([
                "SETTLEMENT_HISTORY",
                &settlement.from_name,
                &settlement.to_name,
                &settlement.amount_cents.to_string(),
                &settlement.note,
                &settlement.created_at.to_rfc3339(),
            ])
            .map_err(export_err)?;
    }

    let bytes = writer.into_inner().map_err(export_err)?;
    String::from_utf8(bytes).map_err(export_err)
}

/// Renders a report as a short human-readable summary.
pub fn pool_report_text(report: &PoolReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trip pool summary");
    let _ = writeln!(
        out,
        "Contributed {} / Spent {} / Balance {}",
        MoneyCents::new(report.total_contributed_cents),
        MoneyCents::new(report.total_spent_cents),
        MoneyCents::new(report.balance_cents()),
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Balances:");
    if report.balances.is_empty() {
        let _ = writeln!(out, "- None");
    }
    for balance in &report.balances {
        let _ = writeln!(
            out,
            "- {}: {}",
            balance.name,
            MoneyCents::new(balance.net_cents)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Suggested settlements:");
    if report.suggested_settlements.is_empty() {
        let _ = writeln!(out, "- All settled");
    }
    for suggestion in &report.suggested_settlements {
        let _ = writeln!(
            out,
            "- {} pays {} {}",
            suggestion.from_name,
            suggestion.to_name,
            MoneyCents::new(suggestion.amount_cents)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Settlement history:");
    if report.settlement_history.is_empty() {
        let _ = writeln!(out, "- None");
    }
    for settlement in &report.settlement_history {
        let _ = writeln!(
            out,
            "- {} paid {} {}",
            settlement.from_name,
            settlement.to_name,
            MoneyCents::new(settlement.amount_cents)
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::ledger::MemberBalance;
    use crate::settle::SuggestedSettlement;
    use crate::settlements::Settlement;

    fn report() -> PoolReport {
        PoolReport {
            balances: vec![
                MemberBalance {
                    uid: "a".to_string(),
                    name: "Alice, \"the organizer\"".to_string(),
                    contributed_cents: 0,
                    owes_cents: 500,
                    net_cents: -500,
                },
                MemberBalance {
                    uid: "b".to_string(),
                    name: "Bob".to_string(),
                    contributed_cents: 1000,
                    owes_cents: 500,
                    net_cents: 500,
                },
            ],
            total_contributed_cents: 1000,
            total_spent_cents: 1000,
            suggested_settlements: vec![SuggestedSettlement {
                from_uid: "a".to_string(),
                from_name: "Alice, \"the organizer\"".to_string(),
                to_uid: "b".to_string(),
                to_name: "Bob".to_string(),
                amount_cents: 500,
            }],
            settlement_history: vec![
                Settlement::new(
                    "trip".to_string(),
                    "b".to_string(),
                    "Bob".to_string(),
                    "a".to_string(),
                    "Alice, \"the organizer\"".to_string(),
                    250,
                    "cash".to_string(),
                    Utc.timestamp_opt(0, 0).unwrap(),
                )
                .unwrap(),
            ],
        }
    }

    #[test]
    fn csv_contains_all_sections() {
        let csv = pool_report_csv(&report()).unwrap();
        assert!(csv.starts_with("SECTION,FIELD,VALUE"));
        for section in ["SUMMARY", "BALANCES", "SUGGESTED", "SETTLEMENT_HISTORY"] {
            assert!(csv.contains(section), "missing section {section}");
        }
        assert!(csv.contains("SUMMARY,TotalContributedCents,1000"));
        assert!(csv.contains("SUMMARY,BalanceCents,0"));
    }

    #[test]
    fn csv_quotes_names_containing_commas() {
        let csv = pool_report_csv(&report()).unwrap();
        assert!(csv.contains("\"Alice, \"\"the organizer\"\"\""));
    }

    #[test]
    fn text_summary_formats_cents_with_two_decimals() {
        let text = pool_report_text(&report());
        assert!(text.contains("Contributed 10.00 / Spent 10.00 / Balance 0.00"));
        assert!(text.contains("pays Bob 5.00"));
    }
}
