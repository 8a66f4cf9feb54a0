use tracing::{debug, warn};

use crate::columns::ColumnIndex;
use crate::filter::filter_rows;
use crate::leaderboard::Leaderboard;
use crate::models::{OfficeScope, SheetTable};
use crate::status::StatusBreakdown;

/// Everything derived from one tab for one office scope.
#[derive(Debug, Clone)]
pub struct SalesMetrics {
    pub scope: OfficeScope,
    pub rows: Vec<Vec<String>>,
    pub breakdown: StatusBreakdown,
    pub leaderboard: Leaderboard,
}

pub fn compute(table: &SheetTable, scope: &OfficeScope) -> SalesMetrics {
    let columns = ColumnIndex::resolve(table.headers());
    for role in columns.defaulted() {
        warn!(
            role = role.label(),
            index = columns.get(role).index,
            "no matching header, using default column"
        );
    }

    let rows = filter_rows(table.rows(), columns.office.index, scope);
    debug!(
        scope = %scope,
        total = table.rows().len(),
        kept = rows.len(),
        "filtered sheet rows"
    );

    let breakdown = StatusBreakdown::from_rows(&rows, &columns);
    let leaderboard = Leaderboard::from_rows(&rows, &columns);
    debug!(
        total_units = breakdown.total_units(),
        reps = leaderboard.rep_count(),
        "aggregated sales metrics"
    );

    SalesMetrics {
        scope: scope.clone(),
        rows,
        breakdown,
        leaderboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{Ranking, RepRecord};
    use crate::models::table;
    use crate::status::NormalizedStatus;

    fn two_office_sheet() -> SheetTable {
        table(&[
            &["Office", "SalesAgent", "Status", "C", "D", "E", "F", "H", "I"],
            &["OfficeA", "Smith, John", "Approved", "", "", "", "", "x", ""],
            &["OfficeA", "Doe, Jane", "Cancelled", "", "", "", "", "", "y"],
        ])
    }

    #[test]
    fn scoped_office_sees_its_sales() {
        let metrics = compute(&two_office_sheet(), &OfficeScope::parse("OfficeA"));
        let breakdown = &metrics.breakdown;

        assert_eq!(breakdown.total_units(), 2);
        assert_eq!(breakdown.units(&NormalizedStatus::Approved), 1);
        assert_eq!(breakdown.percentage(&NormalizedStatus::Approved), 50.0);
        assert_eq!(breakdown.units(&NormalizedStatus::Cancelled), 1);
        assert_eq!(breakdown.percentage(&NormalizedStatus::Cancelled), 50.0);

        let ranked: Vec<RepRecord> = metrics
            .leaderboard
            .ranked(Ranking::TotalSales)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(
            ranked,
            vec![
                RepRecord {
                    name: "John Smith".to_string(),
                    total_sales: 1,
                    approved: 1,
                    cancelled: 0,
                },
                RepRecord {
                    name: "Jane Doe".to_string(),
                    total_sales: 1,
                    approved: 0,
                    cancelled: 1,
                },
            ]
        );
    }

    #[test]
    fn other_office_sees_nothing() {
        let metrics = compute(&two_office_sheet(), &OfficeScope::parse("OfficeB"));
        assert!(metrics.rows.is_empty());
        assert_eq!(metrics.breakdown.total_units(), 0);
        assert!(metrics
            .breakdown
            .summary(None)
            .buckets
            .iter()
            .all(|bucket| bucket.percentage == 0.0));
        assert_eq!(metrics.breakdown.simplified().approved.percentage, 0.0);
        assert!(metrics.leaderboard.is_empty());
    }

    #[test]
    fn admin_scope_sees_every_office() {
        let mut sheet = two_office_sheet();
        sheet.values.push(vec!["OfficeB".into(), "Roe, Rick".into(), "Pending".into()]);
        let metrics = compute(&sheet, &OfficeScope::All);
        assert_eq!(metrics.rows.len(), 3);
        assert_eq!(metrics.breakdown.total_units(), 3);
        assert_eq!(metrics.leaderboard.rep_count(), 3);
    }

    #[test]
    fn header_only_table_is_empty() {
        let metrics = compute(&table(&[&["Office", "Status"]]), &OfficeScope::All);
        assert_eq!(metrics.breakdown.total_units(), 0);
        assert!(metrics.leaderboard.is_empty());
    }
}
