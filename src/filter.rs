use crate::models::{cell, OfficeScope};

/// Leading cells inspected when deciding whether a row is blank (columns A..K).
pub const BLANK_SCAN_WIDTH: usize = 11;

pub fn has_data(row: &[String]) -> bool {
    row.iter()
        .take(BLANK_SCAN_WIDTH)
        .any(|value| !value.trim().is_empty())
}

/// Keeps non-blank rows visible to `scope`, in their original order.
pub fn filter_rows(
    rows: &[Vec<String>],
    office_column: usize,
    scope: &OfficeScope,
) -> Vec<Vec<String>> {
    rows.iter()
        .filter(|row| has_data(row) && scope.admits(cell(row, office_column)))
        .cloned()
        .collect()
}

/// Case-insensitive substring match against every cell.
pub fn matches_search(row: &[String], term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty() || row.iter().any(|value| value.to_lowercase().contains(&term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table;

    fn sample() -> Vec<Vec<String>> {
        table(&[
            &["OfficeA", "Smith, John", "Approved"],
            &["", "", ""],
            &["OfficeB", "Doe, Jane", "Cancelled"],
            &["  OfficeA ", "Roe, Rick", "Pending"],
            &[],
        ])
        .values
    }

    #[test]
    fn drops_blank_rows_for_every_scope() {
        let kept = filter_rows(&sample(), 0, &OfficeScope::All);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0][1], "Smith, John");
        assert_eq!(kept[2][1], "Roe, Rick");
    }

    #[test]
    fn office_scope_keeps_matching_rows_in_order() {
        let kept = filter_rows(&sample(), 0, &OfficeScope::parse("OfficeA"));
        let reps: Vec<&str> = kept.iter().map(|row| row[1].as_str()).collect();
        assert_eq!(reps, vec!["Smith, John", "Roe, Rick"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let scope = OfficeScope::parse("OfficeA");
        let once = filter_rows(&sample(), 0, &scope);
        let twice = filter_rows(&once, 0, &scope);
        assert_eq!(once, twice);
    }

    #[test]
    fn cells_past_scan_width_do_not_count() {
        let mut row = vec![String::new(); BLANK_SCAN_WIDTH];
        row.push("late".to_string());
        assert!(!has_data(&row));
        row[BLANK_SCAN_WIDTH - 1] = "K".to_string();
        assert!(has_data(&row));
    }

    #[test]
    fn search_is_case_insensitive() {
        let row = vec!["OfficeA".to_string(), "Smith, John".to_string()];
        assert!(matches_search(&row, "SMITH"));
        assert!(matches_search(&row, ""));
        assert!(!matches_search(&row, "doe"));
    }
}
