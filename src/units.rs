use crate::columns::ColumnIndex;
use crate::models::{cell, SheetTable};

pub const UNITS_HEADER: &str = "Units";

/// A service column counts when its cell holds anything.
pub fn has_service(cell_text: &str) -> bool {
    !cell_text.trim().is_empty()
}

/// 2 for a bundled internet + TV sale, 1 otherwise. Never 0.
pub fn units_for(internet: &str, tv: &str) -> u32 {
    if has_service(internet) && has_service(tv) {
        2
    } else {
        1
    }
}

pub fn row_units(row: &[String], columns: &ColumnIndex) -> u32 {
    units_for(
        cell(row, columns.internet_flag.index),
        cell(row, columns.tv_flag.index),
    )
}

/// Appends a "Units" column. Tables that already carry one are returned as-is.
pub fn annotate_units(table: &SheetTable, columns: &ColumnIndex) -> SheetTable {
    let headers = table.headers();
    if headers.is_empty() || headers.iter().any(|h| h == UNITS_HEADER) {
        return table.clone();
    }

    let width = headers.len();
    let mut values = Vec::with_capacity(table.values.len());
    let mut header_row = headers.to_vec();
    header_row.push(UNITS_HEADER.to_string());
    values.push(header_row);

    for row in table.rows() {
        let mut annotated = row.clone();
        if annotated.len() < width {
            annotated.resize(width, String::new());
        }
        annotated.push(row_units(row, columns).to_string());
        values.push(annotated);
    }

    SheetTable::new(values)
}
