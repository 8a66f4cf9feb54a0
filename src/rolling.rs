use anyhow::{bail, Context};
use tracing::info;

use crate::models::{cell, SheetTable};
use crate::source::{fetch_all, Source};

/// Weekly tabs, newest first.
pub const WEEK_TABS: [&str; 6] = [
    "Current Week",
    "Week 2",
    "Week 3",
    "Week 4",
    "Week 5",
    "Week 6",
];

pub const DEFAULT_WINDOW: usize = 4;

/// "Current Week" is week 1; "Week N" is week N.
pub fn week_number(tab: &str) -> usize {
    let digits: String = tab.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|n| *n > 0).unwrap_or(1)
}

pub fn tab_name(week: usize) -> String {
    if week <= 1 {
        WEEK_TABS[0].to_string()
    } else {
        format!("Week {week}")
    }
}

/// The tab and the older tabs after it, up to `size` and never past the last tab.
pub fn window_for(tab: &str, size: usize) -> Vec<String> {
    let start = week_number(tab);
    (start..start.saturating_add(size.max(1)))
        .filter(|week| *week <= WEEK_TABS.len())
        .map(tab_name)
        .collect()
}

// Blank cells are text here, not zero.
fn numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Position-wise mean of numeric cells, shaped like the first table.
/// Text cells and the header row come from the first table unchanged.
pub fn combine(tables: &[SheetTable]) -> Option<SheetTable> {
    let first = tables.first()?;
    if first.values.is_empty() {
        return None;
    }

    let count = tables.len() as f64;
    let values = first
        .values
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            if row_index == 0 {
                return row.clone();
            }
            row.iter()
                .enumerate()
                .map(|(col, value)| {
                    if numeric(value).is_none() {
                        return value.clone();
                    }
                    let sum: f64 = tables
                        .iter()
                        .map(|table| {
                            table
                                .values
                                .get(row_index)
                                .and_then(|other| numeric(cell(other, col)))
                                .unwrap_or(0.0)
                        })
                        .sum();
                    format!("{:.1}", sum / count)
                })
                .collect()
        })
        .collect();

    Some(SheetTable::new(values))
}

/// Fetches the window's tabs concurrently and averages them. Any failed tab fails the whole run.
pub async fn rolling_average(
    source: &Source,
    tab: &str,
    size: usize,
) -> anyhow::Result<SheetTable> {
    let tabs = window_for(tab, size);
    info!(tabs = ?tabs, "calculating rolling average");

    let tables = fetch_all(source, &tabs)
        .await
        .context("failed to calculate rolling average")?;

    match combine(&tables) {
        Some(table) => Ok(table),
        None => bail!("no data available for the selected weeks"),
    }
}
