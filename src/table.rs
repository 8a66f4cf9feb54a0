use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::columns::{find_header, ColumnIndex};
use crate::filter::{filter_rows, matches_search};
use crate::models::{cell, OfficeScope, SheetTable};
use crate::names::format_rep_name;
use crate::units::annotate_units;

pub const NO_OFFICE_DATA: &str = "No data available for your office";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Rows as shown in the tracker view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    /// Scope-filtered rows with a Units column and display-ready rep names.
    /// A scoped view drops the office column.
    pub fn build(table: &SheetTable, columns: &ColumnIndex, scope: &OfficeScope) -> Self {
        let mut visible = vec![table.headers().to_vec()];
        visible.extend(filter_rows(table.rows(), columns.office.index, scope));
        let annotated = annotate_units(&SheetTable::new(visible), columns);

        let mut headers = annotated.headers().to_vec();
        let mut rows: Vec<Vec<String>> = annotated.values.into_iter().skip(1).collect();
        for row in &mut rows {
            if let Some(rep) = row.get_mut(columns.sales_agent.index) {
                *rep = format_rep_name(rep);
            }
        }

        let office = columns.office;
        if !scope.is_all() && office.matched {
            headers.remove(office.index);
            for row in &mut rows {
                if office.index < row.len() {
                    row.remove(office.index);
                }
            }
        }

        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn search(&self, term: &str) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| matches_search(row, term))
                .cloned()
                .collect(),
        }
    }

    /// Column position by header text, case-insensitive substring.
    pub fn column(&self, name: &str) -> Option<usize> {
        find_header(&self.headers, name)
    }

    pub fn sort_by(&mut self, column: usize, direction: SortDirection) {
        self.rows.sort_by(|a, b| {
            let ordering = cell(a, column).cmp(cell(b, column));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        out.write_record(&self.headers)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }
}
