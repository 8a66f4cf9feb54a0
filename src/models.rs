use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raw values of one spreadsheet tab. Row 0 holds the headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(values: Vec<Vec<String>>) -> Self {
        Self { values }
    }

    pub fn headers(&self) -> &[String] {
        self.values.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> &[Vec<String>] {
        self.values.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

/// Cell text at `index`, or `""` for ragged rows.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Collapses whitespace runs to a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub const ALL_OFFICES: &str = "ALL";

/// Which office's rows a viewer may see. Admins get `All`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfficeScope {
    All,
    Office(String),
}

impl OfficeScope {
    pub fn parse(raw: &str) -> Self {
        let office = normalize_whitespace(raw);
        if office.is_empty() || office == ALL_OFFICES {
            OfficeScope::All
        } else {
            OfficeScope::Office(office)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, OfficeScope::All)
    }

    pub fn admits(&self, office_cell: &str) -> bool {
        match self {
            OfficeScope::All => true,
            OfficeScope::Office(office) => normalize_whitespace(office_cell) == *office,
        }
    }
}

impl FromStr for OfficeScope {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OfficeScope::parse(s))
    }
}

impl fmt::Display for OfficeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfficeScope::All => f.write_str(ALL_OFFICES),
            OfficeScope::Office(office) => f.write_str(office),
        }
    }
}

#[cfg(test)]
pub(crate) fn table(rows: &[&[&str]]) -> SheetTable {
    SheetTable::new(
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}
