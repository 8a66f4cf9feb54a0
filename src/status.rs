use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::columns::ColumnIndex;
use crate::models::cell;
use crate::units::row_units;

/// Sale outcome derived from the free-text status cell.
///
/// Variant order is the presentation order; `Other` buckets sort after the
/// known labels, alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NormalizedStatus {
    Approved,
    Cancelled,
    Pending,
    PushedOut,
    PushedIn,
    Jeopardy,
    Rescheduled,
    WorkingService,
    Other(String),
}

impl NormalizedStatus {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();

        if lower.contains("approved") {
            return NormalizedStatus::Approved;
        }
        if lower.contains("cancelled") {
            return NormalizedStatus::Cancelled;
        }

        match lower.as_str() {
            "" | "pending" => NormalizedStatus::Pending,
            "pushed in" => NormalizedStatus::PushedIn,
            "pushed out" => NormalizedStatus::PushedOut,
            "jeopardy" => NormalizedStatus::Jeopardy,
            "rescheduled" => NormalizedStatus::Rescheduled,
            "working service" => NormalizedStatus::WorkingService,
            _ => NormalizedStatus::Other(capitalize(trimmed)),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NormalizedStatus::Approved => "Approved",
            NormalizedStatus::Cancelled => "Cancelled",
            NormalizedStatus::Pending => "Pending",
            NormalizedStatus::PushedOut => "Pushed Out",
            NormalizedStatus::PushedIn => "Pushed In",
            NormalizedStatus::Jeopardy => "Jeopardy",
            NormalizedStatus::Rescheduled => "Rescheduled",
            NormalizedStatus::WorkingService => "Working Service",
            NormalizedStatus::Other(label) => label,
        }
    }
}

impl fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `100 * part / total`, or 0 for an empty total.
pub fn percent_of(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * f64::from(part) / f64::from(total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBucket {
    pub status: String,
    pub units: u32,
    pub percentage: f64,
}

/// Approved / Cancelled / everything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimplifiedBreakdown {
    pub approved: StatusBucket,
    pub cancelled: StatusBucket,
    pub pending: StatusBucket,
}

/// Unit-weighted counts per normalized status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBreakdown {
    counts: BTreeMap<NormalizedStatus, u32>,
    total_units: u32,
}

impl StatusBreakdown {
    pub fn from_rows(rows: &[Vec<String>], columns: &ColumnIndex) -> Self {
        let mut breakdown = StatusBreakdown::default();
        for row in rows {
            let status = NormalizedStatus::parse(cell(row, columns.status.index));
            breakdown.add(status, row_units(row, columns));
        }
        breakdown
    }

    pub fn add(&mut self, status: NormalizedStatus, units: u32) {
        *self.counts.entry(status).or_insert(0) += units;
        self.total_units += units;
    }

    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    pub fn units(&self, status: &NormalizedStatus) -> u32 {
        self.counts.get(status).copied().unwrap_or(0)
    }

    pub fn percentage(&self, status: &NormalizedStatus) -> f64 {
        percent_of(self.units(status), self.total_units)
    }

    /// Non-empty buckets in presentation order.
    pub fn buckets(&self) -> Vec<StatusBucket> {
        self.counts
            .iter()
            .filter(|(_, units)| **units > 0)
            .map(|(status, units)| StatusBucket {
                status: status.label().to_string(),
                units: *units,
                percentage: self.percentage(status),
            })
            .collect()
    }

    pub fn approved(&self) -> u32 {
        self.units(&NormalizedStatus::Approved)
    }

    pub fn cancelled(&self) -> u32 {
        self.units(&NormalizedStatus::Cancelled)
    }

    /// Everything that is neither approved nor cancelled.
    pub fn simplified_pending(&self) -> u32 {
        self.total_units - self.approved() - self.cancelled()
    }

    pub fn simplified(&self) -> SimplifiedBreakdown {
        let bucket = |status: NormalizedStatus, units: u32| StatusBucket {
            status: status.label().to_string(),
            units,
            percentage: percent_of(units, self.total_units),
        };
        SimplifiedBreakdown {
            approved: bucket(NormalizedStatus::Approved, self.approved()),
            cancelled: bucket(NormalizedStatus::Cancelled, self.cancelled()),
            pending: bucket(NormalizedStatus::Pending, self.simplified_pending()),
        }
    }

    /// Period-over-period change against an earlier breakdown.
    pub fn compare(&self, previous: &StatusBreakdown) -> Vec<StatusDelta> {
        [
            (Metric::TotalSales, self.total_units, previous.total_units),
            (Metric::Approved, self.approved(), previous.approved()),
            (Metric::Cancelled, self.cancelled(), previous.cancelled()),
            (Metric::Pending, self.simplified_pending(), previous.simplified_pending()),
        ]
        .into_iter()
        .map(|(metric, current, before)| StatusDelta::new(metric, current, before))
        .collect()
    }

    pub fn summary(&self, previous: Option<&StatusBreakdown>) -> StatusSummary {
        StatusSummary {
            total_units: self.total_units,
            buckets: self.buckets(),
            simplified: self.simplified(),
            deltas: previous.map(|p| self.compare(p)).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub total_units: u32,
    pub buckets: Vec<StatusBucket>,
    pub simplified: SimplifiedBreakdown,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deltas: Vec<StatusDelta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalSales,
    Approved,
    Cancelled,
    Pending,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::TotalSales => "Total Sales",
            Metric::Approved => "Approved",
            Metric::Cancelled => "Cancelled",
            Metric::Pending => "Pending",
        }
    }

    fn growth_is_good(self) -> bool {
        matches!(self, Metric::TotalSales | Metric::Approved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDelta {
    pub metric: Metric,
    pub current: u32,
    pub previous: u32,
    pub difference: i64,
    pub percent_change: f64,
    pub trend: Trend,
    pub favorable: bool,
}

impl StatusDelta {
    pub fn new(metric: Metric, current: u32, previous: u32) -> Self {
        let difference = i64::from(current) - i64::from(previous);
        let percent_change = if previous != 0 {
            100.0 * difference as f64 / f64::from(previous)
        } else if current == 0 {
            0.0
        } else {
            100.0
        };
        let trend = match difference {
            d if d > 0 => Trend::Up,
            d if d < 0 => Trend::Down,
            _ => Trend::Flat,
        };
        // A flat total or approval count reads as a miss; flat cancellations as a win.
        let favorable = if metric.growth_is_good() {
            difference > 0
        } else {
            difference <= 0
        };

        Self {
            metric,
            current,
            previous,
            difference,
            percent_change,
            trend,
            favorable,
        }
    }
}
