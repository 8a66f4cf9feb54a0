use std::collections::HashMap;

use clap::ValueEnum;
use serde::Serialize;

use crate::columns::ColumnIndex;
use crate::models::cell;
use crate::names::format_rep_name;
use crate::status::{percent_of, NormalizedStatus};
use crate::units::row_units;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepRecord {
    pub name: String,
    pub total_sales: u32,
    pub approved: u32,
    pub cancelled: u32,
}

impl RepRecord {
    fn new(name: String) -> Self {
        Self {
            name,
            total_sales: 0,
            approved: 0,
            cancelled: 0,
        }
    }

    pub fn approval_rate(&self) -> Option<f64> {
        (self.total_sales > 0).then(|| percent_of(self.approved, self.total_sales))
    }

    pub fn cancellation_rate(&self) -> Option<f64> {
        (self.total_sales > 0).then(|| percent_of(self.cancelled, self.total_sales))
    }

    fn score(&self, ranking: Ranking) -> Option<f64> {
        match ranking {
            Ranking::TotalSales => Some(f64::from(self.total_sales)),
            Ranking::ApprovalRate => self.approval_rate(),
            Ranking::CancellationRate => self.cancellation_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    #[value(name = "total")]
    TotalSales,
    #[value(name = "approval")]
    ApprovalRate,
    #[value(name = "cancellation")]
    CancellationRate,
}

impl Ranking {
    pub fn label(self) -> &'static str {
        match self {
            Ranking::TotalSales => "Total Eligible Sales",
            Ranking::ApprovalRate => "Approval Rate",
            Ranking::CancellationRate => "Cancellation Rate",
        }
    }

    pub fn is_rate(self) -> bool {
        !matches!(self, Ranking::TotalSales)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRep {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepHighlight {
    pub ranking: Ranking,
    pub best: RankedRep,
    pub worst: RankedRep,
}

/// Per-rep unit totals, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    reps: Vec<RepRecord>,
    positions: HashMap<String, usize>,
}

impl Leaderboard {
    pub fn from_rows(rows: &[Vec<String>], columns: &ColumnIndex) -> Self {
        let mut board = Leaderboard::default();
        for row in rows {
            let name = format_rep_name(cell(row, columns.sales_agent.index));
            if name.is_empty() {
                continue;
            }
            let status = NormalizedStatus::parse(cell(row, columns.status.index));
            board.record(name, &status, row_units(row, columns));
        }
        board
    }

    pub fn record(&mut self, name: String, status: &NormalizedStatus, units: u32) {
        let index = match self.positions.get(&name) {
            Some(index) => *index,
            None => {
                self.positions.insert(name.clone(), self.reps.len());
                self.reps.push(RepRecord::new(name));
                self.reps.len() - 1
            }
        };

        let rep = &mut self.reps[index];
        rep.total_sales += units;
        match status {
            NormalizedStatus::Approved => rep.approved += units,
            NormalizedStatus::Cancelled => rep.cancelled += units,
            _ => {}
        }
    }

    pub fn reps(&self) -> &[RepRecord] {
        &self.reps
    }

    pub fn rep_count(&self) -> usize {
        self.reps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }

    /// Reps ordered best-first. Rate rankings skip reps without sales.
    pub fn ranked(&self, ranking: Ranking) -> Vec<&RepRecord> {
        let mut scored: Vec<(&RepRecord, f64)> = self
            .reps
            .iter()
            .filter_map(|rep| rep.score(ranking).map(|score| (rep, score)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(rep, _)| rep).collect()
    }

    pub fn top(&self, ranking: Ranking, limit: usize) -> Vec<&RepRecord> {
        let mut ranked = self.ranked(ranking);
        ranked.truncate(limit);
        ranked
    }

    pub fn highlight(&self, ranking: Ranking) -> Option<RepHighlight> {
        let ranked = self.ranked(ranking);
        let entry = |rep: &RepRecord| RankedRep {
            name: rep.name.clone(),
            value: round_tenth(rep.score(ranking).unwrap_or(0.0)),
        };
        Some(RepHighlight {
            ranking,
            best: entry(ranked.first().copied()?),
            worst: entry(ranked.last().copied()?),
        })
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
