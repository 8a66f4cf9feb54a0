use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::columns::ColumnIndex;
use crate::models::{cell, normalize_whitespace, SheetTable};
use crate::source::SourceError;

pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// Distinct non-blank office names from the data rows, sorted.
pub fn unique_offices(table: &SheetTable) -> Vec<String> {
    let office = ColumnIndex::resolve(table.headers()).office.index;
    table
        .rows()
        .iter()
        .map(|row| normalize_whitespace(cell(row, office)))
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    offices: Vec<String>,
    fetched_at: DateTime<Utc>,
}

/// Office list with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficeCache {
    ttl: Duration,
    entry: Option<Entry>,
}

impl Default for OfficeCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl OfficeCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match &self.entry {
            Some(entry) => now - entry.fetched_at >= self.ttl,
            None => true,
        }
    }

    pub fn get(&self, now: DateTime<Utc>) -> Option<&[String]> {
        if self.is_expired(now) {
            return None;
        }
        self.entry.as_ref().map(|entry| entry.offices.as_slice())
    }

    pub fn store(&mut self, offices: Vec<String>, now: DateTime<Utc>) {
        self.entry = Some(Entry {
            offices,
            fetched_at: now,
        });
    }

    pub async fn get_or_refresh<F, Fut>(
        &mut self,
        now: DateTime<Utc>,
        fetch: F,
    ) -> Result<Vec<String>, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, SourceError>>,
    {
        if let Some(offices) = self.get(now) {
            debug!(count = offices.len(), "office list served from cache");
            return Ok(offices.to_vec());
        }

        let offices = fetch().await?;
        self.store(offices.clone(), now);
        Ok(offices)
    }

    /// Loads a cache persisted by `save`. A missing or unreadable file starts empty.
    pub fn load(path: &Path, ttl: Duration) -> Self {
        let entry = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str::<Entry>(&text).ok());
        Self { ttl, entry }
    }

    pub fn save(&self, path: &Path) -> Result<(), SourceError> {
        if let Some(entry) = &self.entry {
            std::fs::write(path, serde_json::to_string_pretty(entry)?)?;
        }
        Ok(())
    }
}
