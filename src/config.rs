use std::path::PathBuf;

use anyhow::bail;
use clap::Args;

use crate::models::OfficeScope;
use crate::source::{DirectorySource, SheetsClient, Source, DEFAULT_API_BASE, DEFAULT_RANGE};

/// Connection and scope settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Spreadsheet id of the metrics workbook
    #[arg(long, env = "METRICS_SHEETS_ID", global = true)]
    pub sheet_id: Option<String>,

    /// API key for read access to the metrics workbook
    #[arg(long, env = "METRICS_SHEETS_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "SHEETS_API_BASE", global = true, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Column range read from each tab
    #[arg(long, env = "SHEETS_RANGE", global = true, default_value = DEFAULT_RANGE)]
    pub range: String,

    /// Read `<tab>.json` / `<tab>.csv` exports from this directory instead of the API
    #[arg(long, env = "APEX_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Office whose rows are visible, or ALL
    #[arg(long, env = "APEX_OFFICE_SCOPE", global = true, default_value = "ALL")]
    pub scope: OfficeScope,

    /// Where the office list is cached between runs
    #[arg(long, env = "APEX_OFFICE_CACHE", global = true)]
    pub office_cache: Option<PathBuf>,
}

impl Settings {
    pub fn source(&self) -> anyhow::Result<Source> {
        if let Some(dir) = &self.data_dir {
            if !dir.is_dir() {
                bail!("APEX_DATA_DIR {} is not a directory", dir.display());
            }
            return Ok(Source::Directory(DirectorySource::new(dir)));
        }

        match (&self.sheet_id, &self.api_key) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => Ok(Source::Api(
                SheetsClient::new(&self.api_base, id, key, &self.range),
            )),
            _ => bail!(
                "no sheet source configured: set METRICS_SHEETS_ID and METRICS_SHEETS_API_KEY, \
                 or APEX_DATA_DIR for local exports"
            ),
        }
    }

    pub fn office_cache_path(&self) -> PathBuf {
        self.office_cache
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("apex-metrics-offices.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["apex-metrics"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).settings
    }

    #[test]
    fn api_source_needs_id_and_key() {
        let settings = parse(&["--sheet-id", "abc", "--api-key", "k"]);
        assert!(matches!(settings.source(), Ok(Source::Api(_))));

        let missing_key = parse(&["--sheet-id", "abc", "--api-key", ""]);
        assert!(missing_key.source().is_err());
    }

    #[test]
    fn data_dir_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let settings = parse(&["--data-dir", path, "--sheet-id", "abc", "--api-key", "k"]);
        assert!(matches!(settings.source(), Ok(Source::Directory(_))));

        let bogus = parse(&["--data-dir", "/definitely/not/here"]);
        assert!(bogus.source().is_err());
    }

    #[test]
    fn scope_is_normalized_and_range_defaults() {
        let settings = parse(&["--scope", " OfficeA "]);
        assert_eq!(settings.scope, OfficeScope::Office("OfficeA".to_string()));
        assert_eq!(settings.range, DEFAULT_RANGE);
    }
}
