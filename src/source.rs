use std::fs;
use std::path::{Path, PathBuf};

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::models::SheetTable;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_RANGE: &str = "A:K";
const ACCESS_CHECK_RANGE: &str = "A1:B2";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to fetch {tab}: {status}")]
    Status { tab: String, status: StatusCode },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no data file for tab {tab} in {dir}")]
    NotFound { tab: String, dir: PathBuf },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Deserialize)]
struct SheetValuesResponse {
    values: Option<Vec<Vec<String>>>,
}

/// Read-only client for the Sheets values endpoint, authenticated by API key.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    api_key: String,
    range: String,
}

impl SheetsClient {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        api_key: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            api_key: api_key.into(),
            range: range.into(),
        }
    }

    /// `{base}/v4/spreadsheets/{id}/values/{a1}?key={api_key}`
    pub fn values_url(&self, a1: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SourceError::Config(format!("invalid API base {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Config(format!("API base {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", a1]);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    pub async fn fetch(&self, tab: &str) -> Result<SheetTable, SourceError> {
        self.fetch_a1(tab, &format!("{tab}!{}", self.range)).await
    }

    /// Reads a small range to confirm the sheet id and key are usable.
    pub async fn check_access(&self) -> Result<usize, SourceError> {
        let table = self.fetch_a1(ACCESS_CHECK_RANGE, ACCESS_CHECK_RANGE).await?;
        Ok(table.values.len())
    }

    async fn fetch_a1(&self, tab: &str, a1: &str) -> Result<SheetTable, SourceError> {
        let url = self.values_url(a1)?;
        debug!(tab, "requesting sheet values");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                tab: tab.to_string(),
                status,
            });
        }

        let body: SheetValuesResponse = resp.json().await?;
        let table = SheetTable::new(body.values.unwrap_or_default());
        info!(tab, rows = table.values.len(), "fetched sheet");
        Ok(table)
    }
}

/// Tabs exported to disk as `<tab>.json` (`{"values": [...]}`) or `<tab>.csv`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fetch(&self, tab: &str) -> Result<SheetTable, SourceError> {
        let json_path = self.dir.join(format!("{tab}.json"));
        if json_path.exists() {
            let text = fs::read_to_string(&json_path)?;
            let table: SheetTable = serde_json::from_str(&text)?;
            info!(tab, rows = table.values.len(), path = %json_path.display(), "loaded sheet");
            return Ok(table);
        }

        let csv_path = self.dir.join(format!("{tab}.csv"));
        if csv_path.exists() {
            let table = read_csv(&csv_path)?;
            info!(tab, rows = table.values.len(), path = %csv_path.display(), "loaded sheet");
            return Ok(table);
        }

        Err(SourceError::NotFound {
            tab: tab.to_string(),
            dir: self.dir.clone(),
        })
    }
}

fn read_csv(path: &Path) -> Result<SheetTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        values.push(record.iter().map(str::to_string).collect());
    }
    Ok(SheetTable::new(values))
}

/// Where sheet tabs come from.
#[derive(Debug, Clone)]
pub enum Source {
    Api(SheetsClient),
    Directory(DirectorySource),
}

impl Source {
    pub async fn fetch(&self, tab: &str) -> Result<SheetTable, SourceError> {
        match self {
            Source::Api(client) => client.fetch(tab).await,
            Source::Directory(dir) => dir.fetch(tab),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::Api(client) => format!("spreadsheet {}", client.spreadsheet_id),
            Source::Directory(dir) => format!("directory {}", dir.dir().display()),
        }
    }
}

/// Fetches every tab concurrently. The first failure aborts the rest.
/// Results come back in the order of `tabs`.
pub async fn fetch_all(source: &Source, tabs: &[String]) -> Result<Vec<SheetTable>, SourceError> {
    let mut set = JoinSet::new();
    for (position, tab) in tabs.iter().enumerate() {
        let source = source.clone();
        let tab = tab.clone();
        set.spawn(async move { (position, source.fetch(&tab).await) });
    }

    let mut tables: Vec<Option<SheetTable>> = vec![None; tabs.len()];
    while let Some(joined) = set.join_next().await {
        let (position, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                set.abort_all();
                return Err(e.into());
            }
        };
        match result {
            Ok(table) => tables[position] = Some(table),
            Err(e) => {
                set.abort_all();
                return Err(e);
            }
        }
    }

    Ok(tables.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP reply and returns the base URL to reach it.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            loop {
                let n = stream.read(&mut buf[read..]).await.unwrap();
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn client() -> SheetsClient {
        SheetsClient::new(DEFAULT_API_BASE, "sheet123", "secret", DEFAULT_RANGE)
    }

    #[test]
    fn values_url_encodes_tab_names() {
        let url = client().values_url("Current Week!A:K").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/Current%20Week!A:K?key=secret"
        );
    }

    #[test]
    fn values_url_rejects_bad_base() {
        let bad = SheetsClient::new("not a url", "id", "key", DEFAULT_RANGE);
        assert!(matches!(bad.values_url("A1:B2"), Err(SourceError::Config(_))));
    }

    #[test]
    fn directory_source_reads_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Current Week.json"),
            r#"{"range":"Current Week!A1:C2","values":[["Office","Rep","Status"],["A","Smith, John","Approved"]]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("Week 2.csv"),
            "Office,Rep,Status\nA,\"Doe, Jane\",Cancelled\nB\n",
        )
        .unwrap();

        let source = DirectorySource::new(dir.path());
        let json = source.fetch("Current Week").unwrap();
        assert_eq!(json.values[1][1], "Smith, John");

        let csv = source.fetch("Week 2").unwrap();
        assert_eq!(csv.values.len(), 3);
        assert_eq!(csv.values[1][1], "Doe, Jane");
        assert_eq!(csv.values[2], vec!["B".to_string()]);

        assert!(matches!(source.fetch("Week 3"), Err(SourceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn fetch_all_keeps_tab_order() {
        let dir = tempfile::tempdir().unwrap();
        for (tab, marker) in [("Week 2", "two"), ("Week 3", "three"), ("Week 4", "four")] {
            fs::write(dir.path().join(format!("{tab}.csv")), format!("H\n{marker}\n")).unwrap();
        }
        let source = Source::Directory(DirectorySource::new(dir.path()));
        let tabs: Vec<String> = ["Week 4", "Week 2", "Week 3"].iter().map(|t| t.to_string()).collect();

        let tables = fetch_all(&source, &tabs).await.unwrap();
        let markers: Vec<&str> = tables.iter().map(|t| t.values[1][0].as_str()).collect();
        assert_eq!(markers, vec!["four", "two", "three"]);
    }

    #[tokio::test]
    async fn fetch_all_fails_when_any_tab_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Week 2.csv"), "H\nx\n").unwrap();
        let source = Source::Directory(DirectorySource::new(dir.path()));
        let tabs = vec!["Week 2".to_string(), "Week 5".to_string()];

        let err = fetch_all(&source, &tabs).await.unwrap_err();
        assert!(err.to_string().contains("Week 5"));
    }

    #[tokio::test]
    async fn api_error_status_is_reported_per_tab() {
        let base = serve_once("404 Not Found", r#"{"error":{"code":404}}"#).await;
        let client = SheetsClient::new(base, "sheet123", "secret", DEFAULT_RANGE);

        match client.fetch("Week 2").await {
            Err(SourceError::Status { tab, status }) => {
                assert_eq!(tab, "Week 2");
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_reply_without_values_is_an_empty_table() {
        let body = r#"{"range":"'Current Week'!A1:K1","majorDimension":"ROWS"}"#;
        let base = serve_once("200 OK", body).await;
        let client = SheetsClient::new(base, "sheet123", "secret", DEFAULT_RANGE);

        let table = client.fetch("Current Week").await.unwrap();
        assert!(table.values.is_empty());
        assert!(table.headers().is_empty());
    }
}
