// Fetching responses from a Google Sheet shared by link.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::report::*;

pub const FETCH_TIMEOUT_SECS: u64 = 30;

static SHEET_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").unwrap());
static GID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"gid=([0-9]+)").unwrap());

/// The identifiers of one tab of a spreadsheet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetLink {
    pub sheet_id: String,
    /// The tab, `"0"` (the first tab) when the link does not name one.
    pub gid: String,
}

impl SheetLink {
    pub fn export_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
            self.sheet_id, self.gid
        )
    }
}

pub fn parse_sheet_link(url: &str) -> ReportResult<SheetLink> {
    let sheet_id = SHEET_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .context(InvalidSheetUrlSnafu { url })?;
    let gid = GID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "0".to_string());
    Ok(SheetLink { sheet_id, gid })
}

fn classify_fetch_error(err: reqwest::Error, url: &str) -> ReportError {
    if err.is_connect() || err.is_timeout() {
        ReportError::SheetUnreachable {
            source: err,
            url: url.to_string(),
        }
    } else {
        ReportError::SheetAccessDenied {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }
}

/// Downloads the CSV export of a shared sheet and parses it.
///
/// A sheet that is not shared publicly answers with a sign-in page rather
/// than an error status: an HTML answer is treated as an access problem.
pub fn fetch_sheet(url: &str, timeout: Duration) -> ReportResult<Dataset> {
    let link = parse_sheet_link(url)?;
    let export = link.export_url();
    info!("Fetching {}", export);
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| classify_fetch_error(e, &export))?;
    let resp = client
        .get(&export)
        .send()
        .map_err(|e| classify_fetch_error(e, &export))?;

    let status = resp.status();
    ensure!(
        status.is_success(),
        SheetAccessDeniedSnafu {
            url: export.as_str(),
            detail: format!("HTTP status {}", status)
        }
    );
    let is_html = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);
    let body = resp
        .text()
        .map_err(|e| classify_fetch_error(e, &export))?;
    ensure!(
        !is_html && !looks_like_html(&body),
        SheetAccessDeniedSnafu {
            url: export.as_str(),
            detail: "the link returned a web page instead of CSV data"
        }
    );
    debug!("fetch_sheet: received {} bytes", body.len());

    io_csv::read_csv_from_reader(body.as_bytes(), &export).map_err(|e| ReportError::SheetFormat {
        detail: e.to_string(),
    })
}

fn looks_like_html(body: &str) -> bool {
    let start = body.trim_start().to_lowercase();
    start.starts_with("<!doctype html") || start.starts_with("<html")
}
