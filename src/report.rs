use log::{debug, info, warn};

use evaluation_scoring::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod assembler;
pub mod chart;
pub mod config_reader;
pub mod credentials;
pub mod html;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_gsheet;
pub mod metadata;
pub mod render;
pub mod report_types;
pub mod session;

use crate::report::assembler::{CommentSection, Report};
use crate::report::chart::ChartTarget;
use crate::report::config_reader::*;
use crate::report::io_common::{fmt_bound, fmt_score};
use crate::report::render::{DocumentRenderer, RenderError};
use crate::report::session::{PendingReport, Session};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReportError {
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {origin}"))]
    CsvLineParse {
        source: csv::Error,
        origin: String,
        lineno: u64,
    },
    #[snafu(display("Line {lineno} of {origin} has more cells than the header"))]
    CsvLineTooLong { origin: String, lineno: u64 },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Invalid response table: {source}"))]
    InvalidDataset { source: DatasetError },

    #[snafu(display(
        "Invalid Google Sheet URL {url:?}: could not find the sheet ID"
    ))]
    InvalidSheetUrl { url: String },
    #[snafu(display(
        "Network connection error: failed to reach {url}. This may be due to a firewall; try uploading a CSV file instead"
    ))]
    SheetUnreachable { source: reqwest::Error, url: String },
    #[snafu(display(
        "Could not load data from the Google Sheet link ({detail}). Please ensure the sheet's sharing is set to 'Anyone with the link'"
    ))]
    SheetAccessDenied { url: String, detail: String },
    #[snafu(display("The Google Sheet did not return valid CSV data: {detail}"))]
    SheetFormat { detail: String },

    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Please fill in the '{field}': {reason}"))]
    InvalidMetadata { field: String, reason: String },
    #[snafu(display("Unknown report type {name:?} (expected 'faculty' or 'course')"))]
    UnknownReportType { name: String },
    #[snafu(display("Unknown data source provider {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("The {provider} data source needs the '{field}' option"))]
    MissingSourceField { provider: String, field: String },

    #[snafu(display("Could not draw a chart: {detail}"))]
    ChartRaster { detail: String },
    #[snafu(display("PDF rendering failed: {source}"))]
    Render { source: RenderError },

    #[snafu(display("Error accessing the user store {path}"))]
    CredentialStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Username {username:?} already exists"))]
    UserExists { username: String },
    #[snafu(display("Unknown role {role:?} (expected 'admin' or 'user')"))]
    UnknownRole { role: String },
    #[snafu(display("Invalid username or password"))]
    InvalidCredentials {},
    #[snafu(display("User {username:?} is not an administrator"))]
    NotAuthorized { username: String },
    #[snafu(display("No report is in progress"))]
    NoPendingReport {},

    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// What a generation run wrote to disk.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub markup_path: PathBuf,
    pub document_path: Option<PathBuf>,
    pub preview_path: Option<PathBuf>,
    pub summary: JSValue,
}

/// Reads the response table from the configured source.
pub fn load_dataset(source: &DataSource) -> ReportResult<Dataset> {
    match source {
        DataSource::Csv { path } => {
            info!("Attempting to read response file {:?}", path);
            io_csv::read_csv_dataset(path)
        }
        DataSource::Excel { path, worksheet } => {
            info!("Attempting to read response workbook {:?}", path);
            io_excel::read_excel_dataset(path, worksheet.as_deref())
        }
        DataSource::SharedSheet { url } => {
            info!("Attempting to fetch shared sheet {:?}", url);
            io_gsheet::fetch_sheet(url, Duration::from_secs(io_gsheet::FETCH_TIMEOUT_SECS))
        }
    }
}

fn distribution_to_json(dist: &RatingDistribution) -> JSValue {
    let mut counts: JSMap<String, JSValue> = JSMap::new();
    for (category, count) in dist.counts.iter() {
        counts.insert(category.clone(), json!(count.to_string()));
    }
    if dist.excluded > 0 {
        counts.insert("excluded".to_string(), json!(dist.excluded.to_string()));
    }
    JSValue::Object(counts)
}

fn optional_score(x: Option<f64>) -> JSValue {
    match x {
        Some(v) => json!(fmt_score(v)),
        None => json!("N/A"),
    }
}

/// The score summary of a report, as JSON. Numbers are rendered as text with
/// two decimals so that summaries can be compared verbatim.
pub fn build_summary_js(report: &Report) -> JSValue {
    let mut config: JSMap<String, JSValue> = JSMap::new();
    config.insert("report".to_string(), json!(report.title));
    for (label, value) in report.metadata.entries() {
        config.insert(label.clone(), json!(value));
    }
    config.insert(
        "responses".to_string(),
        json!(report.total_responses.to_string()),
    );

    let scores = &report.scores;
    let questions: Vec<JSValue> = scores
        .questions
        .iter()
        .zip(report.questions.iter())
        .map(|(qs, block)| {
            json!({
                "question": qs.question,
                "averageScore": optional_score(qs.average),
                "ratings": distribution_to_json(&block.distribution),
            })
        })
        .collect();

    let comments = match &report.comments {
        CommentSection::Comments(l) => l.len().to_string(),
        CommentSection::NoComments => "0".to_string(),
        CommentSection::MissingColumn { .. } => "N/A".to_string(),
    };

    let warnings: Vec<JSValue> = report
        .warnings
        .iter()
        .map(|w| json!(w.to_string()))
        .collect();

    json!({
        "config": config,
        "results": {
            "questions": questions,
            "total": fmt_score(scores.total),
            "maxPossibleTotal": fmt_bound(scores.max_possible_total),
            "convertedTotal": fmt_score(scores.converted_total),
            "conversionMax": fmt_bound(scores.conversion_max),
            "overallAverage": optional_score(scores.overall_average),
            "maxWeight": scores.max_weight.to_string(),
            "comments": comments,
        },
        "warnings": warnings,
    })
}

fn write_output(path: &Path, contents: &[u8]) -> ReportResult<()> {
    fs::write(path, contents).context(WritingOutputSnafu {
        path: path.display().to_string(),
    })
}

/// Runs one generate → export cycle for the session's user.
///
/// The dataset is loaded, held in the session while the outputs are built, and
/// the session is cleared at the end. Only a failed document rendering stops the
/// run once the dataset is loaded; shape problems are reported as warnings.
pub fn run_job(
    job: &ReportJob,
    session: &mut Session,
    renderer: Option<&dyn DocumentRenderer>,
    check_summary_path: Option<&Path>,
) -> ReportResult<GeneratedReport> {
    let dataset = load_dataset(&job.source)?;
    info!(
        "Loaded {} responses with columns {:?}",
        dataset.num_rows(),
        dataset.column_names()
    );
    info!(
        "{}: {} report requested by {}",
        job.metadata.file_stem(job.profile().title),
        job.report_type.name(),
        session.username()
    );
    session.begin_report(PendingReport {
        report_type: job.report_type,
        metadata: job.metadata.clone(),
        dataset,
    });
    let res = export_pending(job, session, renderer, check_summary_path);
    session.clear_report();
    res
}

fn export_pending(
    job: &ReportJob,
    session: &Session,
    renderer: Option<&dyn DocumentRenderer>,
    check_summary_path: Option<&Path>,
) -> ReportResult<GeneratedReport> {
    let pending = session.pending_report().context(NoPendingReportSnafu {})?;
    let profile = job.profile();
    let report = assembler::assemble(&pending.dataset, profile.title, &pending.metadata, &profile)?;
    for w in report.warnings.iter() {
        warn!("{}", w);
    }

    fs::create_dir_all(&job.output.directory).context(WritingOutputSnafu {
        path: job.output.directory.display().to_string(),
    })?;
    let stem = pending.metadata.file_stem(profile.title);

    let markup = html::report_markup(&report);
    let markup_path = job.output.directory.join(format!("{}.html", stem));
    write_output(&markup_path, markup.as_bytes())?;
    info!("Report markup written to {}", markup_path.display());

    let preview_path = if job.output.preview {
        let preview_report = assembler::assemble_with(
            &pending.dataset,
            profile.title,
            &pending.metadata,
            &profile,
            ChartTarget::Interactive,
        )?;
        let preview = html::preview_markup(&preview_report, &pending.dataset);
        let p = job.output.directory.join(format!("{}_preview.html", stem));
        write_output(&p, preview.as_bytes())?;
        info!("Preview written to {}", p.display());
        Some(p)
    } else {
        None
    };

    let document_path = match (job.output.pdf, renderer) {
        (true, Some(r)) => {
            info!("Rendering the PDF document");
            let bytes = r.render(&markup).context(RenderSnafu {})?;
            let p = job.output.directory.join(format!("{}.pdf", stem));
            write_output(&p, &bytes)?;
            info!("Document written to {}", p.display());
            Some(p)
        }
        (true, None) => {
            whatever!("A PDF was requested but no renderer is available")
        }
        (false, _) => None,
    };

    let summary = build_summary_js(&report);
    if let Some(summary_p) = check_summary_path {
        check_summary(&summary, summary_p)?;
    }

    Ok(GeneratedReport {
        markup_path,
        document_path,
        preview_path,
        summary,
    })
}

/// Compares a summary with a reference file, printing the differences.
pub fn check_summary(summary: &JSValue, reference_path: &Path) -> ReportResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference summary: {:?}", summary_ref);
    if summary_ref != *summary {
        let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    Ok(())
}

/// Prints an error with its chain of causes and backtrace, if any.
pub fn report_error(e: &ReportError) {
    eprintln!("Error: {}", e);
    let mut cause = std::error::Error::source(e);
    while let Some(c) = cause {
        eprintln!("  caused by: {}", c);
        cause = c.source();
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}

#[cfg(test)]
fn run_report_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> ReportResult<()> {
    use crate::report::credentials::StaticAuthenticator;

    let test_dir = format!("{}/tests/data", env!("CARGO_MANIFEST_DIR"));
    info!("Running test {}", test_name);
    let mut job = read_job(&format!("{}/{}/{}", test_dir, test_name, config_lpath))?;
    let out = tempfile::tempdir().context(WritingOutputSnafu { path: "tempdir" })?;
    job.output.directory = out.path().to_path_buf();
    job.output.pdf = false;

    let auth = StaticAuthenticator::single("tester", "secret", credentials::Role::User);
    let mut session = Session::login(&auth, "tester", "secret")?;
    let reference = PathBuf::from(format!("{}/{}/{}", test_dir, test_name, summary_lpath));
    let generated = run_job(&job, &mut session, None, Some(&reference))?;
    ensure_whatever!(
        generated.markup_path.exists(),
        "missing markup {}",
        generated.markup_path.display()
    );
    ensure_whatever!(
        session.pending_report().is_none(),
        "the session still holds a report"
    );
    Ok(())
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let res = run_report_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = res {
        report_error(&e);
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
mod tests {

    use super::test_wrapper;

    #[test]
    fn faculty_basic() {
        test_wrapper("faculty_basic");
    }

    #[test]
    fn faculty_compound_ratings() {
        test_wrapper("faculty_compound_ratings");
    }

    #[test]
    fn course_missing_comment_column() {
        test_wrapper("course_missing_comment_column");
    }

    #[test]
    fn course_unmapped_ratings() {
        test_wrapper("course_unmapped_ratings");
    }

    #[test]
    fn pdf_and_preview_are_written() {
        use super::*;
        use crate::report::credentials::{Role, StaticAuthenticator};
        use crate::report::metadata::ReportMetadata;
        use crate::report::render::tests::FakeRenderer;
        use crate::report::report_types::ReportType;
        use std::cell::RefCell;

        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("responses.csv");
        fs::write(
            &csv,
            "Timestamp,Objectives,Workload,Materials,Pace,General comment \n\
             t1,Agree,Neutral,Agree,Agree,Useful\n\
             t2,Strongly Agree,Agree,Disagree,Agree,n/a\n",
        )
        .unwrap();
        let job = ReportJob {
            report_type: ReportType::Course,
            metadata: ReportMetadata::from_entries(vec![
                ("Course Code".to_string(), "ECD 210".to_string()),
                ("Batch".to_string(), "4".to_string()),
            ]),
            source: DataSource::Csv {
                path: csv.display().to_string(),
            },
            output: OutputSettings {
                directory: dir.path().join("out"),
                pdf: true,
                preview: true,
            },
            match_policy: MatchPolicy::Exact,
        };
        let renderer = FakeRenderer {
            seen: RefCell::new(vec![]),
        };
        let auth = StaticAuthenticator::single("u", "p", Role::User);
        let mut session = Session::login(&auth, "u", "p").unwrap();
        let generated = run_job(&job, &mut session, Some(&renderer), None).unwrap();

        let pdf = generated.document_path.unwrap();
        assert_eq!(
            pdf.file_name().unwrap().to_str().unwrap(),
            "ECD_210_4_Course_Evaluation_Report.pdf"
        );
        assert_eq!(fs::read(&pdf).unwrap(), b"%PDF-1.4 fake".to_vec());
        assert!(generated.preview_path.unwrap().exists());
        let seen = renderer.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("data:image/png;base64,"));
        assert!(seen[0].contains("Useful"));
        assert_eq!(generated.summary["results"]["convertedTotal"], "11.25");
        assert!(session.pending_report().is_none());
    }
}
