// Markup of the printable report and of the on-screen preview.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::report::assembler::{CommentSection, Report};
use crate::report::io_common::{fmt_bound, fmt_score};
use crate::report::*;

const REPORT_CSS: &str = r#"
@page { size: A4; margin: 50px 0; }
body { font-family: Arial, Helvetica, sans-serif; color: #222222; margin: 0 40px; }
.header { text-align: center; border-bottom: 2px solid #1f77b4; padding-bottom: 12px; margin-bottom: 24px; }
.header h1 { margin: 0 0 12px 0; }
.header p { margin: 4px 0; }
.chart-item { page-break-inside: avoid; break-inside: avoid; margin-bottom: 28px; }
.chart-item img { width: 100%; max-width: 700px; display: block; margin: 0 auto; }
table { border-collapse: collapse; margin: 8px auto; }
th, td { border: 1px solid #cccccc; padding: 4px 10px; text-align: left; }
th { background: #f2f2f2; }
.comment { background: #f9f9f9; border-left: 4px solid #1f77b4; padding: 8px 12px; margin: 8px 0; page-break-inside: avoid; }
.score-section { page-break-before: always; }
.metrics-container { display: flex; justify-content: space-between; gap: 16px; margin: 16px 0; }
.metric-card { flex: 1; border: 1px solid #dddddd; border-radius: 8px; padding: 12px; text-align: center; }
.metric-card .label { font-size: 13px; color: #555555; }
.metric-card .value { font-size: 26px; font-weight: bold; margin-top: 6px; }
.notice { color: #a94442; }
.warnings { color: #8a6d3b; font-size: 12px; }
"#;

const PREVIEW_CSS: &str = r#"
.chart-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
.chart-grid svg { width: 100%; height: auto; }
.raw-data { overflow-x: auto; font-size: 12px; }
"#;

fn text(s: &str) -> String {
    encode_text(s).to_string()
}

fn optional_score(x: Option<f64>) -> String {
    x.map(fmt_score).unwrap_or_else(|| "N/A".to_string())
}

fn write_head(out: &mut String, report: &Report, extra_css: &str) {
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html>");
    let _ = writeln!(out, "<head>");
    let _ = writeln!(out, "<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{} Report</title>", text(&report.title));
    let _ = writeln!(out, "<style>{}{}</style>", REPORT_CSS, extra_css);
    let _ = writeln!(out, "</head>");
    let _ = writeln!(out, "<body>");
}

fn write_header(out: &mut String, report: &Report) {
    let _ = writeln!(out, "<div class=\"header\">");
    let _ = writeln!(out, "<h1>{} Report</h1>", text(&report.title));
    for (label, value) in report.metadata.entries() {
        let _ = writeln!(
            out,
            "<p><strong>{}:</strong> {}</p>",
            text(label),
            text(value)
        );
    }
    let _ = writeln!(
        out,
        "<p><strong>Total Responses:</strong> {}</p>",
        report.total_responses
    );
    let _ = writeln!(out, "</div>");
}

fn write_rating_table(out: &mut String, block: &assembler::QuestionBlock) {
    let _ = writeln!(out, "<table class=\"rating-table\">");
    let _ = writeln!(out, "<tr><th>Rating</th><th>Responses</th><th>Percent</th></tr>");
    for row in block.rows.iter() {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>",
            text(&row.category),
            row.count,
            row.percent
        );
    }
    let _ = writeln!(out, "</table>");
}

fn write_comments(out: &mut String, comments: &CommentSection, numbered: bool) {
    let _ = writeln!(out, "<h2>General Comments</h2>");
    match comments {
        CommentSection::Comments(l) => {
            for (idx, c) in l.iter().enumerate() {
                if numbered {
                    let _ = writeln!(
                        out,
                        "<div class=\"comment\"><strong>{}.</strong> {}</div>",
                        idx + 1,
                        text(c)
                    );
                } else {
                    let _ = writeln!(out, "<div class=\"comment\">{}</div>", text(c));
                }
            }
        }
        CommentSection::NoComments => {
            let _ = writeln!(out, "<p>No comments available.</p>");
        }
        CommentSection::MissingColumn { column, available } => {
            let _ = writeln!(
                out,
                "<p class=\"notice\">Comment column \"{}\" was not found in the data. Available columns are: {}.</p>",
                text(column),
                text(&available.join(", "))
            );
        }
    }
}

fn metric_card(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        out,
        "<div class=\"metric-card\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
        text(label),
        text(value)
    );
}

fn write_scores(out: &mut String, report: &Report) {
    let s = &report.scores;
    let _ = writeln!(out, "<div class=\"score-section\">");
    let _ = writeln!(out, "<h2>Evaluation Scores</h2>");
    let _ = writeln!(out, "<div class=\"metrics-container\">");
    metric_card(
        out,
        &format!("Total Score (out of {})", fmt_bound(s.max_possible_total)),
        &fmt_score(s.total),
    );
    metric_card(
        out,
        &format!("Converted Score (out of {})", fmt_bound(s.conversion_max)),
        &fmt_score(s.converted_total),
    );
    metric_card(
        out,
        &format!("Overall Average Rating (out of {})", s.max_weight),
        &optional_score(s.overall_average),
    );
    let _ = writeln!(out, "</div>");
    let _ = writeln!(out, "<table class=\"score-table\">");
    let _ = writeln!(out, "<tr><th>Question</th><th>Average Score</th></tr>");
    for q in s.questions.iter() {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td></tr>",
            text(&q.question),
            optional_score(q.average)
        );
    }
    let _ = writeln!(out, "</table>");
    let _ = writeln!(out, "</div>");
}

fn write_warnings(out: &mut String, report: &Report) {
    if report.warnings.is_empty() {
        return;
    }
    let _ = writeln!(out, "<div class=\"warnings\"><ul>");
    for w in report.warnings.iter() {
        let _ = writeln!(out, "<li>{}</li>", text(&w.to_string()));
    }
    let _ = writeln!(out, "</ul></div>");
}

/// The self-contained document that gets printed. Charts are embedded as
/// data URIs.
pub fn report_markup(report: &Report) -> String {
    let mut out = String::new();
    write_head(&mut out, report, "");
    write_header(&mut out, report);
    for (idx, block) in report.questions.iter().enumerate() {
        let _ = writeln!(out, "<div class=\"chart-item\">");
        let _ = writeln!(out, "<h3>{}. {}</h3>", idx + 1, text(&block.question));
        let _ = writeln!(
            out,
            "<img src=\"{}\" alt=\"{}\">",
            block.chart.data_uri(),
            encode_double_quoted_attribute(&block.question)
        );
        write_rating_table(&mut out, block);
        let _ = writeln!(out, "</div>");
    }
    write_comments(&mut out, &report.comments, false);
    write_scores(&mut out, report);
    write_warnings(&mut out, report);
    let _ = writeln!(out, "</body>");
    let _ = writeln!(out, "</html>");
    out
}

/// The on-screen view: charts side by side, numbered comments and the raw
/// responses.
pub fn preview_markup(report: &Report, dataset: &Dataset) -> String {
    let mut out = String::new();
    write_head(&mut out, report, PREVIEW_CSS);
    write_header(&mut out, report);
    write_warnings(&mut out, report);
    let _ = writeln!(out, "<div class=\"chart-grid\">");
    for block in report.questions.iter() {
        let _ = writeln!(out, "<div class=\"chart-item\">");
        let _ = writeln!(out, "<h3>{}</h3>", text(&block.question));
        match block.chart.as_svg() {
            Some(svg) => out.push_str(svg),
            None => {
                let _ = writeln!(out, "<img src=\"{}\">", block.chart.data_uri());
            }
        }
        let _ = writeln!(out, "</div>");
    }
    let _ = writeln!(out, "</div>");
    write_comments(&mut out, &report.comments, true);
    write_scores(&mut out, report);
    write_raw_data(&mut out, dataset);
    let _ = writeln!(out, "</body>");
    let _ = writeln!(out, "</html>");
    out
}

fn write_raw_data(out: &mut String, dataset: &Dataset) {
    let _ = writeln!(out, "<details class=\"raw-data\">");
    let _ = writeln!(
        out,
        "<summary>Raw data ({} responses)</summary>",
        dataset.num_rows()
    );
    let _ = writeln!(out, "<table>");
    let _ = write!(out, "<tr>");
    for name in dataset.column_names() {
        let _ = write!(out, "<th>{}</th>", text(&name));
    }
    let _ = writeln!(out, "</tr>");
    for idx in 0..dataset.num_rows() {
        let _ = write!(out, "<tr>");
        for cell in dataset.row(idx).unwrap_or_default() {
            let _ = write!(out, "<td>{}</td>", text(cell.as_deref().unwrap_or("")));
        }
        let _ = writeln!(out, "</tr>");
    }
    let _ = writeln!(out, "</table>");
    let _ = writeln!(out, "</details>");
}
