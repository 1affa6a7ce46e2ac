// Gathers everything a report shows, ready to be turned into markup.

use std::fmt::Display;

use crate::report::chart::{ChartArtifact, ChartTarget};
use crate::report::metadata::ReportMetadata;
use crate::report::report_types::{ReportProfile, ReportType};
use crate::report::*;

/// Comment values that only say there is no comment.
pub const PLACEHOLDER_COMMENTS: [&str; 4] = ["n/a", "na", "no", ""];

#[derive(PartialEq, Debug, Clone)]
pub struct RatingRow {
    pub category: String,
    pub count: u64,
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct QuestionBlock {
    pub question: String,
    pub distribution: RatingDistribution,
    pub rows: Vec<RatingRow>,
    pub chart: ChartArtifact,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CommentSection {
    Comments(Vec<String>),
    NoComments,
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Problems that do not prevent a report, shown to the user next to it.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ReportWarning {
    Score(ScoreWarning),
    MissingCommentColumn {
        column: String,
        available: Vec<String>,
    },
    StrayScoreKeys { keys: Vec<String> },
    NoQuestionColumns,
}

impl Display for ReportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportWarning::Score(w) => write!(f, "{}", w),
            ReportWarning::MissingCommentColumn { column, available } => write!(
                f,
                "comment column {:?} not found in the data; available columns: {:?}",
                column, available
            ),
            ReportWarning::StrayScoreKeys { keys } => {
                write!(f, "score weights without a category: {}", keys.join(", "))
            }
            ReportWarning::NoQuestionColumns => {
                write!(f, "no question column found at the expected positions")
            }
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Report {
    pub title: String,
    pub report_type: ReportType,
    pub metadata: ReportMetadata,
    pub total_responses: usize,
    pub questions: Vec<QuestionBlock>,
    pub comments: CommentSection,
    pub scores: ScoreSummary,
    pub warnings: Vec<ReportWarning>,
}

/// Keeps the comments that say something, in their original order and
/// spelling. Filtering twice gives the same result.
pub fn filter_comments<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter(|v| !PLACEHOLDER_COMMENTS.contains(&v.trim().to_lowercase().as_str()))
        .map(|v| v.to_string())
        .collect()
}

pub fn comment_section(dataset: &Dataset, column: &str) -> CommentSection {
    match dataset.column(column) {
        None => CommentSection::MissingColumn {
            column: column.to_string(),
            available: dataset.column_names(),
        },
        Some(col) => {
            let comments = filter_comments(col.cells.iter().flatten().map(String::as_str));
            if comments.is_empty() {
                CommentSection::NoComments
            } else {
                CommentSection::Comments(comments)
            }
        }
    }
}

/// Builds a report with charts for printing.
pub fn assemble(
    dataset: &Dataset,
    title: &str,
    metadata: &ReportMetadata,
    profile: &ReportProfile,
) -> ReportResult<Report> {
    assemble_with(dataset, title, metadata, profile, ChartTarget::Raster)
}

pub fn assemble_with(
    dataset: &Dataset,
    title: &str,
    metadata: &ReportMetadata,
    profile: &ReportProfile,
    target: ChartTarget,
) -> ReportResult<Report> {
    let config = &profile.config;
    let mut warnings: Vec<ReportWarning> = Vec::new();

    let stray: Vec<String> = config.check().iter().map(|s| s.to_string()).collect();
    if !stray.is_empty() {
        warnings.push(ReportWarning::StrayScoreKeys { keys: stray });
    }

    let dists = distributions(dataset, config);
    if dists.is_empty() {
        warnings.push(ReportWarning::NoQuestionColumns);
    }
    let dist_refs: Vec<&RatingDistribution> = dists.iter().map(|(_, d)| d).collect();
    let charts = chart::render_charts(&dist_refs, profile, target)?;
    let questions: Vec<QuestionBlock> = dists
        .into_iter()
        .zip(charts)
        .map(|((question, distribution), chart)| {
            let rows = distribution
                .counts
                .iter()
                .zip(distribution.percentages())
                .map(|((category, count), (_, percent))| RatingRow {
                    category: category.clone(),
                    count: *count,
                    percent,
                })
                .collect();
            QuestionBlock {
                question,
                distribution,
                rows,
                chart,
            }
        })
        .collect();

    let comments = comment_section(dataset, &config.comment_column_name);
    if let CommentSection::MissingColumn { column, available } = &comments {
        warnings.push(ReportWarning::MissingCommentColumn {
            column: column.clone(),
            available: available.clone(),
        });
    }

    let scores = score_with_config(dataset, config);
    warnings.extend(scores.warnings.iter().cloned().map(ReportWarning::Score));

    Ok(Report {
        title: title.to_string(),
        report_type: profile.report_type,
        metadata: metadata.clone(),
        total_responses: dataset.num_rows(),
        questions,
        comments,
        scores,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::metadata::{MetadataForm, COURSE_CODE};

    fn metadata() -> ReportMetadata {
        ReportMetadata::from_form(
            &MetadataForm {
                faculty_name: None,
                program: "ECD".to_string(),
                course_code: "ECD 210".to_string(),
                batch: "4".to_string(),
                semester: "SPRING".to_string(),
                year: 2026,
            },
            false,
        )
        .unwrap()
    }

    #[test]
    fn placeholder_comments_are_dropped() {
        let kept = filter_comments(vec!["Great", " N/A ", "no", "", "NA", "Nope"]);
        assert_eq!(kept, vec!["Great", "Nope"]);
        let again = filter_comments(kept.iter().map(String::as_str));
        assert_eq!(again, kept);
    }

    #[test]
    fn comment_sections() {
        let ds = dataset_from_columns(&[
            ("Timestamp", vec!["t1", "t2"]),
            ("General comment ", vec!["n/a", ""]),
        ])
        .unwrap();
        assert_eq!(comment_section(&ds, "General comment "), CommentSection::NoComments);
        assert_eq!(
            comment_section(&ds, "General comment"),
            CommentSection::MissingColumn {
                column: "General comment".to_string(),
                available: vec!["Timestamp".to_string(), "General comment ".to_string()],
            }
        );
    }

    #[test]
    fn course_report_contents() {
        let ds = dataset_from_columns(&[
            ("Timestamp", vec!["t1", "t2", "t3"]),
            ("Objectives were clear", vec!["Agree", "Strongly Agree", "Agree"]),
            ("Workload", vec!["Neutral", "", "Disagree"]),
            ("Materials", vec!["Agree", "Agree", "Agree"]),
            ("Pace", vec!["Strongly Disagree", "Neutral", "Agree"]),
            ("Comments", vec!["Good", "", ""]),
        ])
        .unwrap();
        let profile = ReportType::Course.profile();
        let report = assemble_with(
            &ds,
            profile.title,
            &metadata(),
            &profile,
            ChartTarget::Interactive,
        )
        .unwrap();
        assert_eq!(report.total_responses, 3);
        assert_eq!(report.questions.len(), 4);
        assert_eq!(report.questions[1].question, "Workload");
        assert_eq!(report.questions[1].distribution.total(), 2);
        assert_eq!(report.questions[0].rows.len(), 5);
        assert!(report.questions[0].chart.as_svg().is_some());
        assert_eq!(report.metadata.get(COURSE_CODE), Some("ECD 210"));
        // The course comment header has a trailing space.
        assert_eq!(
            report.warnings,
            vec![ReportWarning::MissingCommentColumn {
                column: "General comment ".to_string(),
                available: ds.column_names(),
            }]
        );
        assert!(report.warnings[0]
            .to_string()
            .ends_with(r#"available columns: ["Timestamp", "Objectives were clear", "Workload", "Materials", "Pace", "Comments"]"#));
        assert_eq!(
            io_common::fmt_score(report.scores.questions[0].average.unwrap()),
            "4.33"
        );
    }

    #[test]
    fn dataset_without_questions() {
        let ds = dataset_from_columns(&[("Timestamp", vec!["t1"])]).unwrap();
        let profile = ReportType::Faculty.profile();
        let report = assemble_with(&ds, "F", &metadata(), &profile, ChartTarget::Interactive).unwrap();
        assert!(report.questions.is_empty());
        assert!(report.warnings.contains(&ReportWarning::NoQuestionColumns));
        assert_eq!(report.scores.converted_total, 0.0);
    }
}
