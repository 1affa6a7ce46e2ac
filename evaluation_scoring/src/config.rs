// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::ops::Range;

/// One cell of a response table. `None` is a missing answer.
pub type Cell = Option<String>;

/// The separator between the question echo and the rating in compound cells,
/// as in `"Q1: Excellent"`.
pub const COMPOUND_SEPARATOR: &str = ": ";

/// Used as the maximum weight when a score mapping is empty.
pub const DEFAULT_MAX_WEIGHT: u32 = 5;

/// How a rating read from a cell is compared against the known categories.
///
/// The default is an exact byte-for-byte comparison. A trailing space or a
/// different capitalization then makes the rating unmapped. The lenient
/// policy trims and ignores the case of both sides.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum MatchPolicy {
    #[default]
    Exact,
    TrimCaseInsensitive,
}

impl MatchPolicy {
    pub fn matches(&self, label: &str, candidate: &str) -> bool {
        match self {
            MatchPolicy::Exact => label == candidate,
            MatchPolicy::TrimCaseInsensitive => {
                label.trim().to_lowercase() == candidate.trim().to_lowercase()
            }
        }
    }

    /// Finds the candidate that `label` stands for, returning the candidate's own
    /// spelling. The first matching candidate wins.
    pub fn resolve<'a, I>(&self, label: &str, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().find(|c| self.matches(label, c))
    }
}

/// The shape of the values of a question column.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ColumnFormat {
    /// Values look like `"<question>: <rating>"`.
    Compound,
    /// Values are the rating itself.
    Plain,
}

// ********* Configuration **********

/// Everything that differs between two kinds of evaluation report.
///
/// Invariant (checked by `check`, not by construction): every key of
/// `score_mapping` is one of the categories of `category_order`.
#[derive(PartialEq, Debug, Clone)]
pub struct ReportConfig {
    pub category_order: Vec<String>,
    pub score_mapping: Vec<(String, u32)>,
    pub conversion_max: f64,
    pub comment_column_name: String,
    /// Positional range of the question columns (0-based, end excluded).
    pub question_column_range: Range<usize>,
    pub requires_subject_name: bool,
    pub match_policy: MatchPolicy,
}

impl ReportConfig {
    /// The largest weight of the score mapping.
    pub fn max_weight(&self) -> u32 {
        max_weight(&self.score_mapping)
    }

    /// The keys of the score mapping that are not categories.
    pub fn check(&self) -> Vec<&str> {
        self.score_mapping
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !self.category_order.iter().any(|c| c == k))
            .collect()
    }
}

pub(crate) fn max_weight(score_mapping: &[(String, u32)]) -> u32 {
    score_mapping
        .iter()
        .map(|(_, w)| *w)
        .max()
        .unwrap_or(DEFAULT_MAX_WEIGHT)
}

// ******** Output data structures *********

/// Zero-filled counts of the ratings of one question, in category order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RatingDistribution {
    pub counts: Vec<(String, u64)>,
    /// Non-empty ratings that did not match any category.
    pub excluded: u64,
}

impl RatingDistribution {
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| *c).sum()
    }

    pub fn count_of(&self, category: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, n)| *n)
    }

    /// Share of each category in percent. All zeros for an empty distribution.
    pub fn percentages(&self) -> Vec<(String, f64)> {
        let total = self.total();
        self.counts
            .iter()
            .map(|(c, n)| {
                let pct = if total == 0 {
                    0.0
                } else {
                    *n as f64 * 100.0 / total as f64
                };
                (c.clone(), pct)
            })
            .collect()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct QuestionScore {
    pub question: String,
    /// `None` when the question has no mapped rating.
    pub average: Option<f64>,
    /// Number of ratings that went into the average.
    pub rated: u64,
}

/// Problems found while scoring that do not stop the computation.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ScoreWarning {
    UnmappedRating {
        question: String,
        value: String,
        occurrences: u64,
    },
    QuestionRangeTruncated {
        requested: Range<usize>,
        available: usize,
    },
}

impl Display for ScoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreWarning::UnmappedRating {
                question,
                value,
                occurrences,
            } => write!(
                f,
                "rating {:?} in question {:?} has no score ({} occurrence(s) ignored)",
                value, question, occurrences
            ),
            ScoreWarning::QuestionRangeTruncated {
                requested,
                available,
            } => write!(
                f,
                "question columns {}..{} requested but the dataset only has {} columns",
                requested.start, requested.end, available
            ),
        }
    }
}

/// Scores of a full report.
///
/// `total` counts questions without any mapped rating as 0.
/// `overall_average` skips them, and is `None` if no question has a rating.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoreSummary {
    pub questions: Vec<QuestionScore>,
    pub total: f64,
    pub converted_total: f64,
    pub overall_average: Option<f64>,
    pub max_possible_total: f64,
    pub max_weight: u32,
    pub conversion_max: f64,
    pub warnings: Vec<ScoreWarning>,
}

/// Errors when building a dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DatasetError {
    EmptyHeader,
    DuplicateColumn(String),
    RowTooLong {
        row: usize,
        len: usize,
        expected: usize,
    },
}

impl Error for DatasetError {}

impl Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::EmptyHeader => write!(f, "the dataset has no columns"),
            DatasetError::DuplicateColumn(name) => {
                write!(f, "column {:?} appears more than once", name)
            }
            DatasetError::RowTooLong { row, len, expected } => write!(
                f,
                "row {} has {} cells but the header only has {} columns",
                row, len, expected
            ),
        }
    }
}
