mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::ops::Range;

pub use crate::builder::*;
pub use crate::config::*;

/// Decides if a column holds compound `"<question>: <rating>"` values by looking
/// at its first non-missing cell.
pub fn detect_column_format(cells: &[Cell]) -> ColumnFormat {
    match cells.iter().flatten().find(|s| !s.is_empty()) {
        Some(s) if s.contains(COMPOUND_SEPARATOR) => ColumnFormat::Compound,
        _ => ColumnFormat::Plain,
    }
}

/// Extracts the rating label of a single cell.
///
/// Compound values keep what follows the first separator; a compound column
/// value without any separator has no rating. Missing and empty cells have
/// no rating. No trimming or case folding happens here: that is the job of
/// the `MatchPolicy`.
///
/// ```
/// use evaluation_scoring::{normalize, ColumnFormat};
///
/// assert_eq!(normalize(Some("Q1: Excellent"), ColumnFormat::Compound), Some("Excellent".to_string()));
/// assert_eq!(normalize(Some("Excellent"), ColumnFormat::Plain), Some("Excellent".to_string()));
/// assert_eq!(normalize(None, ColumnFormat::Plain), None);
/// ```
pub fn normalize(raw: Option<&str>, format: ColumnFormat) -> Option<String> {
    let value = raw.filter(|s| !s.is_empty())?;
    match format {
        ColumnFormat::Compound => value
            .split_once(COMPOUND_SEPARATOR)
            .map(|(_, rating)| rating.to_string())
            .filter(|rating| !rating.is_empty()),
        ColumnFormat::Plain => Some(value.to_string()),
    }
}

/// All the ratings of a column, missing cells dropped.
pub fn normalize_column(cells: &[Cell]) -> Vec<String> {
    let format = detect_column_format(cells);
    cells
        .iter()
        .filter_map(|c| normalize(c.as_deref(), format))
        .collect()
}

/// Counts the ratings of one question.
///
/// The result has exactly one entry per category, in the given order, with
/// explicit zeros. Ratings that do not resolve to a category are only counted
/// in `excluded`.
pub fn aggregate(
    cells: &[Cell],
    category_order: &[String],
    policy: MatchPolicy,
) -> RatingDistribution {
    let mut counts: Vec<(String, u64)> = category_order.iter().map(|c| (c.clone(), 0)).collect();
    let mut excluded: u64 = 0;
    for rating in normalize_column(cells) {
        match policy.resolve(&rating, category_order.iter().map(String::as_str)) {
            Some(cat) => {
                if let Some(entry) = counts.iter_mut().find(|(c, _)| c == cat) {
                    entry.1 += 1;
                }
            }
            None => {
                debug!("aggregate: rating {:?} is not a category", rating);
                excluded += 1;
            }
        }
    }
    RatingDistribution { counts, excluded }
}

/// The distribution of every question column of a report.
pub fn distributions(dataset: &Dataset, config: &ReportConfig) -> Vec<(String, RatingDistribution)> {
    dataset
        .columns_in(&config.question_column_range)
        .iter()
        .map(|col| {
            (
                col.name.clone(),
                aggregate(&col.cells, &config.category_order, config.match_policy),
            )
        })
        .collect()
}

/// Computes the scores of the question columns found at `question_range`.
///
/// Arguments:
/// * `dataset` the responses
/// * `question_range` the positions of the question columns. Positions past the
/// last column are dropped with a warning.
/// * `score_mapping` the weight of each category. Ratings without a weight do not
/// count in the averages and are reported as warnings.
/// * `conversion_max` the maximum of the converted total.
/// * `policy` how ratings are compared to the keys of `score_mapping`.
pub fn score(
    dataset: &Dataset,
    question_range: &Range<usize>,
    score_mapping: &[(String, u32)],
    conversion_max: f64,
    policy: MatchPolicy,
) -> ScoreSummary {
    info!(
        "Scoring {:?} responses, question columns {:?}",
        dataset.num_rows(),
        question_range
    );
    let mut warnings: Vec<ScoreWarning> = Vec::new();
    if question_range.end > dataset.num_columns() {
        warnings.push(ScoreWarning::QuestionRangeTruncated {
            requested: question_range.clone(),
            available: dataset.num_columns(),
        });
    }

    let mut questions: Vec<QuestionScore> = Vec::new();
    for col in dataset.columns_in(question_range) {
        let (qs, mut unmapped) = score_question(col, score_mapping, policy);
        debug!("score: {:?}", qs);
        questions.push(qs);
        warnings.append(&mut unmapped);
    }
    summarize(questions, score_mapping, conversion_max, warnings)
}

pub fn score_with_config(dataset: &Dataset, config: &ReportConfig) -> ScoreSummary {
    score(
        dataset,
        &config.question_column_range,
        &config.score_mapping,
        config.conversion_max,
        config.match_policy,
    )
}

fn score_question(
    column: &Column,
    score_mapping: &[(String, u32)],
    policy: MatchPolicy,
) -> (QuestionScore, Vec<ScoreWarning>) {
    let mut sum: u64 = 0;
    let mut rated: u64 = 0;
    // Distinct unmapped values, in the order they were first seen.
    let mut unmapped: Vec<(String, u64)> = Vec::new();

    for rating in normalize_column(&column.cells) {
        let weight = score_mapping
            .iter()
            .find(|(k, _)| policy.matches(&rating, k))
            .map(|(_, w)| *w);
        match weight {
            Some(w) => {
                sum += w as u64;
                rated += 1;
            }
            None => match unmapped.iter_mut().find(|(v, _)| *v == rating) {
                Some(entry) => entry.1 += 1,
                None => unmapped.push((rating, 1)),
            },
        }
    }

    let average = if rated == 0 {
        None
    } else {
        Some(sum as f64 / rated as f64)
    };
    let warnings = unmapped
        .into_iter()
        .map(|(value, occurrences)| ScoreWarning::UnmappedRating {
            question: column.name.clone(),
            value,
            occurrences,
        })
        .collect();
    (
        QuestionScore {
            question: column.name.clone(),
            average,
            rated,
        },
        warnings,
    )
}

/// Derives the headline numbers from the per-question scores.
pub fn summarize(
    questions: Vec<QuestionScore>,
    score_mapping: &[(String, u32)],
    conversion_max: f64,
    warnings: Vec<ScoreWarning>,
) -> ScoreSummary {
    let total: f64 = questions.iter().map(|q| q.average.unwrap_or(0.0)).sum();
    let max_weight = config::max_weight(score_mapping);
    let max_possible_total = questions.len() as f64 * max_weight as f64;
    let converted_total = if max_possible_total > 0.0 {
        total / max_possible_total * conversion_max
    } else {
        0.0
    };
    let defined: Vec<f64> = questions.iter().filter_map(|q| q.average).collect();
    let overall_average = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    };
    ScoreSummary {
        questions,
        total,
        converted_total,
        overall_average,
        max_possible_total,
        max_weight,
        conversion_max,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn faculty_categories() -> Vec<String> {
        ["Excellent", "Very Good", "Good", "Satisfactory", "Poor"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn faculty_mapping() -> Vec<(String, u32)> {
        faculty_categories()
            .into_iter()
            .zip([5, 4, 3, 2, 1])
            .collect()
    }

    fn cells(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    #[test]
    fn normalize_compound_and_plain() {
        assert_eq!(
            normalize(Some("Q1: Excellent"), ColumnFormat::Compound),
            Some("Excellent".to_string())
        );
        assert_eq!(
            normalize(Some("Excellent"), ColumnFormat::Plain),
            Some("Excellent".to_string())
        );
        assert_eq!(normalize(Some("Excellent"), ColumnFormat::Compound), None);
        assert_eq!(normalize(Some(""), ColumnFormat::Plain), None);
        // Only the first separator splits.
        assert_eq!(
            normalize(Some("Q: a: b"), ColumnFormat::Compound),
            Some("a: b".to_string())
        );
    }

    #[test]
    fn column_format_uses_first_present_cell() {
        assert_eq!(
            detect_column_format(&cells(&["", "Pace: Good", "Poor"])),
            ColumnFormat::Compound
        );
        assert_eq!(
            detect_column_format(&cells(&["Good", "Pace: Good"])),
            ColumnFormat::Plain
        );
        assert_eq!(detect_column_format(&cells(&[])), ColumnFormat::Plain);
    }

    #[test]
    fn distribution_is_zero_filled_and_ordered() {
        let dist = aggregate(
            &cells(&["Excellent", "Poor", "Excellent"]),
            &faculty_categories(),
            MatchPolicy::Exact,
        );
        assert_eq!(
            dist.counts,
            vec![
                ("Excellent".to_string(), 2),
                ("Very Good".to_string(), 0),
                ("Good".to_string(), 0),
                ("Satisfactory".to_string(), 0),
                ("Poor".to_string(), 1),
            ]
        );
        assert_eq!(dist.total(), 3);
        assert_eq!(dist.excluded, 0);
    }

    #[test]
    fn distribution_excludes_unknown_and_missing() {
        let dist = aggregate(
            &cells(&["Excellent ", "", "Meh", "Good"]),
            &faculty_categories(),
            MatchPolicy::Exact,
        );
        assert_eq!(dist.counts.len(), 5);
        assert_eq!(dist.total(), 1);
        assert_eq!(dist.excluded, 2);
    }

    #[test]
    fn lenient_policy_recovers_spacing_and_case() {
        let dist = aggregate(
            &cells(&["Excellent ", "very good", "GOOD"]),
            &faculty_categories(),
            MatchPolicy::TrimCaseInsensitive,
        );
        assert_eq!(dist.count_of("Excellent"), Some(1));
        assert_eq!(dist.count_of("Very Good"), Some(1));
        assert_eq!(dist.count_of("Good"), Some(1));
        assert_eq!(dist.excluded, 0);
    }

    #[test]
    fn percentages_of_empty_distribution_are_zero() {
        let dist = aggregate(&cells(&["", ""]), &faculty_categories(), MatchPolicy::Exact);
        assert!(dist.percentages().iter().all(|(_, p)| *p == 0.0));
    }

    #[test]
    fn average_of_single_question() {
        let ds = dataset_from_columns(&[
            ("Timestamp", vec!["t1", "t2", "t3"]),
            ("Clarity", vec!["Excellent", "Poor", "Excellent"]),
        ])
        .unwrap();
        let summary = score(&ds, &(1..2), &faculty_mapping(), 60.0, MatchPolicy::Exact);
        let avg = summary.questions[0].average.unwrap();
        assert!((avg - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(format!("{:.2}", avg), "3.67");
        assert_eq!(summary.max_possible_total, 5.0);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn unmapped_ratings_are_warned_and_skipped() {
        init();
        let ds = dataset_from_columns(&[
            ("Timestamp", vec!["t1", "t2", "t3", "t4"]),
            ("Pace", vec!["Q: Good", "Q: Great", "Q: Great", "Q: Poor"]),
        ])
        .unwrap();
        let summary = score(&ds, &(1..2), &faculty_mapping(), 60.0, MatchPolicy::Exact);
        assert_eq!(summary.questions[0].average, Some(2.0));
        assert_eq!(summary.questions[0].rated, 2);
        assert_eq!(
            summary.warnings,
            vec![ScoreWarning::UnmappedRating {
                question: "Pace".to_string(),
                value: "Great".to_string(),
                occurrences: 2
            }]
        );
    }

    #[test]
    fn questions_without_ratings() {
        let ds = dataset_from_columns(&[
            ("Timestamp", vec!["t1", "t2"]),
            ("A", vec!["", ""]),
            ("B", vec!["", ""]),
        ])
        .unwrap();
        let summary = score(&ds, &(1..3), &faculty_mapping(), 60.0, MatchPolicy::Exact);
        assert_eq!(summary.overall_average, None);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.converted_total, 0.0);
        assert_eq!(summary.max_possible_total, 10.0);
    }

    #[test]
    fn undefined_averages_are_skipped_in_overall_average() {
        let ds = dataset_from_columns(&[
            ("Timestamp", vec!["t1", "t2"]),
            ("A", vec!["Good", "Excellent"]),
            ("B", vec!["", ""]),
        ])
        .unwrap();
        let summary = score(&ds, &(1..3), &faculty_mapping(), 60.0, MatchPolicy::Exact);
        assert_eq!(summary.overall_average, Some(4.0));
        assert_eq!(summary.total, 4.0);
        assert_eq!(summary.converted_total, 4.0 / 10.0 * 60.0);
    }

    #[test]
    fn empty_range_gives_zero_converted_total() {
        init();
        let ds = dataset_from_columns(&[("Timestamp", vec!["t1"])]).unwrap();
        let summary = score(&ds, &(1..9), &faculty_mapping(), 60.0, MatchPolicy::Exact);
        assert!(summary.questions.is_empty());
        assert_eq!(summary.max_possible_total, 0.0);
        assert_eq!(summary.converted_total, 0.0);
        assert_eq!(summary.overall_average, None);
        assert_eq!(
            summary.warnings,
            vec![ScoreWarning::QuestionRangeTruncated {
                requested: 1..9,
                available: 1
            }]
        );
    }

    #[test]
    fn conversion_of_eight_questions() {
        let questions: Vec<QuestionScore> = (0..8)
            .map(|i| QuestionScore {
                question: format!("Q{}", i),
                average: Some(3.75),
                rated: 4,
            })
            .collect();
        let summary = summarize(questions, &faculty_mapping(), 60.0, vec![]);
        assert_eq!(summary.max_possible_total, 40.0);
        assert_eq!(summary.total, 30.0);
        assert_eq!(summary.converted_total, 45.0);
        assert_eq!(summary.overall_average, Some(3.75));
    }

    #[test]
    fn empty_mapping_falls_back_to_default_weight() {
        let summary = summarize(
            vec![QuestionScore {
                question: "Q".to_string(),
                average: None,
                rated: 0,
            }],
            &[],
            15.0,
            vec![],
        );
        assert_eq!(summary.max_weight, DEFAULT_MAX_WEIGHT);
        assert_eq!(summary.max_possible_total, 5.0);
    }

    #[test]
    fn config_check_reports_stray_weights() {
        let mut mapping = faculty_mapping();
        mapping.push(("Outstanding".to_string(), 6));
        let config = ReportConfig {
            category_order: faculty_categories(),
            score_mapping: mapping,
            conversion_max: 60.0,
            comment_column_name: "General comments".to_string(),
            question_column_range: 1..9,
            requires_subject_name: true,
            match_policy: MatchPolicy::Exact,
        };
        assert_eq!(config.check(), vec!["Outstanding"]);
        assert_eq!(config.max_weight(), 6);
    }
}
