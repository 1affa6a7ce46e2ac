// The two kinds of evaluation report and their fixed settings.

use crate::report::*;

use evaluation_scoring::{MatchPolicy, ReportConfig};

/// Color used for a category without an assigned color.
pub const FALLBACK_COLOR: &str = "#7f7f7f";

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ReportType {
    Faculty,
    Course,
}

impl ReportType {
    /// Accepts `faculty` / `course`, and the longer report titles.
    pub fn parse(name: &str) -> ReportResult<ReportType> {
        match name.trim().to_lowercase().as_str() {
            "faculty" | "faculty evaluation" | "faculty-evaluation" => Ok(ReportType::Faculty),
            "course" | "course evaluation" | "course-evaluation" => Ok(ReportType::Course),
            _ => UnknownReportTypeSnafu { name }.fail(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportType::Faculty => "faculty",
            ReportType::Course => "course",
        }
    }

    pub fn profile(&self) -> ReportProfile {
        match self {
            ReportType::Faculty => faculty_profile(),
            ReportType::Course => course_profile(),
        }
    }
}

/// A report configuration together with what is needed to present it.
#[derive(PartialEq, Debug, Clone)]
pub struct ReportProfile {
    pub report_type: ReportType,
    pub title: &'static str,
    pub config: ReportConfig,
    pub colors: Vec<(String, String)>,
}

impl ReportProfile {
    pub fn color_of(&self, category: &str) -> &str {
        self.colors
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, color)| color.as_str())
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> ReportProfile {
        self.config.match_policy = policy;
        self
    }
}

fn labelled<T: Copy>(labels: &[&str], values: &[T]) -> Vec<(String, T)> {
    labels
        .iter()
        .zip(values.iter())
        .map(|(l, v)| (l.to_string(), *v))
        .collect()
}

fn faculty_profile() -> ReportProfile {
    let categories = ["Excellent", "Very Good", "Good", "Satisfactory", "Poor"];
    ReportProfile {
        report_type: ReportType::Faculty,
        title: "Faculty Evaluation",
        config: ReportConfig {
            category_order: categories.iter().map(|s| s.to_string()).collect(),
            score_mapping: labelled(&categories, &[5, 4, 3, 2, 1]),
            conversion_max: 60.0,
            comment_column_name: "General comments".to_string(),
            question_column_range: 1..9,
            requires_subject_name: true,
            match_policy: MatchPolicy::Exact,
        },
        colors: labelled(
            &categories,
            &["#2ca02c", "#1f77b4", "#ff7f0e", "#d62728", "#9467bd"],
        )
        .into_iter()
        .map(|(c, color)| (c, color.to_string()))
        .collect(),
    }
}

fn course_profile() -> ReportProfile {
    let categories = [
        "Strongly Agree",
        "Agree",
        "Neutral",
        "Disagree",
        "Strongly Disagree",
    ];
    ReportProfile {
        report_type: ReportType::Course,
        title: "Course Evaluation",
        config: ReportConfig {
            category_order: categories.iter().map(|s| s.to_string()).collect(),
            score_mapping: labelled(&categories, &[5, 4, 3, 2, 1]),
            conversion_max: 15.0,
            // The course form exports this header with a trailing space.
            comment_column_name: "General comment ".to_string(),
            question_column_range: 1..5,
            requires_subject_name: false,
            match_policy: MatchPolicy::Exact,
        },
        colors: labelled(
            &categories,
            &["#2ca02c", "#1f7b14", "#ff7f0e", "#d62728", "#9467bd"],
        )
        .into_iter()
        .map(|(c, color)| (c, color.to_string()))
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_consistent() {
        for rt in [ReportType::Faculty, ReportType::Course] {
            let p = rt.profile();
            assert!(p.config.check().is_empty(), "{:?}", rt);
            assert_eq!(p.config.max_weight(), 5);
            assert_eq!(p.colors.len(), p.config.category_order.len());
        }
    }

    #[test]
    fn faculty_preset() {
        let p = ReportType::Faculty.profile();
        assert_eq!(p.config.conversion_max, 60.0);
        assert_eq!(p.config.question_column_range, 1..9);
        assert!(p.config.requires_subject_name);
        assert_eq!(p.color_of("Very Good"), "#1f77b4");
        assert_eq!(p.color_of("Outstanding"), FALLBACK_COLOR);
    }

    #[test]
    fn course_preset() {
        let p = ReportType::Course.profile();
        assert_eq!(p.config.conversion_max, 15.0);
        assert_eq!(p.config.comment_column_name, "General comment ");
        assert_eq!(p.config.question_column_range, 1..5);
        assert!(!p.config.requires_subject_name);
        assert_eq!(p.color_of("Agree"), "#1f7b14");
    }

    #[test]
    fn parse_names() {
        assert_eq!(ReportType::parse("Faculty").unwrap(), ReportType::Faculty);
        assert_eq!(
            ReportType::parse("course evaluation").unwrap(),
            ReportType::Course
        );
        assert!(ReportType::parse("peer").is_err());
        for rt in [ReportType::Faculty, ReportType::Course] {
            assert_eq!(ReportType::parse(rt.name()).unwrap(), rt);
        }
    }
}
