// Report metadata: validation, display order and file names.

use crate::report::*;

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const PROGRAMS: [&str; 2] = ["M.Ed.", "ECD"];
pub const SEMESTERS: [&str; 3] = ["SUMMER", "FALL", "SPRING"];
pub const YEARS: RangeInclusive<u32> = 2025..=2030;

pub const FACULTY_NAME: &str = "Faculty Name";
pub const PROGRAM: &str = "Program";
pub const COURSE_CODE: &str = "Course Code";
pub const BATCH: &str = "Batch";
pub const SEMESTER: &str = "Semester";

/// The order in which metadata fields are displayed. Fields not listed here
/// come after, in insertion order.
pub const DISPLAY_ORDER: [&str; 5] = [FACULTY_NAME, PROGRAM, COURSE_CODE, BATCH, SEMESTER];

/// The metadata as entered by the user, before validation.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetadataForm {
    #[serde(rename = "facultyName")]
    pub faculty_name: Option<String>,
    pub program: String,
    #[serde(rename = "courseCode")]
    pub course_code: String,
    pub batch: String,
    pub semester: String,
    pub year: u32,
}

/// Validated metadata, ordered for display.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportMetadata {
    entries: Vec<(String, String)>,
}

fn required(field: &str, value: &str) -> ReportResult<String> {
    let v = value.trim();
    ensure!(
        !v.is_empty(),
        InvalidMetadataSnafu {
            field,
            reason: "this field is required"
        }
    );
    Ok(v.to_string())
}

fn one_of(field: &str, value: &str, choices: &[&str]) -> ReportResult<String> {
    let v = required(field, value)?;
    match choices.iter().find(|c| c.eq_ignore_ascii_case(&v)) {
        Some(c) => Ok(c.to_string()),
        None => InvalidMetadataSnafu {
            field,
            reason: format!("expected one of {}", choices.join(", ")),
        }
        .fail(),
    }
}

impl ReportMetadata {
    /// Validates a form. The faculty name is only kept when the report needs it.
    pub fn from_form(form: &MetadataForm, requires_subject_name: bool) -> ReportResult<ReportMetadata> {
        let mut fields: Vec<(String, String)> = Vec::new();
        if requires_subject_name {
            let name = required(FACULTY_NAME, form.faculty_name.as_deref().unwrap_or(""))?;
            fields.push((FACULTY_NAME.to_string(), name));
        }
        fields.push((PROGRAM.to_string(), one_of(PROGRAM, &form.program, &PROGRAMS)?));
        fields.push((COURSE_CODE.to_string(), required(COURSE_CODE, &form.course_code)?));
        fields.push((BATCH.to_string(), required(BATCH, &form.batch)?));
        let semester = one_of(SEMESTER, &form.semester, &SEMESTERS)?;
        ensure!(
            YEARS.contains(&form.year),
            InvalidMetadataSnafu {
                field: SEMESTER,
                reason: format!(
                    "year {} is outside {}-{}",
                    form.year,
                    YEARS.start(),
                    YEARS.end()
                )
            }
        );
        fields.push((SEMESTER.to_string(), format!("{} {}", semester, form.year)));
        Ok(ReportMetadata::from_entries(fields))
    }

    /// Orders arbitrary entries by display priority. Empty values are dropped.
    pub fn from_entries(entries: Vec<(String, String)>) -> ReportMetadata {
        let mut entries: Vec<(String, String)> = entries
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        // Stable, so unknown fields keep their relative order.
        entries.sort_by_key(|(k, _)| {
            DISPLAY_ORDER
                .iter()
                .position(|d| d == k)
                .unwrap_or(DISPLAY_ORDER.len())
        });
        ReportMetadata { entries }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }

    /// The base name of the exported files, without extension.
    ///
    /// `Jane_Doe_EDU_501_12_FALL_2025_Faculty_Evaluation_Report`
    pub fn file_stem(&self, title: &str) -> String {
        let mut parts: Vec<String> = [FACULTY_NAME, COURSE_CODE, BATCH, SEMESTER]
            .iter()
            .filter_map(|k| self.get(k))
            .map(sanitize_file_part)
            .filter(|s| !s.is_empty())
            .collect();
        parts.push(sanitize_file_part(title));
        parts.push("Report".to_string());
        parts.join("_")
    }
}

/// Removes the characters that cannot appear in a file name and replaces
/// spaces with `_`.
pub fn sanitize_file_part(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}
