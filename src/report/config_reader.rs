use crate::report::io_common::resolve_path;
use crate::report::metadata::{MetadataForm, ReportMetadata};
use crate::report::report_types::{ReportProfile, ReportType};
use crate::report::*;

use serde::{Deserialize, Serialize};

// ********* Job files, as written by users **********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettingsJs {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    pub pdf: Option<bool>,
    pub preview: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(rename = "reportType")]
    pub report_type: String,
    pub metadata: MetadataForm,
    pub source: SourceSettings,
    #[serde(default)]
    pub output: OutputSettingsJs,
    /// Compares ratings ignoring surrounding spaces and case.
    #[serde(rename = "lenientMatching")]
    pub lenient_matching: Option<bool>,
}

// ********* Validated jobs **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DataSource {
    Csv {
        path: String,
    },
    Excel {
        path: String,
        worksheet: Option<String>,
    },
    SharedSheet {
        url: String,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub pdf: bool,
    pub preview: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ReportJob {
    pub report_type: ReportType,
    pub metadata: ReportMetadata,
    pub source: DataSource,
    pub output: OutputSettings,
    pub match_policy: MatchPolicy,
}

impl ReportJob {
    pub fn profile(&self) -> ReportProfile {
        self.report_type.profile().with_match_policy(self.match_policy)
    }
}

/// Picks the data source. Relative paths are resolved from `root`.
pub fn validate_source(root: &Path, source: &SourceSettings) -> ReportResult<DataSource> {
    let provider = source.provider.trim().to_lowercase();
    let file_path = |field: &str| -> ReportResult<String> {
        let p = source
            .file_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .context(MissingSourceFieldSnafu {
                provider: provider.as_str(),
                field,
            })?;
        Ok(resolve_path(root, p).display().to_string())
    };
    match provider.as_str() {
        "csv" => Ok(DataSource::Csv {
            path: file_path("filePath")?,
        }),
        "xlsx" | "excel" => Ok(DataSource::Excel {
            path: file_path("filePath")?,
            worksheet: source.worksheet_name.clone(),
        }),
        "gsheet" | "googlesheet" => {
            let url = source
                .url
                .clone()
                .filter(|u| !u.is_empty())
                .context(MissingSourceFieldSnafu {
                    provider: provider.as_str(),
                    field: "url",
                })?;
            Ok(DataSource::SharedSheet { url })
        }
        _ => UnknownProviderSnafu {
            provider: source.provider.as_str(),
        }
        .fail(),
    }
}

pub fn validate_job(root: &Path, config: &JobConfig) -> ReportResult<ReportJob> {
    let report_type = ReportType::parse(&config.report_type)?;
    let profile = report_type.profile();
    let metadata = ReportMetadata::from_form(&config.metadata, profile.config.requires_subject_name)?;
    let source = validate_source(root, &config.source)?;
    let output = OutputSettings {
        directory: resolve_path(
            root,
            config.output.output_directory.as_deref().unwrap_or("."),
        ),
        pdf: config.output.pdf.unwrap_or(true),
        preview: config.output.preview.unwrap_or(false),
    };
    let match_policy = if config.lenient_matching.unwrap_or(false) {
        MatchPolicy::TrimCaseInsensitive
    } else {
        MatchPolicy::Exact
    };
    Ok(ReportJob {
        report_type,
        metadata,
        source,
        output,
        match_policy,
    })
}

/// Reads and validates a job file.
pub fn read_job(path: &str) -> ReportResult<ReportJob> {
    let config_p = Path::new(path);
    let config_str = fs::read_to_string(config_p).context(OpeningJsonSnafu { path })?;
    let config: JobConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    info!("job: {:?}", config);
    let root = config_p.parent().unwrap_or_else(|| Path::new("."));
    validate_job(root, &config)
}

pub fn read_summary(path: &Path) -> ReportResult<JSValue> {
    let path_s = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: path_s })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
