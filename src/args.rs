use clap::{Parser, Subcommand};

/// This program builds evaluation reports (charts, comments and scores) from
/// the exported responses of faculty and course evaluation forms.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// (file path, default users.json) The JSON file holding the user accounts. It is created with
    /// a default administrator (admin/admin) if it does not exist.
    #[clap(long, value_parser, default_value = "users.json")]
    pub users: String,

    /// The name of the user running the command.
    #[clap(long, value_parser, env = "EVALREPORT_USERNAME")]
    pub username: Option<String>,

    /// The password of the user running the command.
    #[clap(long, value_parser, env = "EVALREPORT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generates a report from a job file, or from the options below.
    Generate(GenerateArgs),
    /// Manages the user accounts (administrators only).
    Users {
        #[clap(subcommand)]
        action: UsersAction,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    /// (file path, optional) A JSON job file describing the report. The other options are
    /// ignored when it is given, except --out-dir, --reference and the rendering options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (faculty or course) The kind of report.
    #[clap(long, value_parser)]
    pub report_type: Option<String>,

    /// (file path or URL) The responses: a CSV file, an Excel workbook or a Google Sheet link.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, xlsx or gsheet.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: the first worksheet) When using an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    #[clap(long, value_parser)]
    pub faculty_name: Option<String>,
    /// (M.Ed. or ECD)
    #[clap(long, value_parser)]
    pub program: Option<String>,
    #[clap(long, value_parser)]
    pub course_code: Option<String>,
    #[clap(long, value_parser)]
    pub batch: Option<String>,
    /// (SUMMER, FALL or SPRING)
    #[clap(long, value_parser)]
    pub semester: Option<String>,
    /// (2025 to 2030)
    #[clap(long, value_parser)]
    pub year: Option<u32>,

    /// (directory) Where the report files are written. Overrides the job file.
    #[clap(short, long, value_parser)]
    pub out_dir: Option<String>,

    /// Skips the PDF document: only the HTML markup is written.
    #[clap(long, takes_value = false)]
    pub no_pdf: bool,

    /// Also writes an HTML preview with interactive charts and the raw responses.
    #[clap(long, takes_value = false)]
    pub preview: bool,

    /// Compares ratings with the categories ignoring surrounding spaces and case.
    #[clap(long, takes_value = false)]
    pub lenient_matching: bool,

    /// (file path) A reference summary in JSON format. If provided, the command checks that the
    /// computed summary matches it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// The browser used to print the PDF document.
    #[clap(long, value_parser, env = "EVALREPORT_CHROMIUM", default_value = "chromium")]
    pub chromium: String,

    /// (seconds) How long the PDF printing may take.
    #[clap(long, value_parser, default_value_t = 120)]
    pub render_timeout: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersAction {
    /// Adds a user account.
    Add {
        #[clap(long, value_parser)]
        new_username: String,
        #[clap(long, value_parser)]
        new_password: String,
        /// (admin or user)
        #[clap(long, value_parser, default_value = "user")]
        role: String,
    },
    /// Lists the user accounts and their roles.
    List,
}
