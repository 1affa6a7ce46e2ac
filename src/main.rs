mod args;
mod report;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use log::{debug, info, LevelFilter};
use snafu::prelude::*;

use crate::args::{Args, Command, GenerateArgs, UsersAction};
use crate::report::config_reader::{
    read_job, validate_job, JobConfig, OutputSettingsJs, ReportJob, SourceSettings,
};
use crate::report::credentials::{JsonUserStore, Role};
use crate::report::metadata::MetadataForm;
use crate::report::render::ChromiumRenderer;
use crate::report::session::Session;
use crate::report::*;

fn job_from_flags(args: &GenerateArgs) -> ReportResult<ReportJob> {
    let input = args.input.clone().whatever_context("--input or --config is required")?;
    let provider = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
    let is_sheet = matches!(provider.as_str(), "gsheet" | "googlesheet");
    let config = JobConfig {
        report_type: args
            .report_type
            .clone()
            .whatever_context("--report-type is required")?,
        metadata: MetadataForm {
            faculty_name: args.faculty_name.clone(),
            program: args.program.clone().unwrap_or_default(),
            course_code: args.course_code.clone().unwrap_or_default(),
            batch: args.batch.clone().unwrap_or_default(),
            semester: args.semester.clone().unwrap_or_default(),
            year: args.year.unwrap_or_default(),
        },
        source: SourceSettings {
            provider,
            file_path: if is_sheet { None } else { Some(input.clone()) },
            url: if is_sheet { Some(input) } else { None },
            worksheet_name: args.excel_worksheet_name.clone(),
        },
        output: OutputSettingsJs::default(),
        lenient_matching: Some(args.lenient_matching),
    };
    validate_job(Path::new("."), &config)
}

fn run_generate(args: &GenerateArgs, session: &mut Session) -> ReportResult<()> {
    let mut job = match &args.config {
        Some(path) => read_job(path)?,
        None => job_from_flags(args)?,
    };
    if let Some(out) = &args.out_dir {
        job.output.directory = PathBuf::from(out);
    }
    if args.no_pdf {
        job.output.pdf = false;
    }
    if args.preview {
        job.output.preview = true;
    }
    if args.lenient_matching {
        job.match_policy = evaluation_scoring::MatchPolicy::TrimCaseInsensitive;
    }
    debug!("job: {:?}", job);

    let renderer = ChromiumRenderer {
        timeout: Duration::from_secs(args.render_timeout),
        ..ChromiumRenderer::new(&args.chromium)
    };
    let reference = args.reference.as_ref().map(PathBuf::from);
    let generated = run_job(&job, session, Some(&renderer), reference.as_deref())?;

    let pretty_js_stats =
        serde_json::to_string_pretty(&generated.summary).context(ParsingJsonSnafu {})?;
    println!("summary:{}", pretty_js_stats);
    println!("markup: {}", generated.markup_path.display());
    if let Some(p) = generated.document_path {
        println!("document: {}", p.display());
    }
    if let Some(p) = generated.preview_path {
        println!("preview: {}", p.display());
    }
    Ok(())
}

fn run_users(action: &UsersAction, store: &mut JsonUserStore, session: &Session) -> ReportResult<()> {
    session.require_admin()?;
    match action {
        UsersAction::Add {
            new_username,
            new_password,
            role,
        } => {
            let role = Role::parse(role)?;
            store.add_user(new_username, new_password, role)?;
            println!("Added user {} ({})", new_username, role.as_str());
        }
        UsersAction::List => {
            for (name, role) in store.list_users() {
                println!("{}\t{}", name, role.as_str());
            }
        }
    }
    Ok(())
}

fn run(args: &Args) -> ReportResult<()> {
    let mut store = JsonUserStore::open(Path::new(&args.users))?;
    let username = args
        .username
        .as_deref()
        .whatever_context("A username is required (--username or EVALREPORT_USERNAME)")?;
    let password = args
        .password
        .as_deref()
        .whatever_context("A password is required (--password or EVALREPORT_PASSWORD)")?;
    let mut session = Session::login(&store, username, password)?;
    debug!("session: {} ({})", session.username(), session.role().as_str());

    let res = match &args.command {
        Command::Generate(g) => run_generate(g, &mut session),
        Command::Users { action } => run_users(action, &mut store, &session),
    };
    session.logout();
    res
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    info!("evalreport {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        report_error(&e);
        std::process::exit(1);
    }
}
