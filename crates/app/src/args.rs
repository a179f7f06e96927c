use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rollcall_core::model::{
    AttemptId, AttendanceStatus, OptionId, QuestionId, SectionId, StudentId, SubjectId,
};
use services::{AppConfig, ConfigError};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDate { raw: String },
    InvalidPair { flag: &'static str, raw: String },
    InvalidStatus { raw: String },
    Config(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDate { raw } => {
                write!(f, "invalid --date value (YYYY-MM-DD expected): {raw}")
            }
            ArgsError::InvalidPair { flag, raw } => {
                write!(f, "invalid {flag} value (key=value expected): {raw}")
            }
            ArgsError::InvalidStatus { raw } => write!(
                f,
                "invalid attendance status: {raw} (PRESENT, ABSENT, LATE or EXCUSED)"
            ),
            ArgsError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<ConfigError> for ArgsError {
    fn from(err: ConfigError) -> Self {
        ArgsError::Config(err)
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app attendance --section <id> --subject <id> [--date <YYYY-MM-DD>]");
    eprintln!("                 [--all <status>] [--mark <student>=<status>]...");
    eprintln!("                 [--comment <student>=<text>]... [--late <student>=<minutes>]...");
    eprintln!("                 [--finalize]");
    eprintln!("  app attempt    --attempt <id> [--select <question>=<option>]... [--clear <question>]...");
    eprintln!("                 [--submit]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --api <url>          REST API root (default http://localhost:4000/api)");
    eprintln!("  --locale <tag>       Accept-Language sent with every request (default fr)");
    eprintln!("  --autosave-ms <ms>   autosave quiet period (default 1200)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ROLLCALL_API_URL, ROLLCALL_LOCALE, ROLLCALL_AUTOSAVE_MS, RUST_LOG");
}

#[derive(Debug)]
pub struct AttendanceArgs {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub date: Option<NaiveDate>,
    pub mark_all: Option<AttendanceStatus>,
    pub marks: Vec<(StudentId, AttendanceStatus)>,
    pub comments: Vec<(StudentId, String)>,
    pub minutes_late: Vec<(StudentId, u32)>,
    pub finalize: bool,
}

#[derive(Debug)]
pub struct AttemptArgs {
    pub attempt_id: AttemptId,
    pub selections: Vec<(QuestionId, OptionId)>,
    pub clears: Vec<QuestionId>,
    pub submit: bool,
}

#[derive(Debug)]
pub enum Command {
    Attendance(AttendanceArgs),
    Attempt(AttemptArgs),
    Help,
}

/// Parse the full argument list (program name excluded) on top of `config`.
pub fn parse(
    argv: impl IntoIterator<Item = String>,
    config: &mut AppConfig,
) -> Result<Command, ArgsError> {
    let mut args = argv.into_iter();
    let Some(first) = args.next() else {
        return Ok(Command::Help);
    };
    match first.as_str() {
        "--help" | "-h" | "help" => Ok(Command::Help),
        "attendance" => parse_attendance(&mut args, config),
        "attempt" => parse_attempt(&mut args, config),
        _ => Err(ArgsError::UnknownCommand(first)),
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

/// Handle `--api`, `--locale` and `--autosave-ms`. Returns `false` for any other flag.
fn apply_common(
    flag: &str,
    args: &mut impl Iterator<Item = String>,
    config: &mut AppConfig,
) -> Result<bool, ArgsError> {
    match flag {
        "--api" => config.set_api_url(&require_value(args, "--api")?)?,
        "--locale" => config.set_locale(&require_value(args, "--locale")?)?,
        "--autosave-ms" => config.set_autosave_ms(&require_value(args, "--autosave-ms")?)?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_id<T: FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidPair { flag, raw })
}

fn split_pair(raw: &str, flag: &'static str) -> Result<(String, String), ArgsError> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| ArgsError::InvalidPair {
            flag,
            raw: raw.to_owned(),
        })
}

fn parse_status(raw: &str) -> Result<AttendanceStatus, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidStatus {
        raw: raw.to_owned(),
    })
}

fn parse_attendance(
    args: &mut impl Iterator<Item = String>,
    config: &mut AppConfig,
) -> Result<Command, ArgsError> {
    let mut section_id = None;
    let mut subject_id = None;
    let mut date = None;
    let mut mark_all = None;
    let mut marks = Vec::new();
    let mut comments = Vec::new();
    let mut minutes_late = Vec::new();
    let mut finalize = false;

    while let Some(arg) = args.next() {
        if apply_common(&arg, args, config)? {
            continue;
        }
        match arg.as_str() {
            "--section" => {
                section_id = Some(parse_id(require_value(args, "--section")?, "--section")?);
            }
            "--subject" => {
                subject_id = Some(parse_id(require_value(args, "--subject")?, "--subject")?);
            }
            "--date" => {
                let value = require_value(args, "--date")?;
                let parsed = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .map_err(|_| ArgsError::InvalidDate { raw: value.clone() })?;
                date = Some(parsed);
            }
            "--all" => mark_all = Some(parse_status(&require_value(args, "--all")?)?),
            "--mark" => {
                let (student, status) = split_pair(&require_value(args, "--mark")?, "--mark")?;
                marks.push((parse_id(student, "--mark")?, parse_status(&status)?));
            }
            "--comment" => {
                let (student, text) =
                    split_pair(&require_value(args, "--comment")?, "--comment")?;
                comments.push((parse_id(student, "--comment")?, text));
            }
            "--late" => {
                let raw = require_value(args, "--late")?;
                let (student, minutes) = split_pair(&raw, "--late")?;
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| ArgsError::InvalidPair { flag: "--late", raw })?;
                minutes_late.push((parse_id(student, "--late")?, minutes));
            }
            "--finalize" => finalize = true,
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::Attendance(AttendanceArgs {
        section_id: section_id.ok_or(ArgsError::MissingFlag { flag: "--section" })?,
        subject_id: subject_id.ok_or(ArgsError::MissingFlag { flag: "--subject" })?,
        date,
        mark_all,
        marks,
        comments,
        minutes_late,
        finalize,
    }))
}

fn parse_attempt(
    args: &mut impl Iterator<Item = String>,
    config: &mut AppConfig,
) -> Result<Command, ArgsError> {
    let mut attempt_id = None;
    let mut selections = Vec::new();
    let mut clears = Vec::new();
    let mut submit = false;

    while let Some(arg) = args.next() {
        if apply_common(&arg, args, config)? {
            continue;
        }
        match arg.as_str() {
            "--attempt" => {
                attempt_id = Some(parse_id(require_value(args, "--attempt")?, "--attempt")?);
            }
            "--select" => {
                let (question, option) =
                    split_pair(&require_value(args, "--select")?, "--select")?;
                selections.push((
                    parse_id(question, "--select")?,
                    parse_id(option, "--select")?,
                ));
            }
            "--clear" => clears.push(parse_id(require_value(args, "--clear")?, "--clear")?),
            "--submit" => submit = true,
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::Attempt(AttemptArgs {
        attempt_id: attempt_id.ok_or(ArgsError::MissingFlag { flag: "--attempt" })?,
        selections,
        clears,
        submit,
    }))
}
