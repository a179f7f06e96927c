use tracing_subscriber::EnvFilter;

use rollcall_core::model::AttendanceStatus;
use services::{AppConfig, AppServices, AttemptWorkflow, AttendanceWorkflow, Clock};

mod args;

use args::{ArgsError, AttemptArgs, AttendanceArgs, Command, print_usage};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::from_env().map_err(ArgsError::from)?;
    let command = args::parse(std::env::args().skip(1), &mut config).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::system();
    match command {
        Command::Help => {
            print_usage();
            Ok(())
        }
        Command::Attendance(args) => {
            let services = AppServices::new_http(&config, clock)?;
            run_attendance(&services, clock, args).await
        }
        Command::Attempt(args) => {
            let services = AppServices::new_http(&config, clock)?;
            run_attempt(&services, args).await
        }
    }
}

async fn run_attendance(
    services: &AppServices,
    clock: Clock,
    args: AttendanceArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let date = args.date.unwrap_or_else(|| clock.today());
    let mut workflow = services
        .attendance()
        .open(&args.section_id, &args.subject_id, date)
        .await?;
    tracing::info!(
        session_id = %workflow.session().id(),
        students = workflow.sheet().len(),
        "attendance session opened"
    );

    let edited = args.mark_all.is_some()
        || !args.marks.is_empty()
        || !args.comments.is_empty()
        || !args.minutes_late.is_empty();
    if let Some(status) = args.mark_all {
        workflow.mark_all(status)?;
    }
    for (student_id, status) in &args.marks {
        workflow.set_status(student_id, *status)?;
    }
    for (student_id, comment) in &args.comments {
        workflow.set_comment(student_id, comment.as_str())?;
    }
    for (student_id, minutes) in &args.minutes_late {
        workflow.set_minutes_late(student_id, Some(*minutes))?;
    }

    if args.finalize {
        workflow.finalize().await?;
    } else if edited {
        workflow.save().await?;
    }

    print_roster(&workflow);
    Ok(())
}

fn print_roster(workflow: &AttendanceWorkflow) {
    let session = workflow.session();
    let state = if workflow.is_finalized() {
        "finalized"
    } else {
        "open"
    };
    println!(
        "{} {} {} ({state})",
        session.section_id(),
        session.subject_id(),
        session.date()
    );

    let sheet = workflow.sheet();
    for entry in sheet.entries() {
        let Some(mark) = sheet.mark(&entry.student_id) else {
            continue;
        };
        let roll = entry.roll_no.as_deref().unwrap_or("-");
        let mut line = format!(
            "{roll:>4}  {:<30} {:<8}",
            entry.display_name,
            mark.status.as_str()
        );
        if let Some(minutes) = mark.minutes_late {
            line.push_str(&format!(" +{minutes}min"));
        }
        if !mark.comment.is_empty() {
            line.push_str(&format!("  {}", mark.comment));
        }
        println!("{}", line.trim_end());
    }

    let tally = sheet.tally();
    let counts: Vec<String> = AttendanceStatus::ALL
        .iter()
        .map(|status| format!("{status}={}", tally.count(*status)))
        .collect();
    println!("{}", counts.join(" "));
}

async fn run_attempt(
    services: &AppServices,
    args: AttemptArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut workflow = services.attempts().open(&args.attempt_id).await?;

    let edited = !args.selections.is_empty() || !args.clears.is_empty();
    for question_id in &args.clears {
        workflow.clear(question_id)?;
    }
    for (question_id, option_id) in &args.selections {
        workflow.toggle_option(question_id, option_id)?;
    }

    if args.submit {
        workflow.submit().await?;
    } else if edited {
        workflow.save().await?;
    }

    print_attempt(&workflow);
    Ok(())
}

fn print_attempt(workflow: &AttemptWorkflow) {
    let attempt = workflow.attempt();
    let sheet = workflow.sheet();
    println!(
        "attempt {} (quiz {}): {}/{} answered",
        attempt.id,
        attempt.quiz_id,
        sheet.answered_count(),
        sheet.len()
    );
    for (question_id, options) in sheet.snapshot() {
        let picked: Vec<&str> = options.iter().map(|o| o.as_str()).collect();
        println!("  {question_id}: {}", picked.join(","));
    }
    if let Some(result) = workflow.result() {
        match (result.score, result.max_score) {
            (Some(score), Some(max)) => println!("score: {score}/{max}"),
            (Some(score), None) => println!("score: {score}"),
            _ => println!("submitted"),
        }
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
