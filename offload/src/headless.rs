//! Headless mode for the experiment.
//!
//! This module provides a simple text-based interface for running a session
//! in a terminal. It's also handy for scripted runs and AI agents.

use crate::input::{parse_line, Command, Input};
use crate::render::{render_result, render_view};
use offload_core::view::format_clock;
use offload_core::{
    Effect, Event, ExperimentConfig, ExperimentSession, Phase, PhaseKind, SessionError, TimerSet,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run a session in headless mode.
///
/// This provides a simple line-oriented protocol:
/// - Lines starting with `#` are commands (quit, status, export, done, help)
/// - All other lines are answers for the current phase
/// - Output lines are tagged with the phase they belong to
pub async fn run_headless(config: ExperimentConfig) -> Result<(), SessionError> {
    let mut session = ExperimentSession::new(config);
    let (mut timers, mut fired) = TimerSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut recall = String::new();

    println!("=== Personal Offloading Test ===");
    println!("Participant: {}", session.participant_id());
    println!();
    print_help();
    println!();
    show(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("Error reading input: {e}");
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match parse_line(session.kind(), line) {
                    Input::Command(Command::Quit) => {
                        println!("Goodbye!");
                        break;
                    }
                    Input::Command(Command::Help) => print_help(),
                    Input::Command(Command::Status) => print_status(&session, timers.len()),
                    Input::Command(Command::Export) => export(&session).await,
                    Input::Command(Command::Done) => {
                        if session.kind() == PhaseKind::Recall {
                            dispatch(&mut session, &mut timers, Event::SubmitRecall).await;
                        } else {
                            println!("[ERROR] #done only applies during free recall");
                        }
                    }
                    Input::RecallLine(text) => {
                        if !recall.is_empty() {
                            recall.push('\n');
                        }
                        recall.push_str(&text);
                        if let Err(e) = session.handle(Event::EditRecall(recall.clone())) {
                            println!("[ERROR] {e}");
                        }
                    }
                    Input::Event(event) => dispatch(&mut session, &mut timers, event).await,
                    Input::Invalid(message) => println!("[ERROR] {message}"),
                }
            }
            Some(id) = fired.recv() => {
                timers.fired(id);
                on_timer(&mut session, &mut timers, Event::TimerFired(id)).await;
            }
        }
    }

    timers.clear();
    Ok(())
}

/// Apply a participant event and show whatever changed.
async fn dispatch(
    session: &mut ExperimentSession,
    timers: &mut TimerSet,
    event: Event,
) {
    match session.handle(event) {
        Ok(effects) => {
            timers.apply(&effects);
            show(session);
            if effects.contains(&Effect::ResultsReady) {
                export(session).await;
            }
        }
        Err(e) => println!("[ERROR] {e}"),
    }
}

/// Apply a timer firing. Only report what the participant needs to see.
async fn on_timer(session: &mut ExperimentSession, timers: &mut TimerSet, event: Event) {
    let before = session.kind();
    let effects = match session.handle(event) {
        Ok(effects) => effects,
        Err(e) => {
            tracing::warn!(error = %e, "timer event rejected");
            return;
        }
    };
    timers.apply(&effects);

    match session.phase() {
        Phase::Encoding { exposure: None, .. } => println!("  Type 'next' to continue."),
        Phase::Distractor { remaining, .. } if *remaining % 30 == 0 || *remaining <= 5 => {
            println!("[TIME] {} left", format_clock(*remaining));
        }
        Phase::Recall { .. } if before == PhaseKind::Distractor => {
            println!("[TIME] Time's up!");
            show(session);
        }
        _ => {}
    }
}

fn show(session: &ExperimentSession) {
    for line in render_view(&session.view()) {
        println!("{line}");
    }
}

async fn export(session: &ExperimentSession) {
    match session.export().await {
        Ok(path) => println!("[SAVED] Results written to {}", path.display()),
        Err(e) => println!("[ERROR] Export failed: {e}"),
    }
}

fn print_status(session: &ExperimentSession, pending_timers: usize) {
    let log = session.experiment().log();
    println!("[STATUS]");
    println!("  Participant: {}", session.participant_id());
    println!("  Session: {}", session.id());
    println!("  Phase: {}", session.kind());
    println!("  Statements read: {}", log.encoding().len());
    println!(
        "  Math answers: {} ({} correct)",
        log.math().len(),
        log.math_correct()
    );
    println!("  Recognition answers: {}", log.recognition().len());
    println!("  Location answers: {}", log.location().len());
    println!(
        "  Color trials: {} hard, {} easy",
        log.stroop().hard.len(),
        log.stroop().easy.len()
    );
    println!("  Pending timers: {pending_timers}");
    if let Some(result) = session.result() {
        for line in render_result(result) {
            println!("{line}");
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  #quit   - Exit");
    println!("  #status - Show session progress");
    println!("  #done   - Finish free recall");
    println!("  #export - Write the result document");
    println!("  #help   - Show this help");
    println!("Anything else is an answer for the current screen.");
}

/// Parse session configuration from command line arguments, on top of the
/// environment.
pub fn parse_config_from_args(
    args: &[String],
    mut config: ExperimentConfig,
) -> Result<ExperimentConfig, SessionError> {
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--participant" => {
                if let Some(id) = args.get(i + 1) {
                    config = config.with_participant_id(id.as_str())?;
                    i += 1;
                }
            }
            "--seed" => {
                if let Some(seed) = args.get(i + 1) {
                    config = config.with_seed(offload_core::config::parse_seed(seed)?);
                    i += 1;
                }
            }
            "--export-dir" => {
                if let Some(dir) = args.get(i + 1) {
                    config = config.with_export_dir(dir.as_str());
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let config = parse_config_from_args(
            &args(&["offload", "--participant", "pilot-3", "--seed", "9", "--export-dir", "out"]),
            ExperimentConfig::new(),
        )
        .unwrap();

        assert_eq!(config.participant_id, "pilot-3");
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.export_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_bad_seed_is_an_error() {
        let err = parse_config_from_args(&args(&["offload", "--seed", "x"]), ExperimentConfig::new())
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }
}
