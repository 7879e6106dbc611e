//! Line parsing for the headless driver.
//!
//! What a line means depends on the phase: the same `y` answers a recognition
//! item or a priming question, a bare number is a math answer or a folder
//! choice.

use offload_core::controller::QuestionAnswer;
use offload_core::stimuli::{Folder, InkColor};
use offload_core::{Event, PhaseKind};

/// Driver commands, written with a leading `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Status,
    Help,
    Export,
    /// Finish free recall.
    Done,
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(Command),
    Event(Event),
    /// One more line of the free-recall transcript.
    RecallLine(String),
    Invalid(String),
}

/// Parse one non-empty line in the context of the current phase.
pub fn parse_line(kind: PhaseKind, line: &str) -> Input {
    let line = line.trim();
    if let Some(command) = line.strip_prefix('#') {
        return parse_command(command);
    }

    let lower = line.to_lowercase();
    match kind {
        PhaseKind::Intro => match lower.as_str() {
            "start" | "begin" | "s" => Input::Event(Event::Start),
            _ => invalid("type 'start' to begin"),
        },
        PhaseKind::Encoding => match lower.as_str() {
            "n" | "next" | "continue" => Input::Event(Event::Advance),
            _ => invalid("type 'next' to continue"),
        },
        PhaseKind::Distractor => Input::Event(Event::SubmitMath(line.to_string())),
        PhaseKind::Recall => Input::RecallLine(line.to_string()),
        PhaseKind::Recognition => parse_recognition(&lower),
        PhaseKind::Location => parse_folder(&lower),
        PhaseKind::StroopIntro => match lower.as_str() {
            "begin" | "start" | "s" => Input::Event(Event::BeginStroop),
            _ => invalid("type 'begin' to start the color task"),
        },
        PhaseKind::StroopHard | PhaseKind::StroopEasy => parse_stroop(&lower),
        PhaseKind::Results => invalid("the experiment is over; use #export or #quit"),
    }
}

fn parse_command(command: &str) -> Input {
    match command.trim().to_lowercase().as_str() {
        "quit" | "exit" => Input::Command(Command::Quit),
        "status" => Input::Command(Command::Status),
        "help" => Input::Command(Command::Help),
        "export" | "save" => Input::Command(Command::Export),
        "done" => Input::Command(Command::Done),
        _ => invalid("Unknown command. Type #help for help."),
    }
}

fn parse_recognition(lower: &str) -> Input {
    match lower {
        "y" | "yes" | "seen" => return Input::Event(Event::Recognize(true)),
        "n" | "no" | "new" => return Input::Event(Event::Recognize(false)),
        _ => {}
    }

    // `swipe <dx> <dy>` replays a touch gesture.
    let parts: Vec<&str> = lower.split_whitespace().collect();
    if let ["swipe", dx, dy] = parts.as_slice() {
        if let (Ok(dx), Ok(dy)) = (dx.parse::<f64>(), dy.parse::<f64>()) {
            return Input::Event(Event::Swipe { dx, dy });
        }
    }
    invalid("answer 'y' (seen) or 'n' (new)")
}

fn parse_folder(lower: &str) -> Input {
    if let Ok(n) = lower.parse::<usize>() {
        if let Some(folder) = n.checked_sub(1).and_then(|i| Folder::ALL.get(i)) {
            return Input::Event(Event::ChooseFolder(*folder));
        }
    }
    match Folder::from_name(lower) {
        Some(folder) => Input::Event(Event::ChooseFolder(folder)),
        None => invalid("pick a folder by name or number 1-5"),
    }
}

fn parse_stroop(lower: &str) -> Input {
    let answer = match lower {
        "yes" | "y" => Some(QuestionAnswer::Yes),
        "no" => Some(QuestionAnswer::No),
        "?" | "dont know" | "don't know" | "idk" => Some(QuestionAnswer::DontKnow),
        _ => None,
    };
    if let Some(answer) = answer {
        return Input::Event(Event::AnswerQuestion(answer));
    }

    let color = match lower {
        "red" => Some(InkColor::Red),
        "blue" => Some(InkColor::Blue),
        key if key.chars().count() == 1 => key.chars().next().and_then(InkColor::from_key),
        _ => None,
    };
    match color {
        Some(color) => Input::Event(Event::RespondColor(color)),
        None => invalid("answer with 'e' (blue) or 'i' (red)"),
    }
}

fn invalid(message: &str) -> Input {
    Input::Invalid(message.to_string())
}
