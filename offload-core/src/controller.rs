//! Phase controller.
//!
//! The experiment is a strictly forward state machine:
//!
//! Intro → Encoding → Distractor → Recall → Recognition → Location →
//! StroopIntro → StroopHard → StroopEasy → Results
//!
//! Each [`Phase`] variant carries exactly the data that phase needs. Input
//! arrives as an [`Event`]; [`Experiment::handle`] either rejects it (leaving
//! the state untouched) or applies the transition and returns the
//! [`Effect`]s the runtime must carry out, chiefly scheduling and cancelling
//! timers. Timers are identified by a fresh [`TimerId`] each time one is
//! armed, and a firing is only honored if the current state still owns that
//! id, so a late tick from an exited phase or a previous statement can never
//! act on the wrong state.

use crate::clock::elapsed_ms;
use crate::config::Timing;
use crate::recorder::{
    EncodingRecord, LocationResponse, MathResult, RecognitionResponse, ResponseLog, StroopResponse,
};
use crate::scoring::{self, ExperimentResult, ScoringInput};
use crate::stimuli::{
    self, Folder, InkColor, MathProblem, RecognitionItem, Statement, StroopBlock, StroopTrial,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Number of priming questions shown per Stroop block.
pub const QUESTIONS_PER_BLOCK: usize = 5;

/// A priming question is shown before every this-many trials.
pub const TRIALS_PER_QUESTION: usize = 3;

/// Minimum horizontal travel (px) for a swipe to count as a response.
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Errors from feeding an event to the controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("'{event}' is not accepted during the {phase} phase")]
    NotAccepted { phase: PhaseKind, event: &'static str },

    #[error("statement {index} is still within its minimum exposure time")]
    ExposurePending { index: usize },
}

/// Phase names, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Intro,
    Encoding,
    Distractor,
    Recall,
    Recognition,
    Location,
    StroopIntro,
    StroopHard,
    StroopEasy,
    Results,
}

impl PhaseKind {
    pub fn name(&self) -> &'static str {
        match self {
            PhaseKind::Intro => "intro",
            PhaseKind::Encoding => "encoding",
            PhaseKind::Distractor => "distractor",
            PhaseKind::Recall => "recall",
            PhaseKind::Recognition => "recognition",
            PhaseKind::Location => "location",
            PhaseKind::StroopIntro => "stroop_intro",
            PhaseKind::StroopHard => "stroop_hard",
            PhaseKind::StroopEasy => "stroop_easy",
            PhaseKind::Results => "results",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Handle for one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-shot minimum exposure for an encoding statement.
    Exposure,
    /// One tick of the distractor countdown.
    Countdown,
}

/// Sub-state of a Stroop block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StroopStep {
    /// A priming question is on screen.
    Question,
    /// A colored word is on screen; reaction time is measured from `started_at`.
    Trial { started_at: DateTime<Utc> },
}

/// A running Stroop block.
#[derive(Debug, Clone, PartialEq)]
pub struct StroopState {
    pub block: StroopBlock,
    pub trials: Vec<StroopTrial>,
    pub index: usize,
    pub question_index: usize,
    pub step: StroopStep,
}

impl StroopState {
    fn new(block: StroopBlock, trials: Vec<StroopTrial>) -> Self {
        Self {
            block,
            trials,
            index: 0,
            question_index: 0,
            step: StroopStep::Question,
        }
    }

    /// The priming prompt currently due.
    pub fn question(&self) -> Option<&'static str> {
        self.block.questions().get(self.question_index).copied()
    }

    pub fn current_trial(&self) -> Option<&StroopTrial> {
        self.trials.get(self.index)
    }
}

/// The controller's state, one variant per phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Intro,
    Encoding {
        index: usize,
        shown_at: DateTime<Utc>,
        /// Pending exposure timer. `None` once it has elapsed.
        exposure: Option<TimerId>,
    },
    Distractor {
        remaining: u32,
        problem: MathProblem,
        countdown: TimerId,
    },
    Recall {
        draft: String,
    },
    Recognition {
        items: Vec<RecognitionItem>,
        index: usize,
    },
    Location {
        items: Vec<Statement>,
        index: usize,
    },
    StroopIntro,
    Stroop(StroopState),
    Results,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Intro => PhaseKind::Intro,
            Phase::Encoding { .. } => PhaseKind::Encoding,
            Phase::Distractor { .. } => PhaseKind::Distractor,
            Phase::Recall { .. } => PhaseKind::Recall,
            Phase::Recognition { .. } => PhaseKind::Recognition,
            Phase::Location { .. } => PhaseKind::Location,
            Phase::StroopIntro => PhaseKind::StroopIntro,
            Phase::Stroop(state) => match state.block {
                StroopBlock::Hard => PhaseKind::StroopHard,
                StroopBlock::Easy => PhaseKind::StroopEasy,
            },
            Phase::Results => PhaseKind::Results,
        }
    }

    /// The timer this state is waiting on, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        match self {
            Phase::Encoding { exposure, .. } => *exposure,
            Phase::Distractor { countdown, .. } => Some(*countdown),
            _ => None,
        }
    }
}

/// Answer to a Stroop priming question. Not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionAnswer {
    Yes,
    No,
    DontKnow,
}

/// Input to the controller, from the participant or from a timer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Begin the experiment from the intro screen.
    Start,
    /// A previously scheduled timer elapsed.
    TimerFired(TimerId),
    /// Move past the current encoding statement.
    Advance,
    /// Submit a typed answer to the current math problem.
    SubmitMath(String),
    /// Replace the recall draft.
    EditRecall(String),
    /// Finish free recall.
    SubmitRecall,
    /// Answer whether the current recognition item was seen.
    Recognize(bool),
    /// Touch gesture on the recognition screen, as start-to-end deltas.
    Swipe { dx: f64, dy: f64 },
    /// Pick a folder for the current location item.
    ChooseFolder(Folder),
    /// Leave the Stroop instructions and start the hard block.
    BeginStroop,
    /// Dismiss a priming question.
    AnswerQuestion(QuestionAnswer),
    /// Commit a color for the current Stroop word.
    RespondColor(InkColor),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::TimerFired(_) => "timer",
            Event::Advance => "advance",
            Event::SubmitMath(_) => "submit math",
            Event::EditRecall(_) => "edit recall",
            Event::SubmitRecall => "submit recall",
            Event::Recognize(_) => "recognize",
            Event::Swipe { .. } => "swipe",
            Event::ChooseFolder(_) => "choose folder",
            Event::BeginStroop => "begin stroop",
            Event::AnswerQuestion(_) => "answer question",
            Event::RespondColor(_) => "respond color",
        }
    }
}

/// Classify a swipe: right means "seen", left means "new".
///
/// Returns `None` for gestures that are too short or not mostly horizontal.
pub fn swipe_response(dx: f64, dy: f64) -> Option<bool> {
    if dx.abs() > dy.abs() && dx.abs() > SWIPE_THRESHOLD {
        Some(dx > 0.0)
    } else {
        None
    }
}

/// Work the runtime must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The controller moved to a new phase.
    PhaseChanged { from: PhaseKind, to: PhaseKind },
    /// Arm a one-shot timer; deliver `Event::TimerFired(id)` after `after`.
    ScheduleTimer {
        id: TimerId,
        kind: TimerKind,
        after: Duration,
    },
    /// Disarm a timer. Its firing must not be delivered.
    CancelTimer(TimerId),
    /// Scoring finished; the result is available.
    ResultsReady,
}

/// The session-state aggregate: stimuli, current phase, logs and result.
#[derive(Debug, Clone)]
pub struct Experiment {
    participant_id: String,
    started_at: DateTime<Utc>,
    timing: Timing,
    statements: Vec<Statement>,
    phase: Phase,
    log: ResponseLog,
    result: Option<ExperimentResult>,
    next_timer: u64,
}

impl Experiment {
    /// Create an experiment with freshly generated statements.
    pub fn new<R: Rng + ?Sized>(
        participant_id: impl Into<String>,
        timing: Timing,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        let statements = stimuli::generate_statements(rng);
        Self::with_statements(participant_id, timing, started_at, statements)
    }

    /// Create an experiment over a given statement set.
    pub fn with_statements(
        participant_id: impl Into<String>,
        timing: Timing,
        started_at: DateTime<Utc>,
        statements: Vec<Statement>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            started_at,
            timing,
            statements,
            phase: Phase::Intro,
            log: ResponseLog::new(),
            result: None,
            next_timer: 0,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn log(&self) -> &ResponseLog {
        &self.log
    }

    /// The scored result, once the final Stroop block is done.
    pub fn result(&self) -> Option<&ExperimentResult> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Results)
    }

    /// Apply one event at time `now`.
    ///
    /// On error the state is left exactly as it was.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        event: Event,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<Effect>, ControllerError> {
        let name = event.name();
        let mut effects = Vec::new();
        let outcome = match event {
            Event::Start => self.start(now, &mut effects),
            Event::TimerFired(id) => self.timer_fired(id, &mut effects),
            Event::Advance => self.advance(now, rng, &mut effects),
            Event::SubmitMath(answer) => self.submit_math(&answer, rng),
            Event::EditRecall(text) => self.edit_recall(text),
            Event::SubmitRecall => self.submit_recall(rng, &mut effects),
            Event::Recognize(seen) => self.recognize(seen, now, rng, &mut effects),
            Event::Swipe { dx, dy } => {
                if !matches!(self.phase, Phase::Recognition { .. }) {
                    Err(self.reject(name))
                } else if let Some(seen) = swipe_response(dx, dy) {
                    self.recognize(seen, now, rng, &mut effects)
                } else {
                    Ok(())
                }
            }
            Event::ChooseFolder(folder) => self.choose_folder(folder, now, &mut effects),
            Event::BeginStroop => self.begin_stroop(rng, &mut effects),
            Event::AnswerQuestion(_) => self.answer_question(now),
            Event::RespondColor(color) => self.respond_color(color, now, rng, &mut effects),
        };

        match outcome {
            Ok(()) => Ok(effects),
            Err(e) => {
                tracing::debug!(phase = %self.kind(), error = %e, "event rejected");
                Err(e)
            }
        }
    }

    fn start(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) -> Outcome {
        if !matches!(self.phase, Phase::Intro) {
            return Err(self.reject(Event::Start.name()));
        }
        let exposure = self.arm(TimerKind::Exposure, self.timing.exposure, effects);
        self.enter(
            Phase::Encoding {
                index: 0,
                shown_at: now,
                exposure: Some(exposure),
            },
            effects,
        );
        Ok(())
    }

    fn timer_fired(&mut self, id: TimerId, effects: &mut Vec<Effect>) -> Outcome {
        if self.phase.pending_timer() != Some(id) {
            tracing::debug!(%id, phase = %self.kind(), "ignoring stale timer");
            return Ok(());
        }

        match &mut self.phase {
            Phase::Encoding { exposure, index, .. } => {
                tracing::debug!(index = *index, "exposure elapsed");
                *exposure = None;
            }
            Phase::Distractor { remaining, .. } => {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    tracing::info!(
                        answered = self.log.math().len(),
                        "distractor time is up"
                    );
                    self.enter(
                        Phase::Recall {
                            draft: String::new(),
                        },
                        effects,
                    );
                } else {
                    let next = self.arm(TimerKind::Countdown, self.timing.tick, effects);
                    if let Phase::Distractor { countdown, .. } = &mut self.phase {
                        *countdown = next;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn advance<R: Rng + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut R,
        effects: &mut Vec<Effect>,
    ) -> Outcome {
        let Phase::Encoding {
            index,
            shown_at,
            exposure,
        } = self.phase
        else {
            return Err(self.reject(Event::Advance.name()));
        };
        if exposure.is_some() {
            return Err(ControllerError::ExposurePending { index });
        }

        if let Some(statement) = self.statements.get(index) {
            self.log.record_encoding(EncodingRecord {
                statement_id: statement.id,
                statement: statement.text.clone(),
                condition: statement.condition(),
                folder: statement.folder(),
                reading_time: elapsed_ms(shown_at, now),
                timestamp: now.timestamp_millis(),
            });
        }

        let next = index + 1;
        if next < self.statements.len() {
            let exposure = self.arm(TimerKind::Exposure, self.timing.exposure, effects);
            self.phase = Phase::Encoding {
                index: next,
                shown_at: now,
                exposure: Some(exposure),
            };
        } else {
            self.enter_distractor(rng, effects);
        }
        Ok(())
    }

    fn enter_distractor<R: Rng + ?Sized>(&mut self, rng: &mut R, effects: &mut Vec<Effect>) {
        let countdown = self.arm(TimerKind::Countdown, self.timing.tick, effects);
        self.enter(
            Phase::Distractor {
                remaining: self.timing.distractor_ticks,
                problem: stimuli::generate_math_problem(rng),
                countdown,
            },
            effects,
        );
    }

    fn submit_math<R: Rng + ?Sized>(&mut self, answer: &str, rng: &mut R) -> Outcome {
        let Phase::Distractor { problem, .. } = &mut self.phase else {
            return Err(self.reject("submit math"));
        };
        self.log.record_math(MathResult {
            problem: problem.text(),
            correct: problem.check(answer),
        });
        *problem = stimuli::generate_math_problem(rng);
        Ok(())
    }

    fn edit_recall(&mut self, text: String) -> Outcome {
        let Phase::Recall { draft } = &mut self.phase else {
            return Err(self.reject("edit recall"));
        };
        *draft = text;
        Ok(())
    }

    fn submit_recall<R: Rng + ?Sized>(&mut self, rng: &mut R, effects: &mut Vec<Effect>) -> Outcome {
        let Phase::Recall { draft } = &mut self.phase else {
            return Err(self.reject(Event::SubmitRecall.name()));
        };
        let transcript = std::mem::take(draft);
        self.log.record_recall(transcript);

        let items = stimuli::generate_recognition_items(&self.statements, rng);
        self.enter(Phase::Recognition { items, index: 0 }, effects);
        Ok(())
    }

    fn recognize<R: Rng + ?Sized>(
        &mut self,
        responded_seen: bool,
        now: DateTime<Utc>,
        rng: &mut R,
        effects: &mut Vec<Effect>,
    ) -> Outcome {
        let Phase::Recognition { items, index } = &mut self.phase else {
            return Err(self.reject("recognize"));
        };

        if let Some(item) = items.get(*index) {
            self.log.record_recognition(RecognitionResponse {
                item_id: item.id,
                text: item.text.clone(),
                was_seen: item.seen,
                responded_seen,
                correct: item.seen == responded_seen,
                timestamp: now.timestamp_millis(),
            });
        }

        *index += 1;
        if *index >= items.len() {
            let items = stimuli::generate_location_items(&self.statements, rng);
            self.enter(Phase::Location { items, index: 0 }, effects);
        }
        Ok(())
    }

    fn choose_folder(
        &mut self,
        folder: Folder,
        now: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) -> Outcome {
        let Phase::Location { items, index } = &mut self.phase else {
            return Err(self.reject("choose folder"));
        };

        if let Some(item) = items.get(*index) {
            if let Some(actual) = item.folder() {
                self.log.record_location(LocationResponse {
                    statement_id: item.id,
                    statement: item.text.clone(),
                    actual_folder: actual,
                    responded_folder: folder,
                    correct: actual == folder,
                    timestamp: now.timestamp_millis(),
                });
            }
        }

        *index += 1;
        if *index >= items.len() {
            self.enter(Phase::StroopIntro, effects);
        }
        Ok(())
    }

    fn begin_stroop<R: Rng + ?Sized>(&mut self, rng: &mut R, effects: &mut Vec<Effect>) -> Outcome {
        if !matches!(self.phase, Phase::StroopIntro) {
            return Err(self.reject(Event::BeginStroop.name()));
        }
        let trials = stimuli::generate_stroop_block(rng);
        self.enter(Phase::Stroop(StroopState::new(StroopBlock::Hard, trials)), effects);
        Ok(())
    }

    fn answer_question(&mut self, now: DateTime<Utc>) -> Outcome {
        match &mut self.phase {
            Phase::Stroop(state) if state.step == StroopStep::Question => {
                state.step = StroopStep::Trial { started_at: now };
                Ok(())
            }
            _ => Err(self.reject("answer question")),
        }
    }

    fn respond_color<R: Rng + ?Sized>(
        &mut self,
        responded_color: InkColor,
        now: DateTime<Utc>,
        rng: &mut R,
        effects: &mut Vec<Effect>,
    ) -> Outcome {
        let Phase::Stroop(state) = &mut self.phase else {
            return Err(self.reject("respond color"));
        };
        let StroopStep::Trial { started_at } = state.step else {
            return Err(self.reject("respond color"));
        };

        if let Some(trial) = state.trials.get(state.index) {
            self.log.record_stroop(
                state.block,
                StroopResponse {
                    word: trial.word.to_string(),
                    word_type: trial.word_type,
                    color: trial.color,
                    responded_color,
                    correct: responded_color == trial.color,
                    rt: elapsed_ms(started_at, now),
                    question_index: state.question_index,
                },
            );
        }

        state.index += 1;
        if state.index < state.trials.len() {
            if state.index % TRIALS_PER_QUESTION == 0
                && state.question_index + 1 < QUESTIONS_PER_BLOCK
            {
                state.question_index += 1;
                state.step = StroopStep::Question;
            } else {
                state.step = StroopStep::Trial { started_at: now };
            }
            return Ok(());
        }

        let block = state.block;
        match block {
            StroopBlock::Hard => {
                let trials = stimuli::generate_stroop_block(rng);
                self.enter(Phase::Stroop(StroopState::new(StroopBlock::Easy, trials)), effects);
            }
            StroopBlock::Easy => self.finish(now, effects),
        }
        Ok(())
    }

    fn finish(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        if self.result.is_none() {
            self.result = Some(scoring::score(ScoringInput {
                participant_id: &self.participant_id,
                start_time: self.started_at,
                end_time: now,
                statements: &self.statements,
                log: &self.log,
            }));
            effects.push(Effect::ResultsReady);
        }
        self.enter(Phase::Results, effects);
    }

    /// Allocate a timer id and emit the schedule effect for it.
    fn arm(&mut self, kind: TimerKind, after: Duration, effects: &mut Vec<Effect>) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        effects.push(Effect::ScheduleTimer { id, kind, after });
        id
    }

    /// Switch phases. Any timer the old phase still owns is cancelled, and
    /// any timer just armed for the new phase survives.
    fn enter(&mut self, next: Phase, effects: &mut Vec<Effect>) {
        let from = self.kind();
        if let Some(stale) = self.phase.pending_timer() {
            if next.pending_timer() != Some(stale) {
                effects.push(Effect::CancelTimer(stale));
            }
        }
        self.phase = next;
        let to = self.kind();
        tracing::info!(participant = %self.participant_id, %from, %to, "phase changed");
        effects.push(Effect::PhaseChanged { from, to });
    }

    fn reject(&self, event: &'static str) -> ControllerError {
        ControllerError::NotAccepted {
            phase: self.kind(),
            event,
        }
    }
}

type Outcome = Result<(), ControllerError>;
