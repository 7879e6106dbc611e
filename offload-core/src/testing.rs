//! Testing utilities for the experiment.
//!
//! This module provides tools for integration testing:
//! - `TestHarness` for scripted sessions on a seeded RNG and manual clock
//! - Simulated timers, so timer effects fire when the clock passes them
//! - Assertion helpers for verifying session state

use crate::clock::{Clock, ManualClock};
use crate::config::ExperimentConfig;
use crate::controller::{Effect, Event, Phase, PhaseKind, QuestionAnswer, StroopStep, TimerId};
use crate::scoring::ExperimentResult;
use crate::session::{ExperimentSession, SessionError};
use crate::stimuli::{Folder, InkColor, RecognitionItem, Statement, StroopTrial};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Seed used by [`TestHarness::new`].
pub const DEFAULT_SEED: u64 = 42;

/// Test harness for running scripted sessions.
///
/// Timers scheduled by the controller are tracked against the manual clock
/// and delivered, in due order, by [`TestHarness::advance`].
pub struct TestHarness {
    /// The session under test.
    pub session: ExperimentSession<ManualClock>,
    /// Shared handle to the session's clock.
    pub clock: ManualClock,
    timers: BTreeMap<TimerId, DateTime<Utc>>,
    history: Vec<Effect>,
}

impl TestHarness {
    /// Create a harness with participant `P-test` and the default seed.
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        let config = ExperimentConfig::new()
            .with_participant_id("P-test")
            .unwrap_or_default()
            .with_seed(seed);
        Self::with_config(config)
    }

    pub fn with_config(config: ExperimentConfig) -> Self {
        let clock = ManualClock::default();
        let session = ExperimentSession::with_clock(config, clock.clone());
        Self {
            session,
            clock,
            timers: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Send an event at the current time and track any timer effects.
    pub fn send(&mut self, event: Event) -> Result<Vec<Effect>, SessionError> {
        let effects = self.session.handle(event)?;
        let now = self.clock.now();
        for effect in &effects {
            match effect {
                Effect::ScheduleTimer { id, after, .. } => {
                    let after = chrono::Duration::milliseconds(after.as_millis() as i64);
                    self.timers.insert(*id, now + after);
                }
                Effect::CancelTimer(id) => {
                    self.timers.remove(id);
                }
                _ => {}
            }
        }
        self.history.extend(effects.iter().cloned());
        Ok(effects)
    }

    /// Move the clock forward, firing every timer that comes due on the way.
    pub fn advance(&mut self, ms: u64) -> Result<(), SessionError> {
        let target = self.clock.now() + chrono::Duration::milliseconds(ms as i64);
        while let Some((id, due)) = self.next_due(target) {
            self.timers.remove(&id);
            self.move_clock_to(due);
            self.send(Event::TimerFired(id))?;
        }
        self.move_clock_to(target);
        Ok(())
    }

    fn next_due(&self, limit: DateTime<Utc>) -> Option<(TimerId, DateTime<Utc>)> {
        self.timers
            .iter()
            .filter(|(_, due)| **due <= limit)
            .min_by_key(|(id, due)| (**due, **id))
            .map(|(id, due)| (*id, *due))
    }

    fn move_clock_to(&self, when: DateTime<Utc>) {
        let gap = (when - self.clock.now()).num_milliseconds();
        if gap > 0 {
            self.clock.advance_ms(gap as u64);
        }
    }

    /// Number of timers scheduled and not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Every effect emitted so far, in order.
    pub fn history(&self) -> &[Effect] {
        &self.history
    }

    pub fn kind(&self) -> PhaseKind {
        self.session.kind()
    }

    pub fn result(&self) -> Option<&ExperimentResult> {
        self.session.result()
    }

    // ========================================================================
    // Scripted phases
    // ========================================================================

    /// Start if needed and read every statement for `reading_ms`.
    pub fn run_encoding(&mut self, reading_ms: u64) -> Result<(), SessionError> {
        if self.kind() == PhaseKind::Intro {
            self.send(Event::Start)?;
        }
        while self.kind() == PhaseKind::Encoding {
            self.advance(reading_ms)?;
            self.send(Event::Advance)?;
        }
        Ok(())
    }

    /// Answer the current distractor problem, right or wrong.
    pub fn answer_math(&mut self, correct: bool) -> Result<(), SessionError> {
        let answer = match self.session.phase() {
            Phase::Distractor { problem, .. } if correct => problem.answer().to_string(),
            Phase::Distractor { problem, .. } => (problem.answer() + 1).to_string(),
            _ => String::new(),
        };
        self.send(Event::SubmitMath(answer))?;
        Ok(())
    }

    /// Answer `answers` problems, then let the countdown run out.
    pub fn run_distractor(&mut self, answers: usize) -> Result<(), SessionError> {
        for i in 0..answers {
            self.answer_math(i % 2 == 0)?;
        }
        let tick = self.session.config().timing.tick.as_millis() as u64;
        while self.kind() == PhaseKind::Distractor {
            self.advance(tick)?;
        }
        Ok(())
    }

    pub fn submit_recall(&mut self, transcript: &str) -> Result<(), SessionError> {
        self.send(Event::EditRecall(transcript.to_string()))?;
        self.send(Event::SubmitRecall)?;
        Ok(())
    }

    /// Answer every recognition item with `respond`.
    pub fn recognize_all(
        &mut self,
        mut respond: impl FnMut(&RecognitionItem) -> bool,
    ) -> Result<(), SessionError> {
        while let Phase::Recognition { items, index } = self.session.phase() {
            let seen = items.get(*index).map(&mut respond).unwrap_or(false);
            self.send(Event::Recognize(seen))?;
        }
        Ok(())
    }

    /// Pick a folder for every location item with `choose`.
    pub fn locate_all(
        &mut self,
        mut choose: impl FnMut(&Statement) -> Folder,
    ) -> Result<(), SessionError> {
        while let Phase::Location { items, index } = self.session.phase() {
            let folder = items.get(*index).map(&mut choose).unwrap_or(Folder::Facts);
            self.send(Event::ChooseFolder(folder))?;
        }
        Ok(())
    }

    /// Run the current Stroop block. `respond` returns the chosen color and
    /// how long the participant takes to choose it.
    pub fn run_stroop_block(
        &mut self,
        mut respond: impl FnMut(&StroopTrial) -> (InkColor, u64),
    ) -> Result<(), SessionError> {
        let block = self.kind();
        while self.kind() == block {
            let Phase::Stroop(state) = self.session.phase() else {
                break;
            };
            let step = state.step;
            match step {
                StroopStep::Question => {
                    self.send(Event::AnswerQuestion(QuestionAnswer::DontKnow))?;
                }
                StroopStep::Trial { .. } => {
                    let Some((color, rt)) = state.current_trial().map(&mut respond) else {
                        break;
                    };
                    self.advance(rt)?;
                    self.send(Event::RespondColor(color))?;
                }
            }
        }
        Ok(())
    }

    /// Play a complete, unremarkable session through to Results.
    pub fn run_to_results(&mut self) -> Result<&ExperimentResult, SessionError> {
        self.run_encoding(3500)?;
        self.run_distractor(4)?;
        self.submit_recall("")?;
        self.recognize_all(|item| item.seen)?;
        self.locate_all(|s| s.folder().unwrap_or(Folder::Facts))?;
        self.send(Event::BeginStroop)?;
        self.run_stroop_block(|t| (t.color, 600))?;
        self.run_stroop_block(|t| (t.color, 550))?;
        Ok(self.finished_result())
    }

    /// The scored result of a finished session.
    ///
    /// Panics, naming the phase the session stopped in, if it has not reached
    /// Results.
    #[track_caller]
    pub fn finished_result(&self) -> &ExperimentResult {
        match self.result() {
            Some(result) => result,
            None => panic!("Expected session to reach results, stopped in {}", self.kind()),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the session is in the given phase.
#[track_caller]
pub fn assert_phase(harness: &TestHarness, kind: PhaseKind) {
    assert_eq!(
        harness.kind(),
        kind,
        "Expected phase {kind}, got {}",
        harness.kind()
    );
}

/// Assert the session has finished and produced a result.
#[track_caller]
pub fn assert_finished(harness: &TestHarness) {
    assert!(harness.session.is_finished(), "Expected session to be finished");
    assert!(harness.result().is_some(), "Expected a scored result");
}

/// Assert no timers are left armed.
#[track_caller]
pub fn assert_no_timers(harness: &TestHarness) {
    assert_eq!(
        harness.pending_timers(),
        0,
        "Expected no pending timers, found {}",
        harness.pending_timers()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_to_results_finishes() {
        let mut harness = TestHarness::new();
        let result = harness.run_to_results().unwrap();
        assert_eq!(result.participant_id, "P-test");
        assert_finished(&harness);
        assert_no_timers(&harness);
    }

    #[test]
    #[should_panic(expected = "stopped in intro")]
    fn test_finished_result_names_unfinished_phase() {
        let harness = TestHarness::new();
        harness.finished_result();
    }
}
