//! Read-only projections of the current phase for a frontend.
//!
//! A view borrows from the [`Experiment`] and never changes it. Frontends
//! render whatever [`Experiment::view`] returns and feed participant input
//! back as events.

use crate::controller::{Experiment, Phase, PhaseKind, StroopStep};
use crate::scoring::ExperimentResult;
use crate::stimuli::{Folder, MathProblem, RecognitionItem, Statement, StroopBlock, StroopTrial};

/// Position within a phase's item list, 1-based for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
}

impl Progress {
    fn at(index: usize, total: usize) -> Self {
        Self {
            position: index + 1,
            total,
        }
    }

    /// Fraction of the phase completed once the current item is answered.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.position as f64 / self.total as f64
        }
    }
}

/// What the participant should be looking at right now.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseView<'a> {
    Intro,
    Encoding {
        statement: &'a Statement,
        progress: Progress,
        /// False while the minimum exposure time is still running.
        can_advance: bool,
    },
    Distractor {
        problem: &'a MathProblem,
        remaining_seconds: u32,
        answered: usize,
        correct: usize,
    },
    Recall {
        draft: &'a str,
    },
    Recognition {
        item: &'a RecognitionItem,
        progress: Progress,
    },
    Location {
        statement: &'a Statement,
        folders: &'static [Folder],
        progress: Progress,
    },
    StroopIntro,
    StroopQuestion {
        block: StroopBlock,
        prompt: &'static str,
        question: Progress,
    },
    StroopTrial {
        block: StroopBlock,
        trial: &'a StroopTrial,
        progress: Progress,
    },
    Results {
        result: &'a ExperimentResult,
    },
    /// A list phase whose current index has run past its items. Only
    /// reachable with an empty stimulus set.
    Empty { phase: PhaseKind },
}

impl Experiment {
    /// Project the current phase for display.
    pub fn view(&self) -> PhaseView<'_> {
        let empty = PhaseView::Empty { phase: self.kind() };
        match self.phase() {
            Phase::Intro => PhaseView::Intro,
            Phase::Encoding {
                index, exposure, ..
            } => match self.statements().get(*index) {
                Some(statement) => PhaseView::Encoding {
                    statement,
                    progress: Progress::at(*index, self.statements().len()),
                    can_advance: exposure.is_none(),
                },
                None => empty,
            },
            Phase::Distractor {
                remaining, problem, ..
            } => PhaseView::Distractor {
                problem,
                remaining_seconds: *remaining,
                answered: self.log().math().len(),
                correct: self.log().math_correct(),
            },
            Phase::Recall { draft } => PhaseView::Recall { draft },
            Phase::Recognition { items, index } => match items.get(*index) {
                Some(item) => PhaseView::Recognition {
                    item,
                    progress: Progress::at(*index, items.len()),
                },
                None => empty,
            },
            Phase::Location { items, index } => match items.get(*index) {
                Some(statement) => PhaseView::Location {
                    statement,
                    folders: &Folder::ALL,
                    progress: Progress::at(*index, items.len()),
                },
                None => empty,
            },
            Phase::StroopIntro => PhaseView::StroopIntro,
            Phase::Stroop(state) => match state.step {
                StroopStep::Question => match state.question() {
                    Some(prompt) => PhaseView::StroopQuestion {
                        block: state.block,
                        prompt,
                        question: Progress::at(state.question_index, state.block.questions().len()),
                    },
                    None => empty,
                },
                StroopStep::Trial { .. } => match state.current_trial() {
                    Some(trial) => PhaseView::StroopTrial {
                        block: state.block,
                        trial,
                        progress: Progress::at(state.index, state.trials.len()),
                    },
                    None => empty,
                },
            },
            Phase::Results => match self.result() {
                Some(result) => PhaseView::Results { result },
                None => empty,
            },
        }
    }
}

/// Format a countdown as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::controller::Event;
    use crate::stimuli::{Placement, StatementId};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(120), "2:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(Progress::at(4, 20).fraction(), 0.25);
        assert_eq!(Progress { position: 0, total: 0 }.fraction(), 0.0);
    }

    #[test]
    fn test_encoding_view_tracks_exposure() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = Utc.timestamp_millis_opt(0).unwrap();
        let mut exp = Experiment::new("P1", Timing::default(), now, &mut rng);
        assert_eq!(exp.view(), PhaseView::Intro);

        exp.handle(Event::Start, now, &mut rng).unwrap();
        let PhaseView::Encoding {
            statement,
            progress,
            can_advance,
        } = exp.view()
        else {
            panic!("expected encoding view");
        };
        assert_eq!(statement, &exp.statements()[0]);
        assert_eq!(progress, Progress { position: 1, total: 20 });
        assert!(!can_advance);

        let id = exp.phase().pending_timer().unwrap();
        exp.handle(Event::TimerFired(id), now, &mut rng).unwrap();
        assert!(matches!(
            exp.view(),
            PhaseView::Encoding {
                can_advance: true,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_statement_set_renders_empty() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = Utc.timestamp_millis_opt(0).unwrap();
        let mut exp = Experiment::with_statements("P1", Timing::default(), now, vec![]);

        exp.handle(Event::Start, now, &mut rng).unwrap();
        assert_eq!(
            exp.view(),
            PhaseView::Empty {
                phase: PhaseKind::Encoding
            }
        );
    }

    #[test]
    fn test_no_saved_statements_gives_empty_location() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = Utc.timestamp_millis_opt(0).unwrap();
        let timing = Timing {
            distractor_ticks: 1,
            ..Timing::default()
        };
        let statements = vec![Statement {
            id: StatementId(0),
            text: "Honey never spoils.".to_string(),
            placement: Placement::Deleted,
        }];
        let mut exp = Experiment::with_statements("P1", timing, now, statements);

        exp.handle(Event::Start, now, &mut rng).unwrap();
        while let Some(id) = exp.phase().pending_timer() {
            exp.handle(Event::TimerFired(id), now, &mut rng).unwrap();
            if exp.kind() == PhaseKind::Encoding {
                exp.handle(Event::Advance, now, &mut rng).unwrap();
            }
        }
        exp.handle(Event::SubmitRecall, now, &mut rng).unwrap();
        while exp.kind() == PhaseKind::Recognition {
            exp.handle(Event::Recognize(false), now, &mut rng).unwrap();
        }

        assert_eq!(exp.kind(), PhaseKind::Location);
        assert_eq!(
            exp.view(),
            PhaseView::Empty {
                phase: PhaseKind::Location
            }
        );
    }
}
