//! End-to-end runs through every phase on a seeded session and manual clock.

use offload_core::controller::{Effect, Event, Phase, PhaseKind, TimerKind};
use offload_core::scoring::InterferenceVerdict;
use offload_core::stimuli::{Folder, InkColor, WordType};
use offload_core::testing::{assert_finished, assert_no_timers, assert_phase, TestHarness};
use offload_core::{Clock, ExperimentConfig, Timing};
use std::collections::HashSet;
use std::time::Duration;

#[test]
fn test_full_session_reaches_results() {
    let mut harness = TestHarness::new();
    assert_phase(&harness, PhaseKind::Intro);

    let result = harness.run_to_results().unwrap().clone();
    assert_finished(&harness);
    assert_no_timers(&harness);

    assert_eq!(result.participant_id, "P-test");
    assert_eq!(result.free_recall.saved_total, 10);
    assert_eq!(result.free_recall.deleted_total, 10);
    assert_eq!(result.location_memory.correct, 10);
    assert_eq!(result.location_memory.total, 10);
    assert_eq!(result.recognition.saved_hit_rate, 1.0);
    assert_eq!(result.recognition.false_alarm_rate, 0.0);
    assert_eq!(result.raw_data.encoding_data.len(), 20);
    assert_eq!(result.raw_data.math_results.len(), 4);
    assert_eq!(result.raw_data.stroop_data.hard.len(), 16);
    assert_eq!(result.raw_data.stroop_data.easy.len(), 16);
    assert!(result.end_time > result.start_time);
}

#[test]
fn test_phase_sequence() {
    let mut harness = TestHarness::new();
    harness.run_to_results().unwrap();

    let sequence: Vec<PhaseKind> = harness
        .history()
        .iter()
        .filter_map(|e| match e {
            Effect::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();

    assert_eq!(
        sequence,
        vec![
            PhaseKind::Encoding,
            PhaseKind::Distractor,
            PhaseKind::Recall,
            PhaseKind::Recognition,
            PhaseKind::Location,
            PhaseKind::StroopIntro,
            PhaseKind::StroopHard,
            PhaseKind::StroopEasy,
            PhaseKind::Results,
        ]
    );
}

#[test]
fn test_distractor_runs_full_countdown() {
    let mut harness = TestHarness::new();
    harness.run_encoding(3000).unwrap();
    assert_phase(&harness, PhaseKind::Distractor);

    let entered = harness.clock.now();
    harness.answer_math(true).unwrap();
    harness.advance(119_000).unwrap();
    assert_phase(&harness, PhaseKind::Distractor);
    harness.advance(1_000).unwrap();
    assert_phase(&harness, PhaseKind::Recall);
    assert_eq!((harness.clock.now() - entered).num_milliseconds(), 120_000);
    assert_no_timers(&harness);

    let log = harness.session.experiment().log();
    assert_eq!(log.math().len(), 1);
    assert_eq!(log.math_correct(), 1);
}

#[test]
fn test_exposure_timer_replaced_per_statement() {
    let mut harness = TestHarness::new();
    harness.send(Event::Start).unwrap();

    // Reading slowly on the first statement does not unlock the second early.
    harness.advance(10_000).unwrap();
    harness.send(Event::Advance).unwrap();
    harness.advance(2_999).unwrap();
    assert!(harness.send(Event::Advance).is_err());
    harness.advance(1).unwrap();
    harness.send(Event::Advance).unwrap();

    let exposures = harness
        .history()
        .iter()
        .filter(|e| {
            matches!(
                e,
                Effect::ScheduleTimer {
                    kind: TimerKind::Exposure,
                    ..
                }
            )
        })
        .count();
    assert_eq!(exposures, 3);

    let reading: Vec<i64> = harness
        .session
        .experiment()
        .log()
        .encoding()
        .iter()
        .map(|r| r.reading_time)
        .collect();
    assert_eq!(reading, vec![10_000, 3_000]);
}

#[test]
fn test_recall_scoring_by_prefix() {
    let mut harness = TestHarness::with_seed(9);
    harness.run_encoding(3000).unwrap();
    harness.run_distractor(0).unwrap();

    // The two "The inventor of the ..." statements share a prefix, so either
    // would also count the other.
    let statements: Vec<_> = harness
        .session
        .experiment()
        .statements()
        .iter()
        .filter(|s| !s.text.starts_with("The inventor of the"))
        .cloned()
        .collect();
    let saved: Vec<_> = statements.iter().filter(|s| s.is_saved()).take(3).collect();
    let deleted: Vec<_> = statements.iter().filter(|s| !s.is_saved()).take(7).collect();
    let transcript: Vec<String> = saved
        .iter()
        .chain(deleted.iter())
        .map(|s| s.text.to_uppercase())
        .collect();

    harness.submit_recall(&transcript.join("\n")).unwrap();
    harness.recognize_all(|_| true).unwrap();
    harness.locate_all(|_| Folder::Facts).unwrap();
    harness.send(Event::BeginStroop).unwrap();
    harness.run_stroop_block(|t| (t.color, 500)).unwrap();
    harness.run_stroop_block(|t| (t.color, 500)).unwrap();

    let result = harness.result().unwrap();
    assert_eq!(result.free_recall.saved_recalled, 3);
    assert_eq!(result.free_recall.deleted_recalled, 7);
    assert!((result.free_recall.offloading_effect - 0.4).abs() < 1e-9);
    assert_eq!(result.raw_data.recalled_statements, transcript.join("\n"));
}

#[test]
fn test_recognition_and_location_sets() {
    let mut harness = TestHarness::new();
    harness.run_encoding(3000).unwrap();
    harness.run_distractor(0).unwrap();
    harness.submit_recall("").unwrap();

    let Phase::Recognition { items, .. } = harness.session.phase().clone() else {
        panic!("expected recognition");
    };
    assert_eq!(items.len(), 30);
    let ids: HashSet<String> = items.iter().map(|i| i.id.to_string()).collect();
    assert_eq!(ids.len(), 30);

    harness.recognize_all(|item| !item.seen).unwrap();
    let Phase::Location { items, .. } = harness.session.phase().clone() else {
        panic!("expected location");
    };
    let saved: HashSet<_> = harness
        .session
        .experiment()
        .statements()
        .iter()
        .filter(|s| s.is_saved())
        .map(|s| s.id)
        .collect();
    let located: HashSet<_> = items.iter().map(|s| s.id).collect();
    assert_eq!(saved, located);
}

#[test]
fn test_stroop_interference_result() {
    let mut harness = TestHarness::new();
    harness.run_encoding(3000).unwrap();
    harness.run_distractor(0).unwrap();
    harness.submit_recall("").unwrap();
    harness.recognize_all(|_| false).unwrap();
    harness.locate_all(|_| Folder::Data).unwrap();
    harness.send(Event::BeginStroop).unwrap();

    // Hard block: tech words 650 ms, neutral 600 ms. Easy: 580 / 590.
    harness
        .run_stroop_block(|t| match t.word_type {
            WordType::Tech => (t.color, 650),
            WordType::Neutral => (t.color, 600),
        })
        .unwrap();
    harness
        .run_stroop_block(|t| match t.word_type {
            WordType::Tech => (t.color, 580),
            WordType::Neutral => (t.color, 590),
        })
        .unwrap();

    let result = harness.result().unwrap();
    assert_eq!(result.stroop.hard.tech_mean_rt, 650.0);
    assert_eq!(result.stroop.easy.neutral_mean_rt, 590.0);
    assert!((result.stroop.google_effect_ms - 60.0).abs() < 1e-9);
    assert_eq!(
        result.interpretation().interference,
        InterferenceVerdict::MoreAfterHardQuestions
    );
}

#[test]
fn test_wrong_colors_excluded_from_means() {
    let mut harness = TestHarness::new();
    harness.run_encoding(3000).unwrap();
    harness.run_distractor(0).unwrap();
    harness.submit_recall("").unwrap();
    harness.recognize_all(|_| false).unwrap();
    harness.locate_all(|_| Folder::Data).unwrap();
    harness.send(Event::BeginStroop).unwrap();

    let flip = |c: InkColor| match c {
        InkColor::Red => InkColor::Blue,
        InkColor::Blue => InkColor::Red,
    };
    harness.run_stroop_block(|t| (flip(t.color), 400)).unwrap();
    harness.run_stroop_block(|t| (t.color, 400)).unwrap();

    let result = harness.result().unwrap();
    assert_eq!(result.stroop.hard.tech_n, 0);
    assert_eq!(result.stroop.hard.tech_mean_rt, 0.0);
    assert_eq!(result.stroop.easy.tech_n, 8);
    assert_eq!(result.stroop.easy.neutral_n, 8);
}

#[test]
fn test_short_timing_config() {
    let timing = Timing {
        exposure: Duration::from_millis(100),
        distractor_ticks: 2,
        tick: Duration::from_millis(500),
    };
    let config = ExperimentConfig::new()
        .with_participant_id("fast")
        .unwrap()
        .with_seed(1)
        .with_timing(timing);
    let mut harness = TestHarness::with_config(config);

    harness.run_encoding(100).unwrap();
    harness.advance(999).unwrap();
    assert_phase(&harness, PhaseKind::Distractor);
    harness.advance(1).unwrap();
    assert_phase(&harness, PhaseKind::Recall);
}
