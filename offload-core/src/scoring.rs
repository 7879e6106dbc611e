//! Scoring engine.
//!
//! [`score`] turns the accumulated response logs and the presented statement
//! set into an [`ExperimentResult`]. It never looks at controller state.
//!
//! Zero-denominator policy: any rate or mean with no contributing trials is
//! reported as `0`. Stored values keep full precision; rounding to 3 decimal
//! places (rates, effects) or 1 decimal place (the millisecond coefficient)
//! happens only when a result is serialized or displayed.

use crate::recorder::{
    EncodingRecord, LocationResponse, MathResult, RecognitionResponse, ResponseLog, StroopData,
    StroopResponse,
};
use crate::stimuli::{Condition, ItemId, Statement, WordType};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// How many leading characters the recall matcher compares.
pub const RECALL_PREFIX_CHARS: usize = 20;

/// Probability of guessing a folder at random.
pub const LOCATION_CHANCE: f64 = 1.0 / 5.0;

/// Google-effect magnitude (ms) below which no difference is reported.
pub const INTERFERENCE_THRESHOLD_MS: f64 = 20.0;

/// Location accuracy above which memory for "where" is reported.
pub const LOCATION_ABOVE_CHANCE: f64 = 0.3;

/// Everything the scoring engine reads.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub participant_id: &'a str,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub statements: &'a [Statement],
    pub log: &'a ResponseLog,
}

/// The final result aggregate. Serializes to the exported result document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResult {
    pub participant_id: String,
    #[serde(serialize_with = "iso_millis")]
    pub start_time: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis")]
    pub end_time: DateTime<Utc>,
    pub free_recall: FreeRecallScore,
    pub recognition: RecognitionScore,
    pub location_memory: LocationScore,
    pub stroop: StroopScore,
    pub raw_data: RawData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeRecallScore {
    pub saved_recalled: usize,
    pub deleted_recalled: usize,
    pub saved_total: usize,
    pub deleted_total: usize,
    /// Deleted recall rate minus saved recall rate.
    #[serde(serialize_with = "fixed3")]
    pub offloading_effect: f64,
}

impl FreeRecallScore {
    pub fn new(
        saved_recalled: usize,
        deleted_recalled: usize,
        saved_total: usize,
        deleted_total: usize,
    ) -> Self {
        Self {
            saved_recalled,
            deleted_recalled,
            saved_total,
            deleted_total,
            offloading_effect: ratio(deleted_recalled, deleted_total)
                - ratio(saved_recalled, saved_total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionScore {
    #[serde(serialize_with = "fixed3")]
    pub saved_hit_rate: f64,
    #[serde(serialize_with = "fixed3")]
    pub deleted_hit_rate: f64,
    #[serde(serialize_with = "fixed3")]
    pub false_alarm_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationScore {
    pub correct: usize,
    pub total: usize,
    #[serde(serialize_with = "fixed3")]
    pub accuracy: f64,
}

impl LocationScore {
    pub fn from_responses(responses: &[LocationResponse]) -> Self {
        let correct = responses.iter().filter(|r| r.correct).count();
        Self {
            correct,
            total: responses.len(),
            accuracy: ratio(correct, responses.len()),
        }
    }
}

/// Mean correct-trial reaction times for one Stroop block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StroopSummary {
    #[serde(rename = "techMeanRT")]
    pub tech_mean_rt: f64,
    #[serde(rename = "neutralMeanRT")]
    pub neutral_mean_rt: f64,
    #[serde(rename = "techN")]
    pub tech_n: usize,
    #[serde(rename = "neutralN")]
    pub neutral_n: usize,
}

impl StroopSummary {
    /// Summarize a block, keeping only correctly answered trials.
    pub fn from_responses(responses: &[StroopResponse]) -> Self {
        let rts = |word_type: WordType| -> Vec<i64> {
            responses
                .iter()
                .filter(|r| r.correct && r.word_type == word_type)
                .map(|r| r.rt)
                .collect()
        };
        let tech = rts(WordType::Tech);
        let neutral = rts(WordType::Neutral);

        Self {
            tech_mean_rt: mean(&tech),
            neutral_mean_rt: mean(&neutral),
            tech_n: tech.len(),
            neutral_n: neutral.len(),
        }
    }

    /// Tech-word cost over neutral words, in ms.
    pub fn interference(&self) -> f64 {
        self.tech_mean_rt - self.neutral_mean_rt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StroopScore {
    pub hard: StroopSummary,
    pub easy: StroopSummary,
    /// Extra tech-word interference after hard priming, in ms.
    #[serde(serialize_with = "fixed1")]
    pub google_effect_ms: f64,
}

impl StroopScore {
    pub fn new(hard: StroopSummary, easy: StroopSummary) -> Self {
        Self {
            hard,
            easy,
            google_effect_ms: hard.interference() - easy.interference(),
        }
    }
}

/// Raw logs carried verbatim into the result document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawData {
    pub encoding_data: Vec<EncodingRecord>,
    pub recalled_statements: String,
    pub recognition_responses: Vec<RecognitionResponse>,
    pub location_responses: Vec<LocationResponse>,
    pub stroop_data: StroopData,
    pub math_results: Vec<MathResult>,
}

impl RawData {
    fn from_log(log: &ResponseLog) -> Self {
        Self {
            encoding_data: log.encoding().to_vec(),
            recalled_statements: log.recall().to_string(),
            recognition_responses: log.recognition().to_vec(),
            location_responses: log.location().to_vec(),
            stroop_data: log.stroop().clone(),
            math_results: log.math().to_vec(),
        }
    }
}

/// Score a completed session.
pub fn score(input: ScoringInput<'_>) -> ExperimentResult {
    let log = input.log;
    let stroop = StroopScore::new(
        StroopSummary::from_responses(&log.stroop().hard),
        StroopSummary::from_responses(&log.stroop().easy),
    );

    let result = ExperimentResult {
        participant_id: input.participant_id.to_string(),
        start_time: input.start_time,
        end_time: input.end_time,
        free_recall: score_free_recall(input.statements, log.recall()),
        recognition: score_recognition(input.statements, log.recognition()),
        location_memory: LocationScore::from_responses(log.location()),
        stroop,
        raw_data: RawData::from_log(log),
    };

    tracing::info!(
        participant = %result.participant_id,
        offloading_effect = result.free_recall.offloading_effect,
        google_effect_ms = result.stroop.google_effect_ms,
        location_accuracy = result.location_memory.accuracy,
        "session scored"
    );

    result
}

/// Split a recall transcript into trimmed, lower-cased, non-blank lines.
pub fn normalize_recall(transcript: &str) -> Vec<String> {
    transcript
        .split('\n')
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Literal prefix matching, in both directions.
///
/// A statement counts as recalled when its first 20 characters appear inside
/// a candidate line, or a candidate's first 20 characters appear inside the
/// statement. Candidates must already be normalized.
pub fn is_recalled(statement: &str, candidates: &[String]) -> bool {
    let target = statement.to_lowercase();
    let target_prefix = prefix(&target, RECALL_PREFIX_CHARS);

    candidates.iter().any(|candidate| {
        candidate.contains(target_prefix)
            || target.contains(prefix(candidate, RECALL_PREFIX_CHARS))
    })
}

/// Count recalled statements per condition.
pub fn score_free_recall(statements: &[Statement], transcript: &str) -> FreeRecallScore {
    let candidates = normalize_recall(transcript);
    let tally = |condition: Condition| {
        let of_condition = statements.iter().filter(|s| s.condition() == condition);
        let total = of_condition.clone().count();
        let recalled = of_condition
            .filter(|s| is_recalled(&s.text, &candidates))
            .count();
        (recalled, total)
    };

    let (saved_recalled, saved_total) = tally(Condition::Saved);
    let (deleted_recalled, deleted_total) = tally(Condition::Deleted);
    FreeRecallScore::new(saved_recalled, deleted_recalled, saved_total, deleted_total)
}

/// Hit rates per condition and the false-alarm rate on lures.
pub fn score_recognition(
    statements: &[Statement],
    responses: &[RecognitionResponse],
) -> RecognitionScore {
    let condition_of = |id: &ItemId| match id {
        ItemId::Statement(sid) => statements.iter().find(|s| s.id == *sid).map(|s| s.condition()),
        ItemId::Novel(_) => None,
    };
    let hit_rate = |condition: Condition| {
        let answered: Vec<_> = responses
            .iter()
            .filter(|r| condition_of(&r.item_id) == Some(condition))
            .collect();
        ratio(answered.iter().filter(|r| r.correct).count(), answered.len())
    };

    let lures: Vec<_> = responses.iter().filter(|r| r.item_id.is_novel()).collect();
    let false_alarms = lures.iter().filter(|r| r.responded_seen).count();

    RecognitionScore {
        saved_hit_rate: hit_rate(Condition::Saved),
        deleted_hit_rate: hit_rate(Condition::Deleted),
        false_alarm_rate: ratio(false_alarms, lures.len()),
    }
}

/// `numerator / denominator`, or 0 when there is nothing to divide by.
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Arithmetic mean, or 0 for an empty sample.
pub fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<i64>() as f64 / values.len() as f64
    }
}

/// Round for display.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Fixed-point text with exactly `places` decimals, as written to the
/// result document.
pub fn format_fixed(value: f64, places: usize) -> String {
    format!("{value:.places$}")
}

fn prefix(s: &str, chars: usize) -> &str {
    match s.char_indices().nth(chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

fn fixed3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_fixed(*value, 3))
}

fn fixed1<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_fixed(*value, 1))
}

fn iso_millis<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

// ============================================================================
// Interpretation
// ============================================================================

/// Direction of the offloading effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffloadingVerdict {
    /// More deleted than saved statements recalled.
    ConsistentWithPrediction,
    OppositeOfPrediction,
    NoDifference,
}

/// Direction of the Stroop Google-effect coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterferenceVerdict {
    MoreAfterHardQuestions,
    MoreAfterEasyQuestions,
    NoMeaningfulDifference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationVerdict {
    AboveChance,
    NearChance,
}

/// Plain-language reading of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpretation {
    pub offloading: OffloadingVerdict,
    pub interference: InterferenceVerdict,
    pub location: LocationVerdict,
}

impl ExperimentResult {
    /// Classify the headline effects. Uses the displayed (rounded) values.
    pub fn interpretation(&self) -> Interpretation {
        let offloading = round_to(self.free_recall.offloading_effect, 3);
        let google = round_to(self.stroop.google_effect_ms, 1);
        let accuracy = round_to(self.location_memory.accuracy, 3);

        Interpretation {
            offloading: if offloading > 0.0 {
                OffloadingVerdict::ConsistentWithPrediction
            } else if offloading < 0.0 {
                OffloadingVerdict::OppositeOfPrediction
            } else {
                OffloadingVerdict::NoDifference
            },
            interference: if google > INTERFERENCE_THRESHOLD_MS {
                InterferenceVerdict::MoreAfterHardQuestions
            } else if google < -INTERFERENCE_THRESHOLD_MS {
                InterferenceVerdict::MoreAfterEasyQuestions
            } else {
                InterferenceVerdict::NoMeaningfulDifference
            },
            location: if accuracy > LOCATION_ABOVE_CHANCE {
                LocationVerdict::AboveChance
            } else {
                LocationVerdict::NearChance
            },
        }
    }
}

impl fmt::Display for OffloadingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OffloadingVerdict::ConsistentWithPrediction => {
                "You remembered MORE 'deleted' items than 'saved' items, consistent with the Google Effect."
            }
            OffloadingVerdict::OppositeOfPrediction => {
                "You remembered MORE 'saved' items, opposite of the Google Effect prediction."
            }
            OffloadingVerdict::NoDifference => "No difference between saved and deleted items.",
        };
        f.write_str(text)
    }
}

impl fmt::Display for InterferenceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InterferenceVerdict::MoreAfterHardQuestions => {
                "Tech words slowed you down more after hard questions: possible Google Effect."
            }
            InterferenceVerdict::MoreAfterEasyQuestions => {
                "Tech words slowed you down more after EASY questions, opposite of prediction."
            }
            InterferenceVerdict::NoMeaningfulDifference => {
                "No meaningful difference in tech word interference between conditions."
            }
        };
        f.write_str(text)
    }
}

impl fmt::Display for LocationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LocationVerdict::AboveChance => {
                "You remembered WHERE information was stored, consistent with transactive memory theory."
            }
            LocationVerdict::NearChance => "Location memory was near chance.",
        };
        f.write_str(text)
    }
}
