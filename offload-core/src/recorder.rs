//! Append-only response logs.
//!
//! One log per phase family. Entries are stamped when captured and are never
//! edited or removed; the only writers are the controller's transitions.

use crate::stimuli::{Condition, Folder, InkColor, ItemId, StatementId, StroopBlock, WordType};
use serde::Serialize;

/// A statement being read during encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingRecord {
    pub statement_id: StatementId,
    pub statement: String,
    pub condition: Condition,
    pub folder: Option<Folder>,
    /// Milliseconds between the statement appearing and the participant advancing.
    pub reading_time: i64,
    /// Capture time in epoch milliseconds.
    pub timestamp: i64,
}

/// One submitted distractor answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathResult {
    pub problem: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResponse {
    pub item_id: ItemId,
    pub text: String,
    pub was_seen: bool,
    pub responded_seen: bool,
    pub correct: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub statement_id: StatementId,
    pub statement: String,
    pub actual_folder: Folder,
    pub responded_folder: Folder,
    pub correct: bool,
    pub timestamp: i64,
}

/// One Stroop color judgement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StroopResponse {
    pub word: String,
    pub word_type: WordType,
    pub color: InkColor,
    pub responded_color: InkColor,
    pub correct: bool,
    /// Reaction time in milliseconds, measured from the trial's own onset.
    pub rt: i64,
    /// Index of the priming question that preceded this trial.
    pub question_index: usize,
}

/// Stroop responses split by priming block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StroopData {
    pub hard: Vec<StroopResponse>,
    pub easy: Vec<StroopResponse>,
}

impl StroopData {
    pub fn block(&self, block: StroopBlock) -> &[StroopResponse] {
        match block {
            StroopBlock::Hard => &self.hard,
            StroopBlock::Easy => &self.easy,
        }
    }
}

/// Every behavioral response captured during a session.
#[derive(Debug, Clone, Default)]
pub struct ResponseLog {
    encoding: Vec<EncodingRecord>,
    math: Vec<MathResult>,
    recall: Option<String>,
    recognition: Vec<RecognitionResponse>,
    location: Vec<LocationResponse>,
    stroop: StroopData,
}

impl ResponseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_encoding(&mut self, record: EncodingRecord) {
        tracing::debug!(
            statement = %record.statement_id,
            reading_ms = record.reading_time,
            "encoding recorded"
        );
        self.encoding.push(record);
    }

    pub(crate) fn record_math(&mut self, result: MathResult) {
        tracing::debug!(problem = %result.problem, correct = result.correct, "math answer recorded");
        self.math.push(result);
    }

    /// Store the free-recall transcript. Only the first submission is kept.
    pub(crate) fn record_recall(&mut self, transcript: String) {
        if self.recall.is_some() {
            tracing::warn!("recall transcript already recorded; ignoring resubmission");
            return;
        }
        tracing::debug!(lines = transcript.lines().count(), "recall recorded");
        self.recall = Some(transcript);
    }

    pub(crate) fn record_recognition(&mut self, response: RecognitionResponse) {
        tracing::debug!(item = %response.item_id, correct = response.correct, "recognition recorded");
        self.recognition.push(response);
    }

    pub(crate) fn record_location(&mut self, response: LocationResponse) {
        tracing::debug!(
            statement = %response.statement_id,
            correct = response.correct,
            "location recorded"
        );
        self.location.push(response);
    }

    pub(crate) fn record_stroop(&mut self, block: StroopBlock, response: StroopResponse) {
        tracing::debug!(
            ?block,
            word = %response.word,
            rt = response.rt,
            correct = response.correct,
            "stroop recorded"
        );
        match block {
            StroopBlock::Hard => self.stroop.hard.push(response),
            StroopBlock::Easy => self.stroop.easy.push(response),
        }
    }

    pub fn encoding(&self) -> &[EncodingRecord] {
        &self.encoding
    }

    pub fn math(&self) -> &[MathResult] {
        &self.math
    }

    /// The submitted recall transcript, empty if recall hasn't been submitted.
    pub fn recall(&self) -> &str {
        self.recall.as_deref().unwrap_or("")
    }

    pub fn recognition(&self) -> &[RecognitionResponse] {
        &self.recognition
    }

    pub fn location(&self) -> &[LocationResponse] {
        &self.location
    }

    pub fn stroop(&self) -> &StroopData {
        &self.stroop
    }

    /// Number of correct distractor answers so far.
    pub fn math_correct(&self) -> usize {
        self.math.iter().filter(|r| r.correct).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroop(word: &str, rt: i64) -> StroopResponse {
        StroopResponse {
            word: word.to_string(),
            word_type: WordType::Neutral,
            color: InkColor::Red,
            responded_color: InkColor::Red,
            correct: true,
            rt,
            question_index: 0,
        }
    }

    #[test]
    fn test_stroop_routed_by_block() {
        let mut log = ResponseLog::new();
        log.record_stroop(StroopBlock::Hard, stroop("CHAIR", 500));
        log.record_stroop(StroopBlock::Easy, stroop("PENCIL", 450));
        log.record_stroop(StroopBlock::Easy, stroop("CANDLE", 470));

        assert_eq!(log.stroop().block(StroopBlock::Hard).len(), 1);
        assert_eq!(log.stroop().block(StroopBlock::Easy).len(), 2);
        assert_eq!(log.stroop().easy[1].word, "CANDLE");
    }

    #[test]
    fn test_recall_recorded_once() {
        let mut log = ResponseLog::new();
        assert_eq!(log.recall(), "");
        log.record_recall("first".to_string());
        log.record_recall("second".to_string());
        assert_eq!(log.recall(), "first");
    }

    #[test]
    fn test_math_tally() {
        let mut log = ResponseLog::new();
        log.record_math(MathResult {
            problem: "10 + 10".to_string(),
            correct: true,
        });
        log.record_math(MathResult {
            problem: "11 × 12".to_string(),
            correct: false,
        });
        assert_eq!(log.math().len(), 2);
        assert_eq!(log.math_correct(), 1);
    }

    #[test]
    fn test_record_field_names() {
        let response = stroop("BASKET", 612);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["wordType"], "neutral");
        assert_eq!(value["respondedColor"], "red");
        assert_eq!(value["questionIndex"], 0);
        assert_eq!(value["rt"], 612);
    }
}
