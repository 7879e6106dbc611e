//! Stimulus material and randomized set generation.
//!
//! Every generator takes the random source as a parameter so sessions can
//! be replayed exactly from a seed.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Number of statements shown during encoding.
pub const STATEMENT_COUNT: usize = 20;

/// Number of statements marked as saved (the rest are deleted).
pub const SAVED_COUNT: usize = 10;

/// Number of novel lures mixed into the recognition set.
pub const NOVEL_COUNT: usize = 10;

/// Trivia pool the encoding statements are drawn from.
pub const TRIVIA_STATEMENTS: [&str; 30] = [
    "An ostrich's eye is bigger than its brain.",
    "A jiffy is an actual unit of time equal to 1/100th of a second.",
    "The inventor of the Pringles can is buried in one.",
    "Honey never spoils and 3000-year-old honey is still edible.",
    "A group of flamingos is called a flamboyance.",
    "The shortest war in history lasted 38 minutes.",
    "Bananas are berries, but strawberries are not.",
    "Venus is the only planet that spins clockwise.",
    "A cloud can weigh more than a million pounds.",
    "Octopuses have three hearts and blue blood.",
    "The Eiffel Tower can grow six inches in summer heat.",
    "A sneeze travels at about 100 miles per hour.",
    "Cows have best friends and get stressed when separated.",
    "The unicorn is Scotland's national animal.",
    "Cleopatra lived closer in time to the Moon landing than to the pyramids.",
    "There are more possible chess games than atoms in the universe.",
    "A day on Venus is longer than a year on Venus.",
    "Sharks existed before trees evolved.",
    "Hot water freezes faster than cold water under certain conditions.",
    "The inventor of the frisbee was turned into a frisbee after death.",
    "Wombat droppings are cube-shaped.",
    "The longest hiccuping spree lasted 68 years.",
    "A cockroach can live for weeks without its head.",
    "The dot over the letter i is called a tittle.",
    "Dolphins sleep with one eye open.",
    "The Great Wall of China is not visible from space with naked eye.",
    "Crows can recognize human faces and hold grudges.",
    "A bolt of lightning is five times hotter than the sun's surface.",
    "The human nose can detect over one trillion different scents.",
    "Oxford University is older than the Aztec Empire.",
];

/// Statements never shown during encoding, used as recognition lures.
pub const NOVEL_STATEMENTS: [&str; NOVEL_COUNT] = [
    "Elephants are the only animals that cannot jump.",
    "A goldfish has a memory span of about three months.",
    "The longest English word without a vowel is 'rhythms'.",
    "A hummingbird weighs less than a penny.",
    "The average person walks about 100,000 miles in a lifetime.",
    "Butterflies taste with their feet.",
    "A snail can sleep for three years.",
    "Polar bears have black skin under their white fur.",
    "The moon is slowly drifting away from Earth.",
    "Sloths can hold their breath longer than dolphins.",
];

/// Technology words for the Stroop task.
pub const TECH_WORDS: [&str; 8] = [
    "CLAUDE", "CHATGPT", "GOOGLE", "WIKIPEDIA", "BROWSER", "SEARCH", "ALEXA", "SIRI",
];

/// Neutral control words for the Stroop task.
pub const NEUTRAL_WORDS: [&str; 8] = [
    "PENCIL", "CHAIR", "HAMMER", "BOTTLE", "CARPET", "WINDOW", "BASKET", "CANDLE",
];

/// Priming questions shown before Stroop trials in the hard block.
pub const HARD_QUESTIONS: [&str; 5] = [
    "Did Benjamin Franklin give piano lessons?",
    "Is the atomic number of Zinc 30?",
    "Was the Treaty of Westphalia signed in 1648?",
    "Did Mozart compose exactly 41 symphonies?",
    "Is the capital of Myanmar called Naypyidaw?",
];

/// Priming questions shown before Stroop trials in the easy block.
pub const EASY_QUESTIONS: [&str; 5] = [
    "Is the sky blue on a clear day?",
    "Does water freeze at 0 degrees Celsius?",
    "Is Paris the capital of France?",
    "Do cats have four legs?",
    "Is the sun hot?",
];

/// Whether a statement is designated as externally stored or discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Saved,
    Deleted,
}

impl Condition {
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Saved => "saved",
            Condition::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The virtual folders a saved statement can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Folder {
    Facts,
    Data,
    Info,
    Notes,
    Items,
}

impl Folder {
    /// All folders, in the order they are assigned and offered.
    pub const ALL: [Folder; 5] = [
        Folder::Facts,
        Folder::Data,
        Folder::Info,
        Folder::Notes,
        Folder::Items,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Folder::Facts => "FACTS",
            Folder::Data => "DATA",
            Folder::Info => "INFO",
            Folder::Notes => "NOTES",
            Folder::Items => "ITEMS",
        }
    }

    /// Parse a folder name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Folder> {
        Folder::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a statement ends up. Only saved statements carry a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "condition", content = "folder", rename_all = "lowercase")]
pub enum Placement {
    Saved(Folder),
    Deleted,
}

/// Identifier of an encoding statement, assigned before presentation shuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(pub u32);

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A trivia statement shown during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    pub text: String,
    #[serde(flatten)]
    pub placement: Placement,
}

impl Statement {
    pub fn condition(&self) -> Condition {
        match self.placement {
            Placement::Saved(_) => Condition::Saved,
            Placement::Deleted => Condition::Deleted,
        }
    }

    pub fn folder(&self) -> Option<Folder> {
        match self.placement {
            Placement::Saved(folder) => Some(folder),
            Placement::Deleted => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.placement, Placement::Saved(_))
    }
}

/// Identifier of a recognition item: either a shown statement or a lure.
///
/// Serializes the way the result document expects: statement ids as bare
/// numbers, lures as `"novel_<n>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    Statement(StatementId),
    Novel(u32),
}

impl ItemId {
    pub fn is_novel(&self) -> bool {
        matches!(self, ItemId::Novel(_))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Statement(id) => write!(f, "{id}"),
            ItemId::Novel(n) => write!(f, "novel_{n}"),
        }
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ItemId::Statement(id) => serializer.serialize_u32(id.0),
            ItemId::Novel(_) => serializer.collect_str(self),
        }
    }
}

/// An item in the recognition test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionItem {
    pub id: ItemId,
    pub text: String,
    pub seen: bool,
}

/// Semantic category of a Stroop word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordType {
    Tech,
    Neutral,
}

/// Ink color of a Stroop word, and the response the participant commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InkColor {
    Red,
    Blue,
}

impl InkColor {
    pub const ALL: [InkColor; 2] = [InkColor::Red, InkColor::Blue];

    pub fn name(&self) -> &'static str {
        match self {
            InkColor::Red => "red",
            InkColor::Blue => "blue",
        }
    }

    /// Keyboard shortcut mapping: `e` answers blue, `i` answers red.
    pub fn from_key(key: char) -> Option<InkColor> {
        match key.to_ascii_lowercase() {
            'e' => Some(InkColor::Blue),
            'i' => Some(InkColor::Red),
            _ => None,
        }
    }
}

impl fmt::Display for InkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single colored-word presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StroopTrial {
    pub word: &'static str,
    #[serde(rename = "type")]
    pub word_type: WordType,
    pub color: InkColor,
}

/// Which priming condition a Stroop block runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StroopBlock {
    Hard,
    Easy,
}

impl StroopBlock {
    /// The priming prompts for this block.
    pub fn questions(&self) -> &'static [&'static str; 5] {
        match self {
            StroopBlock::Hard => &HARD_QUESTIONS,
            StroopBlock::Easy => &EASY_QUESTIONS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StroopBlock::Hard => "Block 1: Hard Questions",
            StroopBlock::Easy => "Block 2: Easy Questions",
        }
    }
}

/// Arithmetic operator for distractor problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    pub const ALL: [Operator; 3] = [Operator::Add, Operator::Subtract, Operator::Multiply];

    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '×',
        }
    }
}

/// A two-operand arithmetic problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathProblem {
    pub left: i64,
    pub right: i64,
    pub operator: Operator,
}

impl MathProblem {
    pub fn answer(&self) -> i64 {
        match self.operator {
            Operator::Add => self.left + self.right,
            Operator::Subtract => self.left - self.right,
            Operator::Multiply => self.left * self.right,
        }
    }

    /// Problem text as shown to the participant, e.g. `"12 × 27"`.
    pub fn text(&self) -> String {
        format!("{} {} {}", self.left, self.operator.symbol(), self.right)
    }

    /// Check a raw typed answer.
    ///
    /// The answer is read as the leading integer of the input, so `"220.0"`
    /// or `"220 apples"` both read as 220. Input with no leading integer is
    /// wrong.
    pub fn check(&self, input: &str) -> bool {
        leading_integer(input) == Some(self.answer())
    }
}

/// Optional sign followed by digits, after leading whitespace.
fn leading_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['+', '-']));
    let digits = trimmed[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len() - sign_len);
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

impl fmt::Display for MathProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Draw the 20 encoding statements.
///
/// The first ten drawn are saved (folders assigned cyclically), the rest are
/// deleted, and the combined set is shuffled again so presentation order
/// carries no information about condition.
pub fn generate_statements<R: Rng + ?Sized>(rng: &mut R) -> Vec<Statement> {
    let mut pool = TRIVIA_STATEMENTS;
    pool.shuffle(rng);

    let mut statements: Vec<Statement> = pool
        .iter()
        .take(STATEMENT_COUNT)
        .enumerate()
        .map(|(index, text)| Statement {
            id: StatementId(index as u32),
            text: (*text).to_string(),
            placement: if index < SAVED_COUNT {
                Placement::Saved(Folder::ALL[index % Folder::ALL.len()])
            } else {
                Placement::Deleted
            },
        })
        .collect();

    statements.shuffle(rng);
    statements
}

/// Build the recognition set: every shown statement plus freshly sampled lures.
pub fn generate_recognition_items<R: Rng + ?Sized>(
    statements: &[Statement],
    rng: &mut R,
) -> Vec<RecognitionItem> {
    let mut lures = NOVEL_STATEMENTS;
    lures.shuffle(rng);

    let mut items: Vec<RecognitionItem> = statements
        .iter()
        .map(|s| RecognitionItem {
            id: ItemId::Statement(s.id),
            text: s.text.clone(),
            seen: true,
        })
        .chain(
            lures
                .iter()
                .take(NOVEL_COUNT)
                .enumerate()
                .map(|(i, text)| RecognitionItem {
                    id: ItemId::Novel(i as u32),
                    text: (*text).to_string(),
                    seen: false,
                }),
        )
        .collect();

    items.shuffle(rng);
    items
}

/// Build the location set: the saved statements in a fresh order.
pub fn generate_location_items<R: Rng + ?Sized>(
    statements: &[Statement],
    rng: &mut R,
) -> Vec<Statement> {
    let mut items: Vec<Statement> = statements.iter().filter(|s| s.is_saved()).cloned().collect();
    items.shuffle(rng);
    items
}

/// Build one Stroop block: each word gets an independent random ink color.
pub fn generate_stroop_block<R: Rng + ?Sized>(rng: &mut R) -> Vec<StroopTrial> {
    let words = TECH_WORDS
        .iter()
        .map(|w| (*w, WordType::Tech))
        .chain(NEUTRAL_WORDS.iter().map(|w| (*w, WordType::Neutral)));

    let mut trials: Vec<StroopTrial> = words
        .map(|(word, word_type)| StroopTrial {
            word,
            word_type,
            color: InkColor::ALL[rng.gen_range(0..InkColor::ALL.len())],
        })
        .collect();

    trials.shuffle(rng);
    trials
}

/// Draw a distractor problem with both operands in `[10, 29]`.
pub fn generate_math_problem<R: Rng + ?Sized>(rng: &mut R) -> MathProblem {
    MathProblem {
        left: rng.gen_range(10..=29),
        right: rng.gen_range(10..=29),
        operator: Operator::ALL[rng.gen_range(0..Operator::ALL.len())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_statement_conditions() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let statements = generate_statements(&mut rng);
            assert_eq!(statements.len(), STATEMENT_COUNT);

            let saved: Vec<_> = statements.iter().filter(|s| s.is_saved()).collect();
            assert_eq!(saved.len(), SAVED_COUNT);
            assert!(saved.iter().all(|s| s.folder().is_some()));
            assert!(statements
                .iter()
                .filter(|s| !s.is_saved())
                .all(|s| s.folder().is_none()));
        }
    }

    #[test]
    fn test_folders_assigned_cyclically() {
        let mut rng = StdRng::seed_from_u64(7);
        let statements = generate_statements(&mut rng);
        for folder in Folder::ALL {
            let count = statements.iter().filter(|s| s.folder() == Some(folder)).count();
            assert_eq!(count, 2, "{folder} should hold two statements");
        }
    }

    #[test]
    fn test_statement_texts_unique() {
        let mut rng = StdRng::seed_from_u64(3);
        let statements = generate_statements(&mut rng);
        let texts: HashSet<_> = statements.iter().map(|s| s.text.as_str()).collect();
        let ids: HashSet<_> = statements.iter().map(|s| s.id).collect();
        assert_eq!(texts.len(), STATEMENT_COUNT);
        assert_eq!(ids.len(), STATEMENT_COUNT);
    }

    #[test]
    fn test_recognition_set() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let statements = generate_statements(&mut rng);
            let items = generate_recognition_items(&statements, &mut rng);

            assert_eq!(items.len(), STATEMENT_COUNT + NOVEL_COUNT);
            let ids: HashSet<_> = items.iter().map(|i| i.id).collect();
            assert_eq!(ids.len(), items.len());
            assert_eq!(items.iter().filter(|i| i.seen).count(), STATEMENT_COUNT);
            assert!(items.iter().filter(|i| !i.seen).all(|i| i.id.is_novel()));
        }
    }

    #[test]
    fn test_location_set_is_saved_statements() {
        let mut rng = StdRng::seed_from_u64(11);
        let statements = generate_statements(&mut rng);
        let items = generate_location_items(&statements, &mut rng);

        let expected: HashSet<_> = statements
            .iter()
            .filter(|s| s.is_saved())
            .map(|s| s.id)
            .collect();
        let actual: HashSet<_> = items.iter().map(|s| s.id).collect();
        assert_eq!(items.len(), SAVED_COUNT);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_stroop_block_vocabulary() {
        let mut rng = StdRng::seed_from_u64(5);
        let block = generate_stroop_block(&mut rng);
        assert_eq!(block.len(), 16);
        assert_eq!(block.iter().filter(|t| t.word_type == WordType::Tech).count(), 8);
        let words: HashSet<_> = block.iter().map(|t| t.word).collect();
        assert_eq!(words.len(), 16);
        for t in &block {
            let expected = if TECH_WORDS.contains(&t.word) {
                WordType::Tech
            } else {
                WordType::Neutral
            };
            assert_eq!(t.word_type, expected);
        }
    }

    #[test]
    fn test_stroop_blocks_independent() {
        let mut rng = StdRng::seed_from_u64(42);
        let first = generate_stroop_block(&mut rng);
        let second = generate_stroop_block(&mut rng);
        let key = |b: &[StroopTrial]| {
            b.iter().map(|t| (t.word, t.color)).collect::<Vec<_>>()
        };
        assert_ne!(key(&first), key(&second));
    }

    #[test]
    fn test_math_problem_ranges() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let p = generate_math_problem(&mut rng);
            assert!((10..=29).contains(&p.left));
            assert!((10..=29).contains(&p.right));
        }
    }

    #[test]
    fn test_math_answer_checking() {
        let p = MathProblem {
            left: 12,
            right: 15,
            operator: Operator::Subtract,
        };
        assert_eq!(p.text(), "12 - 15");
        assert!(p.check("-3"));
        assert!(p.check("  -3 "));
        assert!(!p.check("3"));
        assert!(!p.check("minus three"));
        assert!(!p.check(""));

        let m = MathProblem {
            left: 11,
            right: 20,
            operator: Operator::Multiply,
        };
        assert_eq!(m.text(), "11 × 20");
        assert!(m.check("220"));
    }

    #[test]
    fn test_math_answer_reads_leading_integer() {
        let m = MathProblem {
            left: 11,
            right: 20,
            operator: Operator::Multiply,
        };
        assert!(m.check("220.0"));
        assert!(m.check("220 apples"));
        assert!(m.check("+220"));
        assert!(!m.check("2 20"));
        assert!(!m.check(".220"));
        assert!(!m.check("-"));

        let negative = MathProblem {
            left: 10,
            right: 29,
            operator: Operator::Subtract,
        };
        assert!(negative.check(" -19.5"));
        assert!(!negative.check("- 19"));
    }

    #[test]
    fn test_item_id_serialization() {
        let seen = serde_json::to_value(ItemId::Statement(StatementId(4))).unwrap();
        let novel = serde_json::to_value(ItemId::Novel(2)).unwrap();
        assert_eq!(seen, serde_json::json!(4));
        assert_eq!(novel, serde_json::json!("novel_2"));
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(InkColor::from_key('e'), Some(InkColor::Blue));
        assert_eq!(InkColor::from_key('I'), Some(InkColor::Red));
        assert_eq!(InkColor::from_key('x'), None);
        assert_eq!(Folder::from_name(" notes "), Some(Folder::Notes));
        assert_eq!(Folder::from_name("archive"), None);
    }
}
