//! Problem generation
//!
//! Arithmetic problems with distractor candidates, and the shape/colour
//! targets used by the goalkeeper waves. Everything here is a pure function
//! of its inputs and the RNG passed in.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::entity::Payload;
use crate::consts::{DISTRACTOR_ATTEMPTS, DISTRACTOR_WIDENINGS};

/// Arithmetic operation practised by a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    #[default]
    Multiplication,
    Division,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Addition => "+",
            Operation::Subtraction => "-",
            Operation::Multiplication => "×",
            Operation::Division => "÷",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Addition => "addition",
            Operation::Subtraction => "subtraction",
            Operation::Multiplication => "multiplication",
            Operation::Division => "division",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "addition" | "add" | "+" => Some(Operation::Addition),
            "subtraction" | "sub" | "-" => Some(Operation::Subtraction),
            "multiplication" | "mul" | "x" | "×" => Some(Operation::Multiplication),
            "division" | "div" | "/" | "÷" => Some(Operation::Division),
            _ => None,
        }
    }

    /// Additive operations use wider operand ranges than multiplicative ones
    fn is_additive(&self) -> bool {
        matches!(self, Operation::Addition | Operation::Subtraction)
    }
}

/// Difficulty tier selecting operand ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Inclusive operand range for an operation
    pub fn operand_range(&self, op: Operation) -> (i64, i64) {
        match (self, op.is_additive()) {
            (Difficulty::Easy, false) => (1, 9),
            (Difficulty::Medium, false) => (5, 12),
            (Difficulty::Hard, false) => (10, 20),
            (Difficulty::Easy, true) => (1, 20),
            (Difficulty::Medium, true) => (10, 50),
            (Difficulty::Hard, true) => (20, 100),
        }
    }

    /// Half-width of the distractor offset window
    pub fn distractor_spread(&self) -> i64 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 10,
            Difficulty::Hard => 20,
        }
    }
}

/// Shapes flying at the goalkeeper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Circle, Shape::Square, Shape::Triangle, Shape::Star];

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Star => "star",
        }
    }
}

/// Colours flying at the goalkeeper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    pub fn name(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
        }
    }

    /// CSS colour used by the renderer
    pub fn css(&self) -> &'static str {
        match self {
            Color::Red => "#E74C3C",
            Color::Blue => "#3498DB",
            Color::Green => "#2ECC71",
            Color::Yellow => "#F39C12",
        }
    }
}

/// Which tokens the keeper must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Color(Color),
    Shape(Shape),
    Both(Shape, Color),
}

impl Target {
    pub fn matches(&self, shape: Shape, color: Color) -> bool {
        match *self {
            Target::Color(c) => color == c,
            Target::Shape(s) => shape == s,
            Target::Both(s, c) => shape == s && color == c,
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            Target::Color(c) => format!("Stop everything {}!", c.name().to_uppercase()),
            Target::Shape(s) => format!("Stop every {}!", s.name().to_uppercase()),
            Target::Both(s, c) => format!(
                "Stop the {} {}S!",
                c.name().to_uppercase(),
                s.name().to_uppercase()
            ),
        }
    }
}

/// Goalkeeper wave rotation (colour waves, shape waves, then combined)
pub const GOALKEEPER_WAVES: [Target; 10] = [
    Target::Color(Color::Red),
    Target::Color(Color::Blue),
    Target::Color(Color::Green),
    Target::Shape(Shape::Circle),
    Target::Shape(Shape::Square),
    Target::Shape(Shape::Triangle),
    Target::Both(Shape::Circle, Color::Red),
    Target::Both(Shape::Square, Color::Blue),
    Target::Both(Shape::Star, Color::Yellow),
    Target::Both(Shape::Triangle, Color::Green),
];

/// Expected answer of the current problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Number(i64),
    Target(Target),
}

impl Answer {
    /// Whether an entity payload is the right answer
    pub fn accepts(&self, payload: &Payload) -> bool {
        match (self, payload) {
            (Answer::Number(n), Payload::Number(v)) => n == v,
            (Answer::Target(t), Payload::Token { shape, color }) => t.matches(*shape, *color),
            _ => false,
        }
    }

    pub fn number(&self) -> Option<i64> {
        match self {
            Answer::Number(n) => Some(*n),
            Answer::Target(_) => None,
        }
    }
}

/// Operands of an arithmetic problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operands {
    pub a: i64,
    pub b: i64,
    pub op: Operation,
}

/// The current challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub prompt: String,
    pub answer: Answer,
    /// Shuffled candidate values (correct value included); empty for targets
    pub candidates: Vec<i64>,
    pub operands: Option<Operands>,
    /// Colour to draw the prompt in (None = default)
    #[serde(default)]
    pub tint: Option<Color>,
    /// Answer texts for multiple-choice questions, indexed by candidate value
    #[serde(default)]
    pub choices: Vec<String>,
}

impl Problem {
    /// Problem for a goalkeeper wave target
    pub fn target(target: Target) -> Self {
        Self {
            prompt: target.prompt(),
            answer: Answer::Target(target),
            candidates: Vec::new(),
            operands: None,
            tint: None,
            choices: Vec::new(),
        }
    }

    pub fn correct_value(&self) -> Option<i64> {
        self.answer.number()
    }

    /// Text shown on the carrier of candidate `value`
    pub fn label(&self, value: i64) -> String {
        usize::try_from(value)
            .ok()
            .and_then(|i| self.choices.get(i))
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }
}

/// Draw operands and compute the correct value
///
/// Subtraction draws the subtrahend no larger than the minuend and division
/// builds the dividend from divisor × quotient, so results are always
/// non-negative integers.
pub fn generate_operands<R: Rng + ?Sized>(op: Operation, tier: Difficulty, rng: &mut R) -> (Operands, i64) {
    let (min, max) = tier.operand_range(op);
    match op {
        Operation::Addition => {
            let a = rng.random_range(min..=max);
            let b = rng.random_range(min..=max);
            (Operands { a, b, op }, a + b)
        }
        Operation::Subtraction => {
            let a = rng.random_range(min..=max);
            let b = rng.random_range(min..=a);
            (Operands { a, b, op }, a - b)
        }
        Operation::Multiplication => {
            let a = rng.random_range(min..=max);
            let b = rng.random_range(min..=max);
            (Operands { a, b, op }, a * b)
        }
        Operation::Division => {
            let divisor = rng.random_range(min..=max);
            let quotient = rng.random_range(min..=max);
            (
                Operands {
                    a: divisor * quotient,
                    b: divisor,
                    op,
                },
                quotient,
            )
        }
    }
}

/// Generate a problem with `candidate_count` shuffled candidates (one correct)
pub fn generate_problem<R: Rng + ?Sized>(
    op: Operation,
    tier: Difficulty,
    candidate_count: usize,
    rng: &mut R,
) -> Problem {
    let (operands, answer) = generate_operands(op, tier, rng);
    let mut candidates = distractors(
        answer,
        candidate_count.saturating_sub(1),
        tier.distractor_spread(),
        rng,
    );
    candidates.push(answer);
    candidates.shuffle(rng);

    log::debug!(
        "Problem {} {} {} = {} ({} candidates)",
        operands.a,
        op.symbol(),
        operands.b,
        answer,
        candidates.len()
    );

    Problem {
        prompt: format!("{} {} {} = ?", operands.a, op.symbol(), operands.b),
        answer: Answer::Number(answer),
        candidates,
        operands: Some(operands),
        tint: None,
        choices: Vec::new(),
    }
}

/// Pick `count` distinct, non-negative values near `answer`, none equal to it
pub fn distractors<R: Rng + ?Sized>(answer: i64, count: usize, spread: i64, rng: &mut R) -> Vec<i64> {
    let mut picked = Vec::with_capacity(count);
    extend_distractors(answer, &mut picked, count, spread, rng);
    picked
}

/// Append `extra` more distractors to `picked`, avoiding every value already in it
///
/// Offsets are sampled from `[-spread, spread)`. Each window gets a bounded
/// number of attempts; when it cannot supply enough values the window doubles,
/// and after the last widening the remaining slots take the nearest unused
/// neighbours of `answer`.
pub fn extend_distractors<R: Rng + ?Sized>(
    answer: i64,
    picked: &mut Vec<i64>,
    extra: usize,
    spread: i64,
    rng: &mut R,
) {
    let wanted = picked.len() + extra;
    let usable = |c: i64, picked: &[i64]| c >= 0 && c != answer && !picked.contains(&c);
    let mut window = spread.max(1);

    for _ in 0..=DISTRACTOR_WIDENINGS {
        let mut attempts = 0;
        while picked.len() < wanted && attempts < DISTRACTOR_ATTEMPTS {
            attempts += 1;
            let candidate = answer + rng.random_range(-window..window);
            if usable(candidate, picked.as_slice()) {
                picked.push(candidate);
            }
        }
        if picked.len() == wanted {
            return;
        }
        log::debug!(
            "Distractor window ±{} exhausted for {} ({}/{} picked), widening",
            window,
            answer,
            picked.len(),
            wanted
        );
        window = window.saturating_mul(2);
    }

    let mut k = 1;
    while picked.len() < wanted {
        for candidate in [answer + k, answer - k] {
            if picked.len() < wanted && usable(candidate, picked.as_slice()) {
                picked.push(candidate);
            }
        }
        k += 1;
    }
}

/// Random shape/colour token
pub fn random_token<R: Rng + ?Sized>(rng: &mut R) -> Payload {
    Payload::Token {
        shape: Shape::ALL[rng.random_range(0..Shape::ALL.len())],
        color: Color::ALL[rng.random_range(0..Color::ALL.len())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn op_strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            Just(Operation::Addition),
            Just(Operation::Subtraction),
            Just(Operation::Multiplication),
            Just(Operation::Division),
        ]
    }

    fn tier_strategy() -> impl Strategy<Value = Difficulty> {
        prop_oneof![
            Just(Difficulty::Easy),
            Just(Difficulty::Medium),
            Just(Difficulty::Hard),
        ]
    }

    proptest! {
        #[test]
        fn prop_answers_are_non_negative_and_exact(seed in any::<u64>(), op in op_strategy(), tier in tier_strategy()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let (o, answer) = generate_operands(op, tier, &mut rng);
            prop_assert!(answer >= 0);
            match op {
                Operation::Addition => { prop_assert_eq!(answer, o.a + o.b); }
                Operation::Subtraction => { prop_assert_eq!(answer, o.a - o.b); }
                Operation::Multiplication => { prop_assert_eq!(answer, o.a * o.b); }
                Operation::Division => {
                    prop_assert!(o.b > 0);
                    prop_assert_eq!(o.a % o.b, 0);
                    prop_assert_eq!(answer, o.a / o.b);
                }
            }
        }

        #[test]
        fn prop_distractors_are_distinct(seed in any::<u64>(), answer in 0i64..500, count in 0usize..8, spread in 1i64..25) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let values = distractors(answer, count, spread, &mut rng);
            prop_assert_eq!(values.len(), count);
            for (i, v) in values.iter().enumerate() {
                prop_assert!(*v >= 0);
                prop_assert_ne!(*v, answer);
                prop_assert!(!values[i + 1..].contains(v));
            }
        }

        #[test]
        fn prop_problem_has_exactly_one_correct_candidate(seed in any::<u64>(), op in op_strategy(), tier in tier_strategy(), count in 1usize..7) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = generate_problem(op, tier, count, &mut rng);
            let answer = p.correct_value().unwrap();
            prop_assert_eq!(p.candidates.len(), count);
            prop_assert_eq!(p.candidates.iter().filter(|&&c| c == answer).count(), 1);
        }
    }

    #[test]
    fn test_narrow_range_still_terminates() {
        // Answer 0 with a window of 1 can only ever sample nothing useful
        let mut rng = Pcg32::seed_from_u64(7);
        let values = distractors(0, 6, 1, &mut rng);
        assert_eq!(values.len(), 6);
        assert!(values.iter().all(|&v| v > 0));
    }

    #[test]
    fn test_extend_avoids_taken_values() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut taken = vec![10, 11, 12];
        extend_distractors(13, &mut taken, 2, 5, &mut rng);
        assert_eq!(taken.len(), 5);
        assert!(!taken[3..].iter().any(|v| [10, 11, 12, 13].contains(v)));
        assert_ne!(taken[3], taken[4]);
    }

    #[test]
    fn test_prompt_format() {
        let mut rng = Pcg32::seed_from_u64(1);
        let p = generate_problem(Operation::Division, Difficulty::Easy, 3, &mut rng);
        let o = p.operands.unwrap();
        assert_eq!(p.prompt, format!("{} ÷ {} = ?", o.a, o.b));
    }

    #[test]
    fn test_target_matching() {
        let red = Target::Color(Color::Red);
        assert!(red.matches(Shape::Star, Color::Red));
        assert!(!red.matches(Shape::Star, Color::Blue));

        let both = Target::Both(Shape::Circle, Color::Red);
        assert!(both.matches(Shape::Circle, Color::Red));
        assert!(!both.matches(Shape::Square, Color::Red));

        let answer = Answer::Target(Target::Shape(Shape::Triangle));
        assert!(answer.accepts(&Payload::Token {
            shape: Shape::Triangle,
            color: Color::Green
        }));
        assert!(!answer.accepts(&Payload::Number(3)));
    }

    #[test]
    fn test_parse_round_trip_names() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_str(op.as_str()), Some(op));
        }
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("nope"), None);
    }
}
