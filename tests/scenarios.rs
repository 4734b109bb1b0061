//! End-to-end checks of the simulation loop through the public API

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use edu_arcade::Bounds;
use edu_arcade::sim::{
    Answer, Boundary, CollisionRule, Difficulty, Edge, Entity, EntityKind, GameEvent, GameMode,
    GamePhase, GameRules, HitKind, HitTest, InputSnapshot, KindRules, Operation, Outcome, Payload,
    Problem, SimulationState, begin, generate_problem, step,
};

/// A parked ship flying into numbered rocks; the answer is always 12
struct Pilot {
    rules: GameRules,
    /// Where the next round places its rocks, correct one first
    layout: Vec<(Vec2, i64)>,
}

impl Pilot {
    fn new(layout: Vec<(Vec2, i64)>) -> Self {
        let mut rules = GameRules::default();
        rules
            .kinds
            .set(
                EntityKind::Ship,
                KindRules {
                    radius: 10.0,
                    boundary: Boundary::Clamp,
                    consumable: false,
                    ..KindRules::default()
                },
            )
            .set(
                EntityKind::Obstacle,
                KindRules {
                    radius: 20.0,
                    boundary: Boundary::Terminal {
                        edge: Edge::Bottom,
                        inset: 0.0,
                    },
                    ..KindRules::default()
                },
            );
        rules.collisions.push(CollisionRule {
            a: EntityKind::Ship,
            b: EntityKind::Obstacle,
            test: HitTest::Circle,
            kind: HitKind::Answer,
            shared_b: false,
            consume_a: false,
        });
        Self { rules, layout }
    }
}

impl GameMode for Pilot {
    fn name(&self) -> &'static str {
        "pilot"
    }

    fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn setup(&mut self, state: &mut SimulationState) {
        state
            .entities
            .add(Entity::new(EntityKind::Ship, Vec2::new(400.0, 300.0)));
    }

    fn control(&mut self, _state: &mut SimulationState, _input: &InputSnapshot, _dt: f32) {}

    fn next_round(&mut self, state: &mut SimulationState) {
        state.problem = Some(Problem {
            prompt: "3 × 4 = ?".into(),
            answer: Answer::Number(12),
            candidates: self.layout.iter().map(|(_, v)| *v).collect(),
            operands: None,
            tint: None,
            choices: Vec::new(),
        });
        for &(pos, value) in &self.layout {
            state
                .entities
                .add(Entity::new(EntityKind::Obstacle, pos).with_payload(Payload::Number(value)));
        }
        // Later rounds deal their rocks out of reach
        for (pos, _) in self.layout.iter_mut() {
            pos.y = 50.0;
        }
    }
}

fn session(mode: &mut Pilot) -> SimulationState {
    let mut state = SimulationState::new(1, 3, Bounds::default());
    begin(&mut state, mode);
    state
}

fn far(x: f32) -> Vec2 {
    Vec2::new(x, 100.0)
}

#[test]
fn test_multiplication_easy_stays_in_table() {
    let mut rng = Pcg32::seed_from_u64(2024);
    for _ in 0..1000 {
        let problem = generate_problem(Operation::Multiplication, Difficulty::Easy, 5, &mut rng);
        let operands = problem.operands.expect("arithmetic problems carry operands");
        let value = problem.correct_value().expect("numeric answer");
        assert!((1..=81).contains(&value));
        assert_eq!(value, operands.a * operands.b);
        assert!((1..=9).contains(&operands.a) && (1..=9).contains(&operands.b));
        assert_eq!(problem.candidates.len(), 5);
        assert!(problem.candidates.contains(&value));
    }
}

#[test]
fn test_ship_hits_correct_rock_scores_and_deals_new_problem() {
    let mut mode = Pilot::new(vec![
        (Vec2::new(400.0, 300.0), 12),
        (far(100.0), 7),
        (far(300.0), 15),
        (far(600.0), 21),
    ]);
    let mut state = session(&mut mode);
    assert_eq!(state.entities.live_count(EntityKind::Obstacle), 4);
    assert_eq!(state.counters.round, 1);

    step(&mut state, &mut mode, &InputSnapshot::default(), 1.0);

    assert_eq!(state.score, 10);
    assert_eq!(state.counters.correct, 1);
    assert_eq!(state.counters.round, 2);
    assert!(state.problem.is_some());
    assert!(
        state
            .events
            .contains(&GameEvent::RoundStarted { round: 2 })
    );
}

#[test]
fn test_wrong_hit_score_is_floor_clamped() {
    let mut mode = Pilot::new(vec![(far(100.0), 12), (Vec2::new(400.0, 300.0), 9)]);
    let mut state = session(&mut mode);
    state.score = 2;

    step(&mut state, &mut mode, &InputSnapshot::default(), 1.0);

    assert_eq!(state.score, 0);
    assert_eq!(state.counters.consecutive_errors, 1);
    assert_eq!(state.phase, GamePhase::Playing);
}

#[test]
fn test_uncaught_answers_end_the_game() {
    let mut mode = Pilot::new(vec![(far(100.0), 12)]);
    mode.rules.max_misses = Some(2);
    let mut state = session(&mut mode);

    let drop_answer = |state: &mut SimulationState, value: i64| {
        state.entities.add(
            Entity::new(EntityKind::Obstacle, Vec2::new(200.0, 595.0))
                .with_vel(Vec2::new(0.0, 10.0))
                .with_payload(Payload::Number(value)),
        );
    };

    // A distractor falling through costs nothing
    drop_answer(&mut state, 5);
    step(&mut state, &mut mode, &InputSnapshot::default(), 1.0);
    assert_eq!(state.counters.misses, 0);

    drop_answer(&mut state, 12);
    step(&mut state, &mut mode, &InputSnapshot::default(), 1.0);
    assert_eq!(state.counters.misses, 1);
    assert_eq!(state.phase, GamePhase::Playing);

    drop_answer(&mut state, 12);
    step(&mut state, &mut mode, &InputSnapshot::default(), 1.0);
    assert_eq!(state.counters.misses, 2);
    assert_eq!(state.phase, GamePhase::Finished(Outcome::Lost));
    assert!(state.events.contains(&GameEvent::Finished(Outcome::Lost)));
}
