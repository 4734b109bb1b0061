//! Every game run through the frame driver

use edu_arcade::sim::{Difficulty, EntityKind, InputSampler, InputSnapshot, Operation};
use edu_arcade::{Bounds, Driver, GameKind, GameTuning, RunState, Stepping, new_mode};

fn driver(kind: GameKind, seed: u64) -> Driver {
    let mode = new_mode(kind, Operation::Addition, Difficulty::Easy, &GameTuning::default());
    let mut driver = Driver::new(mode, seed, Bounds::default());
    driver.start();
    driver
}

fn busy_input(step: u32) -> InputSnapshot {
    InputSnapshot {
        thrust: step % 40 < 10,
        rotate_left: step % 200 < 30,
        fire: step % 3 == 0,
        pointer: Some(glam::Vec2::new(400.0, (step * 7 % 600) as f32)),
        ..Default::default()
    }
}

#[test]
fn test_every_game_runs_and_halts_cleanly() {
    for kind in GameKind::ALL {
        let mut d = driver(kind, 11);
        let mut ran = 0;
        while ran < 3000 && d.step(&busy_input(ran)) {
            ran += 1;
        }

        let state = d.state();
        if !matches!(kind, GameKind::Goalkeeper | GameKind::Tower) {
            assert!(state.score >= 0, "{} score went negative", kind.id());
        }
        if state.is_finished() {
            assert_eq!(d.run_state(), RunState::Stopped);
            assert_eq!(d.pending_timers(), 0);
            assert!(!d.step(&InputSnapshot::default()));
        }
        let state = d.state();
        assert!(state.entities.live_count(EntityKind::Particle) <= state.particle_cap);
    }
}

#[test]
fn test_same_seed_same_session() {
    for kind in GameKind::ALL {
        let mut a = driver(kind, 99);
        let mut b = driver(kind, 99);
        for i in 0..600 {
            a.step(&busy_input(i));
            b.step(&busy_input(i));
        }
        assert_eq!(a.state().score, b.state().score);
        assert_eq!(a.state().counters, b.state().counters);
        assert_eq!(a.state().problem, b.state().problem);
        let positions = |d: &Driver| {
            d.state()
                .entities
                .iter()
                .map(|e| (e.kind, e.pos))
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(&a), positions(&b));
    }
}

#[test]
fn test_paused_frames_do_not_advance() {
    let mut d = driver(GameKind::Defender, 5).with_stepping(Stepping::Fixed);
    let sampler = InputSampler::new();
    assert_eq!(d.frame(0.0, &sampler), 1);
    let ticks = d.state().time_ticks;

    d.pause();
    for i in 1..100 {
        assert_eq!(d.frame(i as f64 * 16.0, &sampler), 0);
    }
    assert_eq!(d.state().time_ticks, ticks);

    d.resume();
    assert_eq!(d.frame(2000.0, &sampler), 1);
    assert_eq!(d.state().time_ticks, ticks + 1);
}

#[test]
fn test_stop_cancels_pending_round() {
    let mut sampler = InputSampler::new();
    let mut d = driver(GameKind::Defender, 3);
    d.frame(0.0, &sampler);

    let state = d.state();
    let answer = state
        .problem
        .as_ref()
        .and_then(|p| p.correct_value())
        .expect("defender deals numeric problems");
    let target = state
        .entities
        .of_kind(EntityKind::Obstacle)
        .find(|e| e.number() == Some(answer))
        .map(|e| e.pos)
        .expect("the answer is on the field");

    sampler.pointer_down(target);
    d.frame(16.0, &sampler);
    assert_eq!(d.state().counters.correct, 1);
    assert_eq!(d.pending_timers(), 1);

    d.stop();
    assert_eq!(d.run_state(), RunState::Stopped);
    assert_eq!(d.pending_timers(), 0);
    assert_eq!(d.frame(32.0, &sampler), 0);
    assert_eq!(d.state().counters.round, 1);
    assert!(!d.state().is_alive());
}
