//! Kinematics and boundary rules
//!
//! Explicit Euler in nominal-step units: `vel += accel * dt`, `pos += vel * dt`.
//! With `dt = 1.0` this is exactly one frame at the nominal 60 Hz rate.

use glam::Vec2;

use super::entity::{Disposal, EntityId, EntityKind, EntityStore, Payload};
use super::rules::{Boundary, Edge, GameRules};
use crate::{Bounds, wrap_coord};

/// An entity that left the field this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub payload: Option<Payload>,
    /// Crossed a terminal line (as opposed to drifting off screen)
    pub terminal: bool,
}

/// Advance every live entity by `dt` nominal steps and apply boundary rules
pub fn integrate(store: &mut EntityStore, rules: &GameRules, bounds: &Bounds, dt: f32) -> Vec<Exit> {
    let mut exits = Vec::new();

    for e in store.iter_mut() {
        if e.is_disposed() {
            continue;
        }
        let kind_rules = rules.kind(e.kind);

        e.vel += e.accel * dt;
        if kind_rules.drag != 1.0 {
            e.vel *= kind_rules.drag.powf(dt);
        }
        e.pos += e.vel * dt;
        e.angle += e.spin * dt;
        e.invulnerable = e.invulnerable.saturating_sub(1);

        if let Some(ttl) = e.ttl {
            let ttl = ttl.saturating_sub(dt.round().max(1.0) as u32);
            e.ttl = Some(ttl);
            if ttl == 0 {
                e.dispose(Disposal::Expired);
                continue;
            }
        }

        match kind_rules.boundary {
            Boundary::None => {}
            Boundary::Wrap { margin } => {
                e.pos.x = wrap_coord(e.pos.x, bounds.min.x, bounds.max.x, margin);
                e.pos.y = wrap_coord(e.pos.y, bounds.min.y, bounds.max.y, margin);
            }
            Boundary::WrapHorizontal { margin } => {
                e.pos.x = wrap_coord(e.pos.x, bounds.min.x, bounds.max.x, margin);
            }
            Boundary::Clamp => {
                e.pos = e.pos.clamp(bounds.min, bounds.max);
            }
            Boundary::Despawn { margin } => {
                let outside = e.pos.x < bounds.min.x - margin
                    || e.pos.x > bounds.max.x + margin
                    || e.pos.y < bounds.min.y - margin
                    || e.pos.y > bounds.max.y + margin;
                if outside {
                    e.dispose(Disposal::OutOfBounds);
                    exits.push(Exit {
                        id: e.id,
                        kind: e.kind,
                        pos: e.pos,
                        payload: e.payload,
                        terminal: false,
                    });
                }
            }
            Boundary::Terminal { edge, inset } => {
                if crossed(e.pos, bounds, edge, inset) {
                    e.dispose(Disposal::Terminal);
                    exits.push(Exit {
                        id: e.id,
                        kind: e.kind,
                        pos: e.pos,
                        payload: e.payload,
                        terminal: true,
                    });
                }
            }
        }
    }

    exits
}

/// Whether `pos` is past the line `inset` pixels inside `edge`
pub fn crossed(pos: Vec2, bounds: &Bounds, edge: Edge, inset: f32) -> bool {
    match edge {
        Edge::Left => pos.x < bounds.min.x + inset,
        Edge::Right => pos.x > bounds.max.x - inset,
        Edge::Top => pos.y < bounds.min.y + inset,
        Edge::Bottom => pos.y > bounds.max.y - inset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Entity;
    use crate::sim::rules::KindRules;
    use proptest::prelude::*;

    fn rules_with(kind: EntityKind, boundary: Boundary, drag: f32) -> GameRules {
        let mut rules = GameRules::default();
        rules.kinds.set(
            kind,
            KindRules {
                radius: 10.0,
                drag,
                boundary,
                consumable: true,
            },
        );
        rules
    }

    #[test]
    fn test_euler_step() {
        let rules = rules_with(EntityKind::Ship, Boundary::None, 1.0);
        let mut store = EntityStore::new();
        let id = store.add(
            Entity::new(EntityKind::Ship, Vec2::new(100.0, 100.0))
                .with_vel(Vec2::new(1.0, 0.0))
                .with_accel(Vec2::new(0.0, 0.5))
                .with_angle(0.0, 0.1),
        );

        integrate(&mut store, &rules, &Bounds::default(), 1.0);
        let e = store.get(id).unwrap();
        // Velocity updates first, then position uses the new velocity
        assert_eq!(e.vel, Vec2::new(1.0, 0.5));
        assert_eq!(e.pos, Vec2::new(101.0, 100.5));
        assert!((e.angle - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_drag() {
        let rules = rules_with(EntityKind::Ship, Boundary::None, 0.99);
        let mut store = EntityStore::new();
        let id = store.add(Entity::new(EntityKind::Ship, Vec2::ZERO).with_vel(Vec2::new(10.0, 0.0)));
        integrate(&mut store, &rules, &Bounds::default(), 1.0);
        assert!((store.get(id).unwrap().vel.x - 9.9).abs() < 1e-4);
    }

    #[test]
    fn test_ttl_expiry() {
        let rules = rules_with(EntityKind::Projectile, Boundary::None, 1.0);
        let mut store = EntityStore::new();
        let id = store.add(Entity::new(EntityKind::Projectile, Vec2::ZERO).with_ttl(2));

        integrate(&mut store, &rules, &Bounds::default(), 1.0);
        assert!(!store.get(id).unwrap().is_disposed());
        integrate(&mut store, &rules, &Bounds::default(), 1.0);
        assert_eq!(store.get(id).unwrap().disposal(), Some(Disposal::Expired));
    }

    #[test]
    fn test_despawn_reports_exit() {
        let rules = rules_with(EntityKind::Obstacle, Boundary::Despawn { margin: 5.0 }, 1.0);
        let mut store = EntityStore::new();
        let id = store.add(
            Entity::new(EntityKind::Obstacle, Vec2::new(-4.0, 50.0)).with_vel(Vec2::new(-2.0, 0.0)),
        );
        let exits = integrate(&mut store, &rules, &Bounds::default(), 1.0);
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].id, id);
        assert!(!exits[0].terminal);
        assert_eq!(store.get(id).unwrap().disposal(), Some(Disposal::OutOfBounds));
    }

    #[test]
    fn test_terminal_line() {
        let rules = rules_with(
            EntityKind::Obstacle,
            Boundary::Terminal {
                edge: Edge::Right,
                inset: 60.0,
            },
            1.0,
        );
        let bounds = Bounds::new(800.0, 600.0);
        let mut store = EntityStore::new();
        store.add(Entity::new(EntityKind::Obstacle, Vec2::new(735.0, 300.0)).with_vel(Vec2::new(4.0, 0.0)));
        assert!(integrate(&mut store, &rules, &bounds, 1.0).is_empty());
        let exits = integrate(&mut store, &rules, &bounds, 1.0);
        assert_eq!(exits.len(), 1);
        assert!(exits[0].terminal);
    }

    #[test]
    fn test_clamp() {
        let rules = rules_with(EntityKind::Keeper, Boundary::Clamp, 1.0);
        let mut store = EntityStore::new();
        let id = store.add(Entity::new(EntityKind::Keeper, Vec2::new(10.0, 590.0)).with_vel(Vec2::new(0.0, 50.0)));
        integrate(&mut store, &rules, &Bounds::new(800.0, 600.0), 1.0);
        assert_eq!(store.get(id).unwrap().pos, Vec2::new(10.0, 600.0));
    }

    #[test]
    fn test_wrap_horizontal_only() {
        let rules = rules_with(EntityKind::Ship, Boundary::WrapHorizontal { margin: 0.0 }, 1.0);
        let mut store = EntityStore::new();
        let id = store.add(Entity::new(EntityKind::Ship, Vec2::new(799.0, -5.0)).with_vel(Vec2::new(3.0, -1.0)));
        integrate(&mut store, &rules, &Bounds::new(800.0, 600.0), 1.0);
        let e = store.get(id).unwrap();
        assert_eq!(e.pos.x, 0.0);
        assert_eq!(e.pos.y, -6.0);
    }

    proptest! {
        #[test]
        fn prop_wrap_reenters_opposite_edge_with_same_velocity(
            x in 0.0f32..800.0,
            y in 0.0f32..600.0,
            vx in -30.0f32..30.0,
            vy in -30.0f32..30.0,
        ) {
            let rules = rules_with(EntityKind::Ship, Boundary::Wrap { margin: 0.0 }, 1.0);
            let bounds = Bounds::new(800.0, 600.0);
            let mut store = EntityStore::new();
            let id = store.add(Entity::new(EntityKind::Ship, Vec2::new(x, y)).with_vel(Vec2::new(vx, vy)));
            integrate(&mut store, &rules, &bounds, 1.0);
            let e = store.get(id).unwrap();

            let nx = x + vx;
            let ny = y + vy;
            let expect_x = if nx > 800.0 { 0.0 } else if nx < 0.0 { 800.0 } else { nx };
            let expect_y = if ny > 600.0 { 0.0 } else if ny < 0.0 { 600.0 } else { ny };
            prop_assert_eq!(e.pos.x, expect_x);
            prop_assert_eq!(e.pos.y, expect_y);
            prop_assert_eq!(e.vel, Vec2::new(vx, vy));
        }
    }
}
