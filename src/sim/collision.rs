//! Collision detection
//!
//! Two primitives (circle/circle and point/rectangle) driven by the ordered
//! collision rules of the current game. Detection only reports hits; the
//! resolver decides what they mean.

use glam::Vec2;

use super::entity::{EntityId, EntityStore};
use super::rules::{GameRules, HitKind, HitTest};

/// A detected contact between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub a: EntityId,
    pub b: EntityId,
    pub kind: HitKind,
    pub consume_a: bool,
}

/// Circles overlap when their centers are strictly closer than the summed radii
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Point inside a rectangle centered at `center` with full extent `size`, grown by `margin`
#[inline]
pub fn point_in_rect(p: Vec2, center: Vec2, size: Vec2, margin: f32) -> bool {
    let d = (p - center).abs();
    d.x < size.x * 0.5 + margin && d.y < size.y * 0.5 + margin
}

/// Find this step's hits
///
/// Rules are evaluated in order. For each `a` in store order, the first
/// matching `b` in store order wins; both are claimed and skipped for the rest
/// of the step, except that a `shared_b` target stays available.
pub fn detect(store: &EntityStore, rules: &GameRules) -> Vec<Hit> {
    let mut hits = Vec::new();
    let mut claimed: Vec<EntityId> = Vec::new();

    for rule in &rules.collisions {
        let ra = rules.radius(rule.a);
        let rb = rules.radius(rule.b);

        for a in store.of_kind(rule.a) {
            if a.invulnerable > 0 || claimed.contains(&a.id) {
                continue;
            }

            let found = store
                .of_kind(rule.b)
                .filter(|b| b.id != a.id && b.invulnerable == 0)
                .filter(|b| rule.shared_b || !claimed.contains(&b.id))
                .find(|b| match rule.test {
                    HitTest::Circle => circles_overlap(a.pos, ra, b.pos, rb),
                    HitTest::Rect { margin } => point_in_rect(a.pos, b.pos, b.size, margin),
                });

            if let Some(b) = found {
                hits.push(Hit {
                    a: a.id,
                    b: b.id,
                    kind: rule.kind,
                    consume_a: rule.consume_a,
                });
                claimed.push(a.id);
                if !rule.shared_b {
                    claimed.push(b.id);
                }
            }
        }
    }

    hits
}
