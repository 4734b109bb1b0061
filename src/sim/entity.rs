//! Entities and the per-session entity store

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::problem::{Color, Shape};

/// Stable entity identifier (allocated per session, never reused)
pub type EntityId = u32;

/// What an entity is, which selects its physics and collision rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player-controlled craft
    Ship,
    /// Answer-bearing asteroid / flying object
    Obstacle,
    /// Bullet or pointer click shot
    Projectile,
    /// Visual effect, never collides
    Particle,
    /// Pointer-anchored goalkeeper paddle
    Keeper,
    /// Static landing pad
    Platform,
    /// Ground the lander must not touch
    Terrain,
    /// Stackable tower block
    Block,
}

impl EntityKind {
    pub const COUNT: usize = 8;

    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::Ship,
        EntityKind::Obstacle,
        EntityKind::Projectile,
        EntityKind::Particle,
        EntityKind::Keeper,
        EntityKind::Platform,
        EntityKind::Terrain,
        EntityKind::Block,
    ];

    pub fn index(self) -> usize {
        match self {
            EntityKind::Ship => 0,
            EntityKind::Obstacle => 1,
            EntityKind::Projectile => 2,
            EntityKind::Particle => 3,
            EntityKind::Keeper => 4,
            EntityKind::Platform => 5,
            EntityKind::Terrain => 6,
            EntityKind::Block => 7,
        }
    }
}

/// Value an entity carries for answer matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Number(i64),
    Token { shape: Shape, color: Color },
}

/// Why an entity was disposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposal {
    /// Consumed by a collision
    Consumed,
    /// Left the field
    OutOfBounds,
    /// Crossed the terminal line
    Terminal,
    /// Time-to-live ran out
    Expired,
    /// Cleared by round change or game logic
    Cleared,
}

/// A simulated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub accel: Vec2,
    /// Orientation (radians, unnormalized)
    pub angle: f32,
    /// Angular velocity (radians per step)
    pub spin: f32,
    /// Remaining steps before expiry
    pub ttl: Option<u32>,
    /// Initial time-to-live (for fade-out rendering)
    pub ttl_max: Option<u32>,
    pub payload: Option<Payload>,
    /// Render size hint (polygon radius, rect extent)
    pub size: Vec2,
    /// Steps during which collisions ignore this entity
    pub invulnerable: u32,
    disposed: Option<Disposal>,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Vec2) -> Self {
        Self {
            id: 0,
            kind,
            pos,
            vel: Vec2::ZERO,
            accel: Vec2::ZERO,
            angle: 0.0,
            spin: 0.0,
            ttl: None,
            ttl_max: None,
            payload: None,
            size: Vec2::ZERO,
            invulnerable: 0,
            disposed: None,
        }
    }

    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_accel(mut self, accel: Vec2) -> Self {
        self.accel = accel;
        self
    }

    pub fn with_angle(mut self, angle: f32, spin: f32) -> Self {
        self.angle = angle;
        self.spin = spin;
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self.ttl_max = Some(ttl);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Numeric payload, if any
    pub fn number(&self) -> Option<i64> {
        match self.payload {
            Some(Payload::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_some()
    }

    pub fn disposal(&self) -> Option<Disposal> {
        self.disposed
    }

    /// Mark for removal. The first reason sticks; disposal is never undone.
    pub fn dispose(&mut self, reason: Disposal) {
        if self.disposed.is_none() {
            self.disposed = Some(reason);
        }
    }

    /// Remaining life as a fraction (1.0 when no ttl)
    pub fn life_fraction(&self) -> f32 {
        match (self.ttl, self.ttl_max) {
            (Some(ttl), Some(max)) if max > 0 => ttl as f32 / max as f32,
            _ => 1.0,
        }
    }
}

/// Insertion-ordered collection of live entities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: EntityId,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an entity, assigning it a fresh id
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.entities.push(entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Live entities of one kind, in insertion order
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.kind == kind && !e.is_disposed())
    }

    /// First live entity of a kind
    pub fn first(&self, kind: EntityKind) -> Option<&Entity> {
        self.of_kind(kind).next()
    }

    pub fn first_mut(&mut self, kind: EntityKind) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|e| e.kind == kind && !e.is_disposed())
    }

    /// Remove every entity matching the predicate, returning how many were removed
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Entity) -> bool) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| !pred(e));
        before - self.entities.len()
    }

    /// Mark every live entity of a kind as disposed
    pub fn dispose_kind(&mut self, kind: EntityKind, reason: Disposal) {
        for e in self.entities.iter_mut().filter(|e| e.kind == kind) {
            e.dispose(reason);
        }
    }

    /// Drop disposed entities
    pub fn sweep(&mut self) -> usize {
        self.remove_where(Entity::is_disposed)
    }

    pub fn count(&self) -> usize {
        self.entities.len()
    }

    pub fn live_count(&self, kind: EntityKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
