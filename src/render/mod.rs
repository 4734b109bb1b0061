//! Renderer
//!
//! Reads a finished step's [`SimulationState`] and draws it onto a [`Surface`].
//! Drawing never mutates the simulation, so the same state renders the same
//! picture on any backend.

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::games::lander;
use crate::sim::{
    Entity, EntityKind, GamePhase, Outcome, Payload, Problem, Shape, SimulationState,
};

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// 2D drawing backend
pub trait Surface {
    fn clear(&mut self, color: &str);
    /// Global alpha for following draw calls (0.0 - 1.0)
    fn set_alpha(&mut self, alpha: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: &str, width: f32);
    fn fill_polygon(&mut self, points: &[Vec2], color: &str);
    fn stroke_polygon(&mut self, points: &[Vec2], color: &str, width: f32);
    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: &str);
    fn line(&mut self, from: Vec2, to: Vec2, color: &str, width: f32);
    fn text(&mut self, text: &str, pos: Vec2, px: f32, color: &str, align: TextAlign);
}

/// Palette
pub mod colors {
    pub const BACKGROUND: &str = "#0B0E1A";
    pub const FOREGROUND: &str = "#FFFFFF";
    pub const ASTEROID: &str = "#8E8E9E";
    pub const SHIP: &str = "#7FDBFF";
    pub const BULLET: &str = "#FFDC00";
    pub const TERRAIN: &str = "#AAAAAA";
    pub const PLATFORM: &str = "#2ECC40";
    pub const KEEPER: &str = "#FF851B";
    pub const GOAL: &str = "#FFFFFF";
    pub const BLOCK: &str = "#E91E63";
    pub const CHOICE: &str = "#34495E";
    pub const WIN: &str = "#2ECC71";
    pub const LOSE: &str = "#E74C3C";
    /// High contrast replacements
    pub const HC_BACKGROUND: &str = "#000000";
    pub const HC_ASTEROID: &str = "#FFFFFF";
}

/// What to draw besides the entities themselves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub particles: bool,
    pub hud: bool,
    pub high_contrast: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            particles: true,
            hud: true,
            high_contrast: false,
        }
    }
}

impl RenderOptions {
    pub fn from_settings(settings: &crate::Settings) -> Self {
        Self {
            particles: settings.effective_particles(),
            hud: true,
            high_contrast: settings.high_contrast,
        }
    }
}

// === Shape helpers ===

/// Vertices of a regular polygon
pub fn regular_polygon(center: Vec2, radius: f32, sides: u32, rotation: f32) -> Vec<Vec2> {
    let sides = sides.max(3);
    (0..sides)
        .map(|i| center + crate::heading(rotation + TAU * i as f32 / sides as f32) * radius)
        .collect()
}

/// Vertices of a star, alternating outer and inner radius
pub fn star(center: Vec2, outer: f32, inner: f32, points: u32, rotation: f32) -> Vec<Vec2> {
    let points = points.max(2);
    let count = points * 2;
    (0..count)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            center + crate::heading(rotation + TAU * i as f32 / count as f32) * r
        })
        .collect()
}

/// Corners of a `size` rectangle centred on `center`, rotated by `angle`
pub fn rotated_rect(center: Vec2, size: Vec2, angle: f32) -> [Vec2; 4] {
    let (x, y) = (size.x * 0.5, size.y * 0.5);
    let rot = Vec2::from_angle(angle);
    [
        Vec2::new(-x, -y),
        Vec2::new(x, -y),
        Vec2::new(x, y),
        Vec2::new(-x, y),
    ]
    .map(|corner| center + rot.rotate(corner))
}

/// Lumpy outline for an asteroid, stable per entity id
pub fn rock_outline(center: Vec2, radius: f32, rotation: f32, id: u32) -> Vec<Vec2> {
    const SIDES: u32 = 10;
    (0..SIDES)
        .map(|i| {
            // Cheap integer hash so each rock keeps its own silhouette
            let h = id.wrapping_mul(2_654_435_761).wrapping_add(i.wrapping_mul(40_503));
            let bump = 0.8 + (h % 1000) as f32 / 1000.0 * 0.3;
            center + crate::heading(rotation + TAU * i as f32 / SIDES as f32) * radius * bump
        })
        .collect()
}

/// Draw one full frame
pub fn draw(state: &SimulationState, surface: &mut dyn Surface, opts: &RenderOptions) {
    let background = if opts.high_contrast {
        colors::HC_BACKGROUND
    } else {
        colors::BACKGROUND
    };
    surface.clear(background);

    for entity in state.entities.of_kind(EntityKind::Terrain) {
        let (a, b) = lander::segment_ends(entity);
        surface.line(a, b, colors::TERRAIN, 2.0);
    }
    for entity in state.entities.of_kind(EntityKind::Platform) {
        draw_platform(surface, entity);
    }
    let choices = state.problem.as_ref().filter(|p| !p.choices.is_empty());
    for entity in state.entities.of_kind(EntityKind::Obstacle) {
        match choices {
            Some(problem) => draw_choice(surface, entity, problem),
            None => draw_obstacle(surface, entity, opts),
        }
    }
    for entity in state.entities.of_kind(EntityKind::Block) {
        let corners = rotated_rect(entity.pos, entity.size, entity.angle);
        surface.fill_polygon(&corners, colors::BLOCK);
        surface.stroke_polygon(&corners, colors::FOREGROUND, 1.0);
    }
    if let Some(keeper) = state.entities.first(EntityKind::Keeper) {
        draw_keeper(surface, keeper);
    }
    for entity in state.entities.of_kind(EntityKind::Ship) {
        draw_ship(surface, entity, state.time_ticks);
    }
    for entity in state.entities.of_kind(EntityKind::Projectile) {
        surface.fill_circle(entity.pos, 3.0, colors::BULLET);
    }
    if opts.particles {
        for entity in state.entities.of_kind(EntityKind::Particle) {
            surface.set_alpha(entity.life_fraction());
            surface.fill_circle(entity.pos, 2.0, colors::BULLET);
        }
        surface.set_alpha(1.0);
    }

    if opts.hud {
        draw_hud(state, surface);
    }
    if let GamePhase::Finished(outcome) = state.phase {
        draw_finished(state, surface, outcome);
    }
}

fn draw_platform(surface: &mut dyn Surface, platform: &Entity) {
    let half = platform.size.x * 0.5;
    let min = Vec2::new(platform.pos.x - half, platform.pos.y);
    surface.fill_rect(min, Vec2::new(platform.size.x, 4.0), colors::PLATFORM);
    if let Some(value) = platform.number() {
        surface.text(
            &value.to_string(),
            platform.pos + Vec2::new(0.0, 24.0),
            20.0,
            colors::FOREGROUND,
            TextAlign::Center,
        );
    }
}

fn draw_obstacle(surface: &mut dyn Surface, entity: &Entity, opts: &RenderOptions) {
    let radius = entity.size.x.max(1.0);
    match entity.payload {
        Some(Payload::Token { shape, color }) => {
            draw_token(surface, entity.pos, radius, shape, color.css());
        }
        payload => {
            let fill = if opts.high_contrast {
                colors::HC_ASTEROID
            } else {
                colors::ASTEROID
            };
            let outline = rock_outline(entity.pos, radius, entity.angle, entity.id);
            surface.stroke_polygon(&outline, fill, 2.0);
            if let Some(Payload::Number(value)) = payload {
                surface.text(
                    &value.to_string(),
                    entity.pos,
                    (radius * 0.6).clamp(12.0, 28.0),
                    colors::FOREGROUND,
                    TextAlign::Center,
                );
            }
        }
    }
}

/// Answer button for multiple-choice questions
fn draw_choice(surface: &mut dyn Surface, entity: &Entity, problem: &Problem) {
    let min = entity.pos - entity.size * 0.5;
    surface.fill_rect(min, entity.size, colors::CHOICE);
    surface.stroke_polygon(&rotated_rect(entity.pos, entity.size, 0.0), colors::FOREGROUND, 2.0);
    if let Some(value) = entity.number() {
        surface.text(
            &problem.label(value),
            entity.pos + Vec2::new(0.0, 6.0),
            18.0,
            colors::FOREGROUND,
            TextAlign::Center,
        );
    }
}

fn draw_token(surface: &mut dyn Surface, center: Vec2, radius: f32, shape: Shape, color: &str) {
    match shape {
        Shape::Circle => surface.fill_circle(center, radius, color),
        Shape::Square => {
            let side = radius * 1.6;
            surface.fill_rect(center - Vec2::splat(side * 0.5), Vec2::splat(side), color);
        }
        Shape::Triangle => {
            surface.fill_polygon(&regular_polygon(center, radius, 3, -FRAC_PI_2), color)
        }
        Shape::Star => surface.fill_polygon(&star(center, radius, radius * 0.45, 5, -FRAC_PI_2), color),
    }
}

fn draw_keeper(surface: &mut dyn Surface, keeper: &Entity) {
    surface.fill_rect(keeper.pos - keeper.size * 0.5, keeper.size, colors::KEEPER);
}

fn draw_ship(surface: &mut dyn Surface, ship: &Entity, ticks: u64) {
    // Blink while invulnerable
    if ship.invulnerable > 0 && (ticks / 6) % 2 == 0 {
        return;
    }
    let hull = lander::hull_points(ship);
    surface.stroke_polygon(&hull, colors::SHIP, 2.0);
}

fn draw_hud(state: &SimulationState, surface: &mut dyn Surface) {
    let width = state.bounds.width();
    let top = state.bounds.min.y;

    if let Some(problem) = &state.problem {
        let color = problem.tint.map_or(colors::FOREGROUND, |c| c.css());
        let px = if problem.prompt.len() > 32 { 22.0 } else { 32.0 };
        surface.text(
            &problem.prompt,
            Vec2::new(state.bounds.center().x, top + 36.0),
            px,
            color,
            TextAlign::Center,
        );
    }

    surface.text(
        &format!("Score: {}", state.score),
        Vec2::new(state.bounds.min.x + 16.0, top + 24.0),
        18.0,
        colors::FOREGROUND,
        TextAlign::Left,
    );

    let mut status = vec![format!("Round {}", state.counters.round)];
    if state.counters.lives > 0 || state.counters.crashes > 0 {
        status.push(format!("Lives: {}", state.counters.lives));
    }
    if state.entities.first(EntityKind::Platform).is_some() {
        status.push(format!("Fuel: {}", state.counters.fuel.round() as i64));
    }
    let blocks = state.entities.live_count(EntityKind::Block);
    if blocks > 0 {
        status.push(format!("Blocks: {}", blocks));
    }
    if state.counters.misses > 0 {
        status.push(format!("Misses: {}", state.counters.misses));
    }
    for (i, line) in status.iter().enumerate() {
        surface.text(
            line,
            Vec2::new(state.bounds.min.x + width - 16.0, top + 24.0 + i as f32 * 22.0),
            18.0,
            colors::FOREGROUND,
            TextAlign::Right,
        );
    }
}

fn draw_finished(state: &SimulationState, surface: &mut dyn Surface, outcome: Outcome) {
    let center = state.bounds.center();
    surface.set_alpha(0.6);
    surface.fill_rect(state.bounds.min, state.bounds.max - state.bounds.min, colors::HC_BACKGROUND);
    surface.set_alpha(1.0);

    let (title, color) = match outcome {
        Outcome::Won => ("YOU WIN!", colors::WIN),
        Outcome::Lost => ("GAME OVER", colors::LOSE),
    };
    surface.text(title, center, 48.0, color, TextAlign::Center);
    surface.text(
        &format!("Final score: {}", state.score),
        center + Vec2::new(0.0, 48.0),
        24.0,
        colors::FOREGROUND,
        TextAlign::Center,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;
    use crate::sim::{Color, Problem, Target};

    /// Surface that records draw calls
    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear(String),
        Alpha(f32),
        Circle(Vec2, String),
        Polygon(usize, String),
        Rect(Vec2, Vec2, String),
        Line(Vec2, Vec2),
        Text(String, String),
    }

    impl Surface for Recorder {
        fn clear(&mut self, color: &str) {
            self.ops.push(Op::Clear(color.to_string()));
        }
        fn set_alpha(&mut self, alpha: f32) {
            self.ops.push(Op::Alpha(alpha));
        }
        fn fill_circle(&mut self, center: Vec2, _radius: f32, color: &str) {
            self.ops.push(Op::Circle(center, color.to_string()));
        }
        fn stroke_circle(&mut self, center: Vec2, _radius: f32, color: &str, _width: f32) {
            self.ops.push(Op::Circle(center, color.to_string()));
        }
        fn fill_polygon(&mut self, points: &[Vec2], color: &str) {
            self.ops.push(Op::Polygon(points.len(), color.to_string()));
        }
        fn stroke_polygon(&mut self, points: &[Vec2], color: &str, _width: f32) {
            self.ops.push(Op::Polygon(points.len(), color.to_string()));
        }
        fn fill_rect(&mut self, min: Vec2, size: Vec2, color: &str) {
            self.ops.push(Op::Rect(min, size, color.to_string()));
        }
        fn line(&mut self, from: Vec2, to: Vec2, _color: &str, _width: f32) {
            self.ops.push(Op::Line(from, to));
        }
        fn text(&mut self, text: &str, _pos: Vec2, _px: f32, color: &str, _align: TextAlign) {
            self.ops.push(Op::Text(text.to_string(), color.to_string()));
        }
    }

    impl Recorder {
        fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(t, _) => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    fn state() -> SimulationState {
        SimulationState::new(1, 5, Bounds::default())
    }

    #[test]
    fn test_regular_polygon_and_star() {
        let tri = regular_polygon(Vec2::ZERO, 10.0, 3, 0.0);
        assert_eq!(tri.len(), 3);
        assert!((tri[0] - Vec2::new(10.0, 0.0)).length() < 1e-4);

        let s = star(Vec2::ZERO, 10.0, 4.0, 5, 0.0);
        assert_eq!(s.len(), 10);
        assert!((s[1].length() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_rock_outline_is_stable() {
        let a = rock_outline(Vec2::ZERO, 40.0, 0.0, 7);
        let b = rock_outline(Vec2::ZERO, 40.0, 0.0, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.length() >= 32.0 - 1e-3 && p.length() <= 44.0 + 1e-3));
    }

    #[test]
    fn test_numbers_and_hud_are_drawn() {
        let mut s = state();
        s.score = 1200;
        s.counters.round = 3;
        s.entities.add(
            Entity::new(EntityKind::Obstacle, Vec2::new(100.0, 100.0))
                .with_size(Vec2::splat(40.0))
                .with_payload(Payload::Number(42)),
        );
        let mut surface = Recorder::default();
        draw(&s, &mut surface, &RenderOptions::default());

        assert_eq!(surface.ops[0], Op::Clear(colors::BACKGROUND.to_string()));
        let texts = surface.texts();
        assert!(texts.contains(&"42"));
        assert!(texts.contains(&"Score: 1200"));
        assert!(texts.contains(&"Round 3"));
    }

    #[test]
    fn test_prompt_uses_tint() {
        let mut s = state();
        let mut problem = Problem::target(Target::Color(Color::Red));
        problem.tint = Some(Color::Blue);
        s.problem = Some(problem);
        let mut surface = Recorder::default();
        draw(&s, &mut surface, &RenderOptions::default());

        assert!(surface.ops.contains(&Op::Text(
            "Stop everything RED!".to_string(),
            Color::Blue.css().to_string()
        )));
    }

    #[test]
    fn test_particles_respect_options() {
        let mut s = state();
        s.entities
            .add(Entity::new(EntityKind::Particle, Vec2::new(5.0, 5.0)).with_ttl(10));
        let opts = RenderOptions {
            particles: false,
            hud: false,
            high_contrast: false,
        };
        let mut surface = Recorder::default();
        draw(&s, &mut surface, &opts);
        assert_eq!(surface.ops.len(), 1);

        let mut surface = Recorder::default();
        draw(&s, &mut surface, &RenderOptions { particles: true, ..opts });
        assert!(surface.ops.contains(&Op::Circle(Vec2::new(5.0, 5.0), colors::BULLET.to_string())));
        assert_eq!(surface.ops.last(), Some(&Op::Alpha(1.0)));
    }

    #[test]
    fn test_tokens_drawn_by_shape() {
        let mut s = state();
        for shape in Shape::ALL {
            s.entities.add(
                Entity::new(EntityKind::Obstacle, Vec2::new(50.0, 50.0))
                    .with_size(Vec2::splat(25.0))
                    .with_payload(Payload::Token { shape, color: Color::Green }),
            );
        }
        let opts = RenderOptions {
            hud: false,
            ..RenderOptions::default()
        };
        let mut surface = Recorder::default();
        draw(&s, &mut surface, &opts);
        let green = Color::Green.css().to_string();
        assert!(surface.ops.contains(&Op::Circle(Vec2::new(50.0, 50.0), green.clone())));
        assert!(surface.ops.contains(&Op::Polygon(3, green.clone())));
        assert!(surface.ops.contains(&Op::Polygon(10, green.clone())));
        assert!(surface.ops.iter().any(|op| matches!(op, Op::Rect(_, _, c) if *c == green)));
    }

    #[test]
    fn test_choices_and_blocks() {
        let mut s = state();
        s.problem = Some(Problem {
            prompt: "What do bees make?".to_string(),
            answer: crate::sim::Answer::Number(1),
            candidates: vec![0, 1],
            operands: None,
            tint: None,
            choices: vec!["Milk".to_string(), "Honey".to_string()],
        });
        for value in [0, 1] {
            s.entities.add(
                Entity::new(EntityKind::Obstacle, Vec2::new(200.0 + value as f32 * 200.0, 100.0))
                    .with_size(Vec2::new(180.0, 50.0))
                    .with_payload(Payload::Number(value)),
            );
        }
        s.entities.add(
            Entity::new(EntityKind::Block, Vec2::new(400.0, 555.0))
                .with_size(Vec2::new(120.0, 30.0)),
        );
        let mut surface = Recorder::default();
        draw(&s, &mut surface, &RenderOptions::default());

        let texts = surface.texts();
        assert!(texts.contains(&"Milk"));
        assert!(texts.contains(&"Honey"));
        assert!(!texts.contains(&"0"));
        assert!(texts.contains(&"Blocks: 1"));
        assert!(surface.ops.contains(&Op::Polygon(4, colors::BLOCK.to_string())));
        assert!(surface.ops.iter().any(|op| matches!(op, Op::Rect(_, _, c) if c == colors::CHOICE)));
    }

    #[test]
    fn test_rotated_rect_corners() {
        let square = rotated_rect(Vec2::ZERO, Vec2::new(4.0, 2.0), 0.0);
        assert_eq!(square[0], Vec2::new(-2.0, -1.0));
        assert_eq!(square[2], Vec2::new(2.0, 1.0));

        let turned = rotated_rect(Vec2::ZERO, Vec2::new(4.0, 2.0), FRAC_PI_2);
        assert!((turned[1] - Vec2::new(1.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn test_finished_overlay() {
        let mut s = state();
        s.finish(Outcome::Lost);
        let mut surface = Recorder::default();
        draw(&s, &mut surface, &RenderOptions::default());
        assert!(surface.texts().contains(&"GAME OVER"));
    }
}
