//! Audio reactions to simulation events
//!
//! The simulation never plays sounds itself. It emits [`GameEvent`]s and this
//! module maps them to procedurally generated effects (Web Audio oscillators,
//! no asset files). Every audio failure is logged and ignored.

use crate::sim::{GameEvent, Outcome};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Right answer
    Correct,
    /// Wrong answer
    Wrong,
    /// Something blew up
    Explosion,
    /// Bullet or click shot fired
    Laser,
    /// Engine ignition
    Thrust,
    /// A value slipped past (goal against)
    Miss,
    /// The player's craft crashed
    Crash,
    /// New round dealt
    NewRound,
    Victory,
    GameOver,
}

impl SoundEffect {
    /// Effect for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Correct { .. } => Some(SoundEffect::Correct),
            GameEvent::Incorrect { .. } => Some(SoundEffect::Wrong),
            GameEvent::Explosion { .. } => Some(SoundEffect::Explosion),
            GameEvent::Shot => Some(SoundEffect::Laser),
            GameEvent::Thrust => Some(SoundEffect::Thrust),
            GameEvent::Miss { .. } => Some(SoundEffect::Miss),
            GameEvent::Crash { .. } => Some(SoundEffect::Crash),
            // The first round starts with the session, no fanfare
            GameEvent::RoundStarted { round } if *round > 1 => Some(SoundEffect::NewRound),
            GameEvent::RoundStarted { .. } => None,
            GameEvent::Finished(Outcome::Won) => Some(SoundEffect::Victory),
            GameEvent::Finished(Outcome::Lost) => Some(SoundEffect::GameOver),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;
    use crate::settings::Settings;
    use crate::sim::GameEvent;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx
                && ctx.resume().is_err()
            {
                log::warn!("AudioContext resume failed");
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.set_master_volume(settings.master_volume);
            self.set_sfx_volume(settings.sfx_volume);
            self.set_muted(settings.muted);
        }

        /// Set master volume (0.0 - 1.0)
        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        /// Set SFX volume (0.0 - 1.0)
        pub fn set_sfx_volume(&mut self, vol: f32) {
            self.sfx_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        /// Play the effects for a batch of drained events
        pub fn play_events(&self, events: &[GameEvent]) {
            for effect in events.iter().filter_map(SoundEffect::for_event) {
                self.play(effect);
            }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Correct => self.play_correct(ctx, vol),
                SoundEffect::Wrong => self.play_wrong(ctx, vol),
                SoundEffect::Explosion => self.play_explosion(ctx, vol),
                SoundEffect::Laser => self.play_laser(ctx, vol),
                SoundEffect::Thrust => self.play_thrust(ctx, vol),
                SoundEffect::Miss => self.play_miss(ctx, vol),
                SoundEffect::Crash => self.play_crash(ctx, vol),
                SoundEffect::NewRound => self.play_arpeggio(ctx, vol, &[400.0, 500.0, 600.0, 800.0], 0.1),
                SoundEffect::Victory => {
                    self.play_arpeggio(ctx, vol, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08)
                }
                SoundEffect::GameOver => self.play_game_over(ctx, vol),
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single decaying tone, optionally sweeping to `end_freq`
        fn blip(
            &self,
            ctx: &AudioContext,
            osc_type: OscillatorType,
            (start_freq, end_freq): (f32, f32),
            level: f32,
            delay: f64,
            length: f64,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, start_freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + delay;

            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + length)
                .ok();
            if end_freq != start_freq {
                osc.frequency().set_value_at_time(start_freq, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(end_freq, t + length)
                    .ok();
            }

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + length + 0.05).ok();
        }

        /// Right answer - happy rising ding
        fn play_correct(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [600.0, 800.0, 1000.0].iter().enumerate() {
                self.blip(ctx, OscillatorType::Sine, (*freq, *freq), vol * 0.25, i as f64 * 0.08, 0.15);
            }
        }

        /// Wrong answer - low buzz
        fn play_wrong(&self, ctx: &AudioContext, vol: f32) {
            self.blip(ctx, OscillatorType::Square, (180.0, 120.0), vol * 0.2, 0.0, 0.25);
        }

        /// Explosion - boom with a high crack
        fn play_explosion(&self, ctx: &AudioContext, vol: f32) {
            self.blip(ctx, OscillatorType::Sawtooth, (100.0, 30.0), vol * 0.5, 0.0, 0.4);
            self.blip(ctx, OscillatorType::Square, (1500.0, 1500.0), vol * 0.2, 0.0, 0.1);
        }

        /// Laser - quick falling zap
        fn play_laser(&self, ctx: &AudioContext, vol: f32) {
            self.blip(ctx, OscillatorType::Square, (900.0, 200.0), vol * 0.15, 0.0, 0.12);
        }

        /// Engine ignition - short rumble
        fn play_thrust(&self, ctx: &AudioContext, vol: f32) {
            self.blip(ctx, OscillatorType::Sawtooth, (60.0, 90.0), vol * 0.2, 0.0, 0.2);
        }

        /// Goal against - ominous descend
        fn play_miss(&self, ctx: &AudioContext, vol: f32) {
            self.blip(ctx, OscillatorType::Sine, (300.0, 40.0), vol * 0.4, 0.0, 0.6);
        }

        /// Crash - deep metallic clang
        fn play_crash(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            // Deep bass impact
            self.blip(ctx, OscillatorType::Sine, (80.0, 40.0), vol * 0.5, 0.0, 0.25);

            // Metallic clang stepping down
            if let Some((osc, gain)) = self.create_osc(ctx, 400.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                    .ok();
                osc.frequency().set_value_at_time(400.0, t).ok();
                osc.frequency().set_value_at_time(300.0, t + 0.05).ok();
                osc.frequency().set_value_at_time(200.0, t + 0.1).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.25).ok();
            }
        }

        /// Ascending note sequence (new round, victory)
        fn play_arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], spacing: f64) {
            for (i, freq) in notes.iter().enumerate() {
                self.blip(ctx, OscillatorType::Triangle, (*freq, *freq), vol * 0.3, i as f64 * spacing, 0.3);
            }
        }

        /// Game over - sad descending
        fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
                self.blip(ctx, OscillatorType::Sine, (*freq, *freq), vol * 0.3, i as f64 * 0.2, 0.3);
            }
        }
    }
}
