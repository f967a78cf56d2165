use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DinoError, DinoResult};
use crate::perceptron::DEFAULT_LEARNING_RATE;

/// Reference frame delay (ms) the kinematic constants were tuned at.
const REFERENCE_FRAME_DELAY: f32 = 30.0;

/// Name of the flying archetype in a sprite size table.
pub const FLYER_NAME: &str = "ptero";

/// Name of the runner in a sprite size table.
pub const RUNNER_NAME: &str = "dino";

/// Top-level configuration for a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the play field in pixels
    pub display_width: u32,
    /// Height of the play field in pixels
    pub display_height: u32,
    /// Uniform scale applied to sprite sizes and kinematics
    pub scale: f32,
    /// Milliseconds per tick
    pub frame_delay_ms: u32,
    /// Upper bound for the scroll speed
    pub max_speed: f32,
    /// Step size of the perceptron weight update
    pub learning_rate: f32,
    /// RNG seed for the spawn scheduler; `None` draws one from entropy
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            display_width: 1400,
            display_height: 300,
            scale: 300.0 / 400.0,
            frame_delay_ms: 1000 / 60,
            max_speed: 40.0,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Read a JSON config file; missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> DinoResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DinoResult<()> {
        if self.display_width == 0 || self.display_height == 0 {
            return Err(DinoError::Config(format!(
                "display must be non-empty, got {}x{}",
                self.display_width, self.display_height
            )));
        }
        if !(self.scale > 0.0) {
            return Err(DinoError::Config(format!("scale must be positive, got {}", self.scale)));
        }
        if self.frame_delay_ms == 0 {
            return Err(DinoError::Config("frame delay must be at least 1 ms".into()));
        }
        if !(self.max_speed > 0.0) {
            return Err(DinoError::Config(format!(
                "max speed must be positive, got {}",
                self.max_speed
            )));
        }
        if !(self.learning_rate > 0.0) {
            return Err(DinoError::Config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        let initial_speed = Kinematics::derive(self).initial_speed;
        if initial_speed > self.max_speed {
            return Err(DinoError::Config(format!(
                "initial speed {initial_speed} exceeds max speed {}",
                self.max_speed
            )));
        }
        Ok(())
    }
}

/// Kinematic constants derived from scale and frame delay.
///
/// Velocities scale with `frame_delay / 30` and gravity with its square, so a
/// jump covers the same real-time arc at any tick rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub ground_level: f32,
    pub runner_start_x: f32,
    pub initial_speed: f32,
    pub max_speed: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    pub accel_rate: f32,
    /// Ticks between speed increases
    pub speed_ramp_ticks: u32,
    /// Spawn draw range and minimum spacing between spawns, in ticks
    pub spawn_constant: u32,
    /// Intrinsic horizontal speed of the flying archetype
    pub flyer_speed: f32,
}

impl Kinematics {
    pub fn derive(config: &GameConfig) -> Self {
        let sf = config.scale;
        let fd = config.frame_delay_ms as f32;
        let ratio = fd / REFERENCE_FRAME_DELAY;
        Self {
            ground_level: config.display_height as f32 * 0.9,
            runner_start_x: config.display_width as f32 * 0.1,
            initial_speed: 20.0 * sf * ratio,
            max_speed: config.max_speed,
            jump_velocity: -38.0 * sf * ratio,
            gravity: 3.5 * sf * ratio * ratio,
            accel_rate: 0.1 * sf * ratio,
            speed_ramp_ticks: ((15.0 * REFERENCE_FRAME_DELAY / fd) as u32).max(1),
            spawn_constant: ((25.0 * REFERENCE_FRAME_DELAY / fd) as u32).max(1),
            flyer_speed: -5.0 * sf * ratio,
        }
    }
}

/// Pixel sizes of the runner and every obstacle archetype.
///
/// Obstacle order is preserved; it fixes the archetype indices of the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSizes {
    pub runner: (f32, f32),
    pub obstacles: Vec<(String, (f32, f32))>,
}

impl SpriteSizes {
    /// Raw sprite sheet dimensions scaled by `scale`, truncated to whole pixels.
    pub fn classic(scale: f32) -> Self {
        let px = |w: u32, h: u32| ((w as f32 * scale).floor(), (h as f32 * scale).floor());
        let obstacles = [
            ("cactus1", 49, 99),
            ("cactus2", 150, 99),
            ("cactus3", 99, 99),
            ("cactus4", 33, 71),
            ("cactus5", 67, 71),
            ("cactus6", 101, 71),
            (FLYER_NAME, 91, 79),
        ]
        .into_iter()
        .map(|(name, w, h)| (name.to_string(), px(w, h)))
        .collect();

        Self {
            runner: px(87, 93),
            obstacles,
        }
    }
}
