//! Dino runner with an online perceptron pilot.
//!
//! - `game`: fixed-step loop and session state machine
//! - `entity`: rectangles, runner physics, collision
//! - `obstacles`: recycled obstacle pool and spawn scheduler
//! - `control`: control schemes over keyboard or agent sources
//! - `perceptron`: the learning pilot
//! - `draw`: software renderer for the window shell

pub mod config;
pub mod control;
pub mod draw;
pub mod entity;
pub mod error;
pub mod game;
pub mod obstacles;
pub mod perceptron;

pub use config::{GameConfig, Kinematics, SpriteSizes};
pub use control::{Control, ControlSource, Controller, DeviceSource};
pub use error::{DinoError, DinoResult};
pub use game::{Game, GameState};
pub use perceptron::{AgentPhase, AgentRole, Perceptron};

/// Float equality within `1e-5`, for tests.
#[cfg(test)]
pub(crate) fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}
