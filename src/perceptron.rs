//! Online perceptron pilot.
//!
//! Every playing tick the pilot looks at the nearest obstacle ahead of the
//! runner, turns its geometry into a feature vector and jumps when the
//! weighted sum is positive. Decisions taken on the ground are remembered as
//! unlabeled trigger points, one slot for "jumped" and one for "passed".
//! Nothing is learned while the runner survives. On death the slot judged
//! responsible gets a label and a single gradient step is applied:
//!
//! - died on the ground: it should have jumped, so the last pass point is
//!   pushed towards jumping;
//! - died in the air while rising (`dy <= 0`): the last jump point is pushed
//!   towards jumping sooner;
//! - died in the air while falling: the last jump point is pushed away from
//!   jumping.
//!
//! Afterwards both slots are cleared and a one-shot restart is raised.

use tracing::{debug, info};

use crate::control::ControlSource;
use crate::entity::Entity;
use crate::game::GameState;

pub const FEATURES: usize = 6;

pub type Features = [f32; FEATURES];

/// Learning rate used when none is configured.
pub const DEFAULT_LEARNING_RATE: f32 = 0.0001;

/// What the pilot can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    /// Read-once request to start the next session
    Restart,
    /// Current jump decision
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    /// No session running
    Idle,
    /// Playing, nothing ahead of the runner
    Armed,
    /// Playing and tracking an obstacle
    Observing,
}

/// Most recent grounded decision of each kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerBuffer {
    pub jump: Option<Features>,
    pub pass: Option<Features>,
}

impl TriggerBuffer {
    pub fn clear(&mut self) {
        self.jump = None;
        self.pass = None;
    }
}

/// The first obstacle, in spawn order, whose right edge is still ahead of
/// the runner's left edge.
pub fn tracked_obstacle(state: &GameState) -> Option<&Entity> {
    let runner_left = state.runner.hitbox().left;
    state
        .active_obstacles()
        .find(|obstacle| obstacle.hitbox().right() - runner_left > 0.0)
}

/// `[gap_x, gap_y, gap_y², width, height, relative_speed]` for `obstacle`.
pub fn build_features(obstacle: &Entity, state: &GameState) -> Features {
    let hitbox = obstacle.hitbox();
    let gap_x = hitbox.right() - state.runner.hitbox().left;
    let gap_y = state.ground_level - hitbox.bottom;
    [
        gap_x,
        gap_y,
        gap_y * gap_y,
        hitbox.width,
        hitbox.height,
        state.game_speed - obstacle.base_speed.0,
    ]
}

#[derive(Debug, Clone)]
pub struct Perceptron {
    weights: Features,
    learning_rate: f32,
    decision: bool,
    triggers: TriggerBuffer,
    phase: AgentPhase,
    restart: bool,
    deaths: u32,
}

impl Perceptron {
    pub fn new(learning_rate: f32) -> Self {
        Self::with_weights([0.0; FEATURES], learning_rate)
    }

    pub fn with_weights(weights: Features, learning_rate: f32) -> Self {
        Self {
            weights,
            learning_rate,
            decision: false,
            triggers: TriggerBuffer::default(),
            phase: AgentPhase::Idle,
            restart: false,
            deaths: 0,
        }
    }

    pub fn weights(&self) -> &Features {
        &self.weights
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn triggers(&self) -> &TriggerBuffer {
        &self.triggers
    }

    pub fn decision(&self) -> bool {
        self.decision
    }

    /// Jump iff `w · x > 0`.
    pub fn decide(&self, x: &[f32]) -> bool {
        let y: f32 = self.weights.iter().zip(x).map(|(w, x)| w * x).sum();
        y > 0.0
    }

    /// `w[i] += label * lr * x[i]`. An empty vector leaves the weights alone.
    pub fn update_weights(&mut self, x: &[f32], label: f32) {
        if x.is_empty() {
            return;
        }
        let step = label * self.learning_rate;
        for (w, x) in self.weights.iter_mut().zip(x) {
            *w += step * x;
        }
        debug!(label, weights = ?self.weights, "weights updated");
    }

    /// Read-once restart request.
    pub fn take_restart(&mut self) -> bool {
        std::mem::take(&mut self.restart)
    }

    /// Per-tick hook: decide while playing, learn once the runner has died.
    pub fn observe(&mut self, state: &GameState) {
        if state.playing {
            self.track(state);
        } else if !state.runner.alive {
            self.on_death(state);
        }
    }

    fn track(&mut self, state: &GameState) {
        let Some(obstacle) = tracked_obstacle(state) else {
            self.decision = false;
            self.phase = AgentPhase::Armed;
            return;
        };
        self.phase = AgentPhase::Observing;

        let x = build_features(obstacle, state);
        self.decision = self.decide(&x);
        if state.runner_on_ground {
            if self.decision {
                self.triggers.jump = Some(x);
            } else {
                self.triggers.pass = Some(x);
            }
        }
    }

    fn on_death(&mut self, state: &GameState) {
        if !state.paused_for_learning {
            self.deaths += 1;
            let (slot, label) = if state.runner_on_ground {
                (self.triggers.pass, 1.0)
            } else if state.runner.dy <= 0.0 {
                (self.triggers.jump, 1.0)
            } else {
                (self.triggers.jump, -1.0)
            };
            info!(
                deaths = self.deaths,
                score = state.score,
                jumped = !state.runner_on_ground,
                weights = ?self.weights,
                "pilot died"
            );
            if let Some(x) = slot {
                self.update_weights(&x, label);
            }
        }

        self.triggers.clear();
        self.decision = false;
        self.phase = AgentPhase::Idle;
        self.restart = true;
    }
}

impl Default for Perceptron {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE)
    }
}

impl ControlSource for Perceptron {
    type Key = AgentRole;

    fn refresh(&mut self, state: &GameState) {
        self.observe(state);
    }

    fn source(&mut self, key: &AgentRole) -> bool {
        match key {
            AgentRole::Restart => self.take_restart(),
            AgentRole::Jump => self.decision,
        }
    }

    fn follows_game(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, SpriteSizes};
    use crate::approx_eq;
    use crate::game::Game;

    fn playing_state() -> GameState {
        let config = GameConfig {
            scale: 1.0,
            frame_delay_ms: 30,
            seed: Some(9),
            ..GameConfig::default()
        };
        let mut state = Game::new(config, &SpriteSizes::classic(1.0)).unwrap().state().clone();
        state.playing = true;
        state
    }

    fn dead(mut state: GameState) -> GameState {
        state.playing = false;
        state.runner.alive = false;
        state
    }

    #[test]
    fn test_zero_weights_never_jump() {
        let p = Perceptron::default();
        assert!(!p.decide(&[10.0, 20.0, 400.0, 30.0, 90.0, 5.0]));
    }

    #[test]
    fn test_update_is_linear() {
        let mut p = Perceptron::with_weights([0.5, -1.0, 0.0, 2.0, 0.25, -0.75], 0.01);
        let before = *p.weights();
        let x = [10.0, 20.0, 400.0, 30.0, 90.0, 5.0];
        p.update_weights(&x, -1.0);
        for i in 0..FEATURES {
            let expected = before[i] + -1.0 * 0.01 * x[i];
            assert!(approx_eq(p.weights()[i], expected));
        }
        p.update_weights(&x, 1.0);
        for i in 0..FEATURES {
            assert!(approx_eq(p.weights()[i], before[i]));
        }
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut p = Perceptron::with_weights([1.0; FEATURES], 0.1);
        p.update_weights(&[], 1.0);
        assert_eq!(p.weights(), &[1.0; FEATURES]);
    }

    #[test]
    fn test_restart_is_read_once() {
        let mut p = Perceptron::default();
        p.observe(&dead(playing_state()));
        assert!(p.source(&AgentRole::Restart));
        assert!(!p.source(&AgentRole::Restart));
    }

    #[test]
    fn test_no_obstacle_clears_decision() {
        let mut p = Perceptron::with_weights([1.0; FEATURES], 0.1);
        p.decision = true;
        p.observe(&playing_state());
        assert!(!p.decision());
        assert_eq!(p.phase(), AgentPhase::Armed);
        assert_eq!(p.triggers(), &TriggerBuffer::default());
    }

    #[test]
    fn test_tracks_first_obstacle_ahead() {
        let mut state = playing_state();
        let ground = state.ground_level;
        // passed obstacle, then two ahead in spawn order
        state.obstacles.activate(0, 10.0, ground);
        state.obstacles.activate(3, 900.0, ground);
        state.obstacles.activate(1, 500.0, ground);

        let tracked = tracked_obstacle(&state).unwrap();
        assert_eq!(tracked.name, "cactus4");
    }

    #[test]
    fn test_features_for_ground_obstacle() {
        let mut state = playing_state();
        let ground = state.ground_level;
        state.obstacles.activate(0, 400.0, ground);
        let obstacle = tracked_obstacle(&state).unwrap();
        let x = build_features(obstacle, &state);
        let runner_left = state.runner.rect.left;
        assert_eq!(x[0], 449.0 - runner_left);
        assert_eq!(x[1], 0.0);
        assert_eq!(x[2], 0.0);
        assert_eq!(x[3], 49.0);
        assert_eq!(x[4], 99.0);
        assert_eq!(x[5], state.game_speed);
    }

    #[test]
    fn test_flyer_relative_speed_and_height() {
        let mut state = playing_state();
        let ground = state.ground_level;
        state.obstacles.activate(6, 400.0, ground - 93.0);
        let flyer = tracked_obstacle(&state).unwrap();
        let x = build_features(flyer, &state);
        assert_eq!(x[1], 93.0);
        assert_eq!(x[2], 93.0 * 93.0);
        assert_eq!(x[5], state.game_speed + 5.0);
    }

    #[test]
    fn test_only_grounded_ticks_record_triggers() {
        let mut state = playing_state();
        let ground = state.ground_level;
        state.obstacles.activate(0, 600.0, ground);

        let mut jumper = Perceptron::with_weights([1.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.1);
        jumper.observe(&state);
        assert!(jumper.decision());
        assert!(jumper.triggers().jump.is_some());
        assert!(jumper.triggers().pass.is_none());

        let mut passer = Perceptron::default();
        passer.observe(&state);
        assert_eq!(passer.phase(), AgentPhase::Observing);
        assert!(passer.triggers().pass.is_some());

        state.runner_on_ground = false;
        let mut airborne = Perceptron::default();
        airborne.observe(&state);
        assert_eq!(airborne.triggers(), &TriggerBuffer::default());
    }

    #[test]
    fn test_grounded_death_reinforces_pass_point() {
        let pass = [100.0, 0.0, 0.0, 49.0, 99.0, 20.0];
        let jump = [7.0; FEATURES];
        let mut p = Perceptron::new(0.01);
        p.triggers.pass = Some(pass);
        p.triggers.jump = Some(jump);

        p.observe(&dead(playing_state()));

        for i in 0..FEATURES {
            assert!(approx_eq(p.weights()[i], 0.01 * pass[i]));
        }
        assert_eq!(p.deaths(), 1);
        assert_eq!(p.triggers(), &TriggerBuffer::default());
        assert_eq!(p.phase(), AgentPhase::Idle);
    }

    #[test]
    fn test_airborne_death_labels_by_vertical_direction() {
        let jump = [50.0, 0.0, 0.0, 49.0, 99.0, 20.0];

        let mut rising = Perceptron::new(0.01);
        rising.triggers.jump = Some(jump);
        let mut state = dead(playing_state());
        state.runner_on_ground = false;
        state.runner.dy = -3.0;
        rising.observe(&state);
        assert!(approx_eq(rising.weights()[0], 0.5));

        let mut falling = Perceptron::new(0.01);
        falling.triggers.jump = Some(jump);
        state.runner.dy = 4.0;
        falling.observe(&state);
        assert!(approx_eq(falling.weights()[0], -0.5));
    }

    #[test]
    fn test_paused_learning_still_restarts() {
        let mut p = Perceptron::new(0.01);
        p.triggers.pass = Some([1.0; FEATURES]);
        let mut state = dead(playing_state());
        state.paused_for_learning = true;
        p.observe(&state);
        assert_eq!(p.weights(), &[0.0; FEATURES]);
        assert_eq!(p.deaths(), 0);
        assert_eq!(p.triggers(), &TriggerBuffer::default());
        assert!(p.take_restart());
    }

    #[test]
    fn test_death_without_triggers_only_restarts() {
        let mut p = Perceptron::with_weights([0.3; FEATURES], 0.01);
        p.observe(&dead(playing_state()));
        assert_eq!(p.weights(), &[0.3; FEATURES]);
        assert_eq!(p.deaths(), 1);
        assert!(p.take_restart());
    }
}
