use tracing::info;

use crate::config::{GameConfig, Kinematics, RUNNER_NAME, SpriteSizes};
use crate::control::{Control, ControlSource, Controller};
use crate::entity::Entity;
use crate::error::DinoResult;
use crate::obstacles::{ObstaclePool, SpawnSite, Spawner};

/// Everything the agent and the renderer observe about a session.
#[derive(Debug, Clone)]
pub struct GameState {
    pub playing: bool,
    pub paused_for_learning: bool,
    pub show_hitboxes: bool,
    pub score: u32,
    pub ground_level: f32,
    pub game_speed: f32,
    pub runner_on_ground: bool,
    pub runner: Entity,
    pub obstacles: ObstaclePool,
}

impl GameState {
    /// Obstacles in play, in spawn order.
    pub fn active_obstacles(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.obstacles.active()
    }
}

pub struct Game {
    config: GameConfig,
    kin: Kinematics,
    state: GameState,
    spawner: Spawner,
    frames: u64,
    speed_capped: bool,
}

impl Game {
    pub fn new(config: GameConfig, sizes: &SpriteSizes) -> DinoResult<Self> {
        config.validate()?;
        let kin = Kinematics::derive(&config);

        let mut runner = Entity::runner(RUNNER_NAME, sizes.runner, kin.gravity, kin.ground_level);
        runner.move_to(kin.runner_start_x, kin.ground_level);

        let state = GameState {
            playing: false,
            paused_for_learning: false,
            show_hitboxes: false,
            score: 0,
            ground_level: kin.ground_level,
            game_speed: kin.initial_speed,
            runner_on_ground: true,
            runner,
            obstacles: ObstaclePool::new(sizes, &kin)?,
        };

        Ok(Self {
            spawner: Spawner::new(kin.spawn_constant, config.seed),
            config,
            kin,
            state,
            frames: 0,
            speed_capped: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kin
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn spawn_site(&self) -> SpawnSite {
        SpawnSite {
            entry_x: self.config.display_width as f32,
            ground: self.kin.ground_level,
            lane_height: self.state.runner.hitbox().height,
        }
    }

    /// Run one fixed step.
    ///
    /// While playing the order is: speed ramp, jump control, runner physics
    /// and collision, obstacle advance and retirement, death check, pilot
    /// update, spawn attempt. While not playing the only thing that happens
    /// is starting a new session on a play request.
    pub fn tick<S: ControlSource>(&mut self, pilot: &mut Controller<S>) {
        if !self.state.playing {
            if pilot.get(Control::Play) {
                self.frames = 0;
                self.reset();
                self.state.playing = true;
                info!(speed = self.state.game_speed, "session started");
            }
            return;
        }

        self.ramp_speed();

        if pilot.get(Control::Jump) {
            self.state.runner.jump(self.kin.jump_velocity);
        }

        self.state.runner.tick(self.state.obstacles.active());
        self.state.runner_on_ground = self.state.runner.on_ground;

        self.state.score += self.state.obstacles.advance(self.state.game_speed);

        if !self.state.runner.alive {
            self.state.playing = false;
            info!(score = self.state.score, frames = self.frames, "runner died");
        }

        if pilot.follows_game() {
            pilot.tick(&self.state);
        }

        let site = self.spawn_site();
        self.spawner.attempt(&mut self.state.obstacles, &site);
        self.spawner.tick_wait();
        self.frames += 1;
    }

    fn ramp_speed(&mut self) {
        let max = self.kin.max_speed;
        if self.frames % self.kin.speed_ramp_ticks as u64 == 0 && self.state.game_speed < max {
            self.state.game_speed = (self.state.game_speed + self.kin.accel_rate).min(max);
            if self.state.game_speed >= max && !self.speed_capped {
                self.speed_capped = true;
                info!(speed = max, "max speed reached");
            }
        }
    }

    /// Put the runner back at the start and clear the field.
    pub fn reset(&mut self) {
        let runner = &mut self.state.runner;
        runner.alive = true;
        runner.move_to(self.kin.runner_start_x, self.kin.ground_level);
        runner.dx = 0.0;
        runner.dy = 0.0;
        runner.on_ground = true;

        self.state.obstacles.park_all();
        self.state.playing = false;
        self.state.score = 0;
        self.state.game_speed = self.kin.initial_speed;
        self.state.runner_on_ground = true;
        self.speed_capped = false;
    }
}
