//! Obstacle pool and spawn scheduler.
//!
//! Every archetype is allocated once and recycled: spawning moves an idle
//! archetype to the right edge and appends its index to the active list,
//! retiring parks it off-screen again. Membership is mirrored in a bitmask so
//! the "already in play" check is O(1).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{FLYER_NAME, Kinematics, SpriteSizes};
use crate::entity::{Entity, EntityKind};
use crate::error::{DinoError, DinoResult};

/// Most archetypes a pool can hold (width of the membership mask).
pub const MAX_ARCHETYPES: usize = u64::BITS as usize;

/// Flying obstacles wait this much longer than ground ones before spawning.
const FLYER_WAIT_FACTOR: f32 = 1.5;

/// Number of discrete heights a flying obstacle can spawn at.
const FLYER_LANES: u32 = 3;

#[derive(Debug, Clone)]
pub struct ObstaclePool {
    archetypes: Vec<Entity>,
    /// Active indices in spawn order
    active: Vec<usize>,
    active_mask: u64,
}

impl ObstaclePool {
    pub fn new(sizes: &SpriteSizes, kin: &Kinematics) -> DinoResult<Self> {
        if sizes.obstacles.is_empty() {
            return Err(DinoError::Config("no obstacle archetypes".into()));
        }
        if sizes.obstacles.len() > MAX_ARCHETYPES {
            return Err(DinoError::Config(format!(
                "{} obstacle archetypes exceed the pool limit of {}",
                sizes.obstacles.len(),
                MAX_ARCHETYPES
            )));
        }

        let archetypes = sizes
            .obstacles
            .iter()
            .map(|(name, size)| {
                let (kind, speed) = if name == FLYER_NAME {
                    (EntityKind::Flying, kin.flyer_speed)
                } else {
                    (EntityKind::Ground, 0.0)
                };
                Entity::new(name.clone(), kind, *size, 0.0, kin.ground_level, (speed, 0.0))
            })
            .collect();

        let mut pool = Self {
            archetypes,
            active: Vec::with_capacity(sizes.obstacles.len()),
            active_mask: 0,
        };
        pool.park_all();
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.archetypes.get(index)
    }

    pub fn archetypes(&self) -> &[Entity] {
        &self.archetypes
    }

    pub fn is_active(&self, index: usize) -> bool {
        index < MAX_ARCHETYPES && self.active_mask & (1 << index) != 0
    }

    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    /// Active obstacles in spawn order.
    pub fn active(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.active.iter().map(move |&i| &self.archetypes[i])
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Place archetype `index` with its bottom-left corner at (`left`,
    /// `bottom`) and add it to the active set. Returns false if it is
    /// already active or out of range.
    pub fn activate(&mut self, index: usize, left: f32, bottom: f32) -> bool {
        if index >= self.archetypes.len() || self.is_active(index) {
            return false;
        }
        self.archetypes[index].move_to(left, bottom);
        self.active.push(index);
        self.active_mask |= 1 << index;
        true
    }

    /// Translate every active obstacle, refresh its velocity for the current
    /// scroll speed and retire the ones that left through the left edge.
    /// Returns the number retired.
    pub fn advance(&mut self, game_speed: f32) -> u32 {
        let mut retired = 0;
        let archetypes = &mut self.archetypes;
        let mask = &mut self.active_mask;
        self.active.retain(|&i| {
            let obstacle = &mut archetypes[i];
            obstacle.tick(std::iter::empty());
            obstacle.set_speed(-game_speed, 0.0);
            if obstacle.hitbox().right() < 0.0 {
                park(obstacle);
                *mask &= !(1 << i);
                retired += 1;
                false
            } else {
                true
            }
        });
        retired
    }

    /// Return every archetype to the idle pool.
    pub fn park_all(&mut self) {
        for obstacle in &mut self.archetypes {
            park(obstacle);
        }
        self.active.clear();
        self.active_mask = 0;
    }
}

fn park(obstacle: &mut Entity) {
    let (left, bottom) = (-obstacle.rect.width, obstacle.ground);
    obstacle.move_to(left, bottom);
    obstacle.dx = 0.0;
    obstacle.dy = 0.0;
}

/// Where spawned obstacles enter the play field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSite {
    /// Left edge for a fresh obstacle (the display's right boundary)
    pub entry_x: f32,
    pub ground: f32,
    /// Vertical spacing between flying lanes
    pub lane_height: f32,
}

/// Memoryless spawn scheduler.
///
/// Each tick has a `1 / spawn_constant` chance of a spawn attempt; an attempt
/// picks a random archetype and only succeeds when it is idle and enough
/// ticks have passed since the previous spawn.
#[derive(Debug, Clone)]
pub struct Spawner {
    spawn_constant: u32,
    spawn_wait: u32,
    rng: SmallRng,
}

impl Spawner {
    pub fn new(spawn_constant: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            spawn_constant: spawn_constant.max(1),
            spawn_wait: 0,
            rng,
        }
    }

    /// Ticks since the last successful spawn.
    pub fn spawn_wait(&self) -> u32 {
        self.spawn_wait
    }

    /// Count one elapsed tick.
    pub fn tick_wait(&mut self) {
        self.spawn_wait = self.spawn_wait.saturating_add(1);
    }

    /// Minimum spacing in ticks before `obstacle` may spawn.
    pub fn min_wait(&self, obstacle: &Entity) -> f32 {
        let base = self.spawn_constant as f32;
        if obstacle.kind == EntityKind::Flying {
            base * FLYER_WAIT_FACTOR
        } else {
            base
        }
    }

    /// Roll for a spawn this tick. Returns the spawned archetype index.
    pub fn attempt(&mut self, pool: &mut ObstaclePool, site: &SpawnSite) -> Option<usize> {
        if pool.is_empty() || self.rng.gen_range(1..=self.spawn_constant) != 1 {
            return None;
        }
        let index = self.rng.gen_range(0..pool.len());
        self.try_spawn(pool, index, site)
    }

    /// Spawn archetype `index` unless it is already active or the spacing
    /// since the last spawn is too short.
    pub fn try_spawn(&mut self, pool: &mut ObstaclePool, index: usize, site: &SpawnSite) -> Option<usize> {
        let obstacle = pool.get(index)?;
        if pool.is_active(index) || self.spawn_wait as f32 <= self.min_wait(obstacle) {
            return None;
        }

        let bottom = match obstacle.kind {
            EntityKind::Flying => {
                let lane = self.rng.gen_range(0..FLYER_LANES);
                site.ground - site.lane_height * lane as f32
            }
            _ => site.ground,
        };
        if !pool.activate(index, site.entry_x, bottom) {
            return None;
        }
        debug!(index, bottom, wait = self.spawn_wait, "spawned obstacle");
        self.spawn_wait = 0;
        Some(index)
    }
}
