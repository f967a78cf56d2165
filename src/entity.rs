/// Axis-aligned rectangle in screen space (y grows downward), anchored at its
/// bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, bottom: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            bottom,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn top(&self) -> f32 {
        self.bottom - self.height
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.bottom += dy;
    }

    /// Strict overlap: rectangles that only share an edge do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top() < other.bottom
            && other.top() < self.bottom
    }

    /// The rectangle shrunk by `margin` on every side.
    pub fn inset(&self, margin: f32) -> Rect {
        Rect {
            left: self.left + margin,
            bottom: self.bottom - margin,
            width: (self.width - 2.0 * margin).max(0.0),
            height: (self.height - 2.0 * margin).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Runner,
    /// Obstacle resting on the ground
    Ground,
    /// Obstacle with its own horizontal speed, spawned at varying heights
    Flying,
}

/// A moving rectangular body.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub rect: Rect,
    /// Margin between the movement rectangle and the collision box
    pub hitbox_inset: f32,
    pub dx: f32,
    pub dy: f32,
    pub gravity: f32,
    pub ground: f32,
    pub base_speed: (f32, f32),
    pub on_ground: bool,
    pub alive: bool,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        kind: EntityKind,
        size: (f32, f32),
        gravity: f32,
        ground: f32,
        base_speed: (f32, f32),
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            rect: Rect::new(0.0, 0.0, size.0, size.1),
            hitbox_inset: 0.0,
            dx: 0.0,
            dy: 0.0,
            gravity,
            ground,
            base_speed,
            on_ground: true,
            alive: true,
        }
    }

    pub fn runner(name: impl Into<String>, size: (f32, f32), gravity: f32, ground: f32) -> Self {
        Self::new(name, EntityKind::Runner, size, gravity, ground, (0.0, 0.0))
    }

    pub fn hitbox(&self) -> Rect {
        if self.hitbox_inset == 0.0 {
            self.rect
        } else {
            self.rect.inset(self.hitbox_inset)
        }
    }

    pub fn move_to(&mut self, left: f32, bottom: f32) {
        self.rect.left = left;
        self.rect.bottom = bottom;
    }

    /// Set velocity relative to the entity's intrinsic base speed.
    pub fn set_speed(&mut self, dx: f32, dy: f32) {
        self.dx = dx + self.base_speed.0;
        self.dy = dy + self.base_speed.1;
    }

    /// Start a jump. Ignored while airborne.
    pub fn jump(&mut self, velocity: f32) {
        if self.on_ground {
            self.dy = velocity;
        }
    }

    /// Advance one tick: translate, then run the kind-specific hook.
    ///
    /// `obstacles` is only consulted by the runner, which dies on the first
    /// hitbox overlap.
    pub fn tick<'a, I>(&mut self, obstacles: I)
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        self.rect.translate(self.dx, self.dy);
        if self.kind == EntityKind::Runner {
            self.settle();
            let hitbox = self.hitbox();
            if obstacles.into_iter().any(|o| hitbox.overlaps(&o.hitbox())) {
                self.alive = false;
            }
        }
    }

    fn settle(&mut self) {
        if self.on_ground && self.dy < 0.0 {
            // takeoff tick: leave the ground before gravity applies
            self.on_ground = false;
        } else {
            self.dy += self.gravity;
            if self.rect.bottom >= self.ground {
                self.move_to(self.rect.left, self.ground);
                self.dy = 0.0;
                self.on_ground = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND: f32 = 270.0;

    fn grounded_runner() -> Entity {
        let mut runner = Entity::runner("dino", (65.0, 69.0), 1.0, GROUND);
        runner.move_to(140.0, GROUND);
        runner
    }

    fn cactus_at(left: f32) -> Entity {
        let mut cactus = Entity::new("cactus1", EntityKind::Ground, (36.0, 74.0), 0.0, GROUND, (0.0, 0.0));
        cactus.move_to(left, GROUND);
        cactus
    }

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 100.0, 20.0, 30.0);
        assert_eq!(r.right(), 30.0);
        assert_eq!(r.top(), 70.0);
    }

    #[test]
    fn test_touching_rects_do_not_overlap() {
        let a = Rect::new(0.0, 10.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 10.0, 10.0);
        let c = Rect::new(9.5, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_hitbox_defaults_to_rect() {
        let mut e = grounded_runner();
        assert_eq!(e.hitbox(), e.rect);
        e.hitbox_inset = 5.0;
        let hb = e.hitbox();
        assert_eq!(hb.left, e.rect.left + 5.0);
        assert_eq!(hb.bottom, e.rect.bottom - 5.0);
        assert_eq!(hb.width, e.rect.width - 10.0);
    }

    #[test]
    fn test_set_speed_adds_base() {
        let mut ptero = Entity::new("ptero", EntityKind::Flying, (68.0, 59.0), 0.0, GROUND, (-2.5, 0.0));
        ptero.set_speed(-15.0, 0.0);
        assert_eq!(ptero.dx, -17.5);
        assert_eq!(ptero.dy, 0.0);
    }

    #[test]
    fn test_grounded_runner_stays_put() {
        let mut runner = grounded_runner();
        for _ in 0..10 {
            runner.tick(std::iter::empty());
            assert!(runner.on_ground);
            assert_eq!(runner.rect.bottom, GROUND);
            assert_eq!(runner.dy, 0.0);
        }
    }

    #[test]
    fn test_takeoff_tick_leaves_ground_without_gravity() {
        let mut runner = grounded_runner();
        runner.dy = -5.0;
        runner.tick(std::iter::empty());
        assert!(!runner.on_ground);
        assert_eq!(runner.dy, -5.0);
        assert_eq!(runner.rect.bottom, GROUND - 5.0);

        // still rising; gravity slows it but it stays airborne
        runner.tick(std::iter::empty());
        assert!(!runner.on_ground);
        assert_eq!(runner.dy, -4.0);
    }

    #[test]
    fn test_jump_ignored_in_air() {
        let mut runner = grounded_runner();
        runner.jump(-10.0);
        runner.tick(std::iter::empty());
        runner.jump(-30.0);
        assert_eq!(runner.dy, -10.0);
    }

    #[test]
    fn test_jump_arc_lands_on_ground() {
        let mut runner = grounded_runner();
        runner.jump(-10.0);
        let mut airborne_ticks = 0;
        for _ in 0..100 {
            runner.tick(std::iter::empty());
            assert!(runner.rect.bottom <= GROUND + f32::EPSILON);
            if !runner.on_ground {
                airborne_ticks += 1;
            }
        }
        assert!(runner.on_ground);
        assert_eq!(runner.rect.bottom, GROUND);
        assert!(airborne_ticks > 10);
    }

    #[test]
    fn test_collision_kills_runner() {
        let mut runner = grounded_runner();
        let far = cactus_at(600.0);
        runner.tick([&far]);
        assert!(runner.alive);

        let near = cactus_at(180.0);
        runner.tick([&far, &near]);
        assert!(!runner.alive);
    }

    #[test]
    fn test_obstacle_only_translates() {
        let mut cactus = cactus_at(500.0);
        cactus.set_speed(-12.0, 0.0);
        cactus.tick(std::iter::empty());
        assert_eq!(cactus.rect.left, 488.0);
        assert_eq!(cactus.rect.bottom, GROUND);
        assert_eq!(cactus.dx, -12.0);
    }
}
