//! Control schemes: named boolean outputs recomputed from a source once per tick.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use ahash::AHashSet;

use crate::error::DinoError;
use crate::game::GameState;

/// Every control the game or the app shell reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Start a session while not playing
    Play,
    Jump,
    /// Toggle learning pause
    Freeze,
    /// Toggle the collision box overlay
    Hitboxes,
    /// Held to run ticks without frame pacing
    Skip,
}

impl Control {
    pub const COUNT: usize = 5;
    pub const ALL: [Control; Self::COUNT] = [
        Control::Play,
        Control::Jump,
        Control::Freeze,
        Control::Hitboxes,
        Control::Skip,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Control::Play => "play",
            Control::Jump => "jump",
            Control::Freeze => "freeze",
            Control::Hitboxes => "hitboxes",
            Control::Skip => "skip",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Control {
    type Err = DinoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Control::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| DinoError::UnknownControl(s.to_string()))
    }
}

/// Where a controller's outputs come from.
pub trait ControlSource {
    type Key;

    /// Runs once per tick before any output is recomputed.
    fn refresh(&mut self, state: &GameState);

    /// Compute the output bound to `key`.
    fn source(&mut self, key: &Self::Key) -> bool;

    /// Whether the game loop ticks this source from inside its own step
    /// rather than the shell ticking it ahead of the game.
    fn follows_game(&self) -> bool {
        false
    }
}

/// A fixed set of bound controls over one source.
///
/// Reading an unbound control yields `false`; writing one is refused.
pub struct Controller<S: ControlSource> {
    bindings: Vec<(Control, S::Key)>,
    outputs: [Option<bool>; Control::COUNT],
    source: S,
}

impl<S: ControlSource> Controller<S> {
    pub fn new<I>(scheme: I, mut source: S) -> Self
    where
        I: IntoIterator<Item = (Control, S::Key)>,
    {
        let bindings: Vec<_> = scheme.into_iter().collect();
        let mut outputs = [None; Control::COUNT];
        for (control, key) in &bindings {
            outputs[control.index()] = Some(source.source(key));
        }
        Self {
            bindings,
            outputs,
            source,
        }
    }

    /// Build from textual control names, e.g. parsed from a key map.
    pub fn from_names<'a, I>(scheme: I, source: S) -> Result<Self, DinoError>
    where
        I: IntoIterator<Item = (&'a str, S::Key)>,
    {
        let bindings = scheme
            .into_iter()
            .map(|(name, key)| Ok((name.parse::<Control>()?, key)))
            .collect::<Result<Vec<_>, DinoError>>()?;
        Ok(Self::new(bindings, source))
    }

    pub fn get(&self, control: Control) -> bool {
        self.outputs[control.index()].unwrap_or(false)
    }

    /// Lookup by name; unknown names read as `false`.
    pub fn get_named(&self, name: &str) -> bool {
        name.parse::<Control>().map(|c| self.get(c)).unwrap_or(false)
    }

    /// Force an output until the next tick. Fails if `control` is unbound.
    pub fn set(&mut self, control: Control, value: bool) -> bool {
        match &mut self.outputs[control.index()] {
            Some(out) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    pub fn is_bound(&self, control: Control) -> bool {
        self.outputs[control.index()].is_some()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &(Control, S::Key)> {
        self.bindings.iter()
    }

    pub fn tick(&mut self, state: &GameState) {
        self.source.refresh(state);
        for (control, key) in &self.bindings {
            self.outputs[control.index()] = Some(self.source.source(key));
        }
    }

    pub fn follows_game(&self) -> bool {
        self.source.follows_game()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// Held-key snapshot from an input device.
///
/// The shell reports key state as events arrive; `refresh` latches it so all
/// outputs of one tick see the same snapshot.
#[derive(Debug, Clone)]
pub struct DeviceSource<K> {
    pending: AHashSet<K>,
    snapshot: AHashSet<K>,
}

impl<K: Eq + Hash + Clone> DeviceSource<K> {
    pub fn new() -> Self {
        Self {
            pending: AHashSet::new(),
            snapshot: AHashSet::new(),
        }
    }

    pub fn set_key(&mut self, key: K, held: bool) {
        if held {
            self.pending.insert(key);
        } else {
            self.pending.remove(&key);
        }
    }

    pub fn release_all(&mut self) {
        self.pending.clear();
    }
}

impl<K: Eq + Hash + Clone> Default for DeviceSource<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> ControlSource for DeviceSource<K> {
    type Key = K;

    fn refresh(&mut self, _state: &GameState) {
        self.snapshot.clone_from(&self.pending);
    }

    fn source(&mut self, key: &K) -> bool {
        self.snapshot.contains(key)
    }
}
