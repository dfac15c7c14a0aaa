//! Input handling.
//!
//! Movement keys are polled once per tick through [`InputSource`]. Exit,
//! mouse-grab toggle and camera reset arrive as key-down events instead.

use std::collections::HashSet;

use crate::math::Vec3;

/// Keys the bridge cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    R,
    Tab,
    Escape,
}

bitflags::bitflags! {
    /// Movement keys currently held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MovementKeys: u8 {
        const FORWARD = 1 << 0;
        const BACK = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl MovementKeys {
    /// Key and camera-local direction for each movement flag.
    pub const BINDINGS: [(MovementKeys, Key, Vec3); 4] = [
        (MovementKeys::FORWARD, Key::W, Vec3::FORWARD),
        (MovementKeys::BACK, Key::S, Vec3::BACK),
        (MovementKeys::LEFT, Key::A, Vec3::LEFT),
        (MovementKeys::RIGHT, Key::D, Vec3::RIGHT),
    ];

    /// Samples the held movement keys.
    pub fn poll(input: &dyn InputSource) -> Self {
        Self::BINDINGS
            .iter()
            .filter(|(_, key, _)| input.is_key_down(*key))
            .fold(Self::empty(), |acc, (flag, _, _)| acc | *flag)
    }

    /// Unit directions of the held keys, in binding order.
    pub fn directions(self) -> impl Iterator<Item = Vec3> {
        Self::BINDINGS
            .into_iter()
            .filter(move |(flag, _, _)| self.contains(*flag))
            .map(|(_, _, dir)| dir)
    }
}

/// Host input system.
pub trait InputSource: Send {
    fn is_key_down(&self, key: Key) -> bool;
    fn is_mouse_visible(&self) -> bool;
    fn set_mouse_visible(&mut self, visible: bool);
    fn is_mouse_grabbed(&self) -> bool;
    fn set_mouse_grabbed(&mut self, grabbed: bool);
}

/// Input with no keys held, for headless runs.
#[derive(Debug, Default)]
pub struct NullInput {
    mouse_visible: bool,
    mouse_grabbed: bool,
}

impl InputSource for NullInput {
    fn is_key_down(&self, _key: Key) -> bool {
        false
    }

    fn is_mouse_visible(&self) -> bool {
        self.mouse_visible
    }

    fn set_mouse_visible(&mut self, visible: bool) {
        self.mouse_visible = visible;
    }

    fn is_mouse_grabbed(&self) -> bool {
        self.mouse_grabbed
    }

    fn set_mouse_grabbed(&mut self, grabbed: bool) {
        self.mouse_grabbed = grabbed;
    }
}

/// Input whose held keys are set by the caller.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    held: HashSet<Key>,
    mouse_visible: bool,
    mouse_grabbed: bool,
}

impl ScriptedInput {
    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }
}

impl InputSource for ScriptedInput {
    fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn is_mouse_visible(&self) -> bool {
        self.mouse_visible
    }

    fn set_mouse_visible(&mut self, visible: bool) {
        self.mouse_visible = visible;
    }

    fn is_mouse_grabbed(&self) -> bool {
        self.mouse_grabbed
    }

    fn set_mouse_grabbed(&mut self, grabbed: bool) {
        self.mouse_grabbed = grabbed;
    }
}
