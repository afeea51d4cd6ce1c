//! Digital input: logical buttons, edge detection, and per-frame snapshots.

use bitflags::bitflags;
use smallvec::SmallVec;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumCount, EnumIter, EnumString, IntoStaticStr};

/// A logical button of the virtual controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

bitflags! {
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const A = 1 << 4;
        const B = 1 << 5;
        const START = 1 << 6;
        const SELECT = 1 << 7;
    }
}

impl Button {
    pub const fn flag(self) -> Buttons {
        match self {
            Button::Up => Buttons::UP,
            Button::Down => Buttons::DOWN,
            Button::Left => Buttons::LEFT,
            Button::Right => Buttons::RIGHT,
            Button::A => Buttons::A,
            Button::B => Buttons::B,
            Button::Start => Buttons::START,
            Button::Select => Buttons::SELECT,
        }
    }

    /// The guest-facing field name (`up`, `a`, ...).
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The guest-facing edge-triggered field name (`upPressed`, `aPressed`, ...).
    pub const fn pressed_name(self) -> &'static str {
        match self {
            Button::Up => "upPressed",
            Button::Down => "downPressed",
            Button::Left => "leftPressed",
            Button::Right => "rightPressed",
            Button::A => "aPressed",
            Button::B => "bPressed",
            Button::Start => "startPressed",
            Button::Select => "selectPressed",
        }
    }

    /// `start` and `select` are only exposed in configurations that enable them.
    pub const fn is_system(self) -> bool {
        matches!(self, Button::Start | Button::Select)
    }

    /// Maps a host keyboard code (DOM `KeyboardEvent.code` naming) to a button.
    pub fn from_key_code(code: &str) -> Option<Button> {
        match code {
            "ArrowUp" | "KeyW" => Some(Button::Up),
            "ArrowDown" | "KeyS" => Some(Button::Down),
            "ArrowLeft" | "KeyA" => Some(Button::Left),
            "ArrowRight" | "KeyD" => Some(Button::Right),
            "KeyZ" => Some(Button::A),
            "KeyX" => Some(Button::B),
            "Enter" => Some(Button::Start),
            "Space" => Some(Button::Select),
            _ => None,
        }
    }
}

/// Raw button state, mutated by host input events between frames.
///
/// `previous` holds the state that was current when the last snapshot was taken, so a
/// button counts as "just pressed" for exactly one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    current: Buttons,
    previous: Buttons,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: Button) {
        self.current.insert(button.flag());
    }

    pub fn release(&mut self, button: Button) {
        self.current.remove(button.flag());
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.current.contains(button.flag())
    }

    /// Captures the state for one frame and promotes `current` to `previous`.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            held: self.current,
            pressed: self.current.difference(self.previous),
        };
        self.previous = self.current;
        snapshot
    }

    /// Releases every button and forgets edge history.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The frozen input for a single frame; guests never observe changes mid-frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub held: Buttons,
    pub pressed: Buttons,
}

/// A guest-facing input field name and its value.
pub type InputField = (&'static str, bool);

impl InputSnapshot {
    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(button.flag())
    }

    pub fn just_pressed(&self, button: Button) -> bool {
        self.pressed.contains(button.flag())
    }

    /// The flat `name → value` map handed to the guest's `update`, held states first.
    pub fn fields(&self, include_system: bool) -> SmallVec<[InputField; Button::COUNT * 2]> {
        let buttons = || Button::iter().filter(move |button| include_system || !button.is_system());
        buttons()
            .map(|button| (button.name(), self.is_held(button)))
            .chain(buttons().map(|button| (button.pressed_name(), self.just_pressed(button))))
            .collect()
    }
}
