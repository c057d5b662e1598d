use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    RotateLeft,
    RotateRight,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::Forward,
        Intent::Backward,
        Intent::Left,
        Intent::Right,
        Intent::Up,
        Intent::Down,
        Intent::RotateLeft,
        Intent::RotateRight,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Intent::Forward => "forward",
            Intent::Backward => "backward",
            Intent::Left => "left",
            Intent::Right => "right",
            Intent::Up => "up",
            Intent::Down => "down",
            Intent::RotateLeft => "rotate_left",
            Intent::RotateRight => "rotate_right",
        }
    }
}

/// Keyboard keys tracked by the control pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    W,
    S,
    A,
    D,
}

impl Key {
    /// Map a DOM-style key name. Letter keys are matched lowercase only.
    pub fn from_name(name: &str) -> Option<Key> {
        Some(match name {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "w" => Key::W,
            "s" => Key::S,
            "a" => Key::A,
            "d" => Key::D,
            _ => return None,
        })
    }

    pub fn intent(self) -> Intent {
        match self {
            Key::ArrowUp => Intent::Forward,
            Key::ArrowDown => Intent::Backward,
            Key::ArrowLeft => Intent::Left,
            Key::ArrowRight => Intent::Right,
            Key::W => Intent::Up,
            Key::S => Intent::Down,
            Key::A => Intent::RotateLeft,
            Key::D => Intent::RotateRight,
        }
    }
}

/// Set of currently held intents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntentVector(u8);

impl IntentVector {
    pub const IDLE: IntentVector = IntentVector(0);

    pub fn contains(self, intent: Intent) -> bool {
        self.0 & intent.bit() != 0
    }

    pub fn set(&mut self, intent: Intent, held: bool) {
        if held {
            self.0 |= intent.bit();
        } else {
            self.0 &= !intent.bit();
        }
    }

    pub fn is_idle(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Intent> {
        Intent::ALL.into_iter().filter(move |i| self.contains(*i))
    }
}

impl fmt::Display for IntentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_idle() {
            return f.write_str("idle");
        }
        let labels: Vec<&str> = self.iter().map(Intent::label).collect();
        f.write_str(&labels.join("+"))
    }
}

impl Serialize for IntentVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Key-down/key-up to intent mapping for the manual control pad.
#[derive(Debug, Clone)]
pub struct InputMapper {
    held: IntentVector,
    enabled: bool,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self { held: IntentVector::IDLE, enabled: true }
    }
}

impl InputMapper {
    pub fn intents(&self) -> IntentVector {
        self.held
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Unknown keys are ignored, as are key-downs while disabled.
    pub fn key_down(&mut self, name: &str) -> IntentVector {
        if let (true, Some(key)) = (self.enabled, Key::from_name(name)) {
            self.held.set(key.intent(), true);
        }
        self.held
    }

    /// Releasing a key that is not held leaves the vector unchanged.
    pub fn key_up(&mut self, name: &str) -> IntentVector {
        if let Some(key) = Key::from_name(name) {
            self.held.set(key.intent(), false);
        }
        self.held
    }

    /// Disabling releases everything currently held.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.held = IntentVector::IDLE;
        }
    }
}
