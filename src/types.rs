//! Common types for hookpipe

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Window information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Window handle (as usize for serialization)
    pub hwnd: usize,
    /// Window title
    pub title: String,
    /// Window rectangle
    pub rect: Rect,
}

/// Point structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by `offset`
    pub fn offset_by(&self, offset: Point) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }
}

/// Rectangle structure
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Window that input is posted to, plus the offset added to every
/// coordinate before it is faked in the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub hwnd: usize,
    pub offset: Point,
}

impl Target {
    pub fn new(hwnd: usize, offset: Point) -> Self {
        Self { hwnd, offset }
    }

    /// Window coordinates to the coordinates the agent should report
    pub fn translate(&self, x: i32, y: i32) -> Point {
        Point::new(x, y).offset_by(self.offset)
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys reported through the agent's key-string query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum SpecialKey {
    #[default]
    LeftShift = 0,
    RightShift = 1,
    LeftControl = 2,
    RightControl = 3,
}

impl SpecialKey {
    /// Code carried by the SetSpecialKey command
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Arrow keys, as agent key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(i32)]
pub enum ArrowKey {
    Up = 273,
    Down = 274,
    Right = 275,
    #[default]
    Left = 276,
}

impl ArrowKey {
    /// Code carried by the SetKeyDown command
    pub fn key_code(&self) -> i32 {
        *self as i32
    }
}

/// Error for unknown names in the `FromStr` impls below
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    kind: &'static str,
    name: String,
    expected: &'static [&'static str],
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}' (expected one of: {})",
            self.kind,
            self.name,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for UnknownName {}

macro_rules! named_variants {
    ($ty:ident, $kind:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(UnknownName {
                        kind: $kind,
                        name: s.to_string(),
                        expected: &[$($name),+],
                    }),
                }
            }
        }
    };
}

named_variants!(MouseButton, "mouse button", {
    "left" => Left,
    "right" => Right,
    "middle" => Middle,
});

named_variants!(SpecialKey, "special key", {
    "left-shift" => LeftShift,
    "right-shift" => RightShift,
    "left-control" => LeftControl,
    "right-control" => RightControl,
});

named_variants!(ArrowKey, "arrow key", {
    "up" => Up,
    "down" => Down,
    "right" => Right,
    "left" => Left,
});
