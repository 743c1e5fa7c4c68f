/// Rectangle coordinates as they arrive from callers and detection files.
///
/// Detections come from many sources (model output, JSON manifests, user
/// input), so a coordinate may be an integer, a float or even a string.
/// `to_pixel` applies integer-cast semantics to turn each one into a pixel index.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Anything that has no integer reading (null, arrays, objects)
    Invalid,
}

impl Coord {
    /// Integer-cast a single coordinate. Floats truncate toward zero, strings
    /// must hold an integer literal, and values that do not fit `i32` are rejected.
    pub fn to_pixel(&self) -> Option<i32> {
        match self {
            Coord::Int(v) => i32::try_from(*v).ok(),
            Coord::Float(v) => {
                if !v.is_finite() {
                    return None;
                }
                let truncated = v.trunc();
                if truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
                    return None;
                }
                Some(truncated as i32)
            }
            Coord::Text(s) => s.trim().parse::<i32>().ok(),
            Coord::Bool(b) => Some(i32::from(*b)),
            Coord::Invalid => None,
        }
    }
}

impl From<serde_json::Value> for Coord {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Coord::Int(i),
                None => n.as_f64().map(Coord::Float).unwrap_or(Coord::Invalid),
            },
            serde_json::Value::String(s) => Coord::Text(s),
            serde_json::Value::Bool(b) => Coord::Bool(b),
            _ => Coord::Invalid,
        }
    }
}

macro_rules! coord_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Coord {
            fn from(v: $t) -> Self {
                Coord::Int(v as i64)
            }
        })*
    };
}

coord_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Coord {
    fn from(v: f32) -> Self {
        Coord::Float(v as f64)
    }
}

impl From<f64> for Coord {
    fn from(v: f64) -> Self {
        Coord::Float(v)
    }
}

impl From<&str> for Coord {
    fn from(v: &str) -> Self {
        Coord::Text(v.to_string())
    }
}

impl From<String> for Coord {
    fn from(v: String) -> Self {
        Coord::Text(v)
    }
}

impl From<bool> for Coord {
    fn from(v: bool) -> Self {
        Coord::Bool(v)
    }
}

/// Rectangle in pixel space. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelRect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Cast exactly four coordinates into a pixel rectangle
    pub fn from_coords(coords: &[Coord]) -> Option<Self> {
        if coords.len() != 4 {
            return None;
        }
        Some(Self {
            x1: coords[0].to_pixel()?,
            y1: coords[1].to_pixel()?,
            x2: coords[2].to_pixel()?,
            y2: coords[3].to_pixel()?,
        })
    }

    pub fn width(&self) -> i64 {
        self.x2 as i64 - self.x1 as i64
    }

    pub fn height(&self) -> i64 {
        self.y2 as i64 - self.y1 as i64
    }

    pub fn is_inverted(&self) -> bool {
        self.width() < 0 || self.height() < 0
    }

    /// Corner bracket arm length: a third of the shorter side
    pub fn arm_length(&self) -> i64 {
        self.width().min(self.height()).div_euclid(3)
    }
}
