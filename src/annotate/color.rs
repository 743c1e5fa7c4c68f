use image::Rgb;
use serde::{Deserialize, Serialize};

use super::style::ChannelOrder;
use super::AnnotateError;

pub const DEFAULT_BOX_COLOR: Channels = Channels([255.0, 0.0, 0.0]);
pub const DEFAULT_TEXT_COLOR: Channels = Channels([0.0, 0.0, 0.0]);

/// What a color is used for. Each role has its own fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Fill,
    Border,
    LabelBackground,
    Text,
}

impl ColorRole {
    pub fn fallback(self) -> Channels {
        match self {
            ColorRole::Fill | ColorRole::Border | ColorRole::LabelBackground => DEFAULT_BOX_COLOR,
            ColorRole::Text => DEFAULT_TEXT_COLOR,
        }
    }
}

/// A color as supplied by the caller: any number of channel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorInput(pub Vec<f64>);

impl From<[u8; 3]> for ColorInput {
    fn from(c: [u8; 3]) -> Self {
        ColorInput(c.iter().map(|&v| v as f64).collect())
    }
}

impl From<(u8, u8, u8)> for ColorInput {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        ColorInput(vec![r as f64, g as f64, b as f64])
    }
}

impl From<Vec<i64>> for ColorInput {
    fn from(v: Vec<i64>) -> Self {
        ColorInput(v.into_iter().map(|c| c as f64).collect())
    }
}

impl From<Vec<f64>> for ColorInput {
    fn from(v: Vec<f64>) -> Self {
        ColorInput(v)
    }
}

impl From<&[i64]> for ColorInput {
    fn from(v: &[i64]) -> Self {
        ColorInput(v.iter().map(|&c| c as f64).collect())
    }
}

impl From<Rgb<u8>> for ColorInput {
    fn from(c: Rgb<u8>) -> Self {
        ColorInput::from(c.0)
    }
}

/// Three channel values in RGB order, not yet range checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channels(pub [f64; 3]);

impl Channels {
    /// Convert to a pixel for an image stored in `order`.
    /// Channels must be finite whole numbers within 0..=255.
    pub fn to_pixel(self, order: ChannelOrder) -> Result<Rgb<u8>, AnnotateError> {
        let mut out = [0u8; 3];
        for (index, value) in self.0.iter().copied().enumerate() {
            if !value.is_finite() || value.fract() != 0.0 || !(0.0..=255.0).contains(&value) {
                return Err(AnnotateError::InvalidChannel { index, value });
            }
            out[index] = value as u8;
        }
        if order == ChannelOrder::Bgr {
            out.reverse();
        }
        Ok(Rgb(out))
    }
}

impl From<[u8; 3]> for Channels {
    fn from(c: [u8; 3]) -> Self {
        Channels([c[0] as f64, c[1] as f64, c[2] as f64])
    }
}

/// Outcome of input normalization: the value was either taken as given or
/// replaced by the role's fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalized<T> {
    Accepted(T),
    Substituted(T),
}

impl<T: Copy> Normalized<T> {
    pub fn value(&self) -> T {
        match self {
            Normalized::Accepted(v) | Normalized::Substituted(v) => *v,
        }
    }

    pub fn was_substituted(&self) -> bool {
        matches!(self, Normalized::Substituted(_))
    }
}

/// Shape check for a color: exactly three channels, otherwise the role fallback.
pub fn normalize_color(input: Option<&ColorInput>, role: ColorRole) -> Normalized<Channels> {
    match input {
        Some(ColorInput(values)) if values.len() == 3 => {
            Normalized::Accepted(Channels([values[0], values[1], values[2]]))
        }
        _ => Normalized::Substituted(role.fallback()),
    }
}
