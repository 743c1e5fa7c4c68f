use serde::{Deserialize, Serialize};

use super::color::ColorInput;
use crate::config::{
    Config, DEFAULT_ALPHA, DEFAULT_BOX_RGB, DEFAULT_LABEL_RGB, DEFAULT_LINE_THICKNESS,
};

/// Channel layout of the image being annotated. Colors are always given as RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Styling options for one annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateStyle {
    /// Border, bracket and fill color
    pub color: ColorInput,

    /// Fill opacity, 0 disables the fill
    pub alpha: f32,

    /// Text drawn above the box
    pub label: Option<String>,

    pub label_color: ColorInput,

    /// Background patch behind the label. `None` reuses `color`.
    pub label_background: Option<ColorInput>,

    /// Border / bracket width in pixels
    pub line_thickness: u32,

    pub channel_order: ChannelOrder,
}

impl Default for AnnotateStyle {
    fn default() -> Self {
        Self {
            color: ColorInput::from(DEFAULT_BOX_RGB),
            alpha: DEFAULT_ALPHA,
            label: None,
            label_color: ColorInput::from(DEFAULT_LABEL_RGB),
            label_background: None,
            line_thickness: DEFAULT_LINE_THICKNESS,
            channel_order: ChannelOrder::Rgb,
        }
    }
}

impl AnnotateStyle {
    /// Style seeded from the user's settings
    pub fn from_config(config: &Config) -> Self {
        Self {
            color: ColorInput::from(config.box_color),
            alpha: config.alpha,
            label_color: ColorInput::from(config.label_color),
            line_thickness: config.line_thickness,
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<ColorInput>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_line_thickness(mut self, line_thickness: u32) -> Self {
        self.line_thickness = line_thickness;
        self
    }

    pub fn with_label_color(mut self, color: impl Into<ColorInput>) -> Self {
        self.label_color = color.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let style = AnnotateStyle::default();
        assert_eq!(style.color, ColorInput(vec![255.0, 0.0, 0.0]));
        assert_eq!(style.alpha, 0.2);
        assert_eq!(style.label, None);
        assert_eq!(style.label_color, ColorInput(vec![0.0, 0.0, 0.0]));
        assert_eq!(style.line_thickness, 2);
        assert_eq!(style.channel_order, ChannelOrder::Rgb);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let style: AnnotateStyle = serde_yaml::from_str("color: [0, 255, 0]\nlabel: 车牌\n").unwrap();
        assert_eq!(style.color, ColorInput(vec![0.0, 255.0, 0.0]));
        assert_eq!(style.label.as_deref(), Some("车牌"));
        assert_eq!(style.line_thickness, 2);
    }
}
