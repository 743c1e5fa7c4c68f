use std::path::PathBuf;

use once_cell::sync::Lazy;
use crate::annotate::font::default_font_dirs;
use crate::settings::UserSettings;

// Default values for configuration
// These serve as fallback values and can be used for "reset to defaults" functionality
pub const DEFAULT_BOX_RGB: [u8; 3] = [255, 0, 0];
pub const DEFAULT_LABEL_RGB: [u8; 3] = [0, 0, 0];
pub const DEFAULT_ALPHA: f32 = 0.2;
pub const DEFAULT_LINE_THICKNESS: u32 = 2;
pub const DEFAULT_FONT_FILE: &str = "arial.ttf";
pub const DEFAULT_FONT_SIZE: f32 = 20.0;

pub struct Config {
    pub box_color: [u8; 3],         // Border, bracket and fill color
    pub label_color: [u8; 3],       // Label text color
    pub alpha: f32,                 // Fill opacity
    pub line_thickness: u32,        // Border width in pixels
    pub font_file: String,          // Label font looked up by this file name
    pub font_size: f32,             // Label font pixel height
    pub font_dirs: Vec<PathBuf>,    // Searched in order for font_file
}

impl Config {
    pub fn from_settings(settings: &UserSettings) -> Self {
        let mut font_dirs: Vec<PathBuf> = settings.font_dirs.iter().map(PathBuf::from).collect();
        font_dirs.extend(default_font_dirs());

        Config {
            box_color: settings.box_color,
            label_color: settings.label_color,
            alpha: settings.alpha,
            line_thickness: settings.line_thickness,
            font_file: settings.font_file.clone(),
            font_size: settings.font_size,
            font_dirs,
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    // Load settings from YAML file
    let settings = UserSettings::load(None);
    Config::from_settings(&settings)
});
