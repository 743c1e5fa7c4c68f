use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info, warn, error};

use crate::config::{
    DEFAULT_ALPHA, DEFAULT_BOX_RGB, DEFAULT_FONT_FILE, DEFAULT_FONT_SIZE, DEFAULT_LABEL_RGB,
    DEFAULT_LINE_THICKNESS,
};

/// User-specific annotation settings that persist across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Border, bracket and fill color (RGB)
    #[serde(default = "default_box_color")]
    pub box_color: [u8; 3],

    /// Label text color (RGB)
    #[serde(default = "default_label_color")]
    pub label_color: [u8; 3],

    /// Fill opacity, 0 disables the fill
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Border width in pixels
    #[serde(default = "default_line_thickness")]
    pub line_thickness: u32,

    /// Font file name looked up in the font directories
    #[serde(default = "default_font_file")]
    pub font_file: String,

    /// Font pixel height
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Extra directories searched before the system font directories
    #[serde(default)]
    pub font_dirs: Vec<String>,
}

fn default_box_color() -> [u8; 3] {
    DEFAULT_BOX_RGB
}

fn default_label_color() -> [u8; 3] {
    DEFAULT_LABEL_RGB
}

fn default_alpha() -> f32 {
    DEFAULT_ALPHA
}

fn default_line_thickness() -> u32 {
    DEFAULT_LINE_THICKNESS
}

fn default_font_file() -> String {
    DEFAULT_FONT_FILE.to_string()
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            box_color: DEFAULT_BOX_RGB,
            label_color: DEFAULT_LABEL_RGB,
            alpha: DEFAULT_ALPHA,
            line_thickness: DEFAULT_LINE_THICKNESS,
            font_file: DEFAULT_FONT_FILE.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_dirs: Vec::new(),
        }
    }
}

impl UserSettings {
    /// Get the path to the settings file
    /// On macOS: ~/Library/Application Support/platemark/settings.yaml
    /// On Linux: ~/.config/platemark/settings.yaml
    /// On Windows: C:\Users\<user>\AppData\Roaming\platemark\settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        config_dir.join("platemark").join("settings.yaml")
    }

    /// Load settings from the YAML file
    /// If custom_path is provided, uses that path; otherwise uses the default settings path
    pub fn load(custom_path: Option<&str>) -> Self {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p);
                PathBuf::from(p)
            }
            None => Self::settings_path(),
        };

        if !path.exists() {
            info!("Settings file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => {
                match serde_yaml::from_str::<UserSettings>(&contents) {
                    Ok(settings) => {
                        info!("Loaded settings from {:?}", path);
                        debug!("Settings: box_color={:?}, alpha={}, font={} ({}px)",
                            settings.box_color, settings.alpha, settings.font_file, settings.font_size);
                        settings
                    }
                    Err(e) => {
                        error!("Failed to parse settings file at {:?}: {}", path, e);
                        warn!("Using default settings");
                        Self::default()
                    }
                }
            }
            Err(e) => {
                error!("Failed to read settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to the default path
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = Self::settings_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to the YAML file while preserving comments
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create settings directory: {}", e))?;
            }
        }

        // If file exists, try to preserve comments by doing in-place value updates
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => {
                    let updated = self.update_yaml_values(&contents);
                    fs::write(path, updated)
                        .map_err(|e| format!("Failed to write settings file: {}", e))?;
                    info!("Saved settings to {:?} (comments preserved)", path);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Failed to read existing settings file for comment preservation: {}", e);
                    // Fall through to create new file
                }
            }
        }

        let yaml = self.to_yaml_with_comments();
        fs::write(path, yaml)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Update YAML values while preserving existing comments and structure
    fn update_yaml_values(&self, yaml_content: &str) -> String {
        let mut result = yaml_content.to_string();

        result = replace_yaml_value(&result, "box_color", &yaml_rgb(self.box_color));
        result = replace_yaml_value(&result, "label_color", &yaml_rgb(self.label_color));
        result = replace_yaml_value(&result, "alpha", &self.alpha.to_string());
        result = replace_yaml_value(&result, "line_thickness", &self.line_thickness.to_string());
        result = replace_yaml_value(&result, "font_file", &format!("\"{}\"", self.font_file));
        result = replace_yaml_value(&result, "font_size", &self.font_size.to_string());
        result = replace_yaml_value(&result, "font_dirs", &yaml_string_list(&self.font_dirs));

        result
    }

    /// Generate YAML content with comments for new files
    fn to_yaml_with_comments(&self) -> String {
        format!(
            r#"# platemark annotation settings
# Loaded automatically by every command. Values here override the built-in defaults.

# Border, corner bracket and fill color as [R, G, B]
box_color: {}

# Label text color as [R, G, B]
label_color: {}

# Fill opacity between 0.0 and 1.0 (0 disables the fill)
alpha: {}

# Border width in pixels
line_thickness: {}

# Label font file name, searched in font_dirs and then the system font directories.
# When it cannot be found a built-in bitmap font is used.
font_file: "{}"

# Label font height in pixels
font_size: {}

# Extra font directories, searched first
font_dirs: {}
"#,
            yaml_rgb(self.box_color),
            yaml_rgb(self.label_color),
            self.alpha,
            self.line_thickness,
            self.font_file,
            self.font_size,
            yaml_string_list(&self.font_dirs),
        )
    }
}

/// Replace a YAML key's value while preserving the rest of the document.
/// Only top-level keys are touched, and the new value is always written as
/// `key: value` on the key's own line.
pub(crate) fn replace_yaml_value(yaml: &str, key: &str, new_value: &str) -> String {
    let pattern = format!(r"(?m)^({}[ \t]*:)[^\r\n]*$", regex::escape(key));
    let replacement = format!("${{1}} {}", new_value.replace('$', "$$"));

    match regex::Regex::new(&pattern) {
        Ok(re) => re.replace_all(yaml, replacement.as_str()).to_string(),
        Err(e) => {
            warn!("Failed to create regex for key '{}': {}", key, e);
            yaml.to_string()
        }
    }
}

fn yaml_rgb(c: [u8; 3]) -> String {
    format!("[{}, {}, {}]", c[0], c[1], c[2])
}

fn yaml_string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("{:?}", s)).collect();
    format!("[{}]", quoted.join(", "))
}
