use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info, warn, error};

use crate::config::{
    owned, DEFAULT_DEPTH_KEYS, DEFAULT_DEPTH_MAX, DEFAULT_FLOW_KEYS, DEFAULT_GRID_KEYS,
    DEFAULT_RGB_KEYS, DEFAULT_SAMPLE_COUNT, DEFAULT_SEGCOLORMAP_KEYS, DEFAULT_SEGMAP_KEYS,
};

/// User-specific settings that persist across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Keys interpreted as rgb data
    #[serde(default = "default_rgb_keys")]
    pub rgb_keys: Vec<String>,

    /// Keys interpreted as optical flow
    #[serde(default = "default_flow_keys")]
    pub flow_keys: Vec<String>,

    /// Keys interpreted as segmentation maps
    #[serde(default = "default_segmap_keys")]
    pub segmap_keys: Vec<String>,

    /// Legend keys, paired by position with `segmap_keys`
    #[serde(default = "default_segcolormap_keys")]
    pub segcolormap_keys: Vec<String>,

    /// Keys interpreted as depth or disparity
    #[serde(default = "default_depth_keys")]
    pub depth_keys: Vec<String>,

    /// Keys to visualize; all role keys when unset
    #[serde(default)]
    pub keys: Option<Vec<String>>,

    /// Upper clamp of the depth colormap
    #[serde(default = "default_depth_max")]
    pub depth_max: f32,

    /// Number of files sampled from an input directory
    #[serde(default = "default_count")]
    pub count: usize,

    /// Output directory; renders are previewed instead of saved when unset
    #[serde(default)]
    pub save_dir: Option<PathBuf>,

    /// Keys composited into the summary grid, main image first
    #[serde(default = "default_grid_keys")]
    pub grid_keys: Vec<String>,

    /// Open the preview directory in the file browser after an interactive run
    #[serde(default = "default_open_preview")]
    pub open_preview: bool,
}

fn default_rgb_keys() -> Vec<String> {
    owned(DEFAULT_RGB_KEYS)
}

fn default_flow_keys() -> Vec<String> {
    owned(DEFAULT_FLOW_KEYS)
}

fn default_segmap_keys() -> Vec<String> {
    owned(DEFAULT_SEGMAP_KEYS)
}

fn default_segcolormap_keys() -> Vec<String> {
    owned(DEFAULT_SEGCOLORMAP_KEYS)
}

fn default_depth_keys() -> Vec<String> {
    owned(DEFAULT_DEPTH_KEYS)
}

fn default_depth_max() -> f32 {
    DEFAULT_DEPTH_MAX
}

fn default_count() -> usize {
    DEFAULT_SAMPLE_COUNT
}

fn default_grid_keys() -> Vec<String> {
    owned(DEFAULT_GRID_KEYS)
}

fn default_open_preview() -> bool {
    true
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            rgb_keys: default_rgb_keys(),
            flow_keys: default_flow_keys(),
            segmap_keys: default_segmap_keys(),
            segcolormap_keys: default_segcolormap_keys(),
            depth_keys: default_depth_keys(),
            keys: None,
            depth_max: DEFAULT_DEPTH_MAX,
            count: DEFAULT_SAMPLE_COUNT,
            save_dir: None,
            grid_keys: default_grid_keys(),
            open_preview: true,
        }
    }
}

impl UserSettings {
    /// Get the path to the settings file
    /// On macOS: ~/Library/Application Support/hdf5vis/settings.yaml
    /// On Linux: ~/.config/hdf5vis/settings.yaml
    /// On Windows: C:\Users\<user>\AppData\Roaming\hdf5vis\settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        config_dir.join("hdf5vis").join("settings.yaml")
    }

    /// Load settings from the YAML file
    /// If custom_path is provided, uses that path; otherwise uses the default settings path
    pub fn load(custom_path: Option<&Path>) -> Self {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p.display());
                p.to_path_buf()
            }
            None => Self::settings_path(),
        };

        if !path.exists() {
            debug!("Settings file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => {
                match serde_yaml::from_str::<UserSettings>(&contents) {
                    Ok(settings) => {
                        info!("Loaded settings from {:?}", path);
                        debug!("Settings: depth_max={}, count={}, save_dir={:?}",
                            settings.depth_max, settings.count, settings.save_dir);
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

    /// Save settings to `path` while preserving comments of an existing file
    pub fn save(&self, path: &Path) -> Result<(), String> {
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

        result = Self::replace_yaml_value(&result, "rgb_keys", &flow_list(&self.rgb_keys));
        result = Self::replace_yaml_value(&result, "flow_keys", &flow_list(&self.flow_keys));
        result = Self::replace_yaml_value(&result, "segmap_keys", &flow_list(&self.segmap_keys));
        result = Self::replace_yaml_value(&result, "segcolormap_keys", &flow_list(&self.segcolormap_keys));
        result = Self::replace_yaml_value(&result, "depth_keys", &flow_list(&self.depth_keys));
        result = Self::replace_yaml_value(&result, "keys", &optional_flow_list(self.keys.as_deref()));
        result = Self::replace_yaml_value(&result, "depth_max", &self.depth_max.to_string());
        result = Self::replace_yaml_value(&result, "count", &self.count.to_string());
        result = Self::replace_yaml_value(&result, "save_dir", &optional_path(self.save_dir.as_deref()));
        result = Self::replace_yaml_value(&result, "grid_keys", &flow_list(&self.grid_keys));
        result = Self::replace_yaml_value(&result, "open_preview", &self.open_preview.to_string());

        result
    }

    /// Replace a YAML key's value while preserving the rest of the line
    fn replace_yaml_value(yaml: &str, key: &str, new_value: &str) -> String {
        let pattern = format!(r"(?m)^(\s*{}\s*:[ \t]*).*$", regex::escape(key));

        // Patterns may contain `$`, so the value is spliced in literally
        match regex::Regex::new(&pattern) {
            Ok(re) => re
                .replace_all(yaml, |caps: &regex::Captures| format!("{}{}", &caps[1], new_value))
                .to_string(),
            Err(e) => {
                warn!("Failed to create regex for key '{}': {}", key, e);
                yaml.to_string()
            }
        }
    }

    /// Generate YAML content with comments for new files
    fn to_yaml_with_comments(&self) -> String {
        format!(
            r#"# hdf5vis User Settings
# This file is loaded automatically when hdf5vis starts.
# Settings specified here override the built-in defaults; command line options override both.
# Key lists are regular expressions that must match a whole dataset key.

# Keys shown as-is (rgb data)
rgb_keys: {}

# Keys rendered as an optical flow color wheel
flow_keys: {}

# Keys rendered channel by channel on a categorical colormap
segmap_keys: {}

# Legend keys for the segmap keys above, paired by position
segcolormap_keys: {}

# Keys rendered on a clamped sequential colormap
depth_keys: {}

# Keys to visualize (null = every key listed above)
keys: {}

# Depth values above this clamp saturate the colormap
depth_max: {}

# Number of files sampled from --input-dir
count: {}

# Output directory (null = preview renders instead of saving them)
save_dir: {}

# Keys composited into the per-file summary grid, main image first
grid_keys: {}

# Open the preview directory in the file browser after an interactive run
open_preview: {}
"#,
            flow_list(&self.rgb_keys),
            flow_list(&self.flow_keys),
            flow_list(&self.segmap_keys),
            flow_list(&self.segcolormap_keys),
            flow_list(&self.depth_keys),
            optional_flow_list(self.keys.as_deref()),
            self.depth_max,
            self.count,
            optional_path(self.save_dir.as_deref()),
            flow_list(&self.grid_keys),
            self.open_preview
        )
    }
}

/// A string list as a single-line YAML flow sequence. JSON strings are valid
/// double-quoted YAML scalars, which keeps regex escapes intact.
fn flow_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn optional_flow_list(values: Option<&[String]>) -> String {
    values.map(flow_list).unwrap_or_else(|| "null".to_string())
}

fn optional_path(path: Option<&Path>) -> String {
    match path {
        Some(path) => serde_json::to_string(&path.to_string_lossy())
            .unwrap_or_else(|_| "null".to_string()),
        None => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = UserSettings::load(Some(&dir.path().join("absent.yaml")));
        assert_eq!(settings, UserSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "depth_max: 12.5\nsegmap_keys: [\"labels\"]\n").unwrap();

        let settings = UserSettings::load(Some(&path));
        assert_eq!(settings.depth_max, 12.5);
        assert_eq!(settings.segmap_keys, vec!["labels".to_string()]);
        assert_eq!(settings.rgb_keys, default_rgb_keys());
        assert_eq!(settings.count, DEFAULT_SAMPLE_COUNT);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "depth_max: [not a number\n").unwrap();

        assert_eq!(UserSettings::load(Some(&path)), UserSettings::default());
    }

    #[test]
    fn test_written_template_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.yaml");
        let settings = UserSettings {
            segmap_keys: vec![r"seg\d+".into(), ".*_segmaps$".into()],
            save_dir: Some(PathBuf::from("out/samples")),
            ..UserSettings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(UserSettings::load(Some(&path)), settings);
    }

    #[test]
    fn test_save_preserves_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "# my notes\ndepth_max: 5\ncount: 3 \n").unwrap();

        let settings = UserSettings {
            depth_max: 8.0,
            count: 10,
            ..UserSettings::default()
        };
        settings.save(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# my notes\n"));
        assert!(contents.contains("depth_max: 8\n"));
        assert!(contents.contains("count: 10\n"));
    }
}
