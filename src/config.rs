use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::settings::UserSettings;

// Default values for configuration
// These serve as fallback values when neither the settings file nor the command line set them
pub const DEFAULT_RGB_KEYS: &[&str] = &["colors", "normals", "diffuse", "nocs"];
pub const DEFAULT_FLOW_KEYS: &[&str] = &["forward_flow", "backward_flow"];
pub const DEFAULT_SEGMAP_KEYS: &[&str] = &["segmap", ".*_segmaps"];
pub const DEFAULT_SEGCOLORMAP_KEYS: &[&str] = &["segcolormap"];
pub const DEFAULT_DEPTH_KEYS: &[&str] = &["distance", "depth", "stereo-depth"];
pub const DEFAULT_GRID_KEYS: &[&str] = &["colors", "category_id_segmaps", "depth", "normals"];
pub const DEFAULT_DEPTH_MAX: f32 = 5.0;
pub const DEFAULT_SAMPLE_COUNT: usize = 25;
pub const HDF5_EXTENSION: &str = "hdf5";

pub(crate) fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

/// Pattern lists for the five key roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLists {
    pub rgb: Vec<String>,
    pub flow: Vec<String>,
    pub segmap: Vec<String>,
    pub segcolormap: Vec<String>,
    pub depth: Vec<String>,
}

impl Default for KeyLists {
    fn default() -> Self {
        Self {
            rgb: owned(DEFAULT_RGB_KEYS),
            flow: owned(DEFAULT_FLOW_KEYS),
            segmap: owned(DEFAULT_SEGMAP_KEYS),
            segcolormap: owned(DEFAULT_SEGCOLORMAP_KEYS),
            depth: owned(DEFAULT_DEPTH_KEYS),
        }
    }
}

impl KeyLists {
    /// Every pattern of every role, in rgb, flow, segmap, segcolormap, depth order.
    pub fn all(&self) -> Vec<String> {
        self.rgb
            .iter()
            .chain(&self.flow)
            .chain(&self.segmap)
            .chain(&self.segcolormap)
            .chain(&self.depth)
            .cloned()
            .collect()
    }
}

/// Resolved configuration of one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub key_lists: KeyLists,
    pub keys: Vec<String>,              // Patterns selecting which keys get visualized
    pub depth_max: f32,                 // Upper clamp of the depth colormap
    pub count: usize,                   // Number of files sampled from an input directory
    pub seed: Option<u64>,              // Seed for reproducible sampling
    pub save_dir: Option<PathBuf>,      // Output directory, None shows renders interactively
    pub grid_keys: Vec<String>,         // Keys composited into the per-file grid, main image first
    pub grid: bool,
    pub open_preview: bool,             // Open the preview directory after an interactive run
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(&UserSettings::default())
    }
}

impl Config {
    pub fn from_settings(settings: &UserSettings) -> Self {
        let key_lists = KeyLists {
            rgb: settings.rgb_keys.clone(),
            flow: settings.flow_keys.clone(),
            segmap: settings.segmap_keys.clone(),
            segcolormap: settings.segcolormap_keys.clone(),
            depth: settings.depth_keys.clone(),
        };
        let keys = settings.keys.clone().unwrap_or_else(|| key_lists.all());

        Self {
            key_lists,
            keys,
            depth_max: settings.depth_max,
            count: settings.count,
            seed: None,
            save_dir: settings.save_dir.clone(),
            grid_keys: settings.grid_keys.clone(),
            grid: true,
            open_preview: settings.open_preview,
        }
    }
}
