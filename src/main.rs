mod build_info;
mod classify;
mod colormap;
mod config;
mod container;
mod error;
mod file_io;
#[cfg(feature = "flow")]
mod flow;
mod grid;
mod legend;
mod logging;
mod preview;
mod render;
mod settings;
#[cfg(test)]
mod test_util;
mod visualize;

#[allow(unused_imports)]
use log::{debug, error, info, warn};

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use crate::build_info::BuildInfo;
use crate::classify::KeyClassifier;
use crate::config::Config;
use crate::error::Error;
use crate::preview::Preview;
use crate::settings::UserSettings;

const APP_NAME: &str = "hdf5vis";

/// Renders the datasets of HDF5 sample files for visual inspection.
///
/// Without `--save` the renders are written to a preview directory which is
/// opened once every file has been processed.
#[derive(Parser, Debug)]
#[command(
    name = APP_NAME,
    version = build_info::DISPLAY_VERSION,
    long_version = build_info::DETAILED_INFO
)]
struct Args {
    /// HDF5 files to visualize
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// HDF5 files to visualize, same as the positional paths
    #[arg(long, num_args = 1.., value_name = "PATH")]
    hdf5_paths: Vec<PathBuf>,

    /// Directory searched recursively for *.hdf5 files when no paths are given
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Number of files sampled from --input-dir [default: 25]
    #[arg(long)]
    count: Option<usize>,

    /// Seed for the file sample
    #[arg(long)]
    seed: Option<u64>,

    /// Key patterns to visualize [default: every role pattern]
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    keys: Option<Vec<String>>,

    /// Key patterns rendered as rgb
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    rgb_keys: Option<Vec<String>>,

    /// Key patterns rendered as optical flow
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    flow_keys: Option<Vec<String>>,

    /// Key patterns rendered as segmentation maps
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    segmap_keys: Option<Vec<String>>,

    /// Legend keys, paired by position with --segmap-keys
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    segcolormap_keys: Option<Vec<String>>,

    /// Key patterns rendered as depth
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    depth_keys: Option<Vec<String>>,

    /// Upper clamp of the depth colormap [default: 5.0]
    #[arg(long)]
    depth_max: Option<f32>,

    /// Save renders into this directory instead of previewing them
    #[arg(long, value_name = "DIR")]
    save: Option<PathBuf>,

    /// Keys composited into the grid, main image first
    #[arg(long, num_args = 1.., value_name = "KEY")]
    grid_keys: Option<Vec<String>>,

    /// Keep the per-key renders and skip the grid
    #[arg(long)]
    no_grid: bool,

    /// Do not open the preview directory
    #[arg(long)]
    no_open: bool,

    /// Settings file to use instead of the default one
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Write the effective settings to the settings file and exit
    #[arg(long)]
    write_settings: bool,
}

impl Args {
    /// Command-line values on top of the settings file.
    fn apply_to(&self, mut settings: UserSettings) -> UserSettings {
        let lists = [
            (&self.rgb_keys, &mut settings.rgb_keys),
            (&self.flow_keys, &mut settings.flow_keys),
            (&self.segmap_keys, &mut settings.segmap_keys),
            (&self.segcolormap_keys, &mut settings.segcolormap_keys),
            (&self.depth_keys, &mut settings.depth_keys),
        ];
        for (arg, list) in lists {
            if let Some(patterns) = arg {
                *list = patterns.clone();
            }
        }
        if let Some(grid_keys) = &self.grid_keys {
            settings.grid_keys = grid_keys.clone();
        }
        if self.keys.is_some() {
            settings.keys = self.keys.clone();
        }
        if let Some(depth_max) = self.depth_max {
            settings.depth_max = depth_max;
        }
        if let Some(count) = self.count {
            settings.count = count;
        }
        if self.save.is_some() {
            settings.save_dir = self.save.clone();
        }
        if self.no_open {
            settings.open_preview = false;
        }
        settings
    }

    fn config(&self, settings: &UserSettings) -> Config {
        let mut config = Config::from_settings(settings);
        config.seed = self.seed;
        config.grid = !self.no_grid;
        config
    }

    fn explicit_paths(&self) -> Vec<PathBuf> {
        self.paths.iter().chain(&self.hdf5_paths).cloned().collect()
    }
}

/// Explicit paths win over `--input-dir`; an empty list means there is nothing to do.
fn select_paths(args: &Args, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let explicit = args.explicit_paths();
    if !explicit.is_empty() {
        if args.input_dir.is_some() {
            warn!("Paths were given, ignoring --input-dir");
        }
        return Ok(explicit);
    }

    let Some(input_dir) = &args.input_dir else {
        bail!("nothing to visualize: pass HDF5 files or --input-dir");
    };
    let files = file_io::find_hdf5_files(input_dir);
    match file_io::sample_files(&files, config.count, config.seed) {
        Ok(sample) => Ok(sample),
        Err(e @ Error::NotEnoughFiles { .. }) => {
            error!("{} in {}", e, input_dir.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn run(paths: &[PathBuf], config: &Config, classifier: &KeyClassifier) -> anyhow::Result<()> {
    let mut preview = match config.save_dir {
        Some(_) => None,
        None => Some(Preview::new(&Preview::default_root()).context("failed to create the preview directory")?),
    };

    for path in paths {
        if !path.exists() {
            println!("The file does not exist: {}", path.display());
            continue;
        }
        if !file_io::is_file(path) {
            println!("The path is not a file: {}", path.display());
            continue;
        }

        let report = match visualize::visualize_file(path, config, classifier) {
            Ok(report) => report,
            Err(e) => {
                error!("Failed to visualize {}: {}", path.display(), e);
                continue;
            }
        };
        debug!(
            "{}: {} key(s), {} file(s), {} figure(s), {} warning(s)",
            path.display(),
            report.keys.len(),
            report.saved.len(),
            report.figures.len(),
            report.warnings.len()
        );

        if let Some(preview) = preview.as_mut() {
            for figure in &report.figures {
                preview
                    .add(figure)
                    .with_context(|| format!("failed to write a preview of {}", path.display()))?;
            }
        }
    }

    if let Some(preview) = &preview {
        if config.open_preview {
            preview.open();
        } else {
            info!("{} figure(s) written to {}", preview.written().len(), preview.dir().display());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::setup_logger(APP_NAME);
    logging::setup_panic_hook(APP_NAME);
    debug!(
        "{} {} ({}) built {} for {}",
        APP_NAME,
        BuildInfo::version(),
        BuildInfo::git_hash(),
        BuildInfo::build_timestamp(),
        BuildInfo::target_platform()
    );

    let settings = args.apply_to(UserSettings::load(args.settings.as_deref()));
    if args.write_settings {
        let path = args.settings.clone().unwrap_or_else(UserSettings::settings_path);
        settings.save(&path).map_err(anyhow::Error::msg)?;
        println!("Settings written to {}", path.display());
        return Ok(());
    }

    let config = args.config(&settings);
    let classifier = KeyClassifier::new(&config.key_lists).context("invalid role key pattern")?;
    let paths = select_paths(&args, &config)?;
    run(&paths, &config, &classifier)
}
