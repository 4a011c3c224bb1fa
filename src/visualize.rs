//! One pass over one sample file: print what it holds, render the selected keys
//! and, when writing to disk, fold the grid keys into a summary image.

use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{KeyClassifier, KeyPatterns};
use crate::config::Config;
use crate::container::{Container, DatasetValue};
use crate::error::Result;
use crate::file_io;
use crate::grid;
use crate::render::{Artifact, Figure, Renderer, Target};

#[allow(unused_imports)]
use log::{debug, info, warn};

/// Datasets whose dimensions add up to less than this are printed in full.
const SMALL_SHAPE_SUM: usize = 5;

/// What one file's pass produced.
#[derive(Debug, Default)]
pub struct FileReport {
    pub keys: Vec<String>,
    /// Per-key files still on disk after the grid took its inputs
    pub saved: Vec<PathBuf>,
    pub figures: Vec<Figure>,
    pub warnings: Vec<String>,
    pub grid: Option<PathBuf>,
}

pub fn visualize_file(path: &Path, config: &Config, classifier: &KeyClassifier) -> Result<FileReport> {
    if let Some(save_dir) = &config.save_dir {
        fs::create_dir_all(save_dir)?;
    }

    let container = Container::open(path)?;
    println!("{}: ", path.display());

    let selection = KeyPatterns::new(&config.keys)?;
    let keys: Vec<String> = container
        .keys()?
        .into_iter()
        .filter(|key| selection.matches(key))
        .collect();

    let summary = summarize_keys(&container, &keys);
    if !summary.is_empty() {
        println!("Keys: {}", summary.join(", "));
    }

    let renderer = Renderer::new(classifier, config.depth_max);
    let file_label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut report = FileReport::default();
    for key in &keys {
        let array = match container.read(key)? {
            DatasetValue::Numeric(array) => array,
            DatasetValue::Text(_) => {
                debug!("`{}` holds text, nothing to render", key);
                continue;
            }
        };

        let target = match &config.save_dir {
            Some(save_dir) => Target::File(file_io::key_output_path(save_dir, path, key)),
            None => Target::Display,
        };
        let rendered = renderer.render(key, &array, Some(&container), &file_label, &target)?;
        drop(array);

        report.warnings.extend(rendered.warnings);
        for artifact in rendered.artifacts {
            match artifact {
                Artifact::Figure(figure) => report.figures.push(figure),
                Artifact::Saved(saved) => report.saved.push(saved),
            }
        }
    }
    report.keys = keys;

    if let (Some(save_dir), true) = (&config.save_dir, config.grid) {
        report.grid = build_grid(save_dir, path, &config.grid_keys)?;
        if report.grid.is_some() {
            report.saved.retain(|saved| saved.exists());
        }
    }

    Ok(report)
}

/// `'<key>': <value or shape>` for every key, small datasets and versions by value.
pub fn summarize_keys(container: &Container, keys: &[String]) -> Vec<String> {
    keys.iter()
        .map(|key| {
            let shape = container.shape(key).unwrap_or_default();
            let show_value = shape.iter().sum::<usize>() < SMALL_SHAPE_SUM || key.contains("version");
            let value = if show_value { container.read(key).ok() } else { None };
            let shown = match value {
                Some(DatasetValue::Text(lines)) => lines.join(" "),
                Some(DatasetValue::Numeric(array)) => array.data.to_string(),
                None => format_shape(&shape),
            };
            format!("'{key}': {shown}")
        })
        .collect()
}

/// A shape written as a tuple, `(6, 9, 3)` or `(12,)`.
pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({single},)"),
        dims => {
            let dims: Vec<String> = dims.iter().map(usize::to_string).collect();
            format!("({})", dims.join(", "))
        }
    }
}

/// Composites the grid keys' renders of `path` into `<stem>.png` and removes them.
///
/// Returns `None`, leaving the renders in place, when there are no grid keys or
/// any of their renders is missing.
pub fn build_grid(save_dir: &Path, path: &Path, grid_keys: &[String]) -> Result<Option<PathBuf>> {
    if grid_keys.is_empty() {
        debug!("No grid keys, skipping the grid of {}", path.display());
        return Ok(None);
    }

    let inputs: Vec<PathBuf> = grid_keys
        .iter()
        .map(|key| file_io::key_output_path(save_dir, path, key))
        .collect();

    let missing: Vec<&str> = grid_keys
        .iter()
        .zip(&inputs)
        .filter(|(_, input)| !input.is_file())
        .map(|(key, _)| key.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(
            "Skipping the grid of {}: no render of {}",
            path.display(),
            missing.join(", ")
        );
        return Ok(None);
    }

    let images = inputs
        .iter()
        .map(|input| grid::load_image(input))
        .collect::<Result<Vec<_>>>()?;
    let composite = grid::compose_grid(&images)?;

    let grid_path = file_io::grid_output_path(save_dir, path);
    grid::save_grid(&composite, &grid_path)?;
    for input in &inputs {
        fs::remove_file(input)?;
    }
    info!("Saved grid {}", grid_path.display());

    Ok(Some(grid_path))
}
