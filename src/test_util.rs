//! Fixture files shared by the unit tests.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use hdf5::types::FixedAscii;
use ndarray::{Array2, Array3};

pub const LEGEND_JSON: &str =
    r#"[{"channel_class": "0", "channel_instance": "1", "idx": "0"}, {"channel_class": "1"}]"#;

/// Writes a small 6x9 sample under `<dir>/<folder>/<name>` holding every kind of key.
pub fn write_sample_file(dir: &Path, folder: &str, name: &str) -> anyhow::Result<PathBuf> {
    let folder = dir.join(folder);
    std::fs::create_dir_all(&folder)?;
    let path = folder.join(name);
    let file = hdf5::File::create(&path)?;

    let colors = Array3::from_shape_fn((6, 9, 3), |(i, j, c)| (i + j + c) as u8);
    file.new_dataset_builder().with_data(&colors).create("colors")?;

    let normals = Array3::from_shape_fn((6, 9, 3), |(i, j, c)| ((i + j + c) % 4) as f32 / 4.0);
    file.new_dataset_builder().with_data(&normals).create("normals")?;

    let depth = Array2::from_shape_fn((6, 9), |(i, j)| (i * j) as f32 * 0.2);
    file.new_dataset_builder().with_data(&depth).create("depth")?;

    let flow = Array3::from_shape_fn((6, 9, 2), |(i, j, c)| if c == 0 { j as f32 - 4.0 } else { i as f32 - 3.0 });
    file.new_dataset_builder().with_data(&flow).create("forward_flow")?;

    let category_ids = Array2::from_shape_fn((6, 9), |(i, j)| ((i + j) % 3) as i32);
    file.new_dataset_builder().with_data(&category_ids).create("category_id_segmaps")?;

    let segmap = Array3::from_shape_fn((6, 9, 2), |(i, j, c)| ((i + j * (c + 1)) % 4) as u16);
    file.new_dataset_builder().with_data(&segmap).create("segmap")?;

    file.new_dataset_builder()
        .with_data(LEGEND_JSON.as_bytes())
        .create("segcolormap")?;

    let version = FixedAscii::<5>::from_ascii("3.0.0").map_err(|e| anyhow!("{e:?}"))?;
    file.new_dataset_builder().with_data(&[version][..]).create("version")?;

    Ok(path)
}
