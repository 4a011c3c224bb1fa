use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use walkdir::WalkDir;

use crate::config::HDF5_EXTENSION;
use crate::error::{Error, Result};

#[allow(unused_imports)]
use log::{debug, warn};

pub fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|metadata| metadata.is_file()).unwrap_or(false)
}

/// Every `*.hdf5` file below `directory`, recursively.
pub fn find_hdf5_files(directory: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(directory)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(OsStr::to_str) == Some(HDF5_EXTENSION))
        .map(|entry| entry.into_path())
        .collect();

    // Sort paths like Nautilus file viewer. `paths.sort()` puts "10" before "9"
    alphanumeric_sort::sort_path_slice(&mut paths);
    debug!("Found {} HDF5 file(s) under {}", paths.len(), directory.display());
    paths
}

/// Draws `count` distinct files at random. Fewer than `count` files is an error.
pub fn sample_files(files: &[PathBuf], count: usize, seed: Option<u64>) -> Result<Vec<PathBuf>> {
    if files.len() < count {
        return Err(Error::NotEnoughFiles {
            found: files.len(),
            needed: count,
        });
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok(files.choose_multiple(&mut rng, count).cloned().collect())
}

/// `<parent folder>_<file stem>`, the prefix of every output of one file.
pub fn output_stem(path: &Path) -> String {
    let folder = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{folder}_{base}")
}

/// `<save dir>/<parent folder>_<file stem>_<key>.png`
pub fn key_output_path(save_dir: &Path, path: &Path, key: &str) -> PathBuf {
    save_dir.join(format!("{}_{}.png", output_stem(path), key))
}

/// `<save dir>/<parent folder>_<file stem>.png`
pub fn grid_output_path(save_dir: &Path, path: &Path) -> PathBuf {
    save_dir.join(format!("{}.png", output_stem(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_find_is_recursive_and_natural_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("scene/10.hdf5"));
        touch(&dir.path().join("scene/9.hdf5"));
        touch(&dir.path().join("scene/deep/1.hdf5"));
        touch(&dir.path().join("scene/notes.txt"));
        touch(&dir.path().join("scene/2.h5"));
        fs::create_dir_all(dir.path().join("dir.hdf5")).unwrap();

        let found = find_hdf5_files(dir.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("scene/9.hdf5"),
                PathBuf::from("scene/10.hdf5"),
                PathBuf::from("scene/deep/1.hdf5"),
            ]
        );
    }

    #[test]
    fn test_sample_without_replacement() {
        let files: Vec<PathBuf> = (0..10).map(|i| PathBuf::from(format!("{i}.hdf5"))).collect();

        let mut sample = sample_files(&files, 10, Some(7)).unwrap();
        sample.sort();
        sample.dedup();
        assert_eq!(sample.len(), 10);

        let a = sample_files(&files, 4, Some(42)).unwrap();
        let b = sample_files(&files, 4, Some(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_sample_needs_enough_files() {
        let files = vec![PathBuf::from("a.hdf5")];
        let err = sample_files(&files, 2, None).unwrap_err();
        assert!(matches!(err, Error::NotEnoughFiles { found: 1, needed: 2 }));
    }

    #[test]
    fn test_output_names() {
        let path = Path::new("/data/run_03/000012.hdf5");
        assert_eq!(output_stem(path), "run_03_000012");
        assert_eq!(
            key_output_path(Path::new("out"), path, "depth"),
            PathBuf::from("out/run_03_000012_depth.png")
        );
        assert_eq!(grid_output_path(Path::new("out"), path), PathBuf::from("out/run_03_000012.png"));
    }
}
