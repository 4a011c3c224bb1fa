//! Interactive runs collect their figures into a preview directory which is
//! opened in the platform file browser once every file has been rendered.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::Result;
use crate::logging;
use crate::render::Figure;

#[allow(unused_imports)]
use log::{debug, info, warn};

pub struct Preview {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl Preview {
    /// A fresh preview directory under `root`.
    pub fn new(root: &Path) -> Result<Self> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
        let dir = root.join(format!("preview-{stamp}"));
        fs::create_dir_all(&dir)?;
        debug!("Preview directory: {}", dir.display());
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    /// `<cache dir>/hdf5vis`, or the system temp dir when there is no cache dir.
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("hdf5vis")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Writes a figure, numbered in the order figures were added.
    pub fn add(&mut self, figure: &Figure) -> Result<PathBuf> {
        let name = format!("{:04}_{}.png", self.written.len(), file_safe(&figure.title));
        let path = self.dir.join(name);
        figure.image.save_with_format(&path, ImageFormat::Png)?;
        self.written.push(path.clone());
        Ok(path)
    }

    /// Opens the directory, unless nothing was written to it.
    pub fn open(&self) {
        if self.written.is_empty() {
            info!("Nothing to preview");
            return;
        }
        info!("{} figure(s) written to {}", self.written.len(), self.dir.display());
        logging::open_in_file_explorer(&self.dir.to_string_lossy());
    }
}

fn file_safe(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_figures_are_numbered_in_order() {
        let root = tempfile::tempdir().unwrap();
        let mut preview = Preview::new(root.path()).unwrap();
        assert!(preview.dir().starts_with(root.path()));

        let image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let first = preview.add(&Figure::new("depth in 0.hdf5".into(), image.clone())).unwrap();
        let second = preview.add(&Figure::new("segmap / class in 0.hdf5 (left)".into(), image)).unwrap();

        assert_eq!(first.file_name().unwrap(), "0000_depth_in_0.hdf5.png");
        assert_eq!(second.file_name().unwrap(), "0001_segmap___class_in_0.hdf5__left_.png");
        assert_eq!(preview.written().len(), 2);
        assert!(second.is_file());
    }
}
