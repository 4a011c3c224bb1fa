//! Summary grid: one full-size render on top, three thumbnails below.
//!
//! ```text
//! +-----------------------+
//! |                       |
//! |      main image       |  H
//! |                       |
//! +-------+-------+-------+
//! | thumb | thumb | thumb |  H / 3
//! +-------+-------+-------+
//!            W
//! ```

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::{s, Array3};

use crate::error::{Error, Result};

#[allow(unused_imports)]
use log::{debug, warn};

pub const THUMBNAIL_SLOTS: usize = 3;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Composes `images` (`H x W x C`, C = 3 or 4) into one grid image.
///
/// The first image is the main one; the following ones are shrunk to a third
/// of the main image's width and height and laid out left to right below it.
/// Images whose values do not exceed 1 are taken as 0..1 and scaled to 0..255.
pub fn compose_grid(images: &[Array3<f32>]) -> Result<RgbImage> {
    let (main, thumbnails) = images.split_first().ok_or(Error::EmptyGrid)?;
    let main = to_rgb(0, main)?;
    let (width, height) = main.dimensions();
    let (thumb_width, thumb_height) = (width / 3, height / 3);

    let mut grid = RgbImage::from_pixel(width, height + thumb_height, BACKGROUND);
    imageops::replace(&mut grid, &main, 0, 0);

    if thumbnails.len() > THUMBNAIL_SLOTS {
        warn!(
            "Grid has {} thumbnail slots, dropping {} image(s)",
            THUMBNAIL_SLOTS,
            thumbnails.len() - THUMBNAIL_SLOTS
        );
    }
    if thumb_width == 0 || thumb_height == 0 {
        warn!("Main image {}x{} is too small for thumbnails", width, height);
        return Ok(grid);
    }

    for (slot, thumbnail) in thumbnails.iter().take(THUMBNAIL_SLOTS).enumerate() {
        let thumbnail = to_rgb(slot + 1, thumbnail)?;
        let resized = imageops::resize(&thumbnail, thumb_width, thumb_height, FilterType::CatmullRom);
        let x = slot as u32 * thumb_width;
        imageops::replace(&mut grid, &resized, i64::from(x), i64::from(height));
    }

    Ok(grid)
}

/// Drops any alpha channel and brings the values to 0..255 bytes.
fn to_rgb(index: usize, image: &Array3<f32>) -> Result<RgbImage> {
    let (height, width, channels) = image.dim();
    if channels != 3 && channels != 4 {
        return Err(Error::GridChannels { index, channels });
    }

    // Alpha says nothing about the color range
    let max = image
        .slice(s![.., .., ..3])
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    let scale = if max <= 1.0 { 255.0 } else { 1.0 };

    Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let byte = |c: usize| (image[[y, x, c]] * scale).clamp(0.0, 255.0) as u8;
        Rgb([byte(0), byte(1), byte(2)])
    }))
}

/// Reads a saved render back as an `H x W x 4` array of 0..255 values.
pub fn load_image(path: &Path) -> Result<Array3<f32>> {
    let image = image::open(path)?.to_rgba8();
    let (width, height) = image.dimensions();
    let values: Vec<f32> = image.into_raw().into_iter().map(f32::from).collect();
    Ok(Array3::from_shape_vec((height as usize, width as usize, 4), values)?)
}

pub fn save_grid(grid: &RgbImage, path: &Path) -> Result<()> {
    grid.save_with_format(path, ImageFormat::Png)?;
    debug!("Saved grid {}", path.display());
    Ok(())
}
