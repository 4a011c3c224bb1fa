//! Role-specific rendering of dataset arrays.
//!
//! The renderer turns one dataset into one image per logical picture: a stereo
//! pair gives two, a segmentation map one per channel. Depending on the
//! [`Target`] the images are kept in memory as [`Figure`]s or written as PNG
//! files, in which case each image is dropped as soon as it has been saved.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};
use ndarray::{ArrayView2, ArrayView3, ArrayViewD, Axis, Ix2, Ix3};

use crate::classify::{KeyClassifier, Role};
use crate::colormap::{self, Colormap, Normalize};
use crate::container::NumericArray;
use crate::error::{Error, Result};
use crate::legend::{self, LegendSource};

#[allow(unused_imports)]
use log::{debug, info, warn};

const COLORBAR_GAP: u32 = 4;
const COLORBAR_WIDTH: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where rendered images go.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Keep every image in memory for interactive viewing
    Display,
    /// Write PNGs derived from this path, e.g. `out/scene_0_depth.png`
    File(PathBuf),
}

/// A rendered image with its title, held in memory.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub image: RgbaImage,
}

impl Figure {
    pub fn new(title: String, image: RgbaImage) -> Self {
        Self { title, image }
    }

    /// Appends a colorbar of `colormap` along the right edge.
    pub fn with_colorbar(self, colormap: Colormap) -> Self {
        let (width, height) = self.image.dimensions();
        let mut canvas = RgbaImage::from_pixel(
            width + COLORBAR_GAP + COLORBAR_WIDTH,
            height,
            Rgba([255, 255, 255, 255]),
        );
        image::imageops::replace(&mut canvas, &self.image, 0, 0);
        let bar = colormap::colorbar(colormap, COLORBAR_WIDTH, height);
        image::imageops::replace(&mut canvas, &bar, i64::from(width + COLORBAR_GAP), 0);
        Self {
            title: self.title,
            image: canvas,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Artifact {
    Figure(Figure),
    Saved(PathBuf),
}

/// Everything one `render` call produced.
#[derive(Debug, Default)]
pub struct Rendered {
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<String>,
}

impl Rendered {
    #[cfg(test)]
    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.artifacts.iter().filter_map(|artifact| match artifact {
            Artifact::Figure(figure) => Some(figure),
            Artifact::Saved(_) => None,
        })
    }

    #[cfg(test)]
    pub fn saved_paths(&self) -> impl Iterator<Item = &Path> {
        self.artifacts.iter().filter_map(|artifact| match artifact {
            Artifact::Saved(path) => Some(path.as_path()),
            Artifact::Figure(_) => None,
        })
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// One rendering request, passed down unchanged through the stereo split.
struct Request<'r> {
    key: &'r str,
    file_label: String,
    eye: Option<Eye>,
    target: &'r Target,
    legend_source: Option<&'r dyn LegendSource>,
}

impl Request<'_> {
    fn title(&self, channel_label: Option<&str>) -> String {
        match channel_label {
            Some(label) => format!("{} / {} in {}", self.key, label, self.file_label),
            None => format!("{} in {}", self.key, self.file_label),
        }
    }
}

pub struct Renderer<'a> {
    classifier: &'a KeyClassifier,
    depth_max: f32,
}

impl<'a> Renderer<'a> {
    pub fn new(classifier: &'a KeyClassifier, depth_max: f32) -> Self {
        Self {
            classifier,
            depth_max,
        }
    }

    /// Renders the dataset stored under `key`.
    ///
    /// A stereo pair is split and each eye rendered on its own, suffixed
    /// `left`/`right`. `legend_source` is only consulted for segmentation keys.
    pub fn render(
        &self,
        key: &str,
        array: &NumericArray,
        legend_source: Option<&dyn LegendSource>,
        file_label: &str,
        target: &Target,
    ) -> Result<Rendered> {
        let mut rendered = Rendered::default();

        match array.eyes() {
            Some(eyes) => {
                for (eye, half) in [Eye::Left, Eye::Right].into_iter().zip(eyes) {
                    let request = Request {
                        key,
                        file_label: format!("{file_label} ({eye})"),
                        eye: Some(eye),
                        target,
                        legend_source,
                    };
                    self.render_image(&request, &half, &mut rendered)?;
                }
            }
            None => {
                let request = Request {
                    key,
                    file_label: file_label.to_string(),
                    eye: None,
                    target,
                    legend_source,
                };
                self.render_image(&request, array, &mut rendered)?;
            }
        }

        Ok(rendered)
    }

    fn render_image(&self, request: &Request, array: &NumericArray, out: &mut Rendered) -> Result<()> {
        let role = self.classifier.classify(request.key);
        debug!("Rendering `{}` {:?} as {}", request.key, array.shape(), role);

        match role {
            Role::Flow => self.render_flow(request, array, out),
            Role::Segmap => self.render_segmap(request, array, out),
            Role::Depth => self.render_depth(request, array, out),
            Role::Rgb | Role::Unknown => {
                let image = direct_image(request.key, array)?;
                emit(out, request, image, None, None)
            }
            Role::SegColormap => {
                debug!("`{}` is a legend table, it is only read for segmentation keys", request.key);
                Ok(())
            }
        }
    }

    #[cfg(feature = "flow")]
    fn render_flow(&self, request: &Request, array: &NumericArray, out: &mut Rendered) -> Result<()> {
        let field = array
            .view()
            .into_dimensionality::<Ix3>()
            .ok()
            .filter(|field| field.dim().2 >= 2)
            .ok_or_else(|| shape_error(request.key, array, "optical flow needs H x W x 2 data"))?;

        let rgb = crate::flow::flow_to_rgb(&field);
        emit(out, request, float_rgb_image(&rgb.view()), None, None)
    }

    #[cfg(not(feature = "flow"))]
    fn render_flow(&self, request: &Request, _array: &NumericArray, _out: &mut Rendered) -> Result<()> {
        Err(Error::FlowUnavailable {
            key: request.key.to_string(),
        })
    }

    fn render_segmap(&self, request: &Request, array: &NumericArray, out: &mut Rendered) -> Result<()> {
        let channels = segmap_channels(array.view())
            .ok_or_else(|| shape_error(request.key, array, "segmentation needs H x W or H x W x C data"))?;
        let labels = legend::channel_labels_for(self.classifier, request.key, request.legend_source)?;
        let channel_count = channels.dim().2;

        for (channel, plane) in channels.axis_iter(Axis(2)).enumerate() {
            let label = legend::label_for(&labels, channel);
            let image = colormap::apply(Colormap::Jet, &plane, &Normalize::from_data(&plane));
            // Only split file names when there is more than one channel to tell apart
            let file_label = (channel_count > 1).then_some(label.as_str());
            emit(out, request, image, Some(&label), file_label)?;
        }
        Ok(())
    }

    fn render_depth(&self, request: &Request, array: &NumericArray, out: &mut Rendered) -> Result<()> {
        let view = array.view();
        let plane = match view.ndim() {
            2 => view.into_dimensionality::<Ix2>()?,
            3 if view.shape()[2] >= 1 => {
                if view.shape()[2] != 1 {
                    out.warn(format!(
                        "The data with key '{}' has more than one channel which would not allow using \
                         a colormap. Therefore only the first channel is visualized.",
                        request.key
                    ));
                }
                view.index_axis_move(Axis(2), 0).into_dimensionality::<Ix2>()?
            }
            _ => return Err(shape_error(request.key, array, "depth needs H x W or H x W x C data")),
        };

        let norm = Normalize::clamped(&plane, self.depth_max);
        let image = colormap::apply(Colormap::Summer, &plane, &norm);
        match request.target {
            Target::Display => {
                let figure = Figure::new(request.title(None), image).with_colorbar(Colormap::Summer);
                out.artifacts.push(Artifact::Figure(figure));
                Ok(())
            }
            Target::File(_) => emit(out, request, image, None, None),
        }
    }
}

/// Hands one image to the target: kept as a figure, or saved and dropped.
fn emit(
    out: &mut Rendered,
    request: &Request,
    image: RgbaImage,
    title_label: Option<&str>,
    file_label: Option<&str>,
) -> Result<()> {
    match request.target {
        Target::Display => {
            out.artifacts
                .push(Artifact::Figure(Figure::new(request.title(title_label), image)));
        }
        Target::File(base) => {
            let path = output_path(base, file_label, request.eye);
            image.save_with_format(&path, ImageFormat::Png)?;
            drop(image);
            debug!("Saved {}", path.display());
            out.artifacts.push(Artifact::Saved(path));
        }
    }
    Ok(())
}

/// `<stem>[_<channel label>][_<left|right>].<ext>` next to `base`.
pub fn output_path(base: &Path, channel_label: Option<&str>, eye: Option<Eye>) -> PathBuf {
    let mut name = base
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(label) = channel_label {
        name.push('_');
        name.push_str(&label.replace(['/', '\\'], "_"));
    }
    if let Some(eye) = eye {
        name.push('_');
        name.push_str(eye.as_str());
    }
    let extension = base
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    base.with_file_name(format!("{name}.{extension}"))
}

/// Segmentation data as `H x W x C`; a plain `H x W` map becomes one channel.
pub fn segmap_channels(data: ArrayViewD<'_, f32>) -> Option<ArrayView3<'_, f32>> {
    match data.ndim() {
        2 => data.insert_axis(Axis(2)).into_dimensionality::<Ix3>().ok(),
        3 => data.into_dimensionality::<Ix3>().ok(),
        _ => None,
    }
}

/// Data shown without a role transform: color images as they are, single
/// channel data on the default colormap.
fn direct_image(key: &str, array: &NumericArray) -> Result<RgbaImage> {
    let view = array.view();
    match (view.ndim(), view.shape().get(2).copied()) {
        (2, _) => {
            let plane = view.into_dimensionality::<Ix2>()?;
            Ok(single_channel_image(&plane))
        }
        (3, Some(1)) => {
            let plane = view.index_axis_move(Axis(2), 0).into_dimensionality::<Ix2>()?;
            Ok(single_channel_image(&plane))
        }
        (3, Some(3)) | (3, Some(4)) => {
            let color = view.into_dimensionality::<Ix3>()?;
            Ok(if array.integral {
                byte_rgb_image(&color)
            } else {
                float_rgb_image(&color)
            })
        }
        _ => Err(shape_error(key, array, "expected H x W, H x W x 1, H x W x 3 or H x W x 4 data")),
    }
}

fn single_channel_image(plane: &ArrayView2<f32>) -> RgbaImage {
    colormap::apply(Colormap::Viridis, plane, &Normalize::from_data(plane))
}

/// Color data stored as integers, 0..255.
fn byte_rgb_image(color: &ArrayView3<f32>) -> RgbaImage {
    color_image(color, |v| if v.is_nan() { 0 } else { v.round().clamp(0.0, 255.0) as u8 })
}

/// Color data stored as floats, 0..1.
fn float_rgb_image(color: &ArrayView3<f32>) -> RgbaImage {
    color_image(color, |v| if v.is_nan() { 0 } else { (v * 255.0).round().clamp(0.0, 255.0) as u8 })
}

fn color_image(color: &ArrayView3<f32>, to_byte: impl Fn(f32) -> u8) -> RgbaImage {
    let (height, width, channels) = color.dim();
    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let alpha = if channels >= 4 { to_byte(color[[y, x, 3]]) } else { 255 };
        Rgba([
            to_byte(color[[y, x, 0]]),
            to_byte(color[[y, x, 1]]),
            to_byte(color[[y, x, 2]]),
            alpha,
        ])
    })
}

fn shape_error(key: &str, array: &NumericArray, reason: &'static str) -> Error {
    Error::UnsupportedShape {
        key: key.to_string(),
        shape: array.shape().to_vec(),
        reason,
    }
}
