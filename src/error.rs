use thiserror::Error;

/// Failures raised while reading a container, rendering a key or composing a grid.
#[derive(Debug, Error)]
pub enum Error {
    #[error("hdf5: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("array shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("invalid key pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("legend stored under `{key}` is not a JSON array of records: {source}")]
    Legend {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot render `{key}` with shape {shape:?}: {reason}")]
    UnsupportedShape {
        key: String,
        shape: Vec<usize>,
        reason: &'static str,
    },

    #[error("dataset `{key}` has an element type that cannot be read: {dtype}")]
    UnsupportedType { key: String, dtype: String },

    #[error(
        "`{key}` holds optical flow, which needs the HSV color-wheel conversion; \
         rebuild hdf5vis with `--features flow` to render it"
    )]
    FlowUnavailable { key: String },

    #[error("not enough HDF5 files: found {found}, need {needed}")]
    NotEnoughFiles { found: usize, needed: usize },

    #[error("a grid composite needs at least one image")]
    EmptyGrid,

    #[error("grid image #{index} has {channels} channels, expected 3 or 4")]
    GridChannels { index: usize, channels: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
