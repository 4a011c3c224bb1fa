//! Read-only access to the root datasets of one HDF5 sample file.

use std::path::Path;

use hdf5::types::{FixedAscii, FixedUnicode, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::Dataset;
use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::error::{Error, Result};

#[allow(unused_imports)]
use log::{debug, warn};

/// Numeric dataset contents widened to `f32`.
///
/// `integral` records whether the stored element type was an integer (or
/// boolean) type, which decides how rgb data is scaled for display.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub data: ArrayD<f32>,
    pub integral: bool,
}

impl NumericArray {
    pub fn new(data: ArrayD<f32>, integral: bool) -> Self {
        Self { data, integral }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// A leading axis of exactly two holds a left/right image pair.
    pub fn is_stereo(&self) -> bool {
        self.data.ndim() >= 3 && self.data.shape()[0] == 2
    }

    /// Splits a stereo pair into its left and right halves.
    pub fn eyes(&self) -> Option<[NumericArray; 2]> {
        if !self.is_stereo() {
            return None;
        }
        let half = |index| NumericArray::new(self.data.index_axis(Axis(0), index).to_owned(), self.integral);
        Some([half(0), half(1)])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetValue {
    Numeric(NumericArray),
    Text(Vec<String>),
}

/// An open HDF5 file. The handle is released when the container is dropped.
pub struct Container {
    file: hdf5::File,
}

impl Container {
    pub fn open(path: &Path) -> Result<Self> {
        let file = hdf5::File::open(path)?;
        debug!("Opened {}", path.display());
        Ok(Self { file })
    }

    /// Names of the datasets at the file root, sorted by name.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .file
            .datasets()?
            .iter()
            .map(|dataset| dataset.name().trim_start_matches('/').to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    pub fn shape(&self, key: &str) -> Result<Vec<usize>> {
        Ok(self.file.dataset(key)?.shape())
    }

    /// Reads a whole dataset, numeric data as `f32` and strings as text.
    pub fn read(&self, key: &str) -> Result<DatasetValue> {
        let dataset = self.file.dataset(key)?;
        let descriptor = dataset.dtype()?.to_descriptor()?;

        match descriptor {
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
                Ok(DatasetValue::Numeric(NumericArray::new(dataset.read_dyn::<f32>()?, true)))
            }
            TypeDescriptor::Float(_) => {
                Ok(DatasetValue::Numeric(NumericArray::new(dataset.read_dyn::<f32>()?, false)))
            }
            TypeDescriptor::Boolean => {
                let flags = dataset.read_dyn::<bool>()?;
                let data = flags.mapv(|flag| if flag { 1.0 } else { 0.0 });
                Ok(DatasetValue::Numeric(NumericArray::new(data, true)))
            }
            TypeDescriptor::FixedAscii(_)
            | TypeDescriptor::FixedUnicode(_)
            | TypeDescriptor::VarLenAscii
            | TypeDescriptor::VarLenUnicode => Ok(DatasetValue::Text(read_text(&dataset, &descriptor)?)),
            other => Err(Error::UnsupportedType {
                key: key.to_string(),
                dtype: format!("{other:?}"),
            }),
        }
    }

    /// Reads a dataset holding serialized text, either as raw bytes or as strings.
    ///
    /// Returns `None` when no dataset of that name exists.
    pub fn read_serialized_text(&self, key: &str) -> Result<Option<String>> {
        let dataset = match self.file.dataset(key) {
            Ok(dataset) => dataset,
            Err(_) => return Ok(None),
        };
        let descriptor = dataset.dtype()?.to_descriptor()?;

        let text = match descriptor {
            TypeDescriptor::Unsigned(IntSize::U1) | TypeDescriptor::Integer(IntSize::U1) => {
                let bytes = dataset.read_raw::<u8>()?;
                String::from_utf8_lossy(&bytes).trim_end_matches('\0').to_string()
            }
            TypeDescriptor::FixedAscii(_)
            | TypeDescriptor::FixedUnicode(_)
            | TypeDescriptor::VarLenAscii
            | TypeDescriptor::VarLenUnicode => read_text(&dataset, &descriptor)?.concat(),
            other => {
                return Err(Error::UnsupportedType {
                    key: key.to_string(),
                    dtype: format!("{other:?}"),
                })
            }
        };
        Ok(Some(text))
    }
}

fn read_text(dataset: &Dataset, descriptor: &TypeDescriptor) -> Result<Vec<String>> {
    match *descriptor {
        TypeDescriptor::VarLenUnicode => Ok(dataset
            .read_raw::<VarLenUnicode>()?
            .iter()
            .map(|value| value.as_str().to_string())
            .collect()),
        TypeDescriptor::VarLenAscii => Ok(dataset
            .read_raw::<VarLenAscii>()?
            .iter()
            .map(|value| value.as_str().to_string())
            .collect()),
        // Fixed-size strings are read into the smallest buffer that holds them
        TypeDescriptor::FixedAscii(size) if size <= 256 => read_fixed_ascii::<256>(dataset),
        TypeDescriptor::FixedAscii(size) if size <= 65_536 => read_fixed_ascii::<65_536>(dataset),
        TypeDescriptor::FixedAscii(_) => read_fixed_ascii::<4_194_304>(dataset),
        TypeDescriptor::FixedUnicode(size) if size <= 256 => read_fixed_unicode::<256>(dataset),
        TypeDescriptor::FixedUnicode(size) if size <= 65_536 => read_fixed_unicode::<65_536>(dataset),
        TypeDescriptor::FixedUnicode(_) => read_fixed_unicode::<4_194_304>(dataset),
        ref other => Err(Error::UnsupportedType {
            key: dataset.name(),
            dtype: format!("{other:?}"),
        }),
    }
}

fn read_fixed_ascii<const N: usize>(dataset: &Dataset) -> Result<Vec<String>> {
    Ok(dataset
        .read_raw::<FixedAscii<N>>()?
        .iter()
        .map(|value| value.as_str().to_string())
        .collect())
}

fn read_fixed_unicode<const N: usize>(dataset: &Dataset) -> Result<Vec<String>> {
    Ok(dataset
        .read_raw::<FixedUnicode<N>>()?
        .iter()
        .map(|value| value.as_str().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{write_sample_file, LEGEND_JSON};

    #[test]
    fn test_keys_are_sorted_root_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_file(dir.path(), "scene", "0.hdf5").unwrap();
        let container = Container::open(&path).unwrap();

        let keys = container.keys().unwrap();
        assert_eq!(
            keys,
            vec![
                "category_id_segmaps",
                "colors",
                "depth",
                "forward_flow",
                "normals",
                "segcolormap",
                "segmap",
                "version"
            ]
        );
    }

    #[test]
    fn test_read_numeric_keeps_element_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_file(dir.path(), "scene", "0.hdf5").unwrap();
        let container = Container::open(&path).unwrap();

        match container.read("colors").unwrap() {
            DatasetValue::Numeric(array) => {
                assert!(array.integral);
                assert_eq!(array.shape(), &[6, 9, 3]);
                assert_eq!(array.data[[0, 1, 0]], 1.0);
            }
            other => panic!("unexpected value: {other:?}"),
        }
        match container.read("depth").unwrap() {
            DatasetValue::Numeric(array) => {
                assert!(!array.integral);
                assert_eq!(array.shape(), &[6, 9]);
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_read_text_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_file(dir.path(), "scene", "0.hdf5").unwrap();
        let container = Container::open(&path).unwrap();

        assert_eq!(
            container.read("version").unwrap(),
            DatasetValue::Text(vec!["3.0.0".to_string()])
        );
    }

    #[test]
    fn test_read_serialized_legend_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_file(dir.path(), "scene", "0.hdf5").unwrap();
        let container = Container::open(&path).unwrap();

        let text = container.read_serialized_text("segcolormap").unwrap();
        assert_eq!(text.as_deref(), Some(LEGEND_JSON));
        assert_eq!(container.read_serialized_text("absent").unwrap(), None);
    }

    #[test]
    fn test_stereo_split() {
        let data = ArrayD::from_shape_fn(vec![2, 3, 4, 3], |idx| idx[0] as f32);
        let array = NumericArray::new(data, false);
        assert!(array.is_stereo());

        let [left, right] = array.eyes().unwrap();
        assert_eq!(left.shape(), &[3, 4, 3]);
        assert!(left.data.iter().all(|&v| v == 0.0));
        assert!(right.data.iter().all(|&v| v == 1.0));

        let mono = NumericArray::new(ArrayD::zeros(vec![2, 4]), false);
        assert!(!mono.is_stereo());
        assert!(mono.eyes().is_none());
    }
}
