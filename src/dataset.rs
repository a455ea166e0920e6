//! Coordinate-labelled multi-dimensional arrays
//!
//! # Overview
//!
//! Both conversion pipelines produce a [Dataset]: a collection of named
//! [Variable]s, each an n-dimensional array with a name attached to every
//! axis. One-dimensional coordinate variables label the axes so that any
//! value can be located by coordinate rather than by index.
//!
//! ```rust
//! # use nekdata::dataset::Dataset;
//! # use ndarray::{arr1, arr2};
//! let mut ds = Dataset::new();
//! ds.insert_coord("time", arr1(&[0.0, 1.0])).unwrap();
//! ds.insert_coord("z", arr1(&[0.1, 0.2, 0.3])).unwrap();
//!
//! let u = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
//! ds.insert_var("u", &["time", "z"], u.into_dyn()).unwrap();
//!
//! assert_eq!(ds.dim_len("z"), Some(3));
//! assert_eq!(ds.var("u").unwrap().shape(), &[2, 3]);
//! ```
//!
//! Datasets are fully materialised in memory and may be persisted with
//! [Dataset::save] and read back with [Dataset::load].

// standard library
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// crate modules
use crate::error::Error;
use crate::utils::*;

// external crates
use anyhow::{Context, Result};
use log::{debug, trace};
use ndarray::{Array1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// Extension given to persisted datasets
pub const DATASET_EXTENSION: &str = "bin";

/// Name of the time coordinate, scalar for field files and 1-D for statistics
pub const TIME: &str = "time";

/// A named-axis array of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Dimension name for each array axis, in axis order
    pub dims: Vec<String>,
    /// Array data
    pub values: ArrayD<f64>,
}

impl Variable {
    /// New variable, failing if the dimension names do not match the array
    /// rank
    pub fn new(dims: &[&str], values: ArrayD<f64>) -> Result<Self> {
        if dims.len() != values.ndim() {
            return Err(Error::ShapeMismatch(f!(
                "{} dimension names given for a {}-dimensional array",
                dims.len(),
                values.ndim()
            ))
            .into());
        }
        Ok(Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values,
        })
    }

    /// Zero-dimensional variable holding a single value
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            values: ArrayD::from_elem(IxDyn(&[]), value),
        }
    }

    /// Length of every axis
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// The single value of a zero-dimensional variable
    pub fn as_scalar(&self) -> Option<f64> {
        match self.values.ndim() {
            0 => self.values.first().copied(),
            _ => None,
        }
    }
}

/// Collection of coordinate and data variables sharing named dimensions
///
/// Coordinates are kept apart from the data variables. A one-dimensional
/// coordinate named after its own dimension defines that dimension, and a
/// zero-dimensional coordinate simply labels the whole dataset (e.g. the
/// simulation time of a field file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Coordinate variables
    pub coords: BTreeMap<String, Variable>,
    /// Data variables
    pub data_vars: BTreeMap<String, Variable>,
    /// Free-form metadata
    pub attrs: BTreeMap<String, String>,
}

impl Dataset {
    /// Empty dataset
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a dimension coordinate, replacing any existing one of that name
    pub fn insert_coord(&mut self, name: &str, values: Array1<f64>) -> Result<()> {
        if let Some(len) = self.dim_len(name) {
            let clashes = self
                .data_vars
                .values()
                .any(|v| v.dims.iter().any(|d| d == name));
            if clashes && len != values.len() {
                return Err(Error::ShapeMismatch(f!(
                    "coordinate '{name}' has {} values but dimension is {len} long",
                    values.len()
                ))
                .into());
            }
        }
        trace!("Coordinate '{name}' with {} values", values.len());
        self.coords
            .insert(name.to_string(), Variable::new(&[name], values.into_dyn())?);
        Ok(())
    }

    /// Add a zero-dimensional coordinate
    pub fn insert_scalar_coord(&mut self, name: &str, value: f64) {
        trace!("Scalar coordinate '{name}' = {value}");
        self.coords.insert(name.to_string(), Variable::scalar(value));
    }

    /// Add a data variable
    ///
    /// Every dimension must already be defined by a coordinate of matching
    /// length.
    pub fn insert_var(&mut self, name: &str, dims: &[&str], values: ArrayD<f64>) -> Result<()> {
        let variable = Variable::new(dims, values)?;
        self.check_dims(name, &variable)?;
        self.data_vars.insert(name.to_string(), variable);
        Ok(())
    }

    fn check_dims(&self, name: &str, variable: &Variable) -> Result<()> {
        for (dim, &len) in variable.dims.iter().zip(variable.shape()) {
            match self.dim_len(dim) {
                Some(n) if n == len => (),
                Some(n) => {
                    return Err(Error::ShapeMismatch(f!(
                        "'{name}' is {len} long along '{dim}', coordinate has {n} values"
                    ))
                    .into())
                }
                None => {
                    return Err(Error::ShapeMismatch(f!(
                        "'{name}' uses dimension '{dim}' which has no coordinate"
                    ))
                    .into())
                }
            }
        }
        Ok(())
    }

    /// Length of a dimension as defined by its coordinate
    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.coords
            .get(dim)
            .filter(|c| c.dims.len() == 1 && c.dims[0] == dim)
            .map(|c| c.values.len())
    }

    /// Coordinate values of a dimension
    pub fn coord_values(&self, dim: &str) -> Option<Vec<f64>> {
        self.coords.get(dim).map(|c| c.values.iter().copied().collect())
    }

    /// Look up any variable, data variables first
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name).or_else(|| self.coords.get(name))
    }

    /// Look up a data variable, failing with [Error::MissingVariable]
    pub fn var(&self, name: &str) -> Result<&Variable> {
        self.data_vars
            .get(name)
            .ok_or_else(|| Error::MissingVariable(name.to_string()).into())
    }

    /// Mutable look up of a data variable
    pub fn var_mut(&mut self, name: &str) -> Result<&mut Variable> {
        self.data_vars
            .get_mut(name)
            .ok_or_else(|| Error::MissingVariable(name.to_string()).into())
    }

    /// Does the dataset contain a data or coordinate variable of this name
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of the data variables in sorted order
    pub fn variable_names(&self) -> Vec<&str> {
        self.data_vars.keys().map(|k| k.as_str()).collect()
    }

    /// Remove variables by name
    ///
    /// Both data and coordinate variables may be dropped. Every name must
    /// exist, otherwise nothing is removed and [Error::UnknownVariable] is
    /// returned.
    pub fn drop_vars<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| !self.contains(n.as_ref())) {
            return Err(Error::UnknownVariable(missing.as_ref().to_string()).into());
        }

        for name in names {
            let name = name.as_ref();
            debug!("Dropping variable '{name}'");
            if self.data_vars.remove(name).is_none() {
                self.coords.remove(name);
            }
        }
        Ok(())
    }

    /// Sidecar path for a dataset derived from `input`
    ///
    /// ```rust
    /// # use nekdata::dataset::Dataset;
    /// # use std::path::Path;
    /// let path = Dataset::sidecar_path(Path::new("run/fluid_stats.csv"));
    /// assert_eq!(path, Path::new("run/fluid_stats.bin"));
    /// ```
    pub fn sidecar_path(input: &Path) -> PathBuf {
        input.with_extension(DATASET_EXTENSION)
    }

    /// Serialise to a binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Writing dataset to {}", path.display());
        let file =
            File::create(path).with_context(|| f!("Could not create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)
            .with_context(|| f!("Could not serialise dataset to {}", path.display()))?;
        writer
            .flush()
            .with_context(|| f!("Could not write {}", path.display()))?;
        Ok(())
    }

    /// Deserialise from a binary file written by [Dataset::save]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
        let dataset = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| f!("Could not deserialise dataset from {}", path.display()))?;
        Ok(dataset)
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let dims = self
            .coords
            .iter()
            .filter(|(name, c)| c.dims.len() == 1 && &c.dims[0] == *name)
            .map(|(name, c)| f!("{name}: {}", c.values.len()))
            .collect::<Vec<String>>()
            .join(", ");
        writeln!(f, "Dataset")?;
        writeln!(f, "Dimensions:  ({dims})")?;

        writeln!(f, "Coordinates:")?;
        for (name, c) in &self.coords {
            writeln!(f, "    {}", summarise(name, c))?;
        }

        writeln!(f, "Data variables:")?;
        for (name, v) in &self.data_vars {
            writeln!(f, "    {}", summarise(name, v))?;
        }

        if !self.attrs.is_empty() {
            writeln!(f, "Attributes:")?;
            for (key, value) in &self.attrs {
                writeln!(f, "    {key}: {value}")?;
            }
        }
        Ok(())
    }
}

/// One line description of a variable with its value range
fn summarise(name: &str, variable: &Variable) -> String {
    let values = variable.values.iter().copied().collect::<Vec<f64>>();
    let range = match (vec_f64_min(&values), vec_f64_max(&values)) {
        (Some(lo), Some(hi)) if lo == hi => lo.sci(5, 2),
        (Some(lo), Some(hi)) => f!("{} .. {}", lo.sci(5, 2), hi.sci(5, 2)),
        _ => "nan".to_string(),
    };
    f!("{:<14}({}) {range}", name, variable.dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.insert_coord("time", arr1(&[0.0, 1.0])).unwrap();
        ds.insert_coord("z", arr1(&[0.5, 1.5])).unwrap();
        ds.insert_var("u", &["time", "z"], arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn())
            .unwrap();
        ds
    }

    #[test]
    fn rejects_wrong_length_dimension() {
        let mut ds = sample();
        let err = ds
            .insert_var("v", &["time", "z"], arr2(&[[1.0, 2.0, 3.0]]).into_dyn())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn rejects_unknown_dimension() {
        let mut ds = sample();
        let err = ds
            .insert_var("v", &["time", "x"], arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn())
            .unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn drop_vars_is_all_or_nothing() {
        let mut ds = sample();
        let err = ds.drop_vars(&["u", "missing"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnknownVariable(name)) if name == "missing"
        ));
        assert!(ds.contains("u"));

        ds.drop_vars(&["u"]).unwrap();
        assert!(!ds.contains("u"));
    }

    #[test]
    fn scalar_coordinate() {
        let mut ds = sample();
        ds.insert_scalar_coord("t", 2.5);
        assert_eq!(ds.coords["t"].as_scalar(), Some(2.5));
        assert_eq!(ds.dim_len("t"), None);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        let ds = sample();
        ds.save(&path).unwrap();
        assert_eq!(Dataset::load(&path).unwrap(), ds);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn save_reports_failed_writes() {
        // /dev/full accepts the open but fails every write
        let err = sample().save("/dev/full").unwrap_err();
        assert!(err.to_string().contains("/dev/full"));
    }

    #[test]
    fn summary_lists_variables() {
        let text = sample().to_string();
        assert!(text.contains("Dimensions:  (time: 2, z: 2)"));
        assert!(text.contains("u"));
        assert!(text.contains("1.00000e+00 .. 4.00000e+00"));
    }
}
