#![doc(hidden)]
//! Library of readers and common functions for the supported file formats

// crate modules
use crate::dataset::Dataset;
use crate::field::{FieldConverter, FieldFile};
use crate::stats::{Category, Completeness, StatsConverter};

// standard library
use std::path::Path;

// external crates
use anyhow::Result;

// files under the readers module
mod field_file;
pub mod parsers;
mod stats_file;

// inline the important readers for a nice API
#[doc(inline)]
pub use crate::readers::field_file::{Endian, FieldFileReader, ENDIAN_TAG, HEADER_BYTES};

#[doc(inline)]
pub use crate::readers::stats_file::StatsFileReader;

/// Convert a Neko statistics table to a corrected dataset
///
/// Returns a result containing the [Dataset] of de-meaned statistics on a
/// (time, height) grid.
///
/// - `path` - Path to the statistics CSV, can be [&str], [String], [Path], etc...
/// - `category` - Fluid or scalar statistics
/// - `completeness` - Basic or full statistic set, inferred if `None`
/// - `height` - Name for the height coordinate
/// - `companion` - Fluid statistics file, required for scalar statistics
/// - `save` - Write a sidecar dataset next to `path`
///
/// Example
/// ```ignore
/// // Scalar statistics need the fluid statistics for velocity means
/// let ds = nekdata::csv_to_dataset(
///     "path/to/scalar_stats.csv",
///     Category::Scalar,
///     None,
///     "z",
///     Some("path/to/fluid_stats.csv"),
///     false,
/// )?;
/// ```
pub fn csv_to_dataset<P: AsRef<Path>, C: AsRef<Path>>(
    path: P,
    category: Category,
    completeness: Option<Completeness>,
    height: &str,
    companion: Option<C>,
    save: bool,
) -> Result<Dataset> {
    let mut converter = StatsConverter::new(category);
    converter.set_height(height);

    if let Some(completeness) = completeness {
        converter.set_completeness(completeness);
    }

    if let Some(companion) = companion {
        converter.set_companion(companion);
    }

    if save {
        converter.enable_save();
    }

    converter.convert(path)
}

/// Read a Nek binary field file
///
/// Returns a result containing the [FieldFile] header and elements, ordered
/// by element id.
///
/// Example
/// ```ignore
/// let field = nekdata::read_field_file("path/to/field0.f00000")?;
/// println!("{field}");
/// ```
pub fn read_field_file<P: AsRef<Path>>(path: P) -> Result<FieldFile> {
    let path: &Path = Path::new(path.as_ref());
    FieldFileReader::new().parse(path)
}

/// Assemble a field file into one rectilinear dataset
///
/// Positions are taken from `reference`, and every name in `drop` is removed
/// from the result.
///
/// - `path` - Path to the field file of interest
/// - `reference` - Field file with the same elements and valid geometry
/// - `drop` - Variables to remove, all must exist
///
/// Example
/// ```ignore
/// let ds = nekdata::nek_dataset(
///     "path/to/field0.f00010",
///     "path/to/field0.f00000",
///     &["xmesh", "ymesh", "zmesh"],
/// )?;
/// ```
pub fn nek_dataset<P: AsRef<Path>, R: AsRef<Path>>(
    path: P,
    reference: R,
    drop: &[&str],
) -> Result<Dataset> {
    let mut converter = FieldConverter::new();
    converter.disable_progress();
    converter.set_drop_variables(drop);
    converter.convert(path, reference)
}

/// Load a dataset previously saved with [Dataset::save]
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    Dataset::load(path)
}
