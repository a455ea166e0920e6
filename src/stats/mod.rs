//! Neko statistics tables to coordinate-labelled datasets
//!
//! # Overview
//!
//! Neko writes time-averaged statistics as long-format CSV tables: one row per
//! sampling point with time and height in the first two columns, and one
//! column per accumulated statistic. Conversion
//!
//! 1. resolves the [Registry] of statistic names for the file,
//! 2. averages rows sharing a (time, height) pair and pivots each statistic
//!    into a time x height array,
//! 3. removes the mean contributions from every higher order moment.
//!
//! Scalar statistics contain products with velocity and pressure, whose means
//! only exist in the fluid statistics. These are read from a companion fluid
//! file which is converted first.
//!
//! ```ignore
//! use nekdata::stats::{Category, StatsConverter};
//!
//! let mut converter = StatsConverter::new(Category::Scalar);
//! converter.set_companion("path/to/fluid_stats.csv");
//! let ds = converter.convert("path/to/scalar_stats.csv")?;
//! ```

mod moments;
mod registry;
mod table;

#[doc(inline)]
pub use crate::stats::moments::correct_moments;

#[doc(inline)]
pub use crate::stats::registry::{
    Category, Completeness, Moment, Quantity, Registry, Statistic, FLUID_BASIC, FLUID_FULL,
    SCALAR_BASIC, SCALAR_FULL,
};

#[doc(inline)]
pub use crate::stats::table::{GroupMean, RawTable};

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::dataset::{Dataset, TIME};
use crate::error::Error;
use crate::readers::StatsFileReader;

// external crates
use anyhow::Result;
use log::{debug, info};

/// Default name of the height coordinate
pub const DEFAULT_HEIGHT: &str = "z";

/// Converts a statistics table into a corrected [Dataset]
///
/// Holds everything that configures a conversion so the same settings can be
/// applied to many files.
#[derive(Debug, Clone)]
pub struct StatsConverter {
    /// Which family of statistics the file contains
    category: Category,
    /// Statistic set, inferred from the column count if `None`
    completeness: Option<Completeness>,
    /// Name given to the height coordinate
    height: String,
    /// Fluid statistics supplying means for scalar statistics
    companion: Option<PathBuf>,
    /// Write a sidecar dataset next to the input
    save: bool,
}

impl StatsConverter {
    /// Converter for `category` with default settings
    pub fn new(category: Category) -> Self {
        Self {
            category,
            completeness: None,
            height: DEFAULT_HEIGHT.to_string(),
            companion: None,
            save: false,
        }
    }

    /// Fix the statistic set rather than inferring it
    pub fn set_completeness(&mut self, completeness: Completeness) {
        self.completeness = Some(completeness);
    }

    /// Name of the height coordinate ("z" by default)
    pub fn set_height(&mut self, height: &str) {
        self.height = height.to_string();
    }

    /// Fluid statistics file for the means needed by scalar statistics
    pub fn set_companion<P: AsRef<Path>>(&mut self, path: P) {
        self.companion = Some(path.as_ref().to_path_buf());
    }

    /// Persist the result to a sidecar file next to the input
    pub fn enable_save(&mut self) {
        self.save = true;
    }

    /// Run the full conversion of the file at `path`
    pub fn convert<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        info!("Converting {} statistics from {}", self.category, path.display());

        let table = StatsFileReader::new().parse(path)?;
        let registry = Registry::resolve(self.category, self.completeness, table.n_data_columns())?;

        // fail on configuration before touching any other file
        let companion = match registry.needs_companion() {
            true => Some(self.convert_companion()?),
            false => None,
        };

        let mut ds = table.pivot(&registry, &self.height)?;

        if let Some(companion) = &companion {
            self.ensure_aligned(&ds, companion)?;
        }

        correct_moments(&mut ds, &registry, companion.as_ref())?;

        if self.save {
            let sidecar = Dataset::sidecar_path(path);
            info!("Saving dataset to {}", sidecar.display());
            ds.save(&sidecar)?;
        }

        Ok(ds)
    }

    /// Converted fluid statistics for the cross-category means
    fn convert_companion(&self) -> Result<Dataset> {
        let path = self
            .companion
            .as_ref()
            .ok_or(Error::MissingCompanion(self.category))?;
        debug!("Converting companion statistics {}", path.display());

        let companion = Self {
            category: Category::Fluid,
            completeness: self.completeness,
            height: self.height.clone(),
            companion: None,
            save: false,
        };
        companion.convert(path)
    }

    /// The companion must be sampled on exactly the same grid
    fn ensure_aligned(&self, ds: &Dataset, companion: &Dataset) -> Result<()> {
        for dim in [TIME, self.height.as_str()] {
            if ds.coord_values(dim) != companion.coord_values(dim) {
                return Err(Error::CoordinateMismatch(dim.to_string()).into());
            }
        }
        Ok(())
    }
}
