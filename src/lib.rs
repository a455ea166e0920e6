//! # The Nekdata crate
//!
//! Tools for turning Neko/Nek5000 outputs into coordinate-labelled arrays
//!
//! ## Installation
//!
//! Direct install from source:
//!
//! ```shell
//! cargo install --path .
//! ```
//!
//! ## Overview
//!
//! The crate contains two command line tools, one for each kind of output a
//! simulation typically leaves behind.
//!
//! | Command line | Description                                               |
//! | ------------ | --------------------------------------------------------- |
//! | `stats2ds`   | Convert a statistics CSV to de-meaned (time, height) data |
//! | `field2ds`   | Assemble a binary field file onto one rectilinear grid    |
//!
//! Both tools are documented with detailed `--help` messages, including
//! examples for common use cases.
//!
//! ### Statistics
//!
//! Neko accumulates raw moments such as `<uv>` and `<uuu>` at every sampling
//! point. [csv_to_dataset] averages rows sharing a (time, height) pair, pivots
//! every statistic into a time x height array and removes the contributions
//! of the means, leaving central moments. Scalar statistics need a companion
//! fluid statistics file for the velocity and pressure means.
//!
//! | Category                         | Basic | Full |
//! | -------------------------------- | ----- | ---- |
//! | [Category::Fluid](stats::Category)  | 11    | 44   |
//! | [Category::Scalar](stats::Category) | 5     | 35   |
//!
//! ### Field files
//!
//! [nek_dataset] reads every spectral element of a field file, recovers the
//! element axes from the reference positions and combines the elements into a
//! single grid. Only cartesian box meshes are supported.
//!
//! ## Advanced use
//!
//! Everything the tools do is available from the library with a one-liner.
//!
//! ```ignore
//! use nekdata::{csv_to_dataset, nek_dataset, stats::Category};
//!
//! // fluid statistics, completeness inferred from the column count
//! let fluid = csv_to_dataset("fluid_stats.csv", Category::Fluid, None, "z", None::<&str>, false)?;
//!
//! // field file with positions from the first output
//! let field = nek_dataset("field0.f00010", "field0.f00000", &["xmesh", "ymesh", "zmesh"])?;
//! ```
//!
//! As an overview:
//! - The [stats] module resolves statistic registries, pivots tables and
//!   corrects moments.
//! - The [field] module holds the field-file structures and their assembly.
//! - The [dataset] module is the labelled array container both produce.
//! - The [writers] module writes field files and JSON datasets.
//!
//! In the background, the `nom` parser combinator library handles the text
//! parsing, `ndarray` holds all the arrays, and `clap` is used for the
//! command line interfaces.

// Public facing modules
pub mod dataset;
pub mod error;
pub mod field;
pub mod stats;
pub mod utils;
pub mod writers;

// note that docs are hidden to prevent confusing the current simple API
pub mod readers;

// Re-exports of useful data structures
#[doc(inline)]
pub use crate::dataset::Dataset;

#[doc(inline)]
pub use crate::error::Error;

#[doc(inline)]
pub use crate::field::{FieldConverter, FieldFile};

#[doc(inline)]
pub use crate::stats::StatsConverter;

#[doc(inline)]
pub use crate::readers::{csv_to_dataset, nek_dataset, read_dataset, read_field_file};

#[doc(inline)]
pub use crate::writers::{write_dataset_json, write_field_file};
