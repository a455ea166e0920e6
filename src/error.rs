//! Error taxonomy shared by both conversion pipelines
//!
//! Library functions return [anyhow::Result], but anything the caller may
//! want to act on is raised as one of these variants so that it can be
//! recovered with `downcast_ref`.
//!
//! ```rust
//! # use nekdata::Error;
//! let err = anyhow::Error::new(Error::UnknownVariable("ux".to_string()));
//! assert!(matches!(
//!     err.downcast_ref::<Error>(),
//!     Some(Error::UnknownVariable(_))
//! ));
//! ```

// standard library
use std::path::PathBuf;

// crate modules
use crate::stats::Category;

// external crates
use thiserror::Error;

/// Distinct failure categories for statistics and field-file conversion
#[derive(Debug, Error)]
pub enum Error {
    /// Declared registry length disagrees with the data columns in a table
    #[error("{category} statistics expect {expected} data columns, found {found}")]
    ColumnMismatch {
        category: Category,
        expected: String,
        found: usize,
    },

    /// Cross-category correction requested without a companion file
    #[error("{0} statistics need a companion fluid statistics file for the mean terms")]
    MissingCompanion(Category),

    /// Companion dataset is not sampled on the same coordinates
    #[error("companion dataset differs along the '{0}' coordinate")]
    CoordinateMismatch(String),

    /// A variable needed for a computation is absent
    #[error("variable '{0}' not found in dataset")]
    MissingVariable(String),

    /// A variable the caller asked to remove is absent
    #[error("cannot drop '{0}', no such variable in dataset")]
    UnknownVariable(String),

    /// Arrays or element collections that must agree in shape do not
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The field-file reader failed on this path
    #[error("Failed to load {}", .0.display())]
    LoadFailure(PathBuf),

    /// Elements cannot be reconciled into a single rectilinear grid
    #[error(
        "Opening dataset failed because of an unsupported mesh ({0}). \
         Only cartesian box meshes are currently supported."
    )]
    UnsupportedTopology(String),
}
