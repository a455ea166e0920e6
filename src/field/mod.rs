//! Nek field files and their assembly into rectilinear datasets
//!
//! # Overview
//!
//! A Nek5000/Neko field file stores every spectral element as a dense block
//! of `lz x ly x lx` points, with positions and sampled fields for each point.
//! The elements come in no particular spatial order.
//!
//! For box meshes the element blocks tile a single rectilinear lattice, so the
//! whole field can be presented as one dataset over global `x`, `y` and `z`
//! axes:
//!
//! 1. each element's 1-D axes are recovered from its position meshgrid
//!    ([meshgrid_to_dim]),
//! 2. each element becomes a small labelled dataset ([ElementStore]),
//! 3. the element datasets are combined by coordinate value
//!    ([combine_by_coords]) and the simulation time attached.
//!
//! Later field files often omit the geometry, so positions are taken from a
//! reference file (typically the first output, `field0.f00000`) with the same
//! element topology.
//!
//! ```ignore
//! use nekdata::field::FieldConverter;
//!
//! let ds = FieldConverter::new().convert(
//!     "path/to/case/field0.f00010",
//!     "path/to/case/field0.f00000",
//! )?;
//! ```

mod assembly;
mod converter;
mod store;

#[doc(inline)]
pub use crate::field::assembly::combine_by_coords;

#[doc(inline)]
pub use crate::field::converter::FieldConverter;

#[doc(inline)]
pub use crate::field::store::{meshgrid_to_dim, ElementStore, AXES, DECIMALS};

// crate modules
use crate::utils::*;

// external crates
use ndarray::{Array4, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// A complete field file: header and all elements ordered by element id
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFile {
    pub header: Header,
    pub elements: Vec<Element>,
}

impl FieldFile {
    /// Simulation time of the snapshot
    pub fn time(&self) -> f64 {
        self.header.time
    }
}

impl std::fmt::Display for FieldFile {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let [lx, ly, lz] = self.header.orders;
        let mut s = "FieldFile {\n".to_string();
        s += &f!("    elements: {} ({lx}x{ly}x{lz} points)\n", self.elements.len());
        s += &f!("    time: {}\n", self.header.time.sci(5, 2));
        s += &f!("    step: {}\n", self.header.step);
        s += &f!("    contents: {}\n}}", self.header.contents);
        write!(f, "{}", s)
    }
}

/// Values from the 132 byte ASCII header of a field file
///
/// ```text
/// #std 8  8  8  8        512        512  0.1000000000000E+01     100      0      1 XUPT
///      |  |  |  |          |          |                    |       |      |      | |
///   wdsz lx ly lz      nelgt        nel                 time   istep    fid   nfid contents
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Bytes per real, 4 or 8
    pub word_size: usize,
    /// Points per element along x, y, z
    pub orders: [usize; 3],
    /// Elements in the whole mesh
    pub n_elements_global: usize,
    /// Elements in this file
    pub n_elements: usize,
    /// Simulation time
    pub time: f64,
    /// Time step number
    pub step: usize,
    /// Index of this file in a multi-file output
    pub file_id: usize,
    /// Number of files in a multi-file output
    pub n_files: usize,
    /// Which fields are stored
    pub contents: Contents,
}

impl Header {
    /// Two dimensional files have a single point along z
    pub fn ndim(&self) -> usize {
        match self.orders[2] {
            1 => 2,
            _ => 3,
        }
    }

    /// Points in one element block, `None` if the orders overflow
    pub fn points_per_element(&self) -> Option<usize> {
        self.orders
            .iter()
            .try_fold(1usize, |acc, n| acc.checked_mul(*n))
    }

    /// Element array shape in (z, y, x) order
    pub fn shape(&self) -> (usize, usize, usize) {
        let [lx, ly, lz] = self.orders;
        (lz, ly, lx)
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let [lx, ly, lz] = self.orders;
        write!(
            f,
            "#std {} {:2} {:2} {:2} {:10} {:10} {:20.13E} {:9} {:6} {:6} {}",
            self.word_size,
            lx,
            ly,
            lz,
            self.n_elements_global,
            self.n_elements,
            self.time,
            self.step,
            self.file_id,
            self.n_files,
            self.contents
        )
    }
}

/// Flags for the fields present in a file, e.g. `XUPTS02`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contents {
    /// `X`: point positions
    pub geometry: bool,
    /// `U`: velocity
    pub velocity: bool,
    /// `P`: pressure
    pub pressure: bool,
    /// `T`: temperature
    pub temperature: bool,
    /// `Snn`: number of passive scalars
    pub scalars: usize,
}

impl std::fmt::Display for Contents {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = String::new();
        for (present, c) in [
            (self.geometry, 'X'),
            (self.velocity, 'U'),
            (self.pressure, 'P'),
            (self.temperature, 'T'),
        ] {
            if present {
                s.push(c);
            }
        }
        if self.scalars > 0 {
            s += &f!("S{:02}", self.scalars);
        }
        write!(f, "{s}")
    }
}

/// One spectral element
///
/// Every array is indexed `[component, z, y, x]`. Position and velocity
/// always have three components, the third being zero in 2-D. Pressure and
/// temperature have one component when present and none otherwise, scalars
/// have one component per passive scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub pos: Array4<f64>,
    pub vel: Array4<f64>,
    pub pres: Array4<f64>,
    pub temp: Array4<f64>,
    pub scal: Array4<f64>,
    /// Boundary conditions, only known from mesh files
    pub boundary_conditions: Vec<BoundaryCondition>,
    /// Curved edges, only known from mesh files
    pub curvature: Vec<Curvature>,
}

impl Element {
    /// Zero-filled element with arrays sized for `contents`
    pub fn new(shape: (usize, usize, usize), contents: &Contents) -> Self {
        let (lz, ly, lx) = shape;
        let sized = |n: usize| -> Array4<f64> { Array4::zeros((n, lz, ly, lx)) };
        Self {
            pos: sized(3),
            vel: sized(3),
            pres: sized(contents.pressure as usize),
            temp: sized(contents.temperature as usize),
            scal: sized(contents.scalars),
            boundary_conditions: Vec::new(),
            curvature: Vec::new(),
        }
    }

    /// Points per axis in (z, y, x) order
    pub fn shape(&self) -> (usize, usize, usize) {
        let s = self.pos.shape();
        (s[1], s[2], s[3])
    }

    /// Position mesh along axis `i` (0 = x, 1 = y, 2 = z)
    pub fn position(&self, i: usize) -> ArrayView3<f64> {
        self.pos.index_axis(Axis(0), i)
    }

    pub fn has_pressure(&self) -> bool {
        !self.pres.is_empty()
    }

    pub fn has_temperature(&self) -> bool {
        !self.temp.is_empty()
    }

    pub fn n_scalars(&self) -> usize {
        self.scal.shape()[0]
    }
}

/// Boundary condition on one face of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    /// Field the condition applies to (0 = velocity)
    pub field: usize,
    /// Face index, 0 to 5
    pub face: usize,
    /// Nek condition tag, e.g. "W", "P", "v"
    pub kind: String,
    /// Condition parameters
    pub params: [f64; 5],
}

/// Curvature of one element edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curvature {
    /// Edge index, 0 to 11
    pub edge: usize,
    /// Nek curvature tag, e.g. 'C', 'm', 's'
    pub kind: char,
    /// Curvature parameters
    pub params: [f64; 5],
}
