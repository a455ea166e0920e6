//! Registries of the statistics written by Neko
//!
//! Every statistic is declared once with an explicit [Moment] describing how
//! it was accumulated. The correction step works entirely from these tags,
//! so nothing is ever inferred from the spelling of a name.

// crate modules
use crate::error::Error;
use crate::utils::f;

// external crates
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// The two families of statistics files
///
/// Fluid statistics hold pressure and velocity moments. Scalar statistics
/// hold moments of a transported scalar, including products with fluid
/// quantities whose means only exist in the fluid statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Pressure and velocity statistics (primary)
    Fluid,
    /// Transported scalar statistics (secondary)
    Scalar,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Fluid => write!(f, "fluid"),
            Self::Scalar => write!(f, "scalar"),
        }
    }
}

/// Which of the Neko statistic sets was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Completeness {
    /// First and second order moments only
    Basic,
    /// Everything, including higher moments, gradients and dissipation
    Full,
}

impl std::fmt::Display for Completeness {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// First order physical quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Pressure
    P,
    /// Streamwise velocity
    U,
    /// Spanwise velocity
    V,
    /// Vertical velocity
    W,
    /// Transported scalar
    S,
}

impl Quantity {
    /// Name of the first order statistic holding the mean of this quantity
    pub const fn name(&self) -> &'static str {
        match self {
            Self::P => "p",
            Self::U => "u",
            Self::V => "v",
            Self::W => "w",
            Self::S => "s",
        }
    }

    /// Statistics file in which the mean of this quantity is found
    pub const fn category(&self) -> Category {
        match self {
            Self::S => Category::Scalar,
            _ => Category::Fluid,
        }
    }
}

/// How a statistic was accumulated
///
/// Only products of first order quantities are corrected. A fourth order
/// moment is always the fourth power of a single quantity, so a product of
/// four distinct quantities cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    /// Mean of a quantity, never corrected
    First(Quantity),
    /// Mean of a product of two quantities
    Second(Quantity, Quantity),
    /// Mean of a product of three quantities
    Third(Quantity, Quantity, Quantity),
    /// Mean of the fourth power of a quantity
    Fourth(Quantity),
    /// Gradient and dissipation terms, left as accumulated
    Raw,
}

impl Moment {
    /// Order of the moment, `None` for raw terms
    pub const fn order(&self) -> Option<usize> {
        match self {
            Self::First(_) => Some(1),
            Self::Second(..) => Some(2),
            Self::Third(..) => Some(3),
            Self::Fourth(_) => Some(4),
            Self::Raw => None,
        }
    }

    /// Quantities whose means make up the correction term
    ///
    /// Empty for moments that are not corrected.
    pub fn constituents(&self) -> Vec<Quantity> {
        match *self {
            Self::Second(a, b) => vec![a, b],
            Self::Third(a, b, c) => vec![a, b, c],
            Self::Fourth(a) => vec![a; 4],
            Self::First(_) | Self::Raw => Vec::new(),
        }
    }

    /// Does this statistic have a mean product subtracted
    pub const fn is_corrected(&self) -> bool {
        matches!(self, Self::Second(..) | Self::Third(..) | Self::Fourth(_))
    }
}

/// A named statistic and how it was accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistic {
    /// Column name in the dataset
    pub name: &'static str,
    /// Moment structure
    pub moment: Moment,
}

const fn stat(name: &'static str, moment: Moment) -> Statistic {
    Statistic { name, moment }
}

use Moment::{First, Fourth, Raw, Second, Third};
use Quantity::{P, S, U, V, W};

/// Neko `fluid_stats` basic set
pub const FLUID_BASIC: [Statistic; 11] = [
    stat("p", First(P)),
    stat("u", First(U)),
    stat("v", First(V)),
    stat("w", First(W)),
    stat("pp", Second(P, P)),
    stat("uu", Second(U, U)),
    stat("vv", Second(V, V)),
    stat("ww", Second(W, W)),
    stat("uv", Second(U, V)),
    stat("uw", Second(U, W)),
    stat("vw", Second(V, W)),
];

/// Neko `fluid_stats` full set
pub const FLUID_FULL: [Statistic; 44] = [
    stat("p", First(P)),
    stat("u", First(U)),
    stat("v", First(V)),
    stat("w", First(W)),
    stat("pp", Second(P, P)),
    stat("uu", Second(U, U)),
    stat("vv", Second(V, V)),
    stat("ww", Second(W, W)),
    stat("uv", Second(U, V)),
    stat("uw", Second(U, W)),
    stat("vw", Second(V, W)),
    stat("uuu", Third(U, U, U)),
    stat("vvv", Third(V, V, V)),
    stat("www", Third(W, W, W)),
    stat("uuv", Third(U, U, V)),
    stat("uuw", Third(U, U, W)),
    stat("uvv", Third(U, V, V)),
    stat("uvw", Third(U, V, W)),
    stat("vvw", Third(V, V, W)),
    stat("uww", Third(U, W, W)),
    stat("vww", Third(V, W, W)),
    stat("uuuu", Fourth(U)),
    stat("vvvv", Fourth(V)),
    stat("wwww", Fourth(W)),
    stat("ppp", Third(P, P, P)),
    stat("pppp", Fourth(P)),
    stat("pu", Second(P, U)),
    stat("pv", Second(P, V)),
    stat("pw", Second(P, W)),
    stat("pdudx", Raw),
    stat("pdudy", Raw),
    stat("pdudz", Raw),
    stat("pdvdx", Raw),
    stat("pdvdy", Raw),
    stat("pdvdz", Raw),
    stat("pdwdx", Raw),
    stat("pdwdy", Raw),
    stat("pdwdz", Raw),
    stat("e11", Raw),
    stat("e22", Raw),
    stat("e33", Raw),
    stat("e12", Raw),
    stat("e13", Raw),
    stat("e23", Raw),
];

/// Neko `scalar_stats` basic set
pub const SCALAR_BASIC: [Statistic; 5] = [
    stat("s", First(S)),
    stat("us", Second(U, S)),
    stat("vs", Second(V, S)),
    stat("ws", Second(W, S)),
    stat("ss", Second(S, S)),
];

/// Neko `scalar_stats` full set
pub const SCALAR_FULL: [Statistic; 35] = [
    stat("s", First(S)),
    stat("us", Second(U, S)),
    stat("vs", Second(V, S)),
    stat("ws", Second(W, S)),
    stat("ss", Second(S, S)),
    stat("sss", Third(S, S, S)),
    stat("ssss", Fourth(S)),
    stat("uss", Third(U, S, S)),
    stat("vss", Third(V, S, S)),
    stat("wss", Third(W, S, S)),
    stat("uus", Third(U, U, S)),
    stat("vvs", Third(V, V, S)),
    stat("wws", Third(W, W, S)),
    stat("uvs", Third(U, V, S)),
    stat("uws", Third(U, W, S)),
    stat("vws", Third(V, W, S)),
    stat("ps", Second(P, S)),
    stat("pdsdx", Raw),
    stat("pdsdy", Raw),
    stat("pdsdz", Raw),
    stat("udsdx", Raw),
    stat("udsdy", Raw),
    stat("udsdz", Raw),
    stat("vdsdx", Raw),
    stat("vdsdy", Raw),
    stat("vdsdz", Raw),
    stat("wdsdx", Raw),
    stat("wdsdy", Raw),
    stat("wdsdz", Raw),
    stat("ess", Raw),
    stat("eus", Raw),
    stat("evs", Raw),
    stat("ews", Raw),
    stat("es1", Raw),
    stat("es2", Raw),
];

/// Ordered set of statistics expected in a file
///
/// ```rust
/// # use nekdata::stats::{Category, Completeness, Registry};
/// // infer the set from the number of data columns
/// let registry = Registry::resolve(Category::Fluid, None, 11).unwrap();
/// assert_eq!(registry.completeness(), Completeness::Basic);
/// assert_eq!(registry.names()[..4], ["p", "u", "v", "w"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registry {
    category: Category,
    completeness: Completeness,
    statistics: &'static [Statistic],
}

impl Registry {
    /// Registry for a known category and completeness
    pub fn new(category: Category, completeness: Completeness) -> Self {
        let statistics: &'static [Statistic] = match (category, completeness) {
            (Category::Fluid, Completeness::Basic) => &FLUID_BASIC,
            (Category::Fluid, Completeness::Full) => &FLUID_FULL,
            (Category::Scalar, Completeness::Basic) => &SCALAR_BASIC,
            (Category::Scalar, Completeness::Full) => &SCALAR_FULL,
        };
        Self {
            category,
            completeness,
            statistics,
        }
    }

    /// Registry matching a table with `n_columns` data columns
    ///
    /// Without an explicit completeness the set is inferred from the column
    /// count. Either way the registry length must equal `n_columns`.
    pub fn resolve(
        category: Category,
        completeness: Option<Completeness>,
        n_columns: usize,
    ) -> Result<Self> {
        let registry = match completeness {
            Some(c) => Self::new(category, c),
            None => {
                let basic = Self::new(category, Completeness::Basic);
                let full = Self::new(category, Completeness::Full);
                match n_columns {
                    n if n == basic.len() => basic,
                    n if n == full.len() => full,
                    n => {
                        return Err(Error::ColumnMismatch {
                            category,
                            expected: f!("{} or {}", basic.len(), full.len()),
                            found: n,
                        }
                        .into())
                    }
                }
            }
        };

        if registry.len() != n_columns {
            return Err(Error::ColumnMismatch {
                category,
                expected: f!("{} ({})", registry.len(), registry.completeness),
                found: n_columns,
            }
            .into());
        }

        debug!(
            "Resolved {} {} registry of {} statistics",
            registry.category,
            registry.completeness,
            registry.len()
        );
        Ok(registry)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn completeness(&self) -> Completeness {
        self.completeness
    }

    /// Declared statistics in column order
    pub fn statistics(&self) -> &'static [Statistic] {
        self.statistics
    }

    /// Declared names in column order
    pub fn names(&self) -> Vec<&'static str> {
        self.statistics.iter().map(|s| s.name).collect()
    }

    pub fn len(&self) -> usize {
        self.statistics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statistics.is_empty()
    }

    /// Does any correction need means from the other category
    pub fn needs_companion(&self) -> bool {
        self.statistics
            .iter()
            .flat_map(|s| s.moment.constituents())
            .any(|q| q.category() != self.category)
    }
}
