//! Long-format statistics tables and their pivot into 2-D arrays
//!
//! Neko writes one row per sampling location, so several rows can share the
//! same (time, height) pair. These are averaged together before every
//! statistic is reshaped into a time x height array.

// standard library
use std::cmp::Ordering;
use std::collections::BTreeMap;

// crate modules
use crate::dataset::{Dataset, TIME};
use crate::error::Error;
use crate::stats::Registry;
use crate::utils::*;

// external crates
use anyhow::Result;
use log::{debug, trace, warn};
use ndarray::{Array1, Array2};

/// Raw table of numeric rows as read from a statistics file
///
/// The first two columns are always (time, height), whatever the header says.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Header names, empty if the file had no header
    pub header: Vec<String>,
    /// Numeric rows, all of the same length
    pub rows: Vec<Vec<f64>>,
}

impl RawTable {
    /// New table, checking that every row has the same number of columns
    pub fn new(header: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.first().map(|r| r.len()).unwrap_or(header.len());
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(Error::ShapeMismatch(f!(
                "row {i} has {} columns, expected {n}",
                row.len()
            ))
            .into());
        }
        if n < 2 {
            return Err(Error::ShapeMismatch(f!(
                "a statistics table needs time and height columns, found {n} columns"
            ))
            .into());
        }
        Ok(Self { header, rows })
    }

    /// Total number of columns, including time and height
    pub fn n_columns(&self) -> usize {
        self.rows
            .first()
            .map(|r| r.len())
            .unwrap_or(self.header.len())
    }

    /// Number of statistic columns following time and height
    pub fn n_data_columns(&self) -> usize {
        self.n_columns().saturating_sub(2)
    }

    /// Average all rows sharing an exact (time, height) pair
    ///
    /// Groups come back sorted by time, then height. Rows with a NaN time or
    /// height belong to no group and are skipped. NaN entries are skipped
    /// when averaging, and a column with no finite entries in a group stays
    /// NaN.
    pub fn aggregate(&self) -> Vec<GroupMean> {
        let n_data = self.n_data_columns();
        let mut groups: BTreeMap<(Key, Key), Accumulator> = BTreeMap::new();
        let mut n_skipped = 0;

        for row in &self.rows {
            if row[0].is_nan() || row[1].is_nan() {
                n_skipped += 1;
                continue;
            }
            groups
                .entry((Key(row[0]), Key(row[1])))
                .or_insert_with(|| Accumulator::new(n_data))
                .add(&row[2..]);
        }

        if n_skipped > 0 {
            warn!("Skipped {n_skipped} rows with a NaN time or height");
        }

        debug!(
            "Aggregated {} rows into {} (time, height) groups",
            self.rows.len(),
            groups.len()
        );

        groups
            .into_iter()
            .map(|((time, height), acc)| GroupMean {
                time: time.0,
                height: height.0,
                values: acc.mean(),
            })
            .collect()
    }

    /// Aggregate and pivot every statistic into a time x height array
    ///
    /// Columns are bound positionally to the registry names. Pairs with no
    /// rows in the table are left as NaN.
    pub fn pivot(&self, registry: &Registry, height: &str) -> Result<Dataset> {
        if registry.len() != self.n_data_columns() {
            return Err(Error::ColumnMismatch {
                category: registry.category(),
                expected: registry.len().to_string(),
                found: self.n_data_columns(),
            }
            .into());
        }

        let groups = self.aggregate();
        let times = sorted_unique(&groups.iter().map(|g| g.time).collect::<Vec<f64>>());
        let heights = sorted_unique(&groups.iter().map(|g| g.height).collect::<Vec<f64>>());
        trace!("Pivot grid of {} times x {} heights", times.len(), heights.len());

        let mut arrays = vec![Array2::from_elem((times.len(), heights.len()), f64::NAN); registry.len()];
        for group in &groups {
            // both are guaranteed present as the axes were built from the groups
            let (Some(i), Some(j)) = (
                position_of(&times, group.time),
                position_of(&heights, group.height),
            ) else {
                continue;
            };
            for (array, value) in arrays.iter_mut().zip(&group.values) {
                array[[i, j]] = *value;
            }
        }

        let n_missing = times.len() * heights.len() - groups.len();
        if n_missing > 0 {
            warn!("{n_missing} (time, height) pairs have no samples and are left as NaN");
        }

        let mut ds = Dataset::new();
        ds.insert_coord(TIME, Array1::from(times))?;
        ds.insert_coord(height, Array1::from(heights))?;
        for (name, array) in registry.names().into_iter().zip(arrays) {
            ds.insert_var(name, &[TIME, height], array.into_dyn())?;
        }
        Ok(ds)
    }
}

/// Column means of all rows sharing one (time, height) pair
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub time: f64,
    pub height: f64,
    pub values: Vec<f64>,
}

/// Orderable wrapper so that floats can key a map
#[derive(Debug, Clone, Copy)]
struct Key(f64);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        float_cmp(&self.0, &other.0)
    }
}

/// Running sums and counts for one group, NaN excluded
#[derive(Debug, Clone)]
struct Accumulator {
    sums: Vec<f64>,
    counts: Vec<usize>,
}

impl Accumulator {
    fn new(n: usize) -> Self {
        Self {
            sums: vec![0.0; n],
            counts: vec![0; n],
        }
    }

    fn add(&mut self, values: &[f64]) {
        for ((sum, count), value) in self.sums.iter_mut().zip(&mut self.counts).zip(values) {
            if !value.is_nan() {
                *sum += value;
                *count += 1;
            }
        }
    }

    fn mean(&self) -> Vec<f64> {
        self.sums
            .iter()
            .zip(&self.counts)
            .map(|(sum, &count)| match count {
                0 => f64::NAN,
                n => sum / n as f64,
            })
            .collect()
    }
}
