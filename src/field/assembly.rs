//! Combination of element datasets into one rectilinear grid

// standard library
use std::collections::BTreeMap;
use std::ops::Range;

// crate modules
use crate::dataset::Dataset;
use crate::error::Error;
use crate::field::AXES;
use crate::utils::*;

// external crates
use anyhow::Result;
use log::{debug, trace};
use ndarray::{s, Array1, Array3, Ix3};

/// Merge element datasets into a single dataset by coordinate value
///
/// The global axes are the sorted union of every element's axes. Each element
/// must occupy a contiguous block of the global lattice, and together the
/// elements must cover it completely. Points shared by neighbouring elements
/// appear once. Element attributes are dropped.
///
/// Anything that cannot be reconciled into one lattice fails with
/// [Error::UnsupportedTopology].
pub fn combine_by_coords(datasets: &[Dataset]) -> Result<Dataset> {
    let Some(first) = datasets.first() else {
        return Err(Error::ShapeMismatch("no element datasets to combine".to_string()).into());
    };

    let names = first.variable_names();
    if let Some(n) = datasets.iter().position(|ds| ds.variable_names() != names) {
        return Err(Error::ShapeMismatch(f!(
            "element {n} has variables {:?}, expected {:?}",
            datasets[n].variable_names(),
            names
        ))
        .into());
    }

    // global (z, y, x) axes
    let mut global: Vec<Vec<f64>> = Vec::with_capacity(AXES.len());
    for axis in AXES {
        let mut values = Vec::new();
        for ds in datasets {
            values.extend(element_axis(ds, axis)?);
        }
        global.push(sorted_unique(&values));
    }
    let shape = (global[0].len(), global[1].len(), global[2].len());
    debug!(
        "Combining {} elements onto a {}x{}x{} (z, y, x) grid",
        datasets.len(),
        shape.0,
        shape.1,
        shape.2
    );

    let mut arrays: BTreeMap<&str, Array3<f64>> = names
        .iter()
        .map(|&name| (name, Array3::from_elem(shape, f64::NAN)))
        .collect();
    let mut covered = Array3::from_elem(shape, false);

    for (n, ds) in datasets.iter().enumerate() {
        let mut ranges = Vec::with_capacity(AXES.len());
        for (axis, lattice) in AXES.iter().zip(&global) {
            ranges.push(block_range(lattice, &element_axis(ds, axis)?, axis, n)?);
        }
        let (z, y, x) = (ranges[0].clone(), ranges[1].clone(), ranges[2].clone());
        trace!("Element {n} -> z{z:?} y{y:?} x{x:?}");

        for (name, array) in arrays.iter_mut() {
            let variable = ds.var(name)?;
            if variable.dims != AXES {
                return Err(Error::ShapeMismatch(f!(
                    "element {n} has '{name}' over {:?}, expected {:?}",
                    variable.dims,
                    AXES
                ))
                .into());
            }
            let values = variable.values.view().into_dimensionality::<Ix3>()?;
            array
                .slice_mut(s![z.clone(), y.clone(), x.clone()])
                .assign(&values);
        }
        covered.slice_mut(s![z, y, x]).fill(true);
    }

    let n_gaps = covered.iter().filter(|c| !**c).count();
    if n_gaps > 0 {
        return Err(Error::UnsupportedTopology(f!(
            "elements leave {n_gaps} points of the rectilinear grid uncovered"
        ))
        .into());
    }

    let mut combined = Dataset::new();
    for (axis, values) in AXES.iter().zip(global) {
        combined.insert_coord(axis, Array1::from(values))?;
    }
    for (name, array) in arrays {
        combined.insert_var(name, &AXES, array.into_dyn())?;
    }
    Ok(combined)
}

/// Coordinate values of an element along one axis
fn element_axis(ds: &Dataset, axis: &str) -> Result<Vec<f64>> {
    ds.coord_values(axis)
        .ok_or_else(|| Error::MissingVariable(axis.to_string()).into())
}

/// Index range of an element's axis within the global lattice
///
/// The element's values must sit on consecutive lattice points, otherwise a
/// neighbour has points falling inside this element and no single lattice
/// describes both.
fn block_range(lattice: &[f64], values: &[f64], axis: &str, n: usize) -> Result<Range<usize>> {
    let misaligned = || -> anyhow::Error {
        Error::UnsupportedTopology(f!(
            "element {n} does not line up with its neighbours along {axis}"
        ))
        .into()
    };

    let start = values
        .first()
        .and_then(|v| position_of(lattice, *v))
        .ok_or_else(misaligned)?;

    for (offset, value) in values.iter().enumerate() {
        if position_of(lattice, *value) != Some(start + offset) {
            return Err(misaligned());
        }
    }
    Ok(start..start + values.len())
}
