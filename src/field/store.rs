//! Per-element labelled datasets

// standard library
use std::collections::BTreeMap;

// crate modules
use crate::dataset::Dataset;
use crate::error::Error;
use crate::field::Element;
use crate::utils::*;

// external crates
use anyhow::Result;
use log::trace;
use ndarray::{Array1, Array3, ArrayView, Axis, Dimension};

/// Dimension names of every element array, slowest varying first
pub const AXES: [&str; 3] = ["z", "y", "x"];

/// Decimal places kept when collapsing position meshes to axes
pub const DECIMALS: i32 = 8;

/// Reverse of a meshgrid
///
/// Recovers the 1-D coordinate vector that generated a dense position array
/// along one axis. Values are rounded to [DECIMALS] places before taking the
/// distinct values, so the result is independent of the array orientation.
///
/// ```rust
/// # use nekdata::field::meshgrid_to_dim;
/// # use ndarray::Array3;
/// let x = [0.0, 0.5, 1.0];
/// let mesh = Array3::from_shape_fn((2, 2, 3), |(_, _, i)| x[i] + 1e-12);
/// assert_eq!(meshgrid_to_dim(mesh.view()).to_vec(), x);
/// ```
///
/// Only meaningful for axis-aligned, regular meshes. A curved element gives
/// more distinct values than points along the axis, which callers must treat
/// as an unsupported topology.
pub fn meshgrid_to_dim<D: Dimension>(mesh: ArrayView<f64, D>) -> Array1<f64> {
    let rounded = mesh
        .iter()
        .map(|v| round_to(*v, DECIMALS))
        .collect::<Vec<f64>>();
    Array1::from(sorted_unique(&rounded))
}

/// Labelled view of one element
///
/// Field values come from `element`. Positions, and the static element
/// metadata, come from `reference`, an element of identical shape from a file
/// known to hold accurate geometry.
#[derive(Debug, Clone, Copy)]
pub struct ElementStore<'a> {
    element: &'a Element,
    reference: &'a Element,
}

impl<'a> ElementStore<'a> {
    /// Pair an element with its reference, which must have the same shape
    pub fn new(element: &'a Element, reference: &'a Element) -> Result<Self> {
        if element.shape() != reference.shape() {
            return Err(Error::ShapeMismatch(f!(
                "element of {:?} points paired with a reference of {:?} points",
                element.shape(),
                reference.shape()
            ))
            .into());
        }
        Ok(Self { element, reference })
    }

    /// Dimension names of every variable
    pub fn dimensions(&self) -> [&'static str; 3] {
        AXES
    }

    /// Collapsed x, y and z axes of the reference positions
    pub fn axes(&self) -> [Array1<f64>; 3] {
        [0, 1, 2].map(|i| meshgrid_to_dim(self.reference.position(i)))
    }

    /// Element metadata as JSON strings
    pub fn attrs(&self) -> Result<BTreeMap<String, String>> {
        let mut attrs = BTreeMap::new();
        attrs.insert(
            "boundary_conditions".to_string(),
            serde_json::to_string(&self.reference.boundary_conditions)?,
        );
        attrs.insert(
            "curvature".to_string(),
            serde_json::to_string(&self.reference.curvature)?,
        );
        Ok(attrs)
    }

    /// Every field of the element, in (z, y, x) layout
    ///
    /// Position meshes and velocity are always present, pressure, temperature
    /// and scalars only when the file stored them.
    pub fn variables(&self) -> Vec<(String, Array3<f64>)> {
        let component = |a: &ndarray::Array4<f64>, i: usize| a.index_axis(Axis(0), i).to_owned();
        let (element, reference) = (self.element, self.reference);

        let mut vars = vec![
            ("xmesh".to_string(), component(&reference.pos, 0)),
            ("ymesh".to_string(), component(&reference.pos, 1)),
            ("zmesh".to_string(), component(&reference.pos, 2)),
            ("ux".to_string(), component(&element.vel, 0)),
            ("uy".to_string(), component(&element.vel, 1)),
            ("uz".to_string(), component(&element.vel, 2)),
        ];

        if element.has_pressure() {
            vars.push(("pressure".to_string(), component(&element.pres, 0)));
        }

        if element.has_temperature() {
            vars.push(("temperature".to_string(), component(&element.temp, 0)));
        }

        for i in 0..element.n_scalars() {
            vars.push((f!("s{:02}", i + 1), component(&element.scal, i)));
        }

        vars
    }

    /// Labelled dataset of the element
    ///
    /// Fails with [Error::UnsupportedTopology] if the collapsed axes do not
    /// match the number of points per axis, as happens for curved or skewed
    /// elements.
    pub fn to_dataset(&self) -> Result<Dataset> {
        let [x, y, z] = self.axes();
        let (lz, ly, lx) = self.reference.shape();

        for (name, axis, n) in [("x", &x, lx), ("y", &y, ly), ("z", &z, lz)] {
            if axis.len() != n {
                return Err(Error::UnsupportedTopology(f!(
                    "element has {} distinct {name} positions for {n} points",
                    axis.len()
                ))
                .into());
            }
        }

        let mut ds = Dataset::new();
        ds.insert_coord("x", x)?;
        ds.insert_coord("y", y)?;
        ds.insert_coord("z", z)?;

        for (name, values) in self.variables() {
            ds.insert_var(&name, &AXES, values.into_dyn())?;
        }

        ds.attrs = self.attrs()?;
        trace!("Element dataset with {} variables", ds.data_vars.len());
        Ok(ds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{BoundaryCondition, Contents};
    use ndarray::{Array2, Array4};
    use rstest::rstest;

    const X: [f64; 3] = [0.0, 0.5, 1.0];

    #[rstest]
    #[case::along_x((2, 4, 3), 2)]
    #[case::along_y((2, 3, 4), 1)]
    #[case::along_z((3, 2, 2), 0)]
    fn recovers_axis_in_any_orientation(#[case] shape: (usize, usize, usize), #[case] axis: usize) {
        let mesh = Array3::from_shape_fn(shape, |(k, j, i)| X[[k, j, i][axis]]);
        assert_eq!(meshgrid_to_dim(mesh.view()).to_vec(), X.to_vec());
    }

    #[test]
    fn rounds_away_float_noise() {
        let mesh = Array2::from_shape_fn((3, 3), |(_, i)| X[i] + 3e-10);
        assert_eq!(meshgrid_to_dim(mesh.view()).to_vec(), X.to_vec());
    }

    fn box_element(origin: [f64; 3]) -> Element {
        let contents = Contents {
            geometry: true,
            velocity: true,
            pressure: true,
            temperature: false,
            scalars: 1,
        };
        let mut element = Element::new((2, 2, 3), &contents);
        element.pos = Array4::from_shape_fn((3, 2, 2, 3), |(c, k, j, i)| {
            origin[c] + [i as f64 * 0.5, j as f64, k as f64][c]
        });
        element.vel.fill(1.0);
        element.pres.fill(2.0);
        element.scal.fill(3.0);
        element
    }

    #[test]
    fn element_dataset() {
        let element = box_element([0.0, 0.0, 0.0]);
        let store = ElementStore::new(&element, &element).unwrap();
        let ds = store.to_dataset().unwrap();

        assert_eq!(ds.coord_values("x").unwrap(), vec![0.0, 0.5, 1.0]);
        assert_eq!(ds.coord_values("z").unwrap(), vec![0.0, 1.0]);
        assert_eq!(
            ds.variable_names(),
            vec!["pressure", "s01", "ux", "uy", "uz", "xmesh", "ymesh", "zmesh"]
        );
        assert_eq!(ds.var("ux").unwrap().dims, vec!["z", "y", "x"]);
        assert_eq!(ds.attrs["boundary_conditions"], "[]");
    }

    #[test]
    fn positions_come_from_the_reference() {
        let mut element = box_element([0.0, 0.0, 0.0]);
        element.pos.fill(0.0);
        let mut reference = box_element([1.0, 0.0, 0.0]);
        reference.boundary_conditions.push(BoundaryCondition {
            field: 0,
            face: 0,
            kind: "W".to_string(),
            params: [0.0; 5],
        });

        let ds = ElementStore::new(&element, &reference)
            .unwrap()
            .to_dataset()
            .unwrap();
        assert_eq!(ds.coord_values("x").unwrap(), vec![1.0, 1.5, 2.0]);
        assert!(ds.attrs["boundary_conditions"].contains("\"W\""));
    }

    #[test]
    fn skewed_element_is_unsupported() {
        let mut element = box_element([0.0, 0.0, 0.0]);
        // shear x with y so the x positions no longer form a single axis
        element.pos[[0, 0, 1, 2]] += 0.1;
        let err = ElementStore::new(&element, &element)
            .unwrap()
            .to_dataset()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedTopology(_))
        ));
    }

    #[test]
    fn mismatched_reference_is_rejected() {
        let element = box_element([0.0, 0.0, 0.0]);
        let reference = Element::new((2, 2, 2), &Contents::default());
        assert!(ElementStore::new(&element, &reference).is_err());
    }
}
