// standard library
use std::path::Path;

// crate modules
use crate::dataset::{Dataset, TIME};
use crate::error::Error;
use crate::field::{combine_by_coords, ElementStore, FieldFile};
use crate::readers::FieldFileReader;
use crate::utils::*;

// external crates
use anyhow::{anyhow, Result};
use itertools::izip;
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, info};

/// Converts a field file into a single rectilinear [Dataset]
///
/// Example:
/// ```ignore
///     let mut converter = FieldConverter::new();
///     converter.set_drop_variables(&["xmesh", "ymesh", "zmesh"]);
///     let ds = converter.convert("field0.f00010", "field0.f00000")?;
/// ```
#[derive(Debug, Default)]
pub struct FieldConverter {
    /// Variables removed from the final dataset
    drop_variables: Vec<String>,
    /// Disable progress bar?
    disable_progress: bool,
}

impl FieldConverter {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Variables to remove from the assembled dataset
    pub fn set_drop_variables<S: AsRef<str>>(&mut self, names: &[S]) {
        self.drop_variables = names.iter().map(|n| n.as_ref().to_string()).collect();
    }

    /// Do not print the progress indicators
    pub fn disable_progress(&mut self) {
        debug!("Progress bar disabled");
        self.disable_progress = true;
    }

    /// Read `path` and assemble it using the positions from `reference`
    pub fn convert<P: AsRef<Path>, R: AsRef<Path>>(&self, path: P, reference: R) -> Result<Dataset> {
        let field = Self::load(path.as_ref())?;
        let reference = Self::load(reference.as_ref())?;
        self.assemble(&field, &reference)
    }

    /// Assemble already loaded field and reference files
    pub fn assemble(&self, field: &FieldFile, reference: &FieldFile) -> Result<Dataset> {
        if field.elements.len() != reference.elements.len() {
            return Err(Error::ShapeMismatch(f!(
                "field has {} elements but reference has {}",
                field.elements.len(),
                reference.elements.len()
            ))
            .into());
        }

        let stores = izip!(&field.elements, &reference.elements)
            .map(|(element, reference)| ElementStore::new(element, reference))
            .collect::<Result<Vec<ElementStore>>>()?;

        debug!("Building {} element datasets", stores.len());
        let mut progress_bar = self.init_progress_bar(stores.len())?;
        let mut element_datasets = Vec::with_capacity(stores.len());
        for store in &stores {
            element_datasets.push(store.to_dataset()?);
            progress_bar.update(1)?;
        }
        if !self.disable_progress {
            eprintln!()
        };

        let mut ds = combine_by_coords(&element_datasets)?;

        // one time for the whole snapshot, from the primary file only
        ds.insert_scalar_coord(TIME, field.time());

        if !self.drop_variables.is_empty() {
            ds.drop_vars(&self.drop_variables)?;
        }

        Ok(ds)
    }

    /// Read a field file, reporting any failure as a load failure of `path`
    fn load(path: &Path) -> Result<FieldFile> {
        info!("Reading {}", path.display());
        FieldFileReader::new()
            .parse(path)
            .map_err(|e| e.context(Error::LoadFailure(path.to_path_buf())))
    }

    /// Initialise the progress bar, if wanted
    fn init_progress_bar(&self, total: usize) -> Result<Bar> {
        BarBuilder::default()
            .total(total)
            .desc("Elements")
            .unit(" el")
            .disable(self.disable_progress)
            .build()
            .map_err(|e| anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Contents, Element, Header};
    use ndarray::Array4;

    /// Two elements side by side along x, each 2x2x2 points of unit size
    fn field(time: f64, offset: f64) -> FieldFile {
        let contents = Contents {
            geometry: true,
            velocity: true,
            pressure: true,
            temperature: false,
            scalars: 0,
        };
        let elements = [0.0, 1.0]
            .iter()
            .map(|x0| {
                let mut e = Element::new((2, 2, 2), &contents);
                e.pos = Array4::from_shape_fn((3, 2, 2, 2), |(c, k, j, i)| {
                    [x0 + i as f64, j as f64, k as f64][c]
                });
                e.vel = e.pos.mapv(|p| p + offset);
                e.pres.fill(offset);
                e
            })
            .collect();
        FieldFile {
            header: Header {
                word_size: 8,
                orders: [2, 2, 2],
                n_elements_global: 2,
                n_elements: 2,
                time,
                step: 10,
                file_id: 0,
                n_files: 1,
                contents,
            },
            elements,
        }
    }

    fn quiet() -> FieldConverter {
        let mut converter = FieldConverter::new();
        converter.disable_progress();
        converter
    }

    #[test]
    fn assembles_with_time_from_the_field() {
        let ds = quiet()
            .assemble(&field(2.5, 1.0), &field(0.0, 0.0))
            .unwrap();
        assert_eq!(ds.coords[TIME].as_scalar(), Some(2.5));
        assert_eq!(ds.coord_values("x").unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(ds.var("ux").unwrap().values[[1, 1, 2]], 3.0);
        assert_eq!(ds.var("pressure").unwrap().values[[0, 0, 0]], 1.0);
    }

    #[test]
    fn drops_requested_variables() {
        let mut converter = quiet();
        converter.set_drop_variables(&["xmesh", "ymesh", "zmesh"]);
        let ds = converter.assemble(&field(1.0, 0.0), &field(0.0, 0.0)).unwrap();
        assert_eq!(ds.variable_names(), vec!["pressure", "ux", "uy", "uz"]);
    }

    #[test]
    fn unknown_drop_variable_fails() {
        let mut converter = quiet();
        converter.set_drop_variables(&["temperature"]);
        let err = converter
            .assemble(&field(1.0, 0.0), &field(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnknownVariable(_))
        ));
    }

    #[test]
    fn element_count_must_match() {
        let mut reference = field(0.0, 0.0);
        reference.elements.pop();
        assert!(quiet().assemble(&field(1.0, 0.0), &reference).is_err());
    }

    #[test]
    fn unreadable_file_is_a_load_failure() {
        let err = quiet()
            .convert("/nonexistent/field0.f00001", "/nonexistent/field0.f00000")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::LoadFailure(_))
        ));
        assert!(err.to_string().starts_with("Failed to load"));
    }
}
