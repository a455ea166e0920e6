//! Writers for field files and datasets
//!
//! Field files are always written as a single-file, little endian output in
//! the word size given by their header. Datasets can be written as JSON for
//! use outside of Rust, the binary form is [Dataset::save].

// standard library
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// crate modules
use crate::dataset::Dataset;
use crate::field::{Element, FieldFile};
use crate::readers::{ENDIAN_TAG, HEADER_BYTES};
use crate::utils::*;

// external crates
use anyhow::{anyhow, Context, Result};
use log::debug;
use ndarray::{Array4, Axis};

/// Write a [FieldFile] in the Nek binary layout
///
/// Element ids are written as `1..=nel`, in the order of `field.elements`.
/// Every element must hold the arrays announced by the header contents.
///
/// Example
/// ```ignore
/// let field = nekdata::read_field_file("field0.f00000")?;
/// nekdata::write_field_file(&field, "copy0.f00000")?;
/// ```
pub fn write_field_file<P: AsRef<Path>>(field: &FieldFile, path: P) -> Result<()> {
    let path = path.as_ref();
    let header = &field.header;
    check_elements(field)?;

    let mut text = header.to_string().into_bytes();
    if text.len() > HEADER_BYTES {
        return Err(anyhow!(
            "Header is {} bytes, at most {HEADER_BYTES} allowed",
            text.len()
        ));
    }
    text.resize(HEADER_BYTES, b' ');

    debug!("Writing {} elements to {}", field.elements.len(), path.display());
    let file = File::create(path).with_context(|| f!("Could not create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&text)?;
    writer.write_all(&ENDIAN_TAG.to_le_bytes())?;
    for id in 1..=field.elements.len() {
        writer.write_all(&(id as i32).to_le_bytes())?;
    }

    let ndim = header.ndim();
    let contents = header.contents;
    let word_size = header.word_size;
    let elements = &field.elements;

    if contents.geometry {
        for e in elements {
            for c in 0..ndim {
                write_block(&mut writer, &e.pos, c, word_size)?;
            }
        }
    }

    if contents.velocity {
        for e in elements {
            for c in 0..ndim {
                write_block(&mut writer, &e.vel, c, word_size)?;
            }
        }
    }

    if contents.pressure {
        for e in elements {
            write_block(&mut writer, &e.pres, 0, word_size)?;
        }
    }

    if contents.temperature {
        for e in elements {
            write_block(&mut writer, &e.temp, 0, word_size)?;
        }
    }

    for s in 0..contents.scalars {
        for e in elements {
            write_block(&mut writer, &e.scal, s, word_size)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write a dataset as pretty-printed JSON
pub fn write_dataset_json<P: AsRef<Path>>(ds: &Dataset, path: P) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing dataset JSON to {}", path.display());
    let file = File::create(path).with_context(|| f!("Could not create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, ds)
        .with_context(|| f!("Could not serialise dataset to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| f!("Could not write {}", path.display()))?;
    Ok(())
}

/// Every element must match the header shape and contents
fn check_elements(field: &FieldFile) -> Result<()> {
    let header = &field.header;
    if !matches!(header.word_size, 4 | 8) {
        return Err(anyhow!("Unsupported word size {}", header.word_size));
    }

    if field.elements.len() != header.n_elements || header.n_elements != header.n_elements_global
    {
        return Err(anyhow!(
            "Header announces {} of {} elements but {} were given",
            header.n_elements,
            header.n_elements_global,
            field.elements.len()
        ));
    }

    let contents = header.contents;
    let conforms = |e: &Element| {
        e.shape() == header.shape()
            && (!contents.pressure || e.has_pressure())
            && (!contents.temperature || e.has_temperature())
            && e.n_scalars() >= contents.scalars
    };

    match field.elements.iter().position(|e| !conforms(e)) {
        Some(n) => Err(anyhow!(
            "Element {n} does not match the header ({:?} points, contents {contents})",
            header.shape()
        )),
        None => Ok(()),
    }
}

fn write_block<W: Write>(
    writer: &mut W,
    array: &Array4<f64>,
    c: usize,
    word_size: usize,
) -> Result<()> {
    // standard layout iteration is (z, y, x) with x fastest
    for v in array.index_axis(Axis(0), c).iter() {
        match word_size {
            4 => writer.write_all(&(*v as f32).to_le_bytes())?,
            _ => writer.write_all(&v.to_le_bytes())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Contents, Header};
    use crate::readers::FieldFileReader;
    use tempfile::tempdir;

    fn single_element(word_size: usize) -> FieldFile {
        let contents = Contents {
            geometry: true,
            velocity: true,
            temperature: true,
            scalars: 2,
            ..Default::default()
        };
        let mut element = Element::new((2, 2, 2), &contents);
        element.pos = Array4::from_shape_fn((3, 2, 2, 2), |(c, k, j, i)| [i, j, k][c] as f64);
        element.vel.fill(0.25);
        element.temp.fill(300.0);
        element.scal[[1, 1, 1, 1]] = 7.0;
        FieldFile {
            header: Header {
                word_size,
                orders: [2, 2, 2],
                n_elements_global: 1,
                n_elements: 1,
                time: 12.5,
                step: 250,
                file_id: 0,
                n_files: 1,
                contents,
            },
            elements: vec![element],
        }
    }

    #[test]
    fn double_precision_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("field0.f00001");
        let field = single_element(8);
        write_field_file(&field, &path).unwrap();
        let read = FieldFileReader::new().parse(&path).unwrap();
        assert_eq!(read, field);
    }

    #[test]
    fn single_precision_file_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("field0.f00001");
        write_field_file(&single_element(4), &path).unwrap();
        // header, tag, one id, then 3 + 3 + 1 + 2 blocks of 8 points
        let expected = HEADER_BYTES + 4 + 4 + 9 * 8 * 4;
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, expected);
    }

    #[test]
    fn inconsistent_header_is_rejected() {
        let dir = tempdir().unwrap();
        let mut field = single_element(8);
        field.header.contents.pressure = true;
        assert!(write_field_file(&field, dir.path().join("bad")).is_err());
    }

    #[test]
    fn json_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ds.json");
        let mut ds = Dataset::new();
        ds.insert_scalar_coord("time", 1.5);
        write_dataset_json(&ds, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"time\""));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn json_reports_failed_writes() {
        let mut ds = Dataset::new();
        ds.insert_scalar_coord("time", 1.5);
        assert!(write_dataset_json(&ds, "/dev/full").is_err());
    }
}
