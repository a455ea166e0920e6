//! End to end assembly of binary field files

use std::path::{Path, PathBuf};

use nekdata::field::{Contents, Element, FieldConverter, FieldFile, Header};
use nekdata::{nek_dataset, read_field_file, write_field_file, Error};

use ndarray::Array4;
use tempfile::tempdir;

const LOCAL: [f64; 3] = [0.0, 0.5, 1.0];

fn velocity(x: f64, y: f64, z: f64) -> f64 {
    x + 10.0 * y + 100.0 * z
}

/// Elements of unit size at the given origins, three points per axis
fn field(origins: &[[f64; 3]], contents: Contents, time: f64, nz: usize) -> FieldFile {
    let elements = origins
        .iter()
        .enumerate()
        .map(|(n, origin)| {
            let mut e = Element::new((nz, 3, 3), &contents);
            e.pos = Array4::from_shape_fn((3, nz, 3, 3), |(c, k, j, i)| {
                origin[c] + [LOCAL[i], LOCAL[j], LOCAL[k]][c]
            });
            e.vel = Array4::from_shape_fn((3, nz, 3, 3), |(c, k, j, i)| match c {
                0 => velocity(e.pos[[0, k, j, i]], e.pos[[1, k, j, i]], e.pos[[2, k, j, i]]),
                1 => n as f64,
                _ => 0.0,
            });
            if contents.pressure {
                e.pres.fill(time);
            }
            e
        })
        .collect::<Vec<_>>();

    FieldFile {
        header: Header {
            word_size: 8,
            orders: [3, 3, nz],
            n_elements_global: elements.len(),
            n_elements: elements.len(),
            time,
            step: (time * 100.0) as usize,
            file_id: 0,
            n_files: 1,
            contents,
        },
        elements,
    }
}

fn geometry() -> Contents {
    Contents {
        geometry: true,
        velocity: true,
        pressure: true,
        ..Default::default()
    }
}

fn no_geometry() -> Contents {
    Contents {
        geometry: false,
        ..geometry()
    }
}

fn write(dir: &Path, name: &str, field: &FieldFile) -> PathBuf {
    let path = dir.join(name);
    write_field_file(field, &path).unwrap();
    path
}

#[test]
fn field_file_round_trip() {
    let dir = tempdir().unwrap();
    let field = field(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], geometry(), 0.0, 3);
    let path = write(dir.path(), "field0.f00000", &field);
    assert_eq!(read_field_file(&path).unwrap(), field);
}

#[test]
fn abutting_elements_assemble_onto_one_grid() {
    let dir = tempdir().unwrap();
    let origins = [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
    let reference = write(dir.path(), "field0.f00000", &field(&origins, geometry(), 0.0, 3));
    // later outputs carry no geometry, so the positions here are zero
    let snapshot = write(dir.path(), "field0.f00001", &field(&origins, no_geometry(), 2.5, 3));

    let ds = nek_dataset(&snapshot, &reference, &[]).unwrap();

    assert_eq!(ds.coord_values("x").unwrap(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    assert_eq!(ds.coord_values("y").unwrap(), LOCAL.to_vec());
    assert_eq!(ds.coord_values("z").unwrap(), LOCAL.to_vec());
    assert_eq!(ds.coords["time"].as_scalar(), Some(2.5));

    let ux = &ds.var("ux").unwrap().values;
    assert_eq!(ux.shape(), &[3, 3, 5]);
    assert_eq!(ux[[2, 1, 4]], velocity(2.0, 0.5, 1.0));
    assert_eq!(ux[[0, 0, 2]], velocity(1.0, 0.0, 0.0));

    // element 0 sits at x >= 1, element 1 at x <= 1
    let uy = &ds.var("uy").unwrap().values;
    assert_eq!(uy[[1, 1, 0]], 1.0);
    assert_eq!(uy[[1, 1, 4]], 0.0);

    assert_eq!(ds.var("xmesh").unwrap().values[[0, 0, 3]], 1.5);
    assert!(ds.var("pressure").unwrap().values.iter().all(|p| *p == 2.5));
    assert!(ds.attrs.is_empty());
}

#[test]
fn drop_position_meshes() {
    let dir = tempdir().unwrap();
    let origins = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let reference = write(dir.path(), "field0.f00000", &field(&origins, geometry(), 0.0, 3));

    let ds = nek_dataset(&reference, &reference, &["xmesh", "ymesh", "zmesh"]).unwrap();
    assert_eq!(ds.variable_names(), vec!["pressure", "ux", "uy", "uz"]);
    assert_eq!(ds.dim_len("y"), Some(5));
}

#[test]
fn two_dimensional_field() {
    let dir = tempdir().unwrap();
    let origins = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
    let path = write(dir.path(), "field0.f00000", &field(&origins, geometry(), 1.0, 1));

    let mut converter = FieldConverter::new();
    converter.disable_progress();
    let ds = converter.convert(&path, &path).unwrap();

    assert_eq!(ds.coord_values("z").unwrap(), vec![0.0]);
    assert_eq!(ds.var("ux").unwrap().values.shape(), &[1, 5, 5]);
    assert!(ds.var("uz").unwrap().values.iter().all(|u| *u == 0.0));
}

#[test]
fn staggered_elements_are_unsupported() {
    let dir = tempdir().unwrap();
    let origins = [[0.0, 0.0, 0.0], [1.0, 0.25, 0.0]];
    let path = write(dir.path(), "field0.f00000", &field(&origins, geometry(), 0.0, 3));

    let err = nek_dataset(&path, &path, &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::UnsupportedTopology(_))
    ));
    assert!(err
        .to_string()
        .contains("Only cartesian box meshes are currently supported."));
}

#[test]
fn reference_with_other_elements() {
    let dir = tempdir().unwrap();
    let reference = write(
        dir.path(),
        "field0.f00000",
        &field(&[[0.0, 0.0, 0.0]], geometry(), 0.0, 3),
    );
    let snapshot = write(
        dir.path(),
        "field0.f00001",
        &field(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], no_geometry(), 1.0, 3),
    );
    assert!(nek_dataset(&snapshot, &reference, &[]).is_err());
}

#[test]
fn unreadable_reference_is_a_load_failure() {
    let dir = tempdir().unwrap();
    let snapshot = write(
        dir.path(),
        "field0.f00001",
        &field(&[[0.0, 0.0, 0.0]], geometry(), 1.0, 3),
    );
    let reference = dir.path().join("garbage.f00000");
    std::fs::write(&reference, b"not a field file").unwrap();

    let err = nek_dataset(&snapshot, &reference, &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::LoadFailure(path)) if path == &reference
    ));
}
