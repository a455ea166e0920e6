//! Reader for Nek5000/Neko binary field files (`field0.f00001` etc.)
//!
//! Layout of a single-file output:
//!
//! | Bytes              | Content                                          |
//! | ------------------ | ------------------------------------------------ |
//! | 132                | ASCII header, see [Header]                       |
//! | 4                  | `6.54321` as f32, tells the byte order           |
//! | 4 * nel            | i32 element ids, 1-based                         |
//! | wdsz * npel * ...  | data blocks of `lx*ly*lz` reals, x fastest       |
//!
//! Data blocks come as geometry (ndim blocks per element), velocity (ndim
//! blocks per element), pressure and temperature (one block per element),
//! then every passive scalar for all elements in turn.

// standard library
use std::path::Path;

// crate modules
use crate::field::{Element, FieldFile, Header};
use crate::readers::parsers;
use crate::utils::*;

// external crates
use anyhow::{anyhow, Context, Result};
use log::{debug, trace};
use ndarray::{Array3, Array4, Axis};

/// Length of the ASCII header in bytes
pub const HEADER_BYTES: usize = 132;

/// Value written after the header to detect the byte order
pub const ENDIAN_TAG: f32 = 6.54321;

/// Byte order of the binary section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Work out the byte order from the four tag bytes
    pub fn detect(bytes: [u8; 4]) -> Option<Self> {
        let matches = |v: f32| (v - ENDIAN_TAG).abs() < 1e-5;
        if matches(f32::from_le_bytes(bytes)) {
            Some(Endian::Little)
        } else if matches(f32::from_be_bytes(bytes)) {
            Some(Endian::Big)
        } else {
            None
        }
    }
}

/// A simple reader for Nek field files
#[derive(Debug, Default)]
pub struct FieldFileReader;

impl FieldFileReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Reads the header and every element of the file at `path`
    ///
    /// Elements are returned ordered by their element id.
    pub fn parse(&self, path: &Path) -> Result<FieldFile> {
        let bytes = std::fs::read(path).with_context(|| f!("Could not open {}", path.display()))?;
        self.parse_bytes(&bytes)
    }

    /// Reads a complete field file already held in memory
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<FieldFile> {
        let header = Self::header(bytes)?;
        debug!("{header}");

        if header.n_elements != header.n_elements_global {
            return Err(anyhow!(
                "Multi-file output not supported ({} of {} elements in this file)",
                header.n_elements,
                header.n_elements_global
            ));
        }

        if !matches!(header.word_size, 4 | 8) {
            return Err(anyhow!("Unsupported word size {}", header.word_size));
        }

        let overflow = || anyhow!("Header sizes overflow");
        let npel = header.points_per_element().ok_or_else(overflow)?;
        let expected = Self::expected_length(&header).ok_or_else(overflow)?;

        // every point needs at least one byte, checked before allocating elements
        let n_points = header.n_elements.checked_mul(npel).ok_or_else(overflow)?;
        if n_points > bytes.len() {
            return Err(anyhow!(
                "Header announces {n_points} points but the file holds {} bytes",
                bytes.len()
            ));
        }

        if bytes.len() < expected {
            return Err(anyhow!(
                "File is truncated, expected {expected} bytes but found {}",
                bytes.len()
            ));
        }

        let tag: [u8; 4] = bytes[HEADER_BYTES..HEADER_BYTES + 4].try_into()?;
        let endian = Endian::detect(tag).ok_or(anyhow!("Endian tag not recognised"))?;
        trace!("Byte order: {endian:?}");

        let mut cursor = BlockCursor {
            bytes,
            offset: HEADER_BYTES + 4,
            endian,
            word_size: header.word_size,
        };

        let ids = cursor.element_ids(header.n_elements)?;
        let mut elements = vec![Element::new(header.shape(), &header.contents); header.n_elements];
        let shape = header.shape();
        let ndim = header.ndim();
        let contents = header.contents;

        if contents.geometry {
            for &id in &ids {
                for c in 0..ndim {
                    cursor.fill(&mut elements[id].pos, c, shape, npel)?;
                }
            }
        }

        if contents.velocity {
            for &id in &ids {
                for c in 0..ndim {
                    cursor.fill(&mut elements[id].vel, c, shape, npel)?;
                }
            }
        }

        if contents.pressure {
            for &id in &ids {
                cursor.fill(&mut elements[id].pres, 0, shape, npel)?;
            }
        }

        if contents.temperature {
            for &id in &ids {
                cursor.fill(&mut elements[id].temp, 0, shape, npel)?;
            }
        }

        for s in 0..contents.scalars {
            for &id in &ids {
                cursor.fill(&mut elements[id].scal, s, shape, npel)?;
            }
        }

        Ok(FieldFile { header, elements })
    }

    fn header(bytes: &[u8]) -> Result<Header> {
        let raw = bytes
            .get(..HEADER_BYTES)
            .ok_or(anyhow!("File too short for a {HEADER_BYTES} byte header"))?;
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        let (_, header) = parsers::field_header(text)
            .map_err(|e| anyhow!("Invalid field file header \"{text}\": {e}"))?;
        Ok(header)
    }

    /// Total file length implied by the header, `None` on overflow
    fn expected_length(header: &Header) -> Option<usize> {
        let c = header.contents;
        let ndim = header.ndim();
        let blocks = ndim * c.geometry as usize
            + ndim * c.velocity as usize
            + c.pressure as usize
            + c.temperature as usize
            + c.scalars;
        let data = blocks
            .checked_mul(header.n_elements)?
            .checked_mul(header.points_per_element()?)?
            .checked_mul(header.word_size)?;
        let ids = header.n_elements.checked_mul(4)?;
        (HEADER_BYTES + 4).checked_add(ids)?.checked_add(data)
    }
}

/// Sequential access to the binary section
struct BlockCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    endian: Endian,
    word_size: usize,
}

impl<'a> BlockCursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let chunk = self
            .bytes
            .get(self.offset..self.offset + n)
            .ok_or(anyhow!("Unexpected end of file at byte {}", self.offset))?;
        self.offset += n;
        Ok(chunk)
    }

    /// Zero-based element indices, checked to be a permutation
    fn element_ids(&mut self, n_elements: usize) -> Result<Vec<usize>> {
        let mut seen = vec![false; n_elements];
        let mut ids = Vec::with_capacity(n_elements);
        for chunk in self.take(4 * n_elements)?.chunks_exact(4) {
            let raw: [u8; 4] = chunk.try_into()?;
            let id = match self.endian {
                Endian::Little => i32::from_le_bytes(raw),
                Endian::Big => i32::from_be_bytes(raw),
            };
            let index = usize::try_from(id - 1)
                .ok()
                .filter(|i| *i < n_elements && !seen[*i])
                .ok_or(anyhow!("Invalid or repeated element id {id}"))?;
            seen[index] = true;
            ids.push(index);
        }
        Ok(ids)
    }

    fn reals(&mut self, n: usize) -> Result<Vec<f64>> {
        let (endian, word_size) = (self.endian, self.word_size);
        let chunk = self.take(n * word_size)?;
        chunk
            .chunks_exact(word_size)
            .map(|b| -> Result<f64> {
                Ok(match (word_size, endian) {
                    (4, Endian::Little) => f32::from_le_bytes(b.try_into()?) as f64,
                    (4, Endian::Big) => f32::from_be_bytes(b.try_into()?) as f64,
                    (_, Endian::Little) => f64::from_le_bytes(b.try_into()?),
                    (_, Endian::Big) => f64::from_be_bytes(b.try_into()?),
                })
            })
            .collect()
    }

    /// Read one block into component `c` of an element array
    fn fill(
        &mut self,
        array: &mut Array4<f64>,
        c: usize,
        shape: (usize, usize, usize),
        npel: usize,
    ) -> Result<()> {
        let block = Array3::from_shape_vec(shape, self.reals(npel)?)?;
        array.index_axis_mut(Axis(0), c).assign(&block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Contents;

    fn header_bytes(line: &str) -> Vec<u8> {
        let mut bytes = line.as_bytes().to_vec();
        bytes.resize(HEADER_BYTES, b' ');
        bytes
    }

    /// One 2x2x1 element, big endian single precision, velocity only
    fn big_endian_file() -> Vec<u8> {
        let mut bytes = header_bytes(
            "#std 4  2  2  1          1          1  0.5000000000000E+00      3      0      1 U",
        );
        bytes.extend(ENDIAN_TAG.to_be_bytes());
        bytes.extend(1i32.to_be_bytes());
        for v in [1.0f32, 2.0, 3.0, 4.0, -1.0, -2.0, -3.0, -4.0] {
            bytes.extend(v.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn endian_detection() {
        assert_eq!(Endian::detect(ENDIAN_TAG.to_le_bytes()), Some(Endian::Little));
        assert_eq!(Endian::detect(ENDIAN_TAG.to_be_bytes()), Some(Endian::Big));
        assert_eq!(Endian::detect(1.0f32.to_le_bytes()), None);
    }

    #[test]
    fn big_endian_two_dimensional() {
        let field = FieldFileReader::new().parse_bytes(&big_endian_file()).unwrap();
        assert_eq!(field.time(), 0.5);
        assert_eq!(field.header.ndim(), 2);
        assert_eq!(
            field.header.contents,
            Contents {
                velocity: true,
                ..Default::default()
            }
        );

        let element = &field.elements[0];
        assert_eq!(element.shape(), (1, 2, 2));
        assert_eq!(element.vel[[0, 0, 1, 0]], 3.0);
        assert_eq!(element.vel[[1, 0, 0, 1]], -2.0);
        // no third component in 2-D
        assert!(element.vel.index_axis(Axis(0), 2).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn truncated_file() {
        let mut bytes = big_endian_file();
        bytes.truncate(bytes.len() - 4);
        let err = FieldFileReader::new().parse_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn multi_file_output() {
        let mut bytes = header_bytes(
            "#std 4  2  2  1          2          1  0.5000000000000E+00      3      0      2 U",
        );
        bytes.extend(ENDIAN_TAG.to_le_bytes());
        let err = FieldFileReader::new().parse_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("Multi-file"));
    }

    #[test]
    fn repeated_element_id() {
        let mut bytes = header_bytes(
            "#std 4  2  2  1          2          2  0.0000000000000E+00      0      0      1 U",
        );
        bytes.extend(ENDIAN_TAG.to_le_bytes());
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(1i32.to_le_bytes());
        bytes.extend([0u8; 2 * 2 * 4 * 4]);
        let err = FieldFileReader::new().parse_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("element id 1"));
    }

    #[test]
    fn oversized_header() {
        let bytes = header_bytes(
            "#std 8 99999999 99999999 99999999 99999999999 99999999999 0.0E+00 0 0 1 XU",
        );
        let err = FieldFileReader::new().parse_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn more_points_than_bytes() {
        // no data blocks, so only the ids are needed to pass the length check
        let mut bytes = header_bytes(
            "#std 8 100 100 100         10         10  0.0000000000000E+00      0      0      1",
        );
        bytes.extend(ENDIAN_TAG.to_le_bytes());
        for id in 1..=10i32 {
            bytes.extend(id.to_le_bytes());
        }
        let err = FieldFileReader::new().parse_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("10000000 points"));
    }

    #[test]
    fn not_a_field_file() {
        let err = FieldFileReader::new().parse_bytes(b"hello").unwrap_err();
        assert!(err.to_string().contains("header"));
    }
}
