//! `nom` parsers for statistics rows and field-file headers

// crate modules
use crate::field::{Contents, Header};

// external crates
use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map, map_res, opt};
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;

/// Quick check for comment lines in statistics files
pub fn is_comment(i: &str) -> bool {
    i.trim_start().starts_with('#')
}

/// Comma separated list of floats making up a whole line
///
/// Whitespace around the delimiters is allowed, and `nan`/`inf` are accepted
/// so that missing samples survive the round trip.
pub fn csv_row(i: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(delimited(
        space0,
        separated_list1(tuple((space0, char(','), space0)), double),
        space0,
    ))(i)
}

/// Split a header line into column names
pub fn csv_header(i: &str) -> Vec<String> {
    i.trim_start_matches('#')
        .split(',')
        .map(|s| s.trim().to_string())
        .collect()
}

fn unsigned(i: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(i)
}

/// Whitespace followed by an unsigned integer
fn field(i: &str) -> IResult<&str, usize> {
    preceded(space1, unsigned)(i)
}

/// Field flags following the numeric header values, e.g. `XUPTS02`
pub fn field_contents(i: &str) -> IResult<&str, Contents> {
    let (i, geometry) = opt(char('X'))(i)?;
    let (i, velocity) = opt(char('U'))(i)?;
    let (i, pressure) = opt(char('P'))(i)?;
    let (i, temperature) = opt(char('T'))(i)?;
    let (i, scalars) = opt(preceded(
        char('S'),
        map_res(
            take_while_m_n(1, 2, |c: char| c.is_ascii_digit()),
            str::parse::<usize>,
        ),
    ))(i)?;

    Ok((
        i,
        Contents {
            geometry: geometry.is_some(),
            velocity: velocity.is_some(),
            pressure: pressure.is_some(),
            temperature: temperature.is_some(),
            scalars: scalars.unwrap_or(0),
        },
    ))
}

/// The ASCII header of a field file
///
/// ```rust
/// # use nekdata::readers::parsers::field_header;
/// let line = "#std 4  6  6  6         64         64  0.2000000000000E+02   1000      0      1 XUPS01";
/// let (_, header) = field_header(line).unwrap();
/// assert_eq!(header.orders, [6, 6, 6]);
/// assert_eq!(header.time, 20.0);
/// assert_eq!(header.contents.scalars, 1);
/// ```
pub fn field_header(i: &str) -> IResult<&str, Header> {
    let (i, _) = tag("#std")(i)?;
    let (i, (word_size, lx, ly, lz)) = tuple((field, field, field, field))(i)?;
    let (i, (n_elements_global, n_elements)) = tuple((field, field))(i)?;
    let (i, time) = preceded(space1, double)(i)?;
    let (i, (step, file_id, n_files)) = tuple((field, field, field))(i)?;
    let (i, contents) = map(opt(preceded(space1, field_contents)), Option::unwrap_or_default)(i)?;

    Ok((
        i,
        Header {
            word_size,
            orders: [lx, ly, lz],
            n_elements_global,
            n_elements,
            time,
            step,
            file_id,
            n_files,
            contents,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0.0,1.0,2.5", vec![0.0, 1.0, 2.5])]
    #[case("  1e-3 , -2.0E+01,3", vec![1e-3, -20.0, 3.0])]
    #[case("1.0", vec![1.0])]
    fn numeric_rows(#[case] line: &str, #[case] expected: Vec<f64>) {
        assert_eq!(csv_row(line).unwrap().1, expected);
    }

    #[test]
    fn nan_entries() {
        let (_, row) = csv_row("0.0,nan,1.0").unwrap();
        assert!(row[1].is_nan());
    }

    #[rstest]
    #[case("time,z,p,u")]
    #[case("1.0,2.0,oops")]
    #[case("1.0,,2.0")]
    #[case("")]
    fn non_numeric_rows(#[case] line: &str) {
        assert!(csv_row(line).is_err());
    }

    #[test]
    fn header_names() {
        assert_eq!(csv_header("# t, y ,u"), vec!["t", "y", "u"]);
    }

    #[rstest]
    #[case("XUPT", Contents { geometry: true, velocity: true, pressure: true, temperature: true, scalars: 0 })]
    #[case("UPS02", Contents { geometry: false, velocity: true, pressure: true, temperature: false, scalars: 2 })]
    #[case("X", Contents { geometry: true, ..Default::default() })]
    fn contents_flags(#[case] flags: &str, #[case] expected: Contents) {
        assert_eq!(field_contents(flags).unwrap().1, expected);
    }

    #[test]
    fn header_without_contents() {
        let line = "#std 8  2  2  1          4          4  0.0000000000000E+00      0      0      1";
        let (_, header) = field_header(line).unwrap();
        assert_eq!(header.ndim(), 2);
        assert_eq!(header.contents, Contents::default());
    }

    #[test]
    fn header_must_start_with_tag() {
        assert!(field_header("#xyz 8 2 2 2 1 1 0.0 0 0 1 XU").is_err());
    }
}
