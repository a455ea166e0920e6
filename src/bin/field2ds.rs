//! Command line tool to assemble Nek field files
//!
//! Reads every spectral element of a binary field file and combines them
//! into a single rectilinear dataset over global `x`, `y` and `z` axes, with
//! the simulation time attached.
//!
//! Only cartesian box meshes can be assembled this way.
//!
//! # Usage
//!
//! ```text
//! Usage: field2ds <field> <reference> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! Positions always come from the reference file, typically the first output
//! of the run which is the only one guaranteed to contain the geometry.
//!
//! ```bash
//! # Print a summary of the assembled dataset
//! field2ds field0.f00010 field0.f00000
//! ```
//!
//! ### > How to drop variables
//!
//! The position meshes are rarely needed once the axes are known.
//!
//! ```bash
//! field2ds field0.f00010 field0.f00000 --drop xmesh ymesh zmesh
//! ```
//!
//! ### > How to keep the result
//!
//! `--binary` writes a dataset that `nekdata::read_dataset()` loads again,
//! `--json` writes JSON for other languages. Names default to the input file
//! name, changed with `--output`.
//!
//! ```bash
//! # Output files named 'snapshot.bin' and 'snapshot.json'
//! field2ds field0.f00010 field0.f00000 --binary --json --output snapshot
//! ```
//!

// standard libraries
use std::path::Path;

// crate modules
use nekdata::dataset::DATASET_EXTENSION;
use nekdata::field::FieldConverter;
use nekdata::utils::f;
use nekdata::writers::write_dataset_json;
use nekdata::Dataset;

// external crates
use anyhow::Result;
use clap::{arg, Parser};
use log::*;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    let mut converter = FieldConverter::new();
    converter.set_drop_variables(&cli.drop);
    if cli.quiet {
        converter.disable_progress();
    }

    let ds = converter.convert(&cli.field, &cli.reference)?;

    if !cli.quiet {
        print_summary(&ds);
    }

    let output = output_name(&cli);

    if cli.binary {
        let path = f!("{output}.{DATASET_EXTENSION}");
        info!("Writing {path}");
        ds.save(&path)?;
    }

    if cli.json {
        let path = f!("{output}.json");
        info!("Writing {path}");
        write_dataset_json(&ds, &path)?;
    }

    Ok(())
}

/// Assemble Nek field files into one rectilinear dataset
///
/// Every element is labelled with axes recovered from the reference
/// positions, then all elements are combined by coordinate value onto a
/// single grid. The time of the field file is attached as a coordinate.
///
/// Examples
/// --------
///
///  Typical use
///     $ field2ds field0.f00010 field0.f00000
///
///  Drop the position meshes
///     $ field2ds field0.f00010 field0.f00000 --drop xmesh ymesh zmesh
///
///  Write binary and JSON files named "snapshot"
///     $ field2ds field0.f00010 field0.f00000 --binary --json -o snapshot
///
/// Notes
/// -----
///
/// Only cartesian box meshes are supported. Curved or skewed elements, and
/// meshes where the elements do not tile a single lattice, are rejected.
/// Multi-file outputs must be combined beforehand.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: field2ds field0.f00010 field0.f00000\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("field2ds <field> <reference> [options]")
)]
struct Cli {
    // * Positional
    /// Path to field file
    #[arg(name = "field")]
    field: String,

    /// Path to a field file with the same mesh and its geometry
    #[arg(name = "reference")]
    reference: String,

    /// Variables to remove from the dataset
    ///
    /// Every name must exist in the assembled dataset, e.g. xmesh, ymesh,
    /// zmesh, ux, uy, uz, pressure, temperature, s01.
    #[arg(help_heading("Field options"))]
    #[arg(short, long)]
    #[arg(value_parser, num_args = 1.., value_delimiter = ' ')]
    #[clap(required = false)]
    #[arg(value_name = "name")]
    drop: Vec<String>,

    /// Write the dataset in binary form
    #[arg(help_heading("Output options"))]
    #[arg(short, long)]
    binary: bool,

    /// Write the dataset to JSON
    #[arg(help_heading("Output options"))]
    #[arg(short, long)]
    json: bool,

    /// Name of output file (excl. extension)
    ///
    /// Defaults to the file name of the field file, and will automatically
    /// set the relevant extension.
    #[arg(help_heading("Output options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    output: Option<String>,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

#[doc(hidden)]
fn output_name(cli: &Cli) -> String {
    match &cli.output {
        Some(o) => o.clone(),
        None => Path::new(&cli.field)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or("field".to_string()),
    }
}

#[doc(hidden)]
/// Write summary to the terminal
fn print_summary(ds: &Dataset) {
    let mut s = "Summary of assembled field\n".to_string();
    for dim in ["x", "y", "z"] {
        s += &f!("{dim}         : {} points\n", ds.dim_len(dim).unwrap_or(0));
    }
    let names = ds.variable_names().join(" ");
    let options = textwrap::Options::new(70).subsequent_indent("            ");
    s += &textwrap::fill(&f!("variables : {names}"), options);
    println!("{s}\n\n{ds}")
}

/// Library modules whose log output is shown alongside the binary's own
#[doc(hidden)]
const LOG_MODULES: [&str; 5] = [
    "nekdata::dataset",
    "nekdata::field",
    "nekdata::readers",
    "nekdata::stats",
    "nekdata::writers",
];

/// Sets up logging at runtime to allow for multiple verbosity levels
#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    let mut modules = vec![module_path!()];
    modules.extend(LOG_MODULES);
    stderrlog::new()
        .modules(modules)
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}

/// Creates a banner for the command line
#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "Nekdata :: Field Assembler");
    s += &f!("{:-<1$}", "", 70);
    s
}
