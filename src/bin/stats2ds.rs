//! Command line tool to convert Neko statistics tables
//!
//! Reads a statistics CSV, averages rows that share a (time, height) pair,
//! and removes the mean contributions from every higher order moment so that
//! `uv` becomes the covariance `<u'v'>` and so on.
//!
//! # Usage
//!
//! ```text
//! Usage: stats2ds <csv> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! By default the file is treated as fluid statistics, and the basic or full
//! statistic set is chosen from the number of columns.
//!
//! ```bash
//! # Print a summary of the corrected fluid statistics
//! stats2ds fluid_stats.csv
//! ```
//!
//! ### > How to convert scalar statistics
//!
//! Scalar statistics contain products with velocity and pressure, so the
//! fluid statistics of the same run are needed for their means.
//!
//! ```bash
//! stats2ds scalar_stats.csv --scalar --companion fluid_stats.csv
//! ```
//!
//! ### > How to keep the result
//!
//! `--save` writes a binary sidecar next to the input (`fluid_stats.bin`)
//! that can be loaded again with `nekdata::read_dataset()`. `--json` writes
//! a JSON file named after `--output`, or the input file stem.
//!
//! ```bash
//! stats2ds fluid_stats.csv --save --json --output channel
//! ```
//!

// standard libraries
use std::path::Path;

// crate modules
use nekdata::stats::{Category, Completeness, StatsConverter};
use nekdata::utils::f;
use nekdata::writers::write_dataset_json;

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

    let converter = build_converter(&cli);
    let ds = converter.convert(&cli.file)?;

    if !cli.quiet {
        println!("{ds}");
    }

    if cli.json {
        let output = f!("{}.json", output_name(&cli));
        info!("Writing {output}");
        write_dataset_json(&ds, &output)?;
    }

    Ok(())
}

/// Convert Neko statistics tables to de-meaned datasets
///
/// Rows sharing a (time, height) pair are averaged, every statistic is
/// pivoted into a time x height array, and mean contributions are removed
/// from all higher order moments.
///
/// Examples
/// --------
///
///  Typical use
///     $ stats2ds fluid_stats.csv
///
///  Scalar statistics with the fluid file for the means
///     $ stats2ds scalar_stats.csv --scalar --companion fluid_stats.csv
///
///  Force the full statistic set and name the height 'y'
///     $ stats2ds fluid_stats.csv --full --height y
///
///  Save a binary sidecar and a JSON copy
///     $ stats2ds fluid_stats.csv --save --json
///
/// Notes
/// -----
///
/// The first two columns are always taken as time and height. The number of
/// remaining columns must match the chosen statistic set exactly.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help("Typical use: stats2ds fluid_stats.csv\n\nNOTE: --help shows more detail and examples"),
    term_width(70),
    hide_possible_values(true),
    override_usage("stats2ds <csv> [options]")
)]
struct Cli {
    // * Positional
    /// Path to statistics CSV file
    #[arg(name = "csv")]
    file: String,

    /// Scalar rather than fluid statistics
    ///
    /// Scalar statistics need the fluid statistics of the same run, given
    /// with --companion.
    #[arg(help_heading("Statistics options"))]
    #[arg(short, long)]
    scalar: bool,

    /// Only the basic statistic set
    ///
    /// By default the set is inferred from the number of columns.
    #[arg(help_heading("Statistics options"))]
    #[arg(short, long)]
    #[arg(conflicts_with = "full")]
    basic: bool,

    /// The full statistic set
    ///
    /// By default the set is inferred from the number of columns.
    #[arg(help_heading("Statistics options"))]
    #[arg(short, long)]
    full: bool,

    /// Name of the height coordinate ('z' default)
    #[arg(help_heading("Statistics options"))]
    #[arg(long)]
    #[arg(value_name = "name")]
    #[arg(default_value = "z")]
    height: String,

    /// Fluid statistics file of the same run
    ///
    /// Required for scalar statistics, ignored otherwise.
    #[arg(help_heading("Statistics options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    companion: Option<String>,

    /// Save a binary sidecar next to the input
    #[arg(help_heading("Output options"))]
    #[arg(long)]
    save: bool,

    /// Write the dataset to JSON
    #[arg(help_heading("Output options"))]
    #[arg(short, long)]
    json: bool,

    /// Name of output file (excl. extension)
    ///
    /// Defaults to the stem of the input file.
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
fn build_converter(cli: &Cli) -> StatsConverter {
    let category = match cli.scalar {
        true => Category::Scalar,
        false => Category::Fluid,
    };

    let mut converter = StatsConverter::new(category);
    converter.set_height(&cli.height);

    if cli.basic {
        converter.set_completeness(Completeness::Basic);
    } else if cli.full {
        converter.set_completeness(Completeness::Full);
    }

    if let Some(companion) = &cli.companion {
        converter.set_companion(companion);
    }

    if cli.save {
        converter.enable_save();
    }

    converter
}

#[doc(hidden)]
fn output_name(cli: &Cli) -> String {
    match &cli.output {
        Some(o) => o.clone(),
        None => Path::new(&cli.file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or("stats".to_string()),
    }
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
    s += &f!("{:^70}\n", "Nekdata :: Statistics Converter");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_logging_module_is_enabled() {
        for module in ["dataset", "field", "readers", "stats", "writers"] {
            assert!(LOG_MODULES.contains(&f!("nekdata::{module}").as_str()));
        }
    }
}
