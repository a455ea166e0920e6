//! Removal of mean contributions from accumulated moments
//!
//! Neko accumulates raw products such as `<uv>`. The central moment is
//! recovered by subtracting the product of the means, e.g.
//! `<u'v'> = <uv> - <u><v>`. Fourth order moments are only ever accumulated
//! as the fourth power of a single quantity, for which `<u>^4` is removed.

// crate modules
use crate::dataset::Dataset;
use crate::error::Error;
use crate::stats::{Moment, Quantity, Registry};
use crate::utils::f;

// external crates
use anyhow::Result;
use log::{debug, trace};
use ndarray::ArrayD;

/// Subtract the product of means from every corrected statistic, in place
///
/// Means of quantities from the registry's own category are taken from `ds`.
/// Means of quantities from the other category come from `companion`, which
/// must then be present and sampled on the same coordinates.
pub fn correct_moments(
    ds: &mut Dataset,
    registry: &Registry,
    companion: Option<&Dataset>,
) -> Result<()> {
    let mut n_corrected = 0;
    for statistic in registry.statistics() {
        if !statistic.moment.is_corrected() {
            continue;
        }

        let correction = mean_product(ds, registry, companion, &statistic.moment)?;
        let variable = ds.var_mut(statistic.name)?;
        variable.values -= &correction;

        trace!("Corrected {} ({:?})", statistic.name, statistic.moment);
        n_corrected += 1;
    }

    debug!(
        "Removed mean contributions from {n_corrected} of {} statistics",
        registry.len()
    );
    Ok(())
}

/// Product of the means making up the correction term of a moment
fn mean_product(
    ds: &Dataset,
    registry: &Registry,
    companion: Option<&Dataset>,
    moment: &Moment,
) -> Result<ArrayD<f64>> {
    match *moment {
        Moment::Fourth(q) => Ok(mean_of(ds, registry, companion, q)?.mapv(|m| m.powi(4))),
        _ => {
            let mut constituents = moment.constituents().into_iter();
            let Some(first) = constituents.next() else {
                // only ever called for corrected moments, which have constituents
                return Err(Error::ShapeMismatch(f!("{moment:?} has no constituents")).into());
            };
            let mut product = mean_of(ds, registry, companion, first)?.clone();
            for q in constituents {
                product *= mean_of(ds, registry, companion, q)?;
            }
            Ok(product)
        }
    }
}

/// Mean of a first order quantity from whichever dataset holds it
fn mean_of<'a>(
    ds: &'a Dataset,
    registry: &Registry,
    companion: Option<&'a Dataset>,
    quantity: Quantity,
) -> Result<&'a ArrayD<f64>> {
    let source = if quantity.category() == registry.category() {
        ds
    } else {
        companion.ok_or(Error::MissingCompanion(registry.category()))?
    };
    Ok(&source.var(quantity.name())?.values)
}
