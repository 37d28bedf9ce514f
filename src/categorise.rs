//! Aggregation of curve columns into caller-named categories.
//!
//! A categorisation mapping assigns every product key to a category; the curves are then summed
//! per category. Demand columns are negated before aggregation so that supply and demand keys
//! mapped to the same category can be meaningfully combined; the sign convention can be inverted.
use crate::classify::{Classifier, ProductGroup};
use crate::frame::{CurveTable, Frame, Hour};
use crate::id::{CategoryID, ProductKey};
use crate::reporter::{LogReporter, Reporter};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;

/// Aggregate the curve columns into categories through a key-to-category mapping.
///
/// Every curve column must be mapped; mapping entries without curve data are reported as a
/// warning. Demand columns enter their category negated (supply columns instead when
/// `invert_sign` is set); unclassified columns keep their sign. Result columns are the mapped
/// categories in sorted order.
///
/// Warnings go to the global logger; see [`categorise_curves_with`] to capture them or to use a
/// custom column classifier.
///
/// # Arguments
///
/// * `curves` - The hourly curve table
/// * `mapping` - Product keys mapped to the category they aggregate into
/// * `invert_sign` - Negate supply instead of demand
///
/// # Returns
///
/// The categorised curves, hours in the index and categories in the columns.
pub fn categorise_curves(
    curves: &CurveTable,
    mapping: &IndexMap<ProductKey, CategoryID>,
    invert_sign: bool,
) -> Result<Frame<Hour, CategoryID>> {
    categorise_curves_with(curves, mapping, invert_sign, &Classifier::default(), &LogReporter)
}

/// [`categorise_curves`] with an injected classifier and warning reporter
pub fn categorise_curves_with(
    curves: &CurveTable,
    mapping: &IndexMap<ProductKey, CategoryID>,
    invert_sign: bool,
    classifier: &Classifier,
    reporter: &dyn Reporter,
) -> Result<Frame<Hour, CategoryID>> {
    let missing: Vec<&ProductKey> = curves
        .columns()
        .iter()
        .filter(|key| !mapping.contains_key(*key))
        .collect();
    ensure!(
        missing.is_empty(),
        "Missing key(s) in mapping: {}",
        missing.iter().join(", ")
    );

    let unused: Vec<&ProductKey> = mapping
        .keys()
        .filter(|key| !curves.columns().contains(*key))
        .collect();
    if !unused.is_empty() {
        reporter.warn(&format!(
            "Unused key(s) in mapping: {}",
            unused.iter().join(", ")
        ));
    }

    let negated = if invert_sign {
        ProductGroup::Supply
    } else {
        ProductGroup::Demand
    };

    // Categories carried by the curve columns, in sorted order
    let categories: Vec<CategoryID> = curves
        .columns()
        .iter()
        .map(|key| mapping[key].clone())
        .unique()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect();

    let positions: Vec<usize> = curves
        .columns()
        .iter()
        .map(|key| {
            categories
                .iter()
                .position(|c| *c == mapping[key])
                .expect("category missing from its own mapping")
        })
        .collect();
    let signs: Vec<f64> = curves
        .columns()
        .iter()
        .map(|key| {
            if classifier.classify(&key.0) == negated {
                -1.0
            } else {
                1.0
            }
        })
        .collect();

    let mut result = Frame::zeros(curves.index().iter().copied(), categories);
    for i in 0..curves.nrows() {
        for (j, value) in curves.row(i).iter().enumerate() {
            let cell = result.get(i, positions[j]);
            result.set(i, positions[j], cell + value * signs[j]);
        }
    }

    Ok(result)
}
