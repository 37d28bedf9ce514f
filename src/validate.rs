//! Validation of curve tables and regionalisation tables.
//!
//! Both checks run before any distribution is computed: the balance check confirms that
//! aggregated supply equals aggregated demand for every hour, and the weight check confirms that
//! the regionalisation table covers exactly the curve table's keys with columns summing to one.
use crate::classify::{Classifier, ProductGroup};
use crate::frame::{CurveTable, WeightTable};
use crate::id::ProductKey;
use crate::reporter::Reporter;
use anyhow::Result;
use float_cmp::approx_eq;
use itertools::Itertools;
use thiserror::Error;

/// The default number of decimal places used for tolerance checks
pub const DEFAULT_PRECISION: i32 = 3;

/// How non-fatal validation findings are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorHandling {
    /// Log a warning and continue
    #[default]
    Warn,
    /// Abort with an error
    Raise,
}

/// A validation failure detected before distribution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Aggregated supply and demand diverge beyond tolerance for at least one hour
    #[error("Deficits in curves")]
    Balance,
    /// A curve-table key is absent from the regionalisation table. Always fatal.
    #[error("Missing key(s) in regionalisation: {}", join_keys(.keys))]
    SchemaMismatch {
        /// The curve-table keys with no weight column
        keys: Vec<ProductKey>,
    },
    /// A regionalisation key has no corresponding curve-table data
    #[error("Unused key(s) in regionalisation: {}", join_keys(.keys))]
    UnusedKeys {
        /// The weight-table keys with no curve column
        keys: Vec<ProductKey>,
    },
    /// A regionalisation column does not sum to 1 within tolerance
    #[error("Regionalisation key(s) do not sum to 1: {}", format_checksums(.sums, .precision))]
    Normalization {
        /// Each offending key with its actual (rounded) column sum
        sums: Vec<(ProductKey, f64)>,
        /// The number of decimal places the sums were rounded to
        precision: i32,
    },
}

fn join_keys(keys: &[ProductKey]) -> String {
    keys.iter().join(", ")
}

fn format_checksums(sums: &[(ProductKey, f64)], precision: &i32) -> String {
    sums.iter()
        .map(|(key, value)| format!("{}={:.*}", key, *precision as usize, value))
        .join(", ")
}

/// Round a value to the given number of decimal places
pub(crate) fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}

/// Validate that aggregated supply equals aggregated demand for every hour.
///
/// Uses the default [`Classifier`] to group the curve columns; see
/// [`validate_balance_with`] for a custom one.
pub fn validate_balance(
    curves: &CurveTable,
    precision: i32,
    errors: ErrorHandling,
    reporter: &dyn Reporter,
) -> Result<()> {
    validate_balance_with(curves, &Classifier::default(), precision, errors, reporter)
}

/// Validate that aggregated supply equals aggregated demand for every hour.
///
/// Columns are classified into supply and demand by `classifier`; columns matching neither
/// suffix are excluded from this check. The per-hour difference between aggregated supply and
/// demand is rounded to `precision` decimal places and any non-zero remainder is a deficit.
///
/// # Arguments
///
/// * `curves` - The hourly curve table
/// * `classifier` - Maps each product key to its direction group
/// * `precision` - The number of decimal places for the tolerance check
/// * `errors` - Whether a deficit warns or aborts
/// * `reporter` - Receives the warning in warn mode
pub fn validate_balance_with(
    curves: &CurveTable,
    classifier: &Classifier,
    precision: i32,
    errors: ErrorHandling,
    reporter: &dyn Reporter,
) -> Result<()> {
    let groups: Vec<ProductGroup> = curves
        .columns()
        .iter()
        .map(|key| classifier.classify(&key.0))
        .collect();

    let has_deficit = (0..curves.nrows()).any(|i| {
        let mut balance = 0.0;
        for (value, group) in curves.row(i).iter().zip(&groups) {
            match group {
                ProductGroup::Supply => balance += value,
                ProductGroup::Demand => balance -= value,
                ProductGroup::Unclassified => (),
            }
        }
        !approx_eq!(f64, round_to(balance, precision), 0.0, ulps = 2)
    });

    if has_deficit {
        match errors {
            ErrorHandling::Warn => reporter.warn("Deficits in curves"),
            ErrorHandling::Raise => return Err(ValidationError::Balance.into()),
        }
    }

    Ok(())
}

/// Validate a regionalisation table against a curve table.
///
/// Three checks run in order:
///
/// 1. Every curve key must have a weight column. Missing keys are always fatal, regardless of
///    `errors`: a sector with no weights cannot be distributed at all.
/// 2. Weight columns without curve data are reported, one warning per key, or aborted on in
///    raise mode.
/// 3. Every weight column must sum to 1 after rounding to `precision` decimal places. Warn mode
///    reports each offending key separately; raise mode aborts with all of them at once.
///
/// # Arguments
///
/// * `curves` - The hourly curve table
/// * `reg` - The regionalisation table, nodes in the index and keys in the columns
/// * `precision` - The number of decimal places for the checksum
/// * `errors` - Whether non-fatal findings warn or abort
/// * `reporter` - Receives warnings in warn mode
pub fn validate_weights(
    curves: &CurveTable,
    reg: &WeightTable,
    precision: i32,
    errors: ErrorHandling,
    reporter: &dyn Reporter,
) -> Result<()> {
    let missing: Vec<ProductKey> = curves
        .columns()
        .iter()
        .filter(|key| !reg.columns().contains(*key))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::SchemaMismatch { keys: missing }.into());
    }

    let unused: Vec<ProductKey> = reg
        .columns()
        .iter()
        .filter(|key| !curves.columns().contains(*key))
        .cloned()
        .collect();
    if !unused.is_empty() {
        match errors {
            ErrorHandling::Warn => {
                for key in &unused {
                    reporter.warn(&format!("Unused key in regionalisation: {key}"));
                }
            }
            ErrorHandling::Raise => return Err(ValidationError::UnusedKeys { keys: unused }.into()),
        }
    }

    let checksum_errors: Vec<(ProductKey, f64)> = reg
        .column_sums()
        .filter_map(|(key, sum)| {
            let rounded = round_to(sum, precision);
            (!approx_eq!(f64, rounded, 1.0, ulps = 2)).then(|| (key.clone(), rounded))
        })
        .collect();
    if !checksum_errors.is_empty() {
        match errors {
            ErrorHandling::Warn => {
                for (key, value) in &checksum_errors {
                    reporter.warn(&format!(
                        "Regionalisation key does not sum to 1: {}={:.*}",
                        key, precision as usize, value
                    ));
                }
            }
            ErrorHandling::Raise => {
                return Err(ValidationError::Normalization {
                    sums: checksum_errors,
                    precision,
                }
                .into());
            }
        }
    }

    Ok(())
}
