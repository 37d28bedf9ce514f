//! Redistribution of aggregate hourly curves across regionalisation nodes.
//!
//! Two operations are provided. [`regionalise_curves`] projects a curve table through a
//! regionalisation table, summing across sectors to give the residual power per node and hour.
//! [`regionalise_node`] keeps the sector dimension instead, scaling each curve column by a single
//! node's weight, with [`regionalise_nodes`] stacking that profile for several nodes at once.
//!
//! Every entry point validates the curve balance and the regionalisation table before any
//! computation; a validation failure aborts with no partial result.
use crate::classify::Classifier;
use crate::frame::{CurveTable, Frame, Hour, NodeCurves, StackedProfiles, WeightTable};
use crate::id::{NodeID, ProductKey};
use crate::reporter::{LogReporter, Reporter};
use crate::validate::{
    DEFAULT_PRECISION, ErrorHandling, validate_balance_with, validate_weights,
};
use anyhow::{Result, anyhow, ensure};
use itertools::Itertools;

/// One key or several, for subsetting a table dimension.
///
/// Subsetting the distribution by several keys at once is accepted but ambiguous, because the dot
/// product sums across the selected dimension; that branch warns before proceeding.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection<T> {
    /// Subset to a single key
    Single(T),
    /// Subset to several keys
    Many(Vec<T>),
}

impl<T> Selection<T> {
    /// The selected keys as a slice
    pub fn keys(&self) -> &[T] {
        match self {
            Self::Single(key) => std::slice::from_ref(key),
            Self::Many(keys) => keys,
        }
    }

    /// Whether this selection holds more than one key
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

impl<T> From<T> for Selection<T> {
    fn from(key: T) -> Self {
        Self::Single(key)
    }
}

impl<T> From<Vec<T>> for Selection<T> {
    fn from(keys: Vec<T>) -> Self {
        Self::Many(keys)
    }
}

/// Compute the residual power per node from a curve table and a regionalisation table.
///
/// Both tables are validated first: the curve balance in raise mode, the regionalisation table in
/// warn mode. The result is the matrix product of the curves with the transpose of the weight
/// table, a table of hours by nodes; summed across all nodes it reproduces the aggregate input.
///
/// Warnings go to the global logger; see [`regionalise_curves_with`] to capture them or to use a
/// custom column classifier.
///
/// # Arguments
///
/// * `curves` - The hourly curve table
/// * `reg` - Regionalisation table with nodes in the index and keys in the columns
/// * `node` - Restrict the distribution to these node(s), defaults to all nodes
/// * `sector` - Restrict the distribution to these sector key(s), defaults to all sectors
/// * `hours` - Restrict the distribution to these hour(s), defaults to all hours
///
/// # Returns
///
/// Residual power curves per regionalisation node.
pub fn regionalise_curves(
    curves: &CurveTable,
    reg: &WeightTable,
    node: Option<&Selection<NodeID>>,
    sector: Option<&Selection<ProductKey>>,
    hours: Option<&Selection<Hour>>,
) -> Result<NodeCurves> {
    regionalise_curves_with(
        curves,
        reg,
        node,
        sector,
        hours,
        &Classifier::default(),
        &LogReporter,
    )
}

/// [`regionalise_curves`] with an injected classifier and warning reporter
pub fn regionalise_curves_with(
    curves: &CurveTable,
    reg: &WeightTable,
    node: Option<&Selection<NodeID>>,
    sector: Option<&Selection<ProductKey>>,
    hours: Option<&Selection<Hour>>,
    classifier: &Classifier,
    reporter: &dyn Reporter,
) -> Result<NodeCurves> {
    validate_balance_with(
        curves,
        classifier,
        DEFAULT_PRECISION,
        ErrorHandling::Raise,
        reporter,
    )?;
    validate_weights(
        curves,
        reg,
        DEFAULT_PRECISION,
        ErrorHandling::Warn,
        reporter,
    )?;

    // Node subsetting restricts the rows of the weight table
    let node_subset;
    let mut reg = reg;
    if let Some(selection) = node {
        if selection.is_many() {
            reporter.warn("returning dot product for subset of multiple nodes");
        }
        node_subset = reg.select_rows(selection.keys())?;
        reg = &node_subset;
    }

    // Sector subsetting restricts the columns of both tables
    let sector_subsets;
    let mut curves = curves;
    if let Some(selection) = sector {
        if selection.is_many() {
            reporter.warn("returning dot product for subset of multiple sectors");
        }
        sector_subsets = (
            curves.select_columns(selection.keys())?,
            reg.select_columns(selection.keys())?,
        );
        curves = &sector_subsets.0;
        reg = &sector_subsets.1;
    }

    // Hour subsetting restricts the rows of the curve table
    let hour_subset;
    if let Some(selection) = hours {
        hour_subset = curves.select_rows(selection.keys())?;
        curves = &hour_subset;
    }

    curves.dot_transpose(reg)
}

/// Compute the sector profiles attributed to one regionalisation node.
///
/// Unlike [`regionalise_curves`] this keeps the sector dimension: each curve column is scaled by
/// the node's weight for that key, yielding the per-sector allocation for that node. The curve
/// balance is validated in the default warn mode, the regionalisation table likewise.
///
/// # Arguments
///
/// * `curves` - The hourly curve table
/// * `reg` - Regionalisation table with nodes in the index and keys in the columns
/// * `node` - The node whose profile is returned
/// * `sector` - Restrict the profile to these sector key(s), defaults to all sectors
/// * `hours` - Restrict the profile to these hour(s), defaults to all hours
///
/// # Returns
///
/// The sector profiles for the node, hours in the index and keys in the columns.
pub fn regionalise_node(
    curves: &CurveTable,
    reg: &WeightTable,
    node: &NodeID,
    sector: Option<&Selection<ProductKey>>,
    hours: Option<&Selection<Hour>>,
) -> Result<CurveTable> {
    regionalise_node_with(
        curves,
        reg,
        node,
        sector,
        hours,
        &Classifier::default(),
        &LogReporter,
    )
}

/// [`regionalise_node`] with an injected classifier and warning reporter
pub fn regionalise_node_with(
    curves: &CurveTable,
    reg: &WeightTable,
    node: &NodeID,
    sector: Option<&Selection<ProductKey>>,
    hours: Option<&Selection<Hour>>,
    classifier: &Classifier,
    reporter: &dyn Reporter,
) -> Result<CurveTable> {
    validate_balance_with(
        curves,
        classifier,
        DEFAULT_PRECISION,
        ErrorHandling::Warn,
        reporter,
    )?;
    validate_weights(
        curves,
        reg,
        DEFAULT_PRECISION,
        ErrorHandling::Warn,
        reporter,
    )?;

    node_profile(curves, reg, node, sector, hours)
}

/// Compute stacked sector profiles for several regionalisation nodes at once.
///
/// Equivalent to computing [`regionalise_node`] independently for every requested node and
/// stacking the results. The result's row key is the `(node, hour)` pair, built as the Cartesian
/// product of the requested nodes with the (possibly subsetted) hour labels; the per-node
/// sub-frame is addressable via [`StackedProfiles::select_node`].
///
/// # Arguments
///
/// * `curves` - The hourly curve table
/// * `reg` - Regionalisation table with nodes in the index and keys in the columns
/// * `nodes` - The nodes whose profiles are returned, in order
/// * `sector` - Restrict the profiles to these sector key(s), applied per node before stacking
/// * `hours` - Restrict the profiles to these hour(s), defaults to all hours
pub fn regionalise_nodes(
    curves: &CurveTable,
    reg: &WeightTable,
    nodes: &[NodeID],
    sector: Option<&Selection<ProductKey>>,
    hours: Option<&Selection<Hour>>,
) -> Result<StackedProfiles> {
    regionalise_nodes_with(
        curves,
        reg,
        nodes,
        sector,
        hours,
        &Classifier::default(),
        &LogReporter,
    )
}

/// [`regionalise_nodes`] with an injected classifier and warning reporter
pub fn regionalise_nodes_with(
    curves: &CurveTable,
    reg: &WeightTable,
    nodes: &[NodeID],
    sector: Option<&Selection<ProductKey>>,
    hours: Option<&Selection<Hour>>,
    classifier: &Classifier,
    reporter: &dyn Reporter,
) -> Result<StackedProfiles> {
    ensure!(!nodes.is_empty(), "No nodes requested");

    validate_balance_with(
        curves,
        classifier,
        DEFAULT_PRECISION,
        ErrorHandling::Warn,
        reporter,
    )?;
    validate_weights(
        curves,
        reg,
        DEFAULT_PRECISION,
        ErrorHandling::Warn,
        reporter,
    )?;

    let profiles = nodes
        .iter()
        .map(|node| node_profile(curves, reg, node, sector, hours))
        .collect::<Result<Vec<_>>>()?;

    // All profiles share the same hour labels and columns, so the stacked index is the Cartesian
    // product of the node keys with the hour labels
    let hour_labels: Vec<Hour> = profiles[0].index().iter().copied().collect();
    let index = nodes
        .iter()
        .cartesian_product(&hour_labels)
        .map(|(node, hour)| (node.clone(), *hour));

    let mut values = Vec::with_capacity(nodes.len() * hour_labels.len() * profiles[0].ncols());
    for profile in &profiles {
        for i in 0..profile.nrows() {
            values.extend_from_slice(profile.row(i));
        }
    }

    Frame::new(index, profiles[0].columns().iter().cloned(), values)
}

/// The unvalidated single-node profile shared by the node entry points
fn node_profile(
    curves: &CurveTable,
    reg: &WeightTable,
    node: &NodeID,
    sector: Option<&Selection<ProductKey>>,
    hours: Option<&Selection<Hour>>,
) -> Result<CurveTable> {
    ensure!(
        reg.index().contains(node),
        "Unknown node in regionalisation: {node}"
    );

    let sector_subset;
    let mut curves = curves;
    if let Some(selection) = sector {
        sector_subset = curves.select_columns(selection.keys())?;
        curves = &sector_subset;
    }

    let hour_subset;
    if let Some(selection) = hours {
        hour_subset = curves.select_rows(selection.keys())?;
        curves = &hour_subset;
    }

    let factors = curves
        .columns()
        .iter()
        .map(|key| {
            reg.value_at(node, key)
                .ok_or_else(|| anyhow!("Missing key in regionalisation: {key}"))
        })
        .collect::<Result<Vec<_>>>()?;

    curves.scale_columns(&factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        RecordingReporter, assert_error, balanced_curves, half_weights, unbalanced_curves, weights,
    };
    use crate::validate::ValidationError;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_regionalise_curves_mass_conservation(
        balanced_curves: CurveTable,
        weights: WeightTable,
    ) {
        let result = regionalise_curves(&balanced_curves, &weights, None, None, None).unwrap();
        assert_eq!(result.nrows(), balanced_curves.nrows());
        assert_eq!(result.ncols(), weights.nrows());

        // Summing across all nodes reproduces the aggregate curve
        for i in 0..balanced_curves.nrows() {
            let aggregate: f64 = balanced_curves.row(i).iter().sum();
            let distributed: f64 = result.row(i).iter().sum();
            assert_approx_eq!(f64, distributed, aggregate, epsilon = 1e-9);
        }
    }

    #[rstest]
    fn test_regionalise_curves_values(balanced_curves: CurveTable, weights: WeightTable) {
        let result = regionalise_curves(&balanced_curves, &weights, None, None, None).unwrap();

        // Each cell is the weight-scaled sum across sectors
        for (i, &hour) in balanced_curves.index().iter().enumerate() {
            for node in weights.index() {
                let expected: f64 = balanced_curves
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(j, key)| {
                        balanced_curves.get(i, j) * weights.value_at(node, key).unwrap()
                    })
                    .sum();
                assert_approx_eq!(
                    f64,
                    result.value_at(&hour, node).unwrap(),
                    expected,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[rstest]
    fn test_regionalise_curves_balance_gate(unbalanced_curves: CurveTable, weights: WeightTable) {
        let reporter = RecordingReporter::new();
        let err = regionalise_curves_with(
            &unbalanced_curves,
            &weights,
            None,
            None,
            None,
            &Classifier::default(),
            &reporter,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::Balance)
        );
        assert!(reporter.messages().is_empty());
    }

    #[rstest]
    fn test_regionalise_curves_missing_key_fatal(
        balanced_curves: CurveTable,
        weights: WeightTable,
    ) {
        let reduced = weights
            .select_columns(
                &weights.columns().iter().skip(1).cloned().collect::<Vec<_>>(),
            )
            .unwrap();
        let err = regionalise_curves(&balanced_curves, &reduced, None, None, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::SchemaMismatch { .. })
        ));
    }

    #[rstest]
    fn test_regionalise_curves_single_node_subset(
        balanced_curves: CurveTable,
        weights: WeightTable,
    ) {
        let reporter = RecordingReporter::new();
        let selection = Selection::Single(NodeID::new("N1"));
        let result = regionalise_curves_with(
            &balanced_curves,
            &weights,
            Some(&selection),
            None,
            None,
            &Classifier::default(),
            &reporter,
        )
        .unwrap();

        assert_eq!(result.ncols(), 1);
        assert!(reporter.messages().is_empty());

        let full = regionalise_curves(&balanced_curves, &weights, None, None, None).unwrap();
        for (i, &hour) in balanced_curves.index().iter().enumerate() {
            assert_approx_eq!(
                f64,
                result.get(i, 0),
                full.value_at(&hour, &"N1".into()).unwrap()
            );
        }
    }

    #[rstest]
    fn test_regionalise_curves_multi_node_warns_once(
        balanced_curves: CurveTable,
        weights: WeightTable,
    ) {
        let reporter = RecordingReporter::new();
        let selection = Selection::Many(vec!["N1".into(), "N2".into()]);
        let result = regionalise_curves_with(
            &balanced_curves,
            &weights,
            Some(&selection),
            None,
            None,
            &Classifier::default(),
            &reporter,
        )
        .unwrap();

        assert_eq!(result.ncols(), 2);
        assert_eq!(
            reporter.messages(),
            vec!["returning dot product for subset of multiple nodes"]
        );
    }

    #[rstest]
    fn test_regionalise_curves_sector_and_hour_subset(
        balanced_curves: CurveTable,
        weights: WeightTable,
    ) {
        let sector: ProductKey = "industry.output (MW)".into();
        let result = regionalise_curves(
            &balanced_curves,
            &weights,
            None,
            Some(&sector.clone().into()),
            Some(&Selection::Single(1)),
        )
        .unwrap();

        assert_eq!(result.nrows(), 1);
        let j = balanced_curves
            .columns()
            .get_index_of(&sector)
            .unwrap();
        for node in weights.index() {
            let expected = balanced_curves.get(1, j) * weights.value_at(node, &sector).unwrap();
            assert_approx_eq!(f64, result.value_at(&1, node).unwrap(), expected);
        }
    }

    #[rstest]
    fn test_regionalise_curves_unknown_hour(balanced_curves: CurveTable, weights: WeightTable) {
        let result = regionalise_curves(
            &balanced_curves,
            &weights,
            None,
            None,
            Some(&Selection::Single(9000)),
        );
        assert_error!(result, "Unknown row: 9000");
    }

    #[rstest]
    fn test_regionalise_node_half_weights(
        balanced_curves: CurveTable,
        half_weights: WeightTable,
    ) {
        // With a constant weight vector of 0.5, the profile is half the input elementwise
        let result =
            regionalise_node(&balanced_curves, &half_weights, &"N1".into(), None, None).unwrap();
        assert_eq!(result.columns(), balanced_curves.columns());
        for i in 0..balanced_curves.nrows() {
            for j in 0..balanced_curves.ncols() {
                assert_approx_eq!(f64, result.get(i, j), balanced_curves.get(i, j) * 0.5);
            }
        }
    }

    #[rstest]
    fn test_regionalise_node_unknown_node(balanced_curves: CurveTable, weights: WeightTable) {
        let result = regionalise_node(&balanced_curves, &weights, &"N9".into(), None, None);
        assert_error!(result, "Unknown node in regionalisation: N9");
    }

    #[rstest]
    fn test_regionalise_node_unbalanced_warns(
        unbalanced_curves: CurveTable,
        weights: WeightTable,
    ) {
        // The node profiler validates the balance in warn mode, so it proceeds
        let reporter = RecordingReporter::new();
        regionalise_node_with(
            &unbalanced_curves,
            &weights,
            &"N1".into(),
            None,
            None,
            &Classifier::default(),
            &reporter,
        )
        .unwrap();
        assert_eq!(reporter.messages(), vec!["Deficits in curves"]);
    }

    #[rstest]
    fn test_regionalise_nodes_stacking_equivalence(
        balanced_curves: CurveTable,
        weights: WeightTable,
    ) {
        let nodes: [NodeID; 2] = ["N1".into(), "N2".into()];
        let stacked =
            regionalise_nodes(&balanced_curves, &weights, &nodes, None, None).unwrap();
        assert_eq!(
            stacked.nrows(),
            balanced_curves.nrows() * nodes.len()
        );

        for node in &nodes {
            let single =
                regionalise_node(&balanced_curves, &weights, node, None, None).unwrap();
            assert_eq!(stacked.select_node(node).unwrap(), single);
        }
    }

    #[rstest]
    fn test_regionalise_nodes_sector_subset(balanced_curves: CurveTable, weights: WeightTable) {
        let sector: Selection<ProductKey> = vec![
            "industry.input (MW)".into(),
            "industry.output (MW)".into(),
        ]
        .into();
        let nodes: [NodeID; 2] = ["N1".into(), "N2".into()];
        let stacked =
            regionalise_nodes(&balanced_curves, &weights, &nodes, Some(&sector), None).unwrap();

        assert_eq!(stacked.ncols(), 2);
        for node in &nodes {
            let single =
                regionalise_node(&balanced_curves, &weights, node, Some(&sector), None).unwrap();
            assert_eq!(stacked.select_node(node).unwrap(), single);
        }
    }

    #[rstest]
    fn test_regionalise_nodes_empty(balanced_curves: CurveTable, weights: WeightTable) {
        let result = regionalise_nodes(&balanced_curves, &weights, &[], None, None);
        assert_error!(result, "No nodes requested");
    }
}
