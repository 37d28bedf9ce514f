//! Classification of product keys into supply and demand groups.
//!
//! Curve-table columns carry compound keys such as `industry.output (MW)`. The trailing suffix
//! denotes the direction of the flow; everything that matches neither suffix is left out of
//! balance aggregation.

/// The direction group a product key belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductGroup {
    /// The key carries an energy supply curve
    Supply,
    /// The key carries an energy demand curve
    Demand,
    /// The key matches neither suffix and is excluded from balance aggregation
    Unclassified,
}

/// Classifies product keys by their direction suffix.
///
/// The default suffixes match the curve naming convention of the scenario service (`.output (MW)`
/// for supply, `.input (MW)` for demand) but can be overridden for differently-labelled data.
#[derive(Clone, Debug, PartialEq)]
pub struct Classifier {
    supply_suffix: String,
    demand_suffix: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            supply_suffix: ".output (MW)".to_string(),
            demand_suffix: ".input (MW)".to_string(),
        }
    }
}

impl Classifier {
    /// Create a classifier with custom direction suffixes
    pub fn new(supply_suffix: &str, demand_suffix: &str) -> Self {
        Self {
            supply_suffix: supply_suffix.to_string(),
            demand_suffix: demand_suffix.to_string(),
        }
    }

    /// Classify a product key by its suffix
    pub fn classify(&self, key: &str) -> ProductGroup {
        if key.ends_with(&self.supply_suffix) {
            ProductGroup::Supply
        } else if key.ends_with(&self.demand_suffix) {
            ProductGroup::Demand
        } else {
            ProductGroup::Unclassified
        }
    }
}
