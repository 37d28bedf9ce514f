//! A library for post-processing hourly energy curves from energy-system scenarios.
//!
//! National-scale hourly curve tables are redistributed across sub-national nodes and
//! demand/supply sectors through a regionalisation table, after validating the energy balance of
//! the curves and the normalisation of the weights. See [`regionalise::regionalise_curves`] and
//! [`regionalise::regionalise_node`] for the two distribution operations.
#![warn(missing_docs)]
pub mod categorise;
pub mod classify;
pub mod frame;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod regionalise;
pub mod reporter;
pub mod validate;

#[cfg(test)]
mod fixture;
