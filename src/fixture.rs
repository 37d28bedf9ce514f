//! Fixtures for tests

use crate::frame::{CurveTable, Frame, WeightTable};
use crate::reporter::Reporter;
use rstest::fixture;
use std::cell::RefCell;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A [`Reporter`] that records warnings for assertions
#[derive(Default)]
pub struct RecordingReporter {
    messages: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The warnings recorded so far, in order
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// A small curve table where supply equals demand for every hour
#[fixture]
pub fn balanced_curves() -> CurveTable {
    Frame::new(
        [0, 1, 2],
        [
            "agriculture.input (MW)".into(),
            "agriculture.output (MW)".into(),
            "industry.input (MW)".into(),
            "industry.output (MW)".into(),
        ],
        vec![
            2.0, 1.0, 2.0, 3.0, //
            1.0, 2.0, 3.0, 2.0, //
            0.0, 0.0, 5.0, 5.0,
        ],
    )
    .unwrap()
}

/// [`balanced_curves`] with a 5 MW surplus at hour 1
#[fixture]
pub fn unbalanced_curves(balanced_curves: CurveTable) -> CurveTable {
    let mut curves = balanced_curves;
    curves.set(1, 3, 7.0);
    curves
}

/// A regionalisation table for [`balanced_curves`] with every column summing to 1
#[fixture]
pub fn weights(balanced_curves: CurveTable) -> WeightTable {
    Frame::new(
        ["N1".into(), "N2".into()],
        balanced_curves.columns().iter().cloned(),
        vec![
            0.4, 0.4, 0.25, 0.25, //
            0.6, 0.6, 0.75, 0.75,
        ],
    )
    .unwrap()
}

/// A regionalisation table assigning every key a constant weight of 0.5
#[fixture]
pub fn half_weights(balanced_curves: CurveTable) -> WeightTable {
    Frame::new(
        ["N1".into(), "N2".into()],
        balanced_curves.columns().iter().cloned(),
        vec![0.5; 8],
    )
    .unwrap()
}
