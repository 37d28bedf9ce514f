//! Common routines for reading tabular input data.
//!
//! Curve and weight tables arrive as CSV files with a header row naming the columns and a
//! leading index column holding the row labels: hour numbers for curve tables, node keys for
//! regionalisation tables.
use crate::frame::{CurveTable, Frame, Label, WeightTable};
use crate::id::ProductKey;
use anyhow::{Context, Result, ensure};
use std::path::Path;

/// Generate the standard error message for when a file fails to read
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().to_string_lossy())
}

/// Read a curve table from a CSV file.
///
/// The first column holds integer hour labels; the remaining columns hold power values with
/// product keys in the header.
pub fn read_curves(file_path: &Path) -> Result<CurveTable> {
    read_frame(file_path, |label| {
        label
            .trim()
            .parse()
            .with_context(|| format!("Invalid hour label: {label}"))
    })
}

/// Read a regionalisation table from a CSV file.
///
/// The first column holds node keys; the remaining columns hold weight fractions with product
/// keys in the header.
pub fn read_weights(file_path: &Path) -> Result<WeightTable> {
    read_frame(file_path, |label| Ok(label.into()))
}

/// Read a frame from a CSV file, parsing row labels with `parse_label`.
fn read_frame<R: Label>(
    file_path: &Path,
    parse_label: impl Fn(&str) -> Result<R>,
) -> Result<Frame<R, ProductKey>> {
    read_frame_from_reader(
        csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?,
        parse_label,
    )
    .with_context(|| input_err_msg(file_path))
}

fn read_frame_from_reader<R: Label, T: std::io::Read>(
    mut reader: csv::Reader<T>,
    parse_label: impl Fn(&str) -> Result<R>,
) -> Result<Frame<R, ProductKey>> {
    let headers = reader.headers()?.clone();
    ensure!(
        headers.len() > 1,
        "CSV file must have an index column and at least one data column"
    );
    let columns: Vec<ProductKey> = headers.iter().skip(1).map(ProductKey::from).collect();

    let mut index = Vec::new();
    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        ensure!(
            record.len() == headers.len(),
            "Expected {} fields per row, got {}",
            headers.len(),
            record.len()
        );

        index.push(parse_label(&record[0])?);
        for field in record.iter().skip(1) {
            let value: f64 = field
                .trim()
                .parse()
                .with_context(|| format!("Invalid value: {field}"))?;
            values.push(value);
        }
    }
    ensure!(!index.is_empty(), "CSV file cannot be empty");

    Frame::new(index, columns, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    #[rstest]
    fn test_read_curves() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("curves.csv");
        fs::write(
            &file_path,
            "hour,a.input (MW),a.output (MW)\n0,1.0,1.0\n1,2.5,2.5\n",
        )
        .unwrap();

        let curves = read_curves(&file_path).unwrap();
        assert_eq!(curves.nrows(), 2);
        assert_eq!(curves.ncols(), 2);
        assert_approx_eq!(f64, curves.value_at(&1, &"a.input (MW)".into()).unwrap(), 2.5);
    }

    #[rstest]
    fn test_read_weights() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("reg.csv");
        fs::write(
            &file_path,
            "node,a.input (MW),a.output (MW)\nN1,0.4,0.4\nN2,0.6,0.6\n",
        )
        .unwrap();

        let reg = read_weights(&file_path).unwrap();
        assert_eq!(reg.nrows(), 2);
        assert_approx_eq!(f64, reg.value_at(&"N2".into(), &"a.input (MW)".into()).unwrap(), 0.6);
    }

    #[rstest]
    fn test_read_curves_bad_hour_label() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("curves.csv");
        fs::write(&file_path, "hour,a.input (MW)\nmidnight,1.0\n").unwrap();

        assert_error!(read_curves(&file_path), input_err_msg(&file_path));
    }

    #[rstest]
    fn test_read_curves_bad_value() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("curves.csv");
        fs::write(&file_path, "hour,a.input (MW)\n0,lots\n").unwrap();

        assert_error!(read_curves(&file_path), input_err_msg(&file_path));
    }

    #[rstest]
    fn test_read_curves_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("curves.csv");
        fs::write(&file_path, "hour,a.input (MW)\n").unwrap();

        assert_error!(read_curves(&file_path), input_err_msg(&file_path));
    }
}
