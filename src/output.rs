//! The module responsible for writing result tables to disk.
//!
//! Result frames are written as CSV with the same shape they were read in: a header row naming
//! the columns and a leading index column holding the row labels. Stacked per-node profiles
//! write their two row-key levels as two leading columns.
use crate::frame::{Frame, Label, StackedProfiles};
use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::Path;

/// Generate the standard error message for when a file fails to write
fn output_err_msg(file_path: &Path) -> String {
    format!("Error writing {}", file_path.to_string_lossy())
}

/// Write a frame to a CSV file.
///
/// # Arguments
///
/// * `frame` - The frame to write
/// * `file_path` - The destination file
/// * `index_name` - The header name for the index column
pub fn write_frame<R, C>(frame: &Frame<R, C>, file_path: &Path, index_name: &str) -> Result<()>
where
    R: Label + Display,
    C: Label + Display,
{
    let mut writer =
        csv::Writer::from_path(file_path).with_context(|| output_err_msg(file_path))?;

    let mut header = vec![index_name.to_string()];
    header.extend(frame.columns().iter().map(ToString::to_string));
    writer
        .write_record(&header)
        .with_context(|| output_err_msg(file_path))?;

    for (i, label) in frame.index().iter().enumerate() {
        let mut record = vec![label.to_string()];
        record.extend(frame.row(i).iter().map(ToString::to_string));
        writer
            .write_record(&record)
            .with_context(|| output_err_msg(file_path))?;
    }

    writer.flush().with_context(|| output_err_msg(file_path))?;
    Ok(())
}

/// Write stacked per-node profiles to a CSV file with `node` and `hour` index columns
pub fn write_stacked_profiles(profiles: &StackedProfiles, file_path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(file_path).with_context(|| output_err_msg(file_path))?;

    let mut header = vec!["node".to_string(), "hour".to_string()];
    header.extend(profiles.columns().iter().map(ToString::to_string));
    writer
        .write_record(&header)
        .with_context(|| output_err_msg(file_path))?;

    for (i, (node, hour)) in profiles.index().iter().enumerate() {
        let mut record = vec![node.to_string(), hour.to_string()];
        record.extend(profiles.row(i).iter().map(ToString::to_string));
        writer
            .write_record(&record)
            .with_context(|| output_err_msg(file_path))?;
    }

    writer.flush().with_context(|| output_err_msg(file_path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::balanced_curves;
    use crate::frame::CurveTable;
    use crate::input::read_curves;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_write_frame_round_trip(balanced_curves: CurveTable) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("curves.csv");

        write_frame(&balanced_curves, &file_path, "hour").unwrap();
        let read_back = read_curves(&file_path).unwrap();
        assert_eq!(read_back, balanced_curves);
    }

    #[rstest]
    fn test_write_stacked_profiles() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("profiles.csv");

        let profiles: StackedProfiles = Frame::new(
            [("N1".into(), 0), ("N2".into(), 0)],
            ["a.input (MW)".into()],
            vec![1.5, 2.5],
        )
        .unwrap();
        write_stacked_profiles(&profiles, &file_path).unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(
            contents,
            "node,hour,a.input (MW)\nN1,0,1.5\nN2,0,2.5\n"
        );
    }
}
