//! CSV export of growth curves and stability diagrams.

use std::io;

use serde::Serialize;

use crate::fatigue::GrowthPoint;
use crate::r_curve::DiagramPoint;

fn write_rows<W: io::Write, T: Serialize>(writer: W, rows: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `crack_length,cycles` rows.
pub fn write_growth_curve<W: io::Write>(writer: W, points: &[GrowthPoint]) -> csv::Result<()> {
    write_rows(writer, points)
}

/// Writes `delta_a,resistance,applied` rows.
pub fn write_stability_diagram<W: io::Write>(writer: W, points: &[DiagramPoint]) -> csv::Result<()> {
    write_rows(writer, points)
}
