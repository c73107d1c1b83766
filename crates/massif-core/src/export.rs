//! ESRI ASCII grid export.
//!
//! Header of six `key value` lines, then one row of values per grid row,
//! north first. Closed nodes are written as the NODATA value so downstream
//! GIS tools mask them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ModelError;
use crate::grid::{NodeStatus, RasterGrid};

pub const NODATA: f64 = -9999.0;

/// Write `values` (one per node) as an ESRI ASCII grid.
pub fn write_esri_ascii<W: Write>(
    out: &mut W,
    grid: &RasterGrid,
    values: &[f64],
) -> Result<(), ModelError> {
    if values.len() != grid.node_count() {
        return Err(ModelError::FieldLength {
            name: "export".to_string(),
            got: values.len(),
            want: grid.node_count(),
        });
    }

    writeln!(out, "ncols {}", grid.cols())?;
    writeln!(out, "nrows {}", grid.rows())?;
    writeln!(out, "xllcorner 0.0")?;
    writeln!(out, "yllcorner 0.0")?;
    writeln!(out, "cellsize {}", grid.spacing())?;
    writeln!(out, "NODATA_value {NODATA}")?;

    for r in 0..grid.rows() {
        let mut line = String::with_capacity(grid.cols() * 12);
        for c in 0..grid.cols() {
            if c > 0 {
                line.push(' ');
            }
            let i = grid.node_id(r, c);
            if grid.status(i) == NodeStatus::Closed {
                line.push_str(&format!("{NODATA}"));
            } else {
                line.push_str(&format!("{}", values[i]));
            }
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Write an ESRI ASCII grid to `path`, creating or truncating the file.
pub fn export_esri_ascii(
    path: impl AsRef<Path>,
    grid: &RasterGrid,
    values: &[f64],
) -> Result<(), ModelError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_esri_ascii(&mut out, grid, values)?;
    out.flush()?;
    Ok(())
}
