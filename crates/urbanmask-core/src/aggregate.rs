/// Block-sum aggregation, e.g. 100 m population counts to 1 km cells.
use crate::error::{InvalidInputError, Result};
use crate::grid::{PopulationGrid, NODATA};

/// Sum `factor × factor` blocks into one cell.
///
/// No-data cells are skipped; a block with no valid cell is no data.
/// Partial blocks along the right and bottom edges are kept.
pub fn aggregate_sum(grid: &PopulationGrid, factor: usize) -> Result<PopulationGrid> {
    if factor == 0 {
        return Err(InvalidInputError::InvalidFactor);
    }
    grid.validate()?;
    if factor == 1 {
        return Ok(grid.clone());
    }

    let out_w = grid.width.div_ceil(factor);
    let out_h = grid.height.div_ceil(factor);
    let mut sums = vec![0.0f64; out_w * out_h];
    let mut valid = vec![false; out_w * out_h];

    for r in 0..grid.height {
        let orow = r / factor;
        for c in 0..grid.width {
            let v = grid.get(r, c);
            if v.is_nan() {
                continue;
            }
            let o = orow * out_w + c / factor;
            sums[o] += f64::from(v);
            valid[o] = true;
        }
    }

    let data = sums
        .into_iter()
        .zip(valid)
        .map(|(s, ok)| if ok { s as f32 } else { NODATA })
        .collect();
    PopulationGrid::from_vec(out_w, out_h, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aggregate_preserves_total_population() {
        let mut g = PopulationGrid::new(10, 10, 3.0);
        g.set(4, 4, NODATA);
        let agg = aggregate_sum(&g, 5).unwrap();
        assert_eq!((agg.width, agg.height), (2, 2));
        assert_relative_eq!(agg.total_population(), g.total_population());
        assert_relative_eq!(agg.get(0, 0), 72.0);
        assert_relative_eq!(agg.get(1, 1), 75.0);
    }

    #[test]
    fn partial_edge_blocks_are_kept() {
        let g = PopulationGrid::new(5, 3, 1.0);
        let agg = aggregate_sum(&g, 2).unwrap();
        assert_eq!((agg.width, agg.height), (3, 2));
        assert_relative_eq!(agg.get(0, 2), 2.0);
        assert_relative_eq!(agg.get(1, 2), 1.0);
    }

    #[test]
    fn all_nodata_block_stays_nodata() {
        let g = PopulationGrid::from_option_rows(vec![
            vec![None, None, Some(4.0)],
            vec![None, None, Some(4.0)],
        ])
        .unwrap();
        let agg = aggregate_sum(&g, 2).unwrap();
        assert!(agg.is_nodata(0, 0));
        assert_relative_eq!(agg.get(0, 1), 8.0);
    }

    #[test]
    fn zero_factor_is_rejected() {
        let g = PopulationGrid::new(2, 2, 1.0);
        assert_eq!(aggregate_sum(&g, 0).unwrap_err(), InvalidInputError::InvalidFactor);
    }
}
