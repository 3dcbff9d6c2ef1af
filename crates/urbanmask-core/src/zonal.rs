//! Lookups against a finished classification: per-zone population totals
//! and buffered point queries.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::{CellClass, ClassificationResult};
use crate::error::{InvalidInputError, Result};
use crate::grid::PopulationGrid;

/// Population split for one zone id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneStats {
    pub urban_population: f64,
    pub total_population: f64,
    pub urban_cells: usize,
    pub cells: usize,
}

/// Sum urban and total population per zone.
///
/// `zones` is a row-major id grid matching `grid`; `None` cells belong to no
/// zone. No-data population cells are skipped.
pub fn zonal_urban_population(
    result: &ClassificationResult,
    grid: &PopulationGrid,
    zones: &[Option<u32>],
    zone_width: usize,
) -> Result<BTreeMap<u32, ZoneStats>> {
    let zone_height = if zone_width == 0 { 0 } else { zones.len() / zone_width };
    if zone_width != grid.width || zone_height != grid.height || zones.len() != grid.data.len() {
        return Err(InvalidInputError::ZoneSizeMismatch {
            width: grid.width,
            height: grid.height,
            zone_width,
            zone_height,
        });
    }

    let mut out: BTreeMap<u32, ZoneStats> = BTreeMap::new();
    for ((zone, &v), &class) in zones.iter().zip(&grid.data).zip(&result.labels) {
        let Some(zone) = zone else { continue };
        if class == CellClass::NoData {
            continue;
        }
        let stats = out.entry(*zone).or_default();
        stats.cells += 1;
        stats.total_population += f64::from(v);
        if class == CellClass::Urban {
            stats.urban_cells += 1;
            stats.urban_population += f64::from(v);
        }
    }
    Ok(out)
}

/// Urban context around a single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointClass {
    /// Class of the cell the point falls in.
    pub class: CellClass,
    /// Fraction of valid cells within the buffer that are urban.
    pub urban_share: f64,
    pub valid_cells: usize,
}

/// Classify a point by the square buffer of `radius` cells around it,
/// clipped at the grid edge.
pub fn classify_point(
    result: &ClassificationResult,
    row: usize,
    col: usize,
    radius: usize,
) -> Result<PointClass> {
    if row >= result.height || col >= result.width {
        return Err(InvalidInputError::PointOutOfBounds {
            row,
            col,
            width: result.width,
            height: result.height,
        });
    }

    let r0 = row.saturating_sub(radius);
    let r1 = (row + radius).min(result.height - 1);
    let c0 = col.saturating_sub(radius);
    let c1 = (col + radius).min(result.width - 1);

    let mut valid = 0usize;
    let mut urban = 0usize;
    for r in r0..=r1 {
        for c in c0..=c1 {
            match result.get(r, c) {
                CellClass::NoData => {}
                CellClass::Urban => {
                    valid += 1;
                    urban += 1;
                }
                CellClass::Rural => valid += 1,
            }
        }
    }

    Ok(PointClass {
        class: result.get(row, col),
        urban_share: if valid == 0 { 0.0 } else { urban as f64 / valid as f64 },
        valid_cells: valid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, ClassifyParams};
    use crate::connectivity::ConnectivityMode;
    use approx::assert_relative_eq;

    fn classified() -> (PopulationGrid, ClassificationResult) {
        let g = PopulationGrid::from_option_rows(vec![
            vec![Some(800.0), Some(800.0), Some(10.0), Some(10.0)],
            vec![Some(800.0), None, Some(10.0), Some(10.0)],
        ])
        .unwrap();
        let p = ClassifyParams {
            density_cutoff: 300.0,
            min_cluster_population: 2000.0,
            connectivity: ConnectivityMode::Four,
            mask_mode: false,
        };
        let r = classify(&g, &p).unwrap();
        (g, r)
    }

    #[test]
    fn zonal_sums_split_urban_and_total() {
        let (g, r) = classified();
        let zones = vec![
            Some(1), Some(1), Some(2), Some(2),
            Some(1), Some(1), Some(2), None,
        ];
        let stats = zonal_urban_population(&r, &g, &zones, 4).unwrap();

        let west = &stats[&1];
        assert_eq!(west.cells, 3);
        assert_eq!(west.urban_cells, 3);
        assert_relative_eq!(west.urban_population, 2400.0);

        let east = &stats[&2];
        assert_eq!(east.cells, 3);
        assert_eq!(east.urban_cells, 0);
        assert_relative_eq!(east.total_population, 30.0);
    }

    #[test]
    fn zonal_rejects_mismatched_zone_grid() {
        let (g, r) = classified();
        let zones = vec![Some(1); 6];
        assert!(matches!(
            zonal_urban_population(&r, &g, &zones, 3),
            Err(InvalidInputError::ZoneSizeMismatch { .. })
        ));
    }

    #[test]
    fn point_buffer_clips_at_edges_and_skips_nodata() {
        let (_, r) = classified();
        let p = classify_point(&r, 0, 0, 1).unwrap();
        assert_eq!(p.class, CellClass::Urban);
        // (0,0) (0,1) (1,0) valid and urban, (1,1) is no data.
        assert_eq!(p.valid_cells, 3);
        assert_relative_eq!(p.urban_share, 1.0);

        let p = classify_point(&r, 0, 2, 1).unwrap();
        assert_eq!(p.class, CellClass::Rural);
        assert_eq!(p.valid_cells, 5);
        assert_relative_eq!(p.urban_share, 1.0 / 5.0);
    }

    #[test]
    fn point_outside_grid_is_rejected() {
        let (_, r) = classified();
        assert!(matches!(
            classify_point(&r, 2, 0, 1),
            Err(InvalidInputError::PointOutOfBounds { .. })
        ));
    }
}
