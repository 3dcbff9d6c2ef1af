/// Aggregate figures for a classified grid.
use serde::Serialize;

use crate::classify::{CellClass, ClassificationResult};
use crate::grid::PopulationGrid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub urban_cells: usize,
    pub rural_cells: usize,
    pub nodata_cells: usize,
    pub urban_population: f64,
    pub total_population: f64,
    /// urban / total population, 0 for an unpopulated grid.
    pub urban_share: f64,
    pub clusters: usize,
    pub urban_clusters: usize,
    pub largest_cluster_population: f64,
}

impl ClassificationSummary {
    pub fn from_result(grid: &PopulationGrid, result: &ClassificationResult) -> Self {
        let mut urban_population = 0.0f64;
        let mut total_population = 0.0f64;
        for (&v, &l) in grid.data.iter().zip(&result.labels) {
            if l == CellClass::NoData {
                continue;
            }
            total_population += f64::from(v);
            if l == CellClass::Urban {
                urban_population += f64::from(v);
            }
        }

        let urban_share = if total_population > 0.0 {
            urban_population / total_population
        } else {
            0.0
        };

        Self {
            urban_cells: result.count(CellClass::Urban),
            rural_cells: result.count(CellClass::Rural),
            nodata_cells: result.count(CellClass::NoData),
            urban_population,
            total_population,
            urban_share,
            clusters: result.clusters.len(),
            urban_clusters: result.urban_clusters().count(),
            largest_cluster_population: result
                .clusters
                .iter()
                .map(|c| c.population)
                .fold(0.0, f64::max),
        }
    }
}
