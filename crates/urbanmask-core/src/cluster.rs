/// Per-component aggregation over a labelled grid.
use serde::Serialize;

use crate::grid::PopulationGrid;
use crate::labeling::ComponentLabels;

/// One maximal connected group of candidate cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Dense id; clusters are numbered by the row-major position of their
    /// first cell.
    pub id: usize,
    /// Member (row, col) coordinates in row-major order.
    pub cells: Vec<(usize, usize)>,
    /// Sum of member populations.
    pub population: f64,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Inclusive: a cluster that exactly reaches the minimum is urban.
    #[inline]
    pub fn is_urban(&self, min_cluster_population: f64) -> bool {
        self.population >= min_cluster_population
    }
}

/// Gather members and population sums for every labelled component.
/// Sums accumulate in row-major order so the result depends only on the
/// labels, not on how they were produced.
pub fn collect_clusters(grid: &PopulationGrid, labels: &ComponentLabels) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = (0..labels.count)
        .map(|id| Cluster { id, cells: Vec::new(), population: 0.0 })
        .collect();

    for r in 0..grid.height {
        for c in 0..grid.width {
            if let Some(l) = labels.get(r, c) {
                let cluster = &mut clusters[l];
                cluster.cells.push((r, c));
                cluster.population += f64::from(grid.get(r, c));
            }
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityMode;
    use crate::labeling::label_components;
    use approx::assert_relative_eq;

    #[test]
    fn cluster_population_sums_members() {
        let g = PopulationGrid::from_rows(vec![
            vec![400.0, 350.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 1200.0],
        ])
        .unwrap();
        let labels = label_components(&g, 300.0, ConnectivityMode::Eight);
        let clusters = collect_clusters(&g, &labels);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].cells, vec![(0, 0), (0, 1)]);
        assert_relative_eq!(clusters[0].population, 750.0);
        assert_eq!(clusters[1].cells, vec![(2, 2)]);
        assert_relative_eq!(clusters[1].population, 1200.0);
    }

    #[test]
    fn urban_threshold_is_inclusive() {
        let c = Cluster { id: 0, cells: vec![(0, 0)], population: 500.0 };
        assert!(c.is_urban(500.0));
        assert!(!c.is_urban(500.5));
    }
}
