//! Connected-component labelling of candidate cells.
//!
//! A single row-major scan unites every candidate with its already-visited
//! candidate neighbours in a disjoint-set forest. Unions always attach the
//! larger root under the smaller one, so each component's root is its
//! minimum linear index no matter which order edges are processed in. Final
//! labels are handed out in order of those roots.
//!
//! With the `threading` feature, rows are split into bands that are scanned
//! on the rayon pool. Each band's forest stays inside its own slice of the
//! parent array; a sequential pass then unites candidates touching across
//! band edges before the same canonicalisation runs.
use std::ops::Range;

use crate::connectivity::ConnectivityMode;
use crate::grid::PopulationGrid;

/// Parent / label value for cells that are not candidates.
pub const UNLABELED: usize = usize::MAX;

/// Per-cell component labels, `0..count` for candidates, `UNLABELED` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLabels {
    pub labels: Vec<usize>,
    pub count: usize,
    pub width: usize,
    pub height: usize,
}

impl ComponentLabels {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        match self.labels[row * self.width + col] {
            UNLABELED => None,
            l => Some(l),
        }
    }
}

/// A candidate has a population strictly above the cutoff. No data never is.
#[inline]
pub fn is_candidate(value: f32, density_cutoff: f64) -> bool {
    !value.is_nan() && f64::from(value) > density_cutoff
}

/// Disjoint-set forest over a window of the global parent array.
/// Entries hold global linear indices; `base` is the window's first index.
struct Forest<'a> {
    parent: &'a mut [usize],
    base: usize,
}

impl Forest<'_> {
    #[inline]
    fn contains(&self, i: usize) -> bool {
        self.parent[i - self.base] != UNLABELED
    }

    fn find(&mut self, mut i: usize) -> usize {
        // Path halving.
        loop {
            let p = self.parent[i - self.base];
            if p == i {
                return i;
            }
            let gp = self.parent[p - self.base];
            self.parent[i - self.base] = gp;
            i = gp;
        }
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra < rb {
            self.parent[rb - self.base] = ra;
        } else if rb < ra {
            self.parent[ra - self.base] = rb;
        }
    }
}

/// Scan `rows` and build the forest for that band only. `parent` covers
/// exactly those rows.
fn label_band(
    grid: &PopulationGrid,
    density_cutoff: f64,
    connectivity: ConnectivityMode,
    rows: Range<usize>,
    parent: &mut [usize],
) {
    let width = grid.width;
    let mut forest = Forest { parent, base: rows.start * width };
    let top = rows.start as isize;

    for r in rows {
        for c in 0..width {
            let i = r * width + c;
            if !is_candidate(grid.data[i], density_cutoff) {
                continue;
            }
            forest.parent[i - forest.base] = i;

            for &(dr, dc) in connectivity.backward_offsets() {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr < top || nc < 0 || nc >= width as isize {
                    continue;
                }
                let j = nr as usize * width + nc as usize;
                if forest.contains(j) {
                    forest.union(i, j);
                }
            }
        }
    }
}

/// Assign dense labels in root order. Roots are component minima, so a
/// root is always reached before any other member of its component.
fn canonicalise(mut parent: Vec<usize>, width: usize, height: usize) -> ComponentLabels {
    let n = parent.len();
    let mut labels = vec![UNLABELED; n];
    let mut count = 0usize;
    let mut forest = Forest { parent: &mut parent, base: 0 };

    for i in 0..n {
        if !forest.contains(i) {
            continue;
        }
        let root = forest.find(i);
        if root == i {
            labels[i] = count;
            count += 1;
        } else {
            labels[i] = labels[root];
        }
    }

    ComponentLabels { labels, count, width, height }
}

/// Sequential reference labelling.
pub fn label_components(
    grid: &PopulationGrid,
    density_cutoff: f64,
    connectivity: ConnectivityMode,
) -> ComponentLabels {
    let mut parent = vec![UNLABELED; grid.data.len()];
    label_band(grid, density_cutoff, connectivity, 0..grid.height, &mut parent);
    canonicalise(parent, grid.width, grid.height)
}

/// Band-parallel labelling. Produces exactly the labels of
/// [`label_components`].
#[cfg(feature = "threading")]
pub fn label_components_banded(
    grid: &PopulationGrid,
    density_cutoff: f64,
    connectivity: ConnectivityMode,
    bands: usize,
) -> ComponentLabels {
    use rayon::prelude::*;

    let width = grid.width;
    let height = grid.height;
    if grid.data.is_empty() {
        return canonicalise(Vec::new(), width, height);
    }
    let bands = bands.clamp(1, height);
    let band_rows = height.div_ceil(bands);

    let mut parent = vec![UNLABELED; grid.data.len()];
    parent
        .par_chunks_mut(band_rows * width)
        .enumerate()
        .for_each(|(k, chunk)| {
            let start = k * band_rows;
            let end = (start + band_rows).min(height);
            label_band(grid, density_cutoff, connectivity, start..end, chunk);
        });

    stitch_bands(&mut parent, grid, connectivity, band_rows);
    canonicalise(parent, width, height)
}

/// Unite candidates on the first row of each band with their candidate
/// neighbours on the last row of the band above.
#[cfg(feature = "threading")]
fn stitch_bands(
    parent: &mut [usize],
    grid: &PopulationGrid,
    connectivity: ConnectivityMode,
    band_rows: usize,
) {
    let width = grid.width;
    let mut forest = Forest { parent, base: 0 };

    for r in (band_rows..grid.height).step_by(band_rows) {
        for c in 0..width {
            let i = r * width + c;
            if !forest.contains(i) {
                continue;
            }
            for &dc in connectivity.upward_offsets() {
                let nc = c as isize + dc;
                if nc < 0 || nc >= width as isize {
                    continue;
                }
                let j = (r - 1) * width + nc as usize;
                if forest.contains(j) {
                    forest.union(i, j);
                }
            }
        }
    }
}

/// Without rayon the banded entry point is the sequential scan.
#[cfg(not(feature = "threading"))]
pub fn label_components_banded(
    grid: &PopulationGrid,
    density_cutoff: f64,
    connectivity: ConnectivityMode,
    _bands: usize,
) -> ComponentLabels {
    label_components(grid, density_cutoff, connectivity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: Vec<Vec<f32>>) -> PopulationGrid {
        PopulationGrid::from_rows(rows).unwrap()
    }

    #[test]
    fn diagonal_pair_splits_under_four_and_joins_under_eight() {
        let g = grid(vec![vec![500.0, 0.0], vec![0.0, 500.0]]);
        assert_eq!(label_components(&g, 300.0, ConnectivityMode::Four).count, 2);
        assert_eq!(label_components(&g, 300.0, ConnectivityMode::Eight).count, 1);
    }

    #[test]
    fn u_shape_merges_into_one_component() {
        // Two arms that only meet on the bottom row; the scan sees them as
        // separate until the last row.
        let g = grid(vec![
            vec![9.0, 0.0, 9.0],
            vec![9.0, 0.0, 9.0],
            vec![9.0, 9.0, 9.0],
        ]);
        let labels = label_components(&g, 1.0, ConnectivityMode::Four);
        assert_eq!(labels.count, 1);
        assert_eq!(labels.get(0, 0), Some(0));
        assert_eq!(labels.get(0, 2), Some(0));
        assert_eq!(labels.get(0, 1), None);
    }

    #[test]
    fn labels_follow_row_major_order_of_first_cell() {
        let g = grid(vec![
            vec![0.0, 0.0, 0.0, 9.0],
            vec![9.0, 0.0, 0.0, 9.0],
            vec![9.0, 0.0, 0.0, 0.0],
        ]);
        let labels = label_components(&g, 1.0, ConnectivityMode::Four);
        assert_eq!(labels.count, 2);
        // (0,3) comes first in the scan, so its component is 0.
        assert_eq!(labels.get(0, 3), Some(0));
        assert_eq!(labels.get(1, 0), Some(1));
    }

    #[test]
    fn cells_at_cutoff_and_nodata_are_not_candidates() {
        assert!(!is_candidate(300.0, 300.0));
        assert!(is_candidate(300.5, 300.0));
        assert!(!is_candidate(f32::NAN, 0.0));
    }

    #[test]
    fn nodata_does_not_bridge_components() {
        let g = grid(vec![vec![9.0, f32::NAN, 9.0]]);
        assert_eq!(label_components(&g, 1.0, ConnectivityMode::Eight).count, 2);
    }

    #[test]
    fn no_wraparound_between_row_ends() {
        let g = grid(vec![vec![0.0, 0.0, 9.0], vec![9.0, 0.0, 0.0]]);
        assert_eq!(label_components(&g, 1.0, ConnectivityMode::Eight).count, 2);
    }

    #[test]
    fn banded_matches_sequential_on_spiral() {
        let rows = vec![
            vec![9.0, 9.0, 9.0, 9.0, 9.0, 9.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 9.0],
            vec![9.0, 9.0, 9.0, 9.0, 0.0, 9.0],
            vec![9.0, 0.0, 0.0, 9.0, 0.0, 9.0],
            vec![9.0, 0.0, 0.0, 0.0, 0.0, 9.0],
            vec![9.0, 9.0, 9.0, 9.0, 9.0, 9.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![9.0, 0.0, 9.0, 0.0, 9.0, 0.0],
        ];
        let g = grid(rows);
        for mode in [ConnectivityMode::Four, ConnectivityMode::Eight] {
            let reference = label_components(&g, 1.0, mode);
            for bands in 1..=8 {
                assert_eq!(
                    label_components_banded(&g, 1.0, mode, bands),
                    reference,
                    "{mode} with {bands} bands"
                );
            }
        }
    }
}
