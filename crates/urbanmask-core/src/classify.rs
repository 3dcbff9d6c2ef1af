//! Urban / rural classification of a population grid.
//!
//! Steps:
//! 1. Candidate selection: valid cells strictly above `density_cutoff`.
//! 2. Component discovery under the chosen connectivity.
//! 3. Aggregate population per component.
//! 4. Components reaching `min_cluster_population` (inclusive) are urban;
//!    every other valid cell is rural, no-data cells stay no data.
//! 5. Output: population mask or categorical grid, selected by `mask_mode`.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{collect_clusters, Cluster};
use crate::connectivity::ConnectivityMode;
use crate::error::{InvalidInputError, Result};
use crate::grid::{PopulationGrid, NODATA};
use crate::labeling::{label_components, label_components_banded, ComponentLabels};

/// Caller-supplied thresholds and output options.
/// Defaults are the degree-of-urbanisation "urban cluster" values for a
/// 1 km² grid: more than 300 people per cell, at least 5000 per cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyParams {
    /// Population per cell a candidate must exceed.
    pub density_cutoff: f64,
    /// Minimum aggregate population of an urban cluster.
    pub min_cluster_population: f64,
    pub connectivity: ConnectivityMode,
    /// `true`: urban cells keep their population, all else no data.
    /// `false`: categorical 1 (urban) / 0 (rural) grid.
    pub mask_mode: bool,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            density_cutoff: 300.0,
            min_cluster_population: 5000.0,
            connectivity: ConnectivityMode::Eight,
            mask_mode: true,
        }
    }
}

impl ClassifyParams {
    pub fn validate(&self) -> Result<()> {
        check_threshold("density_cutoff", self.density_cutoff)?;
        check_threshold("min_cluster_population", self.min_cluster_population)
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(InvalidInputError::InvalidThreshold { name, value });
    }
    Ok(())
}

/// Final label of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellClass {
    Urban,
    Rural,
    NoData,
}

impl CellClass {
    /// Raster encoding of the categorical output.
    pub fn code(self) -> f32 {
        match self {
            Self::Urban => 1.0,
            Self::Rural => 0.0,
            Self::NoData => NODATA,
        }
    }
}

/// Diagnostics for one discovered cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterInfo {
    pub id: usize,
    /// Row-major first member.
    pub origin: (usize, usize),
    pub size: usize,
    pub population: f64,
    pub urban: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub width: usize,
    pub height: usize,
    pub mask_mode: bool,
    /// Row-major label per cell.
    pub labels: Vec<CellClass>,
    /// Population of urban cells, NaN elsewhere. Present in mask mode.
    #[serde(skip)]
    pub urban_population: Option<Vec<f32>>,
    /// Every candidate cluster, urban or not, in id order.
    pub clusters: Vec<ClusterInfo>,
}

impl ClassificationResult {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> CellClass {
        self.labels[row * self.width + col]
    }

    pub fn count(&self, class: CellClass) -> usize {
        self.labels.iter().filter(|&&l| l == class).count()
    }

    pub fn urban_clusters(&self) -> impl Iterator<Item = &ClusterInfo> {
        self.clusters.iter().filter(|c| c.urban)
    }

    /// The output grid selected by `mask_mode`.
    pub fn raster(&self) -> Vec<f32> {
        match &self.urban_population {
            Some(values) if self.mask_mode => values.clone(),
            _ => self.labels.iter().map(|l| l.code()).collect(),
        }
    }
}

/// Bitwise on the population mask, so NaN cells compare equal.
impl PartialEq for ClassificationResult {
    fn eq(&self, other: &Self) -> bool {
        let same_mask = match (&self.urban_population, &other.urban_population) {
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (None, None) => true,
            _ => false,
        };
        same_mask
            && self.width == other.width
            && self.height == other.height
            && self.mask_mode == other.mask_mode
            && self.labels == other.labels
            && self.clusters == other.clusters
    }
}

/// Classify `grid` with the sequential reference labelling.
pub fn classify(grid: &PopulationGrid, params: &ClassifyParams) -> Result<ClassificationResult> {
    classify_with(grid, params, |g, p| {
        label_components(g, p.density_cutoff, p.connectivity)
    })
}

/// Classify `grid` labelling `bands` row bands concurrently. The result is
/// identical to [`classify`].
pub fn classify_parallel(
    grid: &PopulationGrid,
    params: &ClassifyParams,
    bands: usize,
) -> Result<ClassificationResult> {
    classify_with(grid, params, |g, p| {
        label_components_banded(g, p.density_cutoff, p.connectivity, bands)
    })
}

fn classify_with<F>(grid: &PopulationGrid, params: &ClassifyParams, label: F) -> Result<ClassificationResult>
where
    F: FnOnce(&PopulationGrid, &ClassifyParams) -> ComponentLabels,
{
    grid.validate()?;
    params.validate()?;

    let _span = tracing::debug_span!("classify", width = grid.width, height = grid.height).entered();

    let components = label(grid, params);
    let clusters = collect_clusters(grid, &components);
    let urban: Vec<bool> = clusters
        .iter()
        .map(|c| c.is_urban(params.min_cluster_population))
        .collect();

    let labels: Vec<CellClass> = grid
        .data
        .iter()
        .zip(&components.labels)
        .map(|(&v, &l)| {
            if v.is_nan() {
                CellClass::NoData
            } else if urban.get(l).copied().unwrap_or(false) {
                CellClass::Urban
            } else {
                CellClass::Rural
            }
        })
        .collect();

    let urban_population = params.mask_mode.then(|| {
        grid.data
            .iter()
            .zip(&labels)
            .map(|(&v, &l)| if l == CellClass::Urban { v } else { NODATA })
            .collect()
    });

    let clusters: Vec<ClusterInfo> = clusters
        .into_iter()
        .zip(&urban)
        .map(|(c, &urban)| cluster_info(c, urban))
        .collect();

    debug!(
        candidates = components.labels.iter().filter(|&&l| l != crate::labeling::UNLABELED).count(),
        clusters = clusters.len(),
        urban_clusters = clusters.iter().filter(|c| c.urban).count(),
        "classified population grid"
    );

    Ok(ClassificationResult {
        width: grid.width,
        height: grid.height,
        mask_mode: params.mask_mode,
        labels,
        urban_population,
        clusters,
    })
}

fn cluster_info(c: Cluster, urban: bool) -> ClusterInfo {
    ClusterInfo {
        id: c.id,
        origin: c.cells.first().copied().unwrap_or((0, 0)),
        size: c.cells.len(),
        population: c.population,
        urban,
    }
}
