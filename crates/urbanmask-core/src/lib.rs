//! Urban / rural classification of population rasters by contiguity.
//!
//! Cells whose population exceeds a density cutoff are grouped into
//! connected clusters (4- or 8-neighbour). Clusters whose total population
//! reaches a minimum are urban; every other valid cell is rural.
//!
//! ```
//! use urbanmask_core::{classify, CellClass, ClassifyParams, ConnectivityMode, PopulationGrid};
//!
//! let grid = PopulationGrid::from_rows(vec![
//!     vec![0.0, 0.0, 0.0],
//!     vec![0.0, 400.0, 0.0],
//!     vec![0.0, 0.0, 0.0],
//! ])?;
//! let params = ClassifyParams {
//!     density_cutoff: 300.0,
//!     min_cluster_population: 300.0,
//!     connectivity: ConnectivityMode::Eight,
//!     mask_mode: false,
//! };
//! let result = classify(&grid, &params)?;
//! assert_eq!(result.get(1, 1), CellClass::Urban);
//! # Ok::<(), urbanmask_core::InvalidInputError>(())
//! ```
pub mod aggregate;
pub mod classify;
pub mod cluster;
pub mod connectivity;
pub mod error;
pub mod grid;
pub mod labeling;
pub mod summary;
pub mod zonal;

pub use aggregate::aggregate_sum;
pub use classify::{classify, classify_parallel, CellClass, ClassificationResult, ClassifyParams, ClusterInfo};
pub use cluster::Cluster;
pub use connectivity::ConnectivityMode;
pub use error::InvalidInputError;
pub use grid::{PopulationGrid, NODATA};
pub use summary::ClassificationSummary;
pub use zonal::{classify_point, zonal_urban_population, PointClass, ZoneStats};
