use serde::{Deserialize, Serialize};

use crate::error::{InvalidInputError, Result};

/// Marker for cells without a population estimate.
pub const NODATA: f32 = f32::NAN;

/// A 2D population raster, row-major, one count per fixed-area cell.
/// No-data cells are stored as NaN and serialise as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationGrid {
    /// Row-major population counts; NaN marks no data.
    #[serde(with = "nodata_values")]
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl PopulationGrid {
    /// Create a new grid filled with the given value.
    pub fn new(width: usize, height: usize, fill: f32) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(InvalidInputError::EmptyGrid);
        }
        if data.len() != width * height {
            return Err(InvalidInputError::SizeMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// Build from nested rows. Rejects empty and ragged input.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(InvalidInputError::EmptyGrid);
        }

        let mut data = Vec::with_capacity(width * height);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != width {
                return Err(InvalidInputError::RaggedRow {
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
            data.extend(cells);
        }
        Ok(Self { data, width, height })
    }

    /// Like [`from_rows`](Self::from_rows), with `None` meaning no data.
    pub fn from_option_rows(rows: Vec<Vec<Option<f32>>>) -> Result<Self> {
        Self::from_rows(
            rows.into_iter()
                .map(|r| r.into_iter().map(|v| v.unwrap_or(NODATA)).collect())
                .collect(),
        )
    }

    /// Replace every cell equal to `sentinel` (e.g. `-9999`) with no data.
    pub fn with_nodata_sentinel(mut self, sentinel: f32) -> Self {
        for v in &mut self.data {
            if *v == sentinel {
                *v = NODATA;
            }
        }
        self
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    #[inline]
    pub fn is_nodata(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_nan()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of cells carrying a population value.
    pub fn valid_cells(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Sum over valid cells, accumulated in f64.
    pub fn total_population(&self) -> f64 {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| v as f64)
            .sum()
    }

    /// Check shape and cell values. Valid cells must be finite and `>= 0`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.data.is_empty() {
            return Err(InvalidInputError::EmptyGrid);
        }
        if self.data.len() != self.width * self.height {
            return Err(InvalidInputError::SizeMismatch {
                width: self.width,
                height: self.height,
                actual: self.data.len(),
            });
        }
        for (i, &v) in self.data.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            if v.is_infinite() || v < 0.0 {
                return Err(InvalidInputError::InvalidCell {
                    row: i / self.width,
                    col: i % self.width,
                    value: v,
                });
            }
        }
        Ok(())
    }
}

/// NaN <-> `null` mapping so no-data survives a JSON round trip.
pub(crate) mod nodata_values {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[f32], s: S) -> Result<S::Ok, S::Error> {
        let cells: Vec<Option<f32>> = data
            .iter()
            .map(|&v| if v.is_nan() { None } else { Some(v) })
            .collect();
        cells.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f32>, D::Error> {
        let cells: Vec<Option<f32>> = Vec::deserialize(d)?;
        Ok(cells.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = PopulationGrid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::RaggedRow { row: 1, expected: 2, actual: 1 }
        );
    }

    #[test]
    fn from_rows_rejects_empty_input() {
        assert_eq!(
            PopulationGrid::from_rows(vec![]).unwrap_err(),
            InvalidInputError::EmptyGrid
        );
        assert_eq!(
            PopulationGrid::from_rows(vec![vec![]]).unwrap_err(),
            InvalidInputError::EmptyGrid
        );
    }

    #[test]
    fn from_vec_checks_length() {
        let err = PopulationGrid::from_vec(3, 2, vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, InvalidInputError::SizeMismatch { actual: 5, .. }));
    }

    #[test]
    fn validate_rejects_negative_and_infinite_cells() {
        let mut g = PopulationGrid::new(3, 3, 1.0);
        g.set(2, 1, -4.0);
        assert!(matches!(
            g.validate(),
            Err(InvalidInputError::InvalidCell { row: 2, col: 1, .. })
        ));

        g.set(2, 1, f32::INFINITY);
        assert!(g.validate().is_err());

        g.set(2, 1, NODATA);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn totals_skip_nodata() {
        let g = PopulationGrid::from_option_rows(vec![
            vec![Some(10.0), None],
            vec![Some(2.5), Some(0.0)],
        ])
        .unwrap();
        assert_eq!(g.valid_cells(), 3);
        assert!((g.total_population() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn sentinel_becomes_nodata() {
        let g = PopulationGrid::from_rows(vec![vec![-9999.0, 5.0]])
            .unwrap()
            .with_nodata_sentinel(-9999.0);
        assert!(g.is_nodata(0, 0));
        assert!(!g.is_nodata(0, 1));
    }

    #[test]
    fn json_round_trip_keeps_nodata() {
        let g = PopulationGrid::from_option_rows(vec![vec![Some(1.0), None]]).unwrap();
        let json = serde_json::to_string(&g).unwrap();
        assert!(json.contains("null"));
        let back: PopulationGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(0, 0), 1.0);
        assert!(back.is_nodata(0, 1));
    }
}
