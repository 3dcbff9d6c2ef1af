//! Population grid loading: serialised `PopulationGrid` JSON or single-band
//! GeoTIFF.
use std::fs;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use urbanmask_core::PopulationGrid;

/// GDAL_NODATA, stored as an ASCII string.
const GDAL_NODATA_TAG: u16 = 42113;

/// Load a grid by extension. `nodata` overrides any sentinel in the file.
pub fn load_grid(path: &Path, nodata: Option<f32>) -> Result<PopulationGrid> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let grid = match ext.as_str() {
        "tif" | "tiff" => load_tiff(path, nodata)?,
        "json" => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            let grid: PopulationGrid = serde_json::from_str(&text)
                .with_context(|| format!("Invalid grid JSON in {}", path.display()))?;
            match nodata {
                Some(sentinel) => grid.with_nodata_sentinel(sentinel),
                None => grid,
            }
        }
        other => bail!("Unsupported input extension `{other}` (expected .json, .tif or .tiff)"),
    };
    Ok(grid)
}

fn load_tiff(path: &Path, nodata: Option<f32>) -> Result<PopulationGrid> {
    let file = fs::File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Not a valid TIFF: {}", path.display()))?;

    // Global population rasters at 100 m easily exceed the default limits.
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 1024 * 1024 * 1024;
    decoder = decoder.with_limits(limits);

    let (width, height) = decoder.dimensions()?;
    let file_nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA_TAG))
        .ok()
        .and_then(|s| s.trim().trim_end_matches('\0').parse::<f32>().ok());

    let data: Vec<f32> = match decoder.read_image()? {
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => bail!("Unsupported pixel type in {}", path.display()),
    };

    let grid = PopulationGrid::from_vec(width as usize, height as usize, data)
        .with_context(|| format!("{} is not a single-band raster", path.display()))?;

    Ok(match nodata.or(file_nodata) {
        Some(sentinel) => {
            tracing::debug!(sentinel, "mapping nodata sentinel");
            grid.with_nodata_sentinel(sentinel)
        }
        None => grid,
    })
}
