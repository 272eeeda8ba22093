use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::GridIndex;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // polygon: rings of positions; only the outer ring is used
    coordinates: Vec<Vec<Vec<f64>>>,
}

fn outer_ring(idx: usize, geometry: &Geometry) -> Result<Vec<[f64; 2]>> {
    let ring = geometry
        .coordinates
        .first()
        .with_context(|| format!("feature {idx}: polygon has no rings"))?;
    ring.iter()
        .map(|pos| match pos.as_slice() {
            [lng, lat, ..] => Ok([*lng, *lat]),
            _ => bail!("feature {idx}: position {:?} needs lng and lat", pos),
        })
        .collect()
}

/// Parse a GeoJSON FeatureCollection of grid cells.
pub fn grid_from_geojson(text: &str) -> Result<GridIndex> {
    let collection: FeatureCollection =
        serde_json::from_str(text).context("parse grid GeoJSON")?;
    if collection.features.is_empty() {
        bail!("grid GeoJSON has no features");
    }
    let rings = collection
        .features
        .iter()
        .enumerate()
        .map(|(idx, f)| outer_ring(idx, &f.geometry))
        .collect::<Result<Vec<_>>>()?;
    Ok(GridIndex::from_cell_rings(&rings)?)
}

pub fn load_grid(path: &Path) -> Result<GridIndex> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut text = String::new();
    BufReader::new(f)
        .read_to_string(&mut text)
        .with_context(|| format!("read {}", path.display()))?;
    grid_from_geojson(&text).with_context(|| format!("grid definition {}", path.display()))
}
