//! Seeded synthetic grids for demos and tests
//!
//! Never used as a fallback for real data: a synthetic dataset is always
//! marked `simulated` and only produced when asked for explicitly.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp;
use tracing::debug;

use crate::app::models::YearMonth;
use crate::constants::{product, synthetic};
use crate::errors::{AppError, Result};

use super::dataset::{DatasetMetadata, Field, GridDataset};

/// Global 0.25 degree grid (721 x 1441) for the given month
///
/// The same seed always yields the same values.
///
/// # Errors
///
/// Returns `DateError` for an invalid (year, month)
pub fn synthesize(year: i32, month: u32, seed: u64) -> Result<GridDataset> {
    let lat = regular_axis(-90.0, 90.0, product::GRID_STEP_DEGREES);
    let lon = regular_axis(-180.0, 180.0, product::GRID_STEP_DEGREES);
    synthesize_on(lat, lon, year, month, seed)
}

/// Synthetic dataset on caller supplied axes
pub fn synthesize_on(
    lat: Array1<f64>,
    lon: Array1<f64>,
    year: i32,
    month: u32,
    seed: u64,
) -> Result<GridDataset> {
    let key = YearMonth::new(year, month)?;
    let shape = (lat.len(), lon.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let burned_area_dist = Exp::new(1.0 / synthetic::BURNED_AREA_SCALE)
        .map_err(|e| AppError::generic(format!("Invalid burned area scale: {:?}", e)))?;

    let burned_area = Array2::from_shape_simple_fn(shape, || {
        let value: f64 = rng.sample(burned_area_dist);
        if value > synthetic::BURNED_AREA_CLIP {
            0.0
        } else {
            value
        }
    });
    let confidence = Array2::from_shape_simple_fn(shape, || {
        rng.gen_range(synthetic::CONFIDENCE_MIN..synthetic::CONFIDENCE_MAX)
    });
    let land_cover = Array2::from_shape_simple_fn(shape, || {
        f64::from(rng.gen_range(1..=synthetic::LAND_COVER_CLASSES))
    });

    let mut fields = BTreeMap::new();
    fields.insert(
        "burned_area".to_string(),
        Field::continuous(burned_area).with_long_name("burned area fraction"),
    );
    fields.insert(
        "confidence".to_string(),
        Field::continuous(confidence).with_long_name("detection confidence"),
    );
    fields.insert(
        "land_cover".to_string(),
        Field::categorical(land_cover).with_long_name("land cover class"),
    );

    let metadata = DatasetMetadata {
        title: Some("ESA Fire_cci Burned Area (Sample)".to_string()),
        source: Some("MODIS Fire_cci v5.1 (Simulated)".to_string()),
        spatial_resolution: Some("0.25 degrees".to_string()),
        temporal_resolution: Some(product::TEMPORAL_RESOLUTION.to_string()),
        product_version: Some(product::VERSION.to_string()),
        simulated: true,
    };

    debug!(
        "Synthesized {}x{} grid for {} with seed {}",
        shape.0, shape.1, key, seed
    );

    Ok(GridDataset::new(lat, lon, key.first_day(), fields, metadata)?)
}

/// Inclusive axis from `start` to `end` with spacing `step`
fn regular_axis(start: f64, end: f64, step: f64) -> Array1<f64> {
    let count = ((end - start) / step).round() as usize + 1;
    Array1::from_iter((0..count).map(|i| start + i as f64 * step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use chrono::NaiveDate;
    use ndarray::array;

    fn small(seed: u64) -> GridDataset {
        let lat = Array1::range(-5.0, 5.0, 0.25);
        let lon = Array1::range(20.0, 30.0, 0.25);
        synthesize_on(lat, lon, 2021, 8, seed).unwrap()
    }

    #[test]
    fn test_canonical_grid_shape() {
        let dataset = synthesize(2022, 6, 42).unwrap();
        assert_eq!(dataset.shape(), (721, 1441));
        assert_eq!(dataset.lat()[0], -90.0);
        assert_eq!(dataset.lat()[720], 90.0);
        assert_eq!(dataset.lon()[0], -180.0);
        assert_eq!(dataset.lon()[1440], 180.0);
        assert_eq!(dataset.lon()[4], -179.0);
        assert_eq!(dataset.time(), NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
    }

    #[test]
    fn test_value_ranges() {
        let dataset = small(1);

        let burned = &dataset.field("burned_area").unwrap().values;
        assert!(burned.iter().all(|v| (0.0..=1.0).contains(v)));

        let confidence = &dataset.field("confidence").unwrap().values;
        assert!(confidence.iter().all(|v| (0.5..1.0).contains(v)));

        let land_cover = &dataset.field("land_cover").unwrap().values;
        assert!(land_cover
            .iter()
            .all(|v| v.fract() == 0.0 && (1.0..=18.0).contains(v)));
    }

    #[test]
    fn test_burned_area_follows_exponential_scale() {
        let dataset = small(21);
        let burned = &dataset.field("burned_area").unwrap().values;
        let mean = burned.sum() / burned.len() as f64;
        assert!((0.08..0.12).contains(&mean), "mean {}", mean);
    }

    #[test]
    fn test_seed_reproducibility() {
        assert_eq!(small(9), small(9));
        assert_ne!(
            small(9).field("burned_area").unwrap().values,
            small(10).field("burned_area").unwrap().values
        );
    }

    #[test]
    fn test_marked_as_simulated() {
        let metadata = small(3).metadata().clone();
        assert!(metadata.simulated);
        assert!(metadata.source.unwrap().contains("Simulated"));
    }

    #[test]
    fn test_invalid_month() {
        let result = synthesize_on(array![0.0], array![0.0], 2022, 0, 1);
        assert!(matches!(result, Err(AppError::Date(_))));
    }

    #[test]
    fn test_regular_axis() {
        assert_eq!(regular_axis(0.0, 1.0, 0.25), array![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
