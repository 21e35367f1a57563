//! Continental regions and spatial subsetting
//!
//! Regions are fixed latitude/longitude boxes. Subsetting keeps every grid
//! cell whose coordinates fall inside the box, bounds included, and copies
//! the data so the input dataset is left untouched.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::app::grid::GridDataset;
use crate::errors::RegionError;

/// Named inclusive latitude/longitude box in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub name: &'static str,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Region {
    pub const AFRICA: Region = Region {
        name: "Africa",
        lat_min: -35.0,
        lat_max: 40.0,
        lon_min: -20.0,
        lon_max: 55.0,
    };

    pub const ASIA: Region = Region {
        name: "Asia",
        lat_min: 5.0,
        lat_max: 80.0,
        lon_min: 60.0,
        lon_max: 180.0,
    };

    pub const EUROPE: Region = Region {
        name: "Europe",
        lat_min: 35.0,
        lat_max: 75.0,
        lon_min: -15.0,
        lon_max: 60.0,
    };

    pub const NORTH_AMERICA: Region = Region {
        name: "North America",
        lat_min: 15.0,
        lat_max: 85.0,
        lon_min: -170.0,
        lon_max: -50.0,
    };

    pub const SOUTH_AMERICA: Region = Region {
        name: "South America",
        lat_min: -60.0,
        lat_max: 15.0,
        lon_min: -85.0,
        lon_max: -30.0,
    };

    /// All predefined regions
    pub fn all() -> &'static [Region] {
        &ALL_REGIONS
    }

    /// Look up a predefined region by its exact name
    pub fn by_name(name: &str) -> Result<&'static Region, RegionError> {
        ALL_REGIONS
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RegionError::UnknownRegion {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (lat {} to {}, lon {} to {})",
            self.name, self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

static ALL_REGIONS: [Region; 5] = [
    Region::AFRICA,
    Region::ASIA,
    Region::EUROPE,
    Region::NORTH_AMERICA,
    Region::SOUTH_AMERICA,
];

/// Subset `dataset` to the predefined region called `region_name`
///
/// # Errors
///
/// Returns `RegionError::UnknownRegion` if no region has that name
pub fn subset(dataset: &GridDataset, region_name: &str) -> Result<GridDataset, RegionError> {
    let region = Region::by_name(region_name)?;
    Ok(subset_region(dataset, region))
}

/// Subset `dataset` to an explicit region
///
/// A region that misses the grid yields a dataset with an empty axis.
pub fn subset_region(dataset: &GridDataset, region: &Region) -> GridDataset {
    // Axes are strictly ascending, so each window is contiguous
    let lat = dataset.lat();
    let lon = dataset.lon();
    let lat_start = lat.iter().position(|&v| v >= region.lat_min).unwrap_or(lat.len());
    let lat_end = lat.iter().rposition(|&v| v <= region.lat_max).map_or(0, |i| i + 1);
    let lon_start = lon.iter().position(|&v| v >= region.lon_min).unwrap_or(lon.len());
    let lon_end = lon.iter().rposition(|&v| v <= region.lon_max).map_or(0, |i| i + 1);

    let lat_range = lat_start..lat_end.max(lat_start);
    let lon_range = lon_start..lon_end.max(lon_start);

    debug!(
        "Subset {} keeps {} x {} cells",
        region.name,
        lat_range.len(),
        lon_range.len()
    );

    dataset.window(lat_range, lon_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::grid::synthesize;
    use crate::app::grid::synthesize_on;
    use ndarray::{array, Array1};

    #[test]
    fn test_regions_are_well_formed() {
        assert_eq!(Region::all().len(), 5);
        for region in Region::all() {
            assert!(region.lat_min < region.lat_max, "{}", region);
            assert!(region.lon_min < region.lon_max, "{}", region);
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Region::by_name("Europe").unwrap(), &Region::EUROPE);
        assert_eq!(
            Region::by_name("North America").unwrap().lon_max,
            -50.0
        );
        assert_eq!(
            Region::by_name("Atlantis"),
            Err(RegionError::UnknownRegion {
                name: "Atlantis".to_string()
            })
        );
        assert!(Region::by_name("europe").is_err());
    }

    #[test]
    fn test_africa_bounds_are_inclusive() {
        let dataset = synthesize(2022, 6, 42).unwrap();
        let africa = subset(&dataset, "Africa").unwrap();

        assert_eq!(africa.lat()[0], -35.0);
        assert_eq!(africa.lat()[africa.lat().len() - 1], 40.0);
        assert_eq!(africa.lon()[0], -20.0);
        assert_eq!(africa.lon()[africa.lon().len() - 1], 55.0);
        assert_eq!(africa.shape(), (301, 301));
        assert_eq!(
            africa.field_names().collect::<Vec<_>>(),
            dataset.field_names().collect::<Vec<_>>()
        );
        assert_eq!(africa.metadata(), dataset.metadata());
        assert_eq!(dataset.shape(), (721, 1441));
    }

    #[test]
    fn test_subset_values_follow_coordinates() {
        let dataset = synthesize_on(
            array![-1.0, 0.0, 1.0],
            array![54.0, 55.0, 56.0],
            2020,
            1,
            5,
        )
        .unwrap();
        let subset = subset_region(&dataset, &Region::AFRICA);

        assert_eq!(subset.lon(), &array![54.0, 55.0]);
        let full = &dataset.field("confidence").unwrap().values;
        let part = &subset.field("confidence").unwrap().values;
        assert_eq!(part[[2, 1]], full[[2, 1]]);
    }

    #[test]
    fn test_region_outside_grid_is_empty() {
        let dataset = synthesize_on(
            Array1::range(-10.0, -5.0, 1.0),
            Array1::range(100.0, 105.0, 1.0),
            2020,
            1,
            5,
        )
        .unwrap();
        let subset = subset(&dataset, "Europe").unwrap();

        assert_eq!(subset.n_cells(), 0);
        assert_eq!(subset.lat().len(), 0);
        assert_eq!(subset.field("burned_area").unwrap().values.len(), 0);
    }

    #[test]
    fn test_unknown_region_leaves_input_unchanged() {
        let dataset = synthesize_on(array![0.0], array![0.0], 2020, 1, 5).unwrap();
        let before = dataset.clone();

        assert!(subset(&dataset, "Atlantis").is_err());
        assert_eq!(dataset, before);
    }

    #[test]
    fn test_contains() {
        assert!(Region::AFRICA.contains(-35.0, 55.0));
        assert!(!Region::AFRICA.contains(-35.25, 0.0));
    }
}
