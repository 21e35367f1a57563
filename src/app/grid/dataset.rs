//! In-memory gridded dataset
//!
//! A [`GridDataset`] is a set of named 2-D fields sharing one latitude and
//! one longitude axis. Both axes are strictly ascending and every field has
//! shape `(lat.len(), lon.len())`; [`GridDataset::new`] rejects anything
//! else, so code holding a dataset never re-checks shapes.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDate;
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::errors::{LoadError, LoadResult};

/// How the values of a field should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Physical quantity
    Continuous,
    /// Integer class codes stored as f64 (e.g. land cover)
    Categorical,
}

/// One 2-D variable of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub values: Array2<f64>,
    pub kind: FieldKind,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

impl Field {
    pub fn continuous(values: Array2<f64>) -> Self {
        Self {
            values,
            kind: FieldKind::Continuous,
            units: None,
            long_name: None,
        }
    }

    pub fn categorical(values: Array2<f64>) -> Self {
        Self {
            values,
            kind: FieldKind::Categorical,
            units: None,
            long_name: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = Some(long_name.into());
        self
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Copy of the rows and columns inside the given index windows
    fn window(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            values: self.values.slice(s![rows, cols]).to_owned(),
            kind: self.kind,
            units: self.units.clone(),
            long_name: self.long_name.clone(),
        }
    }
}

/// Descriptive attributes carried with a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub title: Option<String>,
    pub source: Option<String>,
    pub spatial_resolution: Option<String>,
    pub temporal_resolution: Option<String>,
    pub product_version: Option<String>,
    /// True for generated data that did not come from the archive
    pub simulated: bool,
}

/// Named 2-D fields on a shared latitude/longitude grid for one month
#[derive(Debug, Clone, PartialEq)]
pub struct GridDataset {
    lat: Array1<f64>,
    lon: Array1<f64>,
    time: NaiveDate,
    fields: BTreeMap<String, Field>,
    metadata: DatasetMetadata,
}

impl GridDataset {
    /// Build a dataset, validating axes and field shapes
    ///
    /// # Errors
    ///
    /// - `LoadError::InvalidAxis` if an axis is not strictly ascending or
    ///   contains a non-finite value
    /// - `LoadError::ShapeMismatch` if a field does not span both axes
    pub fn new(
        lat: Array1<f64>,
        lon: Array1<f64>,
        time: NaiveDate,
        fields: BTreeMap<String, Field>,
        metadata: DatasetMetadata,
    ) -> LoadResult<Self> {
        check_ascending("lat", &lat)?;
        check_ascending("lon", &lon)?;

        let expected = (lat.len(), lon.len());
        for (name, field) in &fields {
            if field.shape() != expected {
                return Err(LoadError::ShapeMismatch {
                    field: name.clone(),
                    expected,
                    actual: field.values.shape().to_vec(),
                });
            }
        }

        Ok(Self {
            lat,
            lon,
            time,
            fields,
            metadata,
        })
    }

    pub fn lat(&self) -> &Array1<f64> {
        &self.lat
    }

    pub fn lon(&self) -> &Array1<f64> {
        &self.lon
    }

    /// First day of the month the data describes
    pub fn time(&self) -> NaiveDate {
        self.time
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// (n_lat, n_lon)
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn n_cells(&self) -> usize {
        self.lat.len() * self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_cells() == 0
    }

    /// New dataset restricted to the given index windows of each axis
    ///
    /// Windows must lie within the axes; slicing a valid dataset keeps it
    /// valid, so no re-validation happens.
    pub(crate) fn window(&self, lat: Range<usize>, lon: Range<usize>) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.window(lat.clone(), lon.clone())))
            .collect();

        Self {
            lat: self.lat.slice(s![lat]).to_owned(),
            lon: self.lon.slice(s![lon]).to_owned(),
            time: self.time,
            fields,
            metadata: self.metadata.clone(),
        }
    }
}

fn check_ascending(axis: &str, values: &Array1<f64>) -> LoadResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(LoadError::InvalidAxis {
            axis: axis.to_string(),
            reason: "contains non-finite coordinates".to_string(),
        });
    }
    if values.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(LoadError::InvalidAxis {
            axis: axis.to_string(),
            reason: "coordinates must be strictly ascending".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 6, 1).unwrap()
    }

    fn small_dataset() -> GridDataset {
        let mut fields = BTreeMap::new();
        fields.insert(
            "burned_area".to_string(),
            Field::continuous(array![[0.0, 0.1, 0.2], [0.3, 0.4, 0.5]]).with_units("km2"),
        );
        GridDataset::new(
            array![-10.0, 10.0],
            array![0.0, 1.0, 2.0],
            date(),
            fields,
            DatasetMetadata::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_dataset() {
        let dataset = small_dataset();
        assert_eq!(dataset.shape(), (2, 3));
        assert_eq!(dataset.n_cells(), 6);
        assert_eq!(dataset.field_names().collect::<Vec<_>>(), vec!["burned_area"]);
        assert_eq!(
            dataset.field("burned_area").unwrap().units.as_deref(),
            Some("km2")
        );
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut fields = BTreeMap::new();
        fields.insert("bad".to_string(), Field::continuous(Array2::zeros((3, 2))));

        let result = GridDataset::new(
            array![0.0, 1.0],
            array![0.0, 1.0, 2.0],
            date(),
            fields,
            DatasetMetadata::default(),
        );
        match result {
            Err(LoadError::ShapeMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "bad");
                assert_eq!(expected, (2, 3));
                assert_eq!(actual, vec![3, 2]);
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_descending_axis_rejected() {
        let result = GridDataset::new(
            array![1.0, 0.0],
            array![0.0],
            date(),
            BTreeMap::new(),
            DatasetMetadata::default(),
        );
        assert!(matches!(result, Err(LoadError::InvalidAxis { axis, .. }) if axis == "lat"));
    }

    #[test]
    fn test_empty_axes_allowed() {
        let dataset = GridDataset::new(
            Array1::zeros(0),
            Array1::zeros(0),
            date(),
            BTreeMap::new(),
            DatasetMetadata::default(),
        )
        .unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_window_copies_fields() {
        let dataset = small_dataset();
        let window = dataset.window(1..2, 1..3);

        assert_eq!(window.lat(), &array![10.0]);
        assert_eq!(window.lon(), &array![1.0, 2.0]);
        assert_eq!(
            window.field("burned_area").unwrap().values,
            array![[0.4, 0.5]]
        );
        assert_eq!(dataset.shape(), (2, 3));
    }
}
