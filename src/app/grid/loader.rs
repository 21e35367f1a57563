//! Turning a gridded file into a [`GridDataset`]
//!
//! File formats sit behind the [`GridSource`] trait, which only knows how
//! to list variables, read them as `f64` and report attributes. Everything
//! else (axis detection, orientation, masking, squeezing and unstacking of
//! extra dimensions, timestamp and metadata extraction) happens here, once,
//! for every backend.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use ndarray::{s, Array1, Array2};
use tracing::{debug, warn};

use crate::app::models::YearMonth;
use crate::errors::{LoadError, LoadResult};

use super::dataset::{DatasetMetadata, Field, FieldKind, GridDataset};

const LAT_NAMES: &[&str] = &["lat", "latitude"];
const LON_NAMES: &[&str] = &["lon", "longitude"];
const TIME_NAME: &str = "time";

/// Attribute value as seen by the loader
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Numbers(Vec<f64>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Numbers(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }
}

/// Shape and attributes of one variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    /// (dimension name, length), outermost first
    pub dims: Vec<(String, usize)>,
    pub attributes: HashMap<String, AttrValue>,
}

impl VariableInfo {
    fn dim_names(&self) -> Vec<&str> {
        self.dims.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn len(&self) -> usize {
        self.dims.iter().map(|(_, len)| *len).product()
    }

    fn number_attr(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(AttrValue::as_number)
    }

    fn text_attr(&self, name: &str) -> Option<String> {
        self.attributes
            .get(name)
            .and_then(AttrValue::as_text)
            .map(str::to_string)
    }
}

/// A readable gridded file
pub trait GridSource {
    /// Every variable in the file
    fn variables(&self) -> LoadResult<Vec<VariableInfo>>;

    /// All values of `name` in row-major order, converted to `f64`
    fn read_values(&self, name: &str) -> LoadResult<Vec<f64>>;

    /// File-level attribute
    fn global_attribute(&self, name: &str) -> Option<AttrValue>;
}

/// Load a grid file from disk
///
/// # Errors
///
/// - `LoadError::NotFound` if `path` does not exist
/// - `LoadError::BackendUnavailable` if this build lacks NetCDF support
/// - any error from [`load_from`]
pub fn load(path: &Path) -> LoadResult<GridDataset> {
    if !path.is_file() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    #[cfg(feature = "netcdf")]
    {
        let source = super::netcdf::NetcdfSource::open(path)?;
        load_from(&source, path)
    }

    #[cfg(not(feature = "netcdf"))]
    {
        Err(LoadError::BackendUnavailable {
            path: path.to_path_buf(),
        })
    }
}

/// Build a dataset from any [`GridSource`]
///
/// `path` is only used to derive a timestamp from the canonical file name
/// when the source has no usable `time` variable.
pub fn load_from(source: &dyn GridSource, path: &Path) -> LoadResult<GridDataset> {
    let variables = source.variables()?;

    let lat_info = find_axis(&variables, LAT_NAMES, "latitude")?;
    let lon_info = find_axis(&variables, LON_NAMES, "longitude")?;
    let (lat, lat_descending) = read_axis(source, lat_info)?;
    let (lon, lon_descending) = read_axis(source, lon_info)?;
    let lat_dim = lat_info.dims[0].0.as_str();
    let lon_dim = lon_info.dims[0].0.as_str();

    let mut fields = BTreeMap::new();
    for info in &variables {
        if info.name == lat_info.name || info.name == lon_info.name {
            continue;
        }
        let dims = info.dim_names();
        if dims.len() < 2 || dims[dims.len() - 2..] != [lat_dim, lon_dim] {
            continue;
        }

        for (name, mut field) in read_fields(source, info, lat.len(), lon.len())? {
            if lat_descending {
                field.values = field.values.slice(s![..;-1, ..]).to_owned();
            }
            if lon_descending {
                field.values = field.values.slice(s![.., ..;-1]).to_owned();
            }
            fields.insert(name, field);
        }
    }

    if fields.is_empty() {
        warn!("No data fields on the ({}, {}) grid in {}", lat_dim, lon_dim, path.display());
    }

    let time = read_timestamp(source, &variables, path)?;
    let metadata = read_metadata(source);

    debug!(
        "Loaded {} fields on a {}x{} grid for {} from {}",
        fields.len(),
        lat.len(),
        lon.len(),
        time,
        path.display()
    );

    GridDataset::new(lat, lon, time, fields, metadata)
}

fn find_axis<'a>(
    variables: &'a [VariableInfo],
    names: &[&str],
    axis: &str,
) -> LoadResult<&'a VariableInfo> {
    let info = variables
        .iter()
        .find(|v| names.iter().any(|n| v.name.eq_ignore_ascii_case(n)))
        .ok_or_else(|| LoadError::MissingAxis {
            axis: axis.to_string(),
        })?;

    if info.dims.len() != 1 {
        return Err(LoadError::InvalidAxis {
            axis: info.name.clone(),
            reason: format!("expected 1 dimension, found {}", info.dims.len()),
        });
    }
    if info.dims[0].1 == 0 {
        return Err(LoadError::InvalidAxis {
            axis: info.name.clone(),
            reason: "axis is empty".to_string(),
        });
    }
    Ok(info)
}

/// Read an axis, returning it ascending plus whether it had to be reversed
fn read_axis(source: &dyn GridSource, info: &VariableInfo) -> LoadResult<(Array1<f64>, bool)> {
    let values = source.read_values(&info.name)?;
    if values.len() != info.len() {
        return Err(LoadError::Malformed {
            reason: format!(
                "axis {} has {} values, expected {}",
                info.name,
                values.len(),
                info.len()
            ),
        });
    }

    let ascending = values.windows(2).all(|w| w[0] < w[1]);
    let descending = values.windows(2).all(|w| w[0] > w[1]);

    if ascending {
        Ok((Array1::from(values), false))
    } else if descending {
        debug!("Normalizing descending axis {}", info.name);
        Ok((Array1::from_iter(values.into_iter().rev()), true))
    } else {
        Err(LoadError::InvalidAxis {
            axis: info.name.clone(),
            reason: "coordinates are not strictly monotonic".to_string(),
        })
    }
}

/// Read one variable as one or more 2-D fields
///
/// A leading `time` dimension of length 1 is dropped. Any remaining
/// leading dimensions are unstacked into `<name>_<n>` fields, numbered
/// from 1 in row-major order.
fn read_fields(
    source: &dyn GridSource,
    info: &VariableInfo,
    n_lat: usize,
    n_lon: usize,
) -> LoadResult<Vec<(String, Field)>> {
    let trailing = &info.dims[info.dims.len() - 2..];
    if (trailing[0].1, trailing[1].1) != (n_lat, n_lon) {
        return Err(LoadError::ShapeMismatch {
            field: info.name.clone(),
            expected: (n_lat, n_lon),
            actual: info.dims.iter().map(|(_, len)| *len).collect(),
        });
    }

    let values = source.read_values(&info.name)?;
    if values.len() != info.len() {
        return Err(LoadError::Malformed {
            reason: format!(
                "variable {} has {} values, expected {}",
                info.name,
                values.len(),
                info.len()
            ),
        });
    }

    let leading: Vec<&(String, usize)> = info.dims[..info.dims.len() - 2]
        .iter()
        .filter(|(name, len)| !(name == TIME_NAME && *len == 1))
        .collect();
    let layers: usize = leading.iter().map(|(_, len)| *len).product();
    let plane = n_lat * n_lon;

    let fill = info
        .number_attr("_FillValue")
        .or_else(|| info.number_attr("missing_value"));
    let scale = info.number_attr("scale_factor").unwrap_or(1.0);
    let offset = info.number_attr("add_offset").unwrap_or(0.0);
    let kind = if info.attributes.contains_key("flag_values")
        || info.attributes.contains_key("flag_meanings")
    {
        FieldKind::Categorical
    } else {
        FieldKind::Continuous
    };

    let mut fields = Vec::with_capacity(layers);
    for layer in 0..layers {
        let unpacked: Vec<f64> = values[layer * plane..(layer + 1) * plane]
            .iter()
            .map(|&v| match fill {
                Some(fill) if v == fill => f64::NAN,
                _ => v * scale + offset,
            })
            .collect();

        let array = Array2::from_shape_vec((n_lat, n_lon), unpacked).map_err(|e| {
            LoadError::Malformed {
                reason: format!("variable {}: {}", info.name, e),
            }
        })?;

        let name = if leading.is_empty() {
            info.name.clone()
        } else {
            format!("{}_{}", info.name, layer + 1)
        };
        fields.push((
            name,
            Field {
                values: array,
                kind,
                units: info.text_attr("units"),
                long_name: info.text_attr("long_name"),
            },
        ));
    }

    Ok(fields)
}

fn read_timestamp(
    source: &dyn GridSource,
    variables: &[VariableInfo],
    path: &Path,
) -> LoadResult<NaiveDate> {
    let from_time_variable = variables
        .iter()
        .find(|v| v.name == TIME_NAME)
        .and_then(|info| {
            let units = info.text_attr("units")?;
            let first = source.read_values(&info.name).ok()?.into_iter().next()?;
            decode_cf_time(&units, first)
        });

    if let Some(date) = from_time_variable {
        return Ok(first_of_month(date));
    }

    path.file_name()
        .and_then(|name| YearMonth::from_filename(&name.to_string_lossy()))
        .map(|key| key.first_day())
        .ok_or_else(|| LoadError::MissingTimestamp {
            path: path.to_path_buf(),
        })
}

/// Decode a CF time value such as `days since 1970-01-01 00:00:00`
pub fn decode_cf_time(units: &str, value: f64) -> Option<NaiveDate> {
    if !value.is_finite() {
        return None;
    }

    let (unit, epoch) = units.split_once(" since ")?;
    let epoch = epoch.trim();
    let epoch = NaiveDateTime::parse_from_str(epoch, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(epoch, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            let date_part = epoch.split_whitespace().next()?;
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "days" | "day" | "d" => 86_400.0,
        "hours" | "hour" | "h" => 3_600.0,
        "minutes" | "minute" | "min" => 60.0,
        "seconds" | "second" | "s" => 1.0,
        _ => return None,
    };

    let seconds = (value * seconds_per_unit).floor();
    if seconds.abs() > 1e15 {
        return None;
    }
    let offset = Duration::seconds(seconds as i64);
    epoch.checked_add_signed(offset).map(|dt| dt.date())
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn read_metadata(source: &dyn GridSource) -> DatasetMetadata {
    let text = |name: &str| {
        source
            .global_attribute(name)
            .and_then(|v| v.as_text().map(str::to_string))
    };

    let simulated = match source.global_attribute("simulated") {
        Some(AttrValue::Text(t)) => t.eq_ignore_ascii_case("true"),
        Some(value) => value.as_number().is_some_and(|n| n != 0.0),
        None => false,
    };

    DatasetMetadata {
        title: text("title"),
        source: text("source"),
        spatial_resolution: text("spatial_resolution")
            .or_else(|| text("geospatial_lat_resolution")),
        temporal_resolution: text("temporal_resolution")
            .or_else(|| text("time_coverage_resolution")),
        product_version: text("product_version"),
        simulated,
    }
}

/// [`GridSource`] over variables held in memory
///
/// Useful for data produced by other tools or already decoded elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    variables: Vec<(VariableInfo, Vec<f64>)>,
    attributes: HashMap<String, AttrValue>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable; `values` are row-major over `dims`
    pub fn with_variable(
        mut self,
        name: &str,
        dims: &[(&str, usize)],
        values: Vec<f64>,
        attributes: &[(&str, AttrValue)],
    ) -> Self {
        let info = VariableInfo {
            name: name.to_string(),
            dims: dims.iter().map(|(d, n)| (d.to_string(), *n)).collect(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        self.variables.push((info, values));
        self
    }

    pub fn with_attribute(mut self, name: &str, value: AttrValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }
}

impl GridSource for MemorySource {
    fn variables(&self) -> LoadResult<Vec<VariableInfo>> {
        Ok(self.variables.iter().map(|(info, _)| info.clone()).collect())
    }

    fn read_values(&self, name: &str) -> LoadResult<Vec<f64>> {
        self.variables
            .iter()
            .find(|(info, _)| info.name == name)
            .map(|(_, values)| values.clone())
            .ok_or_else(|| LoadError::Malformed {
                reason: format!("no variable named {}", name),
            })
    }

    fn global_attribute(&self, name: &str) -> Option<AttrValue> {
        self.attributes.get(name).cloned()
    }
}
