//! NetCDF backend built on libnetcdf
//!
//! Only compiled with the `netcdf` feature. Reading goes through
//! [`GridSource`]; [`write_dataset`] produces files the loader reads back,
//! which is how synthetic grids are exported.

use std::path::Path;

use chrono::NaiveDate;
use netcdf::AttributeValue;
use tracing::debug;

use crate::errors::{LoadError, LoadResult};

use super::dataset::{FieldKind, GridDataset};
use super::loader::{AttrValue, GridSource, VariableInfo};

/// An open NetCDF file
pub struct NetcdfSource {
    file: netcdf::File,
}

impl NetcdfSource {
    pub fn open(path: &Path) -> LoadResult<Self> {
        let file = netcdf::open(path)?;
        debug!("Opened NetCDF file {}", path.display());
        Ok(Self { file })
    }
}

impl GridSource for NetcdfSource {
    fn variables(&self) -> LoadResult<Vec<VariableInfo>> {
        Ok(self
            .file
            .variables()
            .map(|var| VariableInfo {
                name: var.name(),
                dims: var
                    .dimensions()
                    .iter()
                    .map(|d| (d.name(), d.len()))
                    .collect(),
                attributes: var
                    .attributes()
                    .filter_map(|attr| {
                        let value = convert_attribute(attr.value().ok()?)?;
                        Some((attr.name().to_string(), value))
                    })
                    .collect(),
            })
            .collect())
    }

    fn read_values(&self, name: &str) -> LoadResult<Vec<f64>> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| LoadError::Malformed {
                reason: format!("no variable named {}", name),
            })?;
        Ok(var.get_values::<f64, _>(..)?)
    }

    fn global_attribute(&self, name: &str) -> Option<AttrValue> {
        let attr = self.file.attribute(name)?;
        convert_attribute(attr.value().ok()?)
    }
}

fn convert_attribute(value: AttributeValue) -> Option<AttrValue> {
    match value {
        AttributeValue::Str(text) => Some(AttrValue::Text(text)),
        AttributeValue::Strs(texts) => Some(AttrValue::Text(texts.join(" "))),
        AttributeValue::Doubles(values) => Some(AttrValue::Numbers(values)),
        AttributeValue::Floats(values) => Some(AttrValue::Numbers(
            values.into_iter().map(f64::from).collect(),
        )),
        AttributeValue::Ints(values) => Some(AttrValue::Numbers(
            values.into_iter().map(f64::from).collect(),
        )),
        AttributeValue::Shorts(values) => Some(AttrValue::Numbers(
            values.into_iter().map(f64::from).collect(),
        )),
        AttributeValue::Schars(values) => Some(AttrValue::Numbers(
            values.into_iter().map(f64::from).collect(),
        )),
        AttributeValue::Uchars(values) => Some(AttrValue::Numbers(
            values.into_iter().map(f64::from).collect(),
        )),
        other => f64::try_from(other).ok().map(AttrValue::Number),
    }
}

/// Write `dataset` as a CF-style NetCDF file
///
/// Fields are stored as `(time, lat, lon)` doubles with a single time step
/// counted in days since 1970-01-01.
pub fn write_dataset(dataset: &GridDataset, path: &Path) -> LoadResult<()> {
    let mut file = netcdf::create(path)?;
    let (n_lat, n_lon) = dataset.shape();

    file.add_dimension("time", 1)?;
    file.add_dimension("lat", n_lat)?;
    file.add_dimension("lon", n_lon)?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(|| LoadError::Malformed {
        reason: "invalid time epoch".to_string(),
    })?;
    let days = (dataset.time() - epoch).num_days() as f64;

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_values(&[days], ..)?;
        var.put_attribute("units", "days since 1970-01-01 00:00:00")?;
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"])?;
        var.put_values(&dataset.lat().to_vec(), ..)?;
        var.put_attribute("units", "degrees_north")?;
    }
    {
        let mut var = file.add_variable::<f64>("lon", &["lon"])?;
        var.put_values(&dataset.lon().to_vec(), ..)?;
        var.put_attribute("units", "degrees_east")?;
    }

    for (name, field) in dataset.fields() {
        let values: Vec<f64> = field.values.iter().copied().collect();
        let mut var = file.add_variable::<f64>(name, &["time", "lat", "lon"])?;
        var.put_values(&values, ..)?;

        if let Some(units) = &field.units {
            var.put_attribute("units", units.as_str())?;
        }
        if let Some(long_name) = &field.long_name {
            var.put_attribute("long_name", long_name.as_str())?;
        }
        if field.kind == FieldKind::Categorical {
            let mut classes: Vec<i32> = values
                .iter()
                .filter(|v| v.is_finite())
                .map(|v| *v as i32)
                .collect();
            classes.sort_unstable();
            classes.dedup();
            var.put_attribute("flag_values", classes)?;
        }
    }

    let metadata = dataset.metadata();
    let text_attributes = [
        ("title", &metadata.title),
        ("source", &metadata.source),
        ("spatial_resolution", &metadata.spatial_resolution),
        ("temporal_resolution", &metadata.temporal_resolution),
        ("product_version", &metadata.product_version),
    ];
    for (name, value) in text_attributes {
        if let Some(value) = value {
            file.add_attribute(name, value.as_str())?;
        }
    }
    if metadata.simulated {
        file.add_attribute("simulated", "true")?;
    }

    debug!("Wrote {} fields to {}", dataset.fields().len(), path.display());
    Ok(())
}
