//! Summary statistics over a dataset
//!
//! Non-finite cells (masked or missing data) never contribute to sums,
//! means, maxima or counts. When a field has no finite cell at all, its
//! sums and counts are 0 and its mean and maximum are absent.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::Serialize;

use crate::app::grid::GridDataset;
use crate::constants::stats::HIGH_CONFIDENCE_THRESHOLD;

/// Metrics computed for one dataset
///
/// Field-dependent metrics are `None` when the dataset lacks the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_burned_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_burned_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_burned_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_cells: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_confidence_cells: Option<usize>,
    pub total_cells: usize,
}

impl StatisticsReport {
    /// Metric name to value, omitting absent metrics
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        let entries = [
            ("total_burned_area", self.total_burned_area),
            ("max_burned_area", self.max_burned_area),
            ("mean_burned_area", self.mean_burned_area),
            ("active_cells", self.active_cells.map(|n| n as f64)),
            ("mean_confidence", self.mean_confidence),
            (
                "high_confidence_cells",
                self.high_confidence_cells.map(|n| n as f64),
            ),
            ("total_cells", Some(self.total_cells as f64)),
        ];

        entries
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }
}

/// Compute the report for `dataset`
pub fn aggregate(dataset: &GridDataset) -> StatisticsReport {
    let mut report = StatisticsReport {
        total_cells: dataset.n_cells(),
        ..Default::default()
    };

    if let Some(field) = dataset.field("burned_area") {
        let summary = Summary::of(&field.values);
        report.total_burned_area = Some(summary.sum);
        report.max_burned_area = summary.max;
        report.mean_burned_area = summary.mean();
        report.active_cells = Some(count_where(&field.values, |v| v > 0.0));
    }

    if let Some(field) = dataset.field("confidence") {
        let summary = Summary::of(&field.values);
        report.mean_confidence = summary.mean();
        report.high_confidence_cells = Some(count_where(&field.values, |v| {
            v > HIGH_CONFIDENCE_THRESHOLD
        }));
    }

    report
}

struct Summary {
    sum: f64,
    count: usize,
    max: Option<f64>,
}

impl Summary {
    fn of(values: &Array2<f64>) -> Self {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(
                Summary {
                    sum: 0.0,
                    count: 0,
                    max: None,
                },
                |acc, v| Summary {
                    sum: acc.sum + v,
                    count: acc.count + 1,
                    max: Some(acc.max.map_or(v, |m| m.max(v))),
                },
            )
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

fn count_where(values: &Array2<f64>, predicate: impl Fn(f64) -> bool) -> usize {
    values
        .iter()
        .filter(|v| v.is_finite() && predicate(**v))
        .count()
}
