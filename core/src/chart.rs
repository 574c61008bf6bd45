use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::TrackerError;
use crate::history::filter_by_range;
use crate::models::HistoryEntry;

/// Shown in place of a chart when the range holds no rows.
pub const NO_DATA_MESSAGE: &str = "No data in range";

const PADDING: f64 = 1.08;
const NICE_STEPS: [f64; 4] = [1.0, 2.0, 5.0, 10.0];
const FALLBACK_UPPER_BOUND: f64 = 10.0;

/// Y axis a series is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Kcal,
    Grams,
    Weight,
    Ratio,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Kcal, Axis::Grams, Axis::Weight, Axis::Ratio];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Axis::Kcal => "Calories (kcal)",
            Axis::Grams => "Macros (g)",
            Axis::Weight => "Weight",
            Axis::Ratio => "Ratio",
        }
    }

    /// Ratios always span 0..1; other axes are auto-scaled.
    #[must_use]
    pub fn fixed_range(self) -> Option<(f64, f64)> {
        match self {
            Axis::Ratio => Some((0.0, 1.0)),
            Axis::Kcal | Axis::Grams | Axis::Weight => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKey {
    Calories,
    Protein,
    Fat,
    Carbs,
    Weight,
    ProteinRatio,
    FatRatio,
    CarbRatio,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 8] = [
        SeriesKey::Calories,
        SeriesKey::Protein,
        SeriesKey::Fat,
        SeriesKey::Carbs,
        SeriesKey::Weight,
        SeriesKey::ProteinRatio,
        SeriesKey::FatRatio,
        SeriesKey::CarbRatio,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesKey::Calories => "calories",
            SeriesKey::Protein => "protein",
            SeriesKey::Fat => "fat",
            SeriesKey::Carbs => "carbs",
            SeriesKey::Weight => "weight",
            SeriesKey::ProteinRatio => "protein_ratio",
            SeriesKey::FatRatio => "fat_ratio",
            SeriesKey::CarbRatio => "carb_ratio",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SeriesKey::Calories => "Calories",
            SeriesKey::Protein => "Protein (g)",
            SeriesKey::Fat => "Fat (g)",
            SeriesKey::Carbs => "Carbs (g)",
            SeriesKey::Weight => "Weight",
            SeriesKey::ProteinRatio => "Protein Ratio",
            SeriesKey::FatRatio => "Fat Ratio",
            SeriesKey::CarbRatio => "Carb Ratio",
        }
    }

    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            SeriesKey::Calories => Axis::Kcal,
            SeriesKey::Protein | SeriesKey::Fat | SeriesKey::Carbs => Axis::Grams,
            SeriesKey::Weight => Axis::Weight,
            SeriesKey::ProteinRatio | SeriesKey::FatRatio | SeriesKey::CarbRatio => Axis::Ratio,
        }
    }

    /// The field this series reads from `entry`; `None` is a gap.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, entry: &HistoryEntry) -> Option<f64> {
        match self {
            SeriesKey::Calories => Some(entry.calories as f64),
            SeriesKey::Protein => Some(entry.protein),
            SeriesKey::Fat => Some(entry.fat),
            SeriesKey::Carbs => Some(entry.carbs),
            SeriesKey::Weight => entry.weight,
            SeriesKey::ProteinRatio => Some(entry.protein_ratio),
            SeriesKey::FatRatio => Some(entry.fat_ratio),
            SeriesKey::CarbRatio => Some(entry.carb_ratio),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SeriesKey::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = SeriesKey::ALL.iter().map(|k| k.as_str()).collect();
                TrackerError::validation(format!(
                    "Unknown series '{s}'. Expected one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// Parse a comma-separated series list such as `calories,weight`.
pub fn parse_series_list(s: &str) -> crate::error::Result<Vec<SeriesKey>> {
    let mut keys = Vec::new();
    for part in s.split(',').filter(|p| !p.trim().is_empty()) {
        let key: SeriesKey = part.parse()?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    if keys.is_empty() {
        return Err(TrackerError::validation("No series selected"));
    }
    Ok(keys)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub key: SeriesKey,
    pub label: &'static str,
    pub axis: Axis,
    pub values: Vec<Option<f64>>,
}

impl ChartSeries {
    /// Number of non-gap points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.values.iter().flatten().count()
    }
}

/// Date labels plus one value column per requested series, ready for a
/// renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Display range for `axis` across the series plotted on it.
    #[must_use]
    pub fn axis_range(&self, axis: Axis) -> (f64, f64) {
        axis.fixed_range().unwrap_or_else(|| {
            let values = self
                .series
                .iter()
                .filter(|s| s.axis == axis)
                .flat_map(|s| s.values.iter().flatten().copied());
            (0.0, nice_upper_bound(values))
        })
    }

    /// Axes used by at least one series, in display order.
    #[must_use]
    pub fn axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|a| self.series.iter().any(|s| s.axis == *a))
            .collect()
    }
}

/// Project the rows of `entries` dated within `start..=end` into one series
/// per key.
#[must_use]
pub fn project(
    entries: &[HistoryEntry],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    keys: &[SeriesKey],
) -> ChartData {
    let mut rows = filter_by_range(entries, start, end);
    rows.sort_by(|a, b| a.date.cmp(&b.date));

    let labels = rows.iter().map(|r| r.date.clone()).collect();
    let series = keys
        .iter()
        .map(|&key| ChartSeries {
            key,
            label: key.label(),
            axis: key.axis(),
            values: rows.iter().map(|r| key.value(r)).collect(),
        })
        .collect();

    ChartData { labels, series }
}

/// Round the padded maximum of `values` up to 1, 2 or 5 times a power of ten.
/// Returns 10 when there is no positive finite maximum.
#[must_use]
pub fn nice_upper_bound(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values.into_iter().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max <= 0.0 {
        return FALLBACK_UPPER_BOUND;
    }
    let padded = max * PADDING;
    if !padded.is_finite() {
        return FALLBACK_UPPER_BOUND;
    }
    let magnitude = 10f64.powi(padded.log10().floor() as i32);
    let normalized = padded / magnitude;
    let snapped = NICE_STEPS
        .into_iter()
        .find(|step| *step >= normalized)
        .unwrap_or(10.0);
    snapped * magnitude
}
